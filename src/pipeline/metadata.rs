//! Metadata sniffing: pull flight details out of JSON-shaped transcripts.
//!
//! Some transcript PDFs are exports whose text layer is a single JSON object
//! (`company`, `flightNumber`, `pilot`, `flightDetails`, `transcript`, …).
//! When that is the case the fields are used to warn about an organization
//! mismatch and to derive the pilot id. Plain-text transcripts are the
//! common case and are not an error.

use crate::model::{FlightMetadata, Organization, TranscriptEntry};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

/// Parse the transcript text as a JSON object and lift the known fields.
///
/// Returns `None` when the text is not JSON or not an object.
pub fn sniff_metadata(text: &str) -> Option<FlightMetadata> {
    let value: Value = match serde_json::from_str(text.trim()) {
        Ok(v) => v,
        Err(e) => {
            debug!("Transcript is not JSON ({}); treating it as plain text", e);
            return None;
        }
    };
    let Value::Object(root) = value else {
        debug!("Transcript JSON is not an object; ignoring it");
        return None;
    };

    let details = root.get("flightDetails").and_then(Value::as_object);
    let from_details = |key: &str| details.and_then(|d| field(d, key));

    let transcript = root
        .get("transcript")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_object)
                .map(|e| TranscriptEntry {
                    timestamp: field(e, "timestamp").unwrap_or_default(),
                    speaker: field(e, "speaker").unwrap_or_default(),
                    message: field(e, "message").unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    let metadata = FlightMetadata {
        company: field(&root, "company"),
        flight_number: field(&root, "flightNumber"),
        aircraft: field(&root, "aircraft"),
        pilot: field(&root, "pilot"),
        copilot: field(&root, "copilot"),
        route: from_details("route"),
        date: from_details("date"),
        duration: from_details("duration"),
        weather: from_details("weather"),
        transcript,
    };

    debug!(
        "Sniffed flight metadata: company={:?} flight={:?} pilot={:?} entries={}",
        metadata.company,
        metadata.flight_number,
        metadata.pilot,
        metadata.transcript.len()
    );
    Some(metadata)
}

/// Read a scalar field as a trimmed, non-empty string.
fn field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    let s = match obj.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// `"John  Smith"` → `"JOHN_SMITH"`.
pub fn pilot_id_from_name(name: &str) -> String {
    RE_WHITESPACE
        .replace_all(name.trim(), "_")
        .to_uppercase()
}

/// The sniffed company when it is present and differs from the organization name.
pub fn company_mismatch<'a>(
    metadata: Option<&'a FlightMetadata>,
    organization: &Organization,
) -> Option<&'a str> {
    metadata
        .and_then(|m| m.company.as_deref())
        .filter(|company| *company != organization.name)
}

/// Asked whether to continue when the PDF names a different company than the
/// selected organization. Returning `false` cancels the run.
pub trait MismatchConfirm: Send + Sync {
    fn confirm(&self, pdf_company: &str, organization: &Organization) -> bool;
}

/// A fixed answer, for non-interactive use (`--yes`) and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl MismatchConfirm for FixedAnswer {
    fn confirm(&self, _pdf_company: &str, _organization: &Organization) -> bool {
        self.0
    }
}
