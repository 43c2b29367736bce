//! Data model: organizations, analysis results and sniffed flight metadata.
//!
//! JSON field names are camelCase so the `--json` output and the model reply
//! share one vocabulary (`transcriptId`, `pilotId`, `flightNumber`, …).

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Organization ─────────────────────────────────────────────────────────

/// One safety standard with the checklist items the organization tracks for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyStandard {
    pub name: String,
    pub items: Vec<String>,
}

impl SafetyStandard {
    pub fn new(name: impl Into<String>, items: &[&str]) -> Self {
        Self {
            name: name.into(),
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Reference data for an airline/operator. Selected, never mutated by an
/// analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub pilots: u32,
    pub average_flight_hours: u32,
    pub fleet: u32,
    /// Safety-standard taxonomy, in display order.
    pub checklists: Vec<SafetyStandard>,
    pub observations: String,
    pub prompt: String,
}

impl Organization {
    /// Names of the safety standards, in order.
    pub fn safety_standards(&self) -> Vec<&str> {
        self.checklists.iter().map(|s| s.name.as_str()).collect()
    }
}

// ── Checklist ────────────────────────────────────────────────────────────

/// Ordered item-name → pass/fail mapping.
///
/// Serialised as a JSON object; insertion order is preserved in both
/// directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checklist {
    items: Vec<(String, bool)>,
}

impl Checklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an item, keeping the original position on overwrite.
    pub fn insert(&mut self, item: impl Into<String>, passed: bool) {
        let item = item.into();
        match self.items.iter_mut().find(|(name, _)| *name == item) {
            Some(entry) => entry.1 = passed,
            None => self.items.push((item, passed)),
        }
    }

    pub fn with(mut self, item: impl Into<String>, passed: bool) -> Self {
        self.insert(item, passed);
        self
    }

    pub fn get(&self, item: &str) -> Option<bool> {
        self.items
            .iter()
            .find(|(name, _)| name == item)
            .map(|(_, passed)| *passed)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.items.iter().map(|(name, passed)| (name.as_str(), *passed))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn passed(&self) -> usize {
        self.items.iter().filter(|(_, passed)| *passed).count()
    }
}

impl Serialize for Checklist {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.items.len()))?;
        for (name, passed) in &self.items {
            map.serialize_entry(name, passed)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Checklist {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChecklistVisitor;

        impl<'de> Visitor<'de> for ChecklistVisitor {
            type Value = Checklist;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping checklist items to booleans")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Checklist, A::Error> {
                let mut checklist = Checklist::new();
                while let Some((name, passed)) = access.next_entry::<String, bool>()? {
                    checklist.insert(name, passed);
                }
                Ok(checklist)
            }
        }

        deserializer.deserialize_map(ChecklistVisitor)
    }
}

// ── Pattern ──────────────────────────────────────────────────────────────

/// Traffic-light classification of a pattern's checklist completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternStatus {
    /// 80 % or more of the items passed.
    Excellent,
    /// 60–79 %.
    Partial,
    /// Below 60 %.
    Critical,
}

impl PatternStatus {
    pub fn classify(percentage: u32) -> Self {
        if percentage >= 80 {
            PatternStatus::Excellent
        } else if percentage >= 60 {
            PatternStatus::Partial
        } else {
            PatternStatus::Critical
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PatternStatus::Excellent => "Excellent",
            PatternStatus::Partial => "Partial",
            PatternStatus::Critical => "Critical",
        }
    }
}

impl fmt::Display for PatternStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One safety-standard evaluation with narrative feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub title: String,
    pub feedback: String,
    pub checklists: Vec<Checklist>,
}

impl Pattern {
    pub fn total_items(&self) -> usize {
        self.checklists.iter().map(Checklist::len).sum()
    }

    pub fn passed_items(&self) -> usize {
        self.checklists.iter().map(Checklist::passed).sum()
    }

    /// Rounded share of passed items, 0 when the pattern has none.
    pub fn completion_percentage(&self) -> u32 {
        let total = self.total_items();
        if total == 0 {
            return 0;
        }
        ((self.passed_items() as f64 / total as f64) * 100.0).round() as u32
    }

    pub fn status(&self) -> PatternStatus {
        PatternStatus::classify(self.completion_percentage())
    }
}

// ── Flight metadata ──────────────────────────────────────────────────────

/// One line of the cockpit transcript when the PDF carries structured JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub speaker: String,
    #[serde(default)]
    pub message: String,
}

/// Flight details sniffed from a JSON-shaped transcript. Every field is
/// optional; used for the mismatch confirmation and display only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aircraft: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pilot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copilot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transcript: Vec<TranscriptEntry>,
}

// ── Analysis result ──────────────────────────────────────────────────────

/// The outcome of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub transcript_id: String,
    pub organization_id: String,
    pub pilot_id: String,
    pub patterns: Vec<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_metadata: Option<FlightMetadata>,
}

/// Timing and token statistics for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub page_count: usize,
    pub extracted_chars: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub extract_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
    /// True when the fixed mock result set replaced a failed model call.
    pub used_fallback: bool,
}

/// Result plus run statistics, as returned by [`crate::analyze::analyze`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub result: AnalysisResult,
    pub stats: AnalysisStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern_with(passed: usize, failed: usize) -> Pattern {
        let mut checklist = Checklist::new();
        for i in 0..passed {
            checklist.insert(format!("ok {i}"), true);
        }
        for i in 0..failed {
            checklist.insert(format!("fail {i}"), false);
        }
        Pattern {
            title: "t".into(),
            feedback: "f".into(),
            checklists: vec![checklist],
        }
    }

    #[test]
    fn classify_boundaries() {
        assert_eq!(PatternStatus::classify(100), PatternStatus::Excellent);
        assert_eq!(PatternStatus::classify(80), PatternStatus::Excellent);
        assert_eq!(PatternStatus::classify(79), PatternStatus::Partial);
        assert_eq!(PatternStatus::classify(60), PatternStatus::Partial);
        assert_eq!(PatternStatus::classify(59), PatternStatus::Critical);
        assert_eq!(PatternStatus::classify(0), PatternStatus::Critical);
    }

    #[test]
    fn completion_percentage_rounds() {
        // 2 of 3 → 66.67 → 67
        assert_eq!(pattern_with(2, 1).completion_percentage(), 67);
        assert_eq!(pattern_with(2, 1).status(), PatternStatus::Partial);
        // 4 of 5 → 80
        assert_eq!(pattern_with(4, 1).status(), PatternStatus::Excellent);
        // 1 of 2 → 50
        assert_eq!(pattern_with(1, 1).status(), PatternStatus::Critical);
    }

    #[test]
    fn completion_spans_multiple_checklists() {
        let pattern = Pattern {
            title: "t".into(),
            feedback: "f".into(),
            checklists: vec![
                Checklist::new().with("a", true),
                Checklist::new().with("b", false).with("c", true),
            ],
        };
        assert_eq!(pattern.total_items(), 3);
        assert_eq!(pattern.passed_items(), 2);
    }

    #[test]
    fn empty_pattern_is_critical() {
        let pattern = pattern_with(0, 0);
        assert_eq!(pattern.completion_percentage(), 0);
        assert_eq!(pattern.status(), PatternStatus::Critical);
    }

    #[test]
    fn checklist_keeps_insertion_order_in_json() {
        let checklist = Checklist::new().with("zulu", true).with("alpha", false);
        let json = serde_json::to_string(&checklist).unwrap();
        assert_eq!(json, r#"{"zulu":true,"alpha":false}"#);

        let back: Checklist = serde_json::from_str(&json).unwrap();
        let names: Vec<&str> = back.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zulu", "alpha"]);
    }

    #[test]
    fn checklist_insert_overwrites_in_place() {
        let mut checklist = Checklist::new().with("a", true).with("b", true);
        checklist.insert("a", false);
        assert_eq!(checklist.len(), 2);
        assert_eq!(checklist.get("a"), Some(false));
        assert_eq!(checklist.iter().next(), Some(("a", false)));
    }

    #[test]
    fn result_serialises_camel_case() {
        let result = AnalysisResult {
            transcript_id: "T1".into(),
            organization_id: "ORG".into(),
            pilot_id: "P1".into(),
            patterns: vec![],
            flight_metadata: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["transcriptId"], "T1");
        assert_eq!(json["organizationId"], "ORG");
        assert!(json.get("flightMetadata").is_none());
    }
}
