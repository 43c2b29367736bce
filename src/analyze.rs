//! Analysis entry points.
//!
//! One run is strictly linear:
//!
//! ```text
//! intake ─▶ extract ─▶ sniff ─▶ confirm mismatch ─▶ compose ─▶ request ─▶ normalize
//!                                   │ declined                              │ failed + Mock
//!                                   ▼                                       ▼
//!                              Cancelled                              mock result set
//! ```
//!
//! [`analyze`] resolves an LLM provider itself; [`analyze_with_model`] and
//! [`analyze_transcript`] take any [`CompletionModel`], which is how the
//! pipeline is driven in tests.

use crate::config::{AnalysisConfig, FallbackPolicy, DEFAULT_MODEL};
use crate::error::AnalysisError;
use crate::fallback;
use crate::model::{AnalysisOutput, AnalysisStats, FlightMetadata, Organization};
use crate::pipeline::extract::{self, ExtractedTranscript};
use crate::pipeline::llm::{self, Completion, CompletionModel, ProviderModel};
use crate::pipeline::metadata::{company_mismatch, pilot_id_from_name, sniff_metadata};
use crate::pipeline::normalize::{normalize_reply, ReplyDefaults};
use crate::pipeline::input;
use crate::prompts;
use async_trait::async_trait;
use edgequake_llm::{LLMProvider, ProviderFactory};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Analyse the transcript PDF at `input_str` for `organization`.
///
/// `prompt` is the organization prompt as the user last edited it; it must
/// not be blank.
///
/// # Errors
/// - input / PDF errors from intake and extraction
/// - `ProviderNotConfigured` when no LLM provider can be built (unless the
///   fallback policy is [`FallbackPolicy::Mock`])
/// - `Cancelled` when the mismatch hook declines
/// - `LlmApiError`, `ApiTimeout`, `MalformedResponse` under
///   [`FallbackPolicy::Error`]
pub async fn analyze(
    input_str: impl AsRef<str>,
    organization: &Organization,
    prompt: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    ensure_prompt(prompt)?;
    let model: Box<dyn CompletionModel> = match resolve_provider(config).await {
        Ok(provider) => Box::new(ProviderModel::new(provider)),
        Err(e) if config.fallback == FallbackPolicy::Mock => {
            warn!("{}", e);
            warn!("No LLM provider; the mock result set will be used");
            Box::new(Unavailable(e.to_string()))
        }
        Err(e) => return Err(e),
    };
    analyze_with_model(input_str, organization, prompt, config, model.as_ref()).await
}

/// Like [`analyze`], with a caller-supplied model.
pub async fn analyze_with_model(
    input_str: impl AsRef<str>,
    organization: &Organization,
    prompt: &str,
    config: &AnalysisConfig,
    model: &dyn CompletionModel,
) -> Result<AnalysisOutput, AnalysisError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    ensure_prompt(prompt)?;
    info!("Starting analysis: {} for {}", input_str, organization.id);

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(input_str);
    }

    let pdf_path = input::open_transcript(input_str).await?;
    let extract_start = Instant::now();
    let transcript = extract::extract_text(&pdf_path, config.password.as_deref()).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    let mut output = analyze_transcript(&transcript, organization, prompt, config, model).await?;
    output.stats.extract_duration_ms = extract_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Analyse PDF bytes held in memory.
///
/// The header is checked first; the bytes are then written to a managed
/// temp file that is removed on return.
pub async fn analyze_bytes(
    bytes: &[u8],
    organization: &Organization,
    prompt: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    input::check_pdf_header(Path::new("<dropped file>"), bytes)?;
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| AnalysisError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| AnalysisError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    analyze(&path, organization, prompt, config).await
}

/// Run everything after extraction on an already-extracted transcript.
pub async fn analyze_transcript(
    transcript: &ExtractedTranscript,
    organization: &Organization,
    prompt: &str,
    config: &AnalysisConfig,
    model: &dyn CompletionModel,
) -> Result<AnalysisOutput, AnalysisError> {
    let start = Instant::now();
    ensure_prompt(prompt)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_text_extracted(transcript.page_count(), transcript.char_count());
    }

    // ── Metadata + mismatch confirmation ─────────────────────────────────
    let metadata = sniff_metadata(&transcript.text);
    confirm_organization(metadata.as_ref(), organization, config)?;

    let transcript_id = new_transcript_id();
    let pilot_id = default_pilot_id(metadata.as_ref());

    // ── Model request ────────────────────────────────────────────────────
    let system = config
        .system_prompt
        .as_deref()
        .unwrap_or(prompts::SYSTEM_INSTRUCTIONS);
    let user = prompts::compose_prompt(organization, prompt, &transcript.text);
    debug!("Composite prompt ({} chars):\n{}", user.len(), user);

    if let Some(ref cb) = config.progress_callback {
        cb.on_request_start(&organization.id);
    }
    let llm_start = Instant::now();
    let defaults = ReplyDefaults {
        organization_id: &organization.id,
        transcript_id: &transcript_id,
        pilot_id: &pilot_id,
    };
    let outcome = llm::request_analysis(model, system, &user, config)
        .await
        .and_then(|completion| {
            let result = normalize_reply(&completion.content, defaults)?;
            Ok((result, completion))
        });
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    let (mut result, completion, used_fallback) = match outcome {
        Ok((result, completion)) => (result, completion, false),
        Err(e) if config.fallback == FallbackPolicy::Mock => {
            warn!("Analysis failed ({}); using the mock result set", e);
            let result = fallback::mock_result(&organization.id, &transcript_id, &pilot_id);
            (result, Completion::default(), true)
        }
        Err(e) => return Err(e),
    };
    result.flight_metadata = metadata;

    info!(
        "Analysis complete: {} patterns for {} ({} in / {} out tokens, {}ms{})",
        result.patterns.len(),
        result.organization_id,
        completion.input_tokens,
        completion.output_tokens,
        llm_duration_ms,
        if used_fallback { ", mock" } else { "" }
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_complete(result.patterns.len(), used_fallback);
    }

    let stats = AnalysisStats {
        page_count: transcript.page_count(),
        extracted_chars: transcript.char_count(),
        input_tokens: completion.input_tokens,
        output_tokens: completion.output_tokens,
        extract_duration_ms: 0,
        llm_duration_ms,
        total_duration_ms: start.elapsed().as_millis() as u64,
        used_fallback,
    };
    Ok(AnalysisOutput { result, stats })
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    input_str: impl AsRef<str>,
    organization: &Organization,
    prompt: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AnalysisError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze(input_str, organization, prompt, config))
}

/// What [`inspect`] found in a PDF.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub transcript: ExtractedTranscript,
    pub metadata: Option<FlightMetadata>,
}

/// Extract the text and sniff metadata without calling a model.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &AnalysisConfig,
) -> Result<Inspection, AnalysisError> {
    let pdf_path = input::open_transcript(input_str.as_ref()).await?;
    let transcript = extract::extract_text(&pdf_path, config.password.as_deref()).await?;
    let metadata = sniff_metadata(&transcript.text);
    Ok(Inspection {
        transcript,
        metadata,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn ensure_prompt(prompt: &str) -> Result<(), AnalysisError> {
    if prompt.trim().is_empty() {
        return Err(AnalysisError::InvalidConfig(
            "the analysis prompt is blank".into(),
        ));
    }
    Ok(())
}

/// Ask the mismatch hook when the PDF names another company.
fn confirm_organization(
    metadata: Option<&FlightMetadata>,
    organization: &Organization,
    config: &AnalysisConfig,
) -> Result<(), AnalysisError> {
    let Some(pdf_company) = company_mismatch(metadata, organization) else {
        return Ok(());
    };
    match config.mismatch_confirm {
        Some(ref hook) => {
            if hook.confirm(pdf_company, organization) {
                info!(
                    "Continuing although the PDF names '{}' and '{}' is selected",
                    pdf_company, organization.name
                );
                Ok(())
            } else {
                info!("Analysis cancelled on organization mismatch");
                Err(AnalysisError::Cancelled {
                    pdf_company: pdf_company.to_string(),
                    selected: organization.name.clone(),
                })
            }
        }
        None => {
            warn!(
                "The PDF names '{}' but '{}' is selected; continuing",
                pdf_company, organization.name
            );
            Ok(())
        }
    }
}

fn since_epoch() -> std::time::Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// `TRANSCRIPT_<unix millis>`.
pub fn new_transcript_id() -> String {
    format!("TRANSCRIPT_{}", since_epoch().as_millis())
}

/// The sniffed pilot's name as an id, else `PILOT_<3 digits>`.
pub fn default_pilot_id(metadata: Option<&FlightMetadata>) -> String {
    match metadata.and_then(|m| m.pilot.as_deref()) {
        Some(name) => pilot_id_from_name(name),
        None => format!("PILOT_{:03}", since_epoch().subsec_nanos() % 1000),
    }
}

/// Stands in for a provider that could not be built.
struct Unavailable(String);

#[async_trait]
impl CompletionModel for Unavailable {
    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        _config: &AnalysisConfig,
    ) -> Result<Completion, AnalysisError> {
        Err(AnalysisError::LlmApiError {
            message: self.0.clone(),
        })
    }
}

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, AnalysisError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        AnalysisError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. pre-built provider (`config.provider`)
/// 2. named provider + model (`config.provider_name`)
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 4. OpenAI when `OPENAI_API_KEY` is set
/// 5. `ProviderFactory::from_env` auto-detection
pub async fn resolve_provider(
    config: &AnalysisConfig,
) -> Result<Arc<dyn LLMProvider>, AnalysisError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| AnalysisError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::builtin_organizations;

    #[test]
    fn transcript_id_shape() {
        let id = new_transcript_id();
        let millis = id.strip_prefix("TRANSCRIPT_").unwrap();
        assert!(millis.parse::<u128>().unwrap() > 1_600_000_000_000);
    }

    #[test]
    fn pilot_id_from_metadata_or_random() {
        let meta = FlightMetadata {
            pilot: Some("Ana  Lima".into()),
            ..Default::default()
        };
        assert_eq!(default_pilot_id(Some(&meta)), "ANA_LIMA");

        let id = default_pilot_id(None);
        let digits = id.strip_prefix("PILOT_").unwrap();
        assert_eq!(digits.len(), 3);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn dropped_non_pdf_is_rejected_before_anything_else() {
        let orgs = builtin_organizations();
        let config = AnalysisConfig::default();
        let err = analyze_bytes(b"PK\x03\x04zip", &orgs[0], &orgs[0].prompt, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NotAPdf { .. }), "{err}");
    }

    #[test]
    fn blank_prompt_rejected() {
        assert!(matches!(
            ensure_prompt(" \n\t"),
            Err(AnalysisError::InvalidConfig(_))
        ));
        assert!(ensure_prompt("Analyse.").is_ok());
    }

    #[test]
    fn mismatch_without_hook_proceeds() {
        let orgs = builtin_organizations();
        let meta = FlightMetadata {
            company: Some("AeroLink".into()),
            ..Default::default()
        };
        let config = AnalysisConfig::default();
        assert!(confirm_organization(Some(&meta), &orgs[0], &config).is_ok());
    }

    #[tokio::test]
    async fn unavailable_model_reports_reason() {
        let err = Unavailable("no key".into())
            .complete("s", "u", &AnalysisConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no key"));
    }
}
