//! # cockpit-review
//!
//! Review cockpit-voice transcripts for Crew Resource Management (CRM)
//! patterns with a Large Language Model.
//!
//! A transcript PDF is read with pdfium, its text is sent together with the
//! selected organization's prompt and safety-standard taxonomy to an LLM, and
//! the model's JSON reply is normalised into a fixed [`AnalysisResult`]: one
//! pattern per safety standard, each with narrative feedback and pass/fail
//! checklist items. Results can be shown in the terminal, exported as a PDF
//! report or copied to the clipboard.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Intake     check the chosen file (or dropped bytes) is a PDF
//!  ├─ 2. Extract    page text via pdfium (spawn_blocking)
//!  ├─ 3. Sniff      flight metadata when the text is a JSON export
//!  ├─ 4. Confirm    ask before analysing another company's transcript
//!  ├─ 5. Request    one LLM call: system instructions + composite prompt
//!  ├─ 6. Normalize  tolerant JSON → AnalysisResult
//!  └─ 7. Output     terminal view, PDF export, clipboard
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cockpit_review::{analyze, builtin_organizations, find_organization, AnalysisConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let orgs = builtin_organizations();
//!     let org = find_organization(&orgs, "SPARRING001")?;
//!     let config = AnalysisConfig::default();
//!     let output = analyze("cvr-transcript.pdf", org, &org.prompt, &config).await?;
//!     println!("{}", cockpit_review::format_analysis_result(&output.result));
//!     Ok(())
//! }
//! ```
//!
//! ## Organizations
//!
//! Organizations come from a GraphQL directory service
//! ([`GraphQlDirectory`]) or from the static set compiled into the crate
//! ([`builtin_organizations`]). Both implement [`OrganizationSource`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cockpit-review` binary (clap + anyhow + tracing-subscriber + indicatif + dialoguer) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! cockpit-review = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod directory;
pub mod error;
pub mod export;
pub mod fallback;
pub mod model;
pub mod pipeline;
pub mod prefs;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{
    analyze, analyze_bytes, analyze_sync, analyze_transcript, analyze_with_model, inspect,
    Inspection,
};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, FallbackPolicy};
pub use directory::{
    builtin_organizations, find_organization, BuiltinDirectory, GraphQlDirectory,
    OrganizationSource,
};
pub use error::AnalysisError;
pub use export::{
    copy_to_clipboard, default_export_name, export_pdf, ClipboardGuard, CopyOutcome,
};
pub use model::{
    AnalysisOutput, AnalysisResult, AnalysisStats, Checklist, FlightMetadata, Organization,
    Pattern, PatternStatus, SafetyStandard, TranscriptEntry,
};
pub use pipeline::llm::{Completion, CompletionModel, ProviderModel};
pub use pipeline::metadata::{FixedAnswer, MismatchConfirm};
pub use prefs::Preferences;
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::{format_analysis_result, render_terminal, Theme};
pub use session::Session;
