//! Error types for the cockpit-review library.
//!
//! A single fatal error type, [`AnalysisError`], covers every way an analysis
//! attempt can stop: bad input file, unreadable PDF, provider not configured,
//! an unusable model reply, or a directory (GraphQL) failure. An analysis run
//! is all-or-nothing, so there is no partial-result error type.
//!
//! One variant is special: [`AnalysisError::Cancelled`] is returned when the
//! user declines to continue after an organization mismatch. It is not a
//! failure and callers should keep it off their error path; use
//! [`AnalysisError::is_cancelled`] to tell it apart.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the cockpit-review library.
#[derive(Debug, Error)]
pub enum AnalysisError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The PDF opened fine but carries no extractable text (scanned images).
    #[error("No text could be extracted from '{path}'.\nCheck the file is a text PDF, not a scan.")]
    EmptyText { path: PathBuf },

    /// pdfium text extraction failed for a specific page.
    #[error("Text extraction failed for page {page}: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The LLM call did not finish within the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    /// The model answered, but not with the expected JSON shape.
    #[error("Model reply could not be normalised: {detail}")]
    MalformedResponse { detail: String },

    /// The user declined to continue after an organization mismatch.
    #[error("Analysis cancelled: the PDF names '{pdf_company}' but '{selected}' is selected")]
    Cancelled {
        pdf_company: String,
        selected: String,
    },

    /// Another analysis is already in flight.
    #[error("An analysis is already running; wait for it to finish")]
    Busy,

    // ── Directory errors ──────────────────────────────────────────────────
    /// The GraphQL endpoint could not be reached or answered with non-2xx.
    #[error("Organization directory request to '{endpoint}' failed: {reason}")]
    DirectoryRequest { endpoint: String, reason: String },

    /// The GraphQL response carried an `errors` array.
    #[error("Organization directory error: {message}")]
    DirectoryError { message: String },

    /// The GraphQL response did not contain the expected data.
    #[error("Invalid organization directory response: {detail}")]
    InvalidDirectoryResponse { detail: String },

    /// No organization with the given id exists in the directory.
    #[error("Unknown organization '{id}'\nRun `cockpit-review orgs list` to see the available ids.")]
    UnknownOrganization { id: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// pdfium could not build the exported report.
    #[error("PDF export failed: {0}")]
    ExportFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide so the dynamic loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// True when the run was stopped by the user rather than by a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalysisError::Cancelled { .. })
    }
}
