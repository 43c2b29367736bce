//! Text extraction: read the text layer of every page via pdfium.
//!
//! pdfium is not async-safe, so the work runs inside
//! `tokio::task::spawn_blocking`. Each blocking job binds its own pdfium
//! instance; the `thread_safe` feature serialises calls into the library.

use crate::error::AnalysisError;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Bind to pdfium for the current blocking task.
///
/// `Pdfium` holds raw library bindings and is neither `Send` nor `Sync`, so
/// each `spawn_blocking` job binds its own instance. Lookup order:
/// `PDFIUM_LIB_PATH`, a library in the working directory, then the system
/// library search path.
pub fn pdfium() -> Result<Pdfium, AnalysisError> {
    let lib_path = std::env::var("PDFIUM_LIB_PATH").ok();
    bind_pdfium(lib_path.as_deref().filter(|p| !p.is_empty()))
}

fn bind_pdfium(lib_path: Option<&str>) -> Result<Pdfium, AnalysisError> {
    let bindings = match lib_path {
        Some(path) => {
            debug!("Binding pdfium from PDFIUM_LIB_PATH={}", path);
            Pdfium::bind_to_library(path)
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| AnalysisError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

/// The text layer of a transcript PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedTranscript {
    /// File the text came from (display only).
    pub source: String,
    /// All pages joined with `\n`.
    pub text: String,
    /// Per-page text, in page order.
    pub pages: Vec<String>,
}

impl ExtractedTranscript {
    /// Build a transcript from already-extracted page texts.
    pub fn from_pages(source: impl Into<String>, pages: Vec<String>) -> Self {
        let text = pages.join("\n");
        Self {
            source: source.into(),
            text,
            pages,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }
}

/// Extract the text of every page of `pdf_path`.
///
/// # Errors
/// - `PasswordRequired` / `WrongPassword` for encrypted files
/// - `CorruptPdf` when pdfium cannot open the file
/// - `EmptyText` when the document has no text layer
pub async fn extract_text(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<ExtractedTranscript, AnalysisError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    let transcript =
        tokio::task::spawn_blocking(move || extract_text_blocking(&path, pwd.as_deref()))
            .await
            .map_err(|e| AnalysisError::Internal(format!("Extraction task panicked: {}", e)))??;

    let size_kb = tokio::fs::metadata(pdf_path)
        .await
        .map(|m| m.len() as f64 / 1024.0)
        .unwrap_or(0.0);
    info!(
        "Extracted '{}' ({:.2} KB): {} pages, {} chars, {} lines",
        transcript.source,
        size_kb,
        transcript.page_count(),
        transcript.char_count(),
        transcript.line_count()
    );
    debug!("Extracted text:\n{}", transcript.text);

    Ok(transcript)
}

/// Blocking implementation of text extraction.
fn extract_text_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<ExtractedTranscript, AnalysisError> {
    let pdfium = pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| classify_load_error(pdf_path, password.is_some(), e))?;

    let mut pages = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| AnalysisError::ExtractionFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?
            .all();
        debug!("Page {}: {} chars", idx + 1, text.len());
        pages.push(text);
    }

    let source = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| pdf_path.display().to_string());
    let transcript = ExtractedTranscript::from_pages(source, pages);

    if transcript.text.trim().is_empty() {
        return Err(AnalysisError::EmptyText {
            path: pdf_path.to_path_buf(),
        });
    }

    Ok(transcript)
}

fn classify_load_error(path: &Path, had_password: bool, e: PdfiumError) -> AnalysisError {
    let err_str = format!("{:?}", e);
    let path: PathBuf = path.to_path_buf();
    if err_str.contains("Password") || err_str.contains("password") {
        if had_password {
            AnalysisError::WrongPassword { path }
        } else {
            AnalysisError::PasswordRequired { path }
        }
    } else {
        AnalysisError::CorruptPdf {
            path,
            detail: err_str,
        }
    }
}
