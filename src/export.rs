//! Getting a result out of the tool: a PDF report or the system clipboard.
//!
//! Both carry the plain-text rendering from
//! [`format_analysis_result`](crate::report::format_analysis_result).

use crate::error::AnalysisError;
use crate::model::AnalysisResult;
use crate::pipeline::extract::pdfium;
use crate::report::format_analysis_result;
use clipboard_rs::{Clipboard, ClipboardContext};
use pdfium_render::prelude::*;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

// A4 in points.
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 40.0;
const FONT_SIZE: f32 = 11.0;
const LINE_HEIGHT: f32 = 18.0;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// `analysis-<transcriptId>.pdf`
pub fn default_export_name(result: &AnalysisResult) -> String {
    format!("analysis-{}.pdf", result.transcript_id)
}

/// Characters that fit on one line of the printable width.
pub fn max_line_chars() -> usize {
    ((PAGE_WIDTH - 2.0 * MARGIN) / (FONT_SIZE * AVG_GLYPH_WIDTH)).floor() as usize
}

/// Word-wrap `text` to `width` characters.
///
/// Existing line breaks are kept, continuation lines repeat the source
/// line's indentation, and words longer than a line are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for line in text.lines() {
        let body = line.trim_start();
        let indent = &line[..line.len() - body.len()];
        let room = width.saturating_sub(indent.chars().count()).max(1);

        if body.is_empty() {
            out.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in body.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > room {
                if !current.is_empty() {
                    out.push(format!("{indent}{current}"));
                    current.clear();
                }
                let rest = word.split_off(room);
                out.push(format!("{indent}{}", word.iter().collect::<String>()));
                word = rest;
            }
            let word: String = word.into_iter().collect();
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > room && !current.is_empty() {
                out.push(format!("{indent}{current}"));
                current = word;
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(&word);
            }
        }
        if !current.is_empty() {
            out.push(format!("{indent}{current}"));
        }
    }
    out
}

/// Split wrapped lines into pages. A new page starts once the next baseline
/// would fall below the bottom margin.
pub fn paginate(lines: Vec<String>) -> Vec<Vec<String>> {
    let mut pages = Vec::new();
    let mut page = Vec::new();
    let mut cursor = MARGIN;
    for line in lines {
        if cursor > PAGE_HEIGHT - MARGIN {
            pages.push(std::mem::take(&mut page));
            cursor = MARGIN;
        }
        page.push(line);
        cursor += LINE_HEIGHT;
    }
    if !page.is_empty() || pages.is_empty() {
        pages.push(page);
    }
    pages
}

/// Write the plain-text rendering of `result` to a PDF at `path`.
///
/// Returns the number of pages written. The file is written to a temp name
/// next to `path` and renamed, so a failed export leaves no partial file.
pub async fn export_pdf(result: &AnalysisResult, path: &Path) -> Result<usize, AnalysisError> {
    let text = format_analysis_result(result);
    let target = path.to_path_buf();

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AnalysisError::OutputWriteFailed {
                path: target.clone(),
                source: e,
            })?;
    }

    let tmp_path = target.with_extension("pdf.tmp");
    let tmp = tmp_path.clone();
    let pages = tokio::task::spawn_blocking(move || write_pdf_blocking(&text, &tmp))
        .await
        .map_err(|e| AnalysisError::Internal(format!("Export task panicked: {}", e)))??;

    tokio::fs::rename(&tmp_path, &target)
        .await
        .map_err(|e| AnalysisError::OutputWriteFailed {
            path: target.clone(),
            source: e,
        })?;

    info!("Exported {} ({} pages)", target.display(), pages);
    Ok(pages)
}

fn write_pdf_blocking(text: &str, path: &Path) -> Result<usize, AnalysisError> {
    let pdfium = pdfium()?;
    let export_err = |e: PdfiumError| AnalysisError::ExportFailed(format!("{:?}", e));

    let mut document = pdfium.create_new_pdf().map_err(export_err)?;
    let font = document.fonts_mut().helvetica();

    let pages = paginate(wrap_text(text, max_line_chars()));
    for (idx, lines) in pages.iter().enumerate() {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .map_err(export_err)?;
        let mut baseline = MARGIN;
        for line in lines {
            if !line.is_empty() {
                page.objects_mut()
                    .create_text_object(
                        PdfPoints::new(MARGIN),
                        PdfPoints::new(PAGE_HEIGHT - baseline),
                        line,
                        font,
                        PdfPoints::new(FONT_SIZE),
                    )
                    .map_err(export_err)?;
            }
            baseline += LINE_HEIGHT;
        }
        debug!("Export page {}: {} lines", idx + 1, lines.len());
    }

    document.save_to_file(path).map_err(export_err)?;
    Ok(pages.len())
}

// ── Clipboard ────────────────────────────────────────────────────────────

/// On X11 the copying process owns the selection and serves it from a
/// thread tied to the clipboard context; the copy disappears with it.
const SELECTION_OWNED_BY_PROCESS: bool =
    cfg!(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))));

/// Keeps an X11 selection alive. Drop it once the text has been pasted or
/// taken over by a clipboard manager.
pub struct ClipboardGuard {
    _ctx: ClipboardContext,
}

impl fmt::Debug for ClipboardGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClipboardGuard")
    }
}

/// What happened to a clipboard copy.
#[derive(Debug)]
pub enum CopyOutcome {
    /// The system clipboard holds the text independently of this process.
    Copied,
    /// Copied, but only available while the guard is alive.
    Held(ClipboardGuard),
    /// The clipboard was unavailable; the caller should show the text for
    /// manual selection instead.
    Fallback(String),
}

/// Put `text` on the system clipboard.
pub fn copy_to_clipboard(text: &str) -> CopyOutcome {
    let ctx = match ClipboardContext::new() {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!("Clipboard unavailable: {}", e);
            return CopyOutcome::Fallback(e.to_string());
        }
    };
    if let Err(e) = ctx.set_text(text.to_string()) {
        warn!("Clipboard write failed: {}", e);
        return CopyOutcome::Fallback(e.to_string());
    }
    debug!("Copied {} chars to the clipboard", text.len());
    if SELECTION_OWNED_BY_PROCESS {
        CopyOutcome::Held(ClipboardGuard { _ctx: ctx })
    } else {
        CopyOutcome::Copied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::mock_result;

    #[test]
    fn export_name_uses_transcript_id() {
        let r = mock_result("SPARRING001", "TRANSCRIPT_42", "P");
        assert_eq!(default_export_name(&r), "analysis-TRANSCRIPT_42.pdf");
    }

    #[test]
    fn printable_width_in_chars() {
        // (595.28 - 80) / 5.5
        assert_eq!(max_line_chars(), 93);
    }

    #[test]
    fn wrap_keeps_short_lines_and_blanks() {
        let lines = wrap_text("a b\n\nc", 10);
        assert_eq!(lines, vec!["a b", "", "c"]);
    }

    #[test]
    fn wrap_breaks_on_words_and_keeps_indent() {
        let lines = wrap_text("    - [x] alpha beta gamma", 16);
        assert_eq!(lines, vec!["    - [x] alpha", "    beta gamma"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 16));
    }

    #[test]
    fn wrap_splits_overlong_words() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn paginate_overflows_to_new_page() {
        let lines: Vec<String> = (0..50).map(|i| format!("line {i}")).collect();
        let pages = paginate(lines);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].len(), 43);
        assert_eq!(pages[1].len(), 7);
        assert_eq!(pages[1][0], "line 43");
    }

    #[test]
    fn paginate_empty_is_one_blank_page() {
        let pages = paginate(Vec::new());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }

    #[test]
    fn headless_copy_falls_back_to_text() {
        if !SELECTION_OWNED_BY_PROCESS
            || std::env::var_os("DISPLAY").is_some()
            || std::env::var_os("WAYLAND_DISPLAY").is_some()
        {
            return;
        }
        assert!(matches!(
            copy_to_clipboard("Analysis Result"),
            CopyOutcome::Fallback(_)
        ));
    }

    #[test]
    fn x11_platforms_hold_the_selection() {
        if cfg!(target_os = "linux") {
            assert!(SELECTION_OWNED_BY_PROCESS);
        }
        if cfg!(any(target_os = "macos", windows)) {
            assert!(!SELECTION_OWNED_BY_PROCESS);
        }
    }
}
