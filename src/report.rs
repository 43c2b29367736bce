//! Rendering an [`AnalysisResult`] for people.
//!
//! [`format_analysis_result`] is the plain-text form shared by the PDF export
//! and the clipboard. [`render_terminal`] is the coloured feedback view with
//! a status badge per pattern.

use crate::model::{AnalysisResult, Pattern, PatternStatus};
use std::fmt::Write as _;

/// Plain-text rendering: a header block, then one block per pattern, all
/// separated by blank lines. The header ends with an empty section, so three
/// blank lines sit between the pilot line and the first pattern.
///
/// ```text
/// Analysis Result
///
/// Transcript ID: TRANSCRIPT_1
///
/// Organization: SPARRING001
///
/// Pilot: PILOT_042
///
///
///
/// 1. Standard Operating Procedures
/// Feedback: ...
///   Checklist 1:
///     - [ ] Complete flight checklist execution
///     - [x] Compliance with operational safety protocols
/// ```
pub fn format_analysis_result(result: &AnalysisResult) -> String {
    let mut sections = vec![
        "Analysis Result".to_string(),
        format!("Transcript ID: {}", result.transcript_id),
        format!("Organization: {}", result.organization_id),
        format!("Pilot: {}", result.pilot_id),
        String::new(),
    ];
    sections.extend(
        result
            .patterns
            .iter()
            .enumerate()
            .map(|(idx, pattern)| format_pattern(idx + 1, pattern)),
    );
    sections.join("\n\n")
}

fn format_pattern(number: usize, pattern: &Pattern) -> String {
    let mut lines = vec![
        format!("{}. {}", number, pattern.title),
        format!("Feedback: {}", pattern.feedback),
    ];
    for (idx, checklist) in pattern.checklists.iter().enumerate() {
        lines.push(format!("  Checklist {}:", idx + 1));
        for (item, passed) in checklist.iter() {
            lines.push(format!("    - [{}] {}", if passed { 'x' } else { ' ' }, item));
        }
    }
    lines.join("\n")
}

// ── Terminal view ────────────────────────────────────────────────────────

/// Colour scheme for [`render_terminal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
    /// No escape codes (pipes, `NO_COLOR`).
    Plain,
}

impl Theme {
    pub fn from_dark_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    fn paint(self, code_light: &str, code_dark: &str, s: &str) -> String {
        match self {
            Theme::Plain => s.to_string(),
            Theme::Light => format!("\x1b[{code_light}m{s}\x1b[0m"),
            Theme::Dark => format!("\x1b[{code_dark}m{s}\x1b[0m"),
        }
    }

    fn bold(self, s: &str) -> String {
        self.paint("1", "1;97", s)
    }

    fn dim(self, s: &str) -> String {
        self.paint("2", "37", s)
    }

    fn accent(self, s: &str) -> String {
        self.paint("34", "94", s)
    }

    fn ok(self, s: &str) -> String {
        self.paint("32", "92", s)
    }

    fn warn(self, s: &str) -> String {
        self.paint("33", "93", s)
    }

    fn bad(self, s: &str) -> String {
        self.paint("31", "91", s)
    }

    fn status(self, status: PatternStatus) -> String {
        let badge = match status {
            PatternStatus::Excellent => format!("✓ {}", status),
            PatternStatus::Partial => format!("⚠ {}", status),
            PatternStatus::Critical => format!("✗ {}", status),
        };
        match status {
            PatternStatus::Excellent => self.ok(&badge),
            PatternStatus::Partial => self.warn(&badge),
            PatternStatus::Critical => self.bad(&badge),
        }
    }
}

/// Coloured feedback view for the terminal.
pub fn render_terminal(result: &AnalysisResult, theme: Theme) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", theme.bold("Analysis Result"));
    let _ = writeln!(
        out,
        "{}",
        theme.dim(&format!(
            "Transcript ID: {} | Organization: {} | Pilot: {}",
            result.transcript_id, result.organization_id, result.pilot_id
        ))
    );
    if let Some(ref meta) = result.flight_metadata {
        let flight: Vec<&str> = [
            meta.flight_number.as_deref(),
            meta.aircraft.as_deref(),
            meta.route.as_deref(),
            meta.date.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !flight.is_empty() {
            let _ = writeln!(out, "{}", theme.dim(&format!("Flight: {}", flight.join(" · "))));
        }
    }

    for pattern in &result.patterns {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}  {}  {}",
            theme.accent(&pattern.title),
            theme.status(pattern.status()),
            theme.dim(&format!(
                "{}/{} ({}%)",
                pattern.passed_items(),
                pattern.total_items(),
                pattern.completion_percentage()
            ))
        );
        if !pattern.feedback.is_empty() {
            let _ = writeln!(out, "  {}", pattern.feedback);
        }
        for checklist in &pattern.checklists {
            for (item, passed) in checklist.iter() {
                let mark = if passed { theme.ok("✓") } else { theme.bad("✗") };
                let _ = writeln!(out, "    {} {}", mark, item);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::mock_result;
    use crate::model::{Checklist, FlightMetadata};

    fn sample() -> AnalysisResult {
        AnalysisResult {
            transcript_id: "TRANSCRIPT_1".into(),
            organization_id: "SPARRING001".into(),
            pilot_id: "PILOT_042".into(),
            patterns: vec![
                Pattern {
                    title: "Standard Operating Procedures".into(),
                    feedback: "Checklist interrupted.".into(),
                    checklists: vec![Checklist::new()
                        .with("Complete flight checklist execution", false)
                        .with("Compliance with operational safety protocols", true)],
                },
                Pattern {
                    title: "Clear and Confirmed Communication".into(),
                    feedback: "Good readbacks.".into(),
                    checklists: vec![
                        Checklist::new().with("Readback", true),
                        Checklist::new().with("Callouts", true),
                    ],
                },
            ],
            flight_metadata: None,
        }
    }

    #[test]
    fn plain_text_layout() {
        let text = format_analysis_result(&sample());
        let expected = [
            "Analysis Result",
            "",
            "Transcript ID: TRANSCRIPT_1",
            "",
            "Organization: SPARRING001",
            "",
            "Pilot: PILOT_042",
            "",
            "",
            "",
            "1. Standard Operating Procedures",
            "Feedback: Checklist interrupted.",
            "  Checklist 1:",
            "    - [ ] Complete flight checklist execution",
            "    - [x] Compliance with operational safety protocols",
            "",
            "2. Clear and Confirmed Communication",
            "Feedback: Good readbacks.",
            "  Checklist 1:",
            "    - [x] Readback",
            "  Checklist 2:",
            "    - [x] Callouts",
        ]
        .join("\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn plain_text_covers_every_entry() {
        let result = mock_result("FLYSAFE001", "T", "P");
        let text = format_analysis_result(&result);
        for pattern in &result.patterns {
            assert!(text.contains(&pattern.title));
            assert!(text.contains(&pattern.feedback));
            for checklist in &pattern.checklists {
                for (item, _) in checklist.iter() {
                    assert!(text.contains(item), "missing {item}");
                }
            }
        }
    }

    #[test]
    fn no_patterns_is_header_only() {
        let mut result = sample();
        result.patterns.clear();
        assert!(format_analysis_result(&result).ends_with("Pilot: PILOT_042\n\n"));
    }

    #[test]
    fn terminal_plain_shows_badges() {
        let view = render_terminal(&sample(), Theme::Plain);
        assert!(!view.contains('\x1b'));
        assert!(view.contains("✗ Critical"));
        assert!(view.contains("✓ Excellent"));
        assert!(view.contains("1/2 (50%)"));
        assert!(view.contains("    ✗ Complete flight checklist execution"));
    }

    #[test]
    fn terminal_themes_differ() {
        let light = render_terminal(&sample(), Theme::from_dark_mode(false));
        let dark = render_terminal(&sample(), Theme::from_dark_mode(true));
        assert!(light.contains("\x1b[32m"));
        assert!(dark.contains("\x1b[92m"));
        assert_ne!(light, dark);
    }

    #[test]
    fn terminal_shows_flight_line() {
        let mut result = sample();
        result.flight_metadata = Some(FlightMetadata {
            flight_number: Some("4521".into()),
            route: Some("GRU-SDU".into()),
            ..Default::default()
        });
        let view = render_terminal(&result, Theme::Plain);
        assert!(view.contains("Flight: 4521 · GRU-SDU"));
    }
}
