//! Fixed demo results, used in place of a failed model call when
//! [`FallbackPolicy::Mock`](crate::config::FallbackPolicy::Mock) is set.
//!
//! Each checklist item sits in its own single-entry checklist, the same
//! shape the demo data has always had.

use crate::directory::{
    ALERT_DETECTION, CLEAR_COMMUNICATION, ERROR_MANAGEMENT, STANDARD_PROCEDURES, TEAM_COORDINATION,
};
use crate::model::{AnalysisResult, Checklist, Pattern};

/// Mock result for `organization_id`; unknown ids get the `SPARRING001` set.
///
/// The ids passed in are stamped on the result unchanged.
pub fn mock_result(organization_id: &str, transcript_id: &str, pilot_id: &str) -> AnalysisResult {
    let patterns = match organization_id {
        "AEROLINK001" => aerolink(),
        "FLYSAFE001" => flysafe(),
        _ => sparring(),
    };
    AnalysisResult {
        transcript_id: transcript_id.to_string(),
        organization_id: organization_id.to_string(),
        pilot_id: pilot_id.to_string(),
        patterns,
        flight_metadata: None,
    }
}

fn pattern(title: &str, feedback: &str, items: &[(&str, bool)]) -> Pattern {
    Pattern {
        title: title.to_string(),
        feedback: feedback.to_string(),
        checklists: items
            .iter()
            .map(|(item, passed)| Checklist::new().with(*item, *passed))
            .collect(),
    }
}

fn sparring() -> Vec<Pattern> {
    vec![
        pattern(
            ERROR_MANAGEMENT,
            "Analysis based on the transcript extracted from the PDF. The pilot recovered well \
             after the checklist interruption, acknowledging the error and correcting the procedure.",
            &[
                ("Confirmation of critical instructions", true),
                ("Objective, unambiguous language", true),
                ("Correct execution of contingency procedures", true),
            ],
        ),
        pattern(
            STANDARD_PROCEDURES,
            "Initial lapse in following the checklist, corrected after the copilot intervened. \
             Procedure discipline needs reinforcement.",
            &[
                ("Complete flight checklist execution", false),
                ("Compliance with operational safety protocols", true),
            ],
        ),
        pattern(
            CLEAR_COMMUNICATION,
            "Good communication within the crew and with ATC. The copilot was appropriately \
             assertive when interrupting the incorrect procedure.",
            &[
                ("Confirmed understanding between pilot and copilot", true),
                ("Clear and precise terminology", true),
            ],
        ),
    ]
}

fn aerolink() -> Vec<Pattern> {
    vec![
        pattern(
            TEAM_COORDINATION,
            "Excellent CRM example. The copilot intervened appropriately and the pilot accepted \
             the correction professionally, showing good team dynamics.",
            &[
                ("Clear task distribution during operations", true),
                ("Cooperation on critical decisions", true),
            ],
        ),
        pattern(
            ALERT_DETECTION,
            "The copilot showed excellent vigilance in detecting the incomplete checklist and \
             communicated the procedural anomaly immediately and effectively.",
            &[
                ("Rapid identification of technical failures", true),
                ("Immediate communication of alerts to the crew", true),
            ],
        ),
    ]
}

fn flysafe() -> Vec<Pattern> {
    vec![
        pattern(
            CLEAR_COMMUNICATION,
            "Clear, professional communication throughout the procedure. Good coordination with \
             ATC and within the crew.",
            &[
                ("Confirmation of critical instructions", true),
                ("Objective, unambiguous language", true),
            ],
        ),
        pattern(
            ERROR_MANAGEMENT,
            "The pilot promptly acknowledged the error and accepted the correction. Good recovery \
             and operational continuity after the interruption.",
            &[
                ("Timely recognition and correction of errors", true),
                ("Continuity of operations despite interruptions", true),
            ],
        ),
        pattern(
            STANDARD_PROCEDURES,
            "Initial lapse in following the checklist, with adequate correction. More procedural \
             discipline is needed.",
            &[
                ("Complete flight checklist execution", false),
                ("Adherence to recommended practices", true),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PatternStatus;

    #[test]
    fn per_organization_sets() {
        assert_eq!(mock_result("SPARRING001", "T", "P").patterns.len(), 3);
        assert_eq!(mock_result("AEROLINK001", "T", "P").patterns.len(), 2);
        assert_eq!(mock_result("FLYSAFE001", "T", "P").patterns.len(), 3);
    }

    #[test]
    fn unknown_organization_uses_sparring_set() {
        let r = mock_result("NEWCO", "T1", "P1");
        assert_eq!(r.organization_id, "NEWCO");
        assert_eq!(r.transcript_id, "T1");
        assert_eq!(r.pilot_id, "P1");
        assert_eq!(r.patterns, mock_result("SPARRING001", "T1", "P1").patterns);
    }

    #[test]
    fn single_item_checklists() {
        let r = mock_result("SPARRING001", "T", "P");
        assert!(r.patterns.iter().all(|p| p.checklists.iter().all(|c| c.len() == 1)));
        // 1 of 2 passed.
        assert_eq!(r.patterns[1].status(), PatternStatus::Critical);
        assert_eq!(r.patterns[0].status(), PatternStatus::Excellent);
    }
}
