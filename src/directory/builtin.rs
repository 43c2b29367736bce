//! Static organization reference data.

use crate::model::{Organization, SafetyStandard};

pub(crate) const ERROR_MANAGEMENT: &str = "Error and Interruption Management";
pub(crate) const STANDARD_PROCEDURES: &str = "Standard Operating Procedures";
pub(crate) const CLEAR_COMMUNICATION: &str = "Clear and Confirmed Communication";
pub(crate) const ALERT_DETECTION: &str = "Alert and Anomaly Detection";
pub(crate) const TEAM_COORDINATION: &str = "Coordination and Teamwork";

/// The three organizations bundled with the crate.
pub fn builtin_organizations() -> Vec<Organization> {
    vec![sparring(), aerolink(), flysafe()]
}

fn sparring() -> Organization {
    Organization {
        id: "SPARRING001".into(),
        name: "Sparring Airlines".into(),
        pilots: 4,
        average_flight_hours: 1250,
        fleet: 3,
        checklists: vec![
            SafetyStandard::new(
                ERROR_MANAGEMENT,
                &[
                    "Confirmation of critical instructions",
                    "Objective, unambiguous language",
                    "Correct execution of contingency procedures",
                ],
            ),
            SafetyStandard::new(
                STANDARD_PROCEDURES,
                &[
                    "Complete flight checklist execution",
                    "Compliance with operational safety protocols",
                ],
            ),
            SafetyStandard::new(
                CLEAR_COMMUNICATION,
                &[
                    "Confirmed understanding between pilot and copilot",
                    "Clear and precise terminology",
                ],
            ),
        ],
        observations: "Cockpit communication monitoring, focus on emergencies and critical \
checklists, follow-up of reported failures."
            .into(),
        prompt: "Analyse the cockpit transcript against Sparring Airlines safety standards:

Core standards:
- Error and Interruption Management (confirmation of critical instructions, objective language, contingency procedures)
- Standard Operating Procedures (complete checklists, safety protocols)
- Clear and Confirmed Communication (crew understanding, precise terminology)

Special focus: emergencies, critical checklists and cockpit communication.

Give detailed feedback for every pattern identified."
            .into(),
    }
}

fn aerolink() -> Organization {
    Organization {
        id: "AEROLINK001".into(),
        name: "AeroLink".into(),
        pilots: 6,
        average_flight_hours: 980,
        fleet: 5,
        checklists: vec![
            SafetyStandard::new(
                ERROR_MANAGEMENT,
                &[
                    "Confirmation of critical instructions",
                    "Objective, unambiguous language",
                ],
            ),
            SafetyStandard::new(
                STANDARD_PROCEDURES,
                &[
                    "Compliance with operational safety protocols",
                    "Adherence to recommended practices and regulations",
                ],
            ),
            SafetyStandard::new(
                ALERT_DETECTION,
                &[
                    "Rapid identification of technical failures",
                    "Immediate communication of alerts to the crew",
                ],
            ),
            SafetyStandard::new(
                TEAM_COORDINATION,
                &[
                    "Clear task distribution during operations",
                    "Cooperation on critical decisions",
                ],
            ),
        ],
        observations: "Focus on crew coordination and fast response to system alerts, \
continuous emergency-management training."
            .into(),
        prompt: "Analyse the cockpit transcript against AeroLink safety standards:

Core standards:
- Error and Interruption Management (critical confirmation, objective language)
- Standard Operating Procedures (safety protocols, recommended practices)
- Alert and Anomaly Detection (rapid identification, alert communication)
- Coordination and Teamwork (task distribution, cooperative decisions)

Special focus: crew coordination, system alerts and emergency management.

Give detailed feedback for every pattern identified."
            .into(),
    }
}

fn flysafe() -> Organization {
    Organization {
        id: "FLYSAFE001".into(),
        name: "FlySafe Aviation".into(),
        pilots: 50,
        average_flight_hours: 1100,
        fleet: 80,
        checklists: vec![
            SafetyStandard::new(
                CLEAR_COMMUNICATION,
                &[
                    "Confirmation of critical instructions",
                    "Objective, unambiguous language",
                ],
            ),
            SafetyStandard::new(
                ALERT_DETECTION,
                &[
                    "Observation of external conditions (weather, traffic)",
                    "Immediate communication of alerts to the crew",
                ],
            ),
            SafetyStandard::new(
                TEAM_COORDINATION,
                &[
                    "Synchronised emergency actions",
                    "Cooperation on critical decisions",
                ],
            ),
            SafetyStandard::new(
                STANDARD_PROCEDURES,
                &[
                    "Complete flight checklist execution",
                    "Adherence to recommended practices",
                ],
            ),
            SafetyStandard::new(
                ERROR_MANAGEMENT,
                &[
                    "Timely recognition and correction of errors",
                    "Continuity of operations despite interruptions",
                ],
            ),
        ],
        observations: "Extensive emergency monitoring, checklist execution and response to \
multiple failures; focus on operational safety, continuous training and internal audits."
            .into(),
        prompt: "Analyse the cockpit transcript against FlySafe Aviation safety standards:

Core standards:
- Clear and Confirmed Communication (critical confirmation, objective language)
- Alert and Anomaly Detection (external conditions, alert communication)
- Coordination and Teamwork (emergency synchronisation, cooperation)
- Standard Operating Procedures (complete checklists, recommended practices)
- Error and Interruption Management (timely correction, operational continuity)

Special focus: extended emergencies, multiple checklists, operational safety and audits.

Give detailed feedback for every pattern identified."
            .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let orgs = builtin_organizations();
        let mut ids: Vec<&str> = orgs.iter().map(|o| o.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), orgs.len());
    }

    #[test]
    fn every_standard_has_items() {
        for org in builtin_organizations() {
            assert!(!org.prompt.trim().is_empty(), "{} has no prompt", org.id);
            for standard in &org.checklists {
                assert!(!standard.items.is_empty(), "{}: {}", org.id, standard.name);
            }
        }
    }

    #[test]
    fn flysafe_standard_order() {
        let orgs = builtin_organizations();
        let flysafe = orgs.iter().find(|o| o.id == "FLYSAFE001").unwrap();
        assert_eq!(flysafe.safety_standards().len(), 5);
        assert_eq!(flysafe.safety_standards()[0], CLEAR_COMMUNICATION);
    }
}
