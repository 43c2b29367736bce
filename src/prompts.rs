//! Prompts for CRM transcript analysis.
//!
//! The model receives two messages: the fixed system instructions below
//! (role + exact reply schema) and a composite user message built by
//! [`compose_prompt`] from the organization prompt, its checklist taxonomy
//! and the transcript text.
//!
//! Callers can override the instructions via
//! [`crate::config::AnalysisConfig::system_prompt`].

use crate::model::Organization;
use std::fmt::Write as _;

/// Default system instructions for transcript analysis.
pub const SYSTEM_INSTRUCTIONS: &str = r#"You are an aviation safety analyst specialised in Crew Resource Management (CRM). You evaluate cockpit voice transcripts against an operator's safety standards.

Follow these rules precisely:

1. EVIDENCE
   - Base every judgement on what the transcript actually shows
   - Quote or paraphrase the relevant exchange in the feedback
   - If the transcript gives no evidence for a checklist item, mark it false

2. SCOPE
   - Produce one pattern per safety standard listed in the taxonomy
   - Use the standard name exactly as given for the pattern title
   - Use the checklist item names exactly as given

3. OUTPUT FORMAT
   - Reply with ONE JSON object and nothing else
   - Do NOT add commentary before or after the JSON
   - The object must have this shape:
     {
       "pilotId": "<pilot name or identifier if the transcript names one, else empty>",
       "patterns": [
         {
           "title": "<safety standard name>",
           "feedback": "<2-4 sentences of specific, actionable feedback>",
           "checklists": [
             { "<checklist item name>": true, "<checklist item name>": false }
           ]
         }
       ]
     }"#;

/// Render the organization's safety standards and checklist items.
pub fn render_taxonomy(organization: &Organization) -> String {
    if organization.checklists.is_empty() {
        return "(no checklist taxonomy configured)\n".to_string();
    }
    let mut out = String::new();
    for standard in &organization.checklists {
        let _ = writeln!(out, "- {}", standard.name);
        for item in &standard.items {
            let _ = writeln!(out, "  - {}", item);
        }
    }
    out
}

/// Build the user message: organization prompt, taxonomy and transcript.
///
/// `prompt` is the (possibly user-edited) organization prompt; it is used as
/// given rather than re-read from `organization`.
pub fn compose_prompt(organization: &Organization, prompt: &str, transcript: &str) -> String {
    format!(
        "ORGANIZATION: {name} ({id})\n\n\
         ANALYSIS INSTRUCTIONS:\n{prompt}\n\n\
         SAFETY STANDARDS AND CHECKLIST ITEMS:\n{taxonomy}\n\
         TRANSCRIPT:\n\"\"\"\n{transcript}\n\"\"\"",
        name = organization.name,
        id = organization.id,
        prompt = prompt.trim(),
        taxonomy = render_taxonomy(organization),
        transcript = transcript.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::builtin_organizations;

    #[test]
    fn instructions_demand_json() {
        assert!(SYSTEM_INSTRUCTIONS.contains("ONE JSON object"));
        assert!(SYSTEM_INSTRUCTIONS.contains("\"patterns\""));
    }

    #[test]
    fn taxonomy_lists_every_item() {
        let orgs = builtin_organizations();
        let rendered = render_taxonomy(&orgs[0]);
        for standard in &orgs[0].checklists {
            assert!(rendered.contains(&format!("- {}", standard.name)));
            for item in &standard.items {
                assert!(rendered.contains(&format!("  - {}", item)));
            }
        }
    }

    #[test]
    fn empty_taxonomy_is_explicit() {
        let mut org = builtin_organizations().remove(0);
        org.checklists.clear();
        assert!(render_taxonomy(&org).contains("no checklist taxonomy"));
    }

    #[test]
    fn composite_prompt_sections_in_order() {
        let orgs = builtin_organizations();
        let p = compose_prompt(&orgs[1], "  Edited prompt.  ", "CAPT: gear down");
        let org_at = p.find("ORGANIZATION: AeroLink (AEROLINK001)").unwrap();
        let prompt_at = p.find("Edited prompt.").unwrap();
        let taxonomy_at = p.find("SAFETY STANDARDS").unwrap();
        let transcript_at = p.find("CAPT: gear down").unwrap();
        assert!(org_at < prompt_at && prompt_at < taxonomy_at && taxonomy_at < transcript_at);
        // The stored template is not used when an edited prompt is given.
        assert!(!p.contains("Analyse the cockpit transcript against AeroLink"));
    }
}
