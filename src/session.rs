//! Interactive session state: the loaded organizations, the current
//! selection, the editable prompt, the chosen file and the one result on
//! display.
//!
//! The session owns no I/O. A front end drives it around each run:
//!
//! ```text
//! begin_analysis() ─▶ analyze(...) ─▶ finish_analysis(result) | fail_analysis()
//! ```
//!
//! The busy flag allows at most one run at a time, and a failed or cancelled
//! run leaves the previous result in place.

use crate::error::AnalysisError;
use crate::model::{AnalysisResult, Organization};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Session {
    organizations: Vec<Organization>,
    selected: Option<usize>,
    prompt: String,
    file: Option<PathBuf>,
    result: Option<AnalysisResult>,
    busy: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the organization list.
    ///
    /// The current selection survives when its id is still present (with
    /// the refreshed data, the edited prompt kept); otherwise the first
    /// organization is selected. A reload that keeps the selection is not a
    /// selection change: unlike [`Session::select`], it neither resets the
    /// prompt to the refreshed template nor clears the displayed result.
    pub fn load(&mut self, organizations: Vec<Organization>) {
        let previous = self.selected_organization().map(|o| o.id.clone());
        self.organizations = organizations;

        let kept = previous
            .as_deref()
            .and_then(|id| self.organizations.iter().position(|o| o.id == id));
        match kept {
            Some(idx) => self.selected = Some(idx),
            None => {
                self.selected = (!self.organizations.is_empty()).then_some(0);
                self.prompt = self
                    .selected_organization()
                    .map(|o| o.prompt.clone())
                    .unwrap_or_default();
                self.result = None;
            }
        }
        debug!(
            "Session loaded {} organizations, selected {:?}",
            self.organizations.len(),
            self.selected_organization().map(|o| &o.id)
        );
    }

    pub fn organizations(&self) -> &[Organization] {
        &self.organizations
    }

    pub fn selected_organization(&self) -> Option<&Organization> {
        self.selected.and_then(|idx| self.organizations.get(idx))
    }

    /// Switch organization: reset the prompt to its template and clear the
    /// displayed result.
    pub fn select(&mut self, id: &str) -> Result<&Organization, AnalysisError> {
        let idx = self
            .organizations
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| AnalysisError::UnknownOrganization { id: id.to_string() })?;
        self.selected = Some(idx);
        self.prompt = self.organizations[idx].prompt.clone();
        self.result = None;
        Ok(&self.organizations[idx])
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Store the edited prompt into the selected organization (after it was
    /// saved to the directory).
    pub fn commit_prompt(&mut self) {
        if let Some(idx) = self.selected {
            self.organizations[idx].prompt = self.prompt.clone();
        }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn set_file(&mut self, path: impl Into<PathBuf>) {
        self.file = Some(path.into());
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// File, organization and a non-blank prompt are present and nothing is running.
    pub fn can_analyze(&self) -> bool {
        self.file.is_some()
            && self.selected_organization().is_some()
            && !self.prompt.trim().is_empty()
            && !self.busy
    }

    /// Mark a run as started.
    ///
    /// # Errors
    /// `Busy` while another run is in flight; `InvalidConfig` when the
    /// inputs are incomplete.
    pub fn begin_analysis(&mut self) -> Result<(), AnalysisError> {
        if self.busy {
            return Err(AnalysisError::Busy);
        }
        if !self.can_analyze() {
            return Err(AnalysisError::InvalidConfig(
                "select a PDF, an organization and a non-empty prompt first".into(),
            ));
        }
        self.busy = true;
        Ok(())
    }

    /// Replace the displayed result and clear the busy flag.
    pub fn finish_analysis(&mut self, result: AnalysisResult) {
        self.result = Some(result);
        self.busy = false;
    }

    /// Clear the busy flag; the previous result stays.
    pub fn fail_analysis(&mut self) {
        self.busy = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::builtin_organizations;
    use crate::fallback::mock_result;

    fn loaded() -> Session {
        let mut s = Session::new();
        s.load(builtin_organizations());
        s
    }

    #[test]
    fn load_selects_first() {
        let s = loaded();
        assert_eq!(s.selected_organization().unwrap().id, "SPARRING001");
        assert_eq!(s.prompt(), builtin_organizations()[0].prompt);
    }

    #[test]
    fn load_empty_means_no_selection() {
        let mut s = Session::new();
        s.load(Vec::new());
        assert!(s.selected_organization().is_none());
        assert_eq!(s.prompt(), "");
    }

    #[test]
    fn reload_keeps_selection_and_edits() {
        let mut s = loaded();
        s.select("FLYSAFE001").unwrap();
        s.set_prompt("edited");
        s.set_file("cvr.pdf");
        s.begin_analysis().unwrap();
        s.finish_analysis(mock_result("FLYSAFE001", "T1", "P1"));

        s.load(builtin_organizations());
        assert_eq!(s.selected_organization().unwrap().id, "FLYSAFE001");
        assert_eq!(s.prompt(), "edited");
        assert_eq!(s.result().unwrap().transcript_id, "T1");
    }

    #[test]
    fn select_resets_prompt_and_clears_result() {
        let mut s = loaded();
        s.set_file("cvr.pdf");
        s.set_prompt("edited");
        s.begin_analysis().unwrap();
        s.finish_analysis(mock_result("SPARRING001", "T", "P"));
        assert!(s.result().is_some());

        let org = s.select("AEROLINK001").unwrap();
        assert_eq!(org.name, "AeroLink");
        assert!(s.result().is_none());
        assert!(s.prompt().contains("AeroLink"));
    }

    #[test]
    fn unknown_selection_is_an_error() {
        let mut s = loaded();
        assert!(matches!(
            s.select("NOPE"),
            Err(AnalysisError::UnknownOrganization { .. })
        ));
        assert_eq!(s.selected_organization().unwrap().id, "SPARRING001");
    }

    #[test]
    fn can_analyze_requires_everything() {
        let mut s = loaded();
        assert!(!s.can_analyze());
        s.set_file("cvr.pdf");
        assert!(s.can_analyze());
        s.set_prompt("   ");
        assert!(!s.can_analyze());
    }

    #[test]
    fn busy_flag_serialises_runs() {
        let mut s = loaded();
        s.set_file("cvr.pdf");
        s.begin_analysis().unwrap();
        assert!(!s.can_analyze());
        assert!(matches!(s.begin_analysis(), Err(AnalysisError::Busy)));
        s.fail_analysis();
        assert!(s.begin_analysis().is_ok());
    }

    #[test]
    fn failure_keeps_previous_result() {
        let mut s = loaded();
        s.set_file("cvr.pdf");
        s.begin_analysis().unwrap();
        s.finish_analysis(mock_result("SPARRING001", "T1", "P"));
        s.begin_analysis().unwrap();
        s.fail_analysis();
        assert_eq!(s.result().unwrap().transcript_id, "T1");
        assert!(!s.is_busy());
    }

    #[test]
    fn commit_prompt_updates_organization() {
        let mut s = loaded();
        s.set_prompt("new template");
        s.commit_prompt();
        assert_eq!(s.selected_organization().unwrap().prompt, "new template");
    }
}
