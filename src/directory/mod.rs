//! Organization directory: where organizations, their prompts and checklist
//! taxonomies come from.
//!
//! Two sources implement [`OrganizationSource`]:
//!
//! * [`BuiltinDirectory`] — the static reference data compiled into the crate
//!   (works offline, used by tests and `--builtin`).
//! * [`GraphQlDirectory`] — the remote directory service, which can also
//!   store an edited prompt back.

mod builtin;
mod graphql;

pub use builtin::builtin_organizations;
pub(crate) use builtin::{
    ALERT_DETECTION, CLEAR_COMMUNICATION, ERROR_MANAGEMENT, STANDARD_PROCEDURES, TEAM_COORDINATION,
};
pub use graphql::{normalize_security_observations, GraphQlDirectory};

use crate::error::AnalysisError;
use crate::model::Organization;
use async_trait::async_trait;

/// Anything that can list organizations.
#[async_trait]
pub trait OrganizationSource: Send + Sync {
    async fn organizations(&self) -> Result<Vec<Organization>, AnalysisError>;
}

/// The static directory shipped with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDirectory;

#[async_trait]
impl OrganizationSource for BuiltinDirectory {
    async fn organizations(&self) -> Result<Vec<Organization>, AnalysisError> {
        Ok(builtin_organizations())
    }
}

#[async_trait]
impl OrganizationSource for GraphQlDirectory {
    async fn organizations(&self) -> Result<Vec<Organization>, AnalysisError> {
        self.fetch_organizations().await
    }
}

/// Look an organization up by id.
pub fn find_organization<'a>(
    organizations: &'a [Organization],
    id: &str,
) -> Result<&'a Organization, AnalysisError> {
    organizations
        .iter()
        .find(|org| org.id == id)
        .ok_or_else(|| AnalysisError::UnknownOrganization { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtin_source_lists_three() {
        let orgs = BuiltinDirectory.organizations().await.unwrap();
        assert_eq!(orgs.len(), 3);
    }

    #[test]
    fn find_known_and_unknown() {
        let orgs = builtin_organizations();
        assert_eq!(
            find_organization(&orgs, "AEROLINK001").unwrap().name,
            "AeroLink"
        );
        let err = find_organization(&orgs, "MISSING").unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownOrganization { .. }));
    }
}
