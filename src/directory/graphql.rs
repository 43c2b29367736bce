//! GraphQL organization directory client.
//!
//! Speaks plain GraphQL-over-HTTP: one JSON `POST` per operation carrying
//! `query` and optional `variables`. A response may contain both `data` and
//! an `errors` array; any error entry fails the whole operation with the
//! messages joined by ` | `.

use crate::error::AnalysisError;
use crate::model::{Organization, SafetyStandard};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

const ORGANIZATIONS_QUERY: &str = r#"
  query Organizations {
    organizations {
      id
      name
      pilots
      flightHours
      airships
      prompt
      securityObs
      generalObs
    }
  }
"#;

const UPDATE_PROMPT_MUTATION: &str = r#"
  mutation UpdateOrganizationPrompt($organizationId: ID!, $prompt: String!) {
    updateOrganizationPrompt(organizationId: $organizationId, prompt: $prompt) {
      id
      prompt
    }
  }
"#;

/// Client for the remote organization directory.
#[derive(Debug, Clone)]
pub struct GraphQlDirectory {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganizationsData {
    organizations: Option<Vec<ApiOrganization>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiOrganization {
    id: String,
    name: String,
    #[serde(default)]
    pilots: Option<f64>,
    #[serde(default)]
    flight_hours: Option<f64>,
    #[serde(default)]
    airships: Option<f64>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    security_obs: Option<Value>,
    #[serde(default)]
    general_obs: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePromptData {
    update_organization_prompt: Option<UpdatedPrompt>,
}

#[derive(Debug, Deserialize)]
struct UpdatedPrompt {
    prompt: Option<Value>,
}

impl GraphQlDirectory {
    /// Create a client for `endpoint` with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, AnalysisError> {
        let endpoint = endpoint.into();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AnalysisError::DirectoryRequest {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch every organization. A missing list is treated as empty.
    pub async fn fetch_organizations(&self) -> Result<Vec<Organization>, AnalysisError> {
        info!("Fetching organizations from {}", self.endpoint);
        let response: GraphQlResponse<OrganizationsData> = self
            .post(json!({ "query": ORGANIZATIONS_QUERY }))
            .await?;

        check_errors(&response.errors, "Failed to fetch organizations")?;

        let organizations: Vec<Organization> = response
            .data
            .and_then(|d| d.organizations)
            .unwrap_or_default()
            .into_iter()
            .map(transform_organization)
            .collect();

        debug!("Directory returned {} organizations", organizations.len());
        Ok(organizations)
    }

    /// Store a new prompt for an organization; returns the prompt the server kept.
    pub async fn update_prompt(
        &self,
        organization_id: &str,
        prompt: &str,
    ) -> Result<String, AnalysisError> {
        info!("Updating prompt for organization {}", organization_id);
        let response: GraphQlResponse<UpdatePromptData> = self
            .post(json!({
                "query": UPDATE_PROMPT_MUTATION,
                "variables": {
                    "organizationId": organization_id,
                    "prompt": prompt,
                },
            }))
            .await?;

        check_errors(&response.errors, "Failed to update organization prompt")?;

        match response
            .data
            .and_then(|d| d.update_organization_prompt)
            .and_then(|u| u.prompt)
        {
            Some(Value::String(updated)) => Ok(updated),
            _ => Err(AnalysisError::InvalidDirectoryResponse {
                detail: "updateOrganizationPrompt did not return a prompt string".into(),
            }),
        }
    }

    async fn post<T: DeserializeOwned>(&self, body: Value) -> Result<T, AnalysisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::DirectoryRequest {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(AnalysisError::DirectoryRequest {
                endpoint: self.endpoint.clone(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AnalysisError::InvalidDirectoryResponse {
                detail: e.to_string(),
            })
    }
}

fn check_errors(errors: &[GraphQlErrorEntry], fallback: &str) -> Result<(), AnalysisError> {
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors
        .iter()
        .filter_map(|e| e.message.as_deref())
        .filter(|m| !m.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");
    Err(AnalysisError::DirectoryError {
        message: if message.is_empty() {
            fallback.to_string()
        } else {
            message
        },
    })
}

fn transform_organization(api: ApiOrganization) -> Organization {
    Organization {
        id: api.id,
        name: api.name,
        pilots: to_count(api.pilots),
        average_flight_hours: to_count(api.flight_hours),
        fleet: to_count(api.airships),
        checklists: normalize_security_observations(api.security_obs.as_ref()),
        observations: api.general_obs.unwrap_or_default(),
        prompt: api.prompt.unwrap_or_default(),
    }
}

fn to_count(v: Option<f64>) -> u32 {
    v.filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.round() as u32)
        .unwrap_or(0)
}

/// Turn the directory's `securityObs` field into a checklist taxonomy.
///
/// Accepts `null`, an object, or a string holding a JSON object. Keys are
/// trimmed and empty keys dropped; a value may be a list of strings or one
/// string, blank entries are dropped, and standards left with no items are
/// omitted. Anything else yields an empty taxonomy.
pub fn normalize_security_observations(raw: Option<&Value>) -> Vec<SafetyStandard> {
    let parsed = match raw {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(v) => v,
            Err(e) => {
                warn!("securityObs is not valid JSON, ignoring it: {}", e);
                return Vec::new();
            }
        },
        Some(other) => other.clone(),
    };

    let Value::Object(map) = parsed else {
        return Vec::new();
    };

    map.into_iter()
        .filter_map(|(raw_key, raw_value)| {
            let name = raw_key.trim();
            if name.is_empty() {
                return None;
            }
            let items: Vec<String> = match raw_value {
                Value::Array(values) => values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
                _ => Vec::new(),
            };
            if items.is_empty() {
                None
            } else {
                Some(SafetyStandard {
                    name: name.to_string(),
                    items,
                })
            }
        })
        .collect()
}
