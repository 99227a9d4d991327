//! services/api/src/adapters/moderation.rs
//!
//! Adapter for the OpenAI moderation endpoint.
//! It implements the `ModerationService` port from the `core` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tutor_core::domain::ModerationResult;
use tutor_core::ports::{ModerationService, PortError, PortResult};

#[derive(Serialize)]
struct ModerationRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct ModerationApiResponse {
    results: Vec<ModerationApiResult>,
}

#[derive(Deserialize)]
struct ModerationApiResult {
    flagged: bool,
    #[serde(default)]
    categories: HashMap<String, bool>,
}

impl ModerationApiResponse {
    /// Folds every result into one verdict: flagged if any input was flagged.
    fn into_domain(self) -> ModerationResult {
        let flagged = self.results.iter().any(|r| r.flagged);
        let categories: BTreeSet<String> = self
            .results
            .into_iter()
            .flat_map(|r| r.categories)
            .filter_map(|(name, hit)| hit.then_some(name))
            .collect();
        ModerationResult { flagged, categories }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct OpenAiModerationAdapter {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiModerationAdapter {
    /// Creates the adapter with its own short request timeout.
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl ModerationService for OpenAiModerationAdapter {
    async fn moderate(&self, text: &str) -> PortResult<ModerationResult> {
        let response = self
            .http
            .post(format!("{}/moderations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&ModerationRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Moderation request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| PortError::Unexpected(format!("Moderation API error: {}", e)))?;

        let body: ModerationApiResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Invalid moderation response: {}", e)))?;

        Ok(body.into_domain())
    }
}
