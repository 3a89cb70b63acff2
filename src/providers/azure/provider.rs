use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::aggregation::{AggregationOptions, Aggregator};
use crate::auth::Token;
use crate::catalog::AggregationResult;
use crate::error::Result;
use crate::notify::NotificationChannel;

use super::client::AzureDevOpsClient;

/// Azure DevOps pipeline catalog provider.
///
/// Wires an [`AzureDevOpsClient`] into an [`Aggregator`] so callers only deal
/// with a project name, an optional recipient and an optional deadline.
pub struct AzureDevOpsProvider {
    aggregator: Aggregator,
    organization: String,
}

impl AzureDevOpsProvider {
    /// Creates a provider for one organization.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Service root (e.g., <https://dev.azure.com>)
    /// * `organization` - Organization name
    /// * `token` - Optional personal access token
    /// * `api_version` - REST API version, defaults to 7.1
    /// * `channel` - Where progress events are delivered
    ///
    /// # Errors
    ///
    /// Returns an error if the organization is empty or the base URL is invalid.
    pub fn new(
        base_url: &str,
        organization: &str,
        token: Option<Token>,
        api_version: Option<&str>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Result<Self> {
        let client = AzureDevOpsClient::new(base_url, organization, token, api_version)?;
        let aggregator = Aggregator::new(
            Arc::new(client),
            channel,
            base_url.trim_end_matches('/'),
            organization.trim(),
        );

        Ok(Self {
            aggregator,
            organization: organization.trim().to_string(),
        })
    }

    #[must_use]
    pub fn with_options(mut self, options: AggregationOptions) -> Self {
        self.aggregator = self.aggregator.with_options(options);
        self
    }

    /// Builds the pipeline catalog of `project`.
    ///
    /// Progress goes to `recipient` when given. With a `timeout`, an unfinished
    /// aggregation is abandoned and reported as failed.
    pub async fn collect_catalog(
        &self,
        project: &str,
        recipient: Option<&str>,
        timeout: Option<Duration>,
    ) -> AggregationResult {
        info!(
            "Collecting pipeline catalog for {}/{project}",
            self.organization
        );

        match timeout {
            Some(limit) => {
                self.aggregator
                    .aggregate_with_timeout(project, recipient, limit)
                    .await
            }
            None => self.aggregator.aggregate(project, recipient).await,
        }
    }
}
