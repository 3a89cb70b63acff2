use super::core::AzureDevOpsClient;
use crate::error::Result;
use crate::gateway::Run;
use crate::providers::azure::types::{Build, ListResponse};

impl AzureDevOpsClient {
    /// Fetches the most recently queued build of a definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn get_latest_run(&self, project: &str, definition_id: u64) -> Result<Option<Run>> {
        let mut url = self.api_url(project, "build/builds")?;
        url.query_pairs_mut()
            .append_pair("definitions", &definition_id.to_string())
            .append_pair("$top", "1")
            .append_pair("queryOrder", "queueTimeDescending");

        let response: ListResponse<Build> = self.get_json(url).await?;
        Ok(response.value.into_iter().next().map(Run::from))
    }
}
