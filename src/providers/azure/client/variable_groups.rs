use log::debug;

use super::core::AzureDevOpsClient;
use crate::catalog::ConfigurationGroup;
use crate::error::Result;
use crate::providers::azure::links::PipelineLinks;
use crate::providers::azure::types::{ListResponse, VariableGroup};

impl AzureDevOpsClient {
    /// Lists the project's variable groups. Secret values are never returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn list_configuration_groups(
        &self,
        project: &str,
    ) -> Result<Vec<ConfigurationGroup>> {
        let url = self.api_url(project, "distributedtask/variablegroups")?;
        let response: ListResponse<VariableGroup> = self.get_json(url).await?;

        let links = PipelineLinks::new(self.base_url(), self.organization(), project);
        let groups: Vec<ConfigurationGroup> = response
            .value
            .into_iter()
            .map(|group| {
                let url = links.variable_group_url(group.id);
                group.into_configuration_group(url)
            })
            .collect();

        debug!("Loaded {} variable groups for {project}", groups.len());
        Ok(groups)
    }
}
