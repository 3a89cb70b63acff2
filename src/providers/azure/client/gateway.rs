use async_trait::async_trait;

use super::core::AzureDevOpsClient;
use crate::catalog::ConfigurationGroup;
use crate::error::Result;
use crate::gateway::{Definition, DefinitionRef, PipelineGateway, Run};

#[async_trait]
impl PipelineGateway for AzureDevOpsClient {
    async fn list_definitions(&self, project: &str) -> Result<Vec<DefinitionRef>> {
        AzureDevOpsClient::list_definitions(self, project).await
    }

    async fn get_definition(&self, project: &str, id: u64) -> Result<Definition> {
        AzureDevOpsClient::get_definition(self, project, id).await
    }

    async fn get_latest_run(&self, project: &str, definition_id: u64) -> Result<Option<Run>> {
        AzureDevOpsClient::get_latest_run(self, project, definition_id).await
    }

    async fn get_file_text(
        &self,
        project: &str,
        repository_id: &str,
        path: &str,
        branch: Option<&str>,
    ) -> Result<String> {
        AzureDevOpsClient::get_file_text(self, project, repository_id, path, branch).await
    }

    async fn list_configuration_groups(&self, project: &str) -> Result<Vec<ConfigurationGroup>> {
        AzureDevOpsClient::list_configuration_groups(self, project).await
    }
}
