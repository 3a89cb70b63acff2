use super::core::AzureDevOpsClient;
use crate::error::Result;
use crate::gateway::short_branch;

impl AzureDevOpsClient {
    /// Downloads a file from a Git repository, optionally at a branch.
    ///
    /// `branch` may be a full ref (`refs/heads/main`) or a bare name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or the request fails.
    pub async fn get_file_text(
        &self,
        project: &str,
        repository_id: &str,
        path: &str,
        branch: Option<&str>,
    ) -> Result<String> {
        let mut url = self.api_url(
            project,
            &format!("git/repositories/{}/items", urlencoding::encode(repository_id)),
        )?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("path", path).append_pair("includeContent", "true");
            if let Some(branch) = branch.map(str::trim).filter(|b| !b.is_empty()) {
                let name = short_branch(branch);
                query
                    .append_pair("versionDescriptor.version", name)
                    .append_pair("versionDescriptor.versionType", "branch");
            }
        }

        self.get_text(url).await
    }
}
