use urlencoding::encode;

/// Builds web URLs into the Azure DevOps UI for one project.
///
/// Every user-controlled segment (organization, project, repository, branch)
/// is percent-encoded. No network access is involved.
#[derive(Debug, Clone)]
pub struct PipelineLinks {
    base_url: String,
    organization: String,
    project: String,
}

impl PipelineLinks {
    /// # Arguments
    ///
    /// * `base_url` - Azure DevOps web root (e.g., <https://dev.azure.com>)
    /// * `organization` - Organization name
    /// * `project` - Project name
    pub fn new(base_url: &str, organization: &str, project: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            organization: organization.to_string(),
            project: project.to_string(),
        }
    }

    /// e.g. <https://dev.azure.com/org/My%20Project>
    pub fn project_url(&self) -> String {
        self.project_url_for(&self.project)
    }

    fn project_url_for(&self, project: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            encode(&self.organization),
            encode(project)
        )
    }

    pub fn runs_url(&self, definition_id: u64) -> String {
        format!("{}/_build?definitionId={definition_id}", self.project_url())
    }

    pub fn edit_url(&self, definition_id: u64) -> String {
        format!(
            "{}/_apps/hub/ms.vss-build-web.ci-designer-hub?pipelineId={definition_id}",
            self.project_url()
        )
    }

    /// Editor link opened on a specific branch of the declaration.
    pub fn config_editor_url(&self, definition_id: u64, branch: Option<&str>) -> String {
        match branch {
            Some(branch) => format!("{}&branch={}", self.edit_url(definition_id), encode(branch)),
            None => self.edit_url(definition_id),
        }
    }

    pub fn definition_url(&self, definition_id: u64) -> String {
        format!(
            "{}/_build/definition?definitionId={definition_id}",
            self.project_url()
        )
    }

    pub fn repository_url(&self, repository: &str) -> String {
        self.repository_url_in(&self.project, repository)
    }

    /// Repository that may live in another project of the same organization.
    pub fn repository_url_in(&self, project: &str, repository: &str) -> String {
        format!("{}/_git/{}", self.project_url_for(project), encode(repository))
    }

    pub fn commit_url(&self, repository: &str, commit: &str) -> String {
        format!("{}/commit/{}", self.repository_url(repository), encode(commit))
    }

    pub fn branch_url(repository_url: &str, branch: &str) -> String {
        format!("{repository_url}?version=GB{}", encode(branch))
    }

    pub fn run_results_url(&self, build_id: u64) -> String {
        format!(
            "{}/_build/results?buildId={build_id}&view=results",
            self.project_url()
        )
    }

    pub fn run_logs_url(&self, build_id: u64) -> String {
        format!(
            "{}/_build/results?buildId={build_id}&view=logs",
            self.project_url()
        )
    }

    pub fn variable_group_url(&self, group_id: u64) -> String {
        format!(
            "{}&view=VariableGroupView&variableGroupId={group_id}",
            self.variable_groups_url()
        )
    }

    /// Library page listing every variable group of the project.
    pub fn variable_groups_url(&self) -> String {
        format!("{}/_library?itemType=VariableGroups", self.project_url())
    }
}
