//! Read-only view of the external build system consumed by the aggregation core.
//!
//! The Azure DevOps client implements [`PipelineGateway`]; tests drive the
//! orchestrator with an in-memory fake.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::catalog::ConfigurationGroup;
use crate::error::Result;

const BRANCH_PREFIX: &str = "refs/heads/";

/// Branch name without a leading `refs/heads/` (matched case-insensitively).
pub fn short_branch(reference: &str) -> &str {
    match reference.get(..BRANCH_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(BRANCH_PREFIX) => {
            &reference[BRANCH_PREFIX.len()..]
        }
        _ => reference,
    }
}

/// Entry of the project's definition list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionRef {
    pub id: u64,
    pub name: String,
    pub path: String,
}

/// Full pipeline definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Definition {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub repository: Option<RepositoryRef>,
    /// Path of the YAML declaration inside the repository, if the definition is YAML based
    pub yaml_file_name: Option<String>,
    /// Variable groups linked directly on the definition object
    pub variable_groups: Vec<GroupIdentifier>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryRef {
    pub id: String,
    pub name: String,
    /// Full ref, e.g. `refs/heads/main`
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupIdentifier {
    pub id: Option<u64>,
    pub name: Option<String>,
}

/// A single pipeline run (build).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub id: u64,
    pub build_number: Option<String>,
    pub status: Option<String>,
    pub result: Option<String>,
    pub queue_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
    pub source_branch: Option<String>,
    pub source_version: Option<String>,
    /// Raw trigger reason, e.g. `individualCI` or `manual`
    pub reason: Option<String>,
    pub trigger_metadata: BTreeMap<String, String>,
    pub requested_by: Option<String>,
}

#[async_trait]
pub trait PipelineGateway: Send + Sync {
    async fn list_definitions(&self, project: &str) -> Result<Vec<DefinitionRef>>;

    async fn get_definition(&self, project: &str, id: u64) -> Result<Definition>;

    /// Most recent run of a definition, `None` if it never ran.
    async fn get_latest_run(&self, project: &str, definition_id: u64) -> Result<Option<Run>>;

    async fn get_file_text(
        &self,
        project: &str,
        repository_id: &str,
        path: &str,
        branch: Option<&str>,
    ) -> Result<String>;

    async fn list_configuration_groups(&self, project: &str) -> Result<Vec<ConfigurationGroup>>;
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::error::PipeLensError;

    /// In-memory gateway with per-call failure switches.
    #[derive(Default)]
    pub struct FakeGateway {
        pub definitions: Vec<Definition>,
        pub runs: HashMap<u64, Run>,
        /// Keyed by `{repository_id}:{path}`
        pub files: HashMap<String, String>,
        pub groups: Option<Vec<ConfigurationGroup>>,
        pub fail_list: bool,
        pub failing_definitions: HashSet<u64>,
        pub failing_runs: HashSet<u64>,
        pub delays: HashMap<u64, Duration>,
        pub group_fetches: AtomicUsize,
    }

    impl FakeGateway {
        pub fn with_definitions(definitions: Vec<Definition>) -> Self {
            Self {
                definitions,
                groups: Some(Vec::new()),
                ..Self::default()
            }
        }

        pub fn file_key(repository_id: &str, path: &str) -> String {
            format!("{repository_id}:{path}")
        }
    }

    #[async_trait]
    impl PipelineGateway for FakeGateway {
        async fn list_definitions(&self, project: &str) -> Result<Vec<DefinitionRef>> {
            if self.fail_list {
                return Err(PipeLensError::ProjectNotFound {
                    project: project.to_string(),
                    message: format!("TF200016: The following project does not exist: {project}"),
                });
            }
            Ok(self
                .definitions
                .iter()
                .map(|d| DefinitionRef {
                    id: d.id,
                    name: d.name.clone(),
                    path: d.path.clone(),
                })
                .collect())
        }

        async fn get_definition(&self, _project: &str, id: u64) -> Result<Definition> {
            if let Some(delay) = self.delays.get(&id) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing_definitions.contains(&id) {
                return Err(PipeLensError::ApiError {
                    status: 500,
                    message: "definition unavailable".to_string(),
                });
            }
            self.definitions
                .iter()
                .find(|d| d.id == id)
                .cloned()
                .ok_or(PipeLensError::DefinitionNotFound(id))
        }

        async fn get_latest_run(&self, _project: &str, definition_id: u64) -> Result<Option<Run>> {
            if self.failing_runs.contains(&definition_id) {
                return Err(PipeLensError::Api("builds endpoint failed".to_string()));
            }
            Ok(self.runs.get(&definition_id).cloned())
        }

        async fn get_file_text(
            &self,
            _project: &str,
            repository_id: &str,
            path: &str,
            _branch: Option<&str>,
        ) -> Result<String> {
            self.files
                .get(&Self::file_key(repository_id, path))
                .cloned()
                .ok_or_else(|| PipeLensError::ApiError {
                    status: 404,
                    message: format!("{path} not found"),
                })
        }

        async fn list_configuration_groups(
            &self,
            _project: &str,
        ) -> Result<Vec<ConfigurationGroup>> {
            self.group_fetches.fetch_add(1, Ordering::SeqCst);
            self.groups
                .clone()
                .ok_or_else(|| PipeLensError::Api("variable groups unavailable".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_branch() {
        assert_eq!(short_branch("refs/heads/main"), "main");
        assert_eq!(short_branch("Refs/Heads/release/2.0"), "release/2.0");
        assert_eq!(short_branch("feature/x"), "feature/x");
        assert_eq!(short_branch("refs/tags/v1"), "refs/tags/v1");
    }
}
