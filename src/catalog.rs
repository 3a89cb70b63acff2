use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal pipeline identity, available from the definition list alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSkeleton {
    pub id: u64,
    pub name: String,
    /// Folder path of the definition (e.g. `\Apps\Web`)
    pub path: String,
    pub runs_url: String,
    pub edit_url: String,
}

/// A fully enriched row of the pipeline catalog.
///
/// Skeleton fields are set once and never touched again; every other field
/// starts empty and is only ever filled in by enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineListItem {
    #[serde(flatten)]
    pub skeleton: PipelineSkeleton,

    pub repository_id: Option<String>,
    pub repository_name: Option<String>,
    pub repository_url: Option<String>,
    pub default_branch: Option<String>,
    pub trigger_branch: Option<String>,
    pub yaml_file_name: Option<String>,
    pub definition_url: Option<String>,

    pub last_run_status: Option<String>,
    pub last_run_result: Option<String>,
    pub last_run_time: Option<DateTime<Utc>>,
    pub last_build_id: Option<u64>,
    pub last_build_number: Option<String>,
    pub last_run_duration_secs: Option<i64>,
    pub requested_by: Option<String>,
    pub commit_short: Option<String>,
    pub commit_full: Option<String>,
    pub commit_url: Option<String>,
    pub run_results_url: Option<String>,
    pub run_logs_url: Option<String>,
    pub config_editor_url: Option<String>,

    pub trigger_category: Option<TriggerCategory>,
    pub trigger_label: Option<String>,
    pub is_automated: Option<bool>,
    pub triggered_by_pipeline: Option<String>,

    pub declared_code_project: Option<String>,
    pub declared_code_repository: Option<String>,
    pub declared_code_branch: Option<String>,
    pub declared_code_repository_url: Option<String>,
    pub declared_code_branch_url: Option<String>,

    pub variable_groups: Vec<VariableGroupRef>,
    /// One entry per enrichment step that failed for this item
    pub enrichment_warnings: Vec<String>,
}

impl From<PipelineSkeleton> for PipelineListItem {
    fn from(skeleton: PipelineSkeleton) -> Self {
        Self {
            skeleton,
            ..Self::default()
        }
    }
}

/// Pointer from a pipeline's declared configuration to a stored variable group.
///
/// `id` is `None` when the declared name could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableGroupRef {
    pub name: String,
    pub environment: Option<String>,
    pub id: Option<u64>,
    pub variable_count: usize,
    pub url: Option<String>,
}

impl VariableGroupRef {
    pub fn is_resolved(&self) -> bool {
        self.id.is_some()
    }
}

/// A server-stored variable group. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationGroup {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub variables: Vec<ConfigurationVariable>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationVariable {
    pub name: String,
    /// Always `None` for secrets; the server never returns their value
    pub value: Option<String>,
    pub is_secret: bool,
    pub is_read_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerCategory {
    Manual,
    CodePush,
    Scheduled,
    PullRequest,
    PipelineCompletion,
    ResourceTrigger,
    Other,
}

/// Normalized view of why a run was started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerClassification {
    pub category: TriggerCategory,
    pub label: String,
    pub is_automated: bool,
    pub triggered_by_pipeline: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Settings recovered from a pipeline declaration for a single environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEnvironmentSettings {
    /// Upper-case short code, e.g. `DEV` or `PROD`
    pub environment: String,
    pub variable_group: Option<String>,
    pub deployment_type: Option<String>,
    pub website_name: Option<String>,
    pub virtual_path: Option<String>,
    pub app_pool_name: Option<String>,
    pub bindings: Option<String>,
    pub confidence: Confidence,
}

impl ParsedEnvironmentSettings {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            variable_group: None,
            deployment_type: None,
            website_name: None,
            virtual_path: None,
            app_pool_name: None,
            bindings: None,
            confidence: Confidence::Medium,
        }
    }

    /// Whether this record carries anything beyond the environment name.
    pub fn has_data(&self) -> bool {
        self.variable_group.is_some()
            || self.website_name.is_some()
            || self.virtual_path.is_some()
            || self.app_pool_name.is_some()
    }
}

/// Typed configuration recovered from a pipeline's declaration text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPipelineSettings {
    pub pipeline_id: Option<u64>,
    pub pipeline_name: Option<String>,
    pub pipeline_path: Option<String>,
    pub selected_branch: Option<String>,
    pub selected_project: Option<String>,
    pub selected_path: Option<String>,
    pub environments: Vec<ParsedEnvironmentSettings>,
    pub declared_code_repository: Option<String>,
    pub declared_code_project: Option<String>,
    pub declared_code_branch: Option<String>,
    pub is_self_generated: bool,
}

/// Final summary pushed with the completion event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub total_count: usize,
    pub items_with_warnings: usize,
    pub elapsed_ms: u64,
}

/// What an aggregation request hands back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub items: Vec<PipelineListItem>,
    pub total_count: usize,
    pub success: bool,
    pub error_message: Option<String>,
}

impl AggregationResult {
    pub fn completed(items: Vec<PipelineListItem>) -> Self {
        Self {
            total_count: items.len(),
            items,
            success: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            success: false,
            error_message: Some(message.into()),
        }
    }
}
