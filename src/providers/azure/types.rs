//! Wire types for the Azure DevOps REST API.
//!
//! Only the fields the catalog needs are modelled; everything else in the
//! responses is ignored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::catalog::{ConfigurationGroup, ConfigurationVariable};
use crate::gateway::{Definition, DefinitionRef, GroupIdentifier, RepositoryRef, Run};

/// `{"count": n, "value": [...]}` envelope used by list endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DefinitionReference {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BuildDefinition {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub path: String,
    pub repository: Option<BuildRepository>,
    pub process: Option<BuildProcess>,
    #[serde(default)]
    pub variable_groups: Vec<VariableGroupReference>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BuildRepository {
    pub id: String,
    pub name: String,
    pub default_branch: Option<String>,
}

/// `process.type` is 2 for YAML pipelines and 1 for classic designer ones.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BuildProcess {
    pub yaml_filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariableGroupReference {
    pub id: Option<u64>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Build {
    pub id: u64,
    pub build_number: Option<String>,
    pub status: Option<String>,
    pub result: Option<String>,
    pub queue_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
    pub source_branch: Option<String>,
    pub source_version: Option<String>,
    pub reason: Option<String>,
    #[serde(default)]
    pub trigger_info: BTreeMap<String, serde_json::Value>,
    pub requested_for: Option<IdentityRef>,
    pub triggered_by_build: Option<TriggeringBuild>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IdentityRef {
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TriggeringBuild {
    pub definition: Option<TriggeringDefinition>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TriggeringDefinition {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariableGroup {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub variables: IndexMap<String, VariableValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VariableValue {
    pub value: Option<String>,
    #[serde(default)]
    pub is_secret: bool,
    #[serde(default)]
    pub is_read_only: bool,
}

impl From<DefinitionReference> for DefinitionRef {
    fn from(reference: DefinitionReference) -> Self {
        Self {
            id: reference.id,
            name: reference.name,
            path: reference.path,
        }
    }
}

impl From<BuildDefinition> for Definition {
    fn from(definition: BuildDefinition) -> Self {
        Self {
            id: definition.id,
            name: definition.name,
            path: definition.path,
            repository: definition.repository.map(|r| RepositoryRef {
                id: r.id,
                name: r.name,
                default_branch: r.default_branch,
            }),
            yaml_file_name: definition
                .process
                .and_then(|p| p.yaml_filename)
                .filter(|f| !f.trim().is_empty()),
            variable_groups: definition
                .variable_groups
                .into_iter()
                .map(|g| GroupIdentifier {
                    id: g.id,
                    name: g.name,
                })
                .collect(),
        }
    }
}

impl From<Build> for Run {
    fn from(build: Build) -> Self {
        let mut trigger_metadata: BTreeMap<String, String> = build
            .trigger_info
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(s) => Some((key, s)),
                serde_json::Value::Null => None,
                other => Some((key, other.to_string())),
            })
            .collect();

        if let Some(name) = build
            .triggered_by_build
            .and_then(|b| b.definition)
            .and_then(|d| d.name)
        {
            trigger_metadata.insert("definitionName".to_string(), name);
        }

        Self {
            id: build.id,
            build_number: build.build_number,
            status: build.status,
            result: build.result,
            queue_time: build.queue_time,
            start_time: build.start_time,
            finish_time: build.finish_time,
            source_branch: build.source_branch,
            source_version: build.source_version,
            reason: build.reason,
            trigger_metadata,
            requested_by: build.requested_for.and_then(|r| r.display_name),
        }
    }
}

impl VariableGroup {
    /// Converts to the catalog type; `url` points at the group in the library UI.
    pub(crate) fn into_configuration_group(self, url: String) -> ConfigurationGroup {
        ConfigurationGroup {
            id: self.id,
            name: self.name,
            description: self.description.filter(|d| !d.trim().is_empty()),
            variables: self
                .variables
                .into_iter()
                .map(|(name, v)| ConfigurationVariable {
                    name,
                    value: if v.is_secret { None } else { v.value },
                    is_secret: v.is_secret,
                    is_read_only: v.is_read_only,
                })
                .collect(),
            url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_definition_conversion() {
        let json = r#"{
            "id": 12,
            "name": "web-ci",
            "path": "\\Apps",
            "repository": {"id": "abc", "name": "web", "type": "TfsGit", "defaultBranch": "refs/heads/main"},
            "process": {"type": 2, "yamlFilename": "/ci/azure-pipelines.yml"},
            "variableGroups": [{"id": 3, "name": "Shared"}]
        }"#;
        let definition: Definition = serde_json::from_str::<BuildDefinition>(json).unwrap().into();
        assert_eq!(definition.id, 12);
        assert_eq!(definition.path, "\\Apps");
        assert_eq!(
            definition.yaml_file_name.as_deref(),
            Some("/ci/azure-pipelines.yml")
        );
        assert_eq!(definition.repository.unwrap().default_branch.as_deref(), Some("refs/heads/main"));
        assert_eq!(definition.variable_groups[0].id, Some(3));
    }

    #[test]
    fn test_classic_definition_has_no_yaml_file() {
        let json = r#"{"id": 1, "name": "classic", "process": {"type": 1}}"#;
        let definition: Definition = serde_json::from_str::<BuildDefinition>(json).unwrap().into();
        assert!(definition.yaml_file_name.is_none());
        assert!(definition.repository.is_none());
        assert!(definition.variable_groups.is_empty());
    }

    #[test]
    fn test_build_conversion_collects_trigger_metadata() {
        let json = r#"{
            "id": 901,
            "buildNumber": "20240102.3",
            "status": "completed",
            "result": "succeeded",
            "startTime": "2024-01-02T10:00:00Z",
            "finishTime": "2024-01-02T10:03:00Z",
            "reason": "buildCompletion",
            "triggerInfo": {"ci.sourceSha": "abc", "retries": 2},
            "requestedFor": {"displayName": "Grace"},
            "triggeredByBuild": {"id": 5, "definition": {"id": 8, "name": "core-build"}}
        }"#;
        let run: Run = serde_json::from_str::<Build>(json).unwrap().into();
        assert_eq!(run.build_number.as_deref(), Some("20240102.3"));
        assert_eq!(run.requested_by.as_deref(), Some("Grace"));
        assert_eq!(run.trigger_metadata.get("definitionName").map(String::as_str), Some("core-build"));
        assert_eq!(run.trigger_metadata.get("retries").map(String::as_str), Some("2"));
        assert!(run.finish_time.is_some());
    }

    #[test]
    fn test_variable_group_keeps_order_and_hides_secrets() {
        let json = r#"{
            "id": 4,
            "name": "WebApi-Prod",
            "description": "",
            "variables": {
                "zeta": {"value": "1"},
                "alpha": {"value": "hunter2", "isSecret": true},
                "mid": {"value": "x", "isReadOnly": true}
            }
        }"#;
        let group = serde_json::from_str::<VariableGroup>(json)
            .unwrap()
            .into_configuration_group("https://example/4".to_string());
        let names: Vec<&str> = group.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert!(group.variables[1].is_secret);
        assert!(group.variables[1].value.is_none());
        assert!(group.variables[2].is_read_only);
        assert!(group.description.is_none());
    }
}
