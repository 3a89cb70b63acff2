//! Extraction of typed settings from pipeline declaration text.
//!
//! This is not a YAML parser. It understands a narrow dialect: one
//! `resources.repositories` entry describing where the built code lives, and
//! `- name:` / `value:` variable pairs whose names follow a few well-known
//! patterns. Anything else in the text is ignored.

use crate::catalog::{Confidence, ParsedEnvironmentSettings, ParsedPipelineSettings};
use crate::gateway::short_branch;

const REPOSITORY_MARKER: &str = "- repository:";
const VARIABLE_SIGIL: char = '$';

const PROJECT_NAME_FIELD: &str = "projectname";
const PROJECT_PATH_FIELD: &str = "projectpath";

/// Environment short codes recognized as variable-name prefixes.
pub const ENVIRONMENTS: [&str; 7] = ["DEV", "TEST", "QA", "UAT", "STAGING", "PREPROD", "PROD"];

/// Markers left in declarations written by the pipeline generator.
const GENERATOR_FINGERPRINTS: [&str; 2] = ["# generated by pipelens", "pipelens-template:"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvironmentField {
    VariableGroup,
    DeploymentType,
    WebsiteName,
    VirtualPath,
    AppPoolName,
    Bindings,
}

impl EnvironmentField {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "variablegroup" | "variablegroupname" => Some(Self::VariableGroup),
            "deploymenttype" => Some(Self::DeploymentType),
            "websitename" | "sitename" => Some(Self::WebsiteName),
            "virtualpath" => Some(Self::VirtualPath),
            "apppoolname" | "apppool" => Some(Self::AppPoolName),
            "bindings" | "bindinginfo" => Some(Self::Bindings),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct DeclaredRepository {
    project: Option<String>,
    repository: Option<String>,
    branch: Option<String>,
}

/// Parses declaration text into [`ParsedPipelineSettings`].
///
/// Never fails: empty or malformed text yields a result carrying only the
/// identity hints. Matching of keys and variable names is case-insensitive.
pub fn parse_declaration(
    text: &str,
    pipeline_id: Option<u64>,
    pipeline_name: Option<&str>,
    pipeline_path: Option<&str>,
) -> ParsedPipelineSettings {
    let mut settings = ParsedPipelineSettings {
        pipeline_id,
        pipeline_name: pipeline_name.and_then(clean_value),
        pipeline_path: pipeline_path.and_then(clean_value),
        ..ParsedPipelineSettings::default()
    };

    if text.trim().is_empty() {
        return settings;
    }

    let lines: Vec<&str> = text.lines().collect();

    let repository = scan_repository_block(&lines);
    settings.declared_code_project = repository.project;
    settings.declared_code_repository = repository.repository;
    settings.declared_code_branch = repository.branch.clone();
    settings.selected_branch = repository.branch;

    let mut environments: Vec<ParsedEnvironmentSettings> = Vec::new();
    for (name, value) in scan_variables(&lines) {
        apply_variable(&mut settings, &mut environments, &name, value);
    }
    settings.environments = environments.into_iter().filter(|e| e.has_data()).collect();

    let lower = text.to_lowercase();
    settings.is_self_generated = GENERATOR_FINGERPRINTS.iter().any(|f| lower.contains(f));

    settings
}

fn scan_repository_block(lines: &[&str]) -> DeclaredRepository {
    let mut declared = DeclaredRepository::default();

    let Some(start) = lines.iter().position(|line| {
        line.trim_start()
            .to_ascii_lowercase()
            .starts_with(REPOSITORY_MARKER)
    }) else {
        return declared;
    };
    let marker_indent = indentation(lines[start]);

    for line in lines.iter().skip(start + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if indentation(line) <= marker_indent {
            break;
        }

        if let Some(name) = field(line, "name").and_then(literal) {
            match name.split_once('/') {
                Some((project, repository)) => {
                    declared.project = clean_value(project);
                    declared.repository = clean_value(repository);
                }
                None => declared.repository = Some(name),
            }
        } else if let Some(reference) = field(line, "ref").and_then(literal) {
            declared.branch = clean_value(short_branch(&reference));
        }
    }

    declared
}

/// Collects `name`/`value` pairs where the value sits on the next non-blank line.
/// The value is `None` when it is blank.
fn scan_variables(lines: &[&str]) -> Vec<(String, Option<String>)> {
    let mut pairs = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let Some(name) = field(lines[index], "name").and_then(clean_value) else {
            index += 1;
            continue;
        };

        let Some(value_index) = (index + 1..lines.len()).find(|&i| !lines[i].trim().is_empty())
        else {
            break;
        };

        let Some(raw) = field(lines[value_index], "value") else {
            index += 1;
            continue;
        };

        if is_block_scalar(strip_comment(raw).trim()) {
            let (value, next) = collect_block(lines, value_index);
            pairs.push((name, value));
            index = next;
        } else {
            pairs.push((name, clean_value(raw)));
            index = value_index + 1;
        }
    }

    pairs
}

fn apply_variable(
    settings: &mut ParsedPipelineSettings,
    environments: &mut Vec<ParsedEnvironmentSettings>,
    name: &str,
    value: Option<String>,
) {
    let value = value.filter(|v| !v.starts_with(VARIABLE_SIGIL));
    let name = name.to_ascii_lowercase();

    match name.as_str() {
        PROJECT_NAME_FIELD => {
            if value.is_some() {
                settings.selected_project = value;
            }
            return;
        }
        PROJECT_PATH_FIELD => {
            if value.is_some() {
                settings.selected_path = value;
            }
            return;
        }
        _ => {}
    }

    let Some((environment, field)) = ENVIRONMENTS.iter().find_map(|env| {
        let rest = name.strip_prefix(&env.to_ascii_lowercase())?;
        let suffix = rest.trim_start_matches(['_', '-', '.']);
        EnvironmentField::from_suffix(suffix).map(|field| (*env, field))
    }) else {
        return;
    };

    let position = match environments.iter().position(|e| e.environment == environment) {
        Some(position) => position,
        None => {
            environments.push(ParsedEnvironmentSettings::new(environment));
            environments.len() - 1
        }
    };
    let entry = &mut environments[position];

    let Some(value) = value else {
        return;
    };

    match field {
        EnvironmentField::VariableGroup => {
            entry.variable_group = Some(value);
            entry.confidence = Confidence::High;
        }
        EnvironmentField::DeploymentType => entry.deployment_type = Some(value),
        EnvironmentField::WebsiteName => entry.website_name = Some(value),
        EnvironmentField::VirtualPath => entry.virtual_path = Some(value),
        EnvironmentField::AppPoolName => entry.app_pool_name = Some(value),
        EnvironmentField::Bindings => entry.bindings = Some(value),
    }
}

/// Returns the value of `key: value` on this line, tolerating a list dash.
fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let trimmed = line.trim();
    let trimmed = trimmed
        .strip_prefix('-')
        .map_or(trimmed, str::trim_start);
    let (name, rest) = trimmed.split_once(':')?;
    name.trim().eq_ignore_ascii_case(key).then(|| rest.trim())
}

/// Trims, unquotes and drops blank values. A trailing `# comment` after an
/// unquoted value is not part of it.
fn clean_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let value = match trimmed.chars().next() {
        Some(quote @ ('"' | '\'')) => trimmed[1..]
            .find(quote)
            .map_or(trimmed, |end| &trimmed[1..=end]),
        _ => strip_comment(trimmed),
    }
    .trim();

    (!value.is_empty()).then(|| value.to_string())
}

/// Cuts a plain scalar at the first `#` that starts a comment.
fn strip_comment(text: &str) -> &str {
    let mut previous = None;
    for (index, c) in text.char_indices() {
        if c == '#' && previous.map_or(true, char::is_whitespace) {
            return &text[..index];
        }
        previous = Some(c);
    }
    text
}

/// A cleaned value that is a literal rather than a `$(...)` style reference.
fn literal(raw: &str) -> Option<String> {
    clean_value(raw).filter(|v| !v.starts_with(VARIABLE_SIGIL))
}

fn is_block_scalar(raw: &str) -> bool {
    matches!(raw, "|" | "|-" | "|+" | ">" | ">-" | ">+")
}

/// Gathers the indented lines under a block-scalar `value:` line.
/// Returns the joined text and the index of the first line after the block.
fn collect_block(lines: &[&str], value_index: usize) -> (Option<String>, usize) {
    let value_indent = indentation(lines[value_index]);
    let mut collected = Vec::new();
    let mut next = value_index + 1;

    while let Some(line) = lines.get(next) {
        if !line.trim().is_empty() && indentation(line) <= value_indent {
            break;
        }
        collected.push(line.trim());
        next += 1;
    }

    let joined = collected.join("\n");
    let joined = joined.trim();
    ((!joined.is_empty()).then(|| joined.to_string()), next)
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
# Generated by PipeLens
trigger:
  branches:
    include:
      - main

resources:
  repositories:
    - repository: app
      type: git
      name: Contoso/web-api
      ref: refs/heads/main
    - repository: templates
      type: git
      name: Shared/templates

variables:
  - name: ProjectName
    value: WebApi
  - name: ProjectPath
    value: src/WebApi/WebApi.csproj
  - name: DEV_VariableGroup
    value: WebApi-Dev
  - name: DEV_WebsiteName
    value: 'webapi-dev'
  - name: DEV_VirtualPath
    value: /api
  - name: PROD_VariableGroup
    value: $(SharedProdGroup)
  - name: PROD_AppPoolName
    value: WebApiPool
  - name: PROD_Bindings
    value: |
      https://*:443:api.contoso.com
      http://*:80:api.contoso.com
  - name: UAT_DeploymentType
    value: IIS
"#;

    #[test]
    fn test_empty_text_returns_identity_only() {
        let parsed = parse_declaration("", Some(3), Some("web"), Some("\\Apps"));
        assert_eq!(parsed.pipeline_id, Some(3));
        assert_eq!(parsed.pipeline_name.as_deref(), Some("web"));
        assert_eq!(parsed.pipeline_path.as_deref(), Some("\\Apps"));
        assert!(parsed.environments.is_empty());
        assert!(parsed.declared_code_repository.is_none());
        assert!(!parsed.is_self_generated);
    }

    #[test]
    fn test_repository_block_with_project_and_branch() {
        let text = "resources:\n  repositories:\n    - repository: self\n      name: proj/repo\n      ref: refs/heads/main\n";
        let parsed = parse_declaration(text, None, None, None);
        assert_eq!(parsed.declared_code_project.as_deref(), Some("proj"));
        assert_eq!(parsed.declared_code_repository.as_deref(), Some("repo"));
        assert_eq!(parsed.declared_code_branch.as_deref(), Some("main"));
        assert_eq!(parsed.selected_branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_repository_without_project_segment() {
        let text = "    - repository: self\n      name: repo-only\n";
        let parsed = parse_declaration(text, None, None, None);
        assert!(parsed.declared_code_project.is_none());
        assert_eq!(parsed.declared_code_repository.as_deref(), Some("repo-only"));
    }

    #[test]
    fn test_only_first_repository_block_is_read() {
        let parsed = parse_declaration(FULL, None, None, None);
        assert_eq!(parsed.declared_code_project.as_deref(), Some("Contoso"));
        assert_eq!(parsed.declared_code_repository.as_deref(), Some("web-api"));
    }

    #[test]
    fn test_project_hints_are_extracted() {
        let parsed = parse_declaration(FULL, None, None, None);
        assert_eq!(parsed.selected_project.as_deref(), Some("WebApi"));
        assert_eq!(
            parsed.selected_path.as_deref(),
            Some("src/WebApi/WebApi.csproj")
        );
    }

    #[test]
    fn test_environment_fields_and_confidence() {
        let parsed = parse_declaration(FULL, None, None, None);
        let dev = parsed
            .environments
            .iter()
            .find(|e| e.environment == "DEV")
            .unwrap();
        assert_eq!(dev.variable_group.as_deref(), Some("WebApi-Dev"));
        assert_eq!(dev.website_name.as_deref(), Some("webapi-dev"));
        assert_eq!(dev.virtual_path.as_deref(), Some("/api"));
        assert_eq!(dev.confidence, Confidence::High);
    }

    #[test]
    fn test_variable_reference_values_are_skipped() {
        let parsed = parse_declaration(FULL, None, None, None);
        let prod = parsed
            .environments
            .iter()
            .find(|e| e.environment == "PROD")
            .unwrap();
        assert!(prod.variable_group.is_none());
        assert_eq!(prod.confidence, Confidence::Medium);
        assert_eq!(prod.app_pool_name.as_deref(), Some("WebApiPool"));
    }

    #[test]
    fn test_multiline_bindings() {
        let parsed = parse_declaration(FULL, None, None, None);
        let prod = parsed
            .environments
            .iter()
            .find(|e| e.environment == "PROD")
            .unwrap();
        assert_eq!(
            prod.bindings.as_deref(),
            Some("https://*:443:api.contoso.com\nhttp://*:80:api.contoso.com")
        );
    }

    #[test]
    fn test_environment_without_data_is_discarded() {
        let parsed = parse_declaration(FULL, None, None, None);
        assert!(parsed.environments.iter().all(|e| e.environment != "UAT"));
        assert_eq!(parsed.environments.len(), 2);
    }

    #[test]
    fn test_environment_with_only_reference_value_is_discarded() {
        let text = "variables:\n  - name: QA_VariableGroup\n    value: $(group)\n";
        let parsed = parse_declaration(text, None, None, None);
        assert!(parsed.environments.is_empty());
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let first = parse_declaration(FULL, Some(1), None, None);
        let second = parse_declaration(FULL, Some(1), None, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let text = "- NAME: staging-variablegroup\n  VALUE: Web-Staging\n";
        let parsed = parse_declaration(text, None, None, None);
        assert_eq!(parsed.environments.len(), 1);
        assert_eq!(parsed.environments[0].environment, "STAGING");
        assert_eq!(
            parsed.environments[0].variable_group.as_deref(),
            Some("Web-Staging")
        );
    }

    #[test]
    fn test_preprod_is_not_confused_with_prod() {
        let text = "- name: PREPROD_WebsiteName\n  value: site-pre\n";
        let parsed = parse_declaration(text, None, None, None);
        assert_eq!(parsed.environments[0].environment, "PREPROD");
    }

    #[test]
    fn test_value_on_next_non_blank_line() {
        let text = "- name: DEV_AppPoolName\n\n\n  value: DevPool\n";
        let parsed = parse_declaration(text, None, None, None);
        assert_eq!(
            parsed.environments[0].app_pool_name.as_deref(),
            Some("DevPool")
        );
    }

    #[test]
    fn test_whitespace_value_is_absent() {
        let text = "- name: DEV_WebsiteName\n  value: \"   \"\n";
        let parsed = parse_declaration(text, None, None, None);
        assert!(parsed.environments.is_empty());
    }

    #[test]
    fn test_trailing_comment_is_not_part_of_value() {
        let text = "variables:\n  - name: DEV_VariableGroup # group\n    value: Api-Dev # the dev group\n  - name: DEV_WebsiteName\n    value: 'site # one' # quoted\n  - name: DEV_VirtualPath\n    value: /api#v2\n";
        let parsed = parse_declaration(text, None, None, None);
        let dev = &parsed.environments[0];
        assert_eq!(dev.variable_group.as_deref(), Some("Api-Dev"));
        assert_eq!(dev.website_name.as_deref(), Some("site # one"));
        assert_eq!(dev.virtual_path.as_deref(), Some("/api#v2"));
    }

    #[test]
    fn test_hash_inside_block_scalar_is_kept() {
        let text = "- name: UAT_Bindings\n  value: | # bindings\n    https://*:443:uat#1\n";
        let parsed = parse_declaration(text, None, None, None);
        assert_eq!(
            parsed.environments[0].bindings.as_deref(),
            Some("https://*:443:uat#1")
        );
    }

    #[test]
    fn test_self_generated_fingerprint() {
        assert!(parse_declaration(FULL, None, None, None).is_self_generated);
        assert!(parse_declaration("# PIPELENS-TEMPLATE: v2\n", None, None, None).is_self_generated);
        assert!(!parse_declaration("trigger: none\n", None, None, None).is_self_generated);
    }

    #[test]
    fn test_malformed_text_does_not_panic() {
        let text = "- name:\nvalue\n:::\n- repository:\n  name: /\n  ref:\n- name: DEV_VirtualPath";
        let parsed = parse_declaration(text, None, None, None);
        assert!(parsed.environments.is_empty());
    }
}
