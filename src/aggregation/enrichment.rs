use log::{debug, warn};

use super::declaration::parse_declaration;
use super::resolver::KnownGroups;
use super::trigger::classify_trigger;
use crate::catalog::{
    ConfigurationGroup, ParsedPipelineSettings, PipelineListItem, PipelineSkeleton,
    VariableGroupRef,
};
use crate::error::{PipeLensError, Result};
use crate::gateway::{short_branch, Definition, GroupIdentifier, PipelineGateway, Run};
use crate::providers::azure::PipelineLinks;

const SHORT_COMMIT_LEN: usize = 7;

/// Turns one skeleton into a full catalog row.
///
/// Each external call is isolated: a failed step records a warning on the
/// item and leaves its fields empty, and later steps still run.
pub struct Enricher<'a> {
    gateway: &'a dyn PipelineGateway,
    links: &'a PipelineLinks,
    known_groups: &'a KnownGroups,
    project: &'a str,
}

impl<'a> Enricher<'a> {
    pub fn new(
        gateway: &'a dyn PipelineGateway,
        links: &'a PipelineLinks,
        known_groups: &'a KnownGroups,
        project: &'a str,
    ) -> Self {
        Self {
            gateway,
            links,
            known_groups,
            project,
        }
    }

    pub async fn enrich(&self, skeleton: PipelineSkeleton) -> PipelineListItem {
        let mut item = PipelineListItem::from(skeleton);
        let id = item.skeleton.id;

        let definition = match self.gateway.get_definition(self.project, id).await {
            Ok(definition) => {
                self.apply_definition(&mut item, &definition);
                Some(definition)
            }
            Err(e) => {
                record_failure(&mut item, "definition", &e);
                None
            }
        };

        match self.gateway.get_latest_run(self.project, id).await {
            Ok(Some(run)) => self.apply_run(&mut item, &run, definition.is_some()),
            Ok(None) => debug!("Pipeline {id} has no runs yet"),
            Err(e) => record_failure(&mut item, "latest run", &e),
        }

        if let Some(definition) = &definition {
            match self.fetch_declaration(definition).await {
                Ok(Some(settings)) => {
                    self.apply_declared_code(&mut item, &settings);
                    item.variable_groups = self.declared_groups(&settings);
                }
                Ok(None) => debug!("Pipeline {id} has no declaration file"),
                Err(e) => record_failure(&mut item, "declaration", &e),
            }

            if item.variable_groups.is_empty() {
                item.variable_groups = self.linked_groups(&definition.variable_groups);
            }
        }

        item
    }

    fn apply_definition(&self, item: &mut PipelineListItem, definition: &Definition) {
        let id = item.skeleton.id;
        item.definition_url = Some(self.links.definition_url(id));
        item.yaml_file_name = definition.yaml_file_name.clone();

        if let Some(repository) = &definition.repository {
            item.repository_id = Some(repository.id.clone());
            item.repository_name = Some(repository.name.clone());
            item.repository_url = Some(self.links.repository_url(&repository.name));
            item.default_branch = repository
                .default_branch
                .as_deref()
                .map(|b| short_branch(b).to_string());
        }

        item.config_editor_url = Some(
            self.links
                .config_editor_url(id, item.default_branch.as_deref()),
        );
    }

    fn apply_run(&self, item: &mut PipelineListItem, run: &Run, definition_loaded: bool) {
        item.last_build_id = Some(run.id);
        item.last_build_number = run.build_number.clone();
        item.last_run_status = run.status.clone();
        item.last_run_result = run.result.clone();
        item.last_run_time = run.finish_time.or(run.start_time).or(run.queue_time);
        item.last_run_duration_secs = match (run.start_time, run.finish_time) {
            (Some(start), Some(finish)) if finish >= start => Some((finish - start).num_seconds()),
            _ => None,
        };
        item.requested_by = run.requested_by.clone();
        item.trigger_branch = run
            .source_branch
            .as_deref()
            .map(|b| short_branch(b).to_string());

        // Commit fields belong to the definition's repository; without it they stay empty.
        if let Some(commit) = run
            .source_version
            .as_deref()
            .filter(|c| definition_loaded && !c.is_empty())
        {
            item.commit_full = Some(commit.to_string());
            item.commit_short = Some(commit.chars().take(SHORT_COMMIT_LEN).collect());
            if let Some(repository) = &item.repository_name {
                item.commit_url = Some(self.links.commit_url(repository, commit));
            }
        }

        item.run_results_url = Some(self.links.run_results_url(run.id));
        item.run_logs_url = Some(self.links.run_logs_url(run.id));

        let trigger = classify_trigger(run.reason.as_deref(), &run.trigger_metadata);
        item.trigger_category = Some(trigger.category);
        item.trigger_label = Some(trigger.label);
        item.is_automated = Some(trigger.is_automated);
        item.triggered_by_pipeline = trigger.triggered_by_pipeline;
    }

    /// Fetches and parses the YAML declaration; `None` when the definition has none.
    async fn fetch_declaration(
        &self,
        definition: &Definition,
    ) -> Result<Option<ParsedPipelineSettings>> {
        let (Some(repository), Some(file)) = (&definition.repository, &definition.yaml_file_name)
        else {
            return Ok(None);
        };

        let text = self
            .gateway
            .get_file_text(
                self.project,
                &repository.id,
                file,
                repository.default_branch.as_deref(),
            )
            .await?;

        Ok(Some(parse_declaration(
            &text,
            Some(definition.id),
            Some(&definition.name),
            Some(&definition.path),
        )))
    }

    fn apply_declared_code(&self, item: &mut PipelineListItem, settings: &ParsedPipelineSettings) {
        item.declared_code_project = settings.declared_code_project.clone();
        item.declared_code_repository = settings.declared_code_repository.clone();
        item.declared_code_branch = settings.declared_code_branch.clone();

        if let Some(repository) = &settings.declared_code_repository {
            let project = settings.declared_code_project.as_deref().unwrap_or(self.project);
            let url = self.links.repository_url_in(project, repository);
            item.declared_code_branch_url = settings
                .declared_code_branch
                .as_deref()
                .map(|branch| PipelineLinks::branch_url(&url, branch));
            item.declared_code_repository_url = Some(url);
        }
    }

    /// One reference per environment that declares a group name.
    fn declared_groups(&self, settings: &ParsedPipelineSettings) -> Vec<VariableGroupRef> {
        settings
            .environments
            .iter()
            .filter_map(|env| {
                let declared = env.variable_group.as_deref()?;
                let reference = match self.known_groups.by_name(declared) {
                    Some(group) => resolved_ref(group, Some(env.environment.clone())),
                    None => VariableGroupRef {
                        name: declared.to_string(),
                        environment: Some(env.environment.clone()),
                        id: None,
                        variable_count: 0,
                        url: Some(self.links.variable_groups_url()),
                    },
                };
                Some(reference)
            })
            .collect()
    }

    /// Groups linked on the definition object itself, resolved by id then name.
    fn linked_groups(&self, identifiers: &[GroupIdentifier]) -> Vec<VariableGroupRef> {
        identifiers
            .iter()
            .filter_map(|identifier| {
                let resolved = identifier
                    .id
                    .and_then(|id| self.known_groups.by_id(id))
                    .or_else(|| {
                        identifier
                            .name
                            .as_deref()
                            .and_then(|name| self.known_groups.by_name(name))
                    });

                if let Some(group) = resolved {
                    return Some(resolved_ref(group, None));
                }

                let name = identifier
                    .name
                    .clone()
                    .or_else(|| identifier.id.map(|id| format!("Variable group {id}")))?;
                let url = identifier.id.map_or_else(
                    || self.links.variable_groups_url(),
                    |id| self.links.variable_group_url(id),
                );
                Some(VariableGroupRef {
                    name,
                    environment: None,
                    id: None,
                    variable_count: 0,
                    url: Some(url),
                })
            })
            .collect()
    }
}

fn resolved_ref(group: &ConfigurationGroup, environment: Option<String>) -> VariableGroupRef {
    VariableGroupRef {
        name: group.name.clone(),
        environment,
        id: Some(group.id),
        variable_count: group.variables.len(),
        url: Some(group.url.clone()),
    }
}

fn record_failure(item: &mut PipelineListItem, step: &str, error: &PipeLensError) {
    warn!(
        "Failed to fetch {step} for pipeline {} ({}): {error}",
        item.skeleton.id, item.skeleton.name
    );
    item.enrichment_warnings.push(format!("{step}: {error}"));
}
