use std::collections::BTreeMap;

use crate::catalog::{TriggerCategory, TriggerClassification};

/// Trigger metadata keys that may carry the upstream pipeline's name.
const UPSTREAM_PIPELINE_KEYS: [&str; 3] = ["definitionName", "pipelineName", "triggeringPipeline"];

/// Maps a run's raw trigger reason to a normalized classification.
///
/// Unknown or missing reasons fall into [`TriggerCategory::Other`].
pub fn classify_trigger(
    reason: Option<&str>,
    metadata: &BTreeMap<String, String>,
) -> TriggerClassification {
    let category = match reason.map(str::trim).unwrap_or_default() {
        r if r.eq_ignore_ascii_case("manual") || r.eq_ignore_ascii_case("userCreated") => {
            TriggerCategory::Manual
        }
        r if r.eq_ignore_ascii_case("individualCI") || r.eq_ignore_ascii_case("batchedCI") => {
            TriggerCategory::CodePush
        }
        r if r.eq_ignore_ascii_case("schedule") => TriggerCategory::Scheduled,
        r if r.eq_ignore_ascii_case("pullRequest") => TriggerCategory::PullRequest,
        r if r.eq_ignore_ascii_case("buildCompletion") => TriggerCategory::PipelineCompletion,
        r if r.eq_ignore_ascii_case("resourceTrigger") => TriggerCategory::ResourceTrigger,
        _ => TriggerCategory::Other,
    };

    let triggered_by_pipeline = if category == TriggerCategory::PipelineCompletion {
        upstream_pipeline(metadata)
    } else {
        None
    };

    TriggerClassification {
        category,
        label: label(category).to_string(),
        is_automated: category != TriggerCategory::Manual,
        triggered_by_pipeline,
    }
}

fn label(category: TriggerCategory) -> &'static str {
    match category {
        TriggerCategory::Manual => "Manual",
        TriggerCategory::CodePush => "Code push",
        TriggerCategory::Scheduled => "Scheduled",
        TriggerCategory::PullRequest => "Pull request",
        TriggerCategory::PipelineCompletion => "Pipeline completion",
        TriggerCategory::ResourceTrigger => "Resource trigger",
        TriggerCategory::Other => "Other",
    }
}

fn upstream_pipeline(metadata: &BTreeMap<String, String>) -> Option<String> {
    UPSTREAM_PIPELINE_KEYS.iter().find_map(|key| {
        metadata
            .iter()
            .find(|(k, v)| k.eq_ignore_ascii_case(key) && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
    })
}
