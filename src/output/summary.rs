use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};
use pipelens::catalog::{AggregationResult, PipelineListItem};

use super::styling::{bright, cyan, dim, failure, success, warning};
use super::tables::{create_table, duration_cell, groups_cell, header_cells, result_cell};

/// Prints a human-readable view of a pipeline catalog to stdout.
///
/// Shows an overview, one row per pipeline with its latest run and trigger,
/// the declared variable groups per environment, and any enrichment warnings.
pub fn print_catalog(organization: &str, project: &str, result: &AggregationResult) {
    println!("{}", render_catalog(organization, project, result));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn render_catalog(organization: &str, project: &str, result: &AggregationResult) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");

    let with_warnings = result
        .items
        .iter()
        .filter(|item| !item.enrichment_warnings.is_empty())
        .count();
    let failed_runs = result
        .items
        .iter()
        .filter(|item| item.last_run_result.as_deref() == Some("failed"))
        .count();

    let _ = write!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n\n",
        dim("Project:"),
        cyan(format!("{organization}/{project}")),
        dim("Pipelines:"),
        warning(result.total_count),
        dim("Last run failed:"),
        if failed_runs > 0 {
            failure(failed_runs)
        } else {
            success(failed_runs)
        },
        dim("With warnings:"),
        if with_warnings > 0 {
            warning(with_warnings)
        } else {
            success(with_warnings)
        },
    );

    if !result.success {
        let message = result.error_message.as_deref().unwrap_or("Unknown error");
        let _ = writeln!(output, "{}", failure(message));
        return output;
    }

    if result.items.is_empty() {
        let _ = writeln!(output, "{}", warning("No pipelines found."));
        return output;
    }

    add_section_header(&mut output, "📋", "Pipelines");

    let mut pipelines_table = create_table();
    pipelines_table.set_header(header_cells(&[
        "ID",
        "Pipeline",
        "Last Run",
        "Duration",
        "Trigger",
        "Branch",
        "Groups",
    ]));

    for item in &result.items {
        let resolved = item.variable_groups.iter().filter(|g| g.is_resolved()).count();
        pipelines_table.add_row(vec![
            Cell::new(item.skeleton.id),
            Cell::new(pipeline_label(item)),
            result_cell(item.last_run_status.as_deref(), item.last_run_result.as_deref()),
            duration_cell(item.last_run_duration_secs),
            Cell::new(trigger_label(item)),
            Cell::new(item.trigger_branch.as_deref().unwrap_or("-")),
            groups_cell(resolved, item.variable_groups.len()),
        ]);
    }

    let _ = write!(output, "{pipelines_table}\n\n");

    let grouped: Vec<&PipelineListItem> = result
        .items
        .iter()
        .filter(|item| !item.variable_groups.is_empty())
        .collect();

    if !grouped.is_empty() {
        add_section_header(&mut output, "🔐", "Variable Groups");

        let mut groups_table = create_table();
        groups_table.set_header(header_cells(&[
            "Pipeline",
            "Environment",
            "Group",
            "Variables",
        ]));

        for item in grouped {
            for group in &item.variable_groups {
                let name = if group.is_resolved() {
                    Cell::new(&group.name).fg(TableColor::Green)
                } else {
                    Cell::new(format!("{} (not found)", group.name)).fg(TableColor::Red)
                };
                groups_table.add_row(vec![
                    Cell::new(&item.skeleton.name),
                    Cell::new(group.environment.as_deref().unwrap_or("-")),
                    name,
                    Cell::new(group.variable_count),
                ]);
            }
        }

        let _ = write!(output, "{groups_table}\n\n");
    }

    let warned: Vec<&PipelineListItem> = result
        .items
        .iter()
        .filter(|item| !item.enrichment_warnings.is_empty())
        .collect();

    if !warned.is_empty() {
        add_section_header(&mut output, "⚠️", "Warnings");
        for item in warned {
            for message in &item.enrichment_warnings {
                let _ = writeln!(
                    output,
                    "  {} {} {}",
                    cyan("•"),
                    bright(&item.skeleton.name),
                    dim(message)
                );
            }
        }
    }

    output
}

fn pipeline_label(item: &PipelineListItem) -> String {
    let folder = item.skeleton.path.trim_matches('\\');
    if folder.is_empty() {
        item.skeleton.name.clone()
    } else {
        format!("{}\n{}", item.skeleton.name, folder)
    }
}

fn trigger_label(item: &PipelineListItem) -> String {
    match (&item.trigger_label, &item.triggered_by_pipeline) {
        (Some(label), Some(upstream)) => format!("{label}\n{upstream}"),
        (Some(label), None) => label.clone(),
        (None, _) => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipelens::catalog::{PipelineSkeleton, VariableGroupRef};

    fn item(id: u64, name: &str) -> PipelineListItem {
        PipelineListItem::from(PipelineSkeleton {
            id,
            name: name.to_string(),
            path: "\\".to_string(),
            ..PipelineSkeleton::default()
        })
    }

    #[test]
    fn test_render_catalog_empty_project() {
        let output = render_catalog("contoso", "Web", &AggregationResult::completed(vec![]));

        assert!(output.contains("contoso/Web"));
        assert!(output.contains("No pipelines found"));
    }

    #[test]
    fn test_render_catalog_failure() {
        let output = render_catalog(
            "contoso",
            "Web",
            &AggregationResult::failed("Project not found: Web"),
        );

        assert!(output.contains("Project not found: Web"));
        assert!(!output.contains("No pipelines found"));
    }

    #[test]
    fn test_render_catalog_with_groups_and_warnings() {
        let mut web = item(1, "web-ci");
        web.last_run_result = Some("failed".to_string());
        web.trigger_label = Some("Pipeline completion".to_string());
        web.triggered_by_pipeline = Some("core-build".to_string());
        web.variable_groups = vec![
            VariableGroupRef {
                name: "WebApi-PROD".to_string(),
                environment: Some("PROD".to_string()),
                id: Some(4),
                variable_count: 12,
                url: None,
            },
            VariableGroupRef {
                name: "WebApi-QA".to_string(),
                environment: Some("QA".to_string()),
                id: None,
                variable_count: 0,
                url: None,
            },
        ];

        let mut api = item(2, "api-ci");
        api.enrichment_warnings = vec!["latest run: network down".to_string()];

        let output = render_catalog(
            "contoso",
            "Web",
            &AggregationResult::completed(vec![web, api]),
        );

        assert!(output.contains("web-ci"));
        assert!(output.contains("core-build"));
        assert!(output.contains("1/2"));
        assert!(output.contains("WebApi-QA (not found)"));
        assert!(output.contains("Warnings"));
        assert!(output.contains("latest run: network down"));
    }
}
