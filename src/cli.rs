use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pipelens::aggregation::{parse_declaration, AggregationOptions};
use pipelens::auth::Token;
use pipelens::catalog::AggregationResult;
use pipelens::config::{Config, OutputFormat};
use pipelens::notify::SessionRegistry;
use pipelens::providers::AzureDevOpsProvider;

use crate::output::{print_catalog, CatalogProgress};

/// Session id under which the terminal receives progress events.
const CLI_SESSION: &str = "cli";

#[derive(Parser)]
#[command(name = "pipelens")]
#[command(author, version, about = "Azure DevOps Pipeline Catalog", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    /// Config file (defaults to ./pipelens.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the pipeline catalog of a project
    Pipelines {
        #[arg(short, long, env = "AZURE_DEVOPS_TOKEN", hide_env_values = true)]
        token: Option<String>,

        #[arg(short = 'u', long)]
        base_url: Option<String>,

        #[arg(short = 'O', long)]
        organization: Option<String>,

        #[arg(short = 'P', long)]
        project: Option<String>,

        #[arg(short, long)]
        batch_size: Option<usize>,

        #[arg(long)]
        concurrency: Option<usize>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Extract environment settings from a local pipeline YAML file
    Parse {
        file: PathBuf,

        #[arg(long)]
        pipeline_id: Option<u64>,

        #[arg(long)]
        pipeline_name: Option<String>,

        #[arg(long)]
        pipeline_path: Option<String>,
    },
}

/// Flags of the `pipelines` command, merged over the config file.
struct PipelinesArgs<'a> {
    token: Option<&'a str>,
    base_url: Option<&'a str>,
    organization: Option<&'a str>,
    project: Option<&'a str>,
    batch_size: Option<usize>,
    concurrency: Option<usize>,
    timeout: Option<u64>,
    format: Option<OutputFormat>,
}

impl Cli {
    async fn execute_pipelines(&self, args: PipelinesArgs<'_>) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        let organization = args
            .organization
            .map(ToString::to_string)
            .or(config.azure.organization.clone())
            .context("An organization is required (--organization or azure.organization)")?;
        let project = args
            .project
            .map(ToString::to_string)
            .or(config.azure.project.clone())
            .context("A project is required (--project or azure.project)")?;
        let base_url = args.base_url.unwrap_or(&config.azure.base_url);
        let token = args
            .token
            .or(config.azure.token.as_deref())
            .map(Token::from);

        let options = AggregationOptions {
            batch_size: args.batch_size.unwrap_or(config.aggregation.batch_size),
            concurrency: args.concurrency.unwrap_or(config.aggregation.concurrency),
        };
        let timeout = args
            .timeout
            .or(config.aggregation.timeout_secs)
            .map(Duration::from_secs);
        let format = args.format.unwrap_or(config.output.format);
        let pretty = self.pretty || config.output.pretty;

        info!("Collecting pipeline catalog for {organization}/{project}");

        let registry = Arc::new(SessionRegistry::new());
        let mut events = registry.register(CLI_SESSION);

        let provider = AzureDevOpsProvider::new(
            base_url,
            &organization,
            token,
            Some(&config.azure.api_version),
            registry.clone(),
        )?
        .with_options(options);

        let display = tokio::spawn(async move {
            let mut progress = CatalogProgress::start();
            while let Some(event) = events.recv().await {
                progress.handle(&event);
            }
            progress.finish();
        });

        let result = provider
            .collect_catalog(&project, Some(CLI_SESSION), timeout)
            .await;

        registry.deregister(CLI_SESSION);
        display.await.context("Progress display task failed")?;

        self.write_result(&organization, &project, &result, format, pretty)?;

        if !result.success {
            anyhow::bail!(
                "{}",
                result.error_message.as_deref().unwrap_or("Aggregation failed")
            );
        }

        Ok(())
    }

    fn write_result(
        &self,
        organization: &str,
        project: &str,
        result: &AggregationResult,
        format: OutputFormat,
        pretty: bool,
    ) -> Result<()> {
        if let Some(output_path) = &self.output {
            write_json(output_path, result, pretty)?;
            info!("Catalog written to: {}", output_path.display());
        }

        match format {
            OutputFormat::Table => print_catalog(organization, project, result),
            OutputFormat::Json if self.output.is_none() => {
                println!("{}", to_json(result, pretty)?);
            }
            OutputFormat::Json => {}
        }

        Ok(())
    }

    fn execute_parse(
        &self,
        file: &Path,
        pipeline_id: Option<u64>,
        pipeline_name: Option<&str>,
        pipeline_path: Option<&str>,
    ) -> Result<()> {
        info!("Parsing pipeline declaration: {}", file.display());

        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read pipeline file: {}", file.display()))?;

        let settings = parse_declaration(&text, pipeline_id, pipeline_name, pipeline_path);

        if let Some(output_path) = &self.output {
            write_json(output_path, &settings, self.pretty)?;
            info!("Settings written to: {}", output_path.display());
        } else {
            println!("{}", to_json(&settings, self.pretty)?);
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Pipelines {
                token,
                base_url,
                organization,
                project,
                batch_size,
                concurrency,
                timeout,
                format,
            } => {
                self.execute_pipelines(PipelinesArgs {
                    token: token.as_deref(),
                    base_url: base_url.as_deref(),
                    organization: organization.as_deref(),
                    project: project.as_deref(),
                    batch_size: *batch_size,
                    concurrency: *concurrency,
                    timeout: *timeout,
                    format: *format,
                })
                .await
            }
            Commands::Parse {
                file,
                pipeline_id,
                pipeline_name,
                pipeline_path,
            } => self.execute_parse(
                file,
                *pipeline_id,
                pipeline_name.as_deref(),
                pipeline_path.as_deref(),
            ),
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    std::fs::write(path, to_json(value, pretty)?)
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}
