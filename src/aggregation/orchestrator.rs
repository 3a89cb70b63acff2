use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use log::{info, warn};

use super::enrichment::Enricher;
use super::resolver::KnownGroups;
use crate::catalog::{AggregationResult, CompletionSummary, PipelineListItem, PipelineSkeleton};
use crate::error::{PipeLensError, Result};
use crate::gateway::{DefinitionRef, PipelineGateway};
use crate::notify::{NotificationChannel, ProgressEvent};
use crate::providers::azure::PipelineLinks;

pub const DEFAULT_BATCH_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationOptions {
    /// Items per batch event
    pub batch_size: usize,
    /// Skeletons enriched at the same time; emission order is unaffected
    pub concurrency: usize,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: 1,
        }
    }
}

/// Builds the pipeline catalog of a project and streams it to a recipient.
///
/// The flow has four phases:
/// 1. Connecting: a status message is pushed before any external call
/// 2. Skeleton: the definition list is turned into skeleton rows
/// 3. Enriching: rows are enriched in list order and pushed in batches
/// 4. Complete: a summary is pushed and the full list returned
///
/// Events only go out when a recipient is given; the returned
/// [`AggregationResult`] is the same either way.
pub struct Aggregator {
    gateway: Arc<dyn PipelineGateway>,
    channel: Arc<dyn NotificationChannel>,
    base_url: String,
    organization: String,
    options: AggregationOptions,
}

impl Aggregator {
    pub fn new(
        gateway: Arc<dyn PipelineGateway>,
        channel: Arc<dyn NotificationChannel>,
        base_url: &str,
        organization: &str,
    ) -> Self {
        Self {
            gateway,
            channel,
            base_url: base_url.to_string(),
            organization: organization.to_string(),
            options: AggregationOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: AggregationOptions) -> Self {
        self.options = AggregationOptions {
            batch_size: options.batch_size.max(1),
            concurrency: options.concurrency.max(1),
        };
        self
    }

    /// Aggregates every pipeline of `project`. Never fails: errors that escape
    /// per-item isolation become a failed result with the error message.
    pub async fn aggregate(&self, project: &str, recipient: Option<&str>) -> AggregationResult {
        let notifier = Notifier {
            channel: self.channel.as_ref(),
            recipient,
        };

        notifier.push(|| ProgressEvent::status(format!("Connecting to project {project}...")));

        match self.collect(project, &notifier).await {
            Ok(items) => AggregationResult::completed(items),
            Err(e) => {
                warn!("Aggregation for project {project} failed: {e}");
                notifier.push(|| ProgressEvent::status(format!("Failed to load pipelines: {e}")));
                AggregationResult::failed(e.to_string())
            }
        }
    }

    /// Like [`Aggregator::aggregate`], but gives up after `timeout`.
    pub async fn aggregate_with_timeout(
        &self,
        project: &str,
        recipient: Option<&str>,
        timeout: Duration,
    ) -> AggregationResult {
        match tokio::time::timeout(timeout, self.aggregate(project, recipient)).await {
            Ok(result) => result,
            Err(_) => {
                let error = PipeLensError::Timeout(timeout);
                warn!("Aggregation for project {project} aborted: {error}");
                if let Some(recipient) = recipient {
                    self.channel
                        .push_to_one(recipient, ProgressEvent::status(error.to_string()));
                }
                AggregationResult::failed(error.to_string())
            }
        }
    }

    async fn collect(&self, project: &str, notifier: &Notifier<'_>) -> Result<Vec<PipelineListItem>> {
        let started = Instant::now();
        let links = PipelineLinks::new(&self.base_url, &self.organization, project);

        // Phase 2: skeleton
        let definitions = self.gateway.list_definitions(project).await?;
        let skeletons: Vec<PipelineSkeleton> = definitions
            .into_iter()
            .map(|definition| skeleton(&links, definition))
            .collect();
        let total = skeletons.len();
        info!("Found {total} pipeline definitions in {project}");
        notifier.push(|| ProgressEvent::Skeleton {
            pipelines: skeletons.clone(),
        });

        // Phase 3: enrichment
        let known_groups = match self.gateway.list_configuration_groups(project).await {
            Ok(groups) => KnownGroups::new(groups),
            Err(e) => {
                warn!("Failed to fetch variable groups for {project}, continuing without them: {e}");
                KnownGroups::default()
            }
        };
        info!(
            "Enriching {total} pipelines with {} known variable groups",
            known_groups.len()
        );

        let enricher = Enricher::new(self.gateway.as_ref(), &links, &known_groups, project);
        let batch_size = self.options.batch_size;
        let mut items: Vec<PipelineListItem> = Vec::with_capacity(total);
        let mut batch: Vec<PipelineListItem> = Vec::with_capacity(batch_size);

        let mut enriched = stream::iter(skeletons)
            .map(|skeleton| enricher.enrich(skeleton))
            .buffered(self.options.concurrency);

        while let Some(item) = enriched.next().await {
            batch.push(item);
            let processed = items.len() + batch.len();

            if batch.len() >= batch_size || processed == total {
                notifier.push(|| ProgressEvent::Batch {
                    items: batch.clone(),
                    processed,
                    total,
                });
                items.append(&mut batch);
            }
        }

        // Phase 4: complete
        let summary = CompletionSummary {
            total_count: items.len(),
            items_with_warnings: items
                .iter()
                .filter(|item| !item.enrichment_warnings.is_empty())
                .count(),
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!(
            "Aggregated {} pipelines for {project} in {}ms ({} with warnings)",
            summary.total_count, summary.elapsed_ms, summary.items_with_warnings
        );
        notifier.push(|| ProgressEvent::Complete { summary });

        Ok(items)
    }
}

fn skeleton(links: &PipelineLinks, definition: DefinitionRef) -> PipelineSkeleton {
    PipelineSkeleton {
        id: definition.id,
        runs_url: links.runs_url(definition.id),
        edit_url: links.edit_url(definition.id),
        name: definition.name,
        path: definition.path,
    }
}

/// Pushes to the request's recipient, if it has one.
struct Notifier<'a> {
    channel: &'a dyn NotificationChannel,
    recipient: Option<&'a str>,
}

impl Notifier<'_> {
    /// The event is only built when there is someone to send it to.
    fn push(&self, event: impl FnOnce() -> ProgressEvent) {
        if let Some(recipient) = self.recipient {
            self.channel.push_to_one(recipient, event());
        }
    }
}
