use serde::{Deserialize, Serialize};

use crate::catalog::{CompletionSummary, PipelineListItem, PipelineSkeleton};

/// Messages pushed to a recipient while an aggregation runs.
///
/// Within one request they arrive in order: status, skeleton, zero or more
/// batches, complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProgressEvent {
    StatusMessage {
        message: String,
    },
    Skeleton {
        pipelines: Vec<PipelineSkeleton>,
    },
    /// An owned snapshot of the items enriched since the previous batch
    Batch {
        items: Vec<PipelineListItem>,
        processed: usize,
        total: usize,
    },
    Complete {
        summary: CompletionSummary,
    },
}

impl ProgressEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::StatusMessage {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::StatusMessage { .. } => "statusMessage",
            Self::Skeleton { .. } => "skeleton",
            Self::Batch { .. } => "batch",
            Self::Complete { .. } => "complete",
        }
    }
}
