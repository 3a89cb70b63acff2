mod client;
mod links;
mod provider;
mod types;

pub use client::AzureDevOpsClient;
pub use links::PipelineLinks;
pub use provider::AzureDevOpsProvider;
