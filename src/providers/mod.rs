pub mod azure;

pub use azure::AzureDevOpsProvider;
