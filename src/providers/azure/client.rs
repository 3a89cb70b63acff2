mod builds;
mod core;
mod definitions;
mod gateway;
mod repositories;
mod variable_groups;

pub use self::core::AzureDevOpsClient;
