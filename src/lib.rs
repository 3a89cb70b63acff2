//! Pipeline catalog aggregation for Azure DevOps projects.
//!
//! The [`aggregation::Aggregator`] lists a project's pipeline definitions,
//! enriches each one with its latest run, trigger and declared variable
//! groups, and streams the results to a recipient through a
//! [`notify::NotificationChannel`] while it works.

pub mod aggregation;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod providers;

pub use error::{PipeLensError, Result};
