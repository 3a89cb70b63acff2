mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::CatalogProgress;
pub use styling::{dim, magenta_bold};
pub use summary::print_catalog;

/// Prints the `PipeLens` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔭 PipeLens"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Azure DevOps Pipeline Catalog")
    );
}
