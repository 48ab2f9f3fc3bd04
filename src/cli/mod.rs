//! Command line interface for kodegen_bundler_wix.
//!
//! Parses arguments, runs one generation pass and reports the result.

mod args;
mod generate;
mod output;

pub use args::Args;
pub use generate::execute;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute(args).await
}
