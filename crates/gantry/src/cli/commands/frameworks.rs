//! Frameworks command - list the supported framework catalog

use clap::Args;
use console::style;

use gantry_frameworks::builtin_frameworks;

use crate::cli::{Cli, OutputFormat};

/// List the frameworks the platform can detect and build
#[derive(Debug, Args)]
pub struct FrameworksCommand {}

impl FrameworksCommand {
    /// Execute the frameworks command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let frameworks = builtin_frameworks();

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&frameworks)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    for descriptor in &frameworks {
                        let slug = descriptor.slug.as_deref().unwrap_or("-");
                        let build = descriptor
                            .build_command
                            .value
                            .as_deref()
                            .or(descriptor.build_command.placeholder.as_deref())
                            .unwrap_or("-");
                        println!(
                            "{:<20} {:<18} {}",
                            style(&descriptor.name).bold(),
                            slug,
                            build
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
