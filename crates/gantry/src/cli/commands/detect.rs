//! Detect command - identify the framework a project uses

use clap::Args;
use console::style;
use tracing::info;

use gantry_frameworks::{builtin_frameworks, detect_framework, resolve_output_dir};

use crate::cli::{Cli, OutputFormat};

/// Detect the framework used by the project in the current directory
#[derive(Debug, Args)]
pub struct DetectCommand {}

impl DetectCommand {
    /// Execute the detect command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        info!(directory = %cwd.display(), "detecting framework");

        let frameworks = builtin_frameworks();
        let Some(descriptor) = detect_framework(&cwd, &frameworks) else {
            anyhow::bail!("no framework matched and no fallback is registered");
        };
        let output_dir = resolve_output_dir(descriptor, &cwd);

        match cli.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "name": descriptor.name,
                    "slug": descriptor.slug,
                    "buildCommand": descriptor.build_command.value,
                    "devCommand": descriptor.dev_command.value,
                    "outputDirectory": output_dir,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    println!(
                        "{} {}",
                        style("Framework:").bold(),
                        style(&descriptor.name).cyan()
                    );
                    if let Some(slug) = &descriptor.slug {
                        println!("{} {}", style("Slug:").bold(), slug);
                    }
                    if let Some(build) = &descriptor.build_command.value {
                        println!("{} {}", style("Build command:").bold(), build);
                    }
                    println!(
                        "{} {}",
                        style("Output directory:").bold(),
                        output_dir.display()
                    );
                }
            }
        }

        Ok(())
    }
}
