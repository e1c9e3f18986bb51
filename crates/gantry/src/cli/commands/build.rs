//! Build command - run a framework build and normalize its output

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use gantry_builders::{builder_for_slug, BuilderConfig, BuilderContext, Output};
use gantry_frameworks::{builtin_frameworks, detect_framework, resolve_output_dir};

use crate::cli::{Cli, OutputFormat};

/// Build the project in the current directory
#[derive(Debug, Args)]
pub struct BuildCommand {
    /// Force a specific framework instead of detecting one
    #[arg(long)]
    pub framework: Option<String>,

    /// Install command override (empty string skips installing)
    #[arg(long)]
    pub install_command: Option<String>,

    /// Build command override
    #[arg(long)]
    pub build_command: Option<String>,

    /// Output directory override
    #[arg(short, long)]
    pub output_directory: Option<String>,

    /// Extra environment variables for build commands (KEY=VALUE)
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Write the normalized build result as JSON to this file
    #[arg(long)]
    pub result_file: Option<PathBuf>,
}

impl BuildCommand {
    /// Execute the build command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(framework = ?self.framework, "executing build command");
        // Run async operation in tokio runtime
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;

        let frameworks = builtin_frameworks();
        let descriptor = match &self.framework {
            Some(slug) => {
                let descriptor = gantry_frameworks::framework_by_slug(slug)?;
                if !cli.quiet && cli.format == OutputFormat::Text {
                    println!(
                        "{} Using framework: {}",
                        style("→").cyan(),
                        style(&descriptor.name).bold()
                    );
                }
                descriptor
            }
            None => detect_framework(&cwd, &frameworks)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no framework matched"))?,
        };

        if !cli.quiet && cli.format == OutputFormat::Text {
            println!();
            println!("{}", style("Building project...").bold());
            println!("  Framework: {}", style(&descriptor.name).cyan());
            println!();
        }

        let output_directory = self.output_directory.clone().unwrap_or_else(|| {
            resolve_output_dir(&descriptor, &cwd)
                .to_string_lossy()
                .into_owned()
        });

        let mut ctx = BuilderContext::new(&cwd, "package.json");
        ctx.config = BuilderConfig {
            install_command: self.install_command.clone(),
            build_command: self.build_command.clone(),
            output_directory: Some(output_directory),
            env: parse_env(&self.env)?,
        };

        let builder = builder_for_slug(descriptor.slug.as_deref())?;
        let result = match builder.build(&ctx).await {
            Ok(result) => result,
            Err(err) => {
                if cli.format == OutputFormat::Text && !cli.quiet {
                    println!();
                    println!("{} Build failed: {err}", style("✗").red().bold());
                }
                std::process::exit(err.exit_code());
            }
        };

        if let Some(path) = &self.result_file {
            std::fs::write(path, serde_json::to_string_pretty(&result)?)?;
        }

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    let (static_count, function_count) = count_outputs(&result.output);
                    println!();
                    println!(
                        "{} Build completed successfully!",
                        style("✓").green().bold()
                    );
                    println!();
                    println!("  Static files: {}", style(static_count).cyan());
                    println!("  Functions:    {}", style(function_count).cyan());
                    println!("  Routes:       {}", style(result.routes.len()).cyan());
                }
            }
        }

        Ok(())
    }
}

fn parse_env(pairs: &[String]) -> anyhow::Result<HashMap<String, String>> {
    let mut env = HashMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            anyhow::bail!("invalid environment variable (expected KEY=VALUE): {pair}");
        };
        env.insert(key.to_string(), value.to_string());
    }
    Ok(env)
}

fn count_outputs(output: &std::collections::BTreeMap<String, Output>) -> (usize, usize) {
    let static_count = output
        .values()
        .filter(|o| matches!(o, Output::Static(_)))
        .count();
    (static_count, output.len() - static_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env() {
        let env = parse_env(&["A=1".to_string(), "B=x=y".to_string()]).unwrap();
        assert_eq!(env["A"], "1");
        assert_eq!(env["B"], "x=y");
        assert!(parse_env(&["NOVALUE".to_string()]).is_err());
    }
}
