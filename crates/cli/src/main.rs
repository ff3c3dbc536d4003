//! perspective CLI — the main entry point.
//!
//! Commands:
//! - `render` — Render a perspective schema (file or CloudHealth API) as a report
//! - `config` — Show, locate, or validate the configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "perspective",
    about = "Parse a CloudHealth Perspective schema and generate human-readable output",
    after_help = "See https://apidocs.cloudhealthtech.com/#perspectives_retrieve-perspective-schema for help downloading a schema manually.",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a perspective schema as a readable report
    Render {
        /// Path to the JSON schema file (if omitted, fetch from the API)
        input_file: Option<PathBuf>,

        /// Write the report to a file instead of the screen
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// CloudHealth API key (prompted for if not configured)
        #[arg(long)]
        api_key: Option<String>,

        /// CloudHealth Perspective ID (prompted for if not provided)
        #[arg(long)]
        perspective_id: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
    /// Validate the configuration file
    Validate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so the report on stdout stays clean
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render {
            input_file,
            output,
            api_key,
            perspective_id,
        } => {
            commands::render::run(commands::render::RenderArgs {
                input_file,
                output,
                api_key,
                perspective_id,
            })
            .await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await,
            ConfigAction::Path => commands::config_cmd::path().await,
            ConfigAction::Validate => commands::config_cmd::validate().await,
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn render_args_parse() {
        let cli = Cli::parse_from([
            "perspective",
            "render",
            "schema.json",
            "-o",
            "out.txt",
            "--perspective-id",
            "42",
        ]);
        match cli.command {
            Commands::Render {
                input_file,
                output,
                api_key,
                perspective_id,
            } => {
                assert_eq!(input_file, Some(PathBuf::from("schema.json")));
                assert_eq!(output, Some(PathBuf::from("out.txt")));
                assert!(api_key.is_none());
                assert_eq!(perspective_id.as_deref(), Some("42"));
            }
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["perspective", "config", "path", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Path
            }
        ));
    }
}
