use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value as JsonValue;

use crate::config::Config;
use crate::definitions::{load_workflow_file, LoadedWorkflows};
use crate::engine::Engine;
use crate::logging;

#[derive(Parser)]
#[command(name = "ruleflow")]
#[command(about = "ruleflow - evaluate rule workflows against JSON input", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Identifier expressions use for the input (overrides config file and env vars)
    #[arg(long, global = true)]
    pub binding: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate workflows against an input document and print the results as JSON
    ///
    /// No actions are registered on the command line, so only rule outcomes are reported.
    Eval {
        /// Workflow definition file (.toml or .json)
        #[arg(short = 'w', long = "workflows")]
        workflows: PathBuf,

        /// Input JSON file, or `-` for stdin
        #[arg(short = 'i', long = "input")]
        input: PathBuf,

        /// Evaluate only this workflow
        #[arg(long = "workflow")]
        workflow: Option<String>,

        /// Print results on one line
        #[arg(long)]
        compact: bool,
    },

    /// Validate every rule expression in a definition file
    Check {
        #[arg(short = 'w', long = "workflows")]
        workflows: PathBuf,
    },

    /// List the workflows in a definition file
    List {
        #[arg(short = 'w', long = "workflows")]
        workflows: PathBuf,
    },
}

/// Run the CLI by parsing process arguments
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli)
}

fn run_cli_with_args(cli: Cli) -> Result<()> {
    // Load configuration before touching any file so config errors surface first
    let config = Config::builder()
        .config_path(cli.config.clone())
        .input_binding(cli.binding.clone())
        .build()
        .context("Failed to load configuration")?;

    logging::init(&config.logging.filter);

    match cli.command {
        Commands::Eval {
            workflows,
            input,
            workflow,
            compact,
        } => {
            let results = eval_command(&config, &workflows, &input, workflow.as_deref())?;
            let rendered = if compact {
                serde_json::to_string(&results)?
            } else {
                serde_json::to_string_pretty(&results)?
            };
            println!("{}", rendered);
        }

        Commands::Check { workflows } => {
            let problems = check_command(&config, &workflows)?;
            if !problems.is_empty() {
                for problem in &problems {
                    eprintln!("{}", problem);
                }
                bail!("{} invalid rule(s) in {}", problems.len(), workflows.display());
            }
            println!("✓ All rules in {} are valid", workflows.display());
        }

        Commands::List { workflows } => {
            let loaded = load(&workflows)?;
            if loaded.workflows.is_empty() {
                println!("No workflows found");
                return Ok(());
            }

            println!(
                "Found {} workflow(s) (version: {}):\n",
                loaded.workflows.len(),
                &loaded.version[..8]
            );
            for workflow in &loaded.workflows {
                println!("  {} | {} rule(s)", workflow.name(), workflow.len());
            }
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<LoadedWorkflows> {
    load_workflow_file(path).with_context(|| format!("Failed to load workflows from {}", path.display()))
}

fn read_input(path: &Path) -> Result<JsonValue> {
    let text = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read input from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read input {}", path.display()))?
    };

    serde_json::from_str(&text).context("Input is not valid JSON")
}

fn eval_command(config: &Config, workflows: &Path, input: &Path, only: Option<&str>) -> Result<JsonValue> {
    let loaded = load(workflows)?;
    let engine: Engine<JsonValue> = Engine::from_config(loaded.workflows, config)?;
    let mut input = read_input(input)?;

    let results = match only {
        Some(name) => {
            if engine.workflow(name).is_none() {
                bail!("Workflow '{}' not found in {}", name, workflows.display());
            }
            let results = engine.evaluate_named(&mut input, name)?;
            serde_json::to_value(results)?
        }
        None => serde_json::to_value(engine.evaluate_all(&mut input)?)?,
    };

    Ok(results)
}

fn check_command(config: &Config, workflows: &Path) -> Result<Vec<String>> {
    let loaded = load(workflows)?;
    let engine: Engine<JsonValue> = Engine::from_config(loaded.workflows, config)?;

    Ok(engine
        .check()
        .into_iter()
        .map(|invalid| format!("{}/{}: {}", invalid.workflow, invalid.rule, invalid.error))
        .collect())
}
