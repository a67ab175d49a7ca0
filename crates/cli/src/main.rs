//! crewflow CLI: the main entry point.
//!
//! Commands:
//! - `ask`     Any agent kind, picked with `--kind`
//! - `react`   ReAct loop with the built-in demo tools
//! - `tool`    Single-shot tool agent
//! - `reflect` Self-critique loop
//! - `crew`    Run a crew manifest in dependency order
//! - `tools`   List the built-in tools
//! - `config`  Show or initialize the configuration

use clap::{Parser, Subcommand};
use crewflow_agent::AgentKind;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "crewflow",
    about = "crewflow: ReAct agents, self-critique loops and dependency-ordered crews",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to ~/.crewflow/config.toml)
    #[arg(long, global = true, env = "CREWFLOW_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer with the agent kind of your choice
    Ask {
        /// The question or task
        #[arg(short, long)]
        message: String,

        /// Agent kind: react, tool or reflection
        #[arg(short, long, default_value = "react")]
        kind: AgentKind,

        /// System prompt (generator persona for reflection)
        #[arg(long)]
        system: Option<String>,
    },

    /// Answer a question with the ReAct loop and the built-in tools
    React {
        /// The question
        #[arg(short, long)]
        message: String,

        /// Round budget (defaults to agent.max_rounds)
        #[arg(long)]
        rounds: Option<usize>,

        /// File with a custom system prompt; `{tools}` is replaced by the tool signatures
        #[arg(long)]
        system: Option<PathBuf>,
    },

    /// One tool-calling completion, then one answer
    Tool {
        /// The request
        #[arg(short, long)]
        message: String,
    },

    /// Refine an answer with a generator and a critic
    Reflect {
        /// The task
        #[arg(short, long)]
        message: String,

        /// Cycle budget (defaults to agent.max_cycles)
        #[arg(long)]
        cycles: Option<usize>,

        /// Substring in the critique that ends the loop
        #[arg(long)]
        stop_token: Option<String>,

        /// Generator persona
        #[arg(long)]
        system: Option<String>,

        /// Critic persona
        #[arg(long)]
        critic: Option<String>,
    },

    /// Run the agents of a crew manifest in dependency order
    Crew {
        /// Path to the crew manifest (TOML)
        manifest: PathBuf,

        /// Start each agent as soon as its dependencies are done
        #[arg(long)]
        concurrent: bool,

        /// Print the crew as a Graphviz DOT graph before running
        #[arg(long)]
        dot: bool,
    },

    /// List the built-in tools
    Tools,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    // Initialize tracing
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    if cli.json_logs || config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Ask {
            message,
            kind,
            system,
        } => commands::ask::run(&config, kind, &message, system.as_deref()).await?,
        Commands::React {
            message,
            rounds,
            system,
        } => commands::react::run(&config, &message, rounds, system.as_deref()).await?,
        Commands::Tool { message } => commands::tool::run(&config, &message).await?,
        Commands::Reflect {
            message,
            cycles,
            stop_token,
            system,
            critic,
        } => {
            let options = commands::reflect::Options {
                cycles,
                stop_token,
                system,
                critic,
            };
            commands::reflect::run(&config, &message, options).await?
        }
        Commands::Crew {
            manifest,
            concurrent,
            dot,
        } => commands::crew::run(&config, &manifest, concurrent, dot).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(&config).await?,
            ConfigAction::Init { force } => {
                commands::config_cmd::init(cli.config.as_deref(), force).await?
            }
        },
    }

    Ok(())
}
