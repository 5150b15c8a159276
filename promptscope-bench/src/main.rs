//! PromptScope CLI

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use promptscope::MetricsCalculator;
use promptscope_bench::{
    analysis::{score_outcomes, ComparisonEngine},
    config::Config,
    experiments::{ExperimentStore, JsonFileStore, MemoryStore, NewExperiment},
    providers::{create_all_providers_with_config, create_providers_with_config, provider_statuses},
    reporting::{
        render_comparison, render_experiment, render_history, render_model_stats, render_scores,
        JsonSummary,
    },
    runner::Executor,
};

/// Output format for the `score` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum ScoreFormat {
    Json,
    Text,
}

#[derive(Parser)]
#[command(name = "promptscope")]
#[command(about = "Compare LLM responses with heuristic quality metrics")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Experiment store path (overrides [storage] path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a prompt to every provider and compare the responses
    Run {
        /// Prompt text
        #[arg(short, long, conflicts_with = "prompt_file", required_unless_present = "prompt_file")]
        prompt: Option<String>,

        /// Read the prompt from a file
        #[arg(long)]
        prompt_file: Option<PathBuf>,

        /// Free-form description stored with the experiment
        #[arg(short, long)]
        description: Option<String>,

        /// Comma-separated provider list (default: all available)
        #[arg(long)]
        providers: Option<String>,

        /// Do not persist the experiment
        #[arg(long)]
        no_save: bool,

        /// Write a JSON summary to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score a text file, or stdin when no input is given
    Score {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "json")]
        format: ScoreFormat,
    },

    /// List stored experiments, newest first
    History {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show one experiment with its scored responses
    Show { id: u64 },

    /// Delete an experiment
    Delete { id: u64 },

    /// Per-model averages across stored experiments
    Stats,

    /// List configured providers and whether their API key is set
    ListProviders,

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "promptscope.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("promptscope=debug,promptscope_bench=debug,warn")
        } else {
            EnvFilter::new("promptscope=info,promptscope_bench=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            prompt,
            prompt_file,
            description,
            providers,
            no_save,
            output,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            let prompt = match (prompt, prompt_file) {
                (Some(prompt), _) => prompt,
                (None, Some(path)) => std::fs::read_to_string(&path)?,
                (None, None) => return Err("a prompt is required".into()),
            };
            let store_path = store_path(cli.store, &config);
            run_experiment(
                &config,
                prompt,
                description,
                providers,
                (!no_save).then_some(store_path),
                output,
            )
            .await?;
        }

        Commands::Score { input, format } => {
            score_text(input.as_deref(), format)?;
        }

        Commands::History { limit } => {
            let store = open_store(cli.config.as_deref(), cli.store)?;
            let experiments: Vec<_> = store.list()?.into_iter().take(limit).collect();
            print!("{}", render_history(&experiments));
        }

        Commands::Show { id } => {
            let store = open_store(cli.config.as_deref(), cli.store)?;
            print!("{}", render_experiment(&store.get(id)?));
        }

        Commands::Delete { id } => {
            let mut store = open_store(cli.config.as_deref(), cli.store)?;
            let removed = store.delete(id)?;
            println!("Deleted experiment {} ({} responses)", removed.id, removed.responses.len());
        }

        Commands::Stats => {
            let store = open_store(cli.config.as_deref(), cli.store)?;
            let stats = ComparisonEngine::new().aggregate(&store.list()?);
            print!("{}", render_model_stats(&stats));
        }

        Commands::ListProviders => {
            let config = Config::load(cli.config.as_deref())?;
            list_providers(&config);
        }

        Commands::InitConfig { output } => {
            init_config(output)?;
        }
    }

    Ok(())
}

fn store_path(cli_store: Option<PathBuf>, config: &Config) -> PathBuf {
    cli_store.unwrap_or_else(|| config.storage.path.clone())
}

fn open_store(
    config_path: Option<&Path>,
    cli_store: Option<PathBuf>,
) -> Result<JsonFileStore, Box<dyn std::error::Error>> {
    let config = Config::load(config_path)?;
    Ok(JsonFileStore::open(store_path(cli_store, &config)))
}

async fn run_experiment(
    config: &Config,
    prompt: String,
    description: Option<String>,
    providers_arg: Option<String>,
    store_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let providers = if let Some(names) = providers_arg {
        let names: Vec<&str> = names.split(',').map(|s| s.trim()).collect();
        create_providers_with_config(&names, config)?
    } else {
        create_all_providers_with_config(config)
    };

    if providers.is_empty() {
        eprintln!("Error: No providers available. Set API keys in environment.");
        for status in provider_statuses(config).iter().filter(|s| s.enabled) {
            eprintln!("  {} for {}", status.key_env, status.name);
        }
        std::process::exit(1);
    }

    let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
    println!("Providers: {}", names.join(", "));

    let executor = Executor::new(providers, config.runner.executor_config());
    let outcomes = executor.fan_out(&prompt).await;
    let responses = score_outcomes(outcomes).await;

    let comparison = ComparisonEngine::new().compare(&responses);
    print!("{}", render_comparison(&responses, &comparison));

    let mut store: Box<dyn ExperimentStore> = match &store_path {
        Some(path) => Box::new(JsonFileStore::open(path)),
        None => Box::new(MemoryStore::new()),
    };
    let mut experiment = NewExperiment::new(prompt.as_str()).with_responses(responses.clone());
    if let Some(description) = description {
        experiment = experiment.with_description(description);
    }
    let stored = store.insert(experiment)?;

    let experiment_id = match &store_path {
        Some(path) => {
            println!("Saved experiment {} to {}", stored.id, path.display());
            Some(stored.id)
        }
        None => None,
    };

    if let Some(output) = output {
        JsonSummary::new(experiment_id, prompt, responses, &comparison).write_to_file(&output)?;
        println!("Summary written to: {}", output.display());
    }

    Ok(())
}

fn score_text(input: Option<&Path>, format: ScoreFormat) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = match input {
        Some(path) => std::fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let scores = MetricsCalculator::new().calculate_bytes(&bytes);
    match format {
        ScoreFormat::Json => println!("{}", serde_json::to_string_pretty(&scores)?),
        ScoreFormat::Text => print!("{}", render_scores(&scores)),
    }
    Ok(())
}

fn list_providers(config: &Config) {
    println!("{:<12}{:<12}{:<28}{:<10}Key", "Name", "Kind", "Model", "Enabled");
    println!("{:-<78}", "");
    for status in provider_statuses(config) {
        let key = if status.key_set { "set" } else { "missing" };
        println!(
            "{:<12}{:<12}{:<28}{:<10}{} ({})",
            status.name,
            status.kind.as_str(),
            status.model,
            if status.enabled { "yes" } else { "no" },
            key,
            status.key_env
        );
    }
}

fn init_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    config.save_toml(&output)?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}
