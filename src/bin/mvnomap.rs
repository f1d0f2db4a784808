//! mvnomap CLI - convert and normalize MVNO provider responses
//!
//! Provider definitions come from `--config`, then `MVNOMAP_CONFIG_DIR`
//! (also read from `.env`), then the providers built into the crate.

use clap::{Parser, Subcommand};
use mvnomap::providers::{default_transforms, ProviderRegistry};
use mvnomap::{load_providers_from_dir, MvnoIntegration, PartialRecord};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const CONFIG_DIR_VAR: &str = "MVNOMAP_CONFIG_DIR";

#[derive(Parser)]
#[command(name = "mvnomap")]
#[command(version, about = "Convert and normalize MVNO provider responses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured providers and their operations
    Providers {
        /// Directory of provider YAML files
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Convert one provider payload into a partial canonical record
    Convert {
        #[arg(short, long)]
        provider: String,

        /// Operation (response type) the payload belongs to
        #[arg(short, long)]
        operation: String,

        /// Payload file (JSON or SOAP XML, per the operation)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory of provider YAML files
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Convert several payloads and merge them into one record
    Normalize {
        #[arg(short, long)]
        provider: String,

        /// OPERATION=FILE, at least twice
        #[arg(long = "part", value_name = "OPERATION=FILE", value_parser = parse_part, required = true)]
        parts: Vec<(String, PathBuf)>,

        /// Fail unless the merged record carries both identity fields
        #[arg(long)]
        require_complete: bool,

        /// Directory of provider YAML files
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Load and validate provider YAML without converting anything
    Check {
        /// Directory of provider YAML files
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn parse_part(raw: &str) -> Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((operation, file)) if !operation.is_empty() && !file.is_empty() => {
            Ok((operation.to_string(), PathBuf::from(file)))
        }
        _ => Err(format!("expected OPERATION=FILE, got '{}'", raw)),
    }
}

fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Providers { config } => list_providers(config),
        Commands::Convert { provider, operation, input, config } => {
            convert_payload(config, &provider, &operation, &input)
        }
        Commands::Normalize { provider, parts, require_complete, config } => {
            normalize_parts(config, &provider, &parts, require_complete)
        }
        Commands::Check { config } => check_config(config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Flag first, then the environment
fn config_dir(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| env::var_os(CONFIG_DIR_VAR).map(PathBuf::from))
}

fn load_registry(flag: Option<PathBuf>) -> Result<ProviderRegistry, String> {
    match config_dir(flag) {
        Some(dir) => {
            debug!(dir = %dir.display(), "loading providers from directory");
            ProviderRegistry::from_dir(&dir, &default_transforms()).map_err(|e| e.to_string())
        }
        None => ProviderRegistry::builtin().map_err(|e| e.to_string()),
    }
}

fn read_input(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

fn print_record(record: &PartialRecord) -> Result<(), String> {
    let json = record.to_json_pretty().map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn list_providers(config: Option<PathBuf>) -> Result<(), String> {
    let registry = load_registry(config)?;

    for provider in registry.iter() {
        match provider.description() {
            Some(description) => println!("{} - {}", provider.name(), description),
            None => println!("{}", provider.name()),
        }
        for operation in provider.operations() {
            println!("  {} ({})", operation.name, operation.input);
        }
    }
    Ok(())
}

fn convert_payload(config: Option<PathBuf>, provider: &str, operation: &str, input: &Path) -> Result<(), String> {
    let registry = load_registry(config)?;
    let integration = registry.get(provider).map_err(|e| e.to_string())?;
    let text = read_input(input)?;

    let record = integration
        .convert_text(operation, &text)
        .map_err(|e| e.to_string())?;
    print_record(&record)
}

fn normalize_parts(
    config: Option<PathBuf>,
    provider: &str,
    parts: &[(String, PathBuf)],
    require_complete: bool,
) -> Result<(), String> {
    let registry = load_registry(config)?;
    let integration = registry.get(provider).map_err(|e| e.to_string())?;

    let mut records = Vec::with_capacity(parts.len());
    for (operation, file) in parts {
        let text = read_input(file)?;
        let record = integration
            .convert_text(operation, &text)
            .map_err(|e| format!("{} ({}): {}", operation, file.display(), e))?;
        records.push(record);
    }

    let merged = integration.normalize(&records).map_err(|e| e.to_string())?;
    info!(provider, parts = records.len(), "normalized records");

    if require_complete {
        let complete = merged.into_complete().map_err(|e| e.to_string())?;
        let json = serde_json::to_string_pretty(&complete).map_err(|e| e.to_string())?;
        println!("{}", json);
        return Ok(());
    }
    print_record(&merged)
}

fn check_config(config: Option<PathBuf>) -> Result<(), String> {
    let dir = config_dir(config).unwrap_or_else(|| PathBuf::from("config/providers"));

    let providers = load_providers_from_dir(&dir, &default_transforms()).map_err(|e| e.to_string())?;
    if providers.is_empty() {
        return Err(format!("No provider definitions found in {}", dir.display()));
    }

    for provider in &providers {
        let operations = provider.operations().count();
        println!("  ✓ {} ({} operations)", provider.name(), operations);
    }
    println!("✓ {} provider(s) valid", providers.len());
    Ok(())
}
