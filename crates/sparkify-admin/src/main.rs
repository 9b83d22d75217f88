use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use sparkify_core::{
    config::{DwhConfig, DEFAULT_CONFIG_PATH},
    db, diagnostics,
    object_store::{configured_sources, SourceProbe},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sparkify warehouse administrative tooling", long_about = None)]
struct Cli {
    /// Warehouse configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the most recent rows of the warehouse load-error log
    LoadErrors(LoadErrorsArgs),
    /// Check that every configured object-store source has data
    CheckSources,
}

#[derive(Args, Debug)]
struct LoadErrorsArgs {
    /// Number of errors to show
    #[arg(long, default_value_t = 20)]
    limit: u32,
    /// Print the raw `SELECT *` statement instead of querying
    #[arg(long)]
    print_query: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::LoadErrors(args) => handle_load_errors(&cli.config, args).await,
        Command::CheckSources => handle_check_sources(&cli.config).await,
    }
}

fn load_config(path: &Path) -> Result<DwhConfig> {
    dotenvy::dotenv().ok();
    DwhConfig::from_path(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

async fn handle_load_errors(config_path: &Path, args: LoadErrorsArgs) -> Result<()> {
    if args.print_query {
        println!("{}", diagnostics::get_load_errors());
        return Ok(());
    }

    let config = load_config(config_path)?;
    let options = db::connect_options(&config)?;
    let mut conn = db::connect(&options)
        .await
        .context("failed to connect to the warehouse")?;

    let errors = diagnostics::fetch_load_errors(&mut conn, args.limit).await?;
    if errors.is_empty() {
        println!("No load errors recorded.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "start time",
        "file",
        "line",
        "column",
        "type",
        "value",
        "code",
        "reason",
    ]);
    for error in &errors {
        table.add_row(vec![
            error.start_time.to_string(),
            error.file_name.clone(),
            error.line_number.to_string(),
            error.column_name.clone(),
            error.column_type.clone(),
            error.raw_field_value.clone(),
            error.error_code.to_string(),
            error.error_reason.clone(),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn handle_check_sources(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let probe = SourceProbe::new(&config.s3.region).await;

    let mut table = Table::new();
    table.set_header(vec!["source", "uri", "sample keys", "status"]);
    let mut empty = Vec::new();
    for (name, uri) in configured_sources(&config.s3)? {
        let status = probe.probe(name, &uri).await?;
        let label = if status.is_empty() {
            empty.push(name);
            "EMPTY"
        } else if status.truncated {
            "ok (more keys)"
        } else {
            "ok"
        };
        table.add_row(vec![
            name.to_string(),
            uri.to_string(),
            status.sample_keys.len().to_string(),
            label.to_string(),
        ]);
    }
    println!("{table}");

    if !empty.is_empty() {
        bail!("no objects found under: {}", empty.join(", "));
    }
    info!(region = %config.s3.region, "All sources reachable");
    Ok(())
}
