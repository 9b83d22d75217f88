use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use sparkify_core::{
    config::{DwhConfig, DEFAULT_CONFIG_PATH},
    create_table_queries, db, drop_table_queries, insert_table_queries,
    pipeline::{Pipeline, PipelineReport},
    preview,
    statements::{render_script, Stage, Statement},
    copy_table_queries, CopyConfig, TransformOptions,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sparkify star-schema warehouse loader", long_about = None)]
struct Cli {
    /// Warehouse configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drop and recreate the staging and star-schema tables
    CreateTables,
    /// Copy raw logs into staging and build the star schema
    Etl(TransformArgs),
    /// Drop, create, copy and transform in one run
    Run(TransformArgs),
    /// Print the SQL the pipeline would execute
    PrintSql(PrintSqlArgs),
    /// Build the star schema locally from JSON files and report row counts
    Preview(PreviewArgs),
}

#[derive(Args, Debug, Default)]
struct TransformArgs {
    /// Only correlate `NextSong` events into songplays
    #[arg(long)]
    next_song_only: bool,
}

impl TransformArgs {
    fn options(&self) -> TransformOptions {
        TransformOptions {
            next_song_only: self.next_song_only,
        }
    }
}

#[derive(Args, Debug)]
struct PrintSqlArgs {
    /// Limit output to one stage (drop-tables, create-tables, copy-staging, load-dimensions, load-fact)
    #[arg(long)]
    stage: Option<Stage>,

    #[command(flatten)]
    transform: TransformArgs,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Directory (or file) holding newline-delimited event logs
    #[arg(long)]
    events: PathBuf,
    /// Directory (or file) holding song metadata
    #[arg(long)]
    songs: PathBuf,
    /// JSON path-mapping file applied to the event logs
    #[arg(long)]
    jsonpaths: Option<PathBuf>,
    /// Print row counts as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    transform: TransformArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::CreateTables => {
            let config = load_config(&cli.config)?;
            run_pipeline(&config, Pipeline::create_tables()?).await
        }
        Command::Etl(args) => {
            let config = load_config(&cli.config)?;
            warn_unfiltered(&args.options());
            let pipeline = Pipeline::etl(&CopyConfig::from(&config), &args.options())?;
            run_pipeline(&config, pipeline).await
        }
        Command::Run(args) => {
            let config = load_config(&cli.config)?;
            warn_unfiltered(&args.options());
            let pipeline = Pipeline::full(&CopyConfig::from(&config), &args.options())?;
            run_pipeline(&config, pipeline).await
        }
        Command::PrintSql(args) => print_sql(&cli.config, &args),
        Command::Preview(args) => run_preview(&args),
    }
}

fn warn_unfiltered(options: &TransformOptions) {
    if let Some(caveat) = options.songplay_caveat() {
        warn!(statement = "songplay_table_insert", "{caveat}");
    }
}

fn load_config(path: &Path) -> Result<DwhConfig> {
    dotenvy::dotenv().ok();
    DwhConfig::from_path(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

async fn run_pipeline(config: &DwhConfig, pipeline: Pipeline) -> Result<()> {
    let options = db::connect_options(config)?;
    let mut conn = db::connect(&options)
        .await
        .context("failed to connect to the warehouse")?;

    let report = pipeline.run(&mut conn).await?;
    info!(state = %report.final_state, "Pipeline finished");
    print_report(&report);
    Ok(())
}

fn print_report(report: &PipelineReport) {
    let mut table = Table::new();
    table.set_header(vec!["stage", "statement", "rows", "elapsed (ms)"]);
    for outcome in &report.statements {
        table.add_row(vec![
            outcome.stage.to_string(),
            outcome.name.to_string(),
            outcome.rows_affected.to_string(),
            outcome.elapsed.as_millis().to_string(),
        ]);
    }
    println!("{table}");
    println!("Reached {} (from {})", report.final_state, report.started_at);
}

fn print_sql(config_path: &Path, args: &PrintSqlArgs) -> Result<()> {
    let needs_config = matches!(args.stage, None | Some(Stage::CopyStaging));
    let copy = if needs_config {
        Some(CopyConfig::from(&load_config(config_path)?))
    } else {
        None
    };

    let mut statements: Vec<Statement> = drop_table_queries();
    statements.extend(create_table_queries());
    if let Some(copy) = &copy {
        statements.extend(copy_table_queries(copy));
    }
    statements.extend(insert_table_queries(&args.transform.options()));

    if let Some(stage) = args.stage {
        statements.retain(|statement| statement.stage == stage);
    }
    print!("{}", render_script(&statements));
    Ok(())
}

fn run_preview(args: &PreviewArgs) -> Result<()> {
    let staging = preview::load_staging(&args.events, &args.songs, args.jsonpaths.as_deref())
        .context("failed to load local datasets")?;
    let options = args.transform.options();
    warn_unfiltered(&options);
    let schema = preview::build_star_schema(&staging, &options)?;
    let counts = schema.row_counts(&staging);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["table", "rows"]);
    for (name, rows) in [
        ("staging_events", counts.staging_events),
        ("staging_songs", counts.staging_songs),
        ("songplays", counts.songplays),
        ("users", counts.users),
        ("songs", counts.songs),
        ("artists", counts.artists),
        ("times", counts.times),
    ] {
        table.add_row(vec![name.to_string(), rows.to_string()]);
    }
    println!("{table}");
    Ok(())
}
