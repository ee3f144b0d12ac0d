//! Graphscribe - command line entry point
//!
//! Imports documents into a Kuzu graph through an LLM, runs ad-hoc queries
//! and inspects or resets the store.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use graphscribe::graph::GraphView;
use graphscribe::pipeline::{ImportMode, ImportSession};
use graphscribe::validator::looks_like_query;
use graphscribe::{AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "graphscribe")]
#[command(about = "Turn documents into a property graph")]
struct Cli {
    /// YAML configuration file (defaults to ./config.yaml)
    #[arg(short, long, global = true, env = "GRAPHSCRIBE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate schema and data from a document and commit them
    Import {
        /// Document to import
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ImportMode::Overwrite)]
        mode: ImportMode,

        /// Commit without asking for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Commit relationship statements even when they failed validation
        #[arg(long)]
        commit_unreviewed: bool,
    },

    /// Execute a batch of statements and print the resulting graph as JSON
    Query {
        /// Statements separated by `;`
        statements: String,
    },

    /// Print the current schema as DDL
    Schema,

    /// Drop every table
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,graphscribe=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_yaml_and_env(cli.config.as_deref())?;
    tracing::debug!(
        store = %config.store_url,
        provider = %config.llm.provider,
        "Configuration loaded"
    );
    let state = AppState::new(config);

    match cli.command {
        Commands::Import {
            file,
            mode,
            yes,
            commit_unreviewed,
        } => run_import(&state, &file, mode, yes, commit_unreviewed).await,
        Commands::Query { statements } => run_query(&state, &statements).await,
        Commands::Schema => {
            let schema = state.executor.get_schema().await?;
            if schema.is_empty() {
                println!("// empty");
            } else {
                println!("{}", schema.to_ddl());
            }
            Ok(())
        }
        Commands::Reset => {
            state.executor.reset().await?;
            tracing::info!("Store reset");
            Ok(())
        }
    }
}

async fn run_import(
    state: &AppState,
    file: &Path,
    mode: ImportMode,
    yes: bool,
    commit_unreviewed: bool,
) -> Result<()> {
    let document = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let importer = state.importer();
    let mut session = importer.start(mode, &document).await?;
    importer.generate(&mut session).await?;
    print_session(&session);

    if session.needs_review() && !commit_unreviewed {
        bail!("Relationship statements failed validation; review them above and re-run with --commit-unreviewed to commit anyway");
    }
    if !yes && !confirm(mode)? {
        tracing::info!("Import cancelled");
        return Ok(());
    }

    let mut view = GraphView::new();
    let report = if commit_unreviewed {
        importer.commit_unreviewed(&session, &mut view).await?
    } else {
        importer.commit(&session, &mut view).await?
    };
    println!(
        "Committed {} statements: {} nodes, {} edges",
        report.statements, report.nodes, report.edges
    );
    Ok(())
}

fn print_session(session: &ImportSession) {
    let sections = [
        ("schema", session.new_schema().to_string()),
        (
            "nodes",
            session.nodes.as_ref().map(|s| s.text.clone()).unwrap_or_default(),
        ),
        (
            "relationships",
            session
                .relationships
                .as_ref()
                .map(|s| s.text.clone())
                .unwrap_or_default(),
        ),
    ];
    for (title, text) in sections {
        println!("// ---- {} ----", title);
        if text.is_empty() {
            println!("// (none)");
        } else {
            println!("{}", text);
        }
    }
}

fn confirm(mode: ImportMode) -> Result<bool> {
    let question = match mode {
        ImportMode::Overwrite => "This will drop every existing table. Commit? [y/N] ",
        ImportMode::Append => "Commit? [y/N] ",
    };
    print!("{}", question);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn run_query(state: &AppState, statements: &str) -> Result<()> {
    if !looks_like_query(statements) {
        tracing::warn!("Input does not look like a Cypher query; executing anyway");
    }
    let mut view = GraphView::new();
    let model = view.run(&state.executor, statements).await?;
    println!("{}", serde_json::to_string_pretty(model)?);
    Ok(())
}
