use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mandex::index::document::ParsedDocument;
use mandex::index::fields::FieldTable;
use mandex::index::reader::DocumentStore;
use mandex::index::types::IndexState;
use mandex::index::{BuildReport, build_index, prune_index, stats};
use mandex::output::print_matches;
use mandex::query::{Restriction, SearchStatus, compile, compile_simple, search};
use mandex::utils::{AppConfig, get_config_path, load_state, save_state};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "mandex")]
#[command(about = "Keyword index and search for manual pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug details and every build warning
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or update the stores of a collection root
    Index {
        /// Collection root
        root: PathBuf,

        /// JSON array of parsed documents
        #[arg(short, long)]
        manifest: PathBuf,

        /// Add to the existing stores instead of replacing them
        #[arg(short, long)]
        update: bool,

        /// Skip documents whose metadata disagrees with their location
        #[arg(long)]
        strict: bool,
    },
    /// Remove documents from a collection root
    Prune {
        /// Collection root
        root: PathBuf,

        /// Document paths relative to the root
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Search with a keyword expression
    Search {
        /// Collection roots, searched in order
        #[arg(short = 'M', long = "root")]
        roots: Vec<PathBuf>,

        /// Only documents of this category
        #[arg(short = 's', long)]
        category: Option<String>,

        /// Only documents for this architecture
        #[arg(short = 'S', long)]
        arch: Option<String>,

        /// Expression, e.g. `Nm~^ls -a Nd=directory`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        expr: Vec<String>,
    },
    /// Look up documents by exact name
    Whatis {
        /// Collection roots, searched in order
        #[arg(short = 'M', long = "root")]
        roots: Vec<PathBuf>,

        /// Names to look up
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Show store statistics
    Stats {
        /// Collection root
        root: PathBuf,
    },
    /// Show the configuration file and its settings
    Config {
        /// Write the current settings back, creating the file if missing
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AppConfig::load()?;
    let color = !cli.no_color;

    match cli.command {
        Commands::Index {
            root,
            manifest,
            update,
            strict,
        } => {
            let mut options = config.build_options(cli.verbose);
            options.strict |= strict;

            let documents = read_manifest(&manifest)?;
            let prior = if update { prior_state(&root)? } else { None };
            let report = build_index(&root, &documents, prior, options)
                .with_context(|| format!("Failed to index {}", root.display()))?;
            save_state(&root, &report.state)?;
            print_report(&root, &report, cli.verbose);
        }
        Commands::Prune { root, files } => {
            let report = prune_index(&root, &files, config.build_options(cli.verbose))
                .with_context(|| format!("Failed to prune {}", root.display()))?;
            save_state(&root, &report.state)?;
            print_report(&root, &report, cli.verbose);
        }
        Commands::Search {
            roots,
            category,
            arch,
            expr,
        } => {
            let expression = compile(&expr, &FieldTable::standard()).context("Invalid search expression")?;
            let restriction = Restriction { category, arch };
            run_search(&pick_roots(roots, &config), &restriction, &expression, color)?;
        }
        Commands::Whatis { roots, names } => {
            let expression = compile_simple(&names).context("Invalid name")?;
            run_search(&pick_roots(roots, &config), &Restriction::default(), &expression, color)?;
        }
        Commands::Stats { root } => {
            stats::show_stats(&root)?;
        }
        Commands::Config { write } => {
            if write {
                config.save()?;
            }
            println!("{}", get_config_path()?.display());
            println!("{}", serde_json::to_string_pretty(&config).context("Failed to serialize config")?);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "mandex=debug" } else { "mandex=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_manifest(path: &Path) -> Result<Vec<ParsedDocument>> {
    let file = File::open(path).with_context(|| format!("Failed to open manifest {}", path.display()))?;
    let documents: Vec<ParsedDocument> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
    debug!(documents = documents.len(), "read manifest");
    Ok(documents)
}

/// Saved state for the root, else the state implied by its document store
fn prior_state(root: &Path) -> Result<Option<IndexState>> {
    if let Some(state) = load_state(root)? {
        return Ok(Some(state));
    }
    let store = DocumentStore::open(root).context("Failed to open document store")?;
    Ok(store.map(|s| s.state()))
}

fn pick_roots(roots: Vec<PathBuf>, config: &AppConfig) -> Vec<PathBuf> {
    if roots.is_empty() { config.roots.clone() } else { roots }
}

fn run_search(
    roots: &[PathBuf],
    restriction: &Restriction,
    expression: &mandex::query::Expression,
    color: bool,
) -> Result<()> {
    let results = search(roots, restriction, expression);
    let shown = print_matches(results.matched(), color)?;

    if let SearchStatus::Corrupt { root, reason } = &results.status {
        bail!("{}: database corrupt: {}", root.display(), reason);
    }
    if shown == 0 {
        eprintln!("nothing appropriate");
    }
    Ok(())
}

fn print_report(root: &Path, report: &BuildReport, verbose: bool) {
    // Verbose runs already logged each warning
    if !verbose {
        for warning in &report.warnings {
            eprintln!("warning: {}", warning);
        }
    }
    println!(
        "{}: {} added, {} pruned, {} skipped; {} documents, {} keywords",
        root.display(),
        report.added,
        report.pruned,
        report.skipped,
        report.documents,
        report.keywords
    );
}
