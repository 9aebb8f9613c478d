use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::warn;
use std::path::PathBuf;
use topic_search::config::AppConfig;
use topic_search::corpus::{Corpus, CorpusStats, show_stats};
use topic_search::output;
use topic_search::query::{self, Identity, QueryBuilder, QueryExecutor};

#[derive(Parser)]
#[command(name = "topic-search")]
#[command(about = "Search mailing-list topics with a selector query language")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Search query (when no subcommand is given)
    #[arg(trailing_var_arg = true)]
    query: Vec<String>,

    /// Corpus JSON file (defaults to `default_corpus` in the config)
    #[arg(short, long, global = true)]
    corpus: Option<PathBuf>,

    /// Search as this user id (resolves `me`)
    #[arg(short, long, global = true)]
    user: Option<u32>,

    /// Reference instant for relative dates (RFC 3339), defaults to now
    #[arg(long, global = true)]
    now: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Maximum number of hits (0 = unlimited)
    #[arg(short, long, global = true)]
    limit: Option<usize>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the corpus
    Search {
        /// Query words
        #[arg(trailing_var_arg = true)]
        query: Vec<String>,
    },
    /// Parse and validate a query, printing the tree and warnings
    Check {
        #[arg(trailing_var_arg = true)]
        query: Vec<String>,
    },
    /// Print the predicate a query compiles to
    Explain {
        #[arg(trailing_var_arg = true)]
        query: Vec<String>,
    },
    /// Show corpus statistics
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!("ignoring config: {}", e);
        AppConfig::default()
    });
    let now = reference_instant(cli.now.as_deref())?;

    match &cli.command {
        Some(Commands::Search { query }) => run_search(&cli, &config, now, &query.join(" ")),
        Some(Commands::Check { query }) => run_check(&cli, now, &query.join(" ")),
        Some(Commands::Explain { query }) => run_explain(&cli, &config, now, &query.join(" ")),
        Some(Commands::Stats) => {
            let corpus = load_corpus(&cli, &config)?;
            if cli.json {
                output::print_json(&CorpusStats::collect(&corpus))?;
            } else {
                show_stats(&corpus);
            }
            Ok(())
        }
        None => run_search(&cli, &config, now, &cli.query.join(" ")),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn reference_instant(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(text) => Ok(DateTime::parse_from_rfc3339(text)
            .with_context(|| format!("Invalid --now value: {}", text))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

fn load_corpus(cli: &Cli, config: &AppConfig) -> Result<Corpus> {
    let path = cli
        .corpus
        .clone()
        .or_else(|| config.default_corpus.clone())
        .context("No corpus given: pass --corpus or set default_corpus in the config")?;
    Corpus::load(&path).with_context(|| format!("Failed to load corpus {}", path.display()))
}

/// Requester for `--user`, linked to its person when the corpus knows it.
fn requester(cli: &Cli, corpus: Option<&Corpus>) -> Option<Identity> {
    let user_id = cli.user?;
    let person_id = corpus.and_then(|c| match c.user(user_id) {
        Some(user) => user.person_id,
        None => {
            warn!("user {} not found in corpus", user_id);
            None
        }
    });
    Some(Identity::new(user_id, person_id))
}

fn run_search(cli: &Cli, config: &AppConfig, now: DateTime<Utc>, input: &str) -> Result<()> {
    let corpus = load_corpus(cli, config)?;
    let builder = QueryBuilder::new(requester(cli, Some(&corpus))).with_text_fields(config.text_fields);
    let built = query::compile_with(input, now, builder)?;

    let limit = cli.limit.unwrap_or(config.result_limit);
    let hits = QueryExecutor::new(&corpus).search(&built, limit);

    if cli.json {
        output::print_json(&serde_json::json!({
            "warnings": built.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
            "hits": hits,
        }))?;
    } else {
        output::print_warnings(&built.warnings, !cli.no_color)?;
        output::print_hits(&hits, !cli.no_color)?;
    }
    Ok(())
}

fn run_check(cli: &Cli, now: DateTime<Utc>, input: &str) -> Result<()> {
    let ast = query::parse(input)?;
    let validated = query::validate(ast.as_ref(), now);

    if cli.json {
        output::print_json(&validated)?;
    } else {
        let mut stdout = output::stdout(!cli.no_color);
        output::write_ast(&mut stdout, validated.ast.as_ref())?;
        output::print_warnings(&validated.warnings, !cli.no_color)?;
    }
    Ok(())
}

fn run_explain(cli: &Cli, config: &AppConfig, now: DateTime<Utc>, input: &str) -> Result<()> {
    // The corpus is only needed to link --user to a person
    let corpus = if cli.user.is_some() && (cli.corpus.is_some() || config.default_corpus.is_some()) {
        Some(load_corpus(cli, config)?)
    } else {
        None
    };
    let builder = QueryBuilder::new(requester(cli, corpus.as_ref())).with_text_fields(config.text_fields);
    let built = query::compile_with(input, now, builder)?;

    if cli.json {
        output::print_json(&built)?;
    } else {
        let mut stdout = output::stdout(!cli.no_color);
        output::write_predicate(&mut stdout, &built.predicate)?;
        output::print_warnings(&built.warnings, !cli.no_color)?;
    }
    Ok(())
}
