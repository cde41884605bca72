use anyhow::{Context, Result, anyhow};
use archive_search::{
    ClientSettings, HttpBackend, LogicExpression, SearchError, SearchMode, SearchQuery,
    SearchSession, SettingsManager,
    formatters::{format_filter_tree, format_query, format_schema, format_search_result},
    interactive::{self, constants::DETAILS_PREVIEW_CHARS},
    logging::{self, LogFormat},
    query::{from_logic_expression, rison, to_logic_expression},
    schema::schema_for,
    search::Settlement,
    url_codec,
};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::cell::RefCell;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Parser)]
#[command(
    name = "archive-search",
    version,
    about = "Search the archive browsing platform and work with shareable search URLs",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Archive server base URL (overrides the config file)
    #[arg(long, global = true, env = "ARCHIVE_SEARCH_SERVER")]
    server: Option<String>,

    /// API token (overrides the config file)
    #[arg(long, global = true, env = "ARCHIVE_SEARCH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Settings file (default: <config dir>/archive-search/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the search a URL describes
    Decode {
        /// Full URL or query string, e.g. '?s=jane&sm=posts'
        url: String,

        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Build the shareable query string for a search
    Encode {
        #[arg(short, long, value_enum, default_value = "accounts")]
        mode: ModeArg,

        #[arg(short, long, default_value = "")]
        term: String,

        /// Filters as a RISON logic expression, e.g. '(and:!((in:!(jane,(var:bio)))))'
        #[arg(long)]
        filters: Option<String>,

        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "20")]
        page_size: u32,
    },
    /// List the filterable fields of one or all modes
    Schema {
        #[arg(value_enum)]
        mode: Option<ModeArg>,
    },
    /// Run the search a URL describes once and print the results
    Search {
        #[arg(default_value = "")]
        url: String,

        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Interactive search prompt
    Interactive {
        #[arg(default_value = "")]
        url: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    JsonL,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Accounts,
    Posts,
    Media,
    ArchiveSessions,
}

impl From<ModeArg> for SearchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Accounts => SearchMode::Accounts,
            ModeArg::Posts => SearchMode::Posts,
            ModeArg::Media => SearchMode::Media,
            ModeArg::ArchiveSessions => SearchMode::ArchiveSessions,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_tracing(cli.verbose, cli.log_format);
    if cli.no_color {
        colored::control::set_override(false);
    }
    let use_color = !cli.no_color;

    match cli.command {
        Commands::Decode { ref url, format } => decode(url, format, use_color),
        Commands::Encode {
            mode,
            ref term,
            ref filters,
            page,
            page_size,
        } => encode(mode.into(), term, filters.as_deref(), page, page_size),
        Commands::Schema { mode } => {
            let modes = match mode {
                Some(mode) => vec![mode.into()],
                None => SearchMode::ALL.to_vec(),
            };
            for mode in modes {
                println!("{}", format_schema(schema_for(mode), use_color));
            }
            Ok(())
        }
        Commands::Search { ref url, format } => {
            let settings = load_settings(&cli)?;
            search(&settings, url, format, use_color).await
        }
        Commands::Interactive { ref url } => {
            let settings = load_settings(&cli)?;
            let backend = HttpBackend::new(&settings.server_url, settings.token.clone())?;
            interactive::run(backend, url, settings.history_limit, use_color).await
        }
    }
}

fn load_settings(cli: &Cli) -> Result<ClientSettings> {
    let manager = match &cli.config {
        Some(path) => SettingsManager::with_path(path.clone()),
        None => SettingsManager::new()?,
    };
    let settings = manager
        .load()?
        .with_overrides(cli.server.clone(), cli.token.clone());

    if cli.verbose {
        eprintln!("Settings: {}", manager.path().display());
        eprintln!("Server: {}", settings.server_url);
    }
    Ok(settings)
}

fn decode(url: &str, format: OutputFormat, use_color: bool) -> Result<()> {
    let query = url_codec::decode(url_codec::query_string(url));

    match format {
        OutputFormat::Text => {
            println!("{}", format_query(&query, use_color));
            let tree = from_logic_expression(query.advanced_filters.as_ref(), query.search_mode);
            print!("{}", format_filter_tree(&tree));
            println!("?{}", url_codec::encode(&query));
        }
        OutputFormat::Json | OutputFormat::JsonL => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if matches!(format, OutputFormat::Json) {
                serde_json::to_writer_pretty(&mut handle, &query)?;
            } else {
                serde_json::to_writer(&mut handle, &query)?;
            }
            writeln!(&mut handle)?;
        }
    }
    Ok(())
}

fn encode(
    mode: SearchMode,
    term: &str,
    filters: Option<&str>,
    page: u32,
    page_size: u32,
) -> Result<()> {
    let advanced_filters = match filters {
        Some(raw) => {
            let value = rison::decode(raw).context("Failed to parse --filters")?;
            let expr = LogicExpression::from_value(&value).context("Unsupported --filters")?;
            let normalized = to_logic_expression(&from_logic_expression(Some(&expr), mode));
            if normalized.is_none() {
                eprintln!("Warning: no filter clause applies to mode '{mode}'");
            }
            normalized
        }
        None => None,
    };

    let query = SearchQuery::new(mode)
        .with_term(term)
        .with_filters(advanced_filters)
        .with_page(page)
        .with_page_size(page_size);
    println!("?{}", url_codec::encode(&query));
    Ok(())
}

async fn search(
    settings: &ClientSettings,
    url: &str,
    format: OutputFormat,
    use_color: bool,
) -> Result<()> {
    let backend = HttpBackend::new(&settings.server_url, settings.token.clone())?;
    let failure: Rc<RefCell<Option<SearchError>>> = Rc::new(RefCell::new(None));
    let sink = failure.clone();

    let mut session = SearchSession::open(
        backend,
        move |e: &SearchError| {
            sink.borrow_mut().replace(e.clone());
        },
        url,
        settings.history_limit,
    );

    let settled = session
        .next_settlement()
        .await
        .context("Search ended without a response")?;
    if settled.settlement != Settlement::Accepted {
        let error = failure.borrow_mut().take();
        return Err(match error {
            Some(e) => anyhow!(e),
            None => anyhow!("Search did not complete"),
        });
    }

    let results = session.results();
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Text => {
            eprintln!("{}", format_query(session.query(), use_color));
            if results.is_empty() {
                println!("No results found.");
            } else {
                for result in results {
                    writeln!(
                        &mut handle,
                        "{}",
                        format_search_result(result, use_color, DETAILS_PREVIEW_CHARS)
                    )?;
                }
                eprintln!(
                    "{}",
                    format!("(page {}, {} results)", session.query().page_number, results.len())
                        .dimmed()
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "query": session.query(),
                "url": format!("?{}", session.current_url()),
                "results": results,
            });
            serde_json::to_writer_pretty(&mut handle, &output)?;
            writeln!(&mut handle)?;
        }
        OutputFormat::JsonL => {
            for result in results {
                serde_json::to_writer(&mut handle, result)?;
                writeln!(&mut handle)?;
            }
        }
    }
    Ok(())
}
