use cardql::cli::{self, CheckOptions, CliError, Stage};
use clap::{Parser as ClapParser, Subcommand};
use std::io::{self, Read};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(ClapParser)]
#[command(name = "cardql")]
#[command(about = "CardQL - A flashcard search language that compiles to SQL")]
#[command(version)]
struct Cli {
    /// Log level written to stderr
    #[arg(short, long, default_value = "warn")]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the token stream of a query
    Tokens {
        /// The query (reads from stdin if not provided)
        query: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Show the syntax tree of a query
    Parse {
        /// The query (reads from stdin if not provided)
        query: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Compile a query to a parameterized SQL filter
    Compile {
        /// The query (reads from stdin if not provided)
        query: Option<String>,

        /// Number of parameters already bound before the filter
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Grammar reference
    Grammar {
        /// Topic name (omit to list topics)
        topic: Option<String>,
    },

    /// Run a search against PostgreSQL
    #[cfg(feature = "postgres")]
    Search {
        /// The query (reads from stdin if not provided)
        query: Option<String>,

        #[arg(long, env = "DATABASE_URL")]
        database_url: String,

        /// User whose cards are searched
        #[arg(short, long)]
        user: i64,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long)]
        per_page: Option<u32>,

        #[arg(long, default_value = "due")]
        sort: cardql::service::SortField,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {}", e);
    }

    let result = match cli.command {
        Commands::Tokens { query, pretty } => run_check(query, Stage::Tokens, 0, pretty),
        Commands::Parse { query, pretty } => run_check(query, Stage::Ast, 0, pretty),
        Commands::Compile {
            query,
            offset,
            pretty,
        } => run_check(query, Stage::Sql, offset, pretty),
        Commands::Grammar { topic: None } => {
            print!("{}", cli::get_grammar_overview());
            Ok(())
        }
        Commands::Grammar { topic: Some(topic) } => match cli::get_grammar_topic(&topic) {
            Ok(content) => {
                print!("{}", content);
                Ok(())
            }
            Err(e) => Err(e),
        },
        #[cfg(feature = "postgres")]
        Commands::Search {
            query,
            database_url,
            user,
            page,
            per_page,
            sort,
            desc,
            pretty,
        } => {
            let options = cardql::SearchOptions {
                page,
                per_page,
                sort,
                direction: if desc {
                    cardql::service::SortDirection::Desc
                } else {
                    cardql::service::SortDirection::Asc
                },
            };
            run_search(query, &database_url, user, &options, pretty)
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// Uses the argument if given, otherwise stdin when it is not a terminal.
fn read_query(query: Option<String>) -> Result<String, CliError> {
    match query {
        Some(q) => Ok(q),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer.trim_end().to_string())
        }
        None => Err(CliError::NoQuery),
    }
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

fn run_check(
    query: Option<String>,
    stage: Stage,
    param_offset: usize,
    pretty: bool,
) -> Result<(), CliError> {
    let options = CheckOptions {
        query: read_query(query)?,
        stage,
        param_offset,
    };

    let result = cli::execute_check(&options)?;
    print_json(&result.to_json()?, pretty)
}

#[cfg(feature = "postgres")]
fn run_search(
    query: Option<String>,
    database_url: &str,
    user: i64,
    options: &cardql::SearchOptions,
    pretty: bool,
) -> Result<(), CliError> {
    use cardql::service::postgres::PgCardStore;

    let query = read_query(query)?;
    let runtime = tokio::runtime::Runtime::new()?;
    let page = runtime.block_on(async {
        let store = PgCardStore::connect(database_url, 5)
            .await
            .map_err(cardql::SearchError::from)?;
        let service = cardql::SearchService::new(store);
        service.search(user, &query, options).await
    })?;

    print_json(&serde_json::to_value(&page)?, pretty)
}
