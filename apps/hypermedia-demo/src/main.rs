//! Hypermedia demo
//!
//! Renders a small in-memory book catalog through the hypermedia writer, the
//! same way an HTTP handler would: the `Accept` header picks the format and the
//! query string picks fields, embedded relations and the page window.
//!
//! ```bash
//! hypermedia-demo --accept application/hal+json --query "embedded=author" book 9780156027601
//! hypermedia-demo --accept application/ld+json --query "page=2&per_page=1" books
//! ```

// CLI tools are expected to print to stdout/stderr
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod catalog;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::header::{ACCEPT, ACCEPT_LANGUAGE};
use http::{HeaderMap, HeaderValue, StatusCode};
use modkit_hypermedia::{
    HypermediaConfig, HypermediaError, Page, PageRequest, Problem, Rendered, Representor,
    RequestContext, RequestSelection, SingleModel,
};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Hypermedia demo - render the sample catalog as HAL, JSON-LD or plain JSON
#[derive(Parser, Debug)]
#[command(name = "hypermedia-demo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL the documents are served under
    #[arg(long, default_value = "http://localhost:8080/api")]
    server: String,

    /// Value of the `Accept` header
    #[arg(long)]
    accept: Option<String>,

    /// Value of the `Accept-Language` header
    #[arg(long)]
    language: Option<String>,

    /// Query string, e.g. `embedded=author&fields[Book]=title,year&page=2`
    #[arg(short, long, default_value = "")]
    query: String,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one book
    Book {
        /// ISBN of the book
        isbn: String,
    },
    /// Render a page of the book collection
    Books,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(rendered) if rendered.is_success => {
            print_rendered(&rendered.document);
            ExitCode::SUCCESS
        }
        Ok(rendered) => {
            print_rendered(&rendered.document);
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_rendered(rendered: &Rendered) {
    eprintln!("Content-Type: {}", rendered.media_type);
    println!("{}", rendered.body);
}

struct Outcome {
    document: Rendered,
    is_success: bool,
}

fn run(cli: &Cli) -> Result<Outcome> {
    let config = HypermediaConfig::load_or_default(cli.config.as_deref())
        .context("failed to load hypermedia configuration")?;
    let paging = config.paging.clone();
    let registry = catalog::registry().context("failed to register catalog resource types")?;
    let representor = Representor::with_default_mappers(config, registry)
        .context("invalid hypermedia configuration")?;

    let mut headers = HeaderMap::new();
    if let Some(accept) = &cli.accept {
        headers.insert(ACCEPT, HeaderValue::from_str(accept).context("invalid Accept")?);
    }
    if let Some(language) = &cli.language {
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(language).context("invalid Accept-Language")?,
        );
    }
    let server = Url::parse(&cli.server)
        .with_context(|| format!("invalid server URL '{}'", cli.server))?;
    let ctx = RequestContext::new(server).with_headers(headers);
    let selection = RequestSelection::from_query(&cli.query);
    tracing::info!(query = %cli.query, accept = ?ctx.accept(), "Rendering catalog");

    let result = match &cli.command {
        Commands::Book { isbn } => {
            let Some(book) = catalog::find_book(isbn) else {
                let problem = Problem::new(
                    StatusCode::NOT_FOUND,
                    "Not Found",
                    format!("no book with ISBN '{isbn}'"),
                )
                .with_instance(format!("/books/{isbn}"));
                return Ok(failure(representor.write_problem(
                    representor.negotiate_error(&ctx).as_deref(),
                    &problem,
                    &ctx,
                )));
            };
            match representor.negotiate_single(&ctx) {
                Some(media_type) => representor.write_single(
                    &media_type,
                    &SingleModel::new(book, catalog::BOOK),
                    &selection,
                    &ctx,
                ),
                None => return Ok(not_acceptable(&representor, &ctx)),
            }
        }
        Commands::Books => match representor.negotiate_page(&ctx) {
            Some(media_type) => PageRequest::from_query(&cli.query, &paging).and_then(|request| {
                let all = catalog::books();
                let total = u64::try_from(all.len()).unwrap_or(u64::MAX);
                let items: Vec<catalog::Book> = all
                    .into_iter()
                    .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
                    .take(usize::try_from(request.items_per_page).unwrap_or(usize::MAX))
                    .collect();
                let page = Page::new(
                    catalog::BOOK,
                    items,
                    request.page_number,
                    request.items_per_page,
                    total,
                );
                representor.write_page(&media_type, &page, &selection, &ctx)
            }),
            None => return Ok(not_acceptable(&representor, &ctx)),
        },
    };

    Ok(match result {
        Ok(document) => Outcome {
            document,
            is_success: true,
        },
        Err(err) => failure(render_error(&representor, &err, &ctx)),
    })
}

fn render_error(
    representor: &Representor,
    err: &HypermediaError,
    ctx: &RequestContext,
) -> Rendered {
    representor.write_error(representor.negotiate_error(ctx).as_deref(), err, ctx)
}

fn not_acceptable(representor: &Representor, ctx: &RequestContext) -> Outcome {
    let problem = Problem::new(
        StatusCode::NOT_ACCEPTABLE,
        "Not Acceptable",
        format!(
            "none of the available formats matches '{}'",
            ctx.accept().unwrap_or_default()
        ),
    );
    failure(representor.write_problem(None, &problem, ctx))
}

fn failure(document: Rendered) -> Outcome {
    Outcome {
        document,
        is_success: false,
    }
}
