use anyhow::Result;
use clap::{Parser, Subcommand};
use docsearch::{api, load_corpus, Index, SearchEngine};
use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "In-memory TF-IDF document search engine", long_about = None)]
struct Args {
    /// Directory of plain-text documents to index
    #[arg(short, long, default_value = "documents")]
    docs: String,

    /// LRU result cache capacity (0 disables caching)
    #[arg(short, long, default_value_t = 256)]
    cache_capacity: usize,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API server
    Serve {
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
    /// Interactive search prompt
    Repl,
    /// Benchmark repeated queries to show cache effectiveness
    Bench {
        #[arg(short, long, default_value_t = 3)]
        repeat: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let start = Instant::now();
    let documents = load_corpus(&args.docs)?;
    let index = Index::build(documents);
    tracing::info!(
        "Indexed {} documents in {:?}",
        index.doc_count(),
        start.elapsed()
    );

    let engine = SearchEngine::new(index, args.cache_capacity)?;

    match args.command {
        Some(Command::Serve { addr }) => serve(engine, addr).await,
        Some(Command::Bench { repeat }) => bench(&engine, repeat),
        Some(Command::Repl) | None => repl(&engine),
    }
}

async fn serve(engine: SearchEngine, addr: SocketAddr) -> Result<()> {
    let app = api::create_router(Arc::new(engine))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn repl(engine: &SearchEngine) -> Result<()> {
    println!("Interactive search. Type 'exit' to quit.");
    let stdin = io::stdin();

    loop {
        print!("query> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query.to_lowercase().as_str(), "exit" | "quit" | ":q") {
            break;
        }

        let outcome = engine.search(query);
        println!(
            "cached={} elapsed_ms={:.3}",
            outcome.was_cached,
            outcome.elapsed.as_secs_f64() * 1000.0
        );
        for scored in outcome.results.iter().take(10) {
            println!("  doc_id={} score={:.4}", scored.doc_id, scored.score);
        }
    }

    Ok(())
}

fn bench(engine: &SearchEngine, repeat: usize) -> Result<()> {
    let queries = [
        "search engines",
        "index documents",
        "working completely",
        "search engines",
        "how it works",
        "search indexing",
        "search engines",
    ];

    // warm the cache
    for _ in 0..3 {
        for query in &queries {
            engine.search(query);
        }
    }

    let uncached = SearchEngine::new(engine.snapshot().as_ref().clone(), 0)?;

    let run = |service: &SearchEngine| {
        let start = Instant::now();
        for _ in 0..repeat {
            for query in &queries {
                service.search(query);
            }
        }
        start.elapsed()
    };

    let no_cache_time = run(&uncached);
    let cache_time = run(engine);

    println!("Benchmark results:");
    println!(
        "  no_cache_time_ms={:.2}",
        no_cache_time.as_secs_f64() * 1000.0
    );
    println!("  cache_time_ms={:.2}", cache_time.as_secs_f64() * 1000.0);
    println!("Service stats with cache:");
    println!("{}", serde_json::to_string_pretty(&engine.stats())?);

    Ok(())
}
