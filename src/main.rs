use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use kgctx::cache::CachedEmbedder;
use kgctx::embeddings::{EmbeddingProvider, HashingEmbedder, OpenAIEmbedder};
use kgctx::ingest::load_triples;
use kgctx::{build_context, Config, ContextStyle, TripleStore};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "kgctx")]
#[command(about = "Retrieve deterministic knowledge-graph context for a query", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Retrieve, expand and render context for a query
    Context(ContextArgs),
    /// Load a triple file and print graph statistics
    Stats {
        /// JSON triple file
        #[arg(short, long)]
        triples: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ContextArgs {
    /// Free-text query
    query: String,

    /// JSON triple file
    #[arg(short, long)]
    triples: PathBuf,

    /// natural, structured or both (default: context.style from config)
    #[arg(short, long)]
    style: Option<String>,

    #[arg(long)]
    top_k: Option<usize>,

    #[arg(long, allow_negative_numbers = true)]
    threshold: Option<f32>,

    #[arg(long)]
    hops: Option<usize>,

    #[arg(long)]
    max_neighbors: Option<usize>,
}

/// Build the configured embedding backend, wrapped in an LRU cache when
/// cache_capacity > 0.
fn build_embedder(config: &Config) -> Result<Box<dyn EmbeddingProvider>> {
    let settings = config.embedding_settings();

    let backend: Box<dyn EmbeddingProvider> = match config.embeddings.provider.as_str() {
        "openai" => {
            let api_key = std::env::var(&config.embeddings.api_key_env).map_err(|_| {
                anyhow::anyhow!(
                    "Environment variable {} not set. Set it in your .env file or as an environment variable.",
                    config.embeddings.api_key_env
                )
            })?;
            Box::new(OpenAIEmbedder::new(
                api_key,
                config.embeddings.model.clone(),
                settings,
            )?)
        }
        _ => Box::new(HashingEmbedder::new(settings)),
    };

    if config.embeddings.cache_capacity > 0 {
        Ok(Box::new(CachedEmbedder::new(
            backend,
            config.embeddings.cache_capacity,
        )))
    } else {
        Ok(backend)
    }
}

fn build_store(
    config: &Config,
    path: &Path,
) -> Result<(TripleStore<Box<dyn EmbeddingProvider>>, usize)> {
    let triples = load_triples(path)?;
    log::info!("Loaded {} triples from {}", triples.len(), path.display());

    let start = Instant::now();
    let mut store = TripleStore::new(build_embedder(config)?);
    store.extend(&triples)?;
    log::info!(
        "Graph built: {} nodes, {} edges in {:?}",
        store.node_count(),
        store.edge_count(),
        start.elapsed()
    );

    Ok((store, triples.len()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let cli = Cli::parse();
    let config = Config::load_or_default()?;

    match cli.command {
        Command::Context(args) => run_context(&config, args),
        Command::Stats { triples } => run_stats(&config, &triples),
    }
}

fn run_context(config: &Config, args: ContextArgs) -> Result<()> {
    let styles = match args.style.as_deref() {
        Some("both") => vec![ContextStyle::Natural, ContextStyle::Structured],
        Some(style) => vec![style.parse::<ContextStyle>()?],
        None => vec![config.style()?],
    };

    let mut params = config.context_params();
    if let Some(top_k) = args.top_k {
        params.top_k = top_k;
    }
    if let Some(threshold) = args.threshold {
        params.threshold = threshold;
    }
    if let Some(hops) = args.hops {
        params.hops = hops;
    }
    if let Some(max_neighbors) = args.max_neighbors {
        params.max_neighbors_per_hop = max_neighbors;
    }

    let (store, _) = build_store(config, &args.triples)?;

    let start = Instant::now();
    let context = build_context(&store, &args.query, &params)?;
    let duration = start.elapsed();

    println!("\nQuery: \"{}\"\n", context.query);

    match &context.retrieval.best {
        Some(best) => println!("Best match: {} (score: {:.3})", best.triple, best.score),
        None => println!("Best match: none (store is empty)"),
    }

    if context.retrieval.is_empty() {
        println!(
            "No triples scored at or above threshold {:.2}.",
            params.threshold
        );
    } else {
        println!("Seed triples:");
        for (rank, scored) in context.retrieval.ranked.iter().enumerate() {
            println!("  #{} {} (score: {:.3})", rank + 1, scored.triple, scored.score);
        }
    }

    for style in styles {
        match style {
            ContextStyle::Natural => println!("\nNatural Language Context:"),
            ContextStyle::Structured => println!("\nStructured Context:"),
        }
        println!("{}", context.render(style));
    }

    println!(
        "\nTriples: {} seeds -> {} expanded (hops: {}, max neighbors: {}) in {:?}",
        context.retrieval.ranked.len(),
        context.triples.len(),
        params.hops,
        params.max_neighbors_per_hop,
        duration
    );

    Ok(())
}

fn run_stats(config: &Config, path: &Path) -> Result<()> {
    let (store, loaded) = build_store(config, path)?;

    println!("\n=== kgctx Graph Statistics ===\n");
    println!("Triples in file:   {}", loaded);
    println!("Nodes:             {}", store.node_count());
    println!("Edges:             {}", store.edge_count());
    // One relation per ordered pair: repeats overwrite
    println!("Overwritten/dupes: {}", loaded - store.edge_count());
    if let Some(dim) = store.dimension() {
        println!("Embedding dims:    {}", dim);
    }

    Ok(())
}
