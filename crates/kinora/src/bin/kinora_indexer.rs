//! Kinora indexer - replays quest contract events into the entity graph
//!
//! Usage:
//!   kinora-indexer --config kinora.toml --events events.ndjson \
//!       --chain-state chain.json --dump store.json
//!
//! Environment variables:
//!   KINORA_CONFIG - Config file path (default: kinora.toml)
//!   RUST_LOG - Log filter, overrides `[logging] level`

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Parser;
use kinora::{logging, run, write_dump, AppError, AppResult, Config, EventReader};
use kinora_indexer::ChainSnapshot;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "kinora-indexer")]
#[command(about = "Materializes Kinora quest events into an entity graph")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "KINORA_CONFIG", default_value = "kinora.toml")]
    config: PathBuf,

    /// Recorded events, one JSON envelope per line
    #[arg(long)]
    events: PathBuf,

    /// Contract state served to enrichment reads
    #[arg(long)]
    chain_state: Option<PathBuf>,

    /// Write the final entity store as JSON
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn open(path: &Path) -> AppResult<File> {
    File::open(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_chain_state(path: Option<&Path>) -> AppResult<ChainSnapshot> {
    let Some(path) = path else {
        return Ok(ChainSnapshot::default());
    };
    serde_json::from_reader(BufReader::new(open(path)?)).map_err(|source| AppError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load(&args.config)?;
    logging::init(&config.logging).map_err(AppError::from)?;

    info!(
        contract = %config.indexer.contract_address,
        start_block = config.indexer.start_block,
        "starting kinora indexer"
    );

    let chain = load_chain_state(args.chain_state.as_deref())?;
    let events = EventReader::new(BufReader::new(open(&args.events)?));
    let summary = run(&config, chain, events)?;

    info!(
        processed = summary.stats.processed,
        skipped = summary.stats.skipped,
        failed = summary.stats.failed,
        retried = summary.stats.retried,
        hydrated = summary.hydrated,
        entities = summary.store.len(),
        "indexing finished"
    );

    if let Some(path) = &args.dump {
        write_dump(path, &summary.store)?;
        info!(path = %path.display(), "store dumped");
    }

    Ok(())
}
