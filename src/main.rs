//! Streaming graph ingestion CLI: reads whitespace-separated `tail head`
//! pairs of external node ids from stdin, pushes each into a bounded-memory
//! `GraphStore` driving a `CommunityEngine`, and writes the final partition
//! to `communities.dat` in the current directory (spec.md §6).

use std::fs::File;
use std::io::{self, Read};

use tracing::{error, info, warn};

use streamgraph::{CommunityEngine, GraphConfig, GraphError, GraphStore, Result, VERSION};

const OUTPUT_FILE: &str = "communities.dat";

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    print_banner();

    match run() {
        Ok(edges_read) => {
            info!(edges_read, "ingestion complete");
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<u64> {
    let config = GraphConfig::default();
    info!(
        num_pages = config.num_pages,
        page_capacity = config.page_capacity(),
        batch_size = config.batch_size,
        mode = ?config.mode,
        "starting ingestion"
    );

    let sink = File::create(OUTPUT_FILE)
        .map_err(|e| GraphError::Initialization(format!("creating {OUTPUT_FILE}: {e}")))?;

    let mut store = GraphStore::new(config, CommunityEngine::new(sink))?;

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let mut tokens = input.split_ascii_whitespace();
    loop {
        let Some(tail) = tokens.next() else {
            break;
        };
        let Some(head) = tokens.next() else {
            warn!("trailing token with no matching pair, discarding");
            break;
        };
        let (Ok(tail), Ok(head)) = (tail.parse::<u64>(), head.parse::<u64>()) else {
            warn!(tail, head, "malformed edge, skipping");
            continue;
        };
        store.push(tail, head);
    }

    let edges_read = store.num_pushed();
    store.close();
    Ok(edges_read)
}

fn print_banner() {
    println!("╔══════════════════════════════════════════════╗");
    println!("║  streamgraph {VERSION:<32}║");
    println!("║  bounded-memory streaming community engine    ║");
    println!("╚══════════════════════════════════════════════╝");
}
