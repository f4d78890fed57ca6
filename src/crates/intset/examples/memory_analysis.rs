//! Load a contiguous or sparse workload into an `IntSet` and print the shape
//! and footprint of the resulting trie.
//!
//! Usage:
//!     cargo run --release -p intset --example memory_analysis -- -n 1000000 --sparse

use clap::Parser;
use intset::IntSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

#[derive(Parser)]
#[command(about = "Measure IntSet memory footprint for contiguous and sparse data")]
struct Args {
    /// Number of values to load.
    #[arg(short, default_value_t = 100_000)]
    n: u32,

    /// Draw values at random from 0..10n instead of loading 0..n.
    #[arg(long)]
    sparse: bool,

    /// Seed for the sparse workload.
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Skip compaction while loading, then compact once at the end.
    #[arg(long)]
    fastest: bool,
}

fn fmt_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn workload(args: &Args) -> Vec<i32> {
    let n = args.n.min(i32::MAX as u32 / 10) as i32;
    if !args.sparse {
        return (0..n).collect();
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    (0..n).map(|_| rng.random_range(0..n * 10)).collect()
}

fn main() -> intset::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let values = workload(&args);
    eprintln!(
        "loading {} values ({}, fastest={})",
        values.len(),
        if args.sparse { "sparse" } else { "contiguous" },
        args.fastest
    );

    let mut set = IntSet::with_fastest(args.fastest);
    let t0 = Instant::now();
    let step = (values.len() / 10).max(1);
    for (i, &v) in values.iter().enumerate() {
        set.add(v)?;
        if (i + 1) % step == 0 {
            eprintln!("  loaded {}/{}", i + 1, values.len());
        }
    }
    let load = t0.elapsed();

    if args.fastest {
        let before = set.heap_bytes();
        let t1 = Instant::now();
        set.compact()?;
        eprintln!(
            "compacted in {:.2?}: {} -> {}",
            t1.elapsed(),
            fmt_bytes(before as u64),
            fmt_bytes(set.heap_bytes() as u64)
        );
    }

    let t2 = Instant::now();
    let iterated = set.iter().count();
    let iterate = t2.elapsed();

    let stats = set.stats();
    let raw = values.len() * std::mem::size_of::<i32>();

    println!("members:         {}", set.len());
    println!("load time:       {load:.2?}");
    println!("iterate time:    {iterate:.2?} ({iterated} values)");
    println!("heap footprint:  {}", fmt_bytes(stats.heap_bytes as u64));
    println!("as Vec<i32>:     {}", fmt_bytes(raw as u64));
    println!(
        "max depth:       {}",
        stats.max_depth.map_or("-".to_string(), |d| d.to_string())
    );
    println!("branch cards:    {:?}", stats.branch_cards);
    println!("leaf cards:      {}", stats.leaf_cards);
    println!("dense cards:     {:?}", stats.full_cards);
    if !set.is_empty() {
        println!(
            "bytes per value: {:.2}",
            stats.heap_bytes as f64 / set.len() as f64
        );
    }

    Ok(())
}
