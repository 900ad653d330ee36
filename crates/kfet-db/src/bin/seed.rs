//! Seeds a development database with the cohort grid and sample roster.
//!
//! ```text
//! cargo run --bin seed -- --db ./kfet_dev.db
//! cargo run --bin seed -- --db ./kfet_dev.db --reset
//! ```

use std::process;

use kfet_db::{ChannelConfig, Ledger};
use tracing_subscriber::EnvFilter;

const DEFAULT_DB_PATH: &str = "./kfet_dev.db";

fn print_usage() {
    println!("Usage: seed [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --db <PATH>   Database file to seed (default: {DEFAULT_DB_PATH})");
    println!("  --reset       Drop and recreate the schema before seeding");
    println!("  --help        Show this help");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut db_path = DEFAULT_DB_PATH.to_string();
    let mut reset = false;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut idx = 0;
    while idx < args.len() {
        match args[idx].as_str() {
            "--db" => {
                idx += 1;
                match args.get(idx) {
                    Some(path) => db_path = path.clone(),
                    None => {
                        eprintln!("error: --db requires a path");
                        process::exit(2);
                    }
                }
            }
            "--reset" => reset = true,
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("error: unknown argument: {other}");
                print_usage();
                process::exit(2);
            }
        }
        idx += 1;
    }

    let config = ChannelConfig::new(&db_path);
    let ledger = match Ledger::open(&config).await {
        Ok(ledger) => ledger,
        Err(err) => {
            eprintln!("error: could not open {db_path}: {err}");
            process::exit(1);
        }
    };

    if reset {
        if let Err(err) = ledger.reset().await {
            eprintln!("error: reset failed: {err}");
            process::exit(1);
        }
        println!("schema reset: all rows dropped");
    }

    match ledger.seed().await {
        Ok(report) if report.categories == 0 && report.customers == 0 => {
            println!("{db_path}: already populated, nothing seeded");
        }
        Ok(report) => {
            println!("{db_path}: seeded");
            println!("  categories  {}", report.categories);
            println!("  customers   {}", report.customers);
        }
        Err(err) => {
            eprintln!("error: seeding failed: {err}");
            process::exit(1);
        }
    }

    ledger.close().await;
}
