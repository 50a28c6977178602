//! Command-line interface for sink-latency
//!
//! # Usage Examples
//!
//! ## Provisioning
//! ```bash
//! # Create topics from topics.yml, tables from sql/, and one JDBC sink per topic
//! sink-latency create \
//!   --broker localhost:9092 \
//!   --psql-host localhost --psql-host-port 5431 \
//!   --kafka-connect http://localhost:8083
//!
//! # Remove connectors, topics, and all public tables
//! sink-latency delete
//! ```
//!
//! ## Latency Test
//! ```bash
//! # Publish {"id":"random_id"} / {"value":"random_value"} to test_topic and
//! # wait up to 3 seconds for it to appear in test_topic_table
//! sink-latency run --topic test_topic --deadline 3s
//!
//! # Summarize every latency recorded so far
//! sink-latency stats --latency-log data.txt
//! ```

use clap::{Parser, Subcommand};
use sink_latency::provision::{setup_stack, teardown_stack};
use sink_latency::{load_stats, run_latency_test, PipelineConfig, RunOpts, StackFiles, StatsOpts};

#[derive(Parser)]
#[command(name = "sink-latency")]
#[command(about = "Provision a Kafka -> JDBC sink -> PostgreSQL pipeline and measure its latency")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create topics, sink tables, and sink connectors
    Create {
        #[command(flatten)]
        config: PipelineConfig,

        #[command(flatten)]
        files: StackFiles,
    },

    /// Delete sink connectors, topics, and tables
    Delete {
        #[command(flatten)]
        config: PipelineConfig,

        #[command(flatten)]
        files: StackFiles,
    },

    /// Publish one transactional record and time its arrival in PostgreSQL
    Run {
        #[command(flatten)]
        config: PipelineConfig,

        #[command(flatten)]
        opts: RunOpts,
    },

    /// Summarize the latency log
    Stats {
        #[command(flatten)]
        opts: StatsOpts,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Create { config, files } => {
            setup_stack(&config, &files).await?;
            println!("Stack created");
        }
        Commands::Delete { config, files } => {
            teardown_stack(&config, &files).await?;
            println!("Stack deleted");
        }
        Commands::Run { config, opts } => {
            let outcome = run_latency_test(&config, &opts).await?;
            if outcome.report.found {
                println!("Record found after {:?}", outcome.report.elapsed);
            } else {
                println!(
                    "Record not found within {:?} ({} attempts, {} failed queries)",
                    opts.deadline, outcome.report.attempts, outcome.report.query_failures
                );
                if let Some(e) = &outcome.report.last_error {
                    println!("Last query error: {e}");
                }
            }
            println!("Query took {:?}", outcome.report.elapsed);
        }
        Commands::Stats { opts } => match load_stats(&opts)? {
            Some(stats) => println!("{stats}"),
            None => println!("No data found."),
        },
    }

    Ok(())
}
