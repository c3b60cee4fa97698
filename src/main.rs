//! Entry point for the gwdata file transfer plugin.
//!
//! HTCondor runs the plugin either with `-classad` to ask what it supports
//! or with `-infile`/`-outfile` to execute a batch of transfers. Logs go to
//! stderr so stdout stays clean for the capability ad; any failure exits
//! with the plugin protocol's code 255.

use std::env;
use std::io;
use std::path::Path;
use std::process;

use anyhow::Result;
use tracing::{error, info};

use gwdata_core::batch::BatchRunner;
use gwdata_core::fetch::FetchClient;
use gwdata_core::locator::LocatorClient;
use gwdata_core::pipeline::{PipelineConfig, TransferPipeline};

mod cli;

use cli::{FAILURE_EXIT_CODE, Invocation};

#[tokio::main]
async fn main() {
    let invocation = match cli::parse(env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(usage_error) => {
            let program = env::args()
                .next()
                .unwrap_or_else(|| "gwdata_plugin".to_string());
            eprintln!("Error: {usage_error}");
            let _ = cli::print_usage(&mut io::stderr(), &program);
            process::exit(FAILURE_EXIT_CODE);
        }
    };

    match invocation {
        Invocation::Capabilities => {
            // No tracing setup here; the ad must be the only stdout output.
            print!("{}", cli::capability_ad().unparse_old());
        }
        Invocation::Transfer { infile, outfile } => {
            init_tracing();
            info!(
                infile = %infile.display(),
                outfile = %outfile.display(),
                version = env!("CARGO_PKG_VERSION"),
                "gwdata plugin starting"
            );

            if let Err(run_error) = run_transfers(&infile, &outfile).await {
                error!(error = %run_error, "transfer batch failed");
                process::exit(FAILURE_EXIT_CODE);
            }
            info!("gwdata plugin finished");
        }
    }
}

async fn run_transfers(infile: &Path, outfile: &Path) -> Result<()> {
    let pipeline = TransferPipeline::new(
        LocatorClient::new(),
        FetchClient::new(),
        PipelineConfig::default(),
    );
    BatchRunner::new(pipeline).run(infile, outfile).await?;
    Ok(())
}

fn init_tracing() {
    // Priority: RUST_LOG env var > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
