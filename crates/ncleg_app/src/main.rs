mod cli;
mod config;

use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use ncleg_engine::{
    ensure_output_dir, Harvester, JsonFileSink, JsonLinesSink, RecordSink, ReqwestFetcher,
    RunSummary,
};
use ncleg_logging::{ncleg_info, ncleg_warn};

use crate::cli::Cli;
use crate::config::{FileConfig, RunConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let run = RunConfig::resolve(&cli, file)?;

    ncleg_logging::initialize(run.log, run.level, &run.log_file);

    if let Some(dir) = &run.output {
        ensure_output_dir(dir).with_context(|| format!("output directory {dir:?}"))?;
    }

    let fetcher = Arc::new(ReqwestFetcher::new(run.fetch.clone()));
    let harvester = Harvester::new(fetcher, run.harvest.clone());

    let (summary, written) = match &run.output {
        Some(dir) => harvest(&harvester, &run, JsonFileSink::new(dir.clone())).await?,
        None => harvest(&harvester, &run, JsonLinesSink::new(BufWriter::new(io::stdout()))).await?,
    };

    report(&summary);
    for path in written {
        ncleg_info!("Wrote {:?}", path);
    }
    Ok(())
}

async fn harvest<S: RecordSink>(
    harvester: &Harvester,
    run: &RunConfig,
    sink: S,
) -> anyhow::Result<(RunSummary, Vec<PathBuf>)> {
    let sink = Mutex::new(sink);
    let summary = harvester.run(&run.plan, &sink).await;
    let mut sink = sink.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    let written = sink.finish(&summary).context("writing output")?;
    Ok((summary, written))
}

fn report(summary: &RunSummary) {
    for chamber in &summary.chambers {
        ncleg_info!(
            "Chamber {}: {} requested, {} found, {} not found, {} malformed, {} transport failures ({:?})",
            chamber.chamber,
            chamber.requested,
            chamber.found,
            chamber.not_found,
            chamber.malformed,
            chamber.transport_failures,
            chamber.finish_reason,
        );
        for failure in &chamber.failures {
            ncleg_warn!("  {} {}: {}", failure.bill, failure.outcome, failure.reason);
        }
    }
    ncleg_info!(
        "Harvest complete: {} records, {} failures",
        summary.records(),
        summary.failures()
    );
}
