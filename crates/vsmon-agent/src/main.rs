mod config;

use anyhow::{bail, Context, Result};
use config::{CliAction, RunOptions};
use std::sync::Arc;
use tokio::signal;
use tokio::time::{interval, Duration};
use tracing_subscriber::EnvFilter;
use vsmon_check::check::VmwareCheck;
use vsmon_check::config::CheckConfig;
use vsmon_check::replay::ReplayConnector;
use vsmon_check::sink::BufferedSink;

/// Run every instance once and print what was collected. Returns the number
/// of instances whose poll cycle failed.
#[allow(clippy::print_stdout)]
fn run_pass(check: &VmwareCheck, sink: &mut BufferedSink) -> usize {
    let mut failed = 0;
    for (key, result) in check.check_all(sink) {
        match result {
            Ok(report) => {
                for failure in &report.failures {
                    tracing::warn!(
                        host = %key,
                        hostname = %failure.hostname,
                        metric = %failure.stat_key,
                        reason = %failure.reason,
                        "Counter skipped"
                    );
                }
            }
            Err(e) => {
                tracing::error!(host = %key, error = %e, "Check failed");
                failed += 1;
            }
        }
    }

    if sink.dropped() > 0 {
        tracing::warn!(dropped = sink.dropped(), "Metric buffer overflowed");
    }
    for point in sink.drain_all() {
        println!("{point}");
    }
    failed
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vsmon=info".parse()?))
        .init();

    let opts = match config::parse_args(std::env::args().skip(1)) {
        Ok(CliAction::Run(opts)) => opts,
        Ok(CliAction::Help) => {
            println!("{}", config::usage());
            return Ok(());
        }
        Err(e) => {
            eprintln!("{}", config::usage());
            return Err(e);
        }
    };

    run(opts).await
}

async fn run(opts: RunOptions) -> Result<()> {
    let check_config = CheckConfig::load(&opts.config_path)
        .with_context(|| format!("failed to load check config: {}", opts.config_path))?;
    let connector = ReplayConnector::load(&opts.replay_path)
        .with_context(|| format!("failed to load replay fixture: {}", opts.replay_path))?;

    let interval_secs = opts
        .interval_secs
        .or(check_config.init_config.collection_interval_secs);
    let mut sink = BufferedSink::new(check_config.init_config.buffer_max_size);
    let check = VmwareCheck::new(
        check_config.init_config,
        check_config.instances,
        Arc::new(connector),
    );

    tracing::info!(
        instances = check.instances().len(),
        interval_secs = ?interval_secs,
        "vsmon-agent starting"
    );

    let Some(secs) = interval_secs else {
        let failed = run_pass(&check, &mut sink);
        if failed > 0 {
            bail!("{failed} of {} instances failed", check.instances().len());
        }
        return Ok(());
    };

    let mut tick = interval(Duration::from_secs(secs));
    loop {
        tokio::select! {
            _ = tick.tick() => {
                run_pass(&check, &mut sink);
            }
            _ = signal::ctrl_c() => {
                tracing::info!("Shutting down gracefully");
                break;
            }
        }
    }

    Ok(())
}
