use std::path::PathBuf;
use std::thread;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use log::error;
use serde::Serialize;

use tabular_prep::{pipeline, DatasetConfig, PipelineReport, PrepConfig, PrepError, Source};

#[derive(Parser)]
#[command(name = "tabular-prep")]
#[command(about = "Clean, encode and stratified-split the college and job placement datasets")]
#[command(version)]
struct Cli {
    /// College completion CSV (path or http(s) URL)
    #[arg(long)]
    college: Option<String>,

    /// Job placement CSV (path or http(s) URL)
    #[arg(long)]
    job: Option<String>,

    /// TOML file overriding the built-in dataset configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the stratified splits (default 42)
    #[arg(long)]
    seed: Option<u64>,

    /// Print the reports as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Outcome<'a> {
    dataset: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a PipelineReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Outcome of a joined pipeline thread. A panic is not a pipeline error, so
/// it is reported here rather than as a `PrepError`.
fn joined_result(
    name: &str,
    joined: thread::Result<std::result::Result<PipelineReport, PrepError>>,
) -> Result<PipelineReport> {
    match joined {
        Ok(result) => Ok(result?),
        Err(_) => Err(anyhow!("{name} pipeline panicked")),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.college.is_none() && cli.job.is_none() {
        bail!("nothing to do: pass --college and/or --job");
    }

    let mut config = match &cli.config {
        Some(path) => PrepConfig::from_toml_file(path)?,
        None => PrepConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
        config = config.resolved()?;
    }

    let jobs: Vec<(&DatasetConfig, Source)> = [
        (&config.college, cli.college.as_deref()),
        (&config.job, cli.job.as_deref()),
    ]
    .into_iter()
    .filter_map(|(cfg, arg)| arg.map(|a| (cfg, Source::parse(a))))
    .collect();

    // The datasets share nothing, so each pipeline gets its own thread.
    let results: Vec<(&str, Result<PipelineReport>)> = thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .iter()
            .map(|(cfg, source)| {
                let handle = scope.spawn(move || pipeline::run(cfg, source));
                (cfg.name.as_str(), handle)
            })
            .collect();
        handles
            .into_iter()
            .map(|(name, handle)| (name, joined_result(name, handle.join())))
            .collect()
    });

    let mut failures = 0;
    let outcomes: Vec<Outcome> = results
        .iter()
        .map(|(name, result)| match result {
            Ok(report) => Outcome {
                dataset: name,
                report: Some(report),
                error: None,
            },
            Err(e) => {
                failures += 1;
                error!("[{name}] pipeline failed: {e:#}");
                Outcome {
                    dataset: name,
                    report: None,
                    error: Some(format!("{e:#}")),
                }
            }
        })
        .collect();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        for outcome in &outcomes {
            match (outcome.report, &outcome.error) {
                (Some(report), _) => println!("{report}"),
                (None, Some(e)) => println!("== {} FAILED: {e}\n", outcome.dataset),
                (None, None) => {}
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} pipelines failed", outcomes.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panicked_thread_is_not_reported_as_a_prep_error() {
        let err = joined_result("job", Err(Box::new("boom"))).unwrap_err();
        assert_eq!(err.to_string(), "job pipeline panicked");
        assert!(err.downcast_ref::<PrepError>().is_none());
    }

    #[test]
    fn pipeline_errors_pass_through_unchanged() {
        let joined = Ok(Err(PrepError::split("too few rows")));
        let err = joined_result("college", joined).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PrepError>(),
            Some(PrepError::Split { .. })
        ));
    }
}
