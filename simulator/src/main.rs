use anyhow::{Context, Result};
use clap::Parser;
use drich_simulator::{load_events, replay, Config, ReplayError, RunReport};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};
use tracing::{error, info, Level};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration (defaults apply when omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Recorded events to replay (JSON when the extension is `.json`, YAML otherwise).
    #[arg(short, long)]
    events: PathBuf,

    /// Where to write the JSON run report (stdout when omitted).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of workers (overrides the configuration).
    #[arg(short, long)]
    workers: Option<usize>,
}

fn init_tracing(level: Level, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path).context("failed to load configuration")?,
        None => Config::default(),
    };
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    Ok(config)
}

fn write_report(report: &RunReport, output: Option<&PathBuf>) -> Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    serde_json::to_writer_pretty(&mut writer, report).context("failed to write report")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    // Parse args
    let args = Args::parse();
    let config = build_config(&args)?
        .validate()
        .context("invalid configuration")?;

    // Create logger
    init_tracing(config.log_level, config.log_json);
    info!(
        detector = %config.detector,
        active = config.params.active,
        verbosity = ?config.params.verbosity,
        volumes = config.geometry.len(),
        "configuration loaded"
    );

    let events = load_events(&args.events)?;
    let report = match replay(&config, &events) {
        Ok(report) => report,
        Err(ReplayError::Fatal {
            event,
            step,
            source,
        }) => {
            error!(event, step, %source, "fatal stepping error");
            std::process::exit(1);
        }
        Err(err) => return Err(err).context("replay failed"),
    };
    write_report(&report, args.output.as_ref())?;
    info!(
        events = report.events.len(),
        hits = report.total_hits,
        "report written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_paths_and_worker_override() {
        let args = Args::parse_from([
            "drich-simulator",
            "--events",
            "events.json",
            "--workers",
            "3",
        ]);
        assert_eq!(args.events, PathBuf::from("events.json"));
        assert!(args.config.is_none());
        let config = build_config(&args).expect("defaults should apply");
        assert_eq!(config.workers, 3);
        assert_eq!(config.detector, "dRICH");
    }

    #[test]
    fn test_worker_override_beats_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"workers: 2\nlog_level: warn\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = Args::parse_from(["drich-simulator", "-c", path.as_str(), "-e", "e.yaml"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.log_level, "warn");

        let args = Args::parse_from([
            "drich-simulator",
            "-c",
            path.as_str(),
            "-e",
            "e.yaml",
            "-w",
            "5",
        ]);
        assert_eq!(build_config(&args).unwrap().workers, 5);
    }

    #[test]
    fn test_writes_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = RunReport {
            detector: "dRICH".to_string(),
            active: true,
            workers: 1,
            total_steps: 0,
            used_steps: 0,
            total_hits: 0,
            events: Vec::new(),
        };
        write_report(&report, Some(&path)).unwrap();
        let written: RunReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, report);
    }
}
