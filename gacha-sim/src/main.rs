mod batch;
mod records;
mod reports;
mod util;

use anyhow::{Context, Result, ensure};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use gacha_engine::{GachaEngine, MemoryCatalog, Request};
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use batch::{BatchSummary, run_batch};
use records::{SimulationRecord, write_records};
use util::parse_seeds;

#[derive(Debug, Parser)]
#[command(name = "gacha-sim", version = "0.1.0")]
#[command(about = "Batch simulator for gacha draw plans - seeded runs with aggregate reports")]
struct Args {
    /// Draw request (JSON wire format)
    #[arg(long)]
    request: PathBuf,

    /// Catalogue fixture; defaults to the tiers embedded in the request
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of runs per seed
    #[arg(long, default_value_t = 100)]
    iterations: u64,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Optional path to write every run as a JSON record
    #[arg(long)]
    records: Option<PathBuf>,

    /// Only validate the request
    #[arg(long)]
    validate_only: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let request = load_request(&args.request)?;
    let catalog = load_catalog(args.catalog.as_deref(), &request)?;
    let engine = GachaEngine::new(catalog);

    engine
        .validate(&request)
        .with_context(|| format!("{} failed validation", args.request.display()))?;
    if args.validate_only {
        let mut output_target = OutputTarget::new(args.output.clone())?;
        writeln!(output_target, "✅ {} is valid", args.request.display())?;
        output_target.flush_inner()?;
        return Ok(());
    }

    ensure!(args.iterations > 0, "--iterations must be at least 1");
    let seeds = parse_seeds(&args.seeds)?;
    if args.report == "console" {
        announce_banner();
    }

    let start_time = Instant::now();
    let batch = run_batch(
        &engine,
        &request,
        &seeds,
        args.iterations,
        args.records.is_some(),
    )?;
    log::info!(
        "{} runs finished in {:?}",
        batch.summary.runs,
        start_time.elapsed()
    );

    if let Some(path) = &args.records {
        let created_at = Utc::now();
        let records: Vec<SimulationRecord> = batch
            .outcomes
            .iter()
            .map(|outcome| SimulationRecord::from_outcome(&request, outcome, created_at))
            .collect();
        let mut output_target = OutputTarget::new(Some(path.clone()))?;
        write_records(output_target.writer(), &records)?;
        output_target.flush_inner()?;
    }

    write_report(&args, &batch.summary, start_time)
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn announce_banner() {
    println!("{}", "🎰 Gacha Plan Simulator".bright_cyan().bold());
    println!("{}", "=======================".cyan());
}

fn load_request(path: &Path) -> Result<Request> {
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Request::from_json(&json).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_catalog(path: Option<&Path>, request: &Request) -> Result<MemoryCatalog> {
    let Some(path) = path else {
        log::debug!("no catalogue given; using the request's tiers");
        return Ok(MemoryCatalog::from_tiers(&request.tiers));
    };
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let catalog = MemoryCatalog::from_json(&json)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    log::debug!(
        "catalogue {} holds {} tiers and {} items",
        path.display(),
        catalog.tier_count(),
        catalog.item_count()
    );
    Ok(catalog)
}

fn write_report(args: &Args, summary: &BatchSummary, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(output_target.writer(), summary)?,
        "markdown" => reports::generate_markdown_report(output_target.writer(), summary)?,
        _ => {
            reports::generate_console_report(output_target.writer(), summary, start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gacha_engine::{Item, Tier};

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "gacha-sim-main-{label}-{}",
            std::process::id()
        ))
    }

    fn base_args() -> Args {
        Args {
            request: PathBuf::from("request.json"),
            catalog: None,
            seeds: "1337".to_string(),
            iterations: 1,
            report: "json".to_string(),
            output: None,
            records: None,
            validate_only: false,
            verbose: false,
        }
    }

    fn sample_summary() -> BatchSummary {
        batch::SummaryBuilder::new(&[1337]).finish()
    }

    #[test]
    fn load_catalog_defaults_to_request_tiers() {
        let request = Request {
            tiers: vec![Tier::new(4, 1, vec![Item::new(40, 1), Item::new(41, 1)])],
            ..Request::default()
        };
        let catalog = load_catalog(None, &request).unwrap();
        assert_eq!(catalog.tier_count(), 1);
        assert_eq!(catalog.item_count(), 2);
    }

    #[test]
    fn load_request_reports_the_path() {
        let missing = temp_path("missing.json");
        let err = load_request(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));

        let garbled = temp_path("garbled.json");
        fs::write(&garbled, "{ not json").unwrap();
        let err = load_request(&garbled).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse"));
    }

    #[test]
    fn write_report_emits_json_output() {
        let temp = temp_path("report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_report(&args, &sample_summary(), Instant::now()).unwrap();
        let content = fs::read_to_string(temp).unwrap();
        assert!(content.contains("\"runs\": 0"));
    }

    #[test]
    fn write_report_emits_markdown_output() {
        let temp = temp_path("report.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_report(&args, &sample_summary(), Instant::now()).unwrap();
        let content = fs::read_to_string(temp).unwrap();
        assert!(content.contains("# Gacha Simulation Results"));
    }

    #[test]
    fn write_report_falls_back_to_console() {
        let temp = temp_path("report.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_report(&args, &sample_summary(), Instant::now()).unwrap();
        let content = fs::read_to_string(temp).unwrap();
        assert!(content.contains("Gacha Simulation Summary"));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
