//! gf-recommend command line.
//!
//! Every subcommand prints JSON (or CSV for `calibrate`) on stdout; logs go to
//! stderr.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gf_recommend::config::Settings;
use gf_recommend::dive::{GasMix, RiskTarget};
use gf_recommend::gf::{batch, find_no_deco_gf_high, GfFitter};
use gf_recommend::recommend::{recommend, RecommendationRequest};
use gf_recommend::risk::StandardAirModel;
use gf_recommend::simulator::BuhlmannSimulator;

#[derive(Parser, Debug)]
#[command(author, version, about = "Gradient factor recommendations for ZHL-16C")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full recommendation from a JSON request (file or stdin).
    Recommend {
        /// JSON request file; reads stdin when omitted.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// StandardAir total decompression time.
    Tdt {
        #[arg(long)]
        depth: f64,
        #[arg(long)]
        time: f64,
        /// Accepted probability of DCS in percent.
        #[arg(long, default_value_t = 2.0)]
        pdcs: f64,
    },
    /// Highest GF whose simulated TDT exceeds a target.
    Fit {
        #[arg(long)]
        depth: f64,
        #[arg(long)]
        time: f64,
        /// Target TDT in minutes.
        #[arg(long)]
        tdt: f64,
        #[arg(long, default_value_t = 21.0)]
        o2: f64,
        #[arg(long, default_value_t = 0.0)]
        he: f64,
    },
    /// Fit a GF for every row of a CSV file.
    Calibrate {
        /// CSV with id,depth_m,bottom_time_min,tdt_min columns.
        #[arg(long)]
        input: PathBuf,
        /// Output CSV; writes stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// GF at which a repeat dive starts needing a stop.
    Repetitive {
        #[arg(long)]
        depth: f64,
        /// First dive bottom time in minutes.
        #[arg(long)]
        first_time: f64,
        /// Second dive bottom time in minutes.
        #[arg(long)]
        second_time: f64,
        /// Surface interval in hours.
        #[arg(long)]
        surface_hours: f64,
    },
    /// Print the effective settings.
    Settings,
}

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings::from_env().context("invalid GF_* configuration")?;
    let simulator = BuhlmannSimulator::from_settings(&settings);

    match cli.command {
        Command::Recommend { input } => {
            let raw = read_input(input.as_ref())?;
            let request: RecommendationRequest =
                serde_json::from_str(&raw).context("failed to parse recommendation request")?;
            let report = recommend(&simulator, &settings, &request)?;
            print_json(&report)
        }
        Command::Tdt { depth, time, pdcs } => {
            let risk = RiskTarget::from_percent(pdcs)?;
            let tdt_min = StandardAirModel::new(settings.coefficients).tdt(depth, time, risk)?;
            print_json(&serde_json::json!({
                "depth_m": depth,
                "bottom_time_min": time,
                "pdcs": risk.probability(),
                "tdt_min": tdt_min,
            }))
        }
        Command::Fit {
            depth,
            time,
            tdt,
            o2,
            he,
        } => {
            let gas = GasMix::new(o2, he)?;
            let fit = GfFitter::new(&simulator, &settings).fit(time, depth, tdt, gas)?;
            print_json(&fit)
        }
        Command::Calibrate { input, output } => {
            let file = File::open(&input)
                .with_context(|| format!("failed to open {}", input.display()))?;
            let rows = batch::read_rows(BufReader::new(file))
                .with_context(|| format!("failed to read rows from {}", input.display()))?;
            let results = batch::fit_batch(&simulator, &settings, &rows);
            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    batch::write_results(BufWriter::new(file), &results)?;
                }
                None => batch::write_results(io::stdout().lock(), &results)?,
            }
            Ok(())
        }
        Command::Repetitive {
            depth,
            first_time,
            second_time,
            surface_hours,
        } => {
            let found = find_no_deco_gf_high(
                &simulator,
                &settings,
                depth,
                [first_time, second_time],
                surface_hours,
            )?;
            print_json(&found)
        }
        Command::Settings => print_json(&settings),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gf_recommend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read request from stdin")?;
            Ok(raw)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
