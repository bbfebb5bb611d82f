//! Crop Feed Simulation
//!
//! Generates synthetic hydroponic sensor snapshots for testing VERDE-OS.
//! Each emitted line is the feed's full current dataset as a JSON array,
//! the way a live database subscription delivers the whole collection on
//! every change.
//!
//! # Usage
//! ```bash
//! ./verde-sim --days 35 --interval-ms 200 | ./verde-os --stdin
//! ```

use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use rand::prelude::*;
use std::io::{self, Write};

use verde_os::stage::EXPECTED_CYCLE_DAYS;
use verde_os::types::RawReading;

// ============================================================================
// Crop Constants
// ============================================================================

/// Baseline air temperature (°C)
const BASE_TEMP: f64 = 23.0;
/// Baseline relative humidity (%)
const BASE_HUMIDITY: f64 = 60.0;
/// Baseline nutrient solution pH
const BASE_PH: f64 = 6.0;
/// Baseline dissolved solids at transplant (ppm)
const BASE_TDS: f64 = 780.0;
/// Daily dissolved-solids ramp as the nutrient schedule strengthens (ppm/day)
const TDS_RAMP_PER_DAY: f64 = 9.0;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "verde-sim")]
#[command(about = "Sensor feed simulation for VERDE-OS testing")]
#[command(version)]
struct Args {
    /// Simulated cycle length in days
    #[arg(long, default_value = "35", value_parser = clap::value_parser!(u32).range(1..=120))]
    days: u32,

    /// Sensor samples per simulated day
    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u32).range(1..=24))]
    samples_per_day: u32,

    /// Delay between emitted snapshots in milliseconds (0 = no delay)
    #[arg(long, default_value = "200")]
    interval_ms: u64,

    /// First reading timestamp (RFC 3339), default 2024-01-01T06:00:00Z
    #[arg(long, default_value = "2024-01-01T06:00:00Z")]
    start: String,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Emit only the final full snapshot instead of one per reading
    #[arg(long)]
    final_only: bool,
}

// ============================================================================
// Reading Generation
// ============================================================================

/// Generate one sensor reading at the given point in the cycle.
fn generate_reading(
    rng: &mut StdRng,
    index: usize,
    timestamp: DateTime<Utc>,
    day: u32,
    total_days: u32,
) -> RawReading {
    // Early days run slightly cooler while roots establish.
    let day_f = f64::from(day);
    let temp_base = if day < 6 {
        BASE_TEMP - 1.5 + day_f * 0.2
    } else {
        BASE_TEMP + (day_f * 0.4).sin() * 1.5
    };

    let days_remaining = f64::from(total_days.saturating_sub(day));

    RawReading {
        id: format!("sim-{index:04}"),
        timestamp: timestamp.to_rfc3339(),
        temperature: temp_base + rng.gen_range(-0.6..0.6),
        humidity: BASE_HUMIDITY + rng.gen_range(-6.0..6.0),
        ph: BASE_PH + rng.gen_range(-0.25..0.25),
        tds: BASE_TDS + day_f * TDS_RAMP_PER_DAY + rng.gen_range(-20.0..20.0),
        // Prediction converges on the standard cycle length as harvest nears.
        predicted_days: Some(
            f64::from(EXPECTED_CYCLE_DAYS) + days_remaining * 0.08 + rng.gen_range(-0.5..0.5),
        ),
    }
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let start: DateTime<Utc> = match args.start.parse() {
        Ok(dt) => dt,
        Err(e) => {
            eprintln!("verde-sim: invalid --start timestamp ({e}), exiting");
            std::process::exit(2);
        }
    };

    let mut rng: StdRng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let sample_gap = Duration::hours(24 / i64::from(args.samples_per_day));
    let mut readings: Vec<RawReading> = Vec::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for day in 0..args.days {
        for sample in 0..args.samples_per_day {
            let timestamp =
                start + Duration::days(i64::from(day)) + sample_gap * i32::try_from(sample).unwrap_or(0);
            let reading =
                generate_reading(&mut rng, readings.len(), timestamp, day, args.days);
            readings.push(reading);

            if !args.final_only {
                let line = serde_json::to_string(&readings)?;
                writeln!(out, "{line}")?;
                out.flush()?;
                if args.interval_ms > 0 {
                    std::thread::sleep(std::time::Duration::from_millis(args.interval_ms));
                }
            }
        }
    }

    if args.final_only {
        let line = serde_json::to_string(&readings)?;
        writeln!(out, "{line}")?;
        out.flush()?;
    }

    eprintln!(
        "verde-sim: emitted {} readings over {} simulated days",
        readings.len(),
        args.days
    );

    Ok(())
}
