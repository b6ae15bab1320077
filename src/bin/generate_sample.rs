use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use clap::Parser;
use serde::Serialize;

/// Write a synthetic day.csv / hour.csv pair for offline use.
#[derive(Parser, Debug)]
#[command(name = "generate_sample", version)]
struct Args {
    /// Output folder
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of days starting 2011-01-01
    #[arg(long, default_value_t = 731, value_parser = clap::value_parser!(u64).range(1..=MAX_DAYS))]
    days: u64,
}

const MAX_DAYS: u64 = 100_000;

/// Relative demand per hour for working days: commute peaks at 8 and 17–18.
const WORKDAY_PROFILE: [f64; 24] = [
    0.2, 0.1, 0.05, 0.05, 0.05, 0.3, 1.2, 3.5, 6.0, 3.0, 1.6, 1.9, 2.4, 2.3, 2.1, 2.4, 3.8, 6.8,
    6.2, 4.2, 3.0, 2.2, 1.6, 0.9,
];

/// Relative demand per hour for weekends and holidays: one broad midday hump.
const WEEKEND_PROFILE: [f64; 24] = [
    0.9, 0.7, 0.5, 0.2, 0.1, 0.1, 0.3, 0.7, 1.5, 2.6, 3.8, 4.6, 5.2, 5.3, 5.1, 4.9, 4.6, 4.2,
    3.5, 2.7, 2.0, 1.6, 1.4, 1.0,
];

#[derive(Debug, Serialize)]
struct DayRow {
    instant: usize,
    dteday: String,
    season: u8,
    yr: i32,
    mnth: u32,
    holiday: u8,
    weekday: u8,
    workingday: u8,
    weathersit: u8,
    casual: u32,
    registered: u32,
    cnt: u32,
}

#[derive(Debug, Serialize)]
struct HourRow {
    instant: usize,
    dteday: String,
    season: u8,
    yr: i32,
    mnth: u32,
    hr: u8,
    holiday: u8,
    weekday: u8,
    workingday: u8,
    weathersit: u8,
    casual: u32,
    registered: u32,
    cnt: u32,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Non-negative count around `mean`.
    fn count(&mut self, mean: f64) -> u32 {
        self.gauss(mean, mean.sqrt().max(1.0)).round().max(0.0) as u32
    }
}

fn season_code(month: u32) -> u8 {
    match month {
        1..=3 => 1,
        4..=6 => 2,
        7..=9 => 3,
        _ => 4,
    }
}

/// Weather code drawn with roughly the dataset's frequencies.
fn weather_code(rng: &mut SimpleRng) -> u8 {
    match rng.next_f64() {
        p if p < 0.64 => 1,
        p if p < 0.93 => 2,
        p if p < 0.995 => 3,
        _ => 4,
    }
}

fn generate(seed: u64, days: u64) -> (Vec<DayRow>, Vec<HourRow>) {
    let mut rng = SimpleRng::new(seed);
    let start = NaiveDate::from_ymd_opt(2011, 1, 1).unwrap_or_default();

    let mut day_rows = Vec::with_capacity(days as usize);
    let mut hour_rows = Vec::with_capacity(days as usize * 24);

    for offset in 0..days {
        let date = start + Days::new(offset);
        let season = season_code(date.month());
        let weathersit = weather_code(&mut rng);
        let weekday = date.weekday();
        let working = !matches!(weekday, Weekday::Sat | Weekday::Sun);

        let season_factor = [0.45, 0.95, 1.1, 0.8][usize::from(season - 1)];
        let weather_factor = [1.0, 0.85, 0.45, 0.15][usize::from(weathersit - 1)];
        let growth = 1.0 + (date.year() - 2011) as f64 * 0.6;
        let scale = season_factor * weather_factor * growth;

        let (profile, registered_rate, casual_rate) = if working {
            (&WORKDAY_PROFILE, 42.0, 4.0)
        } else {
            (&WEEKEND_PROFILE, 20.0, 14.0)
        };

        let dteday = date.format("%Y-%m-%d").to_string();
        let (mut day_casual, mut day_registered) = (0u32, 0u32);

        for (hr, weight) in profile.iter().enumerate() {
            let casual = rng.count(casual_rate * weight * scale);
            let registered = rng.count(registered_rate * weight * scale);
            day_casual += casual;
            day_registered += registered;

            hour_rows.push(HourRow {
                instant: hour_rows.len() + 1,
                dteday: dteday.clone(),
                season,
                yr: date.year() - 2011,
                mnth: date.month(),
                hr: hr as u8,
                holiday: 0,
                weekday: weekday.num_days_from_sunday() as u8,
                workingday: u8::from(working),
                weathersit,
                casual,
                registered,
                cnt: casual + registered,
            });
        }

        day_rows.push(DayRow {
            instant: day_rows.len() + 1,
            dteday,
            season,
            yr: date.year() - 2011,
            mnth: date.month(),
            holiday: 0,
            weekday: weekday.num_days_from_sunday() as u8,
            workingday: u8::from(working),
            weathersit,
            casual: day_casual,
            registered: day_registered,
            cnt: day_casual + day_registered,
        });
    }

    (day_rows, hour_rows)
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    writer.flush().context("flushing CSV writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let (days, hours) = generate(args.seed, args.days);
    write_csv(&args.out_dir.join("day.csv"), &days)?;
    write_csv(&args.out_dir.join("hour.csv"), &hours)?;

    log::info!("Generated sample data with seed {}", args.seed);
    println!(
        "Wrote {} days and {} hourly records to {}",
        days.len(),
        hours.len(),
        args.out_dir.display()
    );
    Ok(())
}
