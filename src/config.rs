use std::path::PathBuf;

use clap::Parser;

use crate::data::loader::{DataSource, Sources, DEFAULT_DAY_URL, DEFAULT_HOUR_URL};

/// Command-line configuration of the dashboard.
#[derive(Parser, Debug)]
#[command(
    name = "bikeshare-dashboard",
    version,
    about = "Interactive bike-sharing rental dashboard"
)]
pub struct Cli {
    /// URL or path of the daily table (day.csv)
    #[arg(long, default_value = DEFAULT_DAY_URL)]
    pub day_source: String,

    /// URL or path of the hourly table (hour.csv)
    #[arg(long, default_value = DEFAULT_HOUR_URL)]
    pub hour_source: String,

    /// Folder holding day.csv and hour.csv; overrides both sources
    #[arg(long, conflicts_with_all = ["day_source", "hour_source"])]
    pub data_dir: Option<PathBuf>,
}

impl Cli {
    pub fn sources(&self) -> Sources {
        match &self.data_dir {
            Some(dir) => Sources::from_dir(dir),
            None => Sources {
                daily: DataSource::parse(&self.day_source),
                hourly: DataSource::parse(&self.hour_source),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_remote() {
        let cli = Cli::parse_from(["bikeshare-dashboard"]);
        assert_eq!(cli.sources(), Sources::default());
    }

    #[test]
    fn data_dir_resolves_both_tables() {
        let cli = Cli::parse_from(["bikeshare-dashboard", "--data-dir", "sample"]);
        let sources = cli.sources();
        assert_eq!(sources.daily, DataSource::Local(PathBuf::from("sample/day.csv")));
        assert_eq!(sources.hourly, DataSource::Local(PathBuf::from("sample/hour.csv")));
    }

    #[test]
    fn individual_sources() {
        let cli = Cli::parse_from([
            "bikeshare-dashboard",
            "--day-source",
            "local/day.csv",
            "--hour-source",
            "https://example.org/hour.csv",
        ]);
        let sources = cli.sources();
        assert_eq!(sources.daily, DataSource::Local(PathBuf::from("local/day.csv")));
        assert_eq!(
            sources.hourly,
            DataSource::Remote("https://example.org/hour.csv".to_string())
        );
    }

    #[test]
    fn data_dir_conflicts_with_explicit_sources() {
        let result = Cli::try_parse_from([
            "bikeshare-dashboard",
            "--data-dir",
            "sample",
            "--day-source",
            "x.csv",
        ]);
        assert!(result.is_err());
    }
}
