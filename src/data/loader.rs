use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use super::error::{LoadError, Result};
use super::model::{BikeDataset, Granularity, RentalRecord, RentalTable};

/// Public daily table of the bike-sharing dataset.
pub const DEFAULT_DAY_URL: &str =
    "https://raw.githubusercontent.com/fenia-k/Bike-Sharing-Dataset/refs/heads/main/day.csv";

/// Public hourly table of the bike-sharing dataset.
pub const DEFAULT_HOUR_URL: &str =
    "https://raw.githubusercontent.com/fenia-k/Bike-Sharing-Dataset/refs/heads/main/hour.csv";

/// Date layouts accepted in the `dteday` column, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const HOURS_PER_DAY: u8 = 24;

const DAILY_COLUMNS: [&str; 8] = [
    "dteday",
    "season",
    "weathersit",
    "weekday",
    "workingday",
    "casual",
    "registered",
    "cnt",
];

// ---------------------------------------------------------------------------
// Data sources
// ---------------------------------------------------------------------------

/// Where one CSV table is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Remote(String),
    Local(PathBuf),
}

impl DataSource {
    /// `http://` and `https://` locations are remote, anything else is a path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            DataSource::Remote(location.to_string())
        } else {
            DataSource::Local(PathBuf::from(location))
        }
    }

    /// Fetch the raw CSV text. No retry.
    pub fn read_to_string(&self) -> Result<String> {
        match self {
            DataSource::Remote(url) => {
                log::info!("Fetching {url}");
                let response = reqwest::blocking::get(url)
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| LoadError::fetch(url.as_str(), e))?;
                response.text().map_err(|e| LoadError::fetch(url.as_str(), e))
            }
            DataSource::Local(path) => {
                log::info!("Reading {}", path.display());
                std::fs::read_to_string(path)
                    .map_err(|e| LoadError::fetch(path.display().to_string(), e))
            }
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Remote(url) => write!(f, "{url}"),
            DataSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The pair of sources a dataset is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub daily: DataSource,
    pub hourly: DataSource,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            daily: DataSource::Remote(DEFAULT_DAY_URL.to_string()),
            hourly: DataSource::Remote(DEFAULT_HOUR_URL.to_string()),
        }
    }
}

impl Sources {
    /// `day.csv` and `hour.csv` inside `dir`.
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            daily: DataSource::Local(dir.join("day.csv")),
            hourly: DataSource::Local(dir.join("hour.csv")),
        }
    }
}

// ---------------------------------------------------------------------------
// Memoized loading
// ---------------------------------------------------------------------------

/// Process-scoped cache of the loaded dataset.
///
/// Constructed once and shared by handle. The first successful [`load`]
/// populates it; every later call returns the same snapshot without touching
/// the sources. Failed loads leave it empty.
///
/// [`load`]: DatasetCache::load
#[derive(Debug)]
pub struct DatasetCache {
    sources: Sources,
    cell: OnceLock<Arc<BikeDataset>>,
}

impl DatasetCache {
    pub fn new(sources: Sources) -> Self {
        Self {
            sources,
            cell: OnceLock::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Return the cached dataset, loading it on first use.
    pub fn load(&self) -> Result<Arc<BikeDataset>> {
        if let Some(dataset) = self.cell.get() {
            return Ok(Arc::clone(dataset));
        }
        let dataset = load_dataset(&self.sources)?;
        Ok(Arc::clone(self.cell.get_or_init(|| Arc::new(dataset))))
    }
}

/// Fetch, parse and label both tables.
pub fn load_dataset(sources: &Sources) -> Result<BikeDataset> {
    let daily = read_table(&sources.daily, Granularity::Daily)?;
    let hourly = read_table(&sources.hourly, Granularity::Hourly)?;

    log::info!(
        "Loaded {} daily and {} hourly records",
        daily.len(),
        hourly.len()
    );

    let dataset = BikeDataset { daily, hourly };
    report_diagnostics(&dataset);
    Ok(dataset)
}

fn read_table(source: &DataSource, granularity: Granularity) -> Result<RentalTable> {
    let text = source.read_to_string()?;
    parse_table(&text, granularity).map_err(|e| match e {
        // Header problems are only known here; attach the real location.
        LoadError::Fetch { reason, .. } => LoadError::fetch(source.to_string(), reason),
        other => other,
    })
}

fn report_diagnostics(dataset: &BikeDataset) {
    for table in [&dataset.daily, &dataset.hourly] {
        let mismatches = table.count_total_mismatches();
        if mismatches > 0 {
            log::warn!(
                "{} {} records have casual + registered != cnt",
                mismatches,
                table.granularity
            );
        }
        let unlabelled = table.count_unlabelled();
        if unlabelled > 0 {
            log::debug!(
                "{} {} records have an unmapped season or weather code",
                unlabelled,
                table.granularity
            );
        }
    }
    let hourly = dataset.count_hourly_mismatches();
    if hourly > 0 {
        log::warn!("{hourly} dates have hourly totals that differ from the daily total");
    }
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

/// One CSV row as it appears on disk. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawRow {
    dteday: String,
    season: u8,
    weathersit: u8,
    weekday: u8,
    #[serde(default)]
    hr: Option<u8>,
    workingday: u8,
    casual: u32,
    registered: u32,
    cnt: u32,
}

impl RawRow {
    fn into_record(self, granularity: Granularity, row: usize) -> Result<RentalRecord> {
        let parse_error = |reason: String| LoadError::Parse {
            table: granularity,
            row,
            reason,
        };

        let date = parse_date(&self.dteday)
            .ok_or_else(|| parse_error(format!("'{}' is not a date", self.dteday)))?;
        let workingday = match self.workingday {
            0 => false,
            1 => true,
            other => return Err(parse_error(format!("workingday must be 0 or 1, got {other}"))),
        };
        let hour = match (granularity, self.hr) {
            (Granularity::Daily, _) => None,
            (Granularity::Hourly, None) => return Err(parse_error("missing hour".to_string())),
            (Granularity::Hourly, Some(hr)) if hr >= HOURS_PER_DAY => {
                return Err(parse_error(format!("hr must be 0 to 23, got {hr}")))
            }
            (Granularity::Hourly, hr) => hr,
        };

        Ok(RentalRecord {
            date,
            hour,
            season: self.season,
            weathersit: self.weathersit,
            weekday: self.weekday,
            workingday,
            casual: self.casual,
            registered: self.registered,
            cnt: self.cnt,
            season_name: None,
            weathersit_name: None,
            weekday_name: None,
            month: None,
            month_name: None,
        }
        .with_labels(granularity))
    }
}

/// Parse CSV text into a labelled table.
///
/// Missing required columns make the content non-tabular (`Fetch`); a bad
/// value in any row aborts with `Parse`. Rows are numbered from 1, header
/// excluded.
pub fn parse_table(text: &str, granularity: Granularity) -> Result<RentalTable> {
    let location = format!("{granularity} table");
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| LoadError::fetch(location.as_str(), e))?
        .clone();
    let required = DAILY_COLUMNS
        .iter()
        .chain(match granularity {
            Granularity::Hourly => &["hr"][..],
            Granularity::Daily => &[][..],
        })
        .copied();
    for column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::fetch(
                location.as_str(),
                format!("not a rental table, missing column '{column}'"),
            ));
        }
    }

    let mut records = Vec::new();
    for (idx, result) in reader.deserialize::<RawRow>().enumerate() {
        let row = idx + 1;
        let raw = result.map_err(|e| LoadError::Parse {
            table: granularity,
            row,
            reason: e.to_string(),
        })?;
        records.push(raw.into_record(granularity, row)?);
    }

    Ok(RentalTable::new(granularity, records))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::category::{Season, Weather};

    const DAY_CSV: &str = "\
instant,dteday,season,yr,mnth,holiday,weekday,workingday,weathersit,temp,casual,registered,cnt
1,2011-01-01,1,0,1,0,6,0,2,0.344167,331,654,985
2,2011-01-02,1,0,1,0,0,0,2,0.363478,131,670,801
3,2011-01-03,1,0,1,0,1,1,1,0.196364,120,1229,1349
";

    const HOUR_CSV: &str = "\
instant,dteday,season,yr,mnth,hr,holiday,weekday,workingday,weathersit,casual,registered,cnt
1,2011-01-01,1,0,1,0,0,6,0,1,3,13,16
2,2011-01-01,1,0,1,1,0,6,0,1,8,32,40
";

    #[test]
    fn parses_daily_table_with_labels() {
        let table = parse_table(DAY_CSV, Granularity::Daily).unwrap();
        assert_eq!(table.len(), 3);
        let first = &table.records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2011, 1, 1).unwrap());
        assert_eq!(first.season_name, Some(Season::Spring));
        assert_eq!(first.weathersit_name, Some(Weather::Misty));
        assert_eq!(first.weekday_name, Some("Saturday"));
        assert_eq!(first.month, Some(1));
        assert_eq!(first.month_name, Some("Jan"));
        assert!(!first.workingday);
        assert_eq!(first.hour, None);
        assert_eq!(table.count_total_mismatches(), 0);
    }

    #[test]
    fn parses_hourly_table_without_daily_labels() {
        let table = parse_table(HOUR_CSV, Granularity::Hourly).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[1].hour, Some(1));
        assert_eq!(table.records[1].season_name, Some(Season::Spring));
        assert_eq!(table.records[1].weekday_name, None);
        assert_eq!(table.records[1].month_name, None);
    }

    #[test]
    fn malformed_date_fails_with_row_number() {
        let csv = DAY_CSV.replace("2011-01-02", "not-a-date");
        match parse_table(&csv, Granularity::Daily) {
            Err(LoadError::Parse { table, row, reason }) => {
                assert_eq!(table, Granularity::Daily);
                assert_eq!(row, 2);
                assert!(reason.contains("not-a-date"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_number_fails() {
        let csv = DAY_CSV.replace(",331,", ",lots,");
        assert!(matches!(
            parse_table(&csv, Granularity::Daily),
            Err(LoadError::Parse { row: 1, .. })
        ));
    }

    #[test]
    fn workingday_must_be_a_flag() {
        let csv = DAY_CSV.replace("3,2011-01-03,1,0,1,0,1,1,", "3,2011-01-03,1,0,1,0,1,2,");
        assert_ne!(csv, DAY_CSV);
        assert!(matches!(
            parse_table(&csv, Granularity::Daily),
            Err(LoadError::Parse { row: 3, .. })
        ));
    }

    #[test]
    fn hour_outside_the_day_fails() {
        let csv = HOUR_CSV.replace("2,2011-01-01,1,0,1,1,", "2,2011-01-01,1,0,1,30,");
        assert_ne!(csv, HOUR_CSV);
        match parse_table(&csv, Granularity::Hourly) {
            Err(LoadError::Parse { table, row, reason }) => {
                assert_eq!(table, Granularity::Hourly);
                assert_eq!(row, 2);
                assert!(reason.contains("30"), "{reason}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn padded_header_names_are_accepted() {
        let csv = DAY_CSV.replacen(
            "instant,dteday,season,",
            "instant, dteday , season,",
            1,
        );
        assert_ne!(csv, DAY_CSV);
        let table = parse_table(&csv, Granularity::Daily).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.records[0].season_name, Some(Season::Spring));
    }

    #[test]
    fn missing_hour_column_is_not_tabular() {
        assert!(matches!(
            parse_table(DAY_CSV, Granularity::Hourly),
            Err(LoadError::Fetch { .. })
        ));
    }

    #[test]
    fn non_csv_content_is_a_fetch_error() {
        let html = "<html><body>404: Not Found</body></html>";
        assert!(matches!(
            parse_table(html, Granularity::Daily),
            Err(LoadError::Fetch { .. })
        ));
    }

    #[test]
    fn unmapped_season_loads_as_null() {
        let csv = DAY_CSV.replace("3,2011-01-03,1,", "3,2011-01-03,9,");
        let table = parse_table(&csv, Granularity::Daily).unwrap();
        assert_eq!(table.records[2].season, 9);
        assert_eq!(table.records[2].season_name, None);
        assert_eq!(table.count_unlabelled(), 1);
    }

    #[test]
    fn accepts_alternative_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2012, 3, 4);
        assert_eq!(parse_date("2012-03-04"), expected);
        assert_eq!(parse_date("2012/03/04"), expected);
        assert_eq!(parse_date("03/04/2012"), expected);
        assert_eq!(parse_date("2012-03-04 00:00:00"), expected);
        assert_eq!(parse_date("4 March"), None);
    }

    #[test]
    fn data_source_parse() {
        assert_eq!(
            DataSource::parse("https://example.org/day.csv"),
            DataSource::Remote("https://example.org/day.csv".into())
        );
        assert_eq!(
            DataSource::parse("data/day.csv"),
            DataSource::Local(PathBuf::from("data/day.csv"))
        );
    }

    #[test]
    fn unreachable_url_is_a_fetch_error() {
        // Nothing listens on port 1, so the connection is refused at once.
        let url = "http://127.0.0.1:1/day.csv";
        match DataSource::Remote(url.into()).read_to_string() {
            Err(LoadError::Fetch { location, .. }) => assert!(location.contains(url), "{location}"),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    fn write_sources(dir: &Path) -> Sources {
        std::fs::write(dir.join("day.csv"), DAY_CSV).unwrap();
        std::fs::write(dir.join("hour.csv"), HOUR_CSV).unwrap();
        Sources::from_dir(dir)
    }

    #[test]
    fn cache_memoizes_first_successful_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(write_sources(dir.path()));
        assert!(!cache.is_loaded());

        let first = cache.load().unwrap();
        assert!(cache.is_loaded());

        // The sources are gone; a memoized cache never reads them again.
        std::fs::remove_file(dir.path().join("day.csv")).unwrap();
        let second = cache.load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn failed_load_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(Sources::from_dir(dir.path()));

        assert!(matches!(cache.load(), Err(LoadError::Fetch { .. })));
        assert!(!cache.is_loaded());

        write_sources(dir.path());
        let dataset = cache.load().unwrap();
        assert_eq!(dataset.daily.len(), 3);
        assert_eq!(dataset.hourly.len(), 2);
    }

    #[test]
    fn fetch_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("day.csv"), DAY_CSV).unwrap();
        std::fs::write(dir.path().join("hour.csv"), DAY_CSV).unwrap();
        let err = load_dataset(&Sources::from_dir(dir.path())).unwrap_err();
        assert!(err.to_string().contains("hour.csv"), "{err}");
    }
}
