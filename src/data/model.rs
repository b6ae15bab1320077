use std::fmt;

use chrono::{Datelike, NaiveDate};

use super::category::{self, Season, Weather};

// ---------------------------------------------------------------------------
// Key – a single grouping cell
// ---------------------------------------------------------------------------

/// A dynamically-typed grouping value, one per [`Dimension`] of a record.
/// Ordered so grouped output can live in a `BTreeMap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Null,
    Bool(bool),
    Integer(i64),
    Label(&'static str),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Null => write!(f, "<null>"),
            Key::Bool(b) => write!(f, "{b}"),
            Key::Integer(i) => write!(f, "{i}"),
            Key::Label(s) => write!(f, "{s}"),
        }
    }
}

impl Key {
    pub fn is_null(&self) -> bool {
        matches!(self, Key::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Key::Integer(i) => Some(*i),
            Key::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&'static str> {
        match self {
            Key::Label(s) => Some(*s),
            _ => None,
        }
    }
}

impl From<Option<&'static str>> for Key {
    fn from(value: Option<&'static str>) -> Self {
        value.map_or(Key::Null, Key::Label)
    }
}

// ---------------------------------------------------------------------------
// RentalRecord – one row of day.csv or hour.csv
// ---------------------------------------------------------------------------

/// Which CSV a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Hourly,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Daily => write!(f, "daily"),
            Granularity::Hourly => write!(f, "hourly"),
        }
    }
}

/// A single rental record with its raw codes and derived labels.
///
/// `weekday_name`, `month` and `month_name` are only derived for daily
/// records; hourly records leave them `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RentalRecord {
    pub date: NaiveDate,
    /// Hour of day, hourly records only.
    pub hour: Option<u8>,
    pub season: u8,
    pub weathersit: u8,
    pub weekday: u8,
    pub workingday: bool,
    pub casual: u32,
    pub registered: u32,
    pub cnt: u32,

    pub season_name: Option<Season>,
    pub weathersit_name: Option<Weather>,
    pub weekday_name: Option<&'static str>,
    pub month: Option<u32>,
    pub month_name: Option<&'static str>,
}

impl RentalRecord {
    /// Fill the derived label columns from the raw codes.
    pub fn with_labels(mut self, granularity: Granularity) -> Self {
        self.season_name = Season::from_code(self.season);
        self.weathersit_name = Weather::from_code(self.weathersit);
        match granularity {
            Granularity::Daily => {
                self.weekday_name = category::weekday_name(self.weekday);
                self.month = Some(self.date.month());
                self.month_name = category::month_abbrev(self.date.month());
            }
            Granularity::Hourly => {
                self.weekday_name = None;
                self.month = None;
                self.month_name = None;
            }
        }
        self
    }

    /// Whether `casual + registered == cnt` holds for this record.
    pub fn total_is_consistent(&self) -> bool {
        u64::from(self.casual) + u64::from(self.registered) == u64::from(self.cnt)
    }
}

// ---------------------------------------------------------------------------
// Columns addressable by the aggregation engine
// ---------------------------------------------------------------------------

/// A categorical column records can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Season,
    Weather,
    /// Numeric weekday code (0 = Sunday).
    Weekday,
    WeekdayName,
    Month,
    MonthName,
    Hour,
    WorkingDay,
}

impl Dimension {
    pub fn key(self, record: &RentalRecord) -> Key {
        match self {
            Dimension::Season => record.season_name.map(Season::name).into(),
            Dimension::Weather => record.weathersit_name.map(Weather::name).into(),
            Dimension::Weekday => Key::Integer(i64::from(record.weekday)),
            Dimension::WeekdayName => record.weekday_name.into(),
            Dimension::Month => record.month.map_or(Key::Null, |m| Key::Integer(i64::from(m))),
            Dimension::MonthName => record.month_name.into(),
            Dimension::Hour => record.hour.map_or(Key::Null, |h| Key::Integer(i64::from(h))),
            Dimension::WorkingDay => Key::Bool(record.workingday),
        }
    }
}

/// A count column that can be averaged or summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Casual,
    Registered,
    Total,
}

impl Measure {
    pub fn value(self, record: &RentalRecord) -> f64 {
        match self {
            Measure::Casual => f64::from(record.casual),
            Measure::Registered => f64::from(record.registered),
            Measure::Total => f64::from(record.cnt),
        }
    }
}

// ---------------------------------------------------------------------------
// RentalTable / BikeDataset – the loaded data
// ---------------------------------------------------------------------------

/// A table of records of one granularity.
#[derive(Debug, Clone, PartialEq)]
pub struct RentalTable {
    pub granularity: Granularity,
    pub records: Vec<RentalRecord>,
}

impl RentalTable {
    pub fn new(granularity: Granularity, records: Vec<RentalRecord>) -> Self {
        Self {
            granularity,
            records,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest record date, `None` for an empty table.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    /// Number of records violating `casual + registered == cnt`.
    pub fn count_total_mismatches(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !r.total_is_consistent())
            .count()
    }

    /// Number of records whose season or weather code has no mapping.
    pub fn count_unlabelled(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.season_name.is_none() || r.weathersit_name.is_none())
            .count()
    }
}

/// Both loaded tables, shared read-only for the whole session.
#[derive(Debug, Clone, PartialEq)]
pub struct BikeDataset {
    pub daily: RentalTable,
    pub hourly: RentalTable,
}

impl BikeDataset {
    /// Number of dates whose hourly totals do not add up to the daily total.
    /// Dates present in only one of the tables are not counted.
    pub fn count_hourly_mismatches(&self) -> usize {
        let mut hourly_sums: std::collections::BTreeMap<NaiveDate, u64> =
            std::collections::BTreeMap::new();
        for r in &self.hourly.records {
            *hourly_sums.entry(r.date).or_default() += u64::from(r.cnt);
        }
        self.daily
            .records
            .iter()
            .filter(|d| {
                hourly_sums
                    .get(&d.date)
                    .is_some_and(|&sum| sum != u64::from(d.cnt))
            })
            .count()
    }
}
