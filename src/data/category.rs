use std::fmt;

// ---------------------------------------------------------------------------
// Fixed code → name mappings of the bike-sharing dataset
// ---------------------------------------------------------------------------

/// Season of a rental record (`season` column, codes 1–4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// All seasons in display order.
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    /// Map a dataset code to a season. Unknown codes map to `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Season::Spring),
            2 => Some(Season::Summer),
            3 => Some(Season::Fall),
            4 => Some(Season::Winter),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Weather situation of a rental record (`weathersit` column, codes 1–4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weather {
    Clear,
    Misty,
    LightPrecipitation,
    HeavyPrecipitation,
}

impl Weather {
    pub const ALL: [Weather; 4] = [
        Weather::Clear,
        Weather::Misty,
        Weather::LightPrecipitation,
        Weather::HeavyPrecipitation,
    ];

    /// Map a dataset code to a weather situation. Unknown codes map to `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Weather::Clear),
            2 => Some(Weather::Misty),
            3 => Some(Weather::LightPrecipitation),
            4 => Some(Weather::HeavyPrecipitation),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Weather::Clear => "Clear",
            Weather::Misty => "Misty",
            Weather::LightPrecipitation => "Light Rain/Snow",
            Weather::HeavyPrecipitation => "Heavy Rain/Snow",
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Weekday names indexed by the dataset's `weekday` code (0 = Sunday).
const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Weekday names in display order (Monday first).
pub const WEEKDAY_ORDER: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn weekday_name(code: u8) -> Option<&'static str> {
    WEEKDAY_NAMES.get(code as usize).copied()
}

/// Three-letter abbreviation of a 1-based month number.
pub fn month_abbrev(month: u32) -> Option<&'static str> {
    let idx = month.checked_sub(1)? as usize;
    MONTH_ABBREVS.get(idx).copied()
}

/// Season names in display order, as used when sorting grouped tables.
pub fn season_order() -> [&'static str; 4] {
    Season::ALL.map(Season::name)
}
