use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::category::{Season, Weather};
use super::model::{BikeDataset, RentalRecord, RentalTable};

// ---------------------------------------------------------------------------
// Filter criteria: date interval plus selected seasons and weathers
// ---------------------------------------------------------------------------

/// The user's current selection. Rebuilt from widget state on every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub seasons: BTreeSet<Season>,
    pub weathers: BTreeSet<Weather>,
}

impl FilterCriteria {
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        seasons: impl IntoIterator<Item = Season>,
        weathers: impl IntoIterator<Item = Weather>,
    ) -> Self {
        Self {
            start,
            end,
            seasons: seasons.into_iter().collect(),
            weathers: weathers.into_iter().collect(),
        }
    }

    /// Initial selection: the daily table's full date span, every season and
    /// every weather situation. `None` when there are no daily records.
    pub fn spanning(dataset: &BikeDataset) -> Option<Self> {
        let (start, end) = dataset.daily.date_span()?;
        Some(Self::new(start, end, Season::ALL, Weather::ALL))
    }

    /// A record passes when all four conditions hold:
    /// * `start <= date <= end`
    /// * its season name is selected
    /// * its weather name is selected
    ///
    /// Records with an unmapped season or weather never pass.
    pub fn matches(&self, record: &RentalRecord) -> bool {
        self.start <= record.date
            && record.date <= self.end
            && record
                .season_name
                .is_some_and(|s| self.seasons.contains(&s))
            && record
                .weathersit_name
                .is_some_and(|w| self.weathers.contains(&w))
    }
}

/// Records of `table` passing `criteria`, in input order.
pub fn filter(table: &RentalTable, criteria: &FilterCriteria) -> RentalTable {
    let records = table
        .records
        .iter()
        .filter(|r| criteria.matches(r))
        .copied()
        .collect();
    RentalTable::new(table.granularity, records)
}
