use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::color::ColorMap;
use crate::data::category::{Season, Weather};
use crate::data::dashboard::DashboardView;
use crate::data::filter::FilterCriteria;
use crate::data::loader::DatasetCache;
use crate::data::model::BikeDataset;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Memoized data source shared for the whole session.
    pub cache: Arc<DatasetCache>,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<Arc<BikeDataset>>,

    /// Current filter selection, backing the side-panel widgets.
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub seasons: BTreeSet<Season>,
    pub weathers: BTreeSet<Weather>,

    /// Derived tables for the current selection (cached).
    pub view: Option<DashboardView>,

    /// Colours for season and weather series.
    pub season_colors: ColorMap,
    pub weather_colors: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(cache: Arc<DatasetCache>) -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            cache,
            dataset: None,
            start: today,
            end: today,
            seasons: Season::ALL.into_iter().collect(),
            weathers: Weather::ALL.into_iter().collect(),
            view: None,
            season_colors: ColorMap::new(&Season::ALL.map(Season::name)),
            weather_colors: ColorMap::new(&Weather::ALL.map(Weather::name)),
            status_message: None,
        }
    }

    /// Load (or fetch from the cache) and reset filters to the full span.
    /// Failures clear the view so no stale data stays on screen.
    pub fn load(&mut self) {
        match self.cache.load() {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load data: {e}");
                self.dataset = None;
                self.view = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and initialise filters.
    pub fn set_dataset(&mut self, dataset: Arc<BikeDataset>) {
        self.dataset = Some(dataset);
        self.view = None;
        self.status_message = None;
        self.reset_filters();
    }

    /// Current widget state as a criteria value.
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(
            self.start,
            self.end,
            self.seasons.iter().copied(),
            self.weathers.iter().copied(),
        )
    }

    /// Recompute the view after a criteria change.
    pub fn refresh(&mut self) {
        let criteria = self.criteria();
        if self.view.as_ref().is_some_and(|v| v.criteria == criteria) {
            return;
        }
        self.view = self
            .dataset
            .as_deref()
            .map(|ds| DashboardView::compute(ds, &criteria));
    }

    /// Date span of the loaded daily table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.dataset.as_ref()?.daily.date_span()
    }

    /// Everything selected over the full date span.
    pub fn reset_filters(&mut self) {
        if let Some(criteria) = self.dataset.as_deref().and_then(FilterCriteria::spanning) {
            self.start = criteria.start;
            self.end = criteria.end;
            self.seasons = criteria.seasons;
            self.weathers = criteria.weathers;
        }
        self.refresh();
    }

    pub fn set_start(&mut self, date: NaiveDate) {
        self.start = date;
        self.refresh();
    }

    pub fn set_end(&mut self, date: NaiveDate) {
        self.end = date;
        self.refresh();
    }

    /// Toggle a single season in the selection.
    pub fn toggle_season(&mut self, season: Season) {
        if !self.seasons.remove(&season) {
            self.seasons.insert(season);
        }
        self.refresh();
    }

    pub fn toggle_weather(&mut self, weather: Weather) {
        if !self.weathers.remove(&weather) {
            self.weathers.insert(weather);
        }
        self.refresh();
    }

    pub fn select_all_seasons(&mut self) {
        self.seasons = Season::ALL.into_iter().collect();
        self.refresh();
    }

    pub fn select_no_seasons(&mut self) {
        self.seasons.clear();
        self.refresh();
    }

    pub fn select_all_weathers(&mut self) {
        self.weathers = Weather::ALL.into_iter().collect();
        self.refresh();
    }

    pub fn select_no_weathers(&mut self) {
        self.weathers.clear();
        self.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::Sources;

    const DAY_CSV: &str = "\
dteday,season,weekday,workingday,weathersit,casual,registered,cnt
2011-01-01,1,6,0,2,331,654,985
2011-01-02,1,0,0,1,131,670,801
2011-06-01,2,3,1,1,500,500,1000
";

    const HOUR_CSV: &str = "\
dteday,season,hr,weekday,workingday,weathersit,casual,registered,cnt
2011-01-01,1,0,6,0,2,3,13,16
";

    fn loaded_state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("day.csv"), DAY_CSV).unwrap();
        std::fs::write(dir.path().join("hour.csv"), HOUR_CSV).unwrap();
        let cache = Arc::new(DatasetCache::new(Sources::from_dir(dir.path())));
        let mut state = AppState::new(cache);
        state.load();
        (dir, state)
    }

    #[test]
    fn load_resets_filters_to_full_span() {
        let (_dir, state) = loaded_state();
        assert!(state.status_message.is_none());
        assert_eq!(state.start, NaiveDate::from_ymd_opt(2011, 1, 1).unwrap());
        assert_eq!(state.end, NaiveDate::from_ymd_opt(2011, 6, 1).unwrap());
        assert_eq!(state.view.as_ref().unwrap().daily_rows, 3);
    }

    #[test]
    fn criteria_changes_recompute_view() {
        let (_dir, mut state) = loaded_state();

        state.toggle_season(Season::Summer);
        assert_eq!(state.view.as_ref().unwrap().daily_rows, 2);

        state.toggle_weather(Weather::Misty);
        assert_eq!(state.view.as_ref().unwrap().daily_rows, 1);

        state.set_end(NaiveDate::from_ymd_opt(2011, 1, 1).unwrap());
        assert_eq!(state.view.as_ref().unwrap().daily_rows, 0);

        state.reset_filters();
        assert_eq!(state.view.as_ref().unwrap().daily_rows, 3);
    }

    #[test]
    fn selecting_nothing_gives_an_empty_view() {
        let (_dir, mut state) = loaded_state();
        state.select_no_weathers();
        let view = state.view.as_ref().unwrap();
        assert_eq!(view.daily_rows, 0);
        assert!(view.by_season.is_empty());

        state.select_all_weathers();
        assert_eq!(state.view.as_ref().unwrap().daily_rows, 3);
    }

    #[test]
    fn failed_load_is_reported_and_clears_view() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(DatasetCache::new(Sources::from_dir(dir.path())));
        let mut state = AppState::new(cache);
        state.load();
        assert!(state.dataset.is_none());
        assert!(state.view.is_none());
        assert!(state.status_message.as_deref().unwrap().contains("day.csv"));
    }
}
