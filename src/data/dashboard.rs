use super::aggregate::{aggregate, pivot, AggOp, GroupedTable, Matrix};
use super::category::{season_order, WEEKDAY_ORDER};
use super::filter::{filter, FilterCriteria};
use super::model::{BikeDataset, Dimension, Measure, RentalTable};

const USERS: [Measure; 2] = [Measure::Casual, Measure::Registered];

/// Headline metrics of the filtered daily table. `None` when nothing matched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub total_rentals: Option<f64>,
    pub mean_daily_rentals: Option<f64>,
    pub casual_rentals: Option<f64>,
    pub registered_rentals: Option<f64>,
}

/// Every derived table the dashboard shows for one criteria value.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub criteria: FilterCriteria,
    pub daily_rows: usize,
    pub hourly_rows: usize,

    pub summary: Summary,
    pub by_season: GroupedTable,
    pub by_weather: GroupedTable,
    pub season_weather: GroupedTable,
    pub monthly_by_season: GroupedTable,
    pub monthly_by_weather: GroupedTable,
    pub hourly: GroupedTable,
    pub hour_weekday: Matrix,

    pub user_totals: GroupedTable,
    pub season_users: GroupedTable,
    pub weekday_users: GroupedTable,
    pub hourly_users: GroupedTable,
    pub workingday_users: GroupedTable,
    pub weather_users: GroupedTable,
}

impl DashboardView {
    /// Filter both tables once, then derive every chart table from them.
    pub fn compute(dataset: &BikeDataset, criteria: &FilterCriteria) -> Self {
        let day = filter(&dataset.daily, criteria);
        let hour = filter(&dataset.hourly, criteria);
        log::debug!(
            "Recomputing dashboard: {} daily / {} hourly records match",
            day.len(),
            hour.len()
        );

        let seasons = season_order();
        let total = [Measure::Total];

        Self {
            criteria: criteria.clone(),
            daily_rows: day.len(),
            hourly_rows: hour.len(),

            summary: summarize(&day),
            by_season: aggregate(&day, &[Dimension::Season], &total, AggOp::Mean)
                .in_order(Dimension::Season, &seasons),
            by_weather: aggregate(&day, &[Dimension::Weather], &total, AggOp::Mean),
            season_weather: aggregate(
                &day,
                &[Dimension::Season, Dimension::Weather],
                &total,
                AggOp::Mean,
            )
            .in_order(Dimension::Season, &seasons),
            monthly_by_season: aggregate(
                &day,
                &[Dimension::Month, Dimension::MonthName, Dimension::Season],
                &total,
                AggOp::Mean,
            ),
            monthly_by_weather: aggregate(
                &day,
                &[Dimension::Month, Dimension::MonthName, Dimension::Weather],
                &total,
                AggOp::Mean,
            ),
            hourly: aggregate(&hour, &[Dimension::Hour], &total, AggOp::Mean),
            hour_weekday: pivot(&hour, Dimension::Hour, Dimension::Weekday, Measure::Total),

            user_totals: aggregate(&day, &[], &USERS, AggOp::Sum),
            season_users: aggregate(&day, &[Dimension::Season], &USERS, AggOp::Mean)
                .in_order(Dimension::Season, &seasons),
            weekday_users: aggregate(&day, &[Dimension::WeekdayName], &USERS, AggOp::Mean)
                .in_order(Dimension::WeekdayName, &WEEKDAY_ORDER),
            hourly_users: aggregate(&hour, &[Dimension::Hour], &USERS, AggOp::Mean),
            workingday_users: aggregate(&day, &[Dimension::WorkingDay], &USERS, AggOp::Mean),
            weather_users: aggregate(&day, &[Dimension::Weather], &USERS, AggOp::Mean),
        }
    }

    /// Casual / registered share of all rentals in percent.
    pub fn user_share(&self) -> Option<(f64, f64)> {
        let row = self.user_totals.rows.first()?;
        let casual = self.user_totals.value(row, Measure::Casual)?;
        let registered = self.user_totals.value(row, Measure::Registered)?;
        let all = casual + registered;
        if all <= 0.0 {
            return None;
        }
        Some((casual * 100.0 / all, registered * 100.0 / all))
    }
}

fn summarize(day: &RentalTable) -> Summary {
    let sums = aggregate(day, &[], &[Measure::Total, Measure::Casual, Measure::Registered], AggOp::Sum);
    let means = aggregate(day, &[], &[Measure::Total], AggOp::Mean);
    let sum_of = |m| sums.rows.first().and_then(|r| sums.value(r, m));

    Summary {
        total_rentals: sum_of(Measure::Total),
        mean_daily_rentals: means.rows.first().and_then(|r| means.value(r, Measure::Total)),
        casual_rentals: sum_of(Measure::Casual),
        registered_rentals: sum_of(Measure::Registered),
    }
}
