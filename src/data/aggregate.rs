use std::collections::{BTreeMap, BTreeSet};

use super::model::{Dimension, Key, Measure, RentalTable};

// ---------------------------------------------------------------------------
// Grouped aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    Mean,
    Sum,
}

/// One output row: the group's key tuple and one value per measure.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub keys: Vec<Key>,
    pub values: Vec<f64>,
}

/// Result of [`aggregate`]: one row per distinct key tuple of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTable {
    pub group_keys: Vec<Dimension>,
    pub value_keys: Vec<Measure>,
    pub op: AggOp,
    pub rows: Vec<GroupRow>,
}

impl GroupedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row whose key tuple equals `keys`.
    pub fn find(&self, keys: &[Key]) -> Option<&GroupRow> {
        self.rows.iter().find(|r| r.keys == keys)
    }

    /// Value of `measure` in `row`, `None` if the measure was not aggregated.
    pub fn value(&self, row: &GroupRow, measure: Measure) -> Option<f64> {
        let idx = self.value_keys.iter().position(|m| *m == measure)?;
        row.values.get(idx).copied()
    }

    /// Reorder rows by the position of their `dimension` label in `order`.
    /// Rows whose label is not listed keep their relative order at the end.
    pub fn in_order(mut self, dimension: Dimension, order: &[&str]) -> Self {
        let Some(idx) = self.group_keys.iter().position(|d| *d == dimension) else {
            return self;
        };
        self.rows.sort_by_key(|row| {
            row.keys
                .get(idx)
                .and_then(Key::as_label)
                .and_then(|label| order.iter().position(|o| *o == label))
                .unwrap_or(order.len())
        });
        self
    }
}

/// Group `table` by `group_keys` and compute `op` over each of `value_keys`.
///
/// Records with a null key in any requested dimension are left out. Rows come
/// out in ascending key order. An empty input gives an empty table; with no
/// group keys a non-empty input gives exactly one row.
pub fn aggregate(
    table: &RentalTable,
    group_keys: &[Dimension],
    value_keys: &[Measure],
    op: AggOp,
) -> GroupedTable {
    let mut groups: BTreeMap<Vec<Key>, (usize, Vec<f64>)> = BTreeMap::new();

    for record in &table.records {
        let keys: Vec<Key> = group_keys.iter().map(|d| d.key(record)).collect();
        if keys.iter().any(Key::is_null) {
            continue;
        }
        let (count, sums) = groups
            .entry(keys)
            .or_insert_with(|| (0, vec![0.0; value_keys.len()]));
        *count += 1;
        for (sum, measure) in sums.iter_mut().zip(value_keys) {
            *sum += measure.value(record);
        }
    }

    let rows = groups
        .into_iter()
        .map(|(keys, (count, sums))| {
            let values = match op {
                AggOp::Sum => sums,
                // count >= 1: groups only exist for present records
                AggOp::Mean => sums.into_iter().map(|s| s / count as f64).collect(),
            };
            GroupRow { keys, values }
        })
        .collect();

    GroupedTable {
        group_keys: group_keys.to_vec(),
        value_keys: value_keys.to_vec(),
        op,
        rows,
    }
}

// ---------------------------------------------------------------------------
// Pivot
// ---------------------------------------------------------------------------

/// A 2-D table of means. Missing combinations are `None`, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub row_key: Dimension,
    pub col_key: Dimension,
    pub value_key: Measure,
    pub rows: Vec<Key>,
    pub cols: Vec<Key>,
    cells: Vec<Vec<Option<f64>>>,
}

impl Matrix {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell by row/column position.
    pub fn cell(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row)?.get(col).copied().flatten()
    }

    /// Cell by row/column key.
    pub fn get(&self, row: &Key, col: &Key) -> Option<f64> {
        let r = self.rows.iter().position(|k| k == row)?;
        let c = self.cols.iter().position(|k| k == col)?;
        self.cell(r, c)
    }

    /// Smallest and largest present cell, used for colour scaling.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Mean of `value_key` for every (`row_key`, `col_key`) combination.
pub fn pivot(
    table: &RentalTable,
    row_key: Dimension,
    col_key: Dimension,
    value_key: Measure,
) -> Matrix {
    let grouped = aggregate(table, &[row_key, col_key], &[value_key], AggOp::Mean);

    let rows: Vec<Key> = grouped
        .rows
        .iter()
        .map(|r| r.keys[0])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let cols: Vec<Key> = grouped
        .rows
        .iter()
        .map(|r| r.keys[1])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut cells = vec![vec![None; cols.len()]; rows.len()];
    for row in &grouped.rows {
        let (Some(r), Some(c)) = (
            rows.iter().position(|k| *k == row.keys[0]),
            cols.iter().position(|k| *k == row.keys[1]),
        ) else {
            continue;
        };
        cells[r][c] = row.values.first().copied();
    }

    Matrix {
        row_key,
        col_key,
        value_key,
        rows,
        cols,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;
    use crate::data::model::{Granularity, RentalRecord};
    use proptest::prelude::*;

    fn table(records: Vec<RentalRecord>) -> RentalTable {
        RentalTable::new(Granularity::Daily, records)
    }

    fn hourly(hour: u8, weekday: u8, cnt: u32) -> RentalRecord {
        let mut r = record((2011, 1, 1), 1, 1, 0, cnt);
        r.hour = Some(hour);
        r.weekday = weekday;
        r.with_labels(Granularity::Hourly)
    }

    #[test]
    fn mean_by_season() {
        // Fall/Clear cnt 200 and Fall/Misty cnt 100
        let t = table(vec![
            record((2011, 9, 30), 3, 1, 50, 150),
            record((2011, 10, 1), 3, 2, 40, 60),
        ]);
        let g = aggregate(&t, &[Dimension::Season], &[Measure::Total], AggOp::Mean);
        assert_eq!(g.len(), 1);
        assert_eq!(g.rows[0].keys, vec![Key::Label("Fall")]);
        assert_eq!(g.rows[0].values, vec![150.0]);
    }

    #[test]
    fn sum_over_several_measures() {
        let t = table(vec![
            record((2011, 1, 1), 1, 1, 10, 20),
            record((2011, 1, 2), 1, 1, 5, 15),
        ]);
        let g = aggregate(
            &t,
            &[],
            &[Measure::Casual, Measure::Registered, Measure::Total],
            AggOp::Sum,
        );
        assert_eq!(g.len(), 1);
        assert!(g.rows[0].keys.is_empty());
        assert_eq!(g.rows[0].values, vec![15.0, 35.0, 50.0]);
        assert_eq!(g.value(&g.rows[0], Measure::Registered), Some(35.0));
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let t = table(vec![]);
        assert!(aggregate(&t, &[], &[Measure::Total], AggOp::Mean).is_empty());
        assert!(aggregate(&t, &[Dimension::Season], &[Measure::Total], AggOp::Sum).is_empty());
        assert!(pivot(&t, Dimension::Hour, Dimension::Weekday, Measure::Total).is_empty());
    }

    #[test]
    fn null_keys_are_dropped() {
        let t = table(vec![
            record((2011, 1, 1), 1, 1, 1, 1),
            record((2011, 1, 2), 9, 1, 1, 1),
        ]);
        let g = aggregate(&t, &[Dimension::Season], &[Measure::Total], AggOp::Sum);
        assert_eq!(g.len(), 1);
        assert_eq!(g.rows[0].values, vec![2.0]);
    }

    #[test]
    fn multi_key_grouping() {
        let t = table(vec![
            record((2011, 1, 1), 1, 1, 0, 10),
            record((2011, 1, 15), 1, 2, 0, 20),
            record((2011, 2, 1), 1, 1, 0, 30),
        ]);
        let g = aggregate(
            &t,
            &[Dimension::Month, Dimension::MonthName, Dimension::Season],
            &[Measure::Total],
            AggOp::Mean,
        );
        assert_eq!(g.len(), 2);
        let jan = g
            .find(&[Key::Integer(1), Key::Label("Jan"), Key::Label("Spring")])
            .unwrap();
        assert_eq!(jan.values, vec![15.0]);
    }

    #[test]
    fn display_order_is_imposed() {
        let t = table(vec![
            record((2011, 1, 1), 4, 1, 0, 1),
            record((2011, 1, 1), 1, 1, 0, 1),
            record((2011, 1, 1), 3, 1, 0, 1),
            record((2011, 1, 1), 2, 1, 0, 1),
        ]);
        let g = aggregate(&t, &[Dimension::Season], &[Measure::Total], AggOp::Mean)
            .in_order(Dimension::Season, &["Spring", "Summer", "Fall", "Winter"]);
        let labels: Vec<_> = g.rows.iter().map(|r| r.keys[0].to_string()).collect();
        assert_eq!(labels, ["Spring", "Summer", "Fall", "Winter"]);
    }

    #[test]
    fn pivot_distinguishes_missing_from_zero() {
        let t = RentalTable::new(
            Granularity::Hourly,
            vec![
                hourly(5, 1, 10),
                hourly(5, 1, 20),
                hourly(6, 2, 0),
                hourly(6, 1, 4),
            ],
        );
        let m = pivot(&t, Dimension::Hour, Dimension::Weekday, Measure::Total);
        assert_eq!(m.rows, vec![Key::Integer(5), Key::Integer(6)]);
        assert_eq!(m.cols, vec![Key::Integer(1), Key::Integer(2)]);
        assert_eq!(m.get(&Key::Integer(5), &Key::Integer(1)), Some(15.0));
        assert_eq!(m.get(&Key::Integer(5), &Key::Integer(2)), None);
        assert_eq!(m.get(&Key::Integer(6), &Key::Integer(2)), Some(0.0));
        assert_eq!(m.value_range(), Some((0.0, 15.0)));
    }

    proptest! {
        #[test]
        fn one_row_per_distinct_key(
            codes in proptest::collection::vec((1u8..5, 1u8..5, 0u32..100), 0..50),
        ) {
            let t = table(
                codes
                    .iter()
                    .map(|&(s, w, c)| record((2011, 1, 1), s, w, c, c))
                    .collect(),
            );
            let g = aggregate(&t, &[Dimension::Season, Dimension::Weather], &[Measure::Total], AggOp::Mean);
            let distinct: BTreeSet<(u8, u8)> = codes.iter().map(|&(s, w, _)| (s, w)).collect();
            prop_assert_eq!(g.len(), distinct.len());
            prop_assert!(g.len() <= t.len());
        }
    }
}
