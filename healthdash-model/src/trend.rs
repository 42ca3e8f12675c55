use chrono::NaiveDate;
use rustc_hash::FxHashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::measurement::MeasurementRecord;

/// Which way a metric moved between its previous and latest readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    Increase,
    Decrease,
    Unchanged,
}

/// The change between the two most recent readings of one metric type.
/// `magnitude` is already rounded to one decimal place for display.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Change {
    pub magnitude: f64,
    pub direction: Direction,
}

/// One reading of a mini-chart series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Splits a list of records into the latest and the immediately preceding
/// reading per metric-type name.
///
/// Precondition: `records` is already sorted by (date descending, creation
/// time descending); no sorting happens here. The repository read path
/// guarantees this order.
///
/// Types with a single record appear only in the latest map; types with no
/// records appear in neither.
pub fn select_latest_and_previous(
    records: &[MeasurementRecord],
) -> (
    FxHashMap<String, MeasurementRecord>,
    FxHashMap<String, MeasurementRecord>,
) {
    let mut latest = FxHashMap::default();
    let mut previous = FxHashMap::default();

    for record in records {
        if !latest.contains_key(&record.type_name) {
            latest.insert(record.type_name.clone(), record.clone());
        } else if !previous.contains_key(&record.type_name) {
            previous.insert(record.type_name.clone(), record.clone());
        }
    }

    (latest, previous)
}

/// Computes the change indicator between the latest and previous readings of
/// the same metric type. Returns `None` when either reading is absent.
///
/// An equal pair yields `Direction::Unchanged`; hiding that indicator is the
/// renderer's display rule, not a computation failure.
pub fn compute_change(
    latest: Option<&MeasurementRecord>,
    previous: Option<&MeasurementRecord>,
) -> Option<Change> {
    let (latest, previous) = (latest?, previous?);
    let delta = latest.value - previous.value;

    let direction = if delta > 0.0 {
        Direction::Increase
    } else if delta < 0.0 {
        Direction::Decrease
    } else {
        Direction::Unchanged
    };

    Some(Change {
        magnitude: (delta.abs() * 10.0).round() / 10.0,
        direction,
    })
}

/// The last `points` readings of one metric type, oldest first, for the mini
/// chart. Input follows the same newest-first ordering as the selector.
pub fn recent_series(
    records: &[MeasurementRecord],
    type_name: &str,
    points: usize,
) -> Vec<SeriesPoint> {
    let mut series: Vec<SeriesPoint> = records
        .iter()
        .filter(|record| record.type_name == type_name)
        .take(points)
        .map(|record| SeriesPoint {
            date: record.date,
            value: record.value,
        })
        .collect();
    series.reverse();
    series
}
