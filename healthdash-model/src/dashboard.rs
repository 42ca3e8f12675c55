use rustc_hash::FxHashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::measurement::{MeasurementRecord, MeasurementType};
use crate::trend::{self, Change, SeriesPoint};

/// Snapshot of everything the dashboard shows for one user. Transitions are
/// pure; callers replace their snapshot on a successful reload and keep the
/// old one when a reload fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub types: Vec<MeasurementType>,
    pub latest: FxHashMap<String, MeasurementRecord>,
    pub previous: FxHashMap<String, MeasurementRecord>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types(mut self, types: Vec<MeasurementType>) -> Self {
        self.types = types;
        self
    }

    /// Rebuilds the per-type latest/previous mappings from a fresh read.
    /// `records` must follow the repository's newest-first ordering.
    pub fn with_records(mut self, records: &[MeasurementRecord]) -> Self {
        let (latest, previous) = trend::select_latest_and_previous(records);
        self.latest = latest;
        self.previous = previous;
        self
    }

    /// Drops all user data while keeping the reference types, as happens on
    /// sign-out.
    pub fn cleared(self) -> Self {
        Self {
            types: self.types,
            ..Self::default()
        }
    }

    pub fn change_for(&self, type_name: &str) -> Option<Change> {
        trend::compute_change(self.latest.get(type_name), self.previous.get(type_name))
    }
}

/// One dashboard widget: a metric type with its two most recent readings,
/// the change between them and a short history series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Widget {
    pub measurement_type: MeasurementType,
    pub latest: Option<MeasurementRecord>,
    pub previous: Option<MeasurementRecord>,
    pub change: Option<Change>,
    pub series: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DashboardSummary {
    pub widgets: Vec<Widget>,
}

impl DashboardSummary {
    pub const SERIES_POINTS: usize = 7;

    /// Assembles the full dashboard from one read of the reference types and
    /// one read of the user's records (newest first). Every known type gets
    /// a widget even when it has no readings yet.
    pub fn build(types: Vec<MeasurementType>, records: &[MeasurementRecord]) -> Self {
        let state = DashboardState::new()
            .with_types(types)
            .with_records(records);
        Self::from_state(&state, records)
    }

    pub fn from_state(state: &DashboardState, records: &[MeasurementRecord]) -> Self {
        let widgets = state
            .types
            .iter()
            .map(|measurement_type| Widget {
                change: state.change_for(&measurement_type.name),
                latest: state.latest.get(&measurement_type.name).cloned(),
                previous: state.previous.get(&measurement_type.name).cloned(),
                series: trend::recent_series(
                    records,
                    &measurement_type.name,
                    Self::SERIES_POINTS,
                ),
                measurement_type: measurement_type.clone(),
            })
            .collect();

        Self { widgets }
    }
}
