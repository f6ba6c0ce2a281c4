//! Multi-device reading consolidation
//!
//! Users often wear more than one tracker: a Garmin watch for workouts, a
//! phone feeding Apple Health, a Fitbit for sleep. Each device syncs its own
//! daily reading, so a single calendar day can have several partially
//! overlapping records. This module merges them into one authoritative
//! `ConsolidatedReading` per day.
//!
//! # Merge rules
//!
//! - Scalar metrics reported by exactly one device are taken verbatim.
//! - Metrics reported by several devices are combined with a priority-weighted
//!   average (Garmin 3, Apple Health 2, Fitbit 1 by default), rounded to the
//!   nearest integer.
//! - Sleep stage breakdowns are never averaged; the block from the
//!   highest-priority device wins outright.
//! - Workout sessions are discrete events, not measurements: the union is
//!   taken and duplicates (same start time and type) collapse to the entry
//!   from the highest-priority device.
//!
//! Consolidation is a pure function of its inputs. Missing or implausible
//! values contribute nothing; they are never defaulted to zero.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::models::{ConsolidatedReading, DeviceReading, DeviceType, ScalarMetric};

/// Trust weights per device family, highest wins
///
/// Defaults follow the product's accuracy ranking (Garmin > Apple Health >
/// Fitbit). Unrecognized devices always weigh 0 and only ever contribute when
/// they are the sole reporter of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePriorities {
    pub garmin: u32,
    pub apple_health: u32,
    pub fitbit: u32,
}

impl Default for DevicePriorities {
    fn default() -> Self {
        Self {
            garmin: 3,
            apple_health: 2,
            fitbit: 1,
        }
    }
}

impl DevicePriorities {
    /// Weight assigned to a device family
    pub fn weight(&self, device: DeviceType) -> u32 {
        match device {
            DeviceType::Garmin => self.garmin,
            DeviceType::AppleHealth => self.apple_health,
            DeviceType::Fitbit => self.fitbit,
            DeviceType::Other => 0,
        }
    }
}

/// Merges same-day readings from multiple devices into one record
#[derive(Debug, Clone, Default)]
pub struct DeviceConsolidator {
    priorities: DevicePriorities,
}

impl DeviceConsolidator {
    /// Consolidator with the default device priorities
    pub fn new() -> Self {
        Self::default()
    }

    /// Consolidator with custom priority weights
    pub fn with_priorities(priorities: DevicePriorities) -> Self {
        Self { priorities }
    }

    /// Merge all readings for one calendar day
    ///
    /// Readings are expected to share a date (see `import::group_by_date`);
    /// the output takes its date from the first reading. An empty slice
    /// yields `None`; a day with no data is absence, not an error.
    pub fn consolidate(&self, readings: &[DeviceReading]) -> Option<ConsolidatedReading> {
        let first = readings.first()?;
        let mut result = ConsolidatedReading::empty(first.date);

        debug!(
            date = %first.date,
            readings = readings.len(),
            "consolidating device readings"
        );

        let mut contributors: Vec<DeviceType> = Vec::new();
        for metric in ScalarMetric::ALL {
            self.merge_metric(metric, readings, &mut result, &mut contributors);
        }
        self.pick_sleep_stages(readings, &mut result, &mut contributors);
        self.merge_workouts(readings, &mut result, &mut contributors);

        contributors.sort_by_key(|d| std::cmp::Reverse(self.priorities.weight(*d)));
        result.devices_used = contributors;
        Some(result)
    }

    /// Merge one scalar metric across readings
    ///
    /// Contributors are readings whose sanitized value is present and
    /// strictly positive. One contributor keeps its value verbatim; several
    /// are combined by priority-weighted average, rounded to the nearest
    /// integer.
    fn merge_metric(
        &self,
        metric: ScalarMetric,
        readings: &[DeviceReading],
        result: &mut ConsolidatedReading,
        contributors: &mut Vec<DeviceType>,
    ) {
        let values: Vec<(DeviceType, f64)> = readings
            .iter()
            .filter_map(|r| {
                r.raw_metric(metric)
                    .and_then(|v| metric.sanitize(v))
                    .filter(|v| *v > 0.0)
                    .map(|v| (r.device_type, v))
            })
            .collect();

        match values.as_slice() {
            [] => return,
            [(device, value)] => {
                result.set_metric(metric, *value);
                result.metric_sources.insert(metric, vec![*device]);
            }
            many => {
                let value = self.weighted_average(many);
                trace!(metric = %metric, value, sources = many.len(), "weighted metric merge");
                result.set_metric(metric, value);
                result
                    .metric_sources
                    .insert(metric, many.iter().map(|(d, _)| *d).collect());
            }
        }
        for (device, _) in &values {
            if !contributors.contains(device) {
                contributors.push(*device);
            }
        }
    }

    /// Priority-weighted average, rounded to the nearest integer
    ///
    /// Matched devices always carry priority >= 1, so the total weight cannot
    /// be zero unless every contributor is an unrecognized device; that case
    /// falls back to a plain arithmetic mean.
    fn weighted_average(&self, contributors: &[(DeviceType, f64)]) -> f64 {
        let total_weight: u32 = contributors
            .iter()
            .map(|(d, _)| self.priorities.weight(*d))
            .sum();

        if total_weight == 0 {
            let mean =
                contributors.iter().map(|(_, v)| v).sum::<f64>() / contributors.len() as f64;
            return mean.round();
        }

        let weighted_sum: f64 = contributors
            .iter()
            .map(|(d, v)| v * self.priorities.weight(*d) as f64)
            .sum();
        (weighted_sum / total_weight as f64).round()
    }

    /// Take the sleep stage block from the highest-priority device that has
    /// one; stage breakdowns are internally consistent per device and do not
    /// average meaningfully.
    fn pick_sleep_stages(
        &self,
        readings: &[DeviceReading],
        result: &mut ConsolidatedReading,
        contributors: &mut Vec<DeviceType>,
    ) {
        let mut by_priority: Vec<&DeviceReading> = readings.iter().collect();
        by_priority.sort_by_key(|r| std::cmp::Reverse(self.priorities.weight(r.device_type)));

        if let Some(donor) = by_priority.iter().find(|r| r.sleep_stages.is_some()) {
            result.sleep_stages = donor.sleep_stages.clone();
            if !contributors.contains(&donor.device_type) {
                contributors.push(donor.device_type);
            }
        }
    }

    /// Union of workout sessions, deduplicated by `(startTime, type)`
    ///
    /// A session is a discrete event: when two devices report the same one,
    /// the copy from the higher-priority device wins outright rather than
    /// being averaged. Output is ordered by start time.
    fn merge_workouts(
        &self,
        readings: &[DeviceReading],
        result: &mut ConsolidatedReading,
        contributors: &mut Vec<DeviceType>,
    ) {
        let mut by_priority: Vec<&DeviceReading> = readings.iter().collect();
        by_priority.sort_by_key(|r| std::cmp::Reverse(self.priorities.weight(r.device_type)));

        let mut seen: HashMap<(String, String), crate::models::WorkoutSession> = HashMap::new();
        for reading in by_priority {
            for session in &reading.workout_sessions {
                let key = (session.start_time.clone(), session.kind.clone());
                // First insert wins; readings are visited highest priority first
                if !seen.contains_key(&key) {
                    seen.insert(key, session.clone());
                    if !contributors.contains(&reading.device_type) {
                        contributors.push(reading.device_type);
                    }
                }
            }
        }

        let mut sessions: Vec<_> = seen.into_values().collect();
        sessions.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.kind.cmp(&b.kind))
        });
        result.workout_sessions = sessions;
    }
}
