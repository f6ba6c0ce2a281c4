//! Core data model for wearable readings and nutrition targets
//!
//! A `DeviceReading` is one day's metrics as reported by a single connected
//! device. Several devices may report for the same calendar day; the
//! consolidation module merges those into a single `ConsolidatedReading`.
//!
//! Wire-facing types use camelCase field names because the upstream sync
//! process exports camelCase JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Wearable device families supported by the sync process
///
/// The variant order mirrors the default trust ranking: Garmin readings are
/// considered the most accurate, then Apple Health, then Fitbit. Device types
/// the sync process reports that we do not recognize deserialize to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Garmin,
    AppleHealth,
    Fitbit,
    #[serde(other)]
    Other,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Garmin => write!(f, "garmin"),
            DeviceType::AppleHealth => write!(f, "apple_health"),
            DeviceType::Fitbit => write!(f, "fitbit"),
            DeviceType::Other => write!(f, "other"),
        }
    }
}

/// The scalar metrics a reading can carry
///
/// Used to iterate the metric fields generically during consolidation and to
/// key the `metricSources` transparency map.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ScalarMetric {
    Steps,
    CaloriesBurned,
    ActiveMinutes,
    HeartRateAvg,
    HeartRateVariability,
    SleepHours,
    RecoveryScore,
    StressLevel,
}

impl ScalarMetric {
    /// All scalar metrics, in wire order
    pub const ALL: [ScalarMetric; 8] = [
        ScalarMetric::Steps,
        ScalarMetric::CaloriesBurned,
        ScalarMetric::ActiveMinutes,
        ScalarMetric::HeartRateAvg,
        ScalarMetric::HeartRateVariability,
        ScalarMetric::SleepHours,
        ScalarMetric::RecoveryScore,
        ScalarMetric::StressLevel,
    ];

    /// Wire name of the metric (camelCase, matching the sync format)
    pub fn name(&self) -> &'static str {
        match self {
            ScalarMetric::Steps => "steps",
            ScalarMetric::CaloriesBurned => "caloriesBurned",
            ScalarMetric::ActiveMinutes => "activeMinutes",
            ScalarMetric::HeartRateAvg => "heartRateAvg",
            ScalarMetric::HeartRateVariability => "heartRateVariability",
            ScalarMetric::SleepHours => "sleepHours",
            ScalarMetric::RecoveryScore => "recoveryScore",
            ScalarMetric::StressLevel => "stressLevel",
        }
    }

    /// Upper plausibility bound for the metric, if it has one
    ///
    /// Recovery score is device-reported on a 0-100 scale and stress on 0-10.
    /// The open-ended metrics (steps, calories, minutes, HR, sleep) have no
    /// hard ceiling here.
    fn max_valid(&self) -> Option<f64> {
        match self {
            ScalarMetric::RecoveryScore => Some(100.0),
            ScalarMetric::StressLevel => Some(10.0),
            _ => None,
        }
    }

    /// Sanitize a raw value: out-of-range or non-finite values indicate
    /// corrupt upstream data and are treated as absent, not propagated.
    pub fn sanitize(&self, value: f64) -> Option<f64> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        if let Some(max) = self.max_valid() {
            if value > max {
                return None;
            }
        }
        Some(value)
    }
}

impl fmt::Display for ScalarMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Sleep stage breakdown in hours, as reported by a single device
///
/// Stage breakdowns are never merged across devices; consolidation picks the
/// block from the highest-priority device that reported one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepStages {
    /// Deep (slow-wave) sleep hours
    pub deep_sleep: Option<f64>,

    /// REM sleep hours
    pub rem_sleep: Option<f64>,

    /// Light (NREM 1 & 2) sleep hours
    pub light_sleep: Option<f64>,

    /// Time awake during the sleep window, in hours
    pub awake: Option<f64>,
}

/// A discrete workout session within a reading
///
/// Identity is the `(start_time, kind)` pair: two devices reporting the same
/// session produce entries with matching start time and type, and
/// consolidation keeps exactly one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    /// Activity type as reported (e.g. "running", "cycling")
    #[serde(rename = "type")]
    pub kind: String,

    /// Session start timestamp, kept verbatim as the device reported it
    pub start_time: String,

    /// Duration in minutes
    pub duration: Option<f64>,

    /// Energy expenditure for the session in kcal
    pub calories: Option<f64>,

    /// Reported intensity label (e.g. "low", "moderate", "high")
    pub intensity: Option<String>,

    /// Originating device or app name
    pub source: Option<String>,
}

impl WorkoutSession {
    /// Deduplication key for cross-device session matching
    pub fn identity(&self) -> (&str, &str) {
        (self.start_time.as_str(), self.kind.as_str())
    }
}

/// One day's metrics from one wearable device
///
/// Created by the external sync process and read-only to this crate. Every
/// metric is optional; devices report whatever subset they track. Multiple
/// readings may share a `date` (one per connected device).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceReading {
    /// Calendar day the metrics cover (the aggregation key)
    pub date: NaiveDate,

    /// Which device family produced this reading
    pub device_type: DeviceType,

    /// Total step count
    pub steps: Option<f64>,

    /// Total energy expenditure estimate in kcal (including basal burn)
    pub calories_burned: Option<f64>,

    /// Minutes of moderate-or-higher activity
    pub active_minutes: Option<f64>,

    /// Average heart rate in bpm
    pub heart_rate_avg: Option<f64>,

    /// Heart rate variability in milliseconds
    pub heart_rate_variability: Option<f64>,

    /// Total sleep duration in hours
    pub sleep_hours: Option<f64>,

    /// Device-reported readiness/recovery estimate (0-100)
    pub recovery_score: Option<f64>,

    /// Device-reported stress estimate (0-10)
    pub stress_level: Option<f64>,

    /// Sleep stage breakdown, if the device tracks stages
    pub sleep_stages: Option<SleepStages>,

    /// Workout sessions recorded on this day
    #[serde(default)]
    pub workout_sessions: Vec<WorkoutSession>,
}

impl DeviceReading {
    /// A reading with only the date and device set, for building up in
    /// importers and tests
    pub fn empty(date: NaiveDate, device_type: DeviceType) -> Self {
        Self {
            date,
            device_type,
            steps: None,
            calories_burned: None,
            active_minutes: None,
            heart_rate_avg: None,
            heart_rate_variability: None,
            sleep_hours: None,
            recovery_score: None,
            stress_level: None,
            sleep_stages: None,
            workout_sessions: Vec::new(),
        }
    }

    /// Raw value of a scalar metric field
    pub fn raw_metric(&self, metric: ScalarMetric) -> Option<f64> {
        match metric {
            ScalarMetric::Steps => self.steps,
            ScalarMetric::CaloriesBurned => self.calories_burned,
            ScalarMetric::ActiveMinutes => self.active_minutes,
            ScalarMetric::HeartRateAvg => self.heart_rate_avg,
            ScalarMetric::HeartRateVariability => self.heart_rate_variability,
            ScalarMetric::SleepHours => self.sleep_hours,
            ScalarMetric::RecoveryScore => self.recovery_score,
            ScalarMetric::StressLevel => self.stress_level,
        }
    }
}

/// One merged record per date combining all of that day's device readings
///
/// Derived by the consolidation module, never persisted by this crate. A
/// metric present in at least one source with a positive value carries either
/// the sole value or the priority-weighted average; metrics absent from all
/// sources stay absent, never defaulted to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedReading {
    /// Calendar day this record covers
    pub date: NaiveDate,

    pub steps: Option<f64>,
    pub calories_burned: Option<f64>,
    pub active_minutes: Option<f64>,
    pub heart_rate_avg: Option<f64>,
    pub heart_rate_variability: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub recovery_score: Option<f64>,
    pub stress_level: Option<f64>,

    /// Stage breakdown from the highest-priority device that reported one
    pub sleep_stages: Option<SleepStages>,

    /// Union of workout sessions across devices, deduplicated by identity
    #[serde(default)]
    pub workout_sessions: Vec<WorkoutSession>,

    /// Deduplicated set of device types that contributed anything
    pub devices_used: Vec<DeviceType>,

    /// For each emitted metric, the devices that contributed to its value
    /// (surfaced in the UI so users can see where a number came from)
    pub metric_sources: BTreeMap<ScalarMetric, Vec<DeviceType>>,
}

impl ConsolidatedReading {
    /// An empty consolidated record for the given date
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            steps: None,
            calories_burned: None,
            active_minutes: None,
            heart_rate_avg: None,
            heart_rate_variability: None,
            sleep_hours: None,
            recovery_score: None,
            stress_level: None,
            sleep_stages: None,
            workout_sessions: Vec::new(),
            devices_used: Vec::new(),
            metric_sources: BTreeMap::new(),
        }
    }

    /// Raw value of a scalar metric field
    pub fn raw_metric(&self, metric: ScalarMetric) -> Option<f64> {
        match metric {
            ScalarMetric::Steps => self.steps,
            ScalarMetric::CaloriesBurned => self.calories_burned,
            ScalarMetric::ActiveMinutes => self.active_minutes,
            ScalarMetric::HeartRateAvg => self.heart_rate_avg,
            ScalarMetric::HeartRateVariability => self.heart_rate_variability,
            ScalarMetric::SleepHours => self.sleep_hours,
            ScalarMetric::RecoveryScore => self.recovery_score,
            ScalarMetric::StressLevel => self.stress_level,
        }
    }

    pub(crate) fn set_metric(&mut self, metric: ScalarMetric, value: f64) {
        let slot = match metric {
            ScalarMetric::Steps => &mut self.steps,
            ScalarMetric::CaloriesBurned => &mut self.calories_burned,
            ScalarMetric::ActiveMinutes => &mut self.active_minutes,
            ScalarMetric::HeartRateAvg => &mut self.heart_rate_avg,
            ScalarMetric::HeartRateVariability => &mut self.heart_rate_variability,
            ScalarMetric::SleepHours => &mut self.sleep_hours,
            ScalarMetric::RecoveryScore => &mut self.recovery_score,
            ScalarMetric::StressLevel => &mut self.stress_level,
        };
        *slot = Some(value);
    }
}

/// Anything shaped like a day of wearable data
///
/// The target adjuster accepts either a raw `DeviceReading` or a
/// `ConsolidatedReading` through this trait. Implementations return raw
/// stored values; callers sanitize via [`ScalarMetric::sanitize`].
pub trait WearableMetrics {
    fn metric(&self, metric: ScalarMetric) -> Option<f64>;
    fn sleep_stages(&self) -> Option<&SleepStages>;
    fn workout_sessions(&self) -> &[WorkoutSession];
}

impl WearableMetrics for DeviceReading {
    fn metric(&self, metric: ScalarMetric) -> Option<f64> {
        self.raw_metric(metric)
    }

    fn sleep_stages(&self) -> Option<&SleepStages> {
        self.sleep_stages.as_ref()
    }

    fn workout_sessions(&self) -> &[WorkoutSession] {
        &self.workout_sessions
    }
}

impl WearableMetrics for ConsolidatedReading {
    fn metric(&self, metric: ScalarMetric) -> Option<f64> {
        self.raw_metric(metric)
    }

    fn sleep_stages(&self) -> Option<&SleepStages> {
        self.sleep_stages.as_ref()
    }

    fn workout_sessions(&self) -> &[WorkoutSession] {
        &self.workout_sessions
    }
}

/// A user's static daily nutrition goals before any activity adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseTargets {
    /// Daily calorie goal in kcal
    pub target_calories: u32,

    /// Daily protein goal in grams
    pub target_protein: u32,

    /// Daily carbohydrate goal in grams
    pub target_carbs: u32,

    /// Daily fat goal in grams
    pub target_fat: u32,
}

/// Raw per-macro deltas applied on top of the base targets, kept for
/// display and audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroAdjustments {
    /// Calorie delta in kcal
    pub calories: i32,

    /// Protein delta in grams
    pub protein: i32,

    /// Carbohydrate delta in grams
    pub carbs: i32,

    /// Fat delta in grams
    pub fat: i32,
}

/// Activity-adjusted daily targets: base goals plus computed deltas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustedTargets {
    /// Adjusted calorie target in kcal
    pub calories: u32,

    /// Adjusted protein target in grams
    pub protein: u32,

    /// Adjusted carbohydrate target in grams
    pub carbs: u32,

    /// Adjusted fat target in grams
    pub fat: u32,

    /// The raw deltas that were applied
    pub adjustments: MacroAdjustments,

    /// True when a recovery, sleep, or stress multiplier deviated from 1.0
    pub recovery_adjusted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_device_type_deserializes_to_other() {
        let device: DeviceType = serde_json::from_str("\"whoop\"").unwrap();
        assert_eq!(device, DeviceType::Other);
    }

    #[test]
    fn known_device_types_round_trip() {
        for (json, device) in [
            ("\"garmin\"", DeviceType::Garmin),
            ("\"apple_health\"", DeviceType::AppleHealth),
            ("\"fitbit\"", DeviceType::Fitbit),
        ] {
            let parsed: DeviceType = serde_json::from_str(json).unwrap();
            assert_eq!(parsed, device);
            assert_eq!(serde_json::to_string(&device).unwrap(), json);
        }
    }

    #[test]
    fn sanitize_rejects_negative_and_out_of_range() {
        assert_eq!(ScalarMetric::Steps.sanitize(-100.0), None);
        assert_eq!(ScalarMetric::RecoveryScore.sanitize(140.0), None);
        assert_eq!(ScalarMetric::StressLevel.sanitize(11.0), None);
        assert_eq!(ScalarMetric::Steps.sanitize(f64::NAN), None);
        assert_eq!(ScalarMetric::Steps.sanitize(10_000.0), Some(10_000.0));
        assert_eq!(ScalarMetric::RecoveryScore.sanitize(85.0), Some(85.0));
    }

    #[test]
    fn reading_deserializes_from_sync_json() {
        let json = r#"{
            "date": "2024-03-15",
            "deviceType": "garmin",
            "steps": 10432,
            "sleepHours": 7.5,
            "sleepStages": {"deepSleep": 1.5, "remSleep": 1.8, "lightSleep": 3.9, "awake": 0.3},
            "workoutSessions": [
                {"type": "running", "startTime": "2024-03-15T07:00:00Z", "duration": 45, "calories": 420, "intensity": "high", "source": "garmin"}
            ]
        }"#;
        let reading: DeviceReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.device_type, DeviceType::Garmin);
        assert_eq!(reading.steps, Some(10432.0));
        assert_eq!(reading.calories_burned, None);
        assert_eq!(reading.workout_sessions.len(), 1);
        assert_eq!(reading.workout_sessions[0].kind, "running");
    }

    #[test]
    fn metric_accessors_cover_all_fields() {
        let mut reading = DeviceReading::empty(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            DeviceType::Fitbit,
        );
        reading.steps = Some(1.0);
        reading.calories_burned = Some(2.0);
        reading.active_minutes = Some(3.0);
        reading.heart_rate_avg = Some(4.0);
        reading.heart_rate_variability = Some(5.0);
        reading.sleep_hours = Some(6.0);
        reading.recovery_score = Some(7.0);
        reading.stress_level = Some(8.0);

        for (i, metric) in ScalarMetric::ALL.iter().enumerate() {
            assert_eq!(reading.raw_metric(*metric), Some((i + 1) as f64));
        }
    }
}
