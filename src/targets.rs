//! Activity-adjusted nutrition targets
//!
//! Takes a user's static daily goals and one day of wearable data (raw or
//! consolidated) and produces adjusted calorie and macro targets. The
//! adjustment has two phases:
//!
//! 1. **Calorie delta accumulation**: extra steps, active minutes, and
//!    recorded workout calories each add to a surplus; a device-reported
//!    total burn (net of an assumed basal rate) then acts as a floor on the
//!    accumulated surplus via `max`, not as another additive term.
//! 2. **Recovery scaling**: recovery score, sleep duration, and stress level
//!    scale the surplus multiplicatively, in a fixed order. Short sleep and
//!    high stress additionally grant small flat protein/carb bumps.
//!
//! The positive calorie surplus is then split 25/50/25 across
//! protein/carbs/fat at the standard 4/4/9 kcal-per-gram conversion. Base
//! targets' own macro split is never touched; only the surplus is allocated.
//!
//! Every constant lives in [`AdjustmentConfig`] so it can be tuned and tested
//! independently of the control flow.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    AdjustedTargets, BaseTargets, MacroAdjustments, ScalarMetric, WearableMetrics,
};

/// Tuning constants for the target adjustment formula
///
/// Defaults reproduce the production behavior. `basal_kcal` deserves a note:
/// the device burn floor subtracts a flat 1800 kcal basal estimate regardless
/// of user body size. That is a known simplification carried over from the
/// original product formula; override it per user when a better estimate is
/// available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentConfig {
    /// Step count below which steps contribute nothing
    pub step_baseline: f64,

    /// kcal credited per 1000 steps above the baseline
    pub kcal_per_thousand_steps: f64,

    /// kcal credited per active minute
    pub kcal_per_active_minute: f64,

    /// Assumed basal daily burn subtracted from device-reported calories
    pub basal_kcal: f64,

    /// Recovery score below this scales the surplus down
    pub low_recovery_threshold: f64,
    pub low_recovery_multiplier: f64,

    /// Recovery score above this scales the surplus up
    pub high_recovery_threshold: f64,
    pub high_recovery_multiplier: f64,

    /// Sleep under this many hours scales down and grants flat protein
    pub short_sleep_hours: f64,
    pub short_sleep_multiplier: f64,
    pub short_sleep_protein_grams: i32,

    /// Sleep over this many hours scales up
    pub long_sleep_hours: f64,
    pub long_sleep_multiplier: f64,

    /// Stress above this scales down and grants flat carbs
    pub high_stress_threshold: f64,
    pub high_stress_multiplier: f64,
    pub high_stress_carb_grams: i32,

    /// Share of the calorie surplus allocated to each macro
    pub protein_split: f64,
    pub carb_split: f64,
    pub fat_split: f64,
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        Self {
            step_baseline: 5_000.0,
            kcal_per_thousand_steps: 50.0,
            kcal_per_active_minute: 6.0,
            basal_kcal: 1_800.0,
            low_recovery_threshold: 50.0,
            low_recovery_multiplier: 0.85,
            high_recovery_threshold: 80.0,
            high_recovery_multiplier: 1.10,
            short_sleep_hours: 6.0,
            short_sleep_multiplier: 0.90,
            short_sleep_protein_grams: 5,
            long_sleep_hours: 8.0,
            long_sleep_multiplier: 1.05,
            high_stress_threshold: 7.0,
            high_stress_multiplier: 0.95,
            high_stress_carb_grams: 10,
            protein_split: 0.25,
            carb_split: 0.50,
            fat_split: 0.25,
        }
    }
}

/// kcal per gram of protein and carbohydrate
const KCAL_PER_GRAM_PROTEIN_CARB: f64 = 4.0;
/// kcal per gram of fat
const KCAL_PER_GRAM_FAT: f64 = 9.0;

/// Computes today's calorie/macro targets from base goals plus wearable data
///
/// Pure and stateless: identical inputs always produce identical outputs.
#[derive(Debug, Clone, Default)]
pub struct TargetAdjuster {
    config: AdjustmentConfig,
}

impl TargetAdjuster {
    /// Adjuster with the default production constants
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjuster with custom constants
    pub fn with_config(config: AdjustmentConfig) -> Self {
        Self { config }
    }

    /// Compute adjusted targets for one day
    ///
    /// With no reading the base targets pass through unchanged. All metric
    /// inputs are optional and contribute independently; implausible values
    /// are ignored rather than propagated.
    pub fn adjust<R: WearableMetrics>(
        &self,
        base: &BaseTargets,
        reading: Option<&R>,
    ) -> AdjustedTargets {
        let Some(reading) = reading else {
            return Self::unadjusted(base);
        };

        let surplus = self.accumulate_surplus(reading);
        let (multiplier, flat_protein, flat_carbs) = self.recovery_scaling(reading);

        let calorie_delta = (surplus * multiplier).round() as i32;
        let recovery_adjusted = multiplier != 1.0;

        // Macro share of the surplus only applies when there is a surplus;
        // the flat sleep/stress grants apply regardless.
        let (mut protein_delta, mut carb_delta, mut fat_delta) = (0i32, 0i32, 0i32);
        if calorie_delta > 0 {
            let delta = calorie_delta as f64;
            protein_delta =
                (delta * self.config.protein_split / KCAL_PER_GRAM_PROTEIN_CARB).round() as i32;
            carb_delta =
                (delta * self.config.carb_split / KCAL_PER_GRAM_PROTEIN_CARB).round() as i32;
            fat_delta = (delta * self.config.fat_split / KCAL_PER_GRAM_FAT).round() as i32;
        }
        protein_delta += flat_protein;
        carb_delta += flat_carbs;

        debug!(
            calorie_delta,
            multiplier, recovery_adjusted, "computed target adjustment"
        );

        let adjustments = MacroAdjustments {
            calories: calorie_delta,
            protein: protein_delta,
            carbs: carb_delta,
            fat: fat_delta,
        };

        AdjustedTargets {
            calories: apply_delta(base.target_calories, calorie_delta),
            protein: apply_delta(base.target_protein, protein_delta),
            carbs: apply_delta(base.target_carbs, carb_delta),
            fat: apply_delta(base.target_fat, fat_delta),
            adjustments,
            recovery_adjusted,
        }
    }

    /// Base targets passed through with zero adjustments
    fn unadjusted(base: &BaseTargets) -> AdjustedTargets {
        AdjustedTargets {
            calories: base.target_calories,
            protein: base.target_protein,
            carbs: base.target_carbs,
            fat: base.target_fat,
            adjustments: MacroAdjustments::default(),
            recovery_adjusted: false,
        }
    }

    /// Phase 1: additive surplus from activity, floored by the device's own
    /// burn estimate net of the basal rate
    fn accumulate_surplus<R: WearableMetrics>(&self, reading: &R) -> f64 {
        let mut surplus = 0.0;

        if let Some(steps) = self.metric(reading, ScalarMetric::Steps) {
            if steps > self.config.step_baseline {
                surplus += (steps - self.config.step_baseline) / 1_000.0
                    * self.config.kcal_per_thousand_steps;
            }
        }

        if let Some(minutes) = self.metric(reading, ScalarMetric::ActiveMinutes) {
            surplus += minutes * self.config.kcal_per_active_minute;
        }

        for session in reading.workout_sessions() {
            if let Some(calories) = session.calories {
                if calories > 0.0 && calories.is_finite() {
                    surplus += calories;
                }
            }
        }

        if let Some(burned) = self.metric(reading, ScalarMetric::CaloriesBurned) {
            // The device's whole-day estimate acts as a floor, not another
            // additive term, to avoid double counting steps and workouts.
            surplus = surplus.max(burned - self.config.basal_kcal);
        }

        surplus
    }

    /// Phase 2: recovery/sleep/stress multiplier plus flat macro grants
    ///
    /// Terms are applied in a fixed order; later terms re-multiply the
    /// already-scaled value.
    fn recovery_scaling<R: WearableMetrics>(&self, reading: &R) -> (f64, i32, i32) {
        let mut multiplier = 1.0;
        let mut flat_protein = 0;
        let mut flat_carbs = 0;

        if let Some(recovery) = self.metric(reading, ScalarMetric::RecoveryScore) {
            if recovery < self.config.low_recovery_threshold {
                multiplier *= self.config.low_recovery_multiplier;
            }
            if recovery > self.config.high_recovery_threshold {
                multiplier *= self.config.high_recovery_multiplier;
            }
        }

        if let Some(sleep) = self.metric(reading, ScalarMetric::SleepHours) {
            if sleep < self.config.short_sleep_hours {
                multiplier *= self.config.short_sleep_multiplier;
                flat_protein += self.config.short_sleep_protein_grams;
            }
            if sleep > self.config.long_sleep_hours {
                multiplier *= self.config.long_sleep_multiplier;
            }
        }

        if let Some(stress) = self.metric(reading, ScalarMetric::StressLevel) {
            if stress > self.config.high_stress_threshold {
                multiplier *= self.config.high_stress_multiplier;
                flat_carbs += self.config.high_stress_carb_grams;
            }
        }

        (multiplier, flat_protein, flat_carbs)
    }

    /// Sanitized metric read: implausible upstream values count as absent
    fn metric<R: WearableMetrics>(&self, reading: &R, metric: ScalarMetric) -> Option<f64> {
        reading.metric(metric).and_then(|v| metric.sanitize(v))
    }
}

/// Add a signed delta to an unsigned target, saturating at zero
fn apply_delta(base: u32, delta: i32) -> u32 {
    (base as i64 + delta as i64).max(0) as u32
}
