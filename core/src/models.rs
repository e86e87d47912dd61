use anyhow::{Result, bail};
use chrono::{DateTime, Local};
use serde::Serialize;

/// One logged consumption event: a meal (calories) or a drink (water volume).
#[derive(Debug, Clone, Serialize)]
pub struct ConsumptionRecord {
    pub id: i64,
    pub uuid: String,
    pub category: String,
    pub calories: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_l: Option<f64>,
    pub timestamp: DateTime<Local>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewRecord {
    pub category: String,
    pub calories: i64,
    pub water_l: Option<f64>,
    pub timestamp: DateTime<Local>,
}

impl NewRecord {
    #[must_use]
    pub fn meal(category: &str, calories: i64) -> Self {
        Self {
            category: category.to_string(),
            calories,
            water_l: None,
            timestamp: Local::now(),
        }
    }

    #[must_use]
    pub fn drink(water_l: f64) -> Self {
        Self {
            category: "drink".to_string(),
            calories: 0,
            water_l: Some(water_l),
            timestamp: Local::now(),
        }
    }
}

/// Daily goals. Targets are process-wide state owned by the service and
/// persisted to settings storage on every change.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Targets {
    pub water_l: f64,
    pub calories: i64,
}

pub const DEFAULT_WATER_TARGET_L: f64 = 2.0;
pub const DEFAULT_CALORIE_TARGET: i64 = 2000;

impl Default for Targets {
    fn default() -> Self {
        Self {
            water_l: DEFAULT_WATER_TARGET_L,
            calories: DEFAULT_CALORIE_TARGET,
        }
    }
}

/// Safety classification for a prospective addition, ordered by severity.
/// Advisory only — `Dangerous` is the one status callers are expected to
/// block on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStatus {
    Normal,
    TargetReached,
    Excessive,
    Dangerous,
}

/// Qualitative label derived from both progress ratios at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Normal,
    NeedsCalories,
    NeedsWater,
    Excellent,
}

/// Which daily target a signal refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Calories,
    Water,
}

/// Snapshot of one local calendar day: records plus derived totals and
/// classifications. Recomputed from the record log, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub date: String,
    pub records: Vec<ConsumptionRecord>,
    pub total_calories: i64,
    pub total_water_l: f64,
    pub calorie_target: i64,
    pub water_target_l: f64,
    pub calorie_progress: f64,
    pub water_progress: f64,
    pub health: HealthStatus,
}

pub const CATEGORIES: &[&str] = &["breakfast", "lunch", "dinner", "snack", "drink"];

/// Absolute daily calorie total above which any further intake is dangerous.
pub const DANGEROUS_CALORIE_TOTAL: i64 = 5000;
/// Water progress ratio at which further intake is dangerous.
pub const DANGEROUS_WATER_RATIO: f64 = 2.0;
/// Progress ratio at which intake is excessive (either target).
pub const EXCESSIVE_RATIO: f64 = 1.5;

pub fn validate_category(category: &str) -> Result<String> {
    let lower = category.to_lowercase();
    if CATEGORIES.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        bail!(
            "Invalid category '{category}'. Must be one of: {}",
            CATEGORIES.join(", ")
        )
    }
}

/// Validate a record's payload invariant and return the canonical category.
///
/// Drink records carry a positive water volume and zero calories; every other
/// category carries positive calories and no water volume.
pub fn validate_record(category: &str, calories: i64, water_l: Option<f64>) -> Result<String> {
    let category = validate_category(category)?;
    if category == "drink" {
        let Some(water) = water_l else {
            bail!("Drink records must carry a water amount");
        };
        if water <= 0.0 {
            bail!("Water amount must be greater than 0");
        }
        if calories != 0 {
            bail!("Drink records must not carry calories");
        }
    } else {
        if water_l.is_some() {
            bail!("Only drink records may carry a water amount");
        }
        if calories <= 0 {
            bail!("Calories must be greater than 0");
        }
    }
    Ok(category)
}

/// Classify a prospective new daily calorie total against the target.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn classify_calories(new_total: i64, target: i64) -> IntakeStatus {
    if new_total > DANGEROUS_CALORIE_TOTAL {
        return IntakeStatus::Dangerous;
    }
    classify_ratio(new_total as f64 / target as f64)
}

/// Classify a prospective new daily water total against the target.
#[must_use]
pub fn classify_water(new_total_l: f64, target_l: f64) -> IntakeStatus {
    let ratio = new_total_l / target_l;
    if ratio >= DANGEROUS_WATER_RATIO {
        return IntakeStatus::Dangerous;
    }
    classify_ratio(ratio)
}

fn classify_ratio(ratio: f64) -> IntakeStatus {
    if ratio >= EXCESSIVE_RATIO {
        IntakeStatus::Excessive
    } else if ratio >= 1.0 {
        IntakeStatus::TargetReached
    } else {
        IntakeStatus::Normal
    }
}

/// Derive the health status from both progress ratios.
#[must_use]
pub fn health_status(calorie_ratio: f64, water_ratio: f64) -> HealthStatus {
    match (calorie_ratio >= 1.0, water_ratio >= 1.0) {
        (true, true) => HealthStatus::Excellent,
        (true, false) => HealthStatus::NeedsWater,
        (false, true) => HealthStatus::NeedsCalories,
        (false, false) => HealthStatus::Normal,
    }
}
