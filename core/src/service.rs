use std::path::Path;

use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};

use crate::db::Database;
use crate::models::{
    self, ConsumptionRecord, DailyReport, DEFAULT_CALORIE_TARGET, DEFAULT_WATER_TARGET_L,
    HealthStatus, IntakeStatus, NewRecord, TargetKind, Targets,
};

/// Settings keys for the two persisted targets.
pub const WATER_TARGET_KEY: &str = "WaterTarget";
pub const CALORIE_TARGET_KEY: &str = "CalorieTarget";

/// Subscriber for the fire-and-forget "target just reached" signal.
///
/// Fired at most once per target per crossing: when a total steps from below
/// the target to at or above it, including a single large increment that
/// jumps past the boundary.
pub trait TargetNotifier {
    fn target_reached(&self, kind: TargetKind);
}

/// Notifier for callers that don't subscribe.
pub struct NoopNotifier;

impl TargetNotifier for NoopNotifier {
    fn target_reached(&self, _kind: TargetKind) {}
}

/// Aggregator/validator: owns the storage adapter, target configuration, and
/// the running totals for the current local calendar day. Everything else is
/// re-queried from storage on demand.
pub struct IntakeService {
    db: Database,
    targets: Targets,
    today: NaiveDate,
    today_calories: i64,
    today_water_l: f64,
}

impl IntakeService {
    pub fn new(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self::load(db))
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::load(db))
    }

    /// Read targets and today's running totals from storage. Failed reads
    /// degrade to defaults / an empty day rather than aborting startup.
    fn load(db: Database) -> Self {
        let targets = Targets {
            water_l: read_setting(&db, WATER_TARGET_KEY).unwrap_or(DEFAULT_WATER_TARGET_L),
            calories: read_setting(&db, CALORIE_TARGET_KEY).unwrap_or(DEFAULT_CALORIE_TARGET),
        };

        let today = Local::now().date_naive();
        let records = db.get_records(today).unwrap_or_default();
        let today_calories = records.iter().map(|r| r.calories).sum();
        let today_water_l = records.iter().filter_map(|r| r.water_l).sum();

        Self {
            db,
            targets,
            today,
            today_calories,
            today_water_l,
        }
    }

    // --- Accessors ---

    #[must_use]
    pub fn targets(&self) -> Targets {
        self.targets
    }

    #[must_use]
    pub fn today_calories(&self) -> i64 {
        self.today_calories
    }

    #[must_use]
    pub fn today_water_l(&self) -> f64 {
        self.today_water_l
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn calorie_progress(&self) -> f64 {
        self.today_calories as f64 / self.targets.calories as f64
    }

    #[must_use]
    pub fn water_progress(&self) -> f64 {
        self.today_water_l / self.targets.water_l
    }

    // --- Records ---

    /// Validate, persist, and aggregate one consumption event.
    ///
    /// When the record lands on the current day, the running totals are
    /// updated and the notifier is fired for every target whose total crossed
    /// from below to at/above the target boundary.
    pub fn add_record(
        &mut self,
        record: &NewRecord,
        notifier: &dyn TargetNotifier,
    ) -> Result<ConsumptionRecord> {
        let category = models::validate_record(&record.category, record.calories, record.water_l)?;
        let mut record = record.clone();
        record.category = category;

        let saved = self.db.save_record(&record)?;

        if saved.timestamp.date_naive() == self.today {
            let calories_before = self.calorie_progress();
            let water_before = self.water_progress();

            self.today_calories += saved.calories;
            self.today_water_l += saved.water_l.unwrap_or(0.0);

            if calories_before < 1.0 && self.calorie_progress() >= 1.0 {
                notifier.target_reached(TargetKind::Calories);
            }
            if water_before < 1.0 && self.water_progress() >= 1.0 {
                notifier.target_reached(TargetKind::Water);
            }
        }

        Ok(saved)
    }

    /// Delete a record by id; returns false when no such record exists.
    /// A record on the current day gives its contribution back to the
    /// running totals.
    pub fn delete_record(&mut self, id: i64) -> Result<bool> {
        let Some(record) = self.db.get_record(id)? else {
            return Ok(false);
        };
        self.db.delete_record(id)?;

        if record.timestamp.date_naive() == self.today {
            self.today_calories -= record.calories;
            self.today_water_l -= record.water_l.unwrap_or(0.0);
        }
        Ok(true)
    }

    pub fn records_for(&self, date: NaiveDate) -> Result<Vec<ConsumptionRecord>> {
        self.db.get_records(date)
    }

    pub fn all_records(&self) -> Result<Vec<ConsumptionRecord>> {
        self.db.get_all_records()
    }

    // --- Classification ---

    /// Classify what a prospective addition would do to today's totals.
    /// When both payloads are given, the most severe status wins.
    #[must_use]
    pub fn validate_intake(&self, calories: Option<i64>, water_l: Option<f64>) -> IntakeStatus {
        let mut status = IntakeStatus::Normal;
        if let Some(c) = calories {
            status = status.max(models::classify_calories(
                self.today_calories + c,
                self.targets.calories,
            ));
        }
        if let Some(w) = water_l {
            status = status.max(models::classify_water(
                self.today_water_l + w,
                self.targets.water_l,
            ));
        }
        status
    }

    #[must_use]
    pub fn health_status(&self) -> HealthStatus {
        models::health_status(self.calorie_progress(), self.water_progress())
    }

    // --- Derived statistics ---

    /// Per-day calorie average over the trailing 30 days; days without any
    /// record are excluded from the denominator.
    pub fn average_daily_calories(&self) -> Result<f64> {
        self.db.calorie_average(30)
    }

    /// Summed calories and water for one local calendar day, re-queried
    /// from the record log.
    pub fn daily_totals(&self, date: NaiveDate) -> Result<(i64, f64)> {
        let records = self.db.get_records(date)?;
        let calories = records.iter().map(|r| r.calories).sum();
        let water_l = records.iter().filter_map(|r| r.water_l).sum();
        Ok((calories, water_l))
    }

    /// Full snapshot of one day: records, totals, targets, progress, health.
    #[allow(clippy::cast_precision_loss)]
    pub fn daily_report(&self, date: NaiveDate) -> Result<DailyReport> {
        let records = self.db.get_records(date)?;
        let total_calories: i64 = records.iter().map(|r| r.calories).sum();
        let total_water_l: f64 = records.iter().filter_map(|r| r.water_l).sum();
        let calorie_progress = total_calories as f64 / self.targets.calories as f64;
        let water_progress = total_water_l / self.targets.water_l;

        Ok(DailyReport {
            date: date.format("%Y-%m-%d").to_string(),
            records,
            total_calories,
            total_water_l,
            calorie_target: self.targets.calories,
            water_target_l: self.targets.water_l,
            calorie_progress,
            water_progress,
            health: models::health_status(calorie_progress, water_progress),
        })
    }

    // --- Daily reset ---

    /// Delete every record on the current day and zero the running totals.
    /// Returns how many records were removed.
    pub fn reset_daily(&mut self) -> Result<usize> {
        let today = Local::now().date_naive();
        let removed = self.db.clear_records(today)?;
        self.today = today;
        self.today_calories = 0;
        self.today_water_l = 0.0;
        Ok(removed)
    }

    // --- Targets ---

    /// Overwrite the water target; persisted before the in-memory value
    /// changes so a failed write leaves state consistent.
    pub fn update_water_target(&mut self, water_l: f64) -> Result<()> {
        if water_l <= 0.0 {
            bail!("Water target must be greater than 0");
        }
        self.db.set_setting(WATER_TARGET_KEY, &water_l.to_string())?;
        self.targets.water_l = water_l;
        Ok(())
    }

    pub fn update_calorie_target(&mut self, calories: i64) -> Result<()> {
        if calories <= 0 {
            bail!("Calorie target must be greater than 0");
        }
        self.db
            .set_setting(CALORIE_TARGET_KEY, &calories.to_string())?;
        self.targets.calories = calories;
        Ok(())
    }
}

/// Read and parse a positive numeric setting; anything absent, unparseable,
/// or non-positive falls back to the default.
fn read_setting<T>(db: &Database, key: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    db.get_setting(key)
        .unwrap_or_default()
        .and_then(|v| v.parse::<T>().ok())
        .filter(|v| *v > T::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct MockNotifier {
        fired: RefCell<Vec<TargetKind>>,
    }

    impl MockNotifier {
        fn new() -> Self {
            Self {
                fired: RefCell::new(Vec::new()),
            }
        }

        fn fired(&self) -> Vec<TargetKind> {
            self.fired.borrow().clone()
        }
    }

    impl TargetNotifier for MockNotifier {
        fn target_reached(&self, kind: TargetKind) {
            self.fired.borrow_mut().push(kind);
        }
    }

    #[test]
    fn test_defaults_when_settings_absent() {
        let svc = IntakeService::new_in_memory().unwrap();
        let targets = svc.targets();
        assert!((targets.water_l - 2.0).abs() < f64::EPSILON);
        assert_eq!(targets.calories, 2000);
        assert_eq!(svc.today_calories(), 0);
        assert!((svc.today_water_l() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_add_meal_updates_totals() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        let record = svc
            .add_record(&NewRecord::meal("lunch", 450), &NoopNotifier)
            .unwrap();
        assert_eq!(record.category, "lunch");
        assert_eq!(svc.today_calories(), 450);
        assert!((svc.today_water_l() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_add_drink_updates_totals() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        svc.add_record(&NewRecord::drink(0.5), &NoopNotifier).unwrap();
        assert_eq!(svc.today_calories(), 0);
        assert!((svc.today_water_l() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_add_record_rejects_invalid_payload() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        assert!(svc.add_record(&NewRecord::meal("lunch", 0), &NoopNotifier).is_err());
        assert!(svc.add_record(&NewRecord::drink(0.0), &NoopNotifier).is_err());
        assert!(
            svc.add_record(&NewRecord::meal("elevenses", 200), &NoopNotifier)
                .is_err()
        );
        assert_eq!(svc.today_calories(), 0);
    }

    #[test]
    fn test_add_then_delete_round_trips_totals() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        svc.add_record(&NewRecord::meal("breakfast", 300), &NoopNotifier)
            .unwrap();
        let record = svc
            .add_record(&NewRecord::drink(0.4), &NoopNotifier)
            .unwrap();

        assert!((svc.today_water_l() - 0.4).abs() < f64::EPSILON);
        assert!(svc.delete_record(record.id).unwrap());
        assert_eq!(svc.today_calories(), 300);
        assert!((svc.today_water_l() - 0.0).abs() < f64::EPSILON);

        assert!(!svc.delete_record(record.id).unwrap());
    }

    #[test]
    fn test_validate_intake_dangerous_iff_over_5000() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        for _ in 0..4 {
            svc.add_record(&NewRecord::meal("snack", 1200), &NoopNotifier)
                .unwrap();
        }
        assert_eq!(svc.today_calories(), 4800);

        // 4800 + 300 = 5100 > 5000
        assert_eq!(
            svc.validate_intake(Some(300), None),
            IntakeStatus::Dangerous
        );
        // 4800 + 200 = 5000 is not dangerous, but far past 1.5x target
        assert_eq!(
            svc.validate_intake(Some(200), None),
            IntakeStatus::Excessive
        );
    }

    #[test]
    fn test_validate_intake_water_example() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        svc.add_record(&NewRecord::drink(1.0), &NoopNotifier).unwrap();

        assert!((svc.water_progress() - 0.5).abs() < f64::EPSILON);
        assert_eq!(svc.health_status(), HealthStatus::Normal);

        // 1.0 + 1.2 = 2.2, ratio 1.1
        assert_eq!(
            svc.validate_intake(None, Some(1.2)),
            IntakeStatus::TargetReached
        );
        // ratio 2.0 is dangerous
        assert_eq!(
            svc.validate_intake(None, Some(3.0)),
            IntakeStatus::Dangerous
        );
    }

    #[test]
    fn test_validate_intake_takes_most_severe() {
        let svc = IntakeService::new_in_memory().unwrap();
        // calories normal, water dangerous
        assert_eq!(
            svc.validate_intake(Some(100), Some(4.0)),
            IntakeStatus::Dangerous
        );
        // nothing prospective at all
        assert_eq!(svc.validate_intake(None, None), IntakeStatus::Normal);
    }

    #[test]
    fn test_health_status_transitions() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        assert_eq!(svc.health_status(), HealthStatus::Normal);

        svc.add_record(&NewRecord::meal("dinner", 2000), &NoopNotifier)
            .unwrap();
        assert_eq!(svc.health_status(), HealthStatus::NeedsWater);

        svc.add_record(&NewRecord::drink(2.0), &NoopNotifier).unwrap();
        assert_eq!(svc.health_status(), HealthStatus::Excellent);
    }

    #[test]
    fn test_health_status_needs_calories() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        svc.add_record(&NewRecord::drink(2.5), &NoopNotifier).unwrap();
        assert_eq!(svc.health_status(), HealthStatus::NeedsCalories);
    }

    #[test]
    fn test_target_reached_fires_once_on_crossing() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        let notifier = MockNotifier::new();

        svc.add_record(&NewRecord::meal("breakfast", 1500), &notifier)
            .unwrap();
        assert!(notifier.fired().is_empty());

        svc.add_record(&NewRecord::meal("lunch", 600), &notifier)
            .unwrap();
        assert_eq!(notifier.fired(), vec![TargetKind::Calories]);

        // Already above target: no second signal
        svc.add_record(&NewRecord::meal("snack", 200), &notifier)
            .unwrap();
        assert_eq!(notifier.fired(), vec![TargetKind::Calories]);
    }

    #[test]
    fn test_target_reached_fires_on_single_large_increment() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        let notifier = MockNotifier::new();

        // Jumps well past the boundary without landing on it exactly
        svc.add_record(&NewRecord::meal("dinner", 2750), &notifier)
            .unwrap();
        assert_eq!(notifier.fired(), vec![TargetKind::Calories]);
    }

    #[test]
    fn test_target_reached_fires_on_exact_boundary() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        let notifier = MockNotifier::new();
        svc.add_record(&NewRecord::meal("dinner", 2000), &notifier)
            .unwrap();
        assert_eq!(notifier.fired(), vec![TargetKind::Calories]);
    }

    #[test]
    fn test_water_target_reached_signal() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        let notifier = MockNotifier::new();

        svc.add_record(&NewRecord::drink(1.5), &notifier).unwrap();
        assert!(notifier.fired().is_empty());
        svc.add_record(&NewRecord::drink(0.6), &notifier).unwrap();
        assert_eq!(notifier.fired(), vec![TargetKind::Water]);
    }

    #[test]
    fn test_average_daily_calories_empty() {
        let svc = IntakeService::new_in_memory().unwrap();
        let avg = svc.average_daily_calories().unwrap();
        assert!((avg - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_daily_calories_single_day() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        svc.add_record(&NewRecord::meal("lunch", 500), &NoopNotifier)
            .unwrap();
        svc.add_record(&NewRecord::meal("dinner", 700), &NoopNotifier)
            .unwrap();
        let avg = svc.average_daily_calories().unwrap();
        assert!((avg - 1200.0).abs() < 0.01);
    }

    #[test]
    fn test_reset_daily_clears_log_and_totals() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        svc.add_record(&NewRecord::meal("lunch", 500), &NoopNotifier)
            .unwrap();
        svc.add_record(&NewRecord::drink(0.5), &NoopNotifier).unwrap();

        let removed = svc.reset_daily().unwrap();
        assert_eq!(removed, 2);
        assert_eq!(svc.today_calories(), 0);
        assert!((svc.today_water_l() - 0.0).abs() < f64::EPSILON);

        let today = Local::now().date_naive();
        assert!(svc.records_for(today).unwrap().is_empty());
    }

    #[test]
    fn test_update_targets_validation() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        assert!(svc.update_water_target(0.0).is_err());
        assert!(svc.update_water_target(-1.0).is_err());
        assert!(svc.update_calorie_target(0).is_err());
        assert!(svc.update_calorie_target(-100).is_err());
    }

    #[test]
    fn test_update_targets_take_effect() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        svc.update_water_target(3.0).unwrap();
        svc.update_calorie_target(1800).unwrap();

        let targets = svc.targets();
        assert!((targets.water_l - 3.0).abs() < f64::EPSILON);
        assert_eq!(targets.calories, 1800);

        // Classification follows the new targets
        assert_eq!(
            svc.validate_intake(Some(1800), None),
            IntakeStatus::TargetReached
        );
    }

    #[test]
    fn test_targets_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.db");

        {
            let mut svc = IntakeService::new(&path).unwrap();
            svc.update_water_target(2.5).unwrap();
            svc.update_calorie_target(1600).unwrap();
        }

        let svc = IntakeService::new(&path).unwrap();
        let targets = svc.targets();
        assert!((targets.water_l - 2.5).abs() < f64::EPSILON);
        assert_eq!(targets.calories, 1600);
    }

    #[test]
    fn test_today_totals_seeded_from_log_on_startup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.db");

        {
            let mut svc = IntakeService::new(&path).unwrap();
            svc.add_record(&NewRecord::meal("breakfast", 350), &NoopNotifier)
                .unwrap();
            svc.add_record(&NewRecord::drink(0.3), &NoopNotifier).unwrap();
        }

        let svc = IntakeService::new(&path).unwrap();
        assert_eq!(svc.today_calories(), 350);
        assert!((svc.today_water_l() - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_garbage_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.db");

        {
            let db = Database::open(&path).unwrap();
            db.set_setting(WATER_TARGET_KEY, "not-a-number").unwrap();
            db.set_setting(CALORIE_TARGET_KEY, "-5").unwrap();
        }

        let svc = IntakeService::new(&path).unwrap();
        let targets = svc.targets();
        assert!((targets.water_l - 2.0).abs() < f64::EPSILON);
        assert_eq!(targets.calories, 2000);
    }

    #[test]
    fn test_daily_report_for_empty_day() {
        let svc = IntakeService::new_in_memory().unwrap();
        let date = Local::now().date_naive();
        let report = svc.daily_report(date).unwrap();
        assert!(report.records.is_empty());
        assert_eq!(report.total_calories, 0);
        assert_eq!(report.health, HealthStatus::Normal);
    }

    #[test]
    fn test_daily_report_totals_and_health() {
        let mut svc = IntakeService::new_in_memory().unwrap();
        svc.add_record(&NewRecord::meal("lunch", 2100), &NoopNotifier)
            .unwrap();
        svc.add_record(&NewRecord::drink(0.5), &NoopNotifier).unwrap();

        let report = svc.daily_report(Local::now().date_naive()).unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.total_calories, 2100);
        assert!((report.total_water_l - 0.5).abs() < f64::EPSILON);
        assert!((report.calorie_progress - 1.05).abs() < 0.001);
        assert_eq!(report.health, HealthStatus::NeedsWater);
    }
}
