use anyhow::{Result, bail};
use std::process;

use intake_core::models::{IntakeStatus, NewRecord, TargetKind, validate_category};
use intake_core::service::{IntakeService, TargetNotifier};

use super::helpers::{json_error, parse_water_l};

/// Prints target-reached signals to stderr so `--json` stdout stays clean.
pub(crate) struct CliNotifier;

impl TargetNotifier for CliNotifier {
    fn target_reached(&self, kind: TargetKind) {
        match kind {
            TargetKind::Calories => eprintln!("Daily calorie target reached!"),
            TargetKind::Water => eprintln!("Daily water target reached!"),
        }
    }
}

/// Block on dangerous, warn on excessive, stay quiet otherwise.
/// Returns only when the addition may be committed.
fn gate_intake(status: IntakeStatus, what: &str, json: bool) {
    match status {
        IntakeStatus::Dangerous => {
            let message = format!("Refusing to log: {what} would be a dangerous daily total");
            if json {
                println!("{}", json_error(&message));
            } else {
                eprintln!("{message}");
            }
            process::exit(2);
        }
        IntakeStatus::Excessive => {
            eprintln!("Warning: {what} puts you well past your daily target");
        }
        IntakeStatus::TargetReached | IntakeStatus::Normal => {}
    }
}

pub(crate) fn cmd_log(
    svc: &mut IntakeService,
    category: &str,
    calories: i64,
    json: bool,
) -> Result<()> {
    let category = validate_category(category)?;
    if category == "drink" {
        bail!("Use `intake drink <amount>` to log water");
    }
    if calories <= 0 {
        bail!("Calories must be greater than 0");
    }

    let status = svc.validate_intake(Some(calories), None);
    gate_intake(status, &format!("{calories} kcal"), json);

    let record = svc.add_record(&NewRecord::meal(&category, calories), &CliNotifier)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        let total = svc.today_calories();
        let target = svc.targets().calories;
        println!("Logged: {calories} kcal for {category} — {total}/{target} kcal today");
    }

    Ok(())
}

pub(crate) fn cmd_drink(svc: &mut IntakeService, amount: &str, json: bool) -> Result<()> {
    let water_l = parse_water_l(amount)?;

    let status = svc.validate_intake(None, Some(water_l));
    gate_intake(status, &format!("{water_l:.2} L"), json);

    let record = svc.add_record(&NewRecord::drink(water_l), &CliNotifier)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        let total = svc.today_water_l();
        let target = svc.targets().water_l;
        println!("Logged: {water_l:.2} L — {total:.2}/{target:.2} L today");
    }

    Ok(())
}

pub(crate) fn cmd_delete(svc: &mut IntakeService, record_id: i64, json: bool) -> Result<()> {
    let deleted = svc.delete_record(record_id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": deleted }));
        return Ok(());
    }
    if deleted {
        println!("Record {record_id} deleted");
    } else {
        eprintln!("No record with ID {record_id}");
        process::exit(2);
    }
    Ok(())
}

/// Advisory check: classify a prospective addition without committing it.
pub(crate) fn cmd_check(
    svc: &IntakeService,
    calories: Option<i64>,
    water: Option<&str>,
    json: bool,
) -> Result<()> {
    if calories.is_none() && water.is_none() {
        bail!("Provide --calories and/or --water to check");
    }
    let water_l = water.map(parse_water_l).transpose()?;

    let status = svc.validate_intake(calories, water_l);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "status": status,
                "new_total_calories": calories.map(|c| svc.today_calories() + c),
                "new_total_water_l": water_l.map(|w| svc.today_water_l() + w),
            }))?
        );
        return Ok(());
    }

    if let Some(c) = calories {
        let new_total = svc.today_calories() + c;
        let target = svc.targets().calories;
        println!("Calories: {new_total}/{target} kcal after adding {c}");
    }
    if let Some(w) = water_l {
        let new_total = svc.today_water_l() + w;
        let target = svc.targets().water_l;
        println!("Water: {new_total:.2}/{target:.2} L after adding {w:.2}");
    }
    let label = match status {
        IntakeStatus::Normal => "normal",
        IntakeStatus::TargetReached => "target reached",
        IntakeStatus::Excessive => "excessive",
        IntakeStatus::Dangerous => "dangerous",
    };
    println!("Status: {label}");

    Ok(())
}
