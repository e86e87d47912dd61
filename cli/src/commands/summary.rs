use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use intake_core::models::HealthStatus;
use intake_core::service::IntakeService;

use super::helpers::parse_date;

fn health_label(health: HealthStatus) -> &'static str {
    match health {
        HealthStatus::Normal => "normal",
        HealthStatus::NeedsCalories => "needs calories",
        HealthStatus::NeedsWater => "needs water",
        HealthStatus::Excellent => "excellent",
    }
}

pub(crate) fn cmd_summary(svc: &IntakeService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let report = svc.daily_report(date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.records.is_empty() {
        let date = &report.date;
        eprintln!("No entries for {date}");
        process::exit(2);
    }

    let date = &report.date;
    println!("=== {date} ===\n");

    for record in &report.records {
        let id = record.id;
        let category = &record.category;
        let time = record.timestamp.format("%H:%M");
        if let Some(water) = record.water_l {
            println!("  [{id}] {time} {category} — {water:.2} L");
        } else {
            let cal = record.calories;
            println!("  [{id}] {time} {category} — {cal} kcal");
        }
    }
    println!();

    let cal = report.total_calories;
    let cal_target = report.calorie_target;
    let cal_pct = report.calorie_progress * 100.0;
    println!("  CALORIES: {cal}/{cal_target} kcal ({cal_pct:.0}%)");

    let water = report.total_water_l;
    let water_target = report.water_target_l;
    let water_pct = report.water_progress * 100.0;
    println!("  WATER:    {water:.2}/{water_target:.2} L ({water_pct:.0}%)");

    let health = health_label(report.health);
    println!("  STATUS:   {health}");

    Ok(())
}

pub(crate) fn cmd_history(svc: &IntakeService, days: u32, json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct DayTotals {
        date: String,
        calories: i64,
        water_l: f64,
    }

    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Water")]
        water: String,
    }

    let today = Local::now().date_naive();
    let mut totals = Vec::new();

    for i in 0..days {
        let date = today - chrono::Duration::days(i64::from(i));
        let (calories, water_l) = svc.daily_totals(date)?;
        totals.push(DayTotals {
            date: date.format("%Y-%m-%d").to_string(),
            calories,
            water_l,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
        return Ok(());
    }

    if totals.iter().all(|t| t.calories == 0 && t.water_l == 0.0) {
        eprintln!("No entries in the last {days} days");
        process::exit(2);
    }

    let rows: Vec<HistoryRow> = totals
        .iter()
        .map(|t| HistoryRow {
            date: t.date.clone(),
            calories: format!("{}", t.calories),
            water: format!("{:.2} L", t.water_l),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_average(svc: &IntakeService, json: bool) -> Result<()> {
    let average = svc.average_daily_calories()?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "average_daily_calories": average })
        );
    } else {
        println!("30-day average: {average:.0} kcal/day");
    }
    Ok(())
}
