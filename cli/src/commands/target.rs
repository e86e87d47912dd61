use anyhow::{Result, bail};

use intake_core::service::IntakeService;

fn print_targets(svc: &IntakeService, json: bool) -> Result<()> {
    let targets = svc.targets();
    if json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
    } else {
        let water = targets.water_l;
        let calories = targets.calories;
        println!("Water target:   {water:.2} L/day");
        println!("Calorie target: {calories} kcal/day");
    }
    Ok(())
}

pub(crate) fn cmd_target_set(
    svc: &mut IntakeService,
    water: Option<f64>,
    calories: Option<i64>,
    json: bool,
) -> Result<()> {
    if water.is_none() && calories.is_none() {
        bail!("Provide --water and/or --calories to set a target");
    }

    if let Some(water_l) = water {
        svc.update_water_target(water_l)?;
    }
    if let Some(cal) = calories {
        svc.update_calorie_target(cal)?;
    }

    print_targets(svc, json)
}

pub(crate) fn cmd_target_show(svc: &IntakeService, json: bool) -> Result<()> {
    print_targets(svc, json)
}
