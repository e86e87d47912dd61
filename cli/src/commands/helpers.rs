use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;

/// Parse a water amount into litres.
/// Accepts "500ml", "500 ml", "0.5l", "1.5 l"; a bare number is millilitres.
pub(crate) fn parse_water_l(s: &str) -> Result<f64> {
    let s = s.trim().to_lowercase();

    let (number, unit) = match s.find(|c: char| c.is_alphabetic()) {
        Some(0) => bail!("Invalid water amount: '{s}'. Use '500ml' or '0.5l'"),
        Some(idx) => {
            let (number, unit) = s.split_at(idx);
            (number.trim(), unit.trim())
        }
        None => (s.as_str(), "ml"),
    };

    let quantity: f64 = number
        .parse()
        .with_context(|| format!("Invalid water amount: '{s}'. Use '500ml' or '0.5l'"))?;

    let liters = match unit {
        "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => quantity / 1000.0,
        "l" | "liter" | "liters" | "litre" | "litres" => quantity,
        _ => bail!("Unknown unit '{unit}' in '{s}'. Supported: ml, l"),
    };

    if liters <= 0.0 {
        bail!("Water amount must be greater than 0");
    }
    Ok(liters)
}

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday")),
        },
    }
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}
