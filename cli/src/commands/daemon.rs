use anyhow::Result;
use chrono::Local;

use intake_core::schedule::next_midnight;
use intake_core::service::IntakeService;

pub(crate) fn cmd_reset(svc: &mut IntakeService, json: bool) -> Result<()> {
    let removed = svc.reset_daily()?;

    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else {
        println!("Daily reset: removed {removed} record(s)");
    }
    Ok(())
}

/// Run the daily reset loop until the process is killed.
///
/// The deadline is recomputed against wall-clock local midnight after every
/// firing, so clock changes and slow wakeups never accumulate drift.
pub(crate) async fn cmd_daemon(svc: &mut IntakeService) -> Result<()> {
    loop {
        let now = Local::now();
        let deadline = next_midnight(now)?;
        eprintln!("Next daily reset at {}", deadline.format("%Y-%m-%d %H:%M:%S"));

        let wait = (deadline - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        let removed = svc.reset_daily()?;
        let fired_at = Local::now().format("%Y-%m-%d %H:%M:%S");
        println!("[{fired_at}] Daily reset: removed {removed} record(s)");
    }
}
