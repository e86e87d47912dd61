mod daemon;
mod helpers;
mod log;
mod summary;
mod target;

pub(crate) use daemon::{cmd_daemon, cmd_reset};
pub(crate) use log::{cmd_check, cmd_delete, cmd_drink, cmd_log};
pub(crate) use summary::{cmd_average, cmd_history, cmd_summary};
pub(crate) use target::{cmd_target_set, cmd_target_show};
