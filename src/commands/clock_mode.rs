use chrono::Local;

use super::{resolve_pane, target_pane_mut, CmdCtx, CmdEntry, CmdResult, CmdRetval};
use crate::cli::Args;
use crate::error::CmdError;
use crate::server::Server;
use crate::types::{ClockMode, PaneMode};

pub(super) fn exec(_entry: &CmdEntry, server: &mut Server, args: &Args, ctx: &mut CmdCtx) -> CmdResult {
    let target = resolve_pane(server, ctx, args.get('t'))?;
    let pane = target_pane_mut(server, &target)
        .ok_or_else(|| CmdError::TargetNotFound(format!("pane: {}:{}.{}", target.session, target.window, target.pane)))?;
    pane.set_mode(PaneMode::Clock(ClockMode { entered_at: Local::now() }))?;
    Ok(CmdRetval::Normal)
}
