use tracing::debug;

use super::{resolve_session, resolve_window, CmdCtx, CmdEntry, CmdResult, CmdRetval};
use crate::cli::Args;
use crate::error::CmdError;
use crate::server::Server;

pub(super) fn select_window(_entry: &CmdEntry, server: &mut Server, args: &Args, ctx: &mut CmdCtx) -> CmdResult {
    let (session, index) = resolve_window(server, ctx, args.get('t'))?;
    let s = server.sessions.get_mut(&session)
        .ok_or_else(|| CmdError::TargetNotFound(format!("session: {}", session)))?;
    s.curw = Some(index);
    debug!(session = %session, index, "window selected");
    Ok(CmdRetval::Normal)
}

pub(super) fn switch_client(_entry: &CmdEntry, server: &mut Server, args: &Args, ctx: &mut CmdCtx) -> CmdResult {
    let client = match args.get('c') {
        Some(name) => server.find_client(name)
            .ok_or_else(|| CmdError::TargetNotFound(format!("client: {}", name)))?,
        None => ctx.live_client().cloned().ok_or(CmdError::NoInteractiveClient)?,
    };
    let session = resolve_session(server, ctx, args.get('t'))?;
    client.set_session(&session);
    debug!(client = %client.name, session = %session, "client switched");
    Ok(CmdRetval::Normal)
}
