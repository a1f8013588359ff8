//! The `set-option`, `set-window-option`, `show-options` and `show-window-options` commands.
//!
//! -g picks the global scope. Otherwise the target decides: -p a pane,
//! window options (or -w, or the *-window-option forms) a window, anything
//! else a session.

use std::rc::Rc;

use tracing::debug;

use super::{resolve_pane, resolve_session, resolve_window, CmdCtx, CmdEntry, CmdResult, CmdRetval};
use crate::cli::Args;
use crate::error::{CmdError, OptionError};
use crate::options::{OptionValue, SharedOptions};
use crate::server::options::{find_option_def, parse_option_value, show_options as show_lines, OptionClass, OptionDef};
use crate::server::Server;

fn is_window_command(entry: &CmdEntry) -> bool {
    entry.name.ends_with("-window-options") || entry.name == "set-window-option"
}

fn select_scope(server: &Server, ctx: &CmdCtx, args: &Args, window: bool) -> Result<SharedOptions, CmdError> {
    let target = args.get('t');
    if args.has('p') {
        let t = resolve_pane(server, ctx, target)?;
        return server.sessions.get(&t.session)
            .and_then(|s| s.windows.get(&t.window))
            .and_then(|w| w.panes.get(t.pane))
            .map(|p| Rc::clone(&p.options))
            .ok_or_else(|| CmdError::TargetNotFound(format!("pane: {}:{}.{}", t.session, t.window, t.pane)));
    }
    if args.has('g') {
        return Ok(Rc::clone(&server.options));
    }
    if window {
        let (session, index) = resolve_window(server, ctx, target)?;
        return server.sessions.get(&session)
            .and_then(|s| s.windows.get(&index))
            .map(|w| Rc::clone(&w.options))
            .ok_or_else(|| CmdError::TargetNotFound(format!("window: {}:{}", session, index)));
    }
    let session = resolve_session(server, ctx, target)?;
    server.sessions.get(&session)
        .map(|s| Rc::clone(&s.options))
        .ok_or_else(|| CmdError::TargetNotFound(format!("session: {}", session)))
}

/// Table entry for `name`; user options (`@...`) have none. `Err` for a name
/// that is neither.
fn lookup(name: &str) -> Result<Option<&'static OptionDef>, OptionError> {
    match find_option_def(name) {
        Some(d) => Ok(Some(d)),
        None if name.starts_with('@') && name.len() > 1 => Ok(None),
        None => Err(OptionError::UnknownOption { name: name.to_string() }),
    }
}

fn wants_window(entry: &CmdEntry, args: &Args, def: Option<&OptionDef>) -> bool {
    is_window_command(entry) || args.has('w') || def.map_or(false, |d| d.class == OptionClass::Window)
}

pub(super) fn set_option(entry: &CmdEntry, server: &mut Server, args: &Args, ctx: &mut CmdCtx) -> CmdResult {
    let name = args.value(0).unwrap_or_default();
    let def = match lookup(name) {
        Ok(d) => d,
        Err(_) if args.has('q') => return Ok(CmdRetval::Normal),
        Err(e) => return Err(e.into()),
    };
    let scope = select_scope(server, ctx, args, wants_window(entry, args, def))?;
    let current = scope.borrow().find(name);
    let value = parse_option_value(name, def, args.value(1), current.as_ref())?;
    debug!(option = name, %value, "set option");
    match value {
        OptionValue::String(s) => scope.borrow_mut().set_string(name, s),
        OptionValue::Number(n) => scope.borrow_mut().set_number(name, n),
    }
    Ok(CmdRetval::Normal)
}

pub(super) fn show_options(entry: &CmdEntry, server: &mut Server, args: &Args, ctx: &mut CmdCtx) -> CmdResult {
    let name = args.value(0);
    let def = match name.map(lookup).transpose() {
        Ok(d) => d.flatten(),
        Err(_) if args.has('q') => return Ok(CmdRetval::Normal),
        Err(e) => return Err(e.into()),
    };
    let scope = select_scope(server, ctx, args, wants_window(entry, args, def))?;
    let scope = scope.borrow();
    if args.has('J') {
        return match scope.to_json() {
            Ok(json) => {
                ctx.print(json);
                Ok(CmdRetval::Normal)
            }
            Err(e) => {
                ctx.error(e.to_string());
                Ok(CmdRetval::Error)
            }
        };
    }
    for line in show_lines(&scope, name, args.has('v')) {
        ctx.print(line);
    }
    Ok(CmdRetval::Normal)
}
