mod choose_tree;
mod clock_mode;
mod options;
mod window;

use std::rc::Rc;

use tracing::{debug, trace};

use crate::cli::{parse_target, split_commands, Args};
use crate::error::CmdError;
use crate::server::Server;
use crate::types::{Client, Pane};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdRetval {
    Normal,
    Error,
}

pub type CmdResult = Result<CmdRetval, CmdError>;

/// Per-invocation context: who asked, and what the command printed.
#[derive(Debug, Default)]
pub struct CmdCtx {
    /// `None` when running from the config file.
    pub client: Option<Rc<Client>>,
    pub output: Vec<String>,
    pub errors: Vec<String>,
}

impl CmdCtx {
    pub fn new(client: Option<Rc<Client>>) -> Self {
        Self { client, output: Vec::new(), errors: Vec::new() }
    }

    pub fn print(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// The requesting client, if it is still attached.
    pub fn live_client(&self) -> Option<&Rc<Client>> {
        self.client.as_ref().filter(|c| !c.is_dead())
    }
}

pub type CmdExec = fn(&CmdEntry, &mut Server, &Args, &mut CmdCtx) -> CmdResult;

pub struct CmdEntry {
    pub name: &'static str,
    pub alias: Option<&'static str>,
    /// getopt-style flag template, e.g. `"F:t:"`.
    pub args_template: &'static str,
    pub lower: usize,
    pub upper: Option<usize>,
    pub usage: &'static str,
    pub exec: CmdExec,
}

impl std::fmt::Debug for CmdEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmdEntry").field("name", &self.name).finish()
    }
}

pub static CMD_TABLE: &[CmdEntry] = &[
    CmdEntry {
        name: "choose-session", alias: None, args_template: "F:t:", lower: 0, upper: Some(1),
        usage: "[-F format] [-t target-window] [template]", exec: choose_tree::exec,
    },
    CmdEntry {
        name: "choose-tree", alias: None, args_template: "S:W:swb:c:t:", lower: 0, upper: Some(0),
        usage: "[-sw] [-b session-template] [-c window template] [-S format] [-W format] [-t target-window]",
        exec: choose_tree::exec,
    },
    CmdEntry {
        name: "choose-window", alias: None, args_template: "F:t:", lower: 0, upper: Some(1),
        usage: "[-F format] [-t target-window] [template]", exec: choose_tree::exec,
    },
    CmdEntry {
        name: "clock-mode", alias: None, args_template: "t:", lower: 0, upper: Some(0),
        usage: "[-t target-pane]", exec: clock_mode::exec,
    },
    CmdEntry {
        name: "select-window", alias: Some("selectw"), args_template: "t:", lower: 0, upper: Some(0),
        usage: "[-t target-window]", exec: window::select_window,
    },
    CmdEntry {
        name: "set-option", alias: Some("set"), args_template: "gpqwt:", lower: 1, upper: Some(2),
        usage: "[-gpqw] [-t target] option [value]", exec: options::set_option,
    },
    CmdEntry {
        name: "set-window-option", alias: Some("setw"), args_template: "gqt:", lower: 1, upper: Some(2),
        usage: "[-gq] [-t target-window] option [value]", exec: options::set_option,
    },
    CmdEntry {
        name: "show-options", alias: Some("show"), args_template: "gJpqvwt:", lower: 0, upper: Some(1),
        usage: "[-gJpqvw] [-t target] [option]", exec: options::show_options,
    },
    CmdEntry {
        name: "show-window-options", alias: Some("showw"), args_template: "gJvt:", lower: 0, upper: Some(1),
        usage: "[-gJv] [-t target-window] [option]", exec: options::show_options,
    },
    CmdEntry {
        name: "switch-client", alias: Some("switchc"), args_template: "c:t:", lower: 0, upper: Some(0),
        usage: "[-c target-client] [-t target-session]", exec: window::switch_client,
    },
];

/// Exact name or alias first, then a unique prefix of a name.
pub fn find_entry(name: &str) -> Result<&'static CmdEntry, CmdError> {
    if let Some(e) = CMD_TABLE.iter().find(|e| e.name == name || e.alias == Some(name)) {
        return Ok(e);
    }
    let mut matches = CMD_TABLE.iter().filter(|e| e.name.starts_with(name));
    match (matches.next(), matches.next()) {
        (Some(e), None) if !name.is_empty() => Ok(e),
        (Some(_), Some(_)) => Err(CmdError::AmbiguousCommand(name.to_string())),
        _ => Err(CmdError::UnknownCommand(name.to_string())),
    }
}

/// Run every command on the line in order, stopping at the first error.
pub fn execute(server: &mut Server, ctx: &mut CmdCtx, line: &str) -> CmdRetval {
    let mut retval = CmdRetval::Normal;
    for argv in split_commands(line) {
        retval = run_argv(server, ctx, &argv);
        if retval == CmdRetval::Error {
            break;
        }
    }
    retval
}

fn run_argv(server: &mut Server, ctx: &mut CmdCtx, argv: &[String]) -> CmdRetval {
    let Some((name, rest)) = argv.split_first() else {
        return CmdRetval::Normal;
    };
    let entry = match find_entry(name) {
        Ok(e) => e,
        Err(e) => {
            ctx.error(e.to_string());
            return CmdRetval::Error;
        }
    };
    let args = match Args::parse(entry.args_template, rest, entry.lower, entry.upper) {
        Ok(a) => a,
        Err(reason) => {
            debug!(command = entry.name, %reason, "bad arguments");
            let err = CmdError::Usage { usage: format!("{} {}", entry.name, entry.usage) };
            ctx.error(err.to_string());
            return CmdRetval::Error;
        }
    };
    trace!(command = entry.name, ?argv, "running");
    match (entry.exec)(entry, server, &args, ctx) {
        Ok(r) => r,
        Err(CmdError::ModeEntryRejected) => {
            debug!(command = entry.name, "pane busy, ignored");
            CmdRetval::Normal
        }
        Err(e) => {
            debug!(command = entry.name, error = %e, "command failed");
            ctx.error(e.to_string());
            CmdRetval::Error
        }
    }
}

/// Where a target string points: a session by name, one of its windows by
/// index and a pane by position in that window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub session: String,
    pub window: u32,
    pub pane: usize,
}

fn not_found(kind: &str, what: &str) -> CmdError {
    CmdError::TargetNotFound(format!("{}: {}", kind, what))
}

/// Session named by `target`, or the client's own when no session is given.
pub fn resolve_session(server: &Server, ctx: &CmdCtx, target: Option<&str>) -> Result<String, CmdError> {
    let parsed = parse_target(target.unwrap_or(""));
    if parsed.window_is_id || parsed.pane_is_id {
        return resolve_pane(server, ctx, target).map(|t| t.session);
    }
    match parsed.session {
        Some(name) if parsed.session_is_id => server.sessions.values()
            .find(|s| s.id.to_string() == name)
            .map(|s| s.name.clone())
            .ok_or_else(|| not_found("session", &format!("${}", name))),
        Some(name) => {
            if server.sessions.contains_key(&name) {
                return Ok(name);
            }
            let mut prefixed = server.sessions.keys().filter(|k| k.starts_with(&name));
            match (prefixed.next(), prefixed.next()) {
                (Some(k), None) => Ok(k.clone()),
                _ => Err(not_found("session", &name)),
            }
        }
        None => ctx.live_client()
            .and_then(|c| c.session())
            .filter(|s| server.sessions.contains_key(s))
            .ok_or_else(|| not_found("session", target.unwrap_or("(current)"))),
    }
}

/// Session and window index; the session's current window when no window
/// is given.
pub fn resolve_window(server: &Server, ctx: &CmdCtx, target: Option<&str>) -> Result<(String, u32), CmdError> {
    let t = resolve_pane(server, ctx, target)?;
    Ok((t.session, t.window))
}

pub fn resolve_pane(server: &Server, ctx: &CmdCtx, target: Option<&str>) -> Result<Target, CmdError> {
    let raw = target.unwrap_or("");
    let parsed = parse_target(raw);
    if parsed.pane_is_id {
        let id = parsed.pane.unwrap_or(u32::MAX);
        for s in server.sessions.values() {
            for w in s.windows.values() {
                if let Some(pos) = w.panes.iter().position(|p| p.id == id) {
                    return Ok(Target { session: s.name.clone(), window: w.index, pane: pos });
                }
            }
        }
        return Err(not_found("pane", raw));
    }
    if parsed.window_is_id {
        let id = parsed.window.unwrap_or(u32::MAX);
        return server.sessions.values()
            .flat_map(|s| s.windows.values().map(move |w| (s, w)))
            .find(|(_, w)| w.id == id)
            .map(|(s, w)| Target { session: s.name.clone(), window: w.index, pane: w.active_pane })
            .ok_or_else(|| not_found("window", raw));
    }

    let session_part = parsed.session.as_ref().map(|_| match raw.find(':') {
        Some(pos) => &raw[..pos],
        None => raw,
    });
    let session = resolve_session(server, ctx, session_part)?;
    let s = server.sessions.get(&session).ok_or_else(|| not_found("session", &session))?;
    let window = match parsed.window {
        Some(idx) if s.windows.contains_key(&idx) => idx,
        Some(_) => return Err(not_found("window", raw)),
        None => s.curw.ok_or_else(|| not_found("window", raw))?,
    };
    let w = s.windows.get(&window).ok_or_else(|| not_found("window", raw))?;
    let pane = match parsed.pane {
        Some(pos) => usize::try_from(pos).ok()
            .filter(|&p| p < w.panes.len())
            .ok_or_else(|| not_found("pane", raw))?,
        None => w.active_pane,
    };
    Ok(Target { session, window, pane })
}

pub fn target_pane_mut<'a>(server: &'a mut Server, t: &Target) -> Option<&'a mut Pane> {
    server.sessions.get_mut(&t.session)?.windows.get_mut(&t.window)?.panes.get_mut(t.pane)
}
