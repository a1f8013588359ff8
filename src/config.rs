use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::commands::CmdRetval;
use crate::server::Server;

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("USERPROFILE").or_else(|_| env::var("HOME")).unwrap_or_default())
}

/// Config files in the order they are tried; only the first one found is
/// read.
pub fn config_paths() -> Vec<PathBuf> {
    let home = home_dir();
    vec![
        home.join(".psmux.conf"),
        home.join(".psmuxrc"),
        home.join(".tmux.conf"),
        home.join(".config").join("psmux").join("psmux.conf"),
    ]
}

/// Load the first config file that exists. Returns the errors it produced.
pub fn load_config(server: &mut Server) -> Vec<String> {
    for path in config_paths() {
        if path.is_file() {
            return match source_file(server, &path) {
                Ok(errors) => errors,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "can't read config");
                    vec![format!("{}: {}", path.display(), e)]
                }
            };
        }
    }
    debug!("no config file found");
    Vec::new()
}

pub fn source_file(server: &mut Server, path: &Path) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    info!(path = %path.display(), "loading config");
    let errors = parse_config_content(server, &content)
        .into_iter()
        .map(|e| format!("{}:{}", path.display(), e))
        .collect();
    Ok(errors)
}

/// Run each logical line as a command with no client attached. A trailing
/// backslash continues the line. Errors are returned as `line: message`
/// and do not stop later lines.
pub fn parse_config_content(server: &mut Server, content: &str) -> Vec<String> {
    let mut errors = Vec::new();
    let mut pending = String::new();
    let mut start = 0;
    for (n, raw) in content.lines().enumerate() {
        if pending.is_empty() {
            start = n + 1;
        }
        let line = raw.trim();
        if let Some(head) = line.strip_suffix('\\') {
            pending.push_str(head);
            pending.push(' ');
            continue;
        }
        pending.push_str(line);
        let full = std::mem::take(&mut pending);
        errors.extend(parse_config_line(server, &full).into_iter().map(|e| format!("{}: {}", start, e)));
    }
    if !pending.is_empty() {
        errors.extend(parse_config_line(server, &pending).into_iter().map(|e| format!("{}: {}", start, e)));
    }
    errors
}

pub fn parse_config_line(server: &mut Server, line: &str) -> Vec<String> {
    let l = line.trim();
    if l.is_empty() || l.starts_with('#') {
        return Vec::new();
    }
    let (retval, ctx) = server.run_command(None, l);
    if retval == CmdRetval::Error {
        for e in &ctx.errors {
            warn!(line = l, "config: {}", e);
        }
    }
    ctx.errors
}
