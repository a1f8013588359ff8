//! Format expansion for chooser rows and option strings.
//!
//! Supports: #{variable}, #{?cond,true,false}, #{==:a,b}, #{!=:a,b},
//! shorthands #S #I #W #F #T #P #D ##, and #, inside conditional branches.
//! Variables are collected up front into a FormatTree for one
//! session/window/pane, then the template is expanded against it.

use std::collections::BTreeMap;

use crate::types::{Pane, Session, Window, VERSION};

pub const DEFAULT_SESSION_TEMPLATE: &str = "#{session_name}: #{session_windows} windows\
#{?session_grouped, (group ,}#{session_group}#{?session_grouped,),}\
#{?session_attached, (attached),}";

pub const DEFAULT_WINDOW_TEMPLATE: &str =
    "#{window_index}: #{window_name}#{window_flags} (#{window_panes} panes)";

/// Variables for one expansion context.
#[derive(Debug, Default, Clone)]
pub struct FormatTree {
    vars: BTreeMap<String, String>,
}

impl FormatTree {
    pub fn new() -> Self {
        let mut ft = Self::default();
        ft.add("version", VERSION);
        ft
    }

    /// Context for a chooser row: the session, and the window when the row
    /// stands for one.
    pub fn for_entry(session: &Session, window: Option<&Window>, attached: usize) -> Self {
        let mut ft = Self::new();
        ft.add_session(session, attached);
        if let Some(w) = window {
            ft.add_window(session, w);
            if let Some(p) = w.active_pane() {
                ft.add_pane(w, p);
            }
        }
        ft
    }

    pub fn add(&mut self, key: &str, value: impl Into<String>) {
        self.vars.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn add_session(&mut self, s: &Session, attached: usize) {
        self.add("session_name", s.name.clone());
        self.add("session_id", format!("${}", s.id));
        self.add("session_windows", s.windows.len().to_string());
        self.add("session_attached", attached.to_string());
        self.add("session_many_attached", if attached > 1 { "1" } else { "0" });
        self.add("session_grouped", "0");
        self.add("session_group", "");
        self.add("session_created", s.created.timestamp().to_string());
        self.add("session_created_string", s.created.format("%a %b %e %H:%M:%S %Y").to_string());
    }

    pub fn add_window(&mut self, s: &Session, w: &Window) {
        let is_current = s.curw == Some(w.index);
        self.add("window_index", w.index.to_string());
        self.add("window_id", format!("@{}", w.id));
        self.add("window_name", w.name.clone());
        self.add("window_flags", w.flags(is_current));
        self.add("window_active", if is_current { "1" } else { "0" });
        self.add("window_panes", w.panes.len().to_string());
    }

    pub fn add_pane(&mut self, w: &Window, p: &Pane) {
        let index = w.panes.iter().position(|q| q.id == p.id).unwrap_or(0);
        self.add("pane_index", index.to_string());
        self.add("pane_id", format!("%{}", p.id));
        // tmux falls back to the window name for an untitled pane
        self.add("pane_title", if p.title.is_empty() { w.name.clone() } else { p.title.clone() });
        self.add("pane_active", if index == w.active_pane { "1" } else { "0" });
        self.add("pane_in_mode", if p.mode.is_some() { "1" } else { "0" });
    }

    pub fn expand(&self, fmt: &str) -> String {
        let mut result = String::with_capacity(fmt.len() * 2);
        let bytes = fmt.as_bytes();
        let len = bytes.len();
        let mut i = 0;
        while i < len {
            if bytes[i] == b'#' && i + 1 < len {
                if bytes[i + 1] == b'{' {
                    if let Some(close) = find_matching_brace(fmt, i + 2) {
                        result.push_str(&self.expand_expression(&fmt[i + 2..close]));
                        i = close + 1;
                        continue;
                    }
                }
                let short = match bytes[i + 1] {
                    b'S' => Some("session_name"),
                    b'I' => Some("window_index"),
                    b'W' => Some("window_name"),
                    b'F' => Some("window_flags"),
                    b'T' => Some("pane_title"),
                    b'P' => Some("pane_index"),
                    b'D' => Some("pane_id"),
                    _ => None,
                };
                if let Some(var) = short {
                    result.push_str(self.get(var).unwrap_or(""));
                    i += 2;
                    continue;
                }
                if bytes[i + 1] == b'#' || bytes[i + 1] == b',' {
                    result.push(bytes[i + 1] as char);
                    i += 2;
                    continue;
                }
            }
            let ch = fmt[i..].chars().next().unwrap_or('\u{fffd}');
            result.push(ch);
            i += ch.len_utf8().max(1);
        }
        result
    }

    /// Expand a `#{...}` expression (the content between `#{` and `}`).
    fn expand_expression(&self, expr: &str) -> String {
        if let Some(body) = expr.strip_prefix('?') {
            return self.expand_conditional(body);
        }
        for op in ["==", "!="] {
            if let Some(body) = expr.strip_prefix(op).and_then(|b| b.strip_prefix(':')) {
                let parts = split_at_depth0(body, b',');
                let lhs = self.expand(parts.first().map(String::as_str).unwrap_or(""));
                let rhs = self.expand(parts.get(1).map(String::as_str).unwrap_or(""));
                let equal = lhs == rhs;
                return if equal == (op == "==") { "1".into() } else { "0".into() };
            }
        }
        self.get(expr).unwrap_or("").to_string()
    }

    fn expand_conditional(&self, body: &str) -> String {
        let parts = split_at_depth0(body, b',');
        let cond = parts.first().map(String::as_str).unwrap_or("");
        let cond_val = if cond.contains('#') {
            self.expand(cond)
        } else {
            self.get(cond).unwrap_or("").to_string()
        };
        let branch = if is_truthy(&cond_val) { parts.get(1) } else { parts.get(2) };
        branch.map(|b| self.expand(b)).unwrap_or_default()
    }
}

#[inline]
fn is_truthy(s: &str) -> bool {
    !s.is_empty() && s != "0"
}

fn find_matching_brace(s: &str, start: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 1usize;
    let mut i = start;
    while i < bytes.len() {
        if bytes[i] == b'}' {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        } else if i + 1 < bytes.len() && bytes[i] == b'#' && bytes[i + 1] == b'{' {
            depth += 1;
            i += 1;
        }
        i += 1;
    }
    None
}

fn split_at_depth0(s: &str, delim: u8) -> Vec<String> {
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'#' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            depth += 1;
            i += 2;
            continue;
        }
        if bytes[i] == b'}' && depth > 0 {
            depth -= 1;
            i += 1;
            continue;
        }
        // #, is an escaped delimiter
        if bytes[i] == b'#' && i + 1 < bytes.len() && bytes[i + 1] == delim && depth == 0 {
            i += 2;
            continue;
        }
        if bytes[i] == delim && depth == 0 {
            parts.push(s[start..i].to_string());
            start = i + 1;
        }
        i += 1;
    }
    parts.push(s[start..].to_string());
    parts
}
