//! Flattening the session/window tree into chooser entries.
//!
//! Sessions are walked in name order and windows in index order. Each row
//! carries the template the chooser renders it with and the command run when
//! the row is picked.

use crate::choose::SelectionEntry;
use crate::cli::template_replace;
use crate::format::DEFAULT_SESSION_TEMPLATE;
use crate::types::Sessions;

pub const CHOOSE_TREE_SESSION_ACTION: &str = "switch-client -t '%%'";
pub const CHOOSE_TREE_WINDOW_ACTION: &str = "select-window -t '%%'";
/// DEFAULT_WINDOW_TEMPLATE followed by the pane title.
pub const CHOOSE_TREE_WINDOW_TEMPLATE: &str =
    "#{window_index}: #{window_name}#{window_flags} (#{window_panes} panes) \"#{pane_title}\"";
/// Prefix for window rows nested under their session.
pub const TREE_INDENT: &str = "    --> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeMode {
    Sessions,
    Windows,
    Both,
}

impl TreeMode {
    /// choose-tree flags: neither or both of -s/-w list the whole tree.
    pub fn from_flags(sessions: bool, windows: bool) -> Self {
        match (sessions, windows) {
            (true, false) => TreeMode::Sessions,
            (false, true) => TreeMode::Windows,
            _ => TreeMode::Both,
        }
    }

    pub fn has_sessions(self) -> bool {
        matches!(self, TreeMode::Sessions | TreeMode::Both)
    }

    pub fn has_windows(self) -> bool {
        matches!(self, TreeMode::Windows | TreeMode::Both)
    }
}

/// Caller overrides for row templates and actions; unset fields use the
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct ChooseTemplates {
    pub session_template: Option<String>,
    pub session_action: Option<String>,
    pub window_template: Option<String>,
    pub window_action: Option<String>,
}

impl ChooseTemplates {
    pub fn session_template(&self) -> &str {
        self.session_template.as_deref().unwrap_or(DEFAULT_SESSION_TEMPLATE)
    }

    pub fn session_action(&self) -> &str {
        self.session_action.as_deref().unwrap_or(CHOOSE_TREE_SESSION_ACTION)
    }

    pub fn window_template(&self) -> &str {
        self.window_template.as_deref().unwrap_or(CHOOSE_TREE_WINDOW_TEMPLATE)
    }

    pub fn window_action(&self) -> &str {
        self.window_action.as_deref().unwrap_or(CHOOSE_TREE_WINDOW_ACTION)
    }
}

/// Result of one build: the rows in display order and the row matching the
/// requester's position, if any.
#[derive(Debug, Default)]
pub struct ChooseTree {
    pub entries: Vec<SelectionEntry>,
    pub current: Option<usize>,
}

/// Bind an action template to one session (`name`) or window (`name:index`).
pub fn bind_action(template: &str, token: &str) -> String {
    template_replace(template, token, 1)
}

/// A window row selects its window, then runs its session row's action.
pub fn window_row_action(window_action: &str, session_action: Option<&str>) -> String {
    format!("{} ; {}", window_action, session_action.unwrap_or(""))
}

pub fn build_tree(
    sessions: &Sessions,
    current_session: Option<&str>,
    mode: TreeMode,
    templates: &ChooseTemplates,
) -> ChooseTree {
    let window_template = if mode == TreeMode::Both {
        format!("{}{}", TREE_INDENT, templates.window_template())
    } else {
        templates.window_template().to_string()
    };

    let mut tree = ChooseTree::default();
    for s in sessions.values() {
        let is_current = current_session == Some(s.name.as_str());
        // choosing windows only lists the requester's own session
        if mode == TreeMode::Windows && !is_current {
            continue;
        }

        let mut session_action = None;
        if mode.has_sessions() {
            let idx = tree.entries.len();
            let action = bind_action(templates.session_action(), &s.name);
            if is_current {
                tree.current = Some(idx);
            }
            tree.entries.push(SelectionEntry {
                display_template: templates.session_template().to_string(),
                action: action.clone(),
                session: s.id,
                window: None,
                sort_index: idx,
            });
            session_action = Some(action);
        }

        if mode.has_windows() {
            for w in s.windows.values() {
                let idx = tree.entries.len();
                if is_current && s.curw == Some(w.index) {
                    tree.current = Some(idx);
                }
                let token = format!("{}:{}", s.name, w.index);
                let action = window_row_action(
                    &bind_action(templates.window_action(), &token),
                    session_action.as_deref(),
                );
                tree.entries.push(SelectionEntry {
                    display_template: window_template.clone(),
                    action,
                    session: s.id,
                    window: Some(w.index),
                    sort_index: idx,
                });
            }
        }

        if mode == TreeMode::Windows {
            break;
        }
    }
    tracing::debug!(entries = tree.entries.len(), current = ?tree.current, ?mode, "built choose tree");
    tree
}
