//! The interactive chooser.
//!
//! A SelectorSession owns the rows built by tree::build_tree together with
//! the references it took on the requesting client and session. ChooseMode
//! is the pane mode that drives it: it moves the selection on key input and
//! calls back into the selector when the user picks a row or gives up.

use std::rc::Rc;

use crossterm::event::KeyCode;
use serde::Serialize;
use unicode_width::UnicodeWidthChar;

use crate::format::FormatTree;
use crate::server::{CommandQueue, Server};
use crate::tree::ChooseTree;
use crate::types::{Client, Reference, Session};

/// One chooser row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    pub display_template: String,
    /// Command run when this row is chosen.
    pub action: String,
    /// Id of the session the row stands for.
    pub session: u32,
    /// Window index within that session; `None` for session rows.
    pub window: Option<u32>,
    pub sort_index: usize,
}

#[derive(Debug)]
pub struct SelectorSession {
    entries: Vec<SelectionEntry>,
    current: Option<usize>,
    client: Rc<Client>,
    client_ref: Option<Reference>,
    session_ref: Option<Reference>,
    torn_down: bool,
}

impl SelectorSession {
    /// Takes one reference on the client and one on its session; both are
    /// given back by [`teardown`](Self::teardown).
    pub fn new(tree: ChooseTree, client: Rc<Client>, session: &Session) -> Self {
        let current = tree.current.filter(|&i| i < tree.entries.len());
        Self {
            entries: tree.entries,
            current,
            client_ref: Some(client.references.hold()),
            session_ref: Some(session.references.hold()),
            client,
            torn_down: false,
        }
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn client(&self) -> &Rc<Client> {
        &self.client
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Queue the chosen row's action for the owning client. Nothing happens
    /// on cancel (`None`) or once the client has gone away.
    pub fn confirm(&self, entry: Option<&SelectionEntry>, queue: &mut CommandQueue) {
        let Some(entry) = entry else { return };
        if self.torn_down || self.client.is_dead() {
            tracing::debug!(client = %self.client.name, "choice dropped, client gone");
            return;
        }
        tracing::debug!(client = %self.client.name, action = %entry.action, "choice made");
        queue.push(Rc::clone(&self.client), &entry.action);
    }

    /// Release the references and rows. Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.client_ref = None;
        self.session_ref = None;
        self.entries = Vec::new();
        self.current = None;
        tracing::debug!(client = %self.client.name, "chooser torn down");
    }
}

impl Drop for SelectorSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChooseAction {
    Continue,
    /// The chooser is finished; the pane should leave the mode.
    Exit,
}

#[derive(Debug, Serialize)]
pub struct ChooseRow {
    pub text: String,
    pub session: u32,
    pub window: Option<u32>,
}

/// What a front end needs to draw the chooser.
#[derive(Debug, Serialize)]
pub struct ChooseSnapshot {
    pub rows: Vec<ChooseRow>,
    pub selected: usize,
    pub current: Option<usize>,
}

#[derive(Debug)]
pub struct ChooseMode {
    selector: SelectorSession,
    selected: usize,
    page: usize,
}

impl ChooseMode {
    pub fn new(selector: SelectorSession) -> Self {
        let selected = selector.current().unwrap_or(0);
        Self { selector, selected, page: 10 }
    }

    pub fn selector(&self) -> &SelectorSession {
        &self.selector
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn set_page_size(&mut self, rows: usize) {
        self.page = rows.max(1);
    }

    pub fn key(&mut self, key: KeyCode, queue: &mut CommandQueue) -> ChooseAction {
        let n = self.selector.entries().len();
        match key {
            KeyCode::Up | KeyCode::Char('k') if n > 0 => {
                self.selected = if self.selected == 0 { n - 1 } else { self.selected - 1 };
            }
            KeyCode::Down | KeyCode::Char('j') if n > 0 => {
                self.selected = if self.selected + 1 >= n { 0 } else { self.selected + 1 };
            }
            KeyCode::PageUp => {
                self.selected = self.selected.saturating_sub(self.page);
            }
            KeyCode::PageDown if n > 0 => {
                self.selected = (self.selected + self.page).min(n - 1);
            }
            KeyCode::Home => {
                self.selected = 0;
            }
            KeyCode::End => {
                self.selected = n.saturating_sub(1);
            }
            KeyCode::Enter => {
                self.selector.confirm(self.selector.entries().get(self.selected), queue);
                return ChooseAction::Exit;
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                self.selector.confirm(None, queue);
                return ChooseAction::Exit;
            }
            _ => {}
        }
        ChooseAction::Continue
    }

    /// Expanded row text, in display order.
    fn row_texts(&self, server: &Server) -> Vec<(String, &SelectionEntry)> {
        self.selector.entries().iter().map(|e| {
            let text = server.sessions.values().find(|s| s.id == e.session)
                .map(|s| {
                    let window = e.window.and_then(|idx| s.windows.get(&idx));
                    FormatTree::for_entry(s, window, server.attached_count(&s.name)).expand(&e.display_template)
                })
                .unwrap_or_default();
            (text, e)
        }).collect()
    }

    /// Rows cut to `width` cells; the selected one is marked with `>`.
    pub fn render(&self, server: &Server, width: usize) -> Vec<String> {
        self.row_texts(server).into_iter().enumerate().map(|(i, (text, _))| {
            let marker = if i == self.selected { "> " } else { "  " };
            truncate_to_width(&format!("{}{}", marker, text), width)
        }).collect()
    }

    pub fn snapshot(&self, server: &Server) -> ChooseSnapshot {
        let rows = self.row_texts(server).into_iter()
            .map(|(text, e)| ChooseRow { text, session: e.session, window: e.window })
            .collect();
        ChooseSnapshot { rows, selected: self.selected, current: self.selector.current() }
    }

    /// End the chooser now, whatever state it is in.
    pub fn finish(&mut self) {
        self.selector.teardown();
    }
}

fn truncate_to_width(s: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::tree::{build_tree, ChooseTemplates, TreeMode};
    use crate::types::Pane;

    fn fixture() -> Server {
        let mut server = Server::new();
        for (name, windows) in [("alpha", 2), ("beta", 1)] {
            server.new_session(name).unwrap();
            for i in 0..windows {
                server.new_window(name, &format!("{}{}", name, i)).unwrap();
            }
        }
        server
    }

    fn selector(server: &Server, client: &Rc<Client>) -> SelectorSession {
        let session = &server.sessions["alpha"];
        let tree = build_tree(&server.sessions, Some("alpha"), TreeMode::Both, &ChooseTemplates::default());
        SelectorSession::new(tree, Rc::clone(client), session)
    }

    #[test]
    fn references_held_until_teardown() {
        let server = fixture();
        let client = Client::new("c0", Some("alpha"));
        let mut sel = selector(&server, &client);
        assert_eq!(client.references.get(), 1);
        assert_eq!(server.sessions["alpha"].references.get(), 1);
        sel.teardown();
        sel.teardown();
        assert!(sel.is_torn_down());
        assert!(sel.entries().is_empty());
        assert_eq!(client.references.get(), 0);
        assert_eq!(server.sessions["alpha"].references.get(), 0);
        drop(sel);
        assert_eq!(client.references.get(), 0);
    }

    #[test]
    fn drop_tears_down() {
        let server = fixture();
        let client = Client::new("c0", Some("alpha"));
        let sel = selector(&server, &client);
        drop(sel);
        assert_eq!(client.references.get(), 0);
        assert_eq!(server.sessions["alpha"].references.get(), 0);
    }

    #[test]
    fn confirm_queues_action_verbatim() {
        let server = fixture();
        let client = Client::new("c0", Some("alpha"));
        let sel = selector(&server, &client);
        let mut queue = CommandQueue::default();
        sel.confirm(sel.entries().get(3), &mut queue);
        let item = queue.pop().unwrap();
        assert_eq!(item.command, "switch-client -t 'beta'");
        assert_eq!(item.client.name, "c0");
        sel.confirm(None, &mut queue);
        assert!(queue.is_empty());
    }

    #[test]
    fn confirm_after_client_death_is_noop_but_teardown_runs() {
        let server = fixture();
        let client = Client::new("c0", Some("alpha"));
        let mut sel = selector(&server, &client);
        client.mark_dead();
        let mut queue = CommandQueue::default();
        sel.confirm(sel.entries().first(), &mut queue);
        assert!(queue.is_empty());
        sel.teardown();
        assert_eq!(client.references.get(), 0);
        assert_eq!(server.sessions["alpha"].references.get(), 0);
    }

    #[test]
    fn current_out_of_range_becomes_none() {
        let global = Options::new().shared();
        let session = Session::new(0, "x", &global);
        let client = Client::new("c", Some("x"));
        let tree = ChooseTree { entries: Vec::new(), current: Some(3) };
        let sel = SelectorSession::new(tree, client, &session);
        assert_eq!(sel.current(), None);
    }

    #[test]
    fn navigation_wraps_and_enter_exits() {
        let server = fixture();
        let client = Client::new("c0", Some("alpha"));
        let mut mode = ChooseMode::new(selector(&server, &client));
        let mut queue = CommandQueue::default();
        // alpha's current window is its first, row 1
        assert_eq!(mode.selected(), 1);
        assert_eq!(mode.key(KeyCode::Up, &mut queue), ChooseAction::Continue);
        assert_eq!(mode.key(KeyCode::Up, &mut queue), ChooseAction::Continue);
        assert_eq!(mode.selected(), 4);
        mode.key(KeyCode::Down, &mut queue);
        assert_eq!(mode.selected(), 0);
        mode.key(KeyCode::End, &mut queue);
        assert_eq!(mode.selected(), 4);
        mode.key(KeyCode::PageUp, &mut queue);
        assert_eq!(mode.selected(), 0);
        mode.key(KeyCode::PageDown, &mut queue);
        assert_eq!(mode.selected(), 4);
        mode.key(KeyCode::Char('x'), &mut queue);
        assert!(queue.is_empty());
        assert_eq!(mode.key(KeyCode::Enter, &mut queue), ChooseAction::Exit);
        assert_eq!(queue.pop().unwrap().command, "select-window -t 'beta:0' ; switch-client -t 'beta'");
    }

    #[test]
    fn escape_cancels_without_dispatch() {
        let server = fixture();
        let client = Client::new("c0", Some("alpha"));
        let mut mode = ChooseMode::new(selector(&server, &client));
        let mut queue = CommandQueue::default();
        assert_eq!(mode.key(KeyCode::Esc, &mut queue), ChooseAction::Exit);
        assert!(queue.is_empty());
        mode.finish();
        assert_eq!(client.references.get(), 0);
    }

    #[test]
    fn render_and_snapshot() {
        let mut server = fixture();
        if let Some(w) = server.sessions.get_mut("alpha").and_then(|s| s.windows.get_mut(&0)) {
            let mut p = Pane::new(99, &w.options);
            p.title = "shell".into();
            w.panes = vec![p];
        }
        let client = Client::new("c0", Some("alpha"));
        let mode = ChooseMode::new(selector(&server, &client));
        let lines = mode.render(&server, 80);
        assert_eq!(lines[0], "  alpha: 2 windows");
        assert_eq!(lines[1], ">     --> 0: alpha0* (1 panes) \"shell\"");
        assert_eq!(mode.render(&server, 7)[0], "  alpha");

        let snap = mode.snapshot(&server);
        assert_eq!(snap.rows.len(), 5);
        assert_eq!((snap.selected, snap.current), (1, Some(1)));
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["rows"][3]["text"], "beta: 1 windows");
        assert_eq!(json["rows"][4]["window"], 0);
    }

    #[test]
    fn truncation_counts_wide_chars() {
        assert_eq!(truncate_to_width("日本語", 4), "日本");
        assert_eq!(truncate_to_width("abc", 10), "abc");
    }
}
