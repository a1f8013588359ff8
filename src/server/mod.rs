pub mod options;

use std::collections::VecDeque;
use std::rc::Rc;

use crossterm::event::KeyCode;
use tracing::{debug, info, warn};

use crate::choose::ChooseAction;
use crate::commands::{self, CmdCtx, CmdRetval};
use crate::error::CmdError;
use crate::options::SharedOptions;
use crate::types::{Client, Pane, Session, Sessions, Window};

/// A command line waiting to run on behalf of a client.
#[derive(Debug)]
pub struct QueuedCommand {
    pub client: Rc<Client>,
    pub command: String,
}

#[derive(Debug, Default)]
pub struct CommandQueue {
    items: VecDeque<QueuedCommand>,
}

impl CommandQueue {
    pub fn push(&mut self, client: Rc<Client>, command: &str) {
        self.items.push_back(QueuedCommand { client, command: command.to_string() });
    }

    pub fn pop(&mut self) -> Option<QueuedCommand> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Everything the server knows about: the global option scope, sessions in
/// name order, attached clients and the pending command queue.
#[derive(Debug)]
pub struct Server {
    pub options: SharedOptions,
    pub sessions: Sessions,
    pub clients: Vec<Rc<Client>>,
    pub queue: CommandQueue,
    next_session_id: u32,
    next_window_id: u32,
    next_pane_id: u32,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    pub fn new() -> Self {
        Self {
            options: options::default_options().shared(),
            sessions: Sessions::new(),
            clients: Vec::new(),
            queue: CommandQueue::default(),
            next_session_id: 0,
            next_window_id: 0,
            next_pane_id: 0,
        }
    }

    /// Create an empty session. `:` and `.` would break targets, so they
    /// become `_`.
    pub fn new_session(&mut self, name: &str) -> Result<&mut Session, CmdError> {
        let name = name.replace([':', '.'], "_");
        if name.is_empty() || self.sessions.contains_key(&name) {
            return Err(CmdError::DuplicateSession(name));
        }
        let id = self.next_session_id;
        self.next_session_id += 1;
        info!(session = %name, id, "session created");
        let session = Session::new(id, &name, &self.options);
        Ok(self.sessions.entry(name).or_insert(session))
    }

    /// Add a window with one pane at the session's next free index. The
    /// first window becomes the current one.
    pub fn new_window(&mut self, session: &str, name: &str) -> Result<u32, CmdError> {
        let s = self.sessions.get_mut(session)
            .ok_or_else(|| CmdError::TargetNotFound(format!("session: {}", session)))?;
        let index = s.next_window_index()?;
        let mut window = Window::new(self.next_window_id, index, name, &s.options);
        self.next_window_id += 1;
        window.panes.push(Pane::new(self.next_pane_id, &window.options));
        self.next_pane_id += 1;
        s.windows.insert(index, window);
        if s.curw.is_none() {
            s.curw = Some(index);
        }
        debug!(session, window = name, index, "window created");
        Ok(index)
    }

    /// Add a pane to an existing window; returns the pane id.
    pub fn new_pane(&mut self, session: &str, window: u32) -> Result<u32, CmdError> {
        let w = self.sessions.get_mut(session)
            .and_then(|s| s.windows.get_mut(&window))
            .ok_or_else(|| CmdError::TargetNotFound(format!("window: {}:{}", session, window)))?;
        let id = self.next_pane_id;
        self.next_pane_id += 1;
        w.panes.push(Pane::new(id, &w.options));
        Ok(id)
    }

    /// Remove a session. Panes in a mode lose it with the session, and
    /// clients attached to it are detached.
    pub fn kill_session(&mut self, name: &str) -> Result<(), CmdError> {
        self.sessions.remove(name)
            .ok_or_else(|| CmdError::TargetNotFound(format!("session: {}", name)))?;
        let attached: Vec<String> = self.clients.iter()
            .filter(|c| c.session().as_deref() == Some(name))
            .map(|c| c.name.clone())
            .collect();
        for client in attached {
            self.detach_client(&client);
        }
        info!(session = name, "session killed");
        Ok(())
    }

    pub fn session_by_id(&self, id: u32) -> Option<&Session> {
        self.sessions.values().find(|s| s.id == id)
    }

    pub fn attach_client(&mut self, name: &str, session: &str) -> Result<Rc<Client>, CmdError> {
        if !self.sessions.contains_key(session) {
            return Err(CmdError::TargetNotFound(format!("session: {}", session)));
        }
        let client = Client::new(name, Some(session));
        self.clients.push(Rc::clone(&client));
        info!(client = name, session, "client attached");
        Ok(client)
    }

    /// Mark the client dead and forget it. Holders of its `Rc` see
    /// `is_dead()` from now on.
    pub fn detach_client(&mut self, name: &str) -> bool {
        let Some(pos) = self.clients.iter().position(|c| c.name == name) else {
            return false;
        };
        let client = self.clients.remove(pos);
        client.mark_dead();
        info!(client = name, "client detached");
        true
    }

    pub fn find_client(&self, name: &str) -> Option<Rc<Client>> {
        self.clients.iter().find(|c| c.name == name && !c.is_dead()).cloned()
    }

    /// Number of live clients attached to the session.
    pub fn attached_count(&self, session: &str) -> usize {
        self.clients.iter()
            .filter(|c| !c.is_dead() && c.session().as_deref() == Some(session))
            .count()
    }

    pub fn find_pane(&self, id: u32) -> Option<&Pane> {
        self.sessions.values()
            .flat_map(|s| s.windows.values())
            .flat_map(|w| w.panes.iter())
            .find(|p| p.id == id)
    }

    pub fn find_pane_mut(&mut self, id: u32) -> Option<&mut Pane> {
        self.sessions.values_mut()
            .flat_map(|s| s.windows.values_mut())
            .flat_map(|w| w.panes.iter_mut())
            .find(|p| p.id == id)
    }

    /// Parse and run a command line now. `client` is `None` for commands
    /// from the config file.
    pub fn run_command(&mut self, client: Option<Rc<Client>>, line: &str) -> (CmdRetval, CmdCtx) {
        let mut ctx = CmdCtx::new(client);
        let retval = commands::execute(self, &mut ctx, line);
        (retval, ctx)
    }

    /// Run queued commands until the queue is empty, including any queued
    /// while running. Returns how many ran.
    pub fn process_queue(&mut self) -> usize {
        let mut ran = 0;
        while let Some(item) = self.queue.pop() {
            if item.client.is_dead() {
                debug!(client = %item.client.name, command = %item.command, "dropping command for dead client");
                continue;
            }
            let (retval, ctx) = self.run_command(Some(item.client), &item.command);
            if retval == CmdRetval::Error {
                for e in &ctx.errors {
                    warn!(command = %item.command, "{}", e);
                }
            }
            ran += 1;
        }
        ran
    }

    /// Feed a key to the chooser in a window's active pane. The pane leaves
    /// the mode when the chooser finishes. `None` if the pane is not
    /// choosing.
    pub fn choose_key(&mut self, session: &str, window: u32, key: KeyCode) -> Option<ChooseAction> {
        let Server { sessions, queue, .. } = self;
        let pane = sessions.get_mut(session)?.windows.get_mut(&window)?.active_pane_mut()?;
        let action = pane.choose_mode_mut()?.key(key, queue);
        if action == ChooseAction::Exit {
            pane.reset_mode();
        }
        Some(action)
    }
}
