use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::{DateTime, Local};

use crate::choose::ChooseMode;
use crate::error::{CmdError, OptionError};
use crate::options::{Options, SharedOptions};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reference counter shared by a session or client and every holder of a
/// [`Reference`] to it. Holders outlive the registry entry safely because
/// the counter itself is reference counted.
#[derive(Debug, Clone, Default)]
pub struct RefCount(Rc<Cell<u32>>);

impl RefCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }

    /// Take one reference; it is given back when the guard drops.
    pub fn hold(&self) -> Reference {
        self.0.set(self.0.get() + 1);
        Reference(Rc::clone(&self.0))
    }
}

/// One counted reference. Not `Clone`: every increment pairs with exactly
/// one decrement.
#[derive(Debug)]
pub struct Reference(Rc<Cell<u32>>);

impl Drop for Reference {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

/// Big clock display (tmux clock-mode). Drawing is done by the front end.
#[derive(Debug)]
pub struct ClockMode {
    pub entered_at: DateTime<Local>,
}

#[derive(Debug)]
pub enum PaneMode {
    Choose(ChooseMode),
    Clock(ClockMode),
}

impl PaneMode {
    pub fn name(&self) -> &'static str {
        match self {
            PaneMode::Choose(_) => "choose-mode",
            PaneMode::Clock(_) => "clock-mode",
        }
    }
}

#[derive(Debug)]
pub struct Pane {
    pub id: u32,
    pub title: String,
    pub options: SharedOptions,
    pub mode: Option<PaneMode>,
}

impl Pane {
    pub fn new(id: u32, window_options: &SharedOptions) -> Self {
        Self {
            id,
            title: String::new(),
            options: Options::with_parent(window_options).shared(),
            mode: None,
        }
    }

    /// A pane holds at most one mode; entering a second one is refused.
    pub fn set_mode(&mut self, mode: PaneMode) -> Result<(), CmdError> {
        if let Some(current) = &self.mode {
            tracing::debug!(pane = self.id, mode = current.name(), "pane already in a mode");
            return Err(CmdError::ModeEntryRejected);
        }
        tracing::debug!(pane = self.id, mode = mode.name(), "entering mode");
        self.mode = Some(mode);
        Ok(())
    }

    /// Leave the current mode, dropping whatever it owns.
    pub fn reset_mode(&mut self) {
        if let Some(mode) = self.mode.take() {
            tracing::debug!(pane = self.id, mode = mode.name(), "leaving mode");
        }
    }

    pub fn choose_mode(&self) -> Option<&ChooseMode> {
        match &self.mode {
            Some(PaneMode::Choose(m)) => Some(m),
            _ => None,
        }
    }

    pub fn choose_mode_mut(&mut self) -> Option<&mut ChooseMode> {
        match &mut self.mode {
            Some(PaneMode::Choose(m)) => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Window {
    pub id: u32,
    /// Position in the owning session's window list.
    pub index: u32,
    pub name: String,
    pub panes: Vec<Pane>,
    pub active_pane: usize,
    pub options: SharedOptions,
}

impl Window {
    pub fn new(id: u32, index: u32, name: &str, session_options: &SharedOptions) -> Self {
        Self {
            id,
            index,
            name: name.to_string(),
            panes: Vec::new(),
            active_pane: 0,
            options: Options::with_parent(session_options).shared(),
        }
    }

    pub fn active_pane(&self) -> Option<&Pane> {
        self.panes.get(self.active_pane)
    }

    pub fn active_pane_mut(&mut self) -> Option<&mut Pane> {
        self.panes.get_mut(self.active_pane)
    }

    /// Window flags as shown in lists: `*` marks the session's current window.
    pub fn flags(&self, is_current: bool) -> String {
        let mut f = String::new();
        if is_current {
            f.push('*');
        }
        if self.active_pane().map(|p| p.mode.is_some()).unwrap_or(false) {
            f.push('#');
        }
        f
    }
}

#[derive(Debug)]
pub struct Session {
    pub id: u32,
    pub name: String,
    pub windows: BTreeMap<u32, Window>,
    /// Index of the current window.
    pub curw: Option<u32>,
    pub created: DateTime<Local>,
    pub options: SharedOptions,
    pub references: RefCount,
}

impl Session {
    pub fn new(id: u32, name: &str, global_options: &SharedOptions) -> Self {
        Self {
            id,
            name: name.to_string(),
            windows: BTreeMap::new(),
            curw: None,
            created: Local::now(),
            options: Options::with_parent(global_options).shared(),
            references: RefCount::new(),
        }
    }

    pub fn current_window(&self) -> Option<&Window> {
        self.windows.get(&self.curw?)
    }

    pub fn current_window_mut(&mut self) -> Option<&mut Window> {
        let idx = self.curw?;
        self.windows.get_mut(&idx)
    }

    /// First free window index at or after `base-index`.
    pub fn next_window_index(&self) -> Result<u32, OptionError> {
        let base = self.options.borrow().get_number("base-index")?;
        let mut idx = u32::try_from(base).unwrap_or(0);
        while self.windows.contains_key(&idx) {
            idx += 1;
        }
        Ok(idx)
    }
}

/// Sessions in name order, as the chooser lists them.
pub type Sessions = BTreeMap<String, Session>;

#[derive(Debug)]
pub struct Client {
    pub name: String,
    session: RefCell<Option<String>>,
    dead: Cell<bool>,
    pub references: RefCount,
}

impl Client {
    pub fn new(name: &str, session: Option<&str>) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            session: RefCell::new(session.map(str::to_string)),
            dead: Cell::new(false),
            references: RefCount::new(),
        })
    }

    /// Name of the session the client is attached to.
    pub fn session(&self) -> Option<String> {
        self.session.borrow().clone()
    }

    pub fn set_session(&self, name: &str) {
        *self.session.borrow_mut() = Some(name.to_string());
    }

    pub fn is_dead(&self) -> bool {
        self.dead.get()
    }

    pub fn mark_dead(&self) {
        self.dead.set(true);
    }
}
