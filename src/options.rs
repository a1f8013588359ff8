//! Scoped option storage.
//!
//! Each scope is a sorted map of name -> value with a weak link to the scope
//! it falls back to (pane -> window -> session -> global). Lookups walk the
//! chain and the nearest definition wins, whatever its type.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Serialize;

use crate::error::OptionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    String(String),
    Number(i64),
}

impl OptionValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            OptionValue::String(_) => "string",
            OptionValue::Number(_) => "number",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s),
            OptionValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            OptionValue::Number(n) => Some(*n),
            OptionValue::String(_) => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::String(s) => f.write_str(s),
            OptionValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Scopes are shared between their owner and the child scopes that fall
/// back to them.
pub type SharedOptions = Rc<RefCell<Options>>;

#[derive(Debug, Default)]
pub struct Options {
    tree: BTreeMap<String, OptionValue>,
    /// Never keeps the parent alive; a dropped parent ends the chain.
    parent: Option<Weak<RefCell<Options>>>,
}

impl Options {
    /// A root scope (the global options).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: &SharedOptions) -> Self {
        Self { tree: BTreeMap::new(), parent: Some(Rc::downgrade(parent)) }
    }

    pub fn shared(self) -> SharedOptions {
        Rc::new(RefCell::new(self))
    }

    pub fn parent(&self) -> Option<SharedOptions> {
        self.parent.as_ref()?.upgrade()
    }

    /// Entry defined directly in this scope, ignoring ancestors.
    pub fn find_local(&self, name: &str) -> Option<&OptionValue> {
        self.tree.get(name)
    }

    /// Nearest definition of `name` along the parent chain.
    pub fn find(&self, name: &str) -> Option<OptionValue> {
        if let Some(v) = self.tree.get(name) {
            return Some(v.clone());
        }
        let mut next = self.parent();
        while let Some(scope) = next {
            let parent = {
                let scope = scope.borrow();
                if let Some(v) = scope.tree.get(name) {
                    return Some(v.clone());
                }
                scope.parent()
            };
            next = parent;
        }
        None
    }

    pub fn set_string(&mut self, name: &str, value: impl Into<String>) {
        self.tree.insert(name.to_string(), OptionValue::String(value.into()));
    }

    pub fn set_number(&mut self, name: &str, value: i64) {
        self.tree.insert(name.to_string(), OptionValue::Number(value));
    }

    pub fn get_string(&self, name: &str) -> Result<String, OptionError> {
        match self.find(name) {
            Some(OptionValue::String(s)) => Ok(s),
            Some(OptionValue::Number(_)) => {
                Err(OptionError::TypeMismatch { name: name.to_string(), expected: "string" })
            }
            None => Err(OptionError::MissingOption { name: name.to_string() }),
        }
    }

    pub fn get_number(&self, name: &str) -> Result<i64, OptionError> {
        match self.find(name) {
            Some(OptionValue::Number(n)) => Ok(n),
            Some(OptionValue::String(_)) => {
                Err(OptionError::TypeMismatch { name: name.to_string(), expected: "number" })
            }
            None => Err(OptionError::MissingOption { name: name.to_string() }),
        }
    }

    /// Local entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.tree.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Local entries as a JSON object, for front ends.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.tree)
    }
}
