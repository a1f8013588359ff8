use crate::error::OptionError;
use crate::options::{Options, OptionValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionClass { Session, Window }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Number { min: i64, max: i64 },
    /// on/off, stored as 1/0
    Flag,
    /// One of a fixed list, stored as its position.
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionDefault { Str(&'static str), Num(i64) }

#[derive(Debug, Clone, Copy)]
pub struct OptionDef {
    pub name: &'static str,
    pub class: OptionClass,
    pub kind: OptionKind,
    pub default: OptionDefault,
}

const BIG: i64 = i32::MAX as i64;

const fn def(name: &'static str, class: OptionClass, kind: OptionKind, default: OptionDefault) -> OptionDef {
    OptionDef { name, class, kind, default }
}

use OptionClass::{Session as S, Window as W};
use OptionDefault::{Num, Str};

/// Known options, sorted by name.
pub static OPTION_TABLE: &[OptionDef] = &[
    def("aggressive-resize", W, OptionKind::Flag, Num(0)),
    def("automatic-rename", W, OptionKind::Flag, Num(1)),
    def("base-index", S, OptionKind::Number { min: 0, max: BIG }, Num(0)),
    def("bell-action", S, OptionKind::Choice(&["none", "any", "current"]), Num(1)),
    def("default-shell", S, OptionKind::String, Str("")),
    def("display-panes-time", S, OptionKind::Number { min: 1, max: BIG }, Num(1000)),
    def("display-time", S, OptionKind::Number { min: 1, max: BIG }, Num(750)),
    def("escape-time", S, OptionKind::Number { min: 0, max: BIG }, Num(500)),
    def("history-limit", S, OptionKind::Number { min: 0, max: BIG }, Num(2000)),
    def("main-pane-height", W, OptionKind::Number { min: 1, max: i16::MAX as i64 }, Num(24)),
    def("main-pane-width", W, OptionKind::Number { min: 1, max: i16::MAX as i64 }, Num(80)),
    def("mode-keys", W, OptionKind::Choice(&["emacs", "vi"]), Num(0)),
    def("monitor-activity", W, OptionKind::Flag, Num(0)),
    def("mouse", S, OptionKind::Flag, Num(1)),
    def("pane-base-index", W, OptionKind::Number { min: 0, max: u16::MAX as i64 }, Num(0)),
    def("prefix", S, OptionKind::String, Str("C-b")),
    def("remain-on-exit", W, OptionKind::Flag, Num(0)),
    def("renumber-windows", S, OptionKind::Flag, Num(0)),
    def("set-titles", S, OptionKind::Flag, Num(0)),
    def("set-titles-string", S, OptionKind::String, Str("#S:#I:#W - \"#T\"")),
    def("status", S, OptionKind::Flag, Num(1)),
    def("status-interval", S, OptionKind::Number { min: 0, max: BIG }, Num(15)),
    def("status-justify", S, OptionKind::Choice(&["left", "centre", "right"]), Num(0)),
    def("status-keys", S, OptionKind::Choice(&["emacs", "vi"]), Num(0)),
    def("status-left", S, OptionKind::String, Str("[#S] ")),
    def("status-left-length", S, OptionKind::Number { min: 0, max: i16::MAX as i64 }, Num(10)),
    def("status-position", S, OptionKind::Choice(&["top", "bottom"]), Num(1)),
    def("status-right", S, OptionKind::String, Str(" \"#T\" %H:%M %d-%b-%y")),
    def("status-right-length", S, OptionKind::Number { min: 0, max: i16::MAX as i64 }, Num(40)),
    def("status-style", S, OptionKind::String, Str("bg=green,fg=black")),
    def("synchronize-panes", W, OptionKind::Flag, Num(0)),
    def("window-status-current-format", W, OptionKind::String, Str("#I:#W#F")),
    def("window-status-format", W, OptionKind::String, Str("#I:#W#F")),
    def("window-status-separator", W, OptionKind::String, Str(" ")),
    def("word-separators", S, OptionKind::String, Str(" -_@")),
];

pub fn find_option_def(name: &str) -> Option<&'static OptionDef> {
    OPTION_TABLE.binary_search_by(|d| d.name.cmp(name)).ok().map(|i| &OPTION_TABLE[i])
}

/// Global scope filled with every default from the table.
pub fn default_options() -> Options {
    let mut oo = Options::new();
    for d in OPTION_TABLE {
        match d.default {
            Str(s) => oo.set_string(d.name, s),
            Num(n) => oo.set_number(d.name, n),
        }
    }
    oo
}

fn invalid(name: &str, value: &str, reason: &str) -> OptionError {
    OptionError::InvalidOptionValue { name: name.to_string(), value: value.to_string(), reason: reason.to_string() }
}

/// Turn the text given to set-option into a stored value. `current` is the
/// value the scope sees now, used to toggle a flag given no value.
/// `def` is `None` for user (`@`) options, which are plain strings.
pub fn parse_option_value(
    name: &str,
    def: Option<&OptionDef>,
    value: Option<&str>,
    current: Option<&OptionValue>,
) -> Result<OptionValue, OptionError> {
    let kind = def.map(|d| d.kind).unwrap_or(OptionKind::String);
    match kind {
        OptionKind::String => match value {
            Some(v) => Ok(OptionValue::String(v.to_string())),
            None => Err(invalid(name, "", "empty value")),
        },
        OptionKind::Number { min, max } => {
            let v = value.ok_or_else(|| invalid(name, "", "empty value"))?;
            let n: i64 = v.parse().map_err(|_| invalid(name, v, "invalid number"))?;
            if n < min {
                return Err(invalid(name, v, "too small"));
            }
            if n > max {
                return Err(invalid(name, v, "too large"));
            }
            Ok(OptionValue::Number(n))
        }
        OptionKind::Flag => {
            let n = match value.unwrap_or("") {
                "" => i64::from(current.and_then(OptionValue::as_number).unwrap_or(0) == 0),
                v if matches!(v.to_ascii_lowercase().as_str(), "on" | "yes" | "1" | "true") => 1,
                v if matches!(v.to_ascii_lowercase().as_str(), "off" | "no" | "0" | "false") => 0,
                v => return Err(invalid(name, v, "expected on or off")),
            };
            Ok(OptionValue::Number(n))
        }
        OptionKind::Choice(choices) => {
            let v = value.ok_or_else(|| invalid(name, "", "empty value"))?;
            choices.iter().position(|c| *c == v)
                .map(|i| OptionValue::Number(i as i64))
                .ok_or_else(|| invalid(name, v, "unknown value"))
        }
    }
}

/// Value as shown by show-options: flags and choices by name, strings quoted
/// unless `bare`.
pub fn print_option_value(def: Option<&OptionDef>, value: &OptionValue, bare: bool) -> String {
    match (def.map(|d| d.kind), value) {
        (Some(OptionKind::Flag), OptionValue::Number(n)) => if *n != 0 { "on".into() } else { "off".into() },
        (Some(OptionKind::Choice(choices)), OptionValue::Number(n)) => {
            usize::try_from(*n).ok().and_then(|i| choices.get(i)).map(|c| c.to_string()).unwrap_or_else(|| n.to_string())
        }
        (_, OptionValue::String(s)) if !bare => format!("\"{}\"", s),
        (_, v) => v.to_string(),
    }
}

/// show-options lines for the entries defined directly in `oo`.
pub fn show_options(oo: &Options, name: Option<&str>, values_only: bool) -> Vec<String> {
    oo.iter()
        .filter(|(k, _)| name.map_or(true, |n| n == *k))
        .map(|(k, v)| {
            let shown = print_option_value(find_option_def(k), v, values_only);
            if values_only { shown } else { format!("{} {}", k, shown) }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_for_binary_search() {
        assert!(OPTION_TABLE.windows(2).all(|w| w[0].name < w[1].name));
        assert_eq!(find_option_def("status-left").map(|d| d.class), Some(OptionClass::Session));
        assert_eq!(find_option_def("mode-keys").map(|d| d.class), Some(OptionClass::Window));
        assert!(find_option_def("no-such").is_none());
    }

    #[test]
    fn defaults_cover_table() {
        let oo = default_options();
        assert_eq!(oo.len(), OPTION_TABLE.len());
        assert_eq!(oo.get_number("history-limit").unwrap(), 2000);
        assert_eq!(oo.get_string("status-left").unwrap(), "[#S] ");
    }

    #[test]
    fn parse_by_kind() {
        let d = find_option_def("base-index");
        assert_eq!(parse_option_value("base-index", d, Some("3"), None), Ok(OptionValue::Number(3)));
        assert!(parse_option_value("base-index", d, Some("-1"), None).is_err());
        assert!(parse_option_value("base-index", d, Some("x"), None).is_err());

        let d = find_option_def("status");
        assert_eq!(parse_option_value("status", d, Some("off"), None), Ok(OptionValue::Number(0)));
        assert_eq!(parse_option_value("status", d, None, Some(&OptionValue::Number(1))), Ok(OptionValue::Number(0)));
        assert_eq!(parse_option_value("status", d, None, Some(&OptionValue::Number(0))), Ok(OptionValue::Number(1)));
        assert!(parse_option_value("status", d, Some("maybe"), None).is_err());

        let d = find_option_def("mode-keys");
        assert_eq!(parse_option_value("mode-keys", d, Some("vi"), None), Ok(OptionValue::Number(1)));
        assert!(parse_option_value("mode-keys", d, Some("ed"), None).is_err());

        assert_eq!(parse_option_value("@plugin", None, Some("x"), None), Ok(OptionValue::String("x".into())));
        assert!(parse_option_value("@plugin", None, None, None).is_err());
    }

    #[test]
    fn show_formats_by_kind() {
        let mut oo = Options::new();
        oo.set_number("mode-keys", 1);
        oo.set_number("status", 0);
        oo.set_string("status-left", "hi");
        oo.set_number("history-limit", 10);
        assert_eq!(show_options(&oo, None, false), vec![
            "history-limit 10", "mode-keys vi", "status off", "status-left \"hi\"",
        ]);
        assert_eq!(show_options(&oo, Some("status-left"), true), vec!["hi"]);
    }
}
