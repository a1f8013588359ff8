use std::collections::BTreeMap;

/// Parsed target specification from a -t argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTarget {
    pub session: Option<String>,
    pub session_is_id: bool,
    pub window: Option<u32>,
    pub window_is_id: bool,
    pub pane: Option<u32>,
    pub pane_is_id: bool,
}

/// Parse a tmux-style target specification
pub fn parse_target(target: &str) -> ParsedTarget {
    let mut result = ParsedTarget::default();

    if let Some(rest) = target.strip_prefix('%') {
        if let Ok(pid) = rest.parse::<u32>() {
            result.pane = Some(pid);
            result.pane_is_id = true;
        }
        return result;
    }
    if let Some(rest) = target.strip_prefix('@') {
        if let Ok(wid) = rest.parse::<u32>() {
            result.window = Some(wid);
            result.window_is_id = true;
        }
        return result;
    }

    let (session_part, window_pane_part) = if let Some(colon_pos) = target.find(':') {
        let session = if colon_pos == 0 { None } else { Some(&target[..colon_pos]) };
        (session, Some(&target[colon_pos + 1..]))
    } else if target.starts_with('.') {
        (None, Some(target))
    } else if target.is_empty() {
        (None, None)
    } else {
        // A bare string without ':' or '.' is always a session name, even if numeric.
        (Some(target), None)
    };

    if let Some(s) = session_part {
        if let Some(id) = s.strip_prefix('$').and_then(|id| id.parse::<u32>().ok()) {
            result.session = Some(id.to_string());
            result.session_is_id = true;
        } else {
            result.session = Some(s.to_string());
        }
    }

    if let Some(wp) = window_pane_part {
        if let Some(rest) = wp.strip_prefix('%') {
            if let Ok(pid) = rest.parse::<u32>() {
                result.pane = Some(pid);
                result.pane_is_id = true;
            }
        } else if let Some(rest) = wp.strip_prefix('@') {
            if let Ok(wid) = rest.parse::<u32>() {
                result.window = Some(wid);
                result.window_is_id = true;
            }
        } else if let Some(dot_pos) = wp.find('.') {
            if dot_pos > 0 {
                if let Ok(w) = wp[..dot_pos].parse::<u32>() {
                    result.window = Some(w);
                }
            }
            if let Ok(p) = wp[dot_pos + 1..].parse::<u32>() {
                result.pane = Some(p);
            }
        } else if let Ok(w) = wp.parse::<u32>() {
            result.window = Some(w);
        }
    }

    result
}

/// Split a command line into commands, and each command into arguments.
/// Double and single quotes group words; backslash escapes inside double
/// quotes; an unquoted `;` ending a word separates commands.
pub fn split_commands(line: &str) -> Vec<Vec<String>> {
    let mut commands = Vec::new();
    let mut args: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut has_word = false;
    let mut quote: Option<char> = None;
    let mut escape_next = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if escape_next {
            current.push(c);
            escape_next = false;
            continue;
        }
        match quote {
            Some('"') if c == '\\' => {
                escape_next = true;
            }
            Some(q) if c == q => {
                quote = None;
            }
            Some(_) => current.push(c),
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                    has_word = true;
                } else if c == ';' && chars.peek().map_or(true, |n| n.is_whitespace()) {
                    if has_word || !current.is_empty() {
                        args.push(std::mem::take(&mut current));
                    }
                    has_word = false;
                    if !args.is_empty() {
                        commands.push(std::mem::take(&mut args));
                    }
                } else if c.is_whitespace() {
                    if has_word || !current.is_empty() {
                        args.push(std::mem::take(&mut current));
                    }
                    has_word = false;
                } else {
                    current.push(c);
                }
            }
        }
    }

    if has_word || !current.is_empty() {
        args.push(current);
    }
    if !args.is_empty() {
        commands.push(args);
    }
    commands
}

/// Replace the placeholder in a command template. `%N` (N == `idx`) is
/// replaced everywhere, `%%` only the first time.
pub fn template_replace(template: &str, with: &str, idx: u32) -> String {
    if !template.contains('%') {
        return template.to_string();
    }
    let mut out = String::with_capacity(template.len() + with.len());
    let mut replaced = false;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.peek() {
                Some(d) if d.to_digit(10) == Some(idx) && idx > 0 => {
                    chars.next();
                    out.push_str(with);
                    continue;
                }
                Some('%') if !replaced => {
                    chars.next();
                    replaced = true;
                    out.push_str(with);
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
    out
}

/// Command arguments parsed against a getopt-style template such as
/// `"S:W:swb:c:t:"`, where a letter followed by `:` takes a value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Args {
    flags: BTreeMap<char, Option<String>>,
    pub values: Vec<String>,
}

impl Args {
    pub fn parse(template: &str, argv: &[String], lower: usize, upper: Option<usize>) -> Result<Self, String> {
        let mut args = Args::default();
        let mut i = 0;
        while i < argv.len() {
            let arg = &argv[i];
            if arg == "--" {
                i += 1;
                break;
            }
            if !arg.starts_with('-') || arg.len() < 2 {
                break;
            }
            i += 1;
            let body = &arg[1..];
            for (pos, flag) in body.char_indices() {
                let Some(tpos) = template.find(flag).filter(|_| flag != ':') else {
                    return Err(format!("unknown flag -{}", flag));
                };
                if template[tpos + 1..].starts_with(':') {
                    let rest = &body[pos + flag.len_utf8()..];
                    let value = if !rest.is_empty() {
                        rest.to_string()
                    } else if let Some(next) = argv.get(i) {
                        i += 1;
                        next.clone()
                    } else {
                        return Err(format!("-{} expects an argument", flag));
                    };
                    args.flags.insert(flag, Some(value));
                    break;
                }
                args.flags.insert(flag, None);
            }
        }
        args.values = argv[i..].to_vec();
        let n = args.values.len();
        if n < lower || upper.map_or(false, |u| n > u) {
            return Err(format!("wrong number of arguments ({})", n));
        }
        Ok(args)
    }

    pub fn has(&self, flag: char) -> bool {
        self.flags.contains_key(&flag)
    }

    pub fn get(&self, flag: char) -> Option<&str> {
        self.flags.get(&flag).and_then(|v| v.as_deref())
    }

    pub fn value(&self, n: usize) -> Option<&str> {
        self.values.get(n).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(s: &[&str]) -> Vec<String> {
        s.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn target_forms() {
        assert_eq!(parse_target("main").session.as_deref(), Some("main"));
        let t = parse_target("main:2");
        assert_eq!((t.session.as_deref(), t.window), (Some("main"), Some(2)));
        let t = parse_target(":1.3");
        assert_eq!((t.session, t.window, t.pane), (None, Some(1), Some(3)));
        let t = parse_target("@7");
        assert!(t.window_is_id && t.window == Some(7));
        let t = parse_target("%4");
        assert!(t.pane_is_id && t.pane == Some(4));
        let t = parse_target("$2");
        assert!(t.session_is_id && t.session.as_deref() == Some("2"));
        assert_eq!(parse_target(""), ParsedTarget::default());
    }

    #[test]
    fn split_quotes_and_separators() {
        let cmds = split_commands("select-window -t 'main:1' ; switch-client -t 'main'");
        assert_eq!(cmds, vec![
            argv(&["select-window", "-t", "main:1"]),
            argv(&["switch-client", "-t", "main"]),
        ]);
        let cmds = split_commands("set -g status-left \"a \\\"b\\\"\"");
        assert_eq!(cmds, vec![argv(&["set", "-g", "status-left", "a \"b\""])]);
        assert_eq!(split_commands("select-window -t 'x:0' ; "), vec![argv(&["select-window", "-t", "x:0"])]);
        assert_eq!(split_commands("a;b"), vec![argv(&["a;b"])]);
        assert_eq!(split_commands("set x ''"), vec![argv(&["set", "x", ""])]);
    }

    #[test]
    fn template_placeholders() {
        assert_eq!(template_replace("switch-client -t '%%'", "main", 1), "switch-client -t 'main'");
        assert_eq!(template_replace("a %1 b %1", "x", 1), "a x b x");
        assert_eq!(template_replace("%% and %%", "x", 1), "x and %%");
        assert_eq!(template_replace("no placeholder", "x", 1), "no placeholder");
        assert_eq!(template_replace("100%", "x", 1), "100%");
    }

    #[test]
    fn args_getopt() {
        let a = Args::parse("S:W:swb:c:t:", &argv(&["-sw", "-b", "act", "-tmain:1"]), 0, Some(1)).unwrap();
        assert!(a.has('s') && a.has('w'));
        assert_eq!(a.get('b'), Some("act"));
        assert_eq!(a.get('t'), Some("main:1"));
        assert!(a.values.is_empty());

        let a = Args::parse("F:t:", &argv(&["-F", "#S", "kill-session -t '%%'"]), 0, Some(1)).unwrap();
        assert_eq!(a.value(0), Some("kill-session -t '%%'"));

        assert!(Args::parse("t:", &argv(&["-x"]), 0, None).is_err());
        assert!(Args::parse("t:", &argv(&["-t"]), 0, None).is_err());
        assert!(Args::parse("t:", &argv(&["a", "b"]), 0, Some(1)).is_err());
        assert!(Args::parse("t:", &argv(&[]), 1, None).is_err());
        let a = Args::parse("g", &argv(&["--", "-g"]), 0, None).unwrap();
        assert!(!a.has('g'));
        assert_eq!(a.value(0), Some("-g"));
    }
}
