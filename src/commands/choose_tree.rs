//! The `choose-tree`, `choose-session` and `choose-window` commands.
//!
//! All three build the same selector and differ only in which rows they list
//! and which templates the flags override.

use std::rc::Rc;

use tracing::debug;

use super::{resolve_window, target_pane_mut, CmdCtx, CmdEntry, CmdResult, CmdRetval, Target};
use crate::choose::{ChooseMode, SelectorSession};
use crate::cli::Args;
use crate::error::CmdError;
use crate::server::Server;
use crate::tree::{build_tree, ChooseTemplates, TreeMode};
use crate::types::PaneMode;

fn owned(s: Option<&str>) -> Option<String> {
    s.map(str::to_string)
}

fn mode_and_templates(entry: &CmdEntry, args: &Args) -> (TreeMode, ChooseTemplates) {
    match entry.name {
        "choose-session" => (TreeMode::Sessions, ChooseTemplates {
            session_template: owned(args.get('F')),
            session_action: owned(args.value(0)),
            ..Default::default()
        }),
        "choose-window" => (TreeMode::Windows, ChooseTemplates {
            window_template: owned(args.get('F')),
            window_action: owned(args.value(0)),
            ..Default::default()
        }),
        _ => (TreeMode::from_flags(args.has('s'), args.has('w')), ChooseTemplates {
            session_template: owned(args.get('S')),
            session_action: owned(args.get('b')),
            window_template: owned(args.get('W')),
            window_action: owned(args.get('c')),
        }),
    }
}

pub(super) fn exec(entry: &CmdEntry, server: &mut Server, args: &Args, ctx: &mut CmdCtx) -> CmdResult {
    let client = ctx.live_client().cloned().ok_or(CmdError::NoInteractiveClient)?;
    let owner = client.session()
        .filter(|s| server.sessions.contains_key(s))
        .ok_or(CmdError::NoInteractiveClient)?;

    // keys reach a window through its active pane, so the chooser lives there
    let (session, window) = resolve_window(server, ctx, args.get('t'))?;
    let pane = server.sessions.get(&session)
        .and_then(|s| s.windows.get(&window))
        .map(|w| w.active_pane)
        .ok_or_else(|| CmdError::TargetNotFound(format!("window: {}:{}", session, window)))?;
    let target = Target { session, window, pane };
    let busy = target_pane_mut(server, &target)
        .ok_or_else(|| CmdError::TargetNotFound(format!("window: {}:{}", target.session, target.window)))?
        .mode.is_some();
    if busy {
        return Err(CmdError::ModeEntryRejected);
    }

    let (mode, templates) = mode_and_templates(entry, args);
    let tree = build_tree(&server.sessions, Some(owner.as_str()), mode, &templates);
    if tree.entries.is_empty() {
        debug!(command = entry.name, "nothing to choose");
        return Ok(CmdRetval::Normal);
    }
    let session = server.sessions.get(&owner).ok_or(CmdError::NoInteractiveClient)?;
    let selector = SelectorSession::new(tree, Rc::clone(&client), session);

    let pane = target_pane_mut(server, &target)
        .ok_or_else(|| CmdError::TargetNotFound(format!("window: {}:{}", target.session, target.window)))?;
    pane.set_mode(PaneMode::Choose(ChooseMode::new(selector)))?;
    debug!(command = entry.name, client = %client.name, session = %target.session, window = target.window, "chooser installed");
    Ok(CmdRetval::Normal)
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;

    use crate::choose::ChooseAction;
    use crate::commands::CmdRetval;
    use crate::server::Server;
    use crate::types::Client;
    use std::rc::Rc;

    fn setup() -> (Server, Rc<Client>) {
        let mut server = Server::new();
        for (name, windows) in [("alpha", 2), ("beta", 1)] {
            server.new_session(name).unwrap();
            for i in 0..windows {
                server.new_window(name, &format!("{}{}", name, i)).unwrap();
            }
        }
        let client = server.attach_client("c0", "alpha").unwrap();
        (server, client)
    }

    fn chooser_rows(server: &Server) -> usize {
        server.sessions["alpha"].windows[&0].panes[0].choose_mode()
            .map(|m| m.selector().entries().len())
            .unwrap_or(0)
    }

    #[test]
    fn choose_tree_then_enter_switches_session_and_window() {
        let (mut server, client) = setup();
        let (r, ctx) = server.run_command(Some(Rc::clone(&client)), "choose-tree");
        assert_eq!(r, CmdRetval::Normal, "{:?}", ctx.errors);
        assert_eq!(chooser_rows(&server), 5);
        assert_eq!(client.references.get(), 1);
        assert_eq!(server.sessions["alpha"].references.get(), 1);

        // rows: alpha, alpha:0 (current), alpha:1, beta, beta:0
        for _ in 0..3 {
            assert_eq!(server.choose_key("alpha", 0, KeyCode::Down), Some(ChooseAction::Continue));
        }
        assert_eq!(server.choose_key("alpha", 0, KeyCode::Enter), Some(ChooseAction::Exit));
        assert!(server.sessions["alpha"].windows[&0].panes[0].mode.is_none());
        assert_eq!(client.references.get(), 0);
        assert_eq!(server.sessions["alpha"].references.get(), 0);

        assert_eq!(server.queue.len(), 1);
        assert_eq!(server.process_queue(), 1);
        assert_eq!(client.session().as_deref(), Some("beta"));
        assert_eq!(server.sessions["beta"].curw, Some(0));
    }

    #[test]
    fn choose_window_selects_within_own_session() {
        let (mut server, client) = setup();
        let (r, _) = server.run_command(Some(Rc::clone(&client)), "choose-window");
        assert_eq!(r, CmdRetval::Normal);
        assert_eq!(chooser_rows(&server), 2);
        server.choose_key("alpha", 0, KeyCode::Down);
        server.choose_key("alpha", 0, KeyCode::Enter);
        server.process_queue();
        assert_eq!(server.sessions["alpha"].curw, Some(1));
        assert_eq!(client.session().as_deref(), Some("alpha"));
    }

    #[test]
    fn choose_tree_windows_only_lists_own_session() {
        let (mut server, client) = setup();
        let (r, ctx) = server.run_command(Some(Rc::clone(&client)), "choose-tree -w");
        assert_eq!(r, CmdRetval::Normal, "{:?}", ctx.errors);
        let pane = &server.sessions["alpha"].windows[&0].panes[0];
        let entries = pane.choose_mode().unwrap().selector().entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.window.is_some()));
        assert_eq!(entries[0].action, "select-window -t 'alpha:0' ; ");
        assert_eq!(entries[1].action, "select-window -t 'alpha:1' ; ");
        assert_eq!(client.references.get(), 1);
        assert_eq!(server.sessions["alpha"].references.get(), 1);
    }

    #[test]
    fn choose_tree_flags_override_templates_and_actions() {
        let (mut server, client) = setup();
        let line = "choose-tree -b 'kill-session -t %%' -c 'kill-window -t %%' -S '#S' -W '#W'";
        let (r, ctx) = server.run_command(Some(Rc::clone(&client)), line);
        assert_eq!(r, CmdRetval::Normal, "{:?}", ctx.errors);
        let pane = &server.sessions["alpha"].windows[&0].panes[0];
        let entries = pane.choose_mode().unwrap().selector().entries();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].action, "kill-session -t alpha");
        assert_eq!(entries[0].display_template, "#S");
        assert_eq!(entries[1].action, "kill-window -t alpha:0 ; kill-session -t alpha");
        assert_eq!(entries[1].display_template, "    --> #W");
        assert_eq!(entries[4].action, "kill-window -t beta:0 ; kill-session -t beta");
    }

    #[test]
    fn choose_window_with_empty_session_installs_nothing() {
        let (mut server, _) = setup();
        server.new_session("empty").unwrap();
        let lonely = server.attach_client("c1", "empty").unwrap();
        let (r, ctx) = server.run_command(Some(Rc::clone(&lonely)), "choose-window -t alpha:0");
        assert_eq!(r, CmdRetval::Normal);
        assert!(ctx.errors.is_empty());
        assert!(server.sessions["alpha"].windows[&0].panes[0].mode.is_none());
        assert_eq!(lonely.references.get(), 0);
        assert_eq!(server.sessions["empty"].references.get(), 0);
        assert_eq!(server.sessions["alpha"].references.get(), 0);
    }

    #[test]
    fn chooser_goes_on_the_active_pane() {
        let (mut server, client) = setup();
        let second = server.new_pane("alpha", 0).unwrap();
        assert_eq!(server.sessions["alpha"].windows[&0].active_pane, 0);

        let (r, ctx) = server.run_command(Some(Rc::clone(&client)), "choose-tree -t alpha:0.1");
        assert_eq!(r, CmdRetval::Normal, "{:?}", ctx.errors);
        assert!(server.find_pane(second).unwrap().mode.is_none());
        assert_eq!(chooser_rows(&server), 5);
        assert_eq!(client.references.get(), 1);

        assert_eq!(server.choose_key("alpha", 0, KeyCode::Esc), Some(ChooseAction::Exit));
        assert!(server.sessions["alpha"].windows[&0].panes[0].mode.is_none());
        assert_eq!(client.references.get(), 0);
        assert_eq!(server.sessions["alpha"].references.get(), 0);

        let (r, _) = server.run_command(Some(Rc::clone(&client)), &format!("choose-tree -t %{}", second));
        assert_eq!(r, CmdRetval::Normal);
        assert!(server.find_pane(second).unwrap().mode.is_none());
        assert_eq!(server.choose_key("alpha", 0, KeyCode::Esc), Some(ChooseAction::Exit));
        assert_eq!(client.references.get(), 0);
    }

    #[test]
    fn choose_session_with_custom_action() {
        let (mut server, client) = setup();
        let (r, _) = server.run_command(Some(Rc::clone(&client)), "choose-session -F '#S' 'set -t %% @picked yes'");
        assert_eq!(r, CmdRetval::Normal);
        let pane = &server.sessions["alpha"].windows[&0].panes[0];
        let mode = pane.choose_mode().unwrap();
        assert_eq!(mode.selector().entries()[1].action, "set -t beta @picked yes");
        assert_eq!(mode.render(&server, 20), vec!["> alpha", "  beta"]);

        server.choose_key("alpha", 0, KeyCode::Char('j'));
        server.choose_key("alpha", 0, KeyCode::Enter);
        server.process_queue();
        let picked = server.sessions["beta"].options.borrow().get_string("@picked");
        assert_eq!(picked.unwrap(), "yes");
    }

    #[test]
    fn escape_dispatches_nothing() {
        let (mut server, client) = setup();
        server.run_command(Some(Rc::clone(&client)), "choose-tree -s");
        assert_eq!(chooser_rows(&server), 2);
        assert_eq!(server.choose_key("alpha", 0, KeyCode::Esc), Some(ChooseAction::Exit));
        assert!(server.queue.is_empty());
        assert_eq!(client.references.get(), 0);
    }

    #[test]
    fn requires_interactive_client() {
        let (mut server, client) = setup();
        let (r, ctx) = server.run_command(None, "choose-tree -t alpha:0");
        assert_eq!(r, CmdRetval::Error);
        assert_eq!(ctx.errors, vec!["must be run interactively"]);

        client.mark_dead();
        let (r, _) = server.run_command(Some(client), "choose-tree");
        assert_eq!(r, CmdRetval::Error);
    }

    #[test]
    fn unknown_target_is_an_error() {
        let (mut server, client) = setup();
        let (r, ctx) = server.run_command(Some(client), "choose-tree -t nowhere:3");
        assert_eq!(r, CmdRetval::Error);
        assert!(ctx.errors[0].starts_with("can't find"));
    }

    #[test]
    fn busy_pane_is_silently_ignored_without_references() {
        let (mut server, client) = setup();
        server.run_command(Some(Rc::clone(&client)), "clock-mode");
        let (r, ctx) = server.run_command(Some(Rc::clone(&client)), "choose-tree");
        assert_eq!(r, CmdRetval::Normal);
        assert!(ctx.errors.is_empty());
        assert_eq!(client.references.get(), 0);
        assert_eq!(server.sessions["alpha"].references.get(), 0);
    }

    #[test]
    fn killing_the_session_tears_the_chooser_down() {
        let (mut server, client) = setup();
        server.run_command(Some(Rc::clone(&client)), "choose-tree -t beta:0");
        assert!(server.sessions["beta"].windows[&0].panes[0].choose_mode().is_some());
        assert_eq!(server.sessions["alpha"].references.get(), 1);
        server.kill_session("beta").unwrap();
        assert_eq!(client.references.get(), 0);
        assert_eq!(server.sessions["alpha"].references.get(), 0);
    }
}
