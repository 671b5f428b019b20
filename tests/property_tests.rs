//! Property-based tests for the shell
//!
//! Random request sequences, interleaved with random signals, overlays and clock
//! steps, must always settle into a single displayed top-level window, and never
//! show more than one top-level window in the foreground.

use proptest::prelude::*;
use std::time::Duration;

use strata::surface::{HeadlessSurfaceFactory, SurfaceEvent};
use strata::window::{ChildRequest, TransitionState, VisibilityState, WindowKind};
use strata::{LaunchOptions, Shell, ShellConfig, WindowId};

const URLS: [&str; 3] = [
    "app://clock.localhost/index.html",
    "app://gallery.localhost/index.html",
    "app://mail.localhost/index.html",
];

#[derive(Debug, Clone)]
enum Op {
    Launch(usize, bool),
    Home,
    Previous,
    Next,
    Open(usize),
    Close(usize),
    Kill(usize),
    Crash(usize),
    SelfClose(usize),
    Chain(usize),
    Popup(usize),
    Attention(usize),
    Lock(bool),
    Finish(usize),
    Paint(usize),
    Advance(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..URLS.len(), any::<bool>()).prop_map(|(url, bg)| Op::Launch(url, bg)),
        Just(Op::Home),
        Just(Op::Previous),
        Just(Op::Next),
        (0..8usize).prop_map(Op::Open),
        (0..8usize).prop_map(Op::Close),
        (0..8usize).prop_map(Op::Kill),
        (0..8usize).prop_map(Op::Crash),
        (0..8usize).prop_map(Op::SelfClose),
        (0..8usize).prop_map(Op::Chain),
        (0..8usize).prop_map(Op::Popup),
        (0..8usize).prop_map(Op::Attention),
        any::<bool>().prop_map(Op::Lock),
        (0..8usize).prop_map(Op::Finish),
        (0..8usize).prop_map(Op::Paint),
        (0..1500u64).prop_map(Op::Advance),
    ]
}

/// Pick a live window by index
fn pick(shell: &Shell, index: usize) -> Option<WindowId> {
    let ids = shell.window_ids();
    if ids.is_empty() {
        return None;
    }
    Some(ids[index % ids.len()])
}

fn run(shell: &mut Shell, op: Op) {
    // Rejected requests are part of the exercise; only the invariant matters
    let _ = match op {
        Op::Launch(url, bg) => {
            let options = LaunchOptions {
                stay_background: bg,
                ..LaunchOptions::default()
            };
            shell.launch(URLS[url], None, options).map(|_| ())
        }
        Op::Home => {
            shell.request_home();
            Ok(())
        }
        Op::Previous => {
            shell.go_previous();
            Ok(())
        }
        Op::Next => {
            shell.go_next();
            Ok(())
        }
        Op::Open(i) => match pick(shell, i) {
            Some(id) => shell.request_open(id, None),
            None => Ok(()),
        },
        Op::Close(i) => match pick(shell, i) {
            Some(id) => shell.request_close(id, None),
            None => Ok(()),
        },
        Op::Kill(i) => match pick(shell, i) {
            Some(id) => shell.request_kill(id),
            None => Ok(()),
        },
        Op::Crash(i) => match pick(shell, i).filter(|&id| Some(id) != shell.home()) {
            Some(id) => shell.surface_event(id, SurfaceEvent::FatalError("crash".to_string())),
            None => Ok(()),
        },
        Op::SelfClose(i) => match pick(shell, i).filter(|&id| Some(id) != shell.home()) {
            Some(id) => shell.surface_event(id, SurfaceEvent::ClosedByContent),
            None => Ok(()),
        },
        Op::Chain(i) => match pick(shell, i) {
            Some(id) => {
                let url = shell
                    .window(id)
                    .map(|w| format!("{}/child.html", w.origin()))
                    .unwrap_or_default();
                shell.spawn_child(id, ChildRequest::window(&url)).map(|_| ())
            }
            None => Ok(()),
        },
        Op::Popup(i) => match pick(shell, i) {
            Some(id) => shell.spawn_popup(id, "https://example.com/").map(|_| ()),
            None => Ok(()),
        },
        Op::Attention(i) => match pick(shell, i) {
            Some(id) => shell
                .spawn_attention(id, "app://alarm.localhost/ring.html")
                .map(|_| ()),
            None => Ok(()),
        },
        Op::Lock(locked) => {
            shell.set_locked(locked);
            Ok(())
        }
        Op::Finish(i) => match pick(shell, i) {
            Some(id) => shell.transition_completed(id),
            None => Ok(()),
        },
        Op::Paint(i) => match pick(shell, i) {
            Some(id) => shell.paint_completed(id),
            None => Ok(()),
        },
        Op::Advance(ms) => {
            shell.advance(Duration::from_millis(ms));
            Ok(())
        }
    };
}

/// Nothing in flight: no exchange and no window between states
fn quiescent(shell: &Shell) -> bool {
    !shell.is_exchanging() && shell.windows().all(|w| !w.state().is_transitioning())
}

/// Displayable windows shown in the foreground
fn visible_top_level(shell: &Shell) -> Vec<WindowId> {
    shell
        .windows()
        .filter(|w| w.kind().is_displayable() && w.visibility() == VisibilityState::Foreground)
        .map(|w| w.id())
        .collect()
}

/// Displayable windows that are open
fn foreground(shell: &Shell) -> Vec<WindowId> {
    let mut open: Vec<WindowId> = shell
        .windows()
        .filter(|w| w.kind().is_displayable() && w.state() == TransitionState::Opened)
        .map(|w| w.id())
        .collect();
    open.sort();
    open
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_single_foreground_when_settled(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut shell =
            Shell::new(ShellConfig::default(), Box::new(HeadlessSurfaceFactory::new())).unwrap();

        for op in ops {
            run(&mut shell, op);
            if quiescent(&shell) {
                let visible = visible_top_level(&shell);
                prop_assert!(visible.len() <= 1, "foreground top-level windows: {:?}", visible);
            }
        }
        // Long enough for every queued exchange to run out its fallbacks
        shell.advance(Duration::from_secs(60));

        prop_assert!(quiescent(&shell));
        let open = foreground(&shell);
        prop_assert_eq!(open.len(), 1, "open top-level windows: {:?}", open);
        prop_assert_eq!(shell.displayed(), Some(open[0]));

        let attention_open = shell
            .windows()
            .any(|w| w.kind() == WindowKind::Attention && w.state() == TransitionState::Opened);
        prop_assert_eq!(shell.layout().attention_visible, attention_open);

        let visible = visible_top_level(&shell);
        if shell.layout().overlay_dominates() {
            prop_assert!(visible.is_empty(), "covered windows in foreground: {:?}", visible);
        } else {
            prop_assert_eq!(visible, vec![open[0]]);
        }
    }

    #[test]
    fn prop_kill_terminates_exactly_once(kills in prop::collection::vec(0..4usize, 1..12)) {
        let mut shell =
            Shell::new(ShellConfig::default(), Box::new(HeadlessSurfaceFactory::new())).unwrap();
        for url in URLS {
            shell.launch(url, None, LaunchOptions::default()).unwrap();
        }
        shell.advance(Duration::from_secs(10));
        shell.drain_notifications();

        for index in kills {
            if let Some(id) = pick(&shell, index).filter(|&id| Some(id) != shell.home()) {
                shell.request_kill(id).unwrap();
                shell.request_kill(id).unwrap();
            }
            shell.advance(Duration::from_millis(100));
        }
        shell.advance(Duration::from_secs(10));

        let mut terminated: Vec<WindowId> = shell
            .drain_notifications()
            .into_iter()
            .filter(|e| e.notification.name() == "window-terminated")
            .filter_map(|e| e.notification.window_id())
            .collect();
        let total = terminated.len();
        terminated.sort();
        terminated.dedup();
        prop_assert_eq!(terminated.len(), total);
    }
}
