use super::*;
use crate::error::ShellError;
use crate::notify::Notification;
use crate::surface::{Bounds, HeadlessSurfaceFactory, SurfaceEvent};
use crate::window::{
    ChildRequest, Orientation, TransitionEffect, TransitionState, VisibilityState, WindowFeatures,
};

const APP_A: &str = "app://clock.localhost/index.html";
const APP_B: &str = "app://gallery.localhost/index.html";

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Shell with a settled home window
fn shell() -> (Shell, HeadlessSurfaceFactory) {
    let surfaces = HeadlessSurfaceFactory::new();
    let mut shell = Shell::new(ShellConfig::default(), Box::new(surfaces.clone())).unwrap();
    settle(&mut shell);
    shell.drain_notifications();
    (shell, surfaces)
}

/// Let every fallback timer run out
fn settle(shell: &mut Shell) {
    shell.advance(Duration::from_secs(3));
}

fn launch(shell: &mut Shell, url: &str) -> WindowId {
    let id = shell.launch(url, None, LaunchOptions::default()).unwrap();
    settle(shell);
    id
}

fn state(shell: &Shell, id: WindowId) -> Option<TransitionState> {
    shell.window(id).map(|w| w.state())
}

fn names(envelopes: &[Envelope]) -> Vec<String> {
    envelopes.iter().map(|e| e.notification.to_string()).collect()
}

fn terminated(envelopes: &[Envelope]) -> Vec<WindowId> {
    envelopes
        .iter()
        .filter_map(|e| match &e.notification {
            Notification::WindowTerminated { window, .. } => Some(window.id),
            _ => None,
        })
        .collect()
}

// === Startup and exchanges ===

#[test]
fn test_startup_displays_home() {
    let surfaces = HeadlessSurfaceFactory::new();
    let mut shell = Shell::new(ShellConfig::default(), Box::new(surfaces.clone())).unwrap();
    let home = shell.home().unwrap();
    assert_eq!(state(&shell, home), Some(TransitionState::Opening));
    assert!(shell.is_exchanging());

    shell.paint_completed(home).unwrap();
    shell.transition_completed(home).unwrap();

    assert_eq!(shell.displayed(), Some(home));
    assert!(!shell.is_exchanging());
    assert!(surfaces.probe(home).unwrap().is_visible());
    let displayed: Vec<_> = shell
        .history()
        .filter(|e| matches!(e.notification, Notification::DisplayedChanged { .. }))
        .collect();
    assert_eq!(displayed.len(), 1);
}

#[test]
fn test_exchange_closes_outgoing_only_after_paint() {
    let (mut shell, _) = shell();
    let home = shell.home().unwrap();

    let app = shell.launch(APP_A, None, LaunchOptions::default()).unwrap();
    assert_eq!(state(&shell, app), Some(TransitionState::Opening));
    assert_eq!(state(&shell, home), Some(TransitionState::Opened));

    shell.paint_completed(app).unwrap();
    assert_eq!(state(&shell, home), Some(TransitionState::Closing));
    assert_eq!(shell.displayed(), Some(app));

    shell.transition_completed(app).unwrap();
    assert!(shell.is_exchanging());
    shell.transition_completed(home).unwrap();
    assert!(!shell.is_exchanging());

    let history = names(&shell.drain_notifications());
    let position = |name: &str| history.iter().position(|n| n == name).unwrap();
    assert!(position("window-will-open #2") < position("window-will-close #1"));
    assert!(position("window-will-close #1") < position("window-opened #2"));
    assert!(position("window-opened #2") < position("window-closed #1"));
    assert_eq!(history.last().map(String::as_str), Some("displayed-changed #2"));
}

#[test]
fn test_readiness_timeout_proceeds_without_paint() {
    let (mut shell, _) = shell();
    let home = shell.home().unwrap();
    let app = shell.launch(APP_A, None, LaunchOptions::default()).unwrap();

    shell.advance(ms(999));
    assert_eq!(state(&shell, app), Some(TransitionState::Opened));
    assert_eq!(state(&shell, home), Some(TransitionState::Opened));

    shell.advance(ms(1));
    assert_eq!(state(&shell, home), Some(TransitionState::Closing));
    shell.advance(ms(300));
    assert_eq!(state(&shell, home), Some(TransitionState::Closed));
    assert_eq!(shell.displayed(), Some(app));
    assert!(!shell.is_exchanging());
}

#[test]
fn test_requests_during_exchange_are_queued() {
    let (mut shell, _) = shell();
    let a = shell.launch(APP_A, None, LaunchOptions::default()).unwrap();
    let b = shell.launch(APP_B, None, LaunchOptions::default()).unwrap();

    assert_eq!(shell.display.incoming(), Some(a));
    assert_eq!(state(&shell, b), Some(TransitionState::Closed));

    settle(&mut shell);
    assert_eq!(shell.displayed(), Some(b));
    assert_eq!(state(&shell, a), Some(TransitionState::Closed));
}

#[test]
fn test_latest_display_request_wins_during_burst() {
    let (mut shell, _) = shell();
    let a = launch(&mut shell, APP_A);
    let b = launch(&mut shell, APP_B);

    shell.display(a).unwrap();
    shell.display(b).unwrap();
    shell.display(a).unwrap();
    settle(&mut shell);
    settle(&mut shell);

    assert_eq!(shell.displayed(), Some(a));
    assert_eq!(state(&shell, a), Some(TransitionState::Opened));
    assert_eq!(state(&shell, b), Some(TransitionState::Closed));
}

#[test]
fn test_closing_queued_app_withdraws_it() {
    let (mut shell, _) = shell();
    let a = shell.launch(APP_A, None, LaunchOptions::default()).unwrap();
    let b = shell.launch(APP_B, None, LaunchOptions::default()).unwrap();

    shell.request_close(b, None).unwrap();
    settle(&mut shell);

    assert_eq!(shell.displayed(), Some(a));
    assert_eq!(state(&shell, b), Some(TransitionState::Closed));
    assert!(!shell.is_exchanging());
}

#[test]
fn test_killed_incoming_is_never_announced() {
    let (mut shell, _) = shell();
    let home = shell.home().unwrap();
    let a = launch(&mut shell, APP_A);
    let b = shell.launch(APP_B, None, LaunchOptions::default()).unwrap();
    shell.paint_completed(b).unwrap();
    shell.transition_completed(b).unwrap();
    assert!(shell.is_exchanging());
    shell.drain_notifications();

    shell.request_kill(b).unwrap();
    settle(&mut shell);

    let changes: Vec<(WindowId, Option<WindowId>)> = shell
        .drain_notifications()
        .into_iter()
        .filter_map(|e| match e.notification {
            Notification::DisplayedChanged {
                displayed,
                previous,
            } => Some((displayed, previous)),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![(home, Some(a))]);
    assert!(shell.window(b).is_none());
}

#[test]
fn test_open_hint_is_used_by_the_exchange() {
    let (mut shell, _) = shell();
    let options = LaunchOptions {
        stay_background: true,
        ..LaunchOptions::default()
    };
    let app = shell.launch(APP_A, None, options).unwrap();
    settle(&mut shell);
    shell.drain_notifications();

    shell.request_open(app, Some(TransitionEffect::FadeIn)).unwrap();
    let effect = shell.drain_notifications().into_iter().find_map(|e| match e.notification {
        Notification::WindowWillOpen { window, effect } if window.id == app => Some(effect),
        _ => None,
    });
    assert_eq!(effect, Some(TransitionEffect::FadeIn));
}

#[test]
fn test_stale_fallback_timer_is_ignored() {
    let (mut shell, _) = shell();
    let app = launch(&mut shell, APP_A);
    let popup = shell.spawn_popup(app, "https://example.com/").unwrap();

    shell.advance(ms(100));
    shell.request_cancel(popup).unwrap();
    assert_eq!(state(&shell, popup), Some(TransitionState::Closed));
    shell.request_open(popup, None).unwrap();

    shell.advance(ms(300));
    assert_eq!(state(&shell, popup), Some(TransitionState::Opening));
    shell.advance(ms(90));
    assert_eq!(state(&shell, popup), Some(TransitionState::Opened));
}

#[test]
fn test_cancel_is_rejected_for_apps() {
    let (mut shell, _) = shell();
    let app = shell.launch(APP_A, None, LaunchOptions::default()).unwrap();
    shell.request_cancel(app).unwrap();
    assert_eq!(state(&shell, app), Some(TransitionState::Opening));
}

// === Launch and stack ===

#[test]
fn test_launching_running_origin_reuses_window() {
    let (mut shell, surfaces) = shell();
    let a = launch(&mut shell, APP_A);
    let b = launch(&mut shell, APP_B);
    assert_eq!(shell.stack().entries, vec![a, b]);

    let again = shell
        .launch("app://clock.localhost/alarm.html", None, LaunchOptions::default())
        .unwrap();
    settle(&mut shell);

    assert_eq!(again, a);
    assert_eq!(surfaces.created(), 3);
    assert_eq!(shell.displayed(), Some(a));
    assert_eq!(shell.stack().entries, vec![b, a]);
    assert_eq!(shell.stack().current, Some(1));
}

#[test]
fn test_new_surface_loads_the_launch_url() {
    let (mut shell, surfaces) = shell();
    let app = launch(&mut shell, APP_A);
    let popup = shell.spawn_popup(app, "https://example.com/").unwrap();

    assert_eq!(surfaces.probe(app).unwrap().current_url().as_deref(), Some(APP_A));
    assert_eq!(
        surfaces.probe(popup).unwrap().current_url().as_deref(),
        Some("https://example.com/")
    );
    assert!(!shell.can_go_back(app).unwrap());
}

#[test]
fn test_background_launch_stays_hidden() {
    let (mut shell, _) = shell();
    let home = shell.home().unwrap();
    let options = LaunchOptions {
        stay_background: true,
        ..LaunchOptions::default()
    };
    let app = shell.launch(APP_A, None, options).unwrap();
    settle(&mut shell);

    assert_eq!(state(&shell, app), Some(TransitionState::Closed));
    assert_eq!(shell.displayed(), Some(home));
    assert_eq!(shell.stack().entries, vec![app]);
}

#[test]
fn test_display_brings_background_app_forward() {
    let (mut shell, _) = shell();
    let options = LaunchOptions {
        stay_background: true,
        ..LaunchOptions::default()
    };
    let app = shell.launch(APP_A, None, options).unwrap();
    settle(&mut shell);

    shell.display(app).unwrap();
    settle(&mut shell);
    assert_eq!(shell.displayed(), Some(app));
    assert_eq!(state(&shell, app), Some(TransitionState::Opened));

    let popup = shell.spawn_popup(app, "https://example.com/").unwrap();
    assert_eq!(shell.display(popup), Err(ShellError::NotDisplayable(popup)));
    assert_eq!(shell.display(WindowId(99)), Err(ShellError::UnknownWindow(WindowId(99))));
}

#[test]
fn test_edge_swipes_walk_the_stack() {
    let (mut shell, _) = shell();
    let a = launch(&mut shell, APP_A);
    let b = launch(&mut shell, APP_B);

    assert_eq!(shell.go_previous(), Some(a));
    settle(&mut shell);
    assert_eq!(shell.displayed(), Some(a));
    assert_eq!(shell.go_previous(), None);

    assert_eq!(shell.go_next(), Some(b));
    settle(&mut shell);
    assert_eq!(shell.displayed(), Some(b));
    assert_eq!(shell.go_next(), None);
}

#[test]
fn test_home_request_keeps_stack_order() {
    let (mut shell, _) = shell();
    let a = launch(&mut shell, APP_A);
    let b = launch(&mut shell, APP_B);
    shell.go_previous();
    settle(&mut shell);

    shell.request_home();
    settle(&mut shell);

    assert_eq!(shell.displayed(), shell.home());
    let stack = shell.stack();
    assert_eq!(stack.entries, vec![b, a]);
    assert_eq!(stack.current, None);
}

// === Children ===

#[test]
fn test_same_origin_child_chains_and_is_displayed() {
    let (mut shell, _) = shell();
    let app = launch(&mut shell, APP_A);
    let child = shell
        .spawn_child(app, ChildRequest::window("app://clock.localhost/timer.html"))
        .unwrap();
    settle(&mut shell);

    let window = shell.window(child).unwrap();
    assert_eq!(window.kind(), WindowKind::App);
    assert_eq!(window.links().previous, Some(app));
    assert_eq!(shell.window(app).unwrap().links().next, Some(child));
    assert_eq!(shell.displayed(), Some(child));
    assert_eq!(shell.stack().entries, vec![app]);

    assert_eq!(shell.go_previous(), Some(app));
}

#[test]
fn test_cross_origin_child_is_inline_popup() {
    let (mut shell, surfaces) = shell();
    let app = launch(&mut shell, APP_A);
    let popup = shell
        .spawn_child(app, ChildRequest::window("https://example.com/login"))
        .unwrap();

    let window = shell.window(popup).unwrap();
    assert_eq!(window.kind(), WindowKind::Popup);
    assert_eq!(window.container(), Container::Inline { parent: app });
    assert_eq!(window.links().rear, Some(app));
    assert_eq!(
        surfaces.probe(popup).unwrap().container(),
        Some(Container::Inline { parent: app })
    );
    assert_eq!(shell.displayed(), Some(app));
}

#[test]
fn test_dialog_feature_forces_popup() {
    let (mut shell, _) = shell();
    let app = launch(&mut shell, APP_A);
    let request = ChildRequest::window("app://clock.localhost/dialog.html")
        .with_features(WindowFeatures::parse("dialog"));
    let popup = shell.spawn_child(app, request).unwrap();
    assert_eq!(shell.window(popup).unwrap().kind(), WindowKind::Popup);
}

#[test]
fn test_second_child_reuses_or_conflicts() {
    let (mut shell, surfaces) = shell();
    let app = launch(&mut shell, APP_A);
    let popup = shell.spawn_popup(app, "https://example.com/a").unwrap();
    settle(&mut shell);

    shell.request_close(popup, None).unwrap();
    settle(&mut shell);
    assert_eq!(state(&shell, popup), Some(TransitionState::Closed));

    let again = shell.spawn_popup(app, "https://example.com/a").unwrap();
    assert_eq!(again, popup);
    assert_eq!(state(&shell, popup), Some(TransitionState::Opening));
    assert_eq!(surfaces.created(), 3);

    let err = shell.spawn_popup(app, "https://example.com/b").unwrap_err();
    assert_eq!(
        err,
        ShellError::HierarchyConflict {
            parent: app,
            existing: popup,
            relation: crate::error::Relation::Popup,
        }
    );
}

#[test]
fn test_spawn_from_unknown_parent_fails() {
    let (mut shell, _) = shell();
    let err = shell.spawn_popup(WindowId(42), "https://example.com/").unwrap_err();
    assert_eq!(err, ShellError::UnknownWindow(WindowId(42)));

    let app = launch(&mut shell, APP_A);
    let err = shell.spawn_popup(app, "not a url").unwrap_err();
    assert!(matches!(err, ShellError::InvalidUrl { .. }));
}

#[test]
fn test_activity_closing_itself_returns_focus() {
    let (mut shell, surfaces) = shell();
    let app = launch(&mut shell, APP_A);
    let activity = shell.spawn_activity(app, "app://camera.localhost/pick.html").unwrap();
    settle(&mut shell);
    assert_eq!(shell.window(app).unwrap().links().callee, Some(activity));
    shell.drain_notifications();

    shell.surface_event(activity, SurfaceEvent::ClosedByContent).unwrap();
    settle(&mut shell);

    assert!(shell.window(activity).is_none());
    assert!(surfaces.probe(activity).unwrap().is_released());
    assert!(surfaces.probe(app).unwrap().is_focused());
    assert_eq!(shell.window(app).unwrap().links().callee, None);

    let reclaimed = shell.drain_notifications().into_iter().any(|e| {
        e.notification
            == Notification::WindowFocusReclaimed {
                window: shell.window_ref(app).unwrap(),
                from: activity,
            }
    });
    assert!(reclaimed);
}

#[test]
fn test_inline_children_follow_parent_visibility() {
    let (mut shell, surfaces) = shell();
    let a = launch(&mut shell, APP_A);
    let popup = shell.spawn_popup(a, "https://example.com/").unwrap();
    settle(&mut shell);
    assert!(surfaces.probe(popup).unwrap().is_visible());

    launch(&mut shell, APP_B);
    assert!(!surfaces.probe(a).unwrap().is_visible());
    assert_eq!(shell.window(popup).unwrap().visibility(), VisibilityState::Background);
    assert_eq!(state(&shell, popup), Some(TransitionState::Opened));
}

// === Kill ===

#[test]
fn test_killing_displayed_app_shows_home() {
    let (mut shell, surfaces) = shell();
    let home = shell.home().unwrap();
    let app = launch(&mut shell, APP_A);

    shell.request_kill(app).unwrap();
    assert_eq!(shell.display.incoming(), Some(home));
    settle(&mut shell);

    assert!(shell.window(app).is_none());
    assert!(surfaces.probe(app).unwrap().is_released());
    assert_eq!(shell.displayed(), Some(home));
    assert!(shell.stack().entries.is_empty());
}

#[test]
fn test_killing_background_window_is_immediate() {
    let (mut shell, _) = shell();
    let a = launch(&mut shell, APP_A);
    let b = launch(&mut shell, APP_B);

    shell.request_kill(a).unwrap();
    assert!(shell.window(a).is_none());
    assert_eq!(shell.displayed(), Some(b));
    assert_eq!(shell.stack().entries, vec![b]);
}

#[test]
fn test_kill_is_idempotent() {
    let (mut shell, _) = shell();
    let app = launch(&mut shell, APP_A);
    shell.drain_notifications();

    shell.request_kill(app).unwrap();
    shell.request_kill(app).unwrap();
    settle(&mut shell);
    shell.request_kill(app).unwrap();

    assert_eq!(terminated(&shell.drain_notifications()), vec![app]);
    assert_eq!(
        shell.request_kill(WindowId(99)),
        Err(ShellError::UnknownWindow(WindowId(99)))
    );
}

#[test]
fn test_kill_cascades_to_dependents_first() {
    let (mut shell, _) = shell();
    let app = launch(&mut shell, APP_A);
    let popup = shell.spawn_popup(app, "https://example.com/").unwrap();
    settle(&mut shell);
    shell.drain_notifications();

    shell.request_kill(app).unwrap();
    settle(&mut shell);

    assert_eq!(terminated(&shell.drain_notifications()), vec![popup, app]);
    assert!(shell.window(app).is_none());
    assert!(shell.window(popup).is_none());
}

#[test]
fn test_killing_chained_child_returns_to_previous() {
    let (mut shell, _) = shell();
    let app = launch(&mut shell, APP_A);
    let child = shell
        .spawn_child(app, ChildRequest::window("app://clock.localhost/timer.html"))
        .unwrap();
    settle(&mut shell);

    shell.surface_event(child, SurfaceEvent::ClosedByContent).unwrap();
    settle(&mut shell);

    assert!(shell.window(child).is_none());
    assert_eq!(shell.displayed(), Some(app));
    assert_eq!(shell.window(app).unwrap().links().next, None);
}

#[test]
fn test_killing_incoming_before_ready_keeps_outgoing() {
    let (mut shell, _) = shell();
    let home = shell.home().unwrap();
    let app = shell.launch(APP_A, None, LaunchOptions::default()).unwrap();
    shell.advance(ms(100));

    shell.request_kill(app).unwrap();
    settle(&mut shell);

    assert!(shell.window(app).is_none());
    assert_eq!(shell.displayed(), Some(home));
    assert_eq!(state(&shell, home), Some(TransitionState::Opened));
    assert!(!shell.is_exchanging());
}

#[test]
fn test_destroyed_ids_are_ignored() {
    let (mut shell, _) = shell();
    let app = launch(&mut shell, APP_A);
    shell.request_kill(app).unwrap();
    settle(&mut shell);

    assert_eq!(shell.request_open(app, None), Ok(()));
    assert_eq!(shell.transition_completed(app), Ok(()));
    assert_eq!(shell.paint_completed(app), Ok(()));
    assert_eq!(shell.screenshot(app), Ok(None));
}

// === Home ===

#[test]
fn test_home_crash_respawns_a_new_home() {
    let (mut shell, surfaces) = shell();
    let old = shell.home().unwrap();

    shell
        .surface_event(old, SurfaceEvent::FatalError("oom".to_string()))
        .unwrap();
    let new = shell.home().unwrap();
    assert_ne!(new, old);
    settle(&mut shell);

    assert_eq!(shell.displayed(), Some(new));
    assert!(shell.window(old).is_none());
    assert!(surfaces.probe(old).unwrap().is_released());
    assert!(!shell.is_home_unrecoverable());
}

#[test]
fn test_repeated_home_crashes_give_up() {
    let (mut shell, _) = shell();
    for _ in 0..3 {
        let home = shell.home().unwrap();
        shell
            .surface_event(home, SurfaceEvent::FatalError("crash".to_string()))
            .unwrap();
        settle(&mut shell);
    }

    let home = shell.home().unwrap();
    let err = shell
        .surface_event(home, SurfaceEvent::FatalError("crash".to_string()))
        .unwrap_err();
    assert_eq!(err, ShellError::HomeUnrecoverable(4));
    assert!(shell.is_home_unrecoverable());
    assert_eq!(shell.home(), None);
    assert!(shell
        .history()
        .any(|e| e.notification == Notification::HomeUnrecoverable { crashes: 4 }));
}

#[test]
fn test_successful_home_load_resets_crash_count() {
    let (mut shell, _) = shell();
    for _ in 0..5 {
        let home = shell.home().unwrap();
        shell
            .surface_event(home, SurfaceEvent::FatalError("crash".to_string()))
            .unwrap();
        settle(&mut shell);
        let home = shell.home().unwrap();
        shell.surface_event(home, SurfaceEvent::LoadEnd).unwrap();
    }
    assert!(!shell.is_home_unrecoverable());
}

#[test]
fn test_home_ignores_close_requests() {
    let (mut shell, _) = shell();
    let home = shell.home().unwrap();
    shell.request_close(home, None).unwrap();
    assert_eq!(state(&shell, home), Some(TransitionState::Opened));
}

// === Overlays and layout ===

#[test]
fn test_attention_opens_after_load_and_covers_app() {
    let (mut shell, surfaces) = shell();
    let app = launch(&mut shell, APP_A);
    let call = shell.spawn_attention(app, "app://dialer.localhost/call.html").unwrap();
    assert_eq!(state(&shell, call), Some(TransitionState::Closed));

    shell.surface_event(call, SurfaceEvent::LoadEnd).unwrap();
    assert_eq!(state(&shell, call), Some(TransitionState::Opening));
    settle(&mut shell);

    assert!(shell.layout().attention_visible);
    let covered = shell.window(app).unwrap();
    assert_eq!(covered.visibility(), VisibilityState::ScreenshotPlaceholder);
    assert!(covered.placeholder().is_some());
    assert!(!surfaces.probe(app).unwrap().is_visible());

    shell.request_close(call, None).unwrap();
    settle(&mut shell);
    assert!(!shell.layout().attention_visible);
    assert_eq!(shell.window(app).unwrap().visibility(), VisibilityState::Foreground);
}

#[test]
fn test_attention_opens_anyway_after_load_timeout() {
    let (mut shell, _) = shell();
    let app = launch(&mut shell, APP_A);
    let call = shell.spawn_attention(app, "app://dialer.localhost/call.html").unwrap();

    shell.advance(ms(999));
    assert_eq!(state(&shell, call), Some(TransitionState::Closed));
    shell.advance(ms(1));
    assert_eq!(state(&shell, call), Some(TransitionState::Opening));

    shell.request_close(call, None).unwrap();
    shell.surface_event(call, SurfaceEvent::LoadEnd).unwrap();
    settle(&mut shell);
    assert_eq!(state(&shell, call), Some(TransitionState::Opened));

    shell.request_close(call, None).unwrap();
    settle(&mut shell);
    shell.surface_event(call, SurfaceEvent::LoadEnd).unwrap();
    assert_eq!(state(&shell, call), Some(TransitionState::Closed));
}

#[test]
fn test_home_request_dismisses_attention() {
    let (mut shell, _) = shell();
    let app = launch(&mut shell, APP_A);
    let call = shell.spawn_attention(app, "app://dialer.localhost/call.html").unwrap();
    shell.surface_event(call, SurfaceEvent::LoadEnd).unwrap();
    settle(&mut shell);

    shell.request_home();
    settle(&mut shell);
    assert_eq!(state(&shell, call), Some(TransitionState::Closed));
    assert_eq!(shell.displayed(), shell.home());
}

#[test]
fn test_lockscreen_swaps_in_placeholder() {
    let (mut shell, _) = shell();
    let app = launch(&mut shell, APP_A);

    shell.set_locked(true);
    assert_eq!(
        shell.window(app).unwrap().visibility(),
        VisibilityState::ScreenshotPlaceholder
    );
    shell.set_locked(false);
    assert_eq!(shell.window(app).unwrap().visibility(), VisibilityState::Foreground);
}

#[test]
fn test_keyboard_resizes_active_windows_only() {
    let (mut shell, surfaces) = shell();
    let home = shell.home().unwrap();
    let app = launch(&mut shell, APP_A);
    assert_eq!(surfaces.probe(app).unwrap().bounds(), Some(Bounds::new(320, 460)));

    shell.set_keyboard_height(200);
    assert_eq!(surfaces.probe(app).unwrap().bounds(), Some(Bounds::new(320, 260)));
    assert_eq!(surfaces.probe(home).unwrap().bounds(), Some(Bounds::new(320, 460)));

    shell.resize(app, None, Some(100)).unwrap();
    assert_eq!(surfaces.probe(app).unwrap().bounds(), Some(Bounds::new(320, 100)));
    shell.resize(home, Some(10), Some(10)).unwrap();
    assert_eq!(surfaces.probe(home).unwrap().bounds(), Some(Bounds::new(320, 460)));
}

#[test]
fn test_huge_keyboard_collapses_window_height() {
    let (mut shell, surfaces) = shell();
    let app = launch(&mut shell, APP_A);

    shell.set_keyboard_height(u32::MAX);
    assert_eq!(surfaces.probe(app).unwrap().bounds(), Some(Bounds::new(320, 0)));

    shell.set_keyboard_height(0);
    assert_eq!(surfaces.probe(app).unwrap().bounds(), Some(Bounds::new(320, 460)));
}

#[test]
fn test_fullscreen_launch_covers_status_bar() {
    let (mut shell, surfaces) = shell();
    let options = LaunchOptions {
        fullscreen: true,
        ..LaunchOptions::default()
    };
    let app = shell.launch(APP_A, None, options).unwrap();
    settle(&mut shell);
    assert_eq!(surfaces.probe(app).unwrap().bounds(), Some(Bounds::new(320, 480)));
}

#[test]
fn test_orientation_follows_displayed_window() {
    let (mut shell, _) = shell();
    let manifest = ManifestRef::new("app://clock.localhost/manifest.webapp", "Clock")
        .with_orientation(Orientation::LandscapePrimary);
    let app = shell.launch(APP_A, Some(manifest), LaunchOptions::default()).unwrap();
    settle(&mut shell);
    assert_eq!(shell.orientation(), Orientation::LandscapePrimary);

    let popup = shell.spawn_popup(app, "https://example.com/").unwrap();
    assert_eq!(shell.effective_orientation(popup), Orientation::LandscapePrimary);
    settle(&mut shell);
    shell.request_orientation(popup, Some(Orientation::Portrait)).unwrap();
    assert_eq!(shell.orientation(), Orientation::Portrait);

    shell.request_home();
    settle(&mut shell);
    assert_eq!(shell.orientation(), Orientation::PortraitPrimary);
}

#[test]
fn test_screenshot_is_scaled_to_configured_maximum() {
    let (mut shell, _) = shell();
    let app = launch(&mut shell, APP_A);
    let shot = shell.screenshot(app).unwrap().unwrap();
    assert_eq!(shot, b"screenshot:160x240".to_vec());
}

#[test]
fn test_load_time_is_tracked() {
    let (mut shell, _) = shell();
    let app = shell.launch(APP_A, None, LaunchOptions::default()).unwrap();
    shell.advance(ms(50));
    shell.transition_completed(app).unwrap();
    shell.advance(ms(50));
    shell.surface_event(app, SurfaceEvent::LoadEnd).unwrap();

    let load = shell.load_time(app).unwrap();
    assert_eq!(load.opened_after, Some(ms(50)));
    assert_eq!(load.loaded_after, Some(ms(100)));
}
