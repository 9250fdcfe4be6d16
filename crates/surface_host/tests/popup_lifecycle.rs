// Popup lifecycle tests
//
// Deferred creation, mutual exclusion through the pointer hook, dismissal
// paths and creation failures.

use std::rc::Rc;
use std::time::Duration;

use surface_host::testing::{Harness, PlatformCall, RecordingEngine, SharedLog};
use surface_host::{
    ButtonMask, MouseButton, NativeInput, Point, PointerKind, PopupController, PopupState, Rect,
    Size, SurfaceController, SurfaceState, TimerId,
};

const PARENT: Rect = Rect::new(100, 100, 400, 300);
const POPUP: Rect = Rect::new(10, 20, 50, 60);

fn open_parent(harness: &Harness, rect: Rect) -> (Rc<SurfaceController>, SharedLog) {
    let (engine, log) = RecordingEngine::new();
    let surface = harness.open_surface(rect, engine.boxed());
    harness.run_commits();
    (surface, log)
}

/// Ask `parent` for a popup at `rect` without letting it be created yet.
fn request_popup(parent: &SurfaceController, rect: Rect) -> (Rc<PopupController>, SharedLog) {
    let (engine, log) = RecordingEngine::new();
    let id = parent.host().open_popup(engine.boxed(), rect, true);
    let popup = parent.popup().unwrap();
    assert_eq!(Some(popup.id()), id);
    (popup, log)
}

fn live_popup(harness: &Harness, parent: &SurfaceController) -> (Rc<PopupController>, SharedLog) {
    let (popup, log) = request_popup(parent, POPUP);
    harness.fire_timers();
    harness.run_commits();
    assert_eq!(popup.state(), PopupState::Live);
    (popup, log)
}

#[test]
fn test_creation_waits_for_parent_timer() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);

    let (popup, log) = request_popup(&parent, POPUP);
    assert_eq!(popup.state(), PopupState::PendingCreate);
    assert!(harness.platform.child_windows(parent.window()).is_empty());
    assert!(harness
        .platform
        .is_timer_active(parent.window(), TimerId::POPUP_CREATE));

    harness.fire_timers();

    assert_eq!(popup.state(), PopupState::Live);
    let child = popup.window().unwrap();
    assert_eq!(harness.platform.child_windows(parent.window()), vec![child]);
    let record = harness.platform.window(child).unwrap();
    assert_eq!(record.rect, Rect::new(110, 120, 50, 60));
    assert!(record.visible);
    assert!(!harness
        .platform
        .is_timer_active(parent.window(), TimerId::POPUP_CREATE));
    assert_eq!(harness.context.pointer_hook.owner(), Some(popup.id()));
    assert_eq!(harness.context.popups_of(parent.id()), vec![popup.id()]);
    assert_eq!(popup.surface_state(), SurfaceState::Initialized);

    harness.run_commits();
    let log = log.borrow();
    assert_eq!(log.attached, 1);
    assert_eq!(log.resizes, vec![Size::new(50, 60)]);
    assert_eq!(log.paints, 1);
}

#[test]
fn test_rect_set_while_pending_is_used_at_creation() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    let (popup, _) = request_popup(&parent, POPUP);

    popup.set_content_rect(Rect::new(0, 0, 30, 30));
    harness.fire_timers();

    let child = popup.window().unwrap();
    assert_eq!(harness.platform.window(child).unwrap().rect, Rect::new(100, 100, 30, 30));
}

#[test]
fn test_hidden_popup_is_created_invisible() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    let (engine, _log) = RecordingEngine::new();
    parent.host().open_popup(engine.boxed(), POPUP, false);
    let popup = parent.popup().unwrap();

    harness.fire_timers();

    assert_eq!(popup.state(), PopupState::Live);
    assert!(!popup.is_visible());
    popup.show();
    assert!(popup.is_visible());
}

#[test]
fn test_reopening_closes_previous_popup() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    let (first, first_log) = live_popup(&harness, &parent);
    let first_window = first.window().unwrap();

    let (second, _) = request_popup(&parent, POPUP);

    assert_eq!(first.state(), PopupState::Closed);
    assert_eq!(first_log.borrow().detached, 1);
    assert!(!harness.platform.is_alive(first_window));
    assert_eq!(second.state(), PopupState::PendingCreate);
    assert_eq!(harness.registry.popup_count(), 1);

    harness.fire_timers();
    assert_eq!(second.state(), PopupState::Live);
    assert_eq!(harness.context.pointer_hook.owner(), Some(second.id()));
}

#[test]
fn test_popup_in_other_window_evicts_first() {
    let harness = Harness::new();
    let (left, _) = open_parent(&harness, Rect::new(0, 0, 300, 300));
    let (right, _) = open_parent(&harness, Rect::new(400, 0, 300, 300));
    let (first, first_log) = live_popup(&harness, &left);

    let (second, _) = live_popup(&harness, &right);

    assert_eq!(first.state(), PopupState::Closed);
    assert_eq!(first_log.borrow().detached, 1);
    assert!(left.popup().is_none());
    assert_eq!(second.state(), PopupState::Live);
    assert_eq!(harness.context.pointer_hook.owner(), Some(second.id()));
    assert_eq!(harness.registry.popup_count(), 1);
}

#[test]
fn test_click_outside_dismisses_and_is_delivered() {
    let harness = Harness::new();
    let (parent, parent_log) = open_parent(&harness, PARENT);
    let (popup, _) = live_popup(&harness, &parent);

    harness.press(parent.window(), MouseButton::Left, Point::new(300, 200));

    assert_eq!(popup.state(), PopupState::Closed);
    assert_eq!(harness.context.pointer_hook.owner(), None);
    assert!(parent.popup().is_none());
    let downs = parent_log
        .borrow()
        .pointer_events()
        .iter()
        .filter(|event| event.kind == PointerKind::Down)
        .count();
    assert_eq!(downs, 1);
}

#[test]
fn test_click_inside_keeps_popup() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    let (popup, popup_log) = live_popup(&harness, &parent);

    harness.press(popup.window().unwrap(), MouseButton::Left, Point::new(5, 5));

    assert_eq!(popup.state(), PopupState::Live);
    assert_eq!(harness.context.capture_owner(), Some(popup.id()));
    let events = popup_log.borrow().pointer_events();
    assert_eq!(events[0].kind, PointerKind::Down);
    assert_eq!(events[0].global_position, Point::new(115, 125));
}

#[test]
fn test_parent_focus_loss_closes_popup() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    let (popup, _) = live_popup(&harness, &parent);

    harness.route(parent.window(), NativeInput::FocusLost);

    assert_eq!(popup.state(), PopupState::Closed);
    assert_eq!(parent.signals().len(), 0);
}

#[test]
fn test_parent_capture_loss_closes_popup() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    let (popup, _) = live_popup(&harness, &parent);

    harness.route(parent.window(), NativeInput::CaptureLost);

    assert_eq!(popup.state(), PopupState::Closed);
}

#[test]
fn test_popup_capture_loss_closes_popup() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    let (popup, _) = live_popup(&harness, &parent);

    harness.route(popup.window().unwrap(), NativeInput::CaptureLost);

    assert_eq!(popup.state(), PopupState::Closed);
    assert_eq!(parent.state(), SurfaceState::Initialized);
}

#[test]
fn test_popup_closing_itself_from_input() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    let (engine, log) = RecordingEngine::new();
    let engine = engine.on_input(|host, event| {
        if event.as_pointer().is_some_and(|pointer| pointer.kind == PointerKind::Down) {
            host.request_close();
        }
    });
    parent.host().open_popup(engine.boxed(), POPUP, true);
    let popup = parent.popup().unwrap();
    harness.fire_timers();
    let child = popup.window().unwrap();

    harness.press(child, MouseButton::Left, Point::new(5, 5));

    assert_eq!(popup.state(), PopupState::Closed);
    assert_eq!(log.borrow().detached, 1);
    assert!(!harness.platform.is_alive(child));
    assert_eq!(harness.context.capture_owner(), None);
    assert_eq!(harness.platform.capture_window(), None);
    assert_eq!(harness.registry.popup_count(), 0);

    // Routing to the dead window is harmless
    harness.release(child, MouseButton::Left, Point::new(5, 5));
    assert_eq!(log.borrow().detached, 1);
}

#[test]
fn test_content_rect_moves_window_and_hook() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    let (popup, log) = live_popup(&harness, &parent);
    let child = popup.window().unwrap();

    popup.set_content_rect(Rect::new(30, 40, 80, 90));
    harness.pump();

    let moved = Rect::new(130, 140, 80, 90);
    assert_eq!(harness.platform.window(child).unwrap().rect, moved);
    assert_eq!(harness.context.pointer_hook.installation().unwrap().bounds, moved);
    assert_eq!(popup.content_rect(), Rect::new(30, 40, 80, 90));
    assert_eq!(log.borrow().resizes.last(), Some(&Size::new(80, 90)));
    assert!(log.borrow().paints >= 2);
}

#[test]
fn test_hide_and_show() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    let (popup, _) = live_popup(&harness, &parent);
    let child = popup.window().unwrap();

    popup.hide();
    assert_eq!(popup.state(), PopupState::Hidden);
    assert!(!harness.platform.window(child).unwrap().visible);

    popup.show();
    assert_eq!(popup.state(), PopupState::Live);
    assert!(harness.platform.window(child).unwrap().visible);
}

#[test]
fn test_hide_while_pressed_leaves_after_release() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    let (popup, log) = live_popup(&harness, &parent);
    let child = popup.window().unwrap();

    harness.move_to(child, Point::new(5, 5), ButtonMask::NONE);
    harness.press(child, MouseButton::Left, Point::new(5, 5));
    popup.hide();
    assert!(popup.gesture().leave_pending);

    harness.release(child, MouseButton::Left, Point::new(5, 5));
    harness.platform.advance(Duration::from_millis(400));
    harness.fire_timers();

    let kinds: Vec<_> = log.borrow().pointer_events().iter().map(|event| event.kind).collect();
    assert_eq!(
        kinds,
        vec![
            PointerKind::Enter,
            PointerKind::Move,
            PointerKind::Down,
            PointerKind::Up,
            PointerKind::Leave
        ]
    );
    assert!(!harness.platform.is_timer_active(child, TimerId::LEAVE_POLL));
    assert_eq!(popup.state(), PopupState::Hidden);
}

#[test]
fn test_window_creation_failure_stays_pending() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    harness.platform.fail_child_windows(true);
    let (popup, log) = request_popup(&parent, POPUP);

    harness.fire_timers();

    assert_eq!(popup.state(), PopupState::PendingCreate);
    assert!(popup.window().is_none());
    assert!(harness.platform.child_windows(parent.window()).is_empty());
    assert_eq!(harness.context.pointer_hook.owner(), None);

    parent.close();
    assert_eq!(popup.state(), PopupState::Closed);
    assert_eq!(harness.registry.popup_count(), 0);
    assert_eq!(log.borrow().attached, 0);
}

#[test]
fn test_class_registration_failure_is_retried() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    let registrations = |harness: &Harness| {
        harness
            .platform
            .count_calls(|call| *call == PlatformCall::RegisterPopupClass)
    };

    harness.platform.fail_class_registration(true);
    let (failed, _) = request_popup(&parent, POPUP);
    assert_eq!(failed.state(), PopupState::PendingCreate);
    assert!(!harness
        .platform
        .is_timer_active(parent.window(), TimerId::POPUP_CREATE));
    assert_eq!(registrations(&harness), 1);

    harness.platform.fail_class_registration(false);
    let (popup, _) = request_popup(&parent, POPUP);
    assert_eq!(failed.state(), PopupState::Closed);
    assert_eq!(registrations(&harness), 2);
    harness.fire_timers();
    assert_eq!(popup.state(), PopupState::Live);

    request_popup(&parent, POPUP);
    assert_eq!(registrations(&harness), 2);
}

#[test]
fn test_parent_close_closes_popup() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    let (popup, log) = live_popup(&harness, &parent);
    let child = popup.window().unwrap();

    parent.close();

    assert_eq!(popup.state(), PopupState::Closed);
    assert_eq!(log.borrow().detached, 1);
    assert!(!harness.platform.is_alive(child));
    assert_eq!(harness.context.pointer_hook.owner(), None);
    assert_eq!(harness.context.surface_count(), 0);
    assert!(harness.registry.is_empty());
}

#[test]
fn test_parent_close_cancels_pending_creation() {
    let harness = Harness::new();
    let (parent, _) = open_parent(&harness, PARENT);
    let (popup, _) = request_popup(&parent, POPUP);

    parent.close();

    assert_eq!(popup.state(), PopupState::Closed);
    assert!(harness
        .platform
        .calls()
        .contains(&PlatformCall::StopTimer(parent.window(), TimerId::POPUP_CREATE)));
    assert_eq!(harness.fire_timers(), 0);
}
