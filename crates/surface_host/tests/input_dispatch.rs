// Input dispatch tests
//
// Native messages routed through the registry into a recording engine.

use std::rc::Rc;
use std::time::Duration;

use surface_host::testing::{Harness, PlatformCall, RecordingEngine, SharedLog};
use surface_host::window::input::keys;
use surface_host::{
    ButtonMask, KeyKind, MouseButton, NativeInput, Point, PointerKind, Rect, SurfaceController,
    SurfaceSignal, TimerId, WheelAxis, WheelGranularity, WheelScrollLines,
};

fn open(harness: &Harness) -> (Rc<SurfaceController>, SharedLog) {
    let (engine, log) = RecordingEngine::new();
    let surface = harness.open_surface(Rect::new(0, 0, 200, 100), engine.boxed());
    harness.run_commits();
    (surface, log)
}

fn kinds(log: &SharedLog) -> Vec<PointerKind> {
    log.borrow().pointer_events().iter().map(|event| event.kind).collect()
}

fn down_click_counts(log: &SharedLog) -> Vec<u8> {
    log.borrow()
        .pointer_events()
        .iter()
        .filter(|event| event.kind == PointerKind::Down)
        .map(|event| event.click_count)
        .collect()
}

fn click(harness: &Harness, surface: &SurfaceController, at: Point) {
    harness.press(surface.window(), MouseButton::Left, at);
    harness.release(surface.window(), MouseButton::Left, at);
}

#[test]
fn test_double_click_needs_time_and_distance() {
    let harness = Harness::new();
    let (surface, log) = open(&harness);

    click(&harness, &surface, Point::new(10, 10));
    harness.platform.advance(Duration::from_millis(100));
    click(&harness, &surface, Point::new(12, 11));

    assert_eq!(down_click_counts(&log), vec![1, 2]);
}

#[test]
fn test_far_second_press_is_a_single_click() {
    let harness = Harness::new();
    let (surface, log) = open(&harness);

    click(&harness, &surface, Point::new(10, 10));
    harness.platform.advance(Duration::from_millis(100));
    click(&harness, &surface, Point::new(200, 10));

    assert_eq!(down_click_counts(&log), vec![1, 1]);
}

#[test]
fn test_slow_second_press_is_a_single_click() {
    let harness = Harness::new();
    let (surface, log) = open(&harness);

    click(&harness, &surface, Point::new(10, 10));
    harness.platform.advance(Duration::from_millis(600));
    click(&harness, &surface, Point::new(10, 10));

    assert_eq!(down_click_counts(&log), vec![1, 1]);
}

#[test]
fn test_press_captures_and_focuses() {
    let harness = Harness::new();
    let (surface, _log) = open(&harness);
    let window = surface.window();

    harness.press(window, MouseButton::Left, Point::new(10, 10));
    assert_eq!(harness.platform.capture_window(), Some(window));
    assert_eq!(harness.platform.focused_window(), Some(window));
    assert_eq!(harness.context.capture_owner(), Some(surface.id()));
    assert!(surface.gesture().is_left_button_down);

    harness.release(window, MouseButton::Left, Point::new(10, 10));
    assert_eq!(harness.platform.capture_window(), None);
    assert_eq!(harness.context.capture_owner(), None);
}

#[test]
fn test_leave_suppressed_while_button_held() {
    let harness = Harness::new();
    let (surface, log) = open(&harness);
    let window = surface.window();

    harness.move_to(window, Point::new(50, 50), ButtonMask::NONE);
    harness.press(window, MouseButton::Left, Point::new(50, 50));
    harness.route(window, NativeInput::PointerLeave);
    assert_eq!(
        kinds(&log),
        vec![PointerKind::Enter, PointerKind::Move, PointerKind::Down]
    );

    harness.release(window, MouseButton::Left, Point::new(50, 50));
    harness.route(window, NativeInput::PointerLeave);
    assert_eq!(
        kinds(&log),
        vec![
            PointerKind::Enter,
            PointerKind::Move,
            PointerKind::Down,
            PointerKind::Up,
            PointerKind::Leave
        ]
    );
    assert!(!harness.platform.is_timer_active(window, TimerId::LEAVE_POLL));
}

#[test]
fn test_leave_poll_detects_pointer_outside() {
    let harness = Harness::new();
    let (surface, log) = open(&harness);
    let window = surface.window();

    harness.move_to(window, Point::new(50, 50), ButtonMask::NONE);
    assert!(harness.platform.is_timer_active(window, TimerId::LEAVE_POLL));

    // Still inside: the tick changes nothing
    harness.platform.advance(Duration::from_millis(200));
    harness.fire_timers();
    assert_eq!(kinds(&log), vec![PointerKind::Enter, PointerKind::Move]);

    harness.platform.set_cursor_position(Some(Point::new(500, 500)));
    harness.platform.advance(Duration::from_millis(200));
    harness.fire_timers();

    let events = log.borrow().pointer_events();
    let leave = events.last().unwrap();
    assert_eq!(leave.kind, PointerKind::Leave);
    assert_eq!(leave.position, Point::new(50, 50));
    assert!(!harness.platform.is_timer_active(window, TimerId::LEAVE_POLL));
    assert!(!surface.gesture().mouse_inside_surface);
}

#[test]
fn test_lost_release_is_synthesized_on_move() {
    let harness = Harness::new();
    let (surface, log) = open(&harness);
    let window = surface.window();

    harness.press(window, MouseButton::Left, Point::new(10, 10));
    harness.move_to(window, Point::new(20, 20), ButtonMask::NONE);

    assert_eq!(
        kinds(&log),
        vec![
            PointerKind::Down,
            PointerKind::Up,
            PointerKind::Enter,
            PointerKind::Move
        ]
    );
    assert!(!surface.gesture().is_left_button_down);
    assert_eq!(harness.platform.capture_window(), None);
}

#[test]
fn test_lost_right_release_is_synthesized_on_move() {
    let harness = Harness::new();
    let (surface, log) = open(&harness);
    let window = surface.window();

    harness.move_to(window, Point::new(50, 50), ButtonMask::NONE);
    harness.press(window, MouseButton::Right, Point::new(50, 50));
    harness.move_to(window, Point::new(60, 60), ButtonMask::NONE);
    harness.route(window, NativeInput::PointerLeave);

    assert_eq!(
        kinds(&log),
        vec![
            PointerKind::Enter,
            PointerKind::Move,
            PointerKind::Down,
            PointerKind::Up,
            PointerKind::Move,
            PointerKind::Leave
        ]
    );
    let events = log.borrow().pointer_events();
    assert_eq!(events[3].button, Some(MouseButton::Right));
    assert_eq!(events[3].position, Point::new(60, 60));
    assert!(surface.gesture().pressed.is_empty());
    assert!(!surface.gesture().mouse_inside_surface);
}

#[test]
fn test_draggable_press_starts_system_move() {
    let harness = Harness::new();
    let (engine, log) = RecordingEngine::new();
    let engine = engine.with_draggable(Rect::new(0, 0, 200, 20));
    let surface = harness.open_surface(Rect::new(0, 0, 200, 100), engine.boxed());
    let window = surface.window();

    harness.press(window, MouseButton::Left, Point::new(50, 10));
    assert_eq!(
        harness
            .platform
            .count_calls(|call| *call == PlatformCall::BeginSystemMove(window)),
        1
    );
    assert!(surface.gesture().draggable_node_armed);

    harness.release(window, MouseButton::Left, Point::new(50, 10));

    let log = log.borrow();
    assert!(log.pointer_events().is_empty());
    assert_eq!(log.drags_ended, vec![Point::new(50, 10)]);
    assert!(!surface.gesture().draggable_node_armed);
}

#[test]
fn test_drag_ends_with_notification() {
    let harness = Harness::new();
    let (surface, log) = open(&harness);
    let window = surface.window();

    harness.press(window, MouseButton::Left, Point::new(10, 10));
    harness.move_to(window, Point::new(40, 40), ButtonMask::LEFT);
    assert!(surface.gesture().is_dragging);
    harness.release(window, MouseButton::Left, Point::new(40, 40));

    assert_eq!(log.borrow().drags_ended, vec![Point::new(40, 40)]);
    assert!(!surface.gesture().is_dragging);
}

#[test]
fn test_capture_lost_aborts_drag() {
    let harness = Harness::new();
    let (surface, log) = open(&harness);
    let window = surface.window();

    harness.press(window, MouseButton::Left, Point::new(10, 10));
    harness.move_to(window, Point::new(40, 40), ButtonMask::LEFT);
    harness.route(window, NativeInput::CaptureLost);

    let events = log.borrow().pointer_events();
    let up = events.last().unwrap();
    assert_eq!(up.kind, PointerKind::Up);
    assert_eq!(up.button, Some(MouseButton::Left));
    assert_eq!(up.position, Point::new(10, 10));
    assert_eq!(log.borrow().drags_ended, vec![Point::new(10, 10)]);
    assert!(!surface.gesture().is_left_button_down);
}

#[test]
fn test_capture_moves_between_surfaces() {
    let harness = Harness::new();
    let (first, first_log) = open(&harness);
    let (engine, _second_log) = RecordingEngine::new();
    let second = harness.open_surface(Rect::new(300, 0, 200, 100), engine.boxed());

    harness.press(first.window(), MouseButton::Left, Point::new(10, 10));
    harness.press(second.window(), MouseButton::Left, Point::new(10, 10));

    assert_eq!(harness.context.capture_owner(), Some(second.id()));
    assert_eq!(harness.platform.capture_window(), Some(second.window()));
    assert_eq!(
        kinds(&first_log),
        vec![PointerKind::Down, PointerKind::Up]
    );
    assert!(!first.gesture().is_left_button_down);
}

#[test]
fn test_focus_loss_aborts_drag_and_notifies() {
    let harness = Harness::new();
    let (surface, log) = open(&harness);
    let window = surface.window();

    harness.press(window, MouseButton::Left, Point::new(10, 10));
    harness.route(window, NativeInput::FocusLost);

    let log = log.borrow();
    assert_eq!(log.focus, vec![false]);
    assert_eq!(log.pointer_events().last().unwrap().kind, PointerKind::Up);
}

#[test]
fn test_wheel_lines_become_pixels() {
    let harness = Harness::new();
    let (surface, log) = open(&harness);
    harness.platform.set_wheel_scroll_lines(WheelScrollLines::Lines(3));

    harness.route(
        surface.window(),
        NativeInput::Wheel {
            delta: 120,
            axis: WheelAxis::Vertical,
            position: Point::new(5, 5),
            global: Point::new(5, 5),
        },
    );

    let log = log.borrow();
    let wheel = log.events[0].as_wheel().unwrap();
    assert_eq!(wheel.granularity, WheelGranularity::Pixel);
    assert!((wheel.delta_y - 100.0).abs() < 0.01);
    assert_eq!(wheel.delta_x, 0.0);
    assert_eq!(wheel.wheel_ticks_y, 1.0);
}

#[test]
fn test_wheel_pages() {
    let harness = Harness::new();
    let (surface, log) = open(&harness);
    harness.platform.set_wheel_scroll_lines(WheelScrollLines::Page);

    harness.route(
        surface.window(),
        NativeInput::Wheel {
            delta: -240,
            axis: WheelAxis::Horizontal,
            position: Point::new(5, 5),
            global: Point::new(5, 5),
        },
    );

    let log = log.borrow();
    let wheel = log.events[0].as_wheel().unwrap();
    assert_eq!(wheel.granularity, WheelGranularity::Page);
    assert_eq!(wheel.delta_x, -2.0);
    assert_eq!(wheel.delta_y, 0.0);
}

#[test]
fn test_keys_and_chars() {
    let harness = Harness::new();
    let (surface, log) = open(&harness);
    let window = surface.window();

    harness.route(window, NativeInput::KeyDown { code: keys::UP, repeat: false });
    harness.route(window, NativeInput::Char { ch: 'a', repeat: true });
    harness.route(window, NativeInput::KeyUp { code: keys::UP });

    let log = log.borrow();
    let received: Vec<_> = log.events.iter().filter_map(|event| event.as_key()).collect();
    assert_eq!(received.len(), 3);
    assert_eq!(received[0].kind, KeyKind::RawKeyDown);
    assert_eq!(received[0].key_identifier, "Up");
    assert_eq!(received[1].kind, KeyKind::Char);
    assert_eq!(received[1].text.as_deref(), Some("a"));
    assert!(received[1].is_repeat);
    assert_eq!(received[2].kind, KeyKind::KeyUp);
}

#[test]
fn test_nested_dispatch_is_rejected() {
    let harness = Harness::new();
    let window = harness.platform.add_window(Rect::new(0, 0, 200, 100));
    let registry = harness.registry.clone();
    let (engine, log) = RecordingEngine::new();
    let engine = engine.on_input(move |_host, event| {
        if event.as_key().is_some_and(|key| key.key_code == keys::KEY_A) {
            registry.route(window, NativeInput::KeyDown { code: keys::ESCAPE, repeat: false });
        }
    });
    let surface = harness.registry.create_surface(window, engine.boxed());

    harness.route(window, NativeInput::KeyDown { code: keys::KEY_A, repeat: false });

    let codes: Vec<u32> = log
        .borrow()
        .events
        .iter()
        .filter_map(|event| event.as_key().map(|key| key.key_code))
        .collect();
    assert_eq!(codes, vec![keys::KEY_A]);
    assert!(surface.host().is_alive());

    // The surface still takes input once the outer dispatch has unwound
    harness.route(window, NativeInput::KeyDown { code: keys::DOWN, repeat: false });
    assert_eq!(log.borrow().events.len(), 2);
}

#[test]
fn test_top_level_capture_loss_is_signalled() {
    use std::cell::RefCell;
    use surface_host::{SurfaceId, SurfaceObserver};

    struct Seen(RefCell<Vec<SurfaceSignal>>);

    impl SurfaceObserver for Seen {
        fn on_surface_signal(&self, _source: SurfaceId, signal: SurfaceSignal) {
            self.0.borrow_mut().push(signal);
        }
    }

    let harness = Harness::new();
    let (surface, _log) = open(&harness);
    let seen = Rc::new(Seen(RefCell::new(Vec::new())));
    let observer: Rc<dyn SurfaceObserver> = seen.clone();
    surface.signals().subscribe(Rc::downgrade(&observer));

    harness.route(surface.window(), NativeInput::CaptureLost);
    harness.route(surface.window(), NativeInput::FocusLost);

    assert_eq!(
        *seen.0.borrow(),
        vec![SurfaceSignal::CaptureLost, SurfaceSignal::FocusLost]
    );
}
