//! Input dispatcher
//!
//! Turns native pointer, wheel and key notifications for one surface into
//! canonical engine events, keeping the short-lived gesture state needed for
//! double clicks, capture, window dragging and synthetic leave detection.
//!
//! The dispatcher never talks to the engine or the platform directly. It
//! goes through an [`InputSink`] so the surface decides what delivery means
//! (and can drop events once teardown has started).

use std::time::Duration;

use super::click::ClickCounter;
use super::event::{ButtonMask, InputEvent, Modifiers, MouseButton, PointerEvent, PointerKind};
use super::keyboard;
use super::native::WheelAxis;
use super::wheel::{convert_wheel, WheelInput};
use crate::geometry::{Point, OFF_SURFACE};
use crate::platform::WheelScrollLines;
use crate::settings::InputSettings;

/// What the dispatcher needs from its surface.
pub trait InputSink {
    /// Hand an event to the engine. Returns whether it was handled.
    fn deliver(&mut self, event: InputEvent) -> bool;

    fn hit_test_draggable(&mut self, point: Point) -> bool;

    fn notify_drag_ended(&mut self, point: Point, global: Point);

    fn set_capture(&mut self);

    fn release_capture(&mut self);

    fn has_capture(&self) -> bool;

    fn has_focus(&self) -> bool;

    fn focus(&mut self);

    fn begin_system_move(&mut self);

    fn start_leave_timer(&mut self, interval: Duration);

    fn stop_leave_timer(&mut self);

    /// Whether the pointer is within the surface. `true` when unknown.
    fn pointer_in_bounds(&self) -> bool;

    fn is_visible(&self) -> bool;

    fn modifiers(&self) -> Modifiers;

    fn now(&self) -> Duration;

    fn double_click_interval(&self) -> Duration;

    fn wheel_scroll_lines(&self) -> WheelScrollLines;
}

/// Derived per-gesture state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureState {
    pub is_left_button_down: bool,
    /// Buttons whose press was forwarded to the engine.
    pub pressed: ButtonMask,
    pub last_move_position: Option<(Point, Point)>,
    pub mouse_inside_surface: bool,
    pub is_draggable_region_hit: bool,
    /// A press on a draggable region handed the window to the system move loop.
    pub draggable_node_armed: bool,
    /// Where the current left-button gesture started (client, screen).
    pub drag_anchor: (Point, Point),
    /// The pointer moved while the left button was held.
    pub is_dragging: bool,
    pub last_click_count: u8,
    /// Hidden while a button was held. Leave goes out on the last release.
    pub leave_pending: bool,
}

impl GestureState {
    fn button_held(&self) -> bool {
        self.is_left_button_down || self.draggable_node_armed || !self.pressed.is_empty()
    }

    fn holds(&self, button: MouseButton) -> bool {
        self.pressed.contains(button)
            || (button == MouseButton::Left
                && (self.is_left_button_down || self.draggable_node_armed))
    }
}

pub struct InputDispatcher {
    settings: InputSettings,
    clicks: ClickCounter,
    gesture: GestureState,
}

impl InputDispatcher {
    pub fn new(settings: InputSettings) -> Self {
        let interval = settings.double_click_interval().unwrap_or(Duration::from_millis(500));
        let distance = settings.double_click_distance;
        Self {
            settings,
            clicks: ClickCounter::new(interval, distance),
            gesture: GestureState::default(),
        }
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    /// Forget everything about the current gesture.
    pub fn reset(&mut self) {
        self.gesture = GestureState::default();
        self.clicks.reset();
    }

    fn pointer_event(
        &self,
        sink: &dyn InputSink,
        kind: PointerKind,
        button: Option<MouseButton>,
        click_count: u8,
        position: Point,
        global: Point,
    ) -> InputEvent {
        InputEvent::Pointer(PointerEvent {
            kind,
            button,
            buttons: self.gesture.pressed,
            click_count,
            position,
            global_position: global,
            modifiers: sink.modifiers(),
            timestamp: sink.now(),
        })
    }

    pub fn pointer_down(
        &mut self,
        sink: &mut dyn InputSink,
        button: MouseButton,
        position: Point,
        global: Point,
    ) {
        self.clicks.interval = self
            .settings
            .double_click_interval()
            .unwrap_or_else(|| sink.double_click_interval());
        let click_count = self.clicks.press(sink.now(), position);
        self.gesture.last_click_count = click_count;

        if button == MouseButton::Left
            && self.settings.draggable_regions
            && sink.hit_test_draggable(position)
        {
            tracing::trace!("Press on draggable region at {:?}, starting system move", position);
            self.gesture.is_draggable_region_hit = true;
            self.gesture.draggable_node_armed = true;
            self.gesture.drag_anchor = (position, global);
            sink.begin_system_move();
            return;
        }

        self.gesture.pressed = self.gesture.pressed.with(button);
        let event = self.pointer_event(
            &*sink,
            PointerKind::Down,
            Some(button),
            click_count,
            position,
            global,
        );
        sink.deliver(event);

        if button == MouseButton::Left {
            self.gesture.is_left_button_down = true;
            self.gesture.is_dragging = false;
            self.gesture.drag_anchor = (position, global);
            sink.set_capture();
            if !sink.has_focus() {
                sink.focus();
            }
        }
    }

    pub fn pointer_up(
        &mut self,
        sink: &mut dyn InputSink,
        button: MouseButton,
        position: Point,
        global: Point,
    ) {
        let was_armed = button == MouseButton::Left && self.gesture.draggable_node_armed;
        if button == MouseButton::Left {
            self.gesture.draggable_node_armed = false;
            self.gesture.is_draggable_region_hit = false;
        }

        if sink.has_capture() {
            sink.release_capture();
        }

        // The engine never saw the press that started a system move
        if !was_armed {
            self.gesture.pressed = self.gesture.pressed.without(button);
            let click_count = self.gesture.last_click_count.max(1);
            let event = self.pointer_event(
                &*sink,
                PointerKind::Up,
                Some(button),
                click_count,
                position,
                global,
            );
            sink.deliver(event);
        }

        if button == MouseButton::Left {
            let dragging = std::mem::take(&mut self.gesture.is_dragging);
            self.gesture.is_left_button_down = false;
            if dragging || was_armed {
                sink.notify_drag_ended(position, global);
            }
        }

        if self.gesture.leave_pending && !self.gesture.button_held() {
            tracing::trace!("Last button released on hidden surface, delivering deferred leave");
            self.pointer_leave(sink);
        }
    }

    pub fn pointer_move(
        &mut self,
        sink: &mut dyn InputSink,
        position: Point,
        global: Point,
        buttons: ButtonMask,
    ) {
        // The release got lost (typically swallowed by a system move loop)
        for button in MouseButton::ALL {
            if self.gesture.holds(button) && !buttons.contains(button) {
                tracing::debug!(
                    "{:?} button released without notification, synthesizing release",
                    button
                );
                self.pointer_up(sink, button, position, global);
            }
        }

        if !self.gesture.mouse_inside_surface {
            self.gesture.mouse_inside_surface = true;
            let enter = self.pointer_event(&*sink, PointerKind::Enter, None, 0, position, global);
            sink.deliver(enter);
            sink.start_leave_timer(self.settings.leave_poll_interval());
        }

        if self.gesture.is_left_button_down && position != self.gesture.drag_anchor.0 {
            self.gesture.is_dragging = true;
        }

        self.gesture.last_move_position = Some((position, global));
        let event = self.pointer_event(&*sink, PointerKind::Move, None, 0, position, global);
        sink.deliver(event);
    }

    /// Leave, either reported by the platform or detected by the poll timer.
    pub fn pointer_leave(&mut self, sink: &mut dyn InputSink) {
        if self.gesture.button_held() {
            tracing::trace!("Leave suppressed while a button is held");
            return;
        }
        sink.stop_leave_timer();
        self.gesture.leave_pending = false;
        if !self.gesture.mouse_inside_surface {
            return;
        }
        self.gesture.mouse_inside_surface = false;
        let (position, global) = self.gesture.last_move_position.unwrap_or_default();
        let event = self.pointer_event(&*sink, PointerKind::Leave, None, 0, position, global);
        sink.deliver(event);
    }

    /// One tick of the leave poll timer.
    pub fn leave_poll_tick(&mut self, sink: &mut dyn InputSink) {
        if !self.gesture.mouse_inside_surface {
            sink.stop_leave_timer();
            return;
        }
        if sink.is_visible() && sink.pointer_in_bounds() {
            return;
        }
        tracing::trace!("Leave poll detected pointer outside surface");
        self.pointer_leave(sink);
    }

    pub fn wheel(
        &mut self,
        sink: &mut dyn InputSink,
        delta: i32,
        axis: WheelAxis,
        position: Point,
        global: Point,
    ) {
        let event = convert_wheel(
            WheelInput {
                delta,
                axis,
                position,
                global,
            },
            sink.wheel_scroll_lines(),
            self.settings.pixels_per_line,
            sink.modifiers(),
            sink.now(),
        );
        sink.deliver(InputEvent::Wheel(event));
    }

    pub fn key_down(&mut self, sink: &mut dyn InputSink, code: u32, repeat: bool) {
        let event = keyboard::key_down(code, repeat, sink.modifiers(), sink.now());
        sink.deliver(InputEvent::Key(event));
    }

    pub fn key_up(&mut self, sink: &mut dyn InputSink, code: u32) {
        let event = keyboard::key_up(code, sink.modifiers(), sink.now());
        sink.deliver(InputEvent::Key(event));
    }

    pub fn char_input(&mut self, sink: &mut dyn InputSink, ch: char, repeat: bool) {
        let event = keyboard::char_event(ch, repeat, sink.modifiers(), sink.now());
        sink.deliver(InputEvent::Key(event));
    }

    pub fn notify_capture_lost(&mut self, sink: &mut dyn InputSink) {
        self.abort_drag(sink);
    }

    pub fn notify_focus_lost(&mut self, sink: &mut dyn InputSink) {
        self.abort_drag(sink);
    }

    /// Close any half-finished drag so the engine's drag state cannot hang.
    fn abort_drag(&mut self, sink: &mut dyn InputSink) {
        self.gesture.is_draggable_region_hit = false;
        self.gesture.draggable_node_armed = false;
        if !self.gesture.is_left_button_down {
            return;
        }

        let (anchor, anchor_global) = self.gesture.drag_anchor;
        tracing::debug!("Drag interrupted, synthesizing release at {:?}", anchor);
        self.gesture.is_left_button_down = false;
        self.gesture.pressed = self.gesture.pressed.without(MouseButton::Left);
        if sink.has_capture() {
            sink.release_capture();
        }
        let click_count = self.gesture.last_click_count.max(1);
        let event = self.pointer_event(
            &*sink,
            PointerKind::Up,
            Some(MouseButton::Left),
            click_count,
            anchor,
            anchor_global,
        );
        sink.deliver(event);
        if std::mem::take(&mut self.gesture.is_dragging) {
            sink.notify_drag_ended(anchor, anchor_global);
        }
    }

    /// Release every button and move the pointer off the surface, so no
    /// gesture stays latched inside the engine after teardown.
    pub fn synthesize_release(&mut self, sink: &mut dyn InputSink) {
        let (position, global) = self
            .gesture
            .last_move_position
            .unwrap_or(self.gesture.drag_anchor);
        self.gesture.pressed = ButtonMask::NONE;
        for button in MouseButton::ALL {
            let event =
                self.pointer_event(&*sink, PointerKind::Up, Some(button), 1, position, global);
            sink.deliver(event);
        }
        let event =
            self.pointer_event(&*sink, PointerKind::Move, None, 0, OFF_SURFACE, OFF_SURFACE);
        sink.deliver(event);

        if sink.has_capture() {
            sink.release_capture();
        }
        sink.stop_leave_timer();
        self.reset();
    }

    /// The surface was hidden: the pointer can no longer be inside it.
    pub fn on_hidden(&mut self, sink: &mut dyn InputSink) {
        if self.gesture.mouse_inside_surface && self.gesture.button_held() {
            self.gesture.leave_pending = true;
        } else {
            self.pointer_leave(sink);
            self.gesture.mouse_inside_surface = false;
        }
        sink.stop_leave_timer();
    }
}
