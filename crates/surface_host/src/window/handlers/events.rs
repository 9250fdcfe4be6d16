//! Window event dispatcher
//!
//! Translates winit window events into [`NativeInput`] and routes them
//! through the registry.

use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{
    ElementState, KeyEvent as WinitKeyEvent, MouseButton as WinitMouseButton, MouseScrollDelta,
    WindowEvent,
};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::PhysicalKey;
use winit::window::WindowId;

use host_state::WindowHandle;

use crate::geometry::{Point, Size};
use crate::platform::Platform;
use crate::window::input::wheel::WHEEL_DELTA;
use crate::window::input::{
    keycode_to_vk, NativeInput, ToHostModifiers, ToHostMouseButton, WheelAxis,
};
use crate::window::HostApp;

/// Precise-scroll pixels that count as one wheel notch.
const PIXELS_PER_NOTCH: f64 = 40.0;

pub fn dispatch_window_event(
    app: &mut HostApp,
    _event_loop: &ActiveEventLoop,
    window_id: WindowId,
    event: WindowEvent,
) {
    let Some(window) = app.platform.handle_for(window_id) else {
        return;
    };

    match event {
        WindowEvent::CloseRequested => {
            app.registry.route(window, NativeInput::CloseRequested);
        }
        WindowEvent::Resized(size) => handle_resized(app, window, size),
        WindowEvent::Moved(_) => app.platform.observe_geometry(window),
        WindowEvent::Focused(true) => {
            app.focus_gained = Some(window);
            app.registry.route(window, NativeInput::FocusGained);
        }
        WindowEvent::Focused(false) => app.focus_lost.push(window),
        WindowEvent::ModifiersChanged(modifiers) => {
            app.platform.set_modifiers(modifiers.state().to_host());
        }
        WindowEvent::CursorMoved { position, .. } => handle_cursor_moved(app, window, position),
        WindowEvent::CursorLeft { .. } => {
            app.pointers.remove(&window);
            app.platform.set_cursor_position(None);
            app.registry.route(window, NativeInput::PointerLeave);
        }
        WindowEvent::MouseInput { state, button, .. } => {
            handle_mouse_input(app, window, state, button)
        }
        WindowEvent::MouseWheel { delta, .. } => handle_mouse_wheel(app, window, delta),
        WindowEvent::KeyboardInput { event, .. } => handle_keyboard_input(app, window, event),
        WindowEvent::Destroyed => {
            tracing::trace!("{} destroyed", window);
            app.pointers.remove(&window);
        }
        _ => {}
    }
}

fn handle_resized(app: &mut HostApp, window: WindowHandle, size: PhysicalSize<u32>) {
    app.platform.observe_geometry(window);
    app.registry
        .route(window, NativeInput::Resized(Size::new(size.width, size.height)));
}

/// Client and screen position of the pointer in `window`.
fn pointer_position(app: &HostApp, window: WindowHandle) -> (Point, Point) {
    let position = app.pointers.get(&window).copied().unwrap_or_default();
    let origin = app.platform.window_rect(window).origin;
    (position, origin.offset(position))
}

fn handle_cursor_moved(app: &mut HostApp, window: WindowHandle, position: PhysicalPosition<f64>) {
    let local = Point::new(position.x.round() as i32, position.y.round() as i32);
    app.pointers.insert(window, local);
    let (position, global) = pointer_position(app, window);
    app.platform.set_cursor_position(Some(global));
    app.registry.route(
        window,
        NativeInput::PointerMove {
            position,
            global,
            buttons: app.platform.buttons(),
        },
    );
}

fn handle_mouse_input(
    app: &mut HostApp,
    window: WindowHandle,
    state: ElementState,
    button: WinitMouseButton,
) {
    let Some(button) = button.to_host() else {
        return;
    };
    let (position, global) = pointer_position(app, window);
    let input = match state {
        ElementState::Pressed => {
            app.platform.press(button);
            NativeInput::PointerDown {
                button,
                position,
                global,
                buttons: app.platform.buttons(),
            }
        }
        ElementState::Released => {
            app.platform.release(button);
            NativeInput::PointerUp {
                button,
                position,
                global,
                buttons: app.platform.buttons(),
            }
        }
    };
    app.registry.route(window, input);
}

fn handle_mouse_wheel(app: &mut HostApp, window: WindowHandle, delta: MouseScrollDelta) {
    let (x, y) = match delta {
        MouseScrollDelta::LineDelta(x, y) => (f64::from(x), f64::from(y)),
        MouseScrollDelta::PixelDelta(pixels) => {
            (pixels.x / PIXELS_PER_NOTCH, pixels.y / PIXELS_PER_NOTCH)
        }
    };
    let (position, global) = pointer_position(app, window);

    for (amount, axis) in [(y, WheelAxis::Vertical), (x, WheelAxis::Horizontal)] {
        let delta = (amount * f64::from(WHEEL_DELTA)).round() as i32;
        if delta == 0 {
            continue;
        }
        app.registry.route(
            window,
            NativeInput::Wheel {
                delta,
                axis,
                position,
                global,
            },
        );
    }
}

fn handle_keyboard_input(app: &mut HostApp, window: WindowHandle, event: WinitKeyEvent) {
    let PhysicalKey::Code(code) = event.physical_key else {
        return;
    };
    let Some(vk) = keycode_to_vk(code) else {
        tracing::trace!("Unmapped key {:?}", code);
        return;
    };

    match event.state {
        ElementState::Pressed => {
            app.registry.route(
                window,
                NativeInput::KeyDown {
                    code: vk,
                    repeat: event.repeat,
                },
            );
            if let Some(text) = &event.text {
                let typed = |ch: &char| {
                    !ch.is_control() || *ch == '\r' || *ch == '\t' || *ch == '\u{8}'
                };
                for ch in text.chars().filter(typed) {
                    app.registry.route(
                        window,
                        NativeInput::Char {
                            ch,
                            repeat: event.repeat,
                        },
                    );
                }
            }
        }
        ElementState::Released => {
            app.registry.route(window, NativeInput::KeyUp { code: vk });
        }
    }
}
