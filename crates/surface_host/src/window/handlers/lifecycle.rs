//! Application lifecycle event handlers
//!
//! `resumed` creates the main window; `about_to_wait` is the host's idle
//! turn: popup windows are realized, focus changes resolved, timers fired
//! and commit tasks drained.

use winit::event_loop::{ActiveEventLoop, ControlFlow};

use crate::window::input::NativeInput;
use crate::window::HostApp;

/// Create the main window on first resume.
pub fn handle_resumed(app: &mut HostApp, event_loop: &ActiveEventLoop) {
    if app.started {
        return;
    }
    app.started = true;

    let handle = match app.platform.create_top_level(event_loop, &app.settings.window) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("Failed to create main window: {}", e);
            event_loop.exit();
            return;
        }
    };

    let engine = (app.make_engine)();
    let surface = app.registry.create_surface(handle, engine);
    tracing::info!("Main surface {} running in {}", surface.id(), handle);
}

pub fn handle_about_to_wait(app: &mut HostApp, event_loop: &ActiveEventLoop) {
    let _span = tracing::trace_span!("about_to_wait").entered();

    app.platform.realize_pending(event_loop);
    resolve_focus(app);

    for (window, timer) in app.platform.due_timers(std::time::Instant::now()) {
        app.registry.route(window, NativeInput::Timer(timer));
    }

    let ran = app.queue.run_pending();
    if ran > 0 {
        tracing::trace!("Ran {} commit task(s)", ran);
    }
    app.registry.flush_pending();

    if app.started && app.registry.top_level_count() == 0 {
        tracing::info!("Last surface closed, exiting");
        event_loop.exit();
        return;
    }

    if !app.queue.is_empty() || app.platform.has_pending_windows() {
        event_loop.set_control_flow(ControlFlow::Poll);
    } else if let Some(deadline) = app.platform.next_deadline() {
        event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
    } else {
        event_loop.set_control_flow(ControlFlow::Wait);
    }
}

/// A surface losing focus to one of its own popups keeps its focus state;
/// otherwise the loss is delivered.
fn resolve_focus(app: &mut HostApp) {
    let gained = app.focus_gained.take();
    for window in std::mem::take(&mut app.focus_lost) {
        let to_own_popup =
            gained.is_some_and(|gained| app.registry.parent_window_of(gained) == Some(window));
        if to_own_popup {
            tracing::trace!("{} lost focus to its popup, keeping focus state", window);
            continue;
        }
        app.registry.route(window, NativeInput::FocusLost);
    }
}
