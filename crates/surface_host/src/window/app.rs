//! Application Handler Module
//!
//! `HostApp` is the winit `ApplicationHandler` for the binary. It owns the
//! platform back-end, the commit queue and the thread's surface registry,
//! and delegates every callback to `handlers`.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  HostApp                    │
//! │      (ApplicationHandler for winit)         │
//! ├─────────────────────────────────────────────┤
//! │ platform: Rc<WinitPlatform>                 │
//! │ queue: Rc<TaskQueue>                        │
//! │ registry: Rc<SurfaceRegistry>               │
//! └─────────────────────────────────────────────┘
//!          │
//!          ├─── window_event() → handlers::events
//!          ├─── resumed() → handlers::lifecycle
//!          └─── about_to_wait() → handlers::lifecycle
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use host_state::{HostContext, WindowHandle};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowId;

use super::registry::SurfaceRegistry;
use super::tasks::TaskQueue;
use crate::engine::Engine;
use crate::geometry::Point;
use crate::platform::winit::WinitPlatform;
use crate::settings::HostSettings;

/// Builds the engine for the main window.
pub type EngineFactory = Box<dyn FnMut() -> Box<dyn Engine>>;

pub struct HostApp {
    pub(crate) platform: Rc<WinitPlatform>,
    pub(crate) queue: Rc<TaskQueue>,
    pub(crate) registry: Rc<SurfaceRegistry>,
    pub(crate) settings: HostSettings,
    pub(crate) make_engine: EngineFactory,
    /// Last pointer position per window, client coordinates.
    pub(crate) pointers: HashMap<WindowHandle, Point>,
    /// Focus changes seen this turn, resolved in `about_to_wait`.
    pub(crate) focus_lost: Vec<WindowHandle>,
    pub(crate) focus_gained: Option<WindowHandle>,
    pub(crate) started: bool,
}

impl HostApp {
    pub fn new(settings: HostSettings, context: HostContext, make_engine: EngineFactory) -> Self {
        let platform = Rc::new(WinitPlatform::new(settings.input.double_click_interval()));
        let queue = Rc::new(TaskQueue::new());
        let registry = SurfaceRegistry::new(
            platform.clone(),
            queue.clone(),
            context,
            settings.input.clone(),
        );
        Self {
            platform,
            queue,
            registry,
            settings,
            make_engine,
            pointers: HashMap::new(),
            focus_lost: Vec::new(),
            focus_gained: None,
            started: false,
        }
    }

    pub fn registry(&self) -> &Rc<SurfaceRegistry> {
        &self.registry
    }
}

impl ApplicationHandler for HostApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        super::handlers::lifecycle::handle_resumed(self, event_loop);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        super::handlers::events::dispatch_window_event(self, event_loop, window_id, event);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        super::handlers::lifecycle::handle_about_to_wait(self, event_loop);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        tracing::debug!(
            "Event loop exiting, closing {} surface(s)",
            self.registry.top_level_count()
        );
        self.registry.close_all();
    }
}
