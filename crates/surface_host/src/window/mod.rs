//! Window Management Module
//!
//! Surfaces, popups and the machinery between native windows and the engine.
//!
//! ## Architecture
//!
//! ```text
//! native window ──NativeInput──▶ SurfaceRegistry::route
//!                                      │
//!                    ┌─────────────────┴──────────────────┐
//!                    ▼                                    ▼
//!             SurfaceController                    PopupController
//!                    │                                    │
//!                    └────────────▶ SurfaceCore ◀─────────┘
//!                                    ├─ InputDispatcher ──▶ Engine::dispatch_input
//!                                    └─ FrameScheduler ──▶ CommitTask ──▶ Engine::layout/paint
//! ```
//!
//! ## Modules
//!
//! - `surface` - per-surface controller and lifecycle
//! - `popup` - transient child surfaces
//! - `registry` - per-thread ownership and routing
//! - `scheduler`, `tasks` - coalesced, deferred commits
//! - `guard` - reentrancy-safe teardown
//! - `signals` - parent → popup notifications
//! - `input` - native input → engine events
//! - `app`, `handlers` - winit application handler

pub mod app;
pub mod guard;
pub mod handlers;
pub mod host;
pub mod input;
pub mod popup;
pub mod registry;
pub mod scheduler;
pub mod signals;
pub mod state;
pub mod surface;
pub mod tasks;

pub use app::{EngineFactory, HostApp};
pub use host::SurfaceHost;
pub use popup::{PopupController, PopupState};
pub use registry::SurfaceRegistry;
pub use scheduler::{CommitPlan, CommitStats, FrameScheduler};
pub use signals::{SignalHub, SubscriptionId, SurfaceObserver, SurfaceSignal};
pub use state::SurfaceState;
pub use surface::SurfaceController;
pub use tasks::{CommitExecutor, CommitTarget, CommitTask, TaskQueue};
