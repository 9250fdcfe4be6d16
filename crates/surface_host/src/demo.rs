//! Demo content engine
//!
//! A small software engine for the `surface_host` binary. It paints flat
//! colored regions, no text:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ title strip (drag to move window)    │
//! ├──────────────────────────────────────┤
//! │ [ select ▾ ]  ← opens a popup list   │
//! │ ┌──────────────────────────────────┐ │
//! │ │ row 0                            │ │
//! │ │ row 1  (wheel scrolls, ↑/↓ select)│ │
//! │ │ ...                              │ │
//! │ └──────────────────────────────────┘ │
//! └──────────────────────────────────────┘
//! ```

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::engine::{Engine, PaintTarget};
use crate::geometry::{Point, Rect, Size};
use crate::platform::CursorKind;
use crate::window::input::{keys, InputEvent, KeyKind, MouseButton, PointerKind};
use crate::window::SurfaceHost;

const TITLE_HEIGHT: u32 = 32;
const ROW_HEIGHT: u32 = 24;
const ROWS: usize = 40;
const POPUP_ROWS: usize = 6;

const BACKGROUND: u32 = 0xFF1E_1E1E;
const TITLE: u32 = 0xFF2D_2D30;
const BUTTON: u32 = 0xFF3C_3C3C;
const BUTTON_HOVER: u32 = 0xFF50_5050;
const ROW_EVEN: u32 = 0xFF25_2526;
const ROW_ODD: u32 = 0xFF2A_2A2B;
const ROW_HOVER: u32 = 0xFF33_3A45;
const SELECTED: u32 = 0xFF09_4771;
const FOCUS_RING: u32 = 0xFF00_7ACC;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Title,
    Button,
    Row(usize),
}

/// Selection handed back from the popup to its parent.
type Choice = Rc<Cell<Option<usize>>>;

pub struct DemoEngine {
    host: SurfaceHost,
    size: Size,
    selected: usize,
    hovered: Option<Region>,
    scroll: f32,
    focused: bool,
    choice: Choice,
    frame_time: Duration,
}

impl Default for DemoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoEngine {
    pub fn new() -> Self {
        Self {
            host: SurfaceHost::detached(),
            size: Size::default(),
            selected: 0,
            hovered: None,
            scroll: 0.0,
            focused: false,
            choice: Choice::default(),
            frame_time: Duration::ZERO,
        }
    }

    fn title_rect(&self) -> Rect {
        Rect::new(0, 0, self.size.width, TITLE_HEIGHT)
    }

    fn button_rect(&self) -> Rect {
        Rect::new(16, TITLE_HEIGHT as i32 + 16, 160, 28)
    }

    fn list_rect(&self) -> Rect {
        let top = TITLE_HEIGHT + 60;
        Rect::new(
            16,
            top as i32,
            self.size.width.saturating_sub(32),
            self.size.height.saturating_sub(top + 16),
        )
    }

    fn max_scroll(&self) -> f32 {
        let content = (ROWS as u32 * ROW_HEIGHT) as f32;
        (content - self.list_rect().size.height as f32).max(0.0)
    }

    fn row_rect(&self, row: usize) -> Rect {
        let list = self.list_rect();
        let y = list.origin.y + (row as u32 * ROW_HEIGHT) as i32 - self.scroll as i32;
        Rect::new(list.origin.x, y, list.size.width, ROW_HEIGHT)
    }

    fn region_at(&self, point: Point) -> Option<Region> {
        if self.title_rect().contains(point) {
            return Some(Region::Title);
        }
        if self.button_rect().contains(point) {
            return Some(Region::Button);
        }
        if !self.list_rect().contains(point) {
            return None;
        }
        (0..ROWS).find(|row| self.row_rect(*row).contains(point)).map(Region::Row)
    }

    fn region_rect(&self, region: Region) -> Rect {
        match region {
            Region::Title => self.title_rect(),
            Region::Button => self.button_rect(),
            Region::Row(row) => self.row_rect(row),
        }
    }

    fn set_hovered(&mut self, hovered: Option<Region>) {
        if self.hovered == hovered {
            return;
        }
        for region in [self.hovered, hovered].into_iter().flatten() {
            self.host.invalidate_rect(self.region_rect(region));
        }
        self.hovered = hovered;
        let cursor = match hovered {
            Some(Region::Button) | Some(Region::Row(_)) => CursorKind::Pointer,
            Some(Region::Title) => CursorKind::Move,
            None => CursorKind::Default,
        };
        self.host.set_cursor(cursor);
    }

    fn select(&mut self, row: usize) {
        let row = row.min(ROWS - 1);
        if row == self.selected {
            return;
        }
        self.host.invalidate_rect(self.row_rect(self.selected));
        self.selected = row;
        self.host.invalidate_rect(self.row_rect(row));
    }

    fn open_list(&mut self) {
        let button = self.button_rect();
        let rect = Rect::new(
            button.origin.x,
            button.bottom(),
            button.size.width,
            POPUP_ROWS as u32 * ROW_HEIGHT,
        );
        let popup = DemoPopupEngine::new(
            self.host.clone(),
            self.choice.clone(),
            self.selected % POPUP_ROWS,
        );
        if let Some(id) = self.host.open_popup(Box::new(popup), rect, true) {
            tracing::debug!("Opened list popup {}", id);
        }
    }
}

impl Engine for DemoEngine {
    fn attach(&mut self, host: SurfaceHost) {
        self.host = host;
    }

    fn detach(&mut self) {
        self.host = SurfaceHost::detached();
    }

    fn resize(&mut self, size: Size) {
        self.size = size;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn begin_frame(&mut self, timestamp: Duration) {
        self.frame_time = timestamp;
    }

    fn layout(&mut self) {
        if let Some(choice) = self.choice.take() {
            self.selected = choice;
        }
        self.scroll = self.scroll.clamp(0.0, self.max_scroll());
    }

    fn paint(&mut self, target: &mut PaintTarget<'_>) {
        if let Some(choice) = self.choice.take() {
            self.selected = choice;
        }
        let damage = target.damage();
        let list = self.list_rect();
        let title = self.title_rect();
        let button = self.button_rect();
        let rows: Vec<(Rect, u32)> = (0..ROWS)
            .map(|row| {
                let color = if row == self.selected {
                    SELECTED
                } else if self.hovered == Some(Region::Row(row)) {
                    ROW_HOVER
                } else if row % 2 == 0 {
                    ROW_EVEN
                } else {
                    ROW_ODD
                };
                (self.row_rect(row), color)
            })
            .collect();
        let button_color = if self.hovered == Some(Region::Button) {
            BUTTON_HOVER
        } else {
            BUTTON
        };

        let frame = target.frame();
        frame.fill_rect(damage, BACKGROUND);
        frame.fill_rect(title, TITLE);
        if self.focused {
            frame.fill_rect(Rect::new(0, TITLE_HEIGHT as i32 - 2, title.size.width, 2), FOCUS_RING);
        }
        frame.fill_rect(button, button_color);
        for (rect, color) in rows {
            if let Some(visible) = rect.intersection(&list) {
                frame.fill_rect(visible, color);
            }
        }
    }

    fn dispatch_input(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Pointer(pointer) => match pointer.kind {
                PointerKind::Move | PointerKind::Enter => {
                    self.set_hovered(self.region_at(pointer.position));
                    true
                }
                PointerKind::Leave => {
                    self.set_hovered(None);
                    true
                }
                PointerKind::Down if pointer.button == Some(MouseButton::Left) => {
                    match self.region_at(pointer.position) {
                        Some(Region::Button) => self.open_list(),
                        Some(Region::Row(row)) => self.select(row),
                        _ => return false,
                    }
                    true
                }
                _ => false,
            },
            InputEvent::Wheel(wheel) => {
                let scroll = (self.scroll - wheel.delta_y).clamp(0.0, self.max_scroll());
                if scroll != self.scroll {
                    self.scroll = scroll;
                    self.host.request_commit(true);
                }
                true
            }
            InputEvent::Key(key) if key.kind == KeyKind::RawKeyDown => match key.key_code {
                keys::UP => {
                    self.select(self.selected.saturating_sub(1));
                    true
                }
                keys::DOWN => {
                    self.select(self.selected + 1);
                    true
                }
                keys::ENTER => {
                    self.open_list();
                    true
                }
                keys::ESCAPE => {
                    self.host.close_popup();
                    true
                }
                _ => false,
            },
            InputEvent::Key(_) => false,
        }
    }

    fn set_focus(&mut self, focused: bool) {
        self.focused = focused;
        self.host.invalidate_rect(self.title_rect());
    }

    fn hit_test_draggable(&mut self, point: Point) -> bool {
        self.title_rect().contains(point)
    }

    fn notify_drag_ended(&mut self, point: Point, global: Point) {
        tracing::debug!("Window drag ended at {:?} ({:?} on screen)", point, global);
    }
}

/// The list shown by the select button.
pub struct DemoPopupEngine {
    host: SurfaceHost,
    parent: SurfaceHost,
    choice: Choice,
    size: Size,
    hovered: Option<usize>,
    current: usize,
}

impl DemoPopupEngine {
    fn new(parent: SurfaceHost, choice: Choice, current: usize) -> Self {
        Self {
            host: SurfaceHost::detached(),
            parent,
            choice,
            size: Size::default(),
            hovered: None,
            current,
        }
    }

    fn row_at(&self, point: Point) -> Option<usize> {
        if point.x < 0 || point.y < 0 || point.x as u32 >= self.size.width {
            return None;
        }
        let row = point.y as u32 / ROW_HEIGHT;
        (row < POPUP_ROWS as u32).then_some(row as usize)
    }

    fn commit(&mut self, row: usize) {
        self.choice.set(Some(row));
        self.parent.request_commit(true);
        self.host.request_close();
    }
}

impl Engine for DemoPopupEngine {
    fn attach(&mut self, host: SurfaceHost) {
        self.host = host;
    }

    fn detach(&mut self) {
        self.host = SurfaceHost::detached();
    }

    fn resize(&mut self, size: Size) {
        self.size = size;
    }

    fn begin_frame(&mut self, _timestamp: Duration) {}

    fn layout(&mut self) {}

    fn paint(&mut self, target: &mut PaintTarget<'_>) {
        let width = self.size.width;
        let frame = target.frame();
        frame.fill(BUTTON);
        for row in 0..POPUP_ROWS {
            let color = if Some(row) == self.hovered {
                ROW_HOVER
            } else if row == self.current {
                SELECTED
            } else {
                BUTTON
            };
            let top = (row as u32 * ROW_HEIGHT) as i32;
            frame.fill_rect(Rect::new(0, top, width, ROW_HEIGHT), color);
        }
    }

    fn dispatch_input(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Pointer(pointer) => match pointer.kind {
                PointerKind::Move | PointerKind::Enter => {
                    let hovered = self.row_at(pointer.position);
                    if hovered != self.hovered {
                        self.hovered = hovered;
                        self.host.request_commit(false);
                    }
                    true
                }
                PointerKind::Leave => {
                    self.hovered = None;
                    self.host.request_commit(false);
                    true
                }
                PointerKind::Up if pointer.button == Some(MouseButton::Left) => {
                    if let Some(row) = self.row_at(pointer.position) {
                        self.commit(row);
                    }
                    true
                }
                _ => false,
            },
            InputEvent::Key(key) if key.kind == KeyKind::RawKeyDown => match key.key_code {
                keys::UP => {
                    self.current = self.current.saturating_sub(1);
                    self.host.request_commit(false);
                    true
                }
                keys::DOWN => {
                    self.current = (self.current + 1).min(POPUP_ROWS - 1);
                    self.host.request_commit(false);
                    true
                }
                keys::ENTER => {
                    self.commit(self.current);
                    true
                }
                keys::ESCAPE => {
                    self.host.request_close();
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn set_focus(&mut self, _focused: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use crate::window::input::ButtonMask;

    #[test]
    fn test_button_opens_popup_and_choice_updates_selection() {
        let harness = Harness::new();
        let surface = harness.open_surface(Rect::new(0, 0, 400, 300), Box::new(DemoEngine::new()));
        harness.pump();

        let button = Point::new(20, TITLE_HEIGHT as i32 + 20);
        harness.press(surface.window(), MouseButton::Left, button);
        harness.release(surface.window(), MouseButton::Left, button);
        harness.pump();

        let popup = surface.popup().expect("popup opened");
        let child = popup.window().expect("popup window created");
        assert!(harness.platform.is_alive(child));

        let row = Point::new(10, ROW_HEIGHT as i32 * 2 + 5);
        harness.move_to(child, row, ButtonMask::NONE);
        harness.press(child, MouseButton::Left, row);
        harness.release(child, MouseButton::Left, row);
        harness.pump();

        assert!(!harness.platform.is_alive(child));
        assert!(surface.popup().is_none());
    }

    #[test]
    fn test_title_strip_is_draggable() {
        let mut engine = DemoEngine::new();
        engine.resize(Size::new(400, 300));
        assert!(engine.hit_test_draggable(Point::new(200, 10)));
        assert!(!engine.hit_test_draggable(Point::new(200, 200)));
    }
}
