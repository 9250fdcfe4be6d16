//! Click counting
//!
//! A press is a repeat click when it follows the previous press both soon
//! enough and close enough. Either condition alone is not sufficient.

use std::time::Duration;

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickCounter {
    /// Both must be strictly below these thresholds.
    pub interval: Duration,
    pub distance: i32,
    last_down: Option<(Duration, Point)>,
}

impl ClickCounter {
    pub fn new(interval: Duration, distance: i32) -> Self {
        Self {
            interval,
            distance,
            last_down: None,
        }
    }

    /// Record a press and return its click count (1 or 2).
    ///
    /// The count saturates at 2: a third fast press still reports 2.
    pub fn press(&mut self, timestamp: Duration, position: Point) -> u8 {
        let count = match self.last_down {
            Some((last_time, last_position))
                if timestamp.saturating_sub(last_time) < self.interval
                    && position.manhattan_distance(last_position) < self.distance =>
            {
                2
            }
            _ => 1,
        };
        self.last_down = Some((timestamp, position));
        count
    }

    pub fn last_down(&self) -> Option<(Duration, Point)> {
        self.last_down
    }

    pub fn reset(&mut self) {
        self.last_down = None;
    }
}
