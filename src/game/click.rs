//! Two-slot buffer of pending right-clicks

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A clicked map coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClickPoint {
    pub x: i32,
    pub y: i32,
}

impl ClickPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The player's two most recent right-clicks awaiting a move command.
///
/// Each slot has its own lock so the listener can write one slot while the
/// stats task reads the other. Readers always get a copy.
#[derive(Debug, Default)]
pub struct ClickBuffer {
    first: Mutex<Option<ClickPoint>>,
    second: Mutex<Option<ClickPoint>>,
}

impl ClickBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill `first` if it is empty, otherwise overwrite `second`
    pub fn set_first(&self, p: ClickPoint) {
        {
            let mut first = self.first.lock();
            if first.is_none() {
                *first = Some(p);
                return;
            }
        }
        self.set_second(p);
    }

    pub fn set_second(&self, p: ClickPoint) {
        *self.second.lock() = Some(p);
    }

    pub fn first(&self) -> Option<ClickPoint> {
        *self.first.lock()
    }

    pub fn second(&self) -> Option<ClickPoint> {
        *self.second.lock()
    }

    /// Copy of both slots
    pub fn pending(&self) -> (Option<ClickPoint>, Option<ClickPoint>) {
        (self.first(), self.second())
    }

    /// Empty both slots. Safe to call when already empty.
    pub fn clear(&self) {
        *self.first.lock() = None;
        *self.second.lock() = None;
    }
}
