use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const GEOMETRY_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Position and size of the target display, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl SurfaceBounds {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub const fn sized(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn min_dimension(&self) -> i32 {
        self.width.min(self.height)
    }
}

/// Answers "where is the primary display right now". `None` means no
/// primary display could be resolved.
pub trait DisplaySource {
    fn primary_bounds(&self) -> Option<SurfaceBounds>;
}

/// A display that never changes, for headless rendering.
pub struct FixedDisplay(pub SurfaceBounds);

impl DisplaySource for FixedDisplay {
    fn primary_bounds(&self) -> Option<SurfaceBounds> {
        Some(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryChange {
    NotDue,
    Unchanged,
    Changed(SurfaceBounds),
    Unavailable,
}

impl GeometryChange {
    pub fn changed(&self) -> Option<SurfaceBounds> {
        match self {
            GeometryChange::Changed(bounds) => Some(*bounds),
            _ => None,
        }
    }
}

pub struct GeometryTracker {
    interval: Duration,
    bounds: Option<SurfaceBounds>,
    last_poll: Option<Instant>,
}

impl GeometryTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            bounds: None,
            last_poll: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Last known bounds, if any poll has ever succeeded.
    pub fn bounds(&self) -> Option<SurfaceBounds> {
        self.bounds
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_poll {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    pub fn time_until_next_poll(&self, now: Instant) -> Duration {
        match self.last_poll {
            Some(last) => self.interval.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    pub fn poll_if_due(&mut self, source: &dyn DisplaySource, now: Instant) -> GeometryChange {
        if !self.is_due(now) {
            return GeometryChange::NotDue;
        }
        self.last_poll = Some(now);
        self.poll(source)
    }

    pub fn poll(&mut self, source: &dyn DisplaySource) -> GeometryChange {
        let Some(current) = source.primary_bounds() else {
            warn!("No primary screen found");
            return GeometryChange::Unavailable;
        };

        if self.bounds == Some(current) {
            return GeometryChange::Unchanged;
        }

        self.bounds = Some(current);
        debug!(
            "Screen geometry updated: {}x{} at ({}, {})",
            current.width, current.height, current.x, current.y
        );
        GeometryChange::Changed(current)
    }
}

impl Default for GeometryTracker {
    fn default() -> Self {
        Self::new(GEOMETRY_POLL_INTERVAL)
    }
}
