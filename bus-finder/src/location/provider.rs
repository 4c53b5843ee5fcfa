//! Positioning capabilities injected into the acquisition state machine.

use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};

use crate::domain::Coordinate;
use crate::error::PositionErrorCode;

/// Named bundle of positioning options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccuracyTier {
    High,
    Relaxed,
}

/// Options passed to a single positioning request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Oldest cached fix the provider may answer with.
    pub max_cache_age: Duration,
}

impl PositionOptions {
    /// Precise fix: 10 s timeout, cached fixes up to 5 minutes old.
    pub const HIGH: Self = Self {
        high_accuracy: true,
        timeout: Duration::from_secs(10),
        max_cache_age: Duration::from_secs(5 * 60),
    };

    /// Coarse fix: 20 s timeout, cached fixes up to 10 minutes old.
    pub const RELAXED: Self = Self {
        high_accuracy: false,
        timeout: Duration::from_secs(20),
        max_cache_age: Duration::from_secs(10 * 60),
    };
}

/// A position fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub coordinate: Coordinate,
    /// Accuracy radius in meters.
    pub accuracy_meters: f64,
}

/// Permission state for positioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
    Unknown,
}

/// Device positioning.
pub trait LocationProvider: Send + Sync {
    /// Request one position fix.
    fn request_position(
        &self,
        options: PositionOptions,
    ) -> BoxFuture<'_, Result<Position, PositionErrorCode>>;
}

/// Permission lookup, where the platform offers one.
pub trait PermissionQuery: Send + Sync {
    /// Current permission state, or `None` if the lookup itself failed.
    fn query(&self) -> BoxFuture<'_, Option<PermissionState>>;
}

/// Provider answering every request with the same fix.
///
/// Used where there is no positioning hardware and the position is known
/// up front (command-line coordinates, fixed installations).
#[derive(Debug, Clone)]
pub struct FixedLocationProvider {
    position: Option<Position>,
}

impl FixedLocationProvider {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            position: Some(Position {
                coordinate,
                accuracy_meters: 0.0,
            }),
        }
    }

    /// Provider on a device without positioning.
    pub fn unsupported() -> Self {
        Self { position: None }
    }
}

impl LocationProvider for FixedLocationProvider {
    fn request_position(
        &self,
        _options: PositionOptions,
    ) -> BoxFuture<'_, Result<Position, PositionErrorCode>> {
        future::ready(self.position.ok_or(PositionErrorCode::Unsupported)).boxed()
    }
}

impl PermissionQuery for FixedLocationProvider {
    fn query(&self) -> BoxFuture<'_, Option<PermissionState>> {
        future::ready(Some(PermissionState::Granted)).boxed()
    }
}
