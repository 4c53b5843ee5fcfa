//! Device positioning.
//!
//! The platform's positioning and permission lookups are injected as
//! [`LocationProvider`] and [`PermissionQuery`] so the acquisition state
//! machine can be driven by fakes in tests.

mod acquisition;
mod messages;
mod provider;

pub use acquisition::{
    AcquisitionOutcome, GeolocationAcquisition, GeolocationPhase, GeolocationStatus,
};
pub use messages::{Guidance, Platform, failure_message, guidance};
pub use provider::{
    AccuracyTier, FixedLocationProvider, LocationProvider, PermissionQuery, PermissionState,
    Position, PositionOptions,
};
