//! Geolocation acquisition state machine.
//!
//! ```text
//! Idle → PermissionCheck → Acquiring(High) → Found
//!                        ↘ Denied           ↘ Acquiring(Relaxed) → Found | Failed
//!                                           ↘ Denied | Failed
//! ```
//!
//! A high-accuracy attempt that fails with `Timeout` or
//! `PositionUnavailable` is retried exactly once with relaxed options.
//! Every other failure, and any relaxed-tier failure, is terminal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::domain::Coordinate;
use crate::error::{GeolocationError, PositionErrorCode};
use crate::generation::{Generation, GenerationGate};

use super::messages::{Guidance, Platform, failure_message, guidance};
use super::provider::{
    AccuracyTier, LocationProvider, PermissionQuery, PermissionState, Position, PositionOptions,
};

/// Where the current request lifecycle stands.
#[derive(Debug, Clone, PartialEq)]
pub enum GeolocationPhase {
    Idle,
    PermissionCheck,
    Acquiring(AccuracyTier),
    Found(Position),
    Denied(GeolocationError),
    Failed(GeolocationError),
}

impl GeolocationPhase {
    /// Whether a request is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            GeolocationPhase::PermissionCheck | GeolocationPhase::Acquiring(_)
        )
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            GeolocationPhase::Found(p) => Some(p),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&GeolocationError> {
        match self {
            GeolocationPhase::Denied(e) | GeolocationPhase::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Snapshot published to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct GeolocationStatus {
    pub phase: GeolocationPhase,
    /// Last permission state seen, if a request has queried it.
    pub permission: Option<PermissionState>,
}

/// How one call to [`GeolocationAcquisition::request_location`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionOutcome {
    Found(Position),
    Denied(GeolocationError),
    Failed(GeolocationError),
    /// A newer request, or `clear`, took over before this one finished.
    Superseded,
}

/// State scoped to one request lifecycle.
#[derive(Debug, Default)]
struct Lifecycle {
    gate: GenerationGate,
    /// Set once the fix of this lifecycle has been handed downstream.
    delivered: bool,
}

/// Retrying wrapper around a [`LocationProvider`].
pub struct GeolocationAcquisition {
    provider: Arc<dyn LocationProvider>,
    permissions: Option<Arc<dyn PermissionQuery>>,
    platform: Platform,
    high: PositionOptions,
    relaxed: PositionOptions,
    retry_delay: Duration,
    lifecycle: Mutex<Lifecycle>,
    status: watch::Sender<GeolocationStatus>,
}

impl GeolocationAcquisition {
    /// Create an acquisition over `provider`.
    ///
    /// `permissions` is optional: without it every request proceeds as if
    /// the permission state were unknown.
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        permissions: Option<Arc<dyn PermissionQuery>>,
        platform: Platform,
        config: &SessionConfig,
    ) -> Self {
        let (status, _) = watch::channel(GeolocationStatus {
            phase: GeolocationPhase::Idle,
            permission: None,
        });

        Self {
            provider,
            permissions,
            platform,
            high: config.high_accuracy,
            relaxed: config.relaxed_accuracy,
            retry_delay: config.retry_delay,
            lifecycle: Mutex::new(Lifecycle::default()),
            status,
        }
    }

    pub fn status(&self) -> GeolocationStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GeolocationStatus> {
        self.status.subscribe()
    }

    /// Permission state seen by the most recent request.
    pub fn permission(&self) -> Option<PermissionState> {
        self.status.borrow().permission
    }

    /// Help text for enabling location on this platform.
    pub fn guidance(&self) -> Guidance {
        guidance(self.platform, self.permission())
    }

    /// Run one request lifecycle to completion.
    ///
    /// Starting a request supersedes any request still in flight.
    pub async fn request_location(&self) -> AcquisitionOutcome {
        let generation = {
            let mut life = self.lifecycle.lock().await;
            life.gate.invalidate();
            life.delivered = false;
            let generation = life.gate.issue();
            self.status
                .send_modify(|s| s.phase = GeolocationPhase::PermissionCheck);
            generation
        };
        debug!(generation = generation.get(), "location requested");

        let permission = match &self.permissions {
            Some(query) => query.query().await.unwrap_or(PermissionState::Unknown),
            None => PermissionState::Unknown,
        };
        if !self
            .update(generation, |s| s.permission = Some(permission))
            .await
        {
            return AcquisitionOutcome::Superseded;
        }

        if permission == PermissionState::Denied {
            return self
                .fail(generation, PositionErrorCode::PermissionDenied, false)
                .await;
        }

        if !self
            .update(generation, |s| {
                s.phase = GeolocationPhase::Acquiring(AccuracyTier::High)
            })
            .await
        {
            return AcquisitionOutcome::Superseded;
        }

        let code = match self.attempt(self.high).await {
            Ok(position) => return self.found(generation, position).await,
            Err(code) => code,
        };

        if !code.is_retryable() {
            return self.fail(generation, code, false).await;
        }

        debug!(%code, "high-accuracy fix failed, retrying with relaxed accuracy");
        tokio::time::sleep(self.retry_delay).await;

        if !self
            .update(generation, |s| {
                s.phase = GeolocationPhase::Acquiring(AccuracyTier::Relaxed)
            })
            .await
        {
            return AcquisitionOutcome::Superseded;
        }

        match self.attempt(self.relaxed).await {
            Ok(position) => self.found(generation, position).await,
            Err(code) => self.fail(generation, code, true).await,
        }
    }

    /// Hand the current lifecycle's fix downstream, at most once.
    ///
    /// Returns `None` if there is no fix yet or it was already taken.
    pub async fn take_delivery(&self) -> Option<Coordinate> {
        let mut life = self.lifecycle.lock().await;
        if life.delivered {
            return None;
        }

        let coordinate = self.status.borrow().phase.position().map(|p| p.coordinate)?;
        life.delivered = true;
        Some(coordinate)
    }

    /// Forget the current fix or error and abandon any request in flight.
    pub async fn clear(&self) {
        let mut life = self.lifecycle.lock().await;
        life.gate.invalidate();
        life.delivered = false;
        self.status.send_modify(|s| s.phase = GeolocationPhase::Idle);
    }

    async fn attempt(&self, options: PositionOptions) -> Result<Position, PositionErrorCode> {
        match tokio::time::timeout(options.timeout, self.provider.request_position(options)).await
        {
            Ok(result) => result,
            Err(_) => Err(PositionErrorCode::Timeout),
        }
    }

    /// Apply `f` to the published status if `generation` is still current.
    async fn update<F>(&self, generation: Generation, f: F) -> bool
    where
        F: FnOnce(&mut GeolocationStatus),
    {
        let life = self.lifecycle.lock().await;
        if !life.gate.is_current(generation) {
            return false;
        }
        self.status.send_modify(f);
        true
    }

    async fn found(&self, generation: Generation, position: Position) -> AcquisitionOutcome {
        let mut life = self.lifecycle.lock().await;
        if !life.gate.accept(generation) {
            return AcquisitionOutcome::Superseded;
        }

        info!(
            coordinate = %position.coordinate,
            accuracy = position.accuracy_meters,
            "location found"
        );
        self.status
            .send_modify(|s| s.phase = GeolocationPhase::Found(position));
        AcquisitionOutcome::Found(position)
    }

    async fn fail(
        &self,
        generation: Generation,
        code: PositionErrorCode,
        is_retry: bool,
    ) -> AcquisitionOutcome {
        let mut life = self.lifecycle.lock().await;
        if !life.gate.accept(generation) {
            return AcquisitionOutcome::Superseded;
        }

        warn!(%code, is_retry, "location request failed");
        let error = GeolocationError {
            code,
            message: failure_message(code, self.platform, is_retry),
        };

        if code == PositionErrorCode::PermissionDenied {
            self.status
                .send_modify(|s| s.phase = GeolocationPhase::Denied(error.clone()));
            AcquisitionOutcome::Denied(error)
        } else {
            self.status
                .send_modify(|s| s.phase = GeolocationPhase::Failed(error.clone()));
            AcquisitionOutcome::Failed(error)
        }
    }
}
