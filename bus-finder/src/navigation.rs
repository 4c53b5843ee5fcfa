//! The three-step search flow.
//!
//! ```text
//! Searching ⇄ StationSelection ⇄ ArrivalsView
//! ```
//!
//! `SearchSession` is a plain value. Going back clears everything owned by
//! the later steps, and entering station selection always drops the
//! previously selected station.

use tracing::debug;

use crate::domain::{Address, Coordinate, InvalidCoordinate, Station, StationKey};

/// Where the user is in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Step {
    #[default]
    Searching,
    StationSelection,
    ArrivalsView,
}

/// Where the current coordinate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResolutionMethod {
    #[default]
    None,
    Address,
    Device,
}

/// A rejected transition. The session is unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NavigationError {
    /// Stations can only be picked from the station list
    #[error("cannot select a station during {0:?}")]
    WrongStep(Step),

    /// No address or device position has been resolved
    #[error("no location has been resolved")]
    NoCoordinate,

    /// The station is not among the discovered ones
    #[error("station {0} is not in the current list")]
    UnknownStation(StationKey),

    /// The chosen address carries unusable coordinates
    #[error("address has no usable location: {0}")]
    InvalidAddress(#[from] InvalidCoordinate),
}

/// Session-level choices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSession {
    step: Step,
    method: ResolutionMethod,
    selected_address: Option<Address>,
    device_coordinate: Option<Coordinate>,
    selected_station: Option<Station>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn resolution_method(&self) -> ResolutionMethod {
        self.method
    }

    pub fn selected_address(&self) -> Option<&Address> {
        self.selected_address.as_ref()
    }

    pub fn device_coordinate(&self) -> Option<Coordinate> {
        self.device_coordinate
    }

    pub fn selected_station(&self) -> Option<&Station> {
        self.selected_station.as_ref()
    }

    /// The coordinate stations are searched around.
    ///
    /// Derived from the selected address when there is one, otherwise the
    /// device position.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match &self.selected_address {
            Some(address) => address.coordinate().ok(),
            None => self.device_coordinate,
        }
    }

    /// Resolve the location from a committed address.
    ///
    /// An address whose coordinates do not parse is rejected.
    pub fn select_address(&mut self, address: Address) -> Result<(), NavigationError> {
        address.coordinate()?;

        debug!(address = %address.display_name, "location resolved from address");
        self.method = ResolutionMethod::Address;
        self.selected_address = Some(address);
        self.device_coordinate = None;
        self.enter_station_selection();
        Ok(())
    }

    /// Resolve the location from the device.
    pub fn location_resolved(&mut self, coordinate: Coordinate) {
        debug!(%coordinate, "location resolved from device");
        self.method = ResolutionMethod::Device;
        self.device_coordinate = Some(coordinate);
        self.selected_address = None;
        self.enter_station_selection();
    }

    /// Pick a station from the list.
    pub fn select_station(&mut self, station: Station) -> Result<(), NavigationError> {
        if self.step != Step::StationSelection {
            return Err(NavigationError::WrongStep(self.step));
        }
        if self.coordinate().is_none() {
            return Err(NavigationError::NoCoordinate);
        }

        debug!(station = %station.key, name = %station.name, "station selected");
        self.selected_station = Some(station);
        self.step = Step::ArrivalsView;
        Ok(())
    }

    /// Step back, clearing what the current step owns. Returns the new step.
    pub fn go_back(&mut self) -> Step {
        match self.step {
            Step::ArrivalsView => {
                self.selected_station = None;
                self.step = Step::StationSelection;
            }
            Step::StationSelection => {
                self.selected_station = None;
                self.selected_address = None;
                self.device_coordinate = None;
                self.method = ResolutionMethod::None;
                self.step = Step::Searching;
            }
            Step::Searching => {}
        }
        debug!(step = ?self.step, "navigated back");
        self.step
    }

    fn enter_station_selection(&mut self) {
        self.selected_station = None;
        self.step = Step::StationSelection;
    }
}
