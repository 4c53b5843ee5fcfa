//! Bus stop finder.
//!
//! Finds bus stations near a typed address or the device's position and
//! follows live arrival predictions for the chosen station. The backend
//! does the geocoding and arrival lookups; this crate coordinates the
//! asynchronous pieces of a search session so that stale results never
//! reach the user.

pub mod api;
pub mod autocomplete;
pub mod config;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod feed;
pub mod generation;
pub mod location;
pub mod navigation;
pub mod session;
pub mod task;
