//! Remediation text for positioning failures.
//!
//! The platform is an input here so the acquisition state machine never
//! branches on it.

use crate::error::PositionErrorCode;

use super::provider::PermissionState;

/// Client platform, as far as location settings are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    Ios,
    Android,
    #[default]
    Other,
}

impl Platform {
    /// Detect the platform from a user-agent string.
    pub fn from_user_agent(user_agent: &str) -> Self {
        if ["iPad", "iPhone", "iPod"]
            .iter()
            .any(|device| user_agent.contains(device))
        {
            Platform::Ios
        } else if user_agent.contains("Android") {
            Platform::Android
        } else {
            Platform::Other
        }
    }
}

/// Human-readable message for a positioning failure.
///
/// `is_retry` is true when the failure came from the relaxed-accuracy
/// attempt, i.e. there is nothing left to try automatically.
pub fn failure_message(code: PositionErrorCode, platform: Platform, is_retry: bool) -> String {
    match code {
        PositionErrorCode::PermissionDenied => match platform {
            Platform::Ios => "Location access is blocked.\n\n\
                 To allow location:\n\
                 1. Settings → Privacy → Location Services\n\
                 2. Make sure Location Services is on\n\
                 3. Scroll down to Safari → choose \"While Using the App\""
                .to_string(),
            Platform::Android => "Location access is blocked.\n\n\
                 To allow location:\n\
                 1. Chrome → menu (3 dots) → Settings\n\
                 2. Site settings → Location\n\
                 3. Find this site and choose \"Allow\""
                .to_string(),
            Platform::Other => {
                "Location access is blocked. Allow location in your browser settings and try again."
                    .to_string()
            }
        },
        PositionErrorCode::PositionUnavailable if is_retry => {
            "Unable to determine your location. Make sure GPS is on, or enter an address instead."
                .to_string()
        }
        PositionErrorCode::PositionUnavailable => {
            "Location information is currently unavailable.".to_string()
        }
        PositionErrorCode::Timeout if is_retry => {
            "Locating you timed out. Try again or enter an address instead.".to_string()
        }
        PositionErrorCode::Timeout => "Locating you is taking longer than expected...".to_string(),
        PositionErrorCode::Unsupported => {
            "This device does not support location services.".to_string()
        }
    }
}

/// Step-by-step help for enabling location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guidance {
    pub title: &'static str,
    pub steps: Vec<&'static str>,
    /// Settings changes only take effect after a reload.
    pub reload_required: bool,
}

/// Help text for the given platform and permission state.
///
/// Platform-specific steps are only shown once permission has been denied;
/// otherwise the generic "accept the prompt" steps apply.
pub fn guidance(platform: Platform, permission: Option<PermissionState>) -> Guidance {
    if permission == Some(PermissionState::Denied) {
        match platform {
            Platform::Ios => {
                return Guidance {
                    title: "Allow location on iOS",
                    steps: vec![
                        "Open the device Settings",
                        "Privacy & Security → Location Services",
                        "Make sure the service is on",
                        "Scroll down to Safari",
                        "Choose \"While Using the App\"",
                        "Reload the page and try again",
                    ],
                    reload_required: true,
                };
            }
            Platform::Android => {
                return Guidance {
                    title: "Allow location on Android",
                    steps: vec![
                        "Open Chrome → menu (⋮)",
                        "Settings → Site settings",
                        "Location",
                        "Find this site and choose \"Allow\"",
                        "Reload the page and try again",
                    ],
                    reload_required: true,
                };
            }
            Platform::Other => {}
        }
    }

    Guidance {
        title: "How do I allow location?",
        steps: vec![
            "The browser will ask for location permission",
            "Click \"Allow\"",
            "If no prompt appears, check the location icon in the address bar",
            "On a phone, make sure location services are turned on",
        ],
        reload_required: permission == Some(PermissionState::Denied),
    }
}
