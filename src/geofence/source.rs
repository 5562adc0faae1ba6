// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Position sources.
//!
//! A [`PositionSource`] answers a single one-shot position request. The
//! service ships with [`ReportedPosition`], which wraps the reading a browser
//! obtained from its geolocation API (or the error it got instead).

use std::future::Future;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Position;
use crate::error::ClockError;

/// A one-shot provider of the current position.
///
/// Implementations must not retry: a failed request is reported as
/// [`ClockError::LocationUnavailable`] and the caller decides whether to ask again.
pub trait PositionSource {
    fn current_position(&self) -> impl Future<Output = Result<Position, ClockError>> + Send;
}

/// A geolocation reading as reported by the client.
///
/// Either both coordinates are present, or `error` explains why the platform
/// could not produce them (permission denied, no hardware, timeout).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReportedPosition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Error message from the platform location service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportedPosition {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            latitude: None,
            longitude: None,
            error: Some(reason.into()),
        }
    }
}

impl PositionSource for ReportedPosition {
    async fn current_position(&self) -> Result<Position, ClockError> {
        if let Some(reason) = &self.error {
            return Err(ClockError::LocationUnavailable(reason.clone()));
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Position::checked(lat, lon),
            _ => Err(ClockError::LocationUnavailable(
                "no coordinates were reported".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reported_coordinates_become_position() {
        let pos = ReportedPosition::at(-33.93, 151.16)
            .current_position()
            .await
            .unwrap();
        assert_eq!(pos, Position::new(-33.93, 151.16));
    }

    #[tokio::test]
    async fn platform_error_is_location_unavailable() {
        let err = ReportedPosition::failed("User denied Geolocation")
            .current_position()
            .await
            .unwrap_err();
        assert!(matches!(err, ClockError::LocationUnavailable(msg) if msg.contains("denied")));
    }

    #[tokio::test]
    async fn missing_coordinate_is_location_unavailable() {
        let reading = ReportedPosition {
            latitude: Some(1.0),
            ..Default::default()
        };
        assert!(matches!(
            reading.current_position().await,
            Err(ClockError::LocationUnavailable(_))
        ));
    }

    #[test]
    fn deserializes_browser_payload() {
        let reading: ReportedPosition =
            serde_json::from_str(r#"{"latitude": -33.9, "longitude": 151.1}"#).unwrap();
        assert_eq!(reading.latitude, Some(-33.9));
        assert!(reading.error.is_none());
    }
}
