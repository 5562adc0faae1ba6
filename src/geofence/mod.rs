// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Geofence Gate
//!
//! Captures the caller's position and decides whether it is close enough to
//! the configured work site to allow a clock-in or clock-out.
//!
//! Distances are great-circle distances computed with the haversine formula
//! on a spherical Earth of radius [`EARTH_RADIUS_KM`]. The range check is
//! inclusive: a position exactly `max_distance_km` away is accepted.

pub mod source;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ClockError;

pub use source::{PositionSource, ReportedPosition};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default work site latitude (Sydney Airport).
pub const DEFAULT_SITE_LATITUDE: f64 = -33.931672;

/// Default work site longitude (Sydney Airport).
pub const DEFAULT_SITE_LONGITUDE: f64 = 151.165399;

/// Default maximum distance from the site, in kilometers.
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 20.0;

/// A point on Earth in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Position {
    /// Latitude in decimal degrees, -90 to 90
    pub latitude: f64,
    /// Longitude in decimal degrees, -180 to 180
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a position, rejecting coordinates no location service would report.
    pub fn checked(latitude: f64, longitude: f64) -> Result<Self, ClockError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ClockError::LocationUnavailable(format!(
                "latitude {latitude} is out of range"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ClockError::LocationUnavailable(format!(
                "longitude {longitude} is out of range"
            )));
        }
        Ok(Self::new(latitude, longitude))
    }

    /// The string recorded on-chain for this position, e.g. `"-33.931672, 151.165399"`.
    pub fn location_encoding(&self) -> String {
        format!("{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// The fixed point the geofence is centered on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReferenceSite {
    pub position: Position,
    pub max_distance_km: f64,
}

impl Default for ReferenceSite {
    fn default() -> Self {
        Self {
            position: Position::new(DEFAULT_SITE_LATITUDE, DEFAULT_SITE_LONGITUDE),
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
        }
    }
}

impl ReferenceSite {
    pub fn new(position: Position, max_distance_km: f64) -> Self {
        Self {
            position,
            max_distance_km,
        }
    }

    /// Compare a position against this site.
    pub fn evaluate(&self, position: &Position) -> GeofenceResult {
        let distance_km = distance_km(position, &self.position);
        GeofenceResult {
            within_range: distance_km <= self.max_distance_km,
            distance_km,
        }
    }
}

/// Outcome of a geofence check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeofenceResult {
    /// Whether the position is inside the allowed radius (inclusive)
    pub within_range: bool,
    /// Great-circle distance to the site in kilometers
    pub distance_km: f64,
}

/// Great-circle distance between two positions in kilometers.
pub fn distance_km(a: &Position, b: &Position) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push h marginally above 1 for antipodal points.
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}
