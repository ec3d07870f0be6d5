//! Geographic coordinates of a shop.

use serde::{Deserialize, Serialize};

/// Errors produced when validating coordinates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("latitude must be between -90 and 90 (got {0})")]
    Latitude(f64),
    #[error("longitude must be between -180 and 180 (got {0})")]
    Longitude(f64),
}

/// A WGS84 latitude/longitude pair.
///
/// Serialized flat (`latitude`, `longitude`) so it can be `#[serde(flatten)]`ed
/// into the shop record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Build a location, rejecting out-of-range or non-finite values.
    ///
    /// # Errors
    ///
    /// Returns `LocationError` naming the offending coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        Ok(Self {
            latitude: Self::check_latitude(latitude)?,
            longitude: Self::check_longitude(longitude)?,
        })
    }

    /// Check a latitude on its own.
    ///
    /// # Errors
    ///
    /// Returns `LocationError::Latitude` if it is outside `-90..=90` or not finite.
    pub fn check_latitude(latitude: f64) -> Result<f64, LocationError> {
        if latitude.is_finite() && (-90.0..=90.0).contains(&latitude) {
            Ok(latitude)
        } else {
            Err(LocationError::Latitude(latitude))
        }
    }

    /// Check a longitude on its own.
    ///
    /// # Errors
    ///
    /// Returns `LocationError::Longitude` if it is outside `-180..=180` or not finite.
    pub fn check_longitude(longitude: f64) -> Result<f64, LocationError> {
        if longitude.is_finite() && (-180.0..=180.0).contains(&longitude) {
            Ok(longitude)
        } else {
            Err(LocationError::Longitude(longitude))
        }
    }
}
