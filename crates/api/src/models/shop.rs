//! Shop domain types and request bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldops_core::{Location, ShopId, ShopStatus};

use super::{ValidationError, required_text};

/// A shop on the visit map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub contact: String,
    pub address: String,
    #[serde(flatten)]
    pub location: Location,
    pub status: ShopStatus,
    pub remarks: String,
    /// Set once any plan references this shop. Never cleared automatically.
    pub is_assigned: bool,
    pub last_visited: Option<DateTime<Utc>>,
    pub visit_remarks: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated shop about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShop {
    pub name: String,
    pub contact: String,
    pub address: String,
    pub location: Location,
    pub status: ShopStatus,
    pub remarks: String,
}

/// Body of `POST /shops`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShopRequest {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: Option<ShopStatus>,
    pub remarks: Option<String>,
}

impl CreateShopRequest {
    /// Check required fields and coordinates.
    ///
    /// A coordinate of `0` is a real position and is accepted.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingFields` if any of name, contact,
    /// address, latitude or longitude is absent or blank, and
    /// `ValidationError::Location` if the coordinates are out of range.
    pub fn validate(self) -> Result<NewShop, ValidationError> {
        let (Some(name), Some(contact), Some(address), Some(latitude), Some(longitude)) = (
            required_text(self.name),
            required_text(self.contact),
            required_text(self.address),
            self.latitude,
            self.longitude,
        ) else {
            return Err(ValidationError::MissingFields(
                "Please enter all required fields",
            ));
        };

        Ok(NewShop {
            name,
            contact,
            address,
            location: Location::new(latitude, longitude)?,
            status: self.status.unwrap_or_default(),
            remarks: self.remarks.unwrap_or_default(),
        })
    }
}

/// Body of `PUT /shops/{id}`. Absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShopRequest {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: Option<ShopStatus>,
    pub remarks: Option<String>,
    pub is_assigned: Option<bool>,
}

impl UpdateShopRequest {
    /// Check the supplied fields and keep only those.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Blank` if name, contact or address is
    /// supplied but blank, and `ValidationError::Location` if a supplied
    /// coordinate is out of range.
    pub fn validate(self) -> Result<ShopChanges, ValidationError> {
        Ok(ShopChanges {
            name: non_blank(self.name, "name")?,
            contact: non_blank(self.contact, "contact")?,
            address: non_blank(self.address, "address")?,
            latitude: self.latitude.map(Location::check_latitude).transpose()?,
            longitude: self.longitude.map(Location::check_longitude).transpose()?,
            status: self.status,
            remarks: self.remarks,
            is_assigned: self.is_assigned,
        })
    }
}

/// A validated general update. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShopChanges {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: Option<ShopStatus>,
    pub remarks: Option<String>,
    pub is_assigned: Option<bool>,
}

impl ShopChanges {
    /// Write the supplied fields into `shop`.
    pub fn apply_to(&self, shop: &mut Shop) {
        if let Some(name) = &self.name {
            shop.name.clone_from(name);
        }
        if let Some(contact) = &self.contact {
            shop.contact.clone_from(contact);
        }
        if let Some(address) = &self.address {
            shop.address.clone_from(address);
        }
        if let Some(latitude) = self.latitude {
            shop.location.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            shop.location.longitude = longitude;
        }
        if let Some(status) = self.status {
            shop.status = status;
        }
        if let Some(remarks) = &self.remarks {
            shop.remarks.clone_from(remarks);
        }
        if let Some(is_assigned) = self.is_assigned {
            shop.is_assigned = is_assigned;
        }
    }
}

/// Body of `PUT /shops/{id}/visit`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRequest {
    pub status: Option<ShopStatus>,
    pub visit_remarks: Option<String>,
}

impl VisitRequest {
    /// The visit made at `now`.
    #[must_use]
    pub fn at(self, now: DateTime<Utc>) -> ShopVisit {
        ShopVisit {
            status: self.status,
            visit_remarks: self.visit_remarks,
            visited_at: now,
        }
    }
}

/// A visit to record. Touches only status, visit remarks and `last_visited`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopVisit {
    pub status: Option<ShopStatus>,
    /// Overwrites the stored remarks whenever present, even with `""`.
    pub visit_remarks: Option<String>,
    pub visited_at: DateTime<Utc>,
}

impl ShopVisit {
    /// Write the visit into `shop`.
    pub fn apply_to(&self, shop: &mut Shop) {
        if let Some(status) = self.status {
            shop.status = status;
        }
        if let Some(remarks) = &self.visit_remarks {
            shop.visit_remarks.clone_from(remarks);
        }
        shop.last_visited = Some(self.visited_at);
    }
}

fn non_blank(value: Option<String>, field: &'static str) -> Result<Option<String>, ValidationError> {
    match value {
        None => Ok(None),
        Some(v) => required_text(Some(v))
            .map(Some)
            .ok_or(ValidationError::Blank(field)),
    }
}
