//! # Orgdir
//!
//! Organization directory with activity hierarchy filtering and geospatial
//! search, backed by SQLite.
//!
//! The directory holds three related entities:
//! - **Buildings** with an address and a coordinate pair
//! - **Activities** forming a category tree through an optional parent
//! - **Organizations** housed in exactly one building, tagged with any
//!   number of activities, reachable by any number of phone numbers
//!
//! Organization listings compose optional predicates (building, name
//! substring, activity category with descendant expansion, geographic
//! bounds) into a single query. Radius search prefilters with a bounding
//! box and finishes with an exact haversine check.
//!
//! ## Quick Start
//!
//! ```rust
//! use orgdir::{BuildingCreate, DirectoryStore, OrganizationCreate, OrganizationFilter};
//!
//! let mut store = DirectoryStore::in_memory().unwrap();
//!
//! let building = store
//!     .create_building(&BuildingCreate {
//!         address: "1 Main St".into(),
//!         latitude: 55.7558,
//!         longitude: 37.6173,
//!     })
//!     .unwrap();
//!
//! store
//!     .create_organization(&OrganizationCreate {
//!         name: "Corner Bakery".into(),
//!         building_id: building.id,
//!         phones: vec!["8495123456".into()],
//!         activity_ids: vec![],
//!     })
//!     .unwrap();
//!
//! let filter = OrganizationFilter {
//!     name: Some("bakery".into()),
//!     ..Default::default()
//! };
//! let found = store.list_organizations(&filter).unwrap();
//! assert_eq!(found.len(), 1);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{DirectoryError, Result};

// Geographic utilities (haversine distance, radius bounding boxes)
pub mod geo_utils;

// Activity category tree expansion
pub mod hierarchy;
pub use hierarchy::ActivityTree;

// Query filter composition
pub mod filter;
pub use filter::OrganizationFilter;

// SQLite storage
pub mod store;
pub use store::DirectoryStore;

// Axum HTTP surface
pub mod http;

// Environment-driven settings
pub mod config;
pub use config::Settings;

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that the coordinates are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Inclusive geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Bounds {
    /// Check that min does not exceed max on either axis. A degenerate box
    /// (min == max) is valid and matches only exact coordinates.
    pub fn is_valid(&self) -> bool {
        self.min_lat <= self.max_lat && self.min_lon <= self.max_lon
    }

    /// True when `point` falls inside the box, borders included.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lon
            && point.longitude <= self.max_lon
    }
}

/// A building that houses organizations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: i64,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Building {
    /// Coordinate pair of the building.
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// An activity category. Categories form a tree through `parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

/// An organization with its building, phones, and activity tags embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub building: Building,
    pub phones: Vec<String>,
    pub activities: Vec<Activity>,
}

// ============================================================================
// Create Payloads
// ============================================================================

/// Payload for creating a building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingCreate {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Payload for creating an activity category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityCreate {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Payload for creating an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationCreate {
    pub name: String,
    pub building_id: i64,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub activity_ids: Vec<i64>,
}

/// Validate a directory phone number: 10 or 11 ASCII digits, nothing else.
pub fn validate_phone(phone: &str) -> Result<()> {
    let digits_only = !phone.is_empty() && phone.bytes().all(|b| b.is_ascii_digit());
    if !digits_only || phone.len() < 10 || phone.len() > 11 {
        return Err(DirectoryError::InvalidPhone {
            phone: phone.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
