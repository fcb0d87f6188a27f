//! SQLite-backed directory store.
//!
//! One [`DirectoryStore`] owns one connection. Writes validate references
//! up front and run inside a transaction; reads assemble organizations with
//! their building, phones, and activity tags embedded. Listing queries are
//! composed by [`OrganizationFilter`](crate::OrganizationFilter) and the
//! radius search narrows candidates with an indexed bounding box before the
//! exact distance check.

use std::collections::BTreeSet;

use log::{debug, info};
use once_cell::sync::Lazy;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::filter::OrganizationFilter;
use crate::geo_utils::{bbox_around, haversine_distance};
use crate::hierarchy::ActivityTree;
use crate::{
    validate_phone, Activity, ActivityCreate, Bounds, Building, BuildingCreate, DirectoryError,
    GeoPoint, Organization, OrganizationCreate, Result,
};

/// Largest accepted search radius in meters.
pub const MAX_SEARCH_RADIUS_M: f64 = 200_000.0;

static MIGRATIONS: Lazy<Migrations<'static>> = Lazy::new(|| {
    Migrations::new(vec![M::up(
        r#"
        CREATE TABLE buildings (
            id INTEGER PRIMARY KEY,
            address TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL
        );

        CREATE TABLE activities (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            parent_id INTEGER REFERENCES activities(id) ON DELETE SET NULL,
            UNIQUE (parent_id, name)
        );

        CREATE TABLE organizations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            building_id INTEGER NOT NULL REFERENCES buildings(id) ON DELETE RESTRICT
        );

        CREATE TABLE organization_phones (
            id INTEGER PRIMARY KEY,
            organization_id INTEGER NOT NULL
                REFERENCES organizations(id) ON DELETE CASCADE,
            phone TEXT NOT NULL CHECK (length(phone) BETWEEN 10 AND 11)
        );

        CREATE TABLE organization_activity (
            organization_id INTEGER NOT NULL
                REFERENCES organizations(id) ON DELETE CASCADE,
            activity_id INTEGER NOT NULL
                REFERENCES activities(id) ON DELETE CASCADE,
            PRIMARY KEY (organization_id, activity_id)
        );

        CREATE INDEX idx_organizations_building ON organizations(building_id);
        CREATE INDEX idx_activities_parent ON activities(parent_id);
        CREATE INDEX idx_buildings_coords ON buildings(latitude, longitude);
        CREATE INDEX idx_org_activity_activity ON organization_activity(activity_id);
        "#,
    )])
});

/// Directory storage over a single SQLite connection.
pub struct DirectoryStore {
    conn: Connection,
}

/// Organization row before phones and activities are attached.
struct OrgRow {
    id: i64,
    name: String,
    building: Building,
}

impl DirectoryStore {
    // ========================================================================
    // Initialization
    // ========================================================================

    /// Open (creating if needed) a directory database at `path`.
    pub fn open(path: &str) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        MIGRATIONS.to_latest(&mut conn)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        info!("opened directory database at {path}");
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    // ========================================================================
    // Buildings
    // ========================================================================

    /// Insert a building after validating its coordinates.
    pub fn create_building(&mut self, payload: &BuildingCreate) -> Result<Building> {
        if payload.address.trim().is_empty() {
            return Err(DirectoryError::InvalidInput(
                "building address must not be empty".to_string(),
            ));
        }
        let location = GeoPoint::new(payload.latitude, payload.longitude);
        if !location.is_valid() {
            return Err(DirectoryError::InvalidInput(format!(
                "invalid coordinates ({}, {})",
                payload.latitude, payload.longitude
            )));
        }

        self.conn.execute(
            "INSERT INTO buildings (address, latitude, longitude) VALUES (?, ?, ?)",
            params![payload.address, payload.latitude, payload.longitude],
        )?;
        self.get_building(self.conn.last_insert_rowid())
    }

    /// Fetch one building by id.
    pub fn get_building(&self, id: i64) -> Result<Building> {
        self.conn
            .query_row(
                "SELECT id, address, latitude, longitude FROM buildings WHERE id = ?",
                params![id],
                building_from_row,
            )
            .optional()?
            .ok_or(DirectoryError::NotFound {
                entity: "building",
                id,
            })
    }

    /// List all buildings ordered by id.
    pub fn list_buildings(&self) -> Result<Vec<Building>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, address, latitude, longitude FROM buildings ORDER BY id")?;
        let buildings = stmt
            .query_map([], building_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(buildings)
    }

    // ========================================================================
    // Activities
    // ========================================================================

    /// Insert an activity category. The parent, if given, must exist.
    pub fn create_activity(&mut self, payload: &ActivityCreate) -> Result<Activity> {
        if payload.name.trim().is_empty() {
            return Err(DirectoryError::InvalidInput(
                "activity name must not be empty".to_string(),
            ));
        }
        if let Some(parent_id) = payload.parent_id {
            if !self.activity_exists(parent_id)? {
                return Err(DirectoryError::MissingReference {
                    entity: "activity",
                    id: parent_id,
                });
            }
        }

        self.conn.execute(
            "INSERT INTO activities (name, parent_id) VALUES (?, ?)",
            params![payload.name, payload.parent_id],
        )?;
        self.get_activity(self.conn.last_insert_rowid())
    }

    /// Fetch one activity by id.
    pub fn get_activity(&self, id: i64) -> Result<Activity> {
        self.conn
            .query_row(
                "SELECT id, name, parent_id FROM activities WHERE id = ?",
                params![id],
                activity_from_row,
            )
            .optional()?
            .ok_or(DirectoryError::NotFound {
                entity: "activity",
                id,
            })
    }

    /// List all activities ordered by id.
    pub fn list_activities(&self) -> Result<Vec<Activity>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, parent_id FROM activities ORDER BY id")?;
        let activities = stmt
            .query_map([], activity_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(activities)
    }

    fn activity_exists(&self, id: i64) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM activities WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Expand an activity id into itself plus all transitive descendants.
    pub fn expand_activity(&self, id: i64) -> Result<Vec<i64>> {
        Ok(self.activity_tree()?.expand(id))
    }

    fn activity_tree(&self) -> Result<ActivityTree> {
        let mut stmt = self.conn.prepare("SELECT id, parent_id FROM activities")?;
        let nodes = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(i64, Option<i64>)>>>()?;
        Ok(ActivityTree::new(nodes))
    }

    // ========================================================================
    // Organizations
    // ========================================================================

    /// Insert an organization with its phones and activity tags.
    ///
    /// The building and every referenced activity must exist; every phone
    /// must be 10 or 11 digits. The row, its phones, and its tags are
    /// written in one transaction.
    pub fn create_organization(&mut self, payload: &OrganizationCreate) -> Result<Organization> {
        if payload.name.trim().is_empty() {
            return Err(DirectoryError::InvalidInput(
                "organization name must not be empty".to_string(),
            ));
        }
        for phone in &payload.phones {
            validate_phone(phone)?;
        }

        match self.get_building(payload.building_id) {
            Ok(_) => {}
            Err(DirectoryError::NotFound { .. }) => {
                return Err(DirectoryError::MissingReference {
                    entity: "building",
                    id: payload.building_id,
                })
            }
            Err(err) => return Err(err),
        }

        // Duplicate tags in the payload collapse to one
        let activity_ids: BTreeSet<i64> = payload.activity_ids.iter().copied().collect();
        for &activity_id in &activity_ids {
            if !self.activity_exists(activity_id)? {
                return Err(DirectoryError::MissingReference {
                    entity: "activity",
                    id: activity_id,
                });
            }
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO organizations (name, building_id) VALUES (?, ?)",
            params![payload.name, payload.building_id],
        )?;
        let org_id = tx.last_insert_rowid();

        for phone in &payload.phones {
            tx.execute(
                "INSERT INTO organization_phones (organization_id, phone) VALUES (?, ?)",
                params![org_id, phone],
            )?;
        }
        for activity_id in &activity_ids {
            tx.execute(
                "INSERT INTO organization_activity (organization_id, activity_id) VALUES (?, ?)",
                params![org_id, activity_id],
            )?;
        }
        tx.commit()?;

        debug!("created organization {org_id} in building {}", payload.building_id);
        self.get_organization(org_id)
    }

    /// Fetch one organization by id, with building, phones, and activities.
    pub fn get_organization(&self, id: i64) -> Result<Organization> {
        let row = self
            .conn
            .query_row(
                "SELECT o.id, o.name, b.id, b.address, b.latitude, b.longitude
                 FROM organizations o
                 JOIN buildings b ON b.id = o.building_id
                 WHERE o.id = ?",
                params![id],
                org_from_row,
            )
            .optional()?
            .ok_or(DirectoryError::NotFound {
                entity: "organization",
                id,
            })?;
        self.assemble(row)
    }

    /// List organizations matching `filter`, ordered by id.
    pub fn list_organizations(&self, filter: &OrganizationFilter) -> Result<Vec<Organization>> {
        let activity_ids = match filter.activity_id {
            None => None,
            Some(id) if filter.include_children => Some(self.expand_activity(id)?),
            Some(id) => Some(vec![id]),
        };

        let rendered = filter.predicates(activity_ids.as_deref());
        let sql = format!(
            "SELECT o.id, o.name, b.id, b.address, b.latitude, b.longitude
             FROM organizations o
             JOIN buildings b ON b.id = o.building_id
             {} ORDER BY o.id",
            rendered.where_clause
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(rendered.params.iter()), org_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(|row| self.assemble(row)).collect()
    }

    /// Organizations whose building lies within `radius_m` meters of
    /// `center`. Prefilters with a bounding box, then applies the exact
    /// haversine distance.
    pub fn organizations_in_radius(
        &self,
        center: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<Organization>> {
        if !(radius_m > 0.0 && radius_m <= MAX_SEARCH_RADIUS_M) {
            return Err(DirectoryError::InvalidRadius {
                radius_m,
                max_m: MAX_SEARCH_RADIUS_M,
            });
        }

        let filter = OrganizationFilter {
            bounds: Some(bbox_around(&center, radius_m)),
            ..Default::default()
        };
        let candidates = self.list_organizations(&filter)?;
        let total = candidates.len();

        let hits: Vec<Organization> = candidates
            .into_iter()
            .filter(|org| haversine_distance(&center, &org.building.location()) <= radius_m)
            .collect();
        debug!(
            "radius search: {} of {} bbox candidates within {radius_m} m",
            hits.len(),
            total
        );
        Ok(hits)
    }

    /// Organizations whose building lies inside `bounds` (borders included).
    pub fn organizations_in_bbox(&self, bounds: Bounds) -> Result<Vec<Organization>> {
        if !bounds.is_valid() {
            return Err(DirectoryError::InvalidBounds);
        }
        self.list_organizations(&OrganizationFilter {
            bounds: Some(bounds),
            ..Default::default()
        })
    }

    // ========================================================================
    // Assembly
    // ========================================================================

    fn assemble(&self, row: OrgRow) -> Result<Organization> {
        Ok(Organization {
            phones: self.load_phones(row.id)?,
            activities: self.load_activities(row.id)?,
            id: row.id,
            name: row.name,
            building: row.building,
        })
    }

    fn load_phones(&self, org_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT phone FROM organization_phones WHERE organization_id = ? ORDER BY id",
        )?;
        let phones = stmt
            .query_map(params![org_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(phones)
    }

    fn load_activities(&self, org_id: i64) -> Result<Vec<Activity>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.name, a.parent_id
             FROM activities a
             JOIN organization_activity oa ON oa.activity_id = a.id
             WHERE oa.organization_id = ?
             ORDER BY a.id",
        )?;
        let activities = stmt
            .query_map(params![org_id], activity_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(activities)
    }
}

// ============================================================================
// Row Mapping
// ============================================================================

fn building_from_row(row: &Row<'_>) -> rusqlite::Result<Building> {
    Ok(Building {
        id: row.get(0)?,
        address: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
    })
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
    })
}

fn org_from_row(row: &Row<'_>) -> rusqlite::Result<OrgRow> {
    Ok(OrgRow {
        id: row.get(0)?,
        name: row.get(1)?,
        building: Building {
            id: row.get(2)?,
            address: row.get(3)?,
            latitude: row.get(4)?,
            longitude: row.get(5)?,
        },
    })
}
