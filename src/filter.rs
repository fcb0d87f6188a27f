//! Organization query filter.
//!
//! [`OrganizationFilter`] collects the optional predicates a listing may
//! apply — owning building, name substring, activity category, geographic
//! bounds — and renders them into a single SQL WHERE clause with positional
//! parameters. Rendering is separate from execution so the composition logic
//! stays testable without a database.
//!
//! The rendered SQL assumes the query aliases `organizations` as `o` and the
//! joined `buildings` row as `b`.

use rusqlite::types::Value;

use crate::Bounds;

/// Optional predicates for organization listings. Empty filter matches all.
#[derive(Debug, Clone, Default)]
pub struct OrganizationFilter {
    /// Match organizations housed in this building.
    pub building_id: Option<i64>,
    /// Case-insensitive substring match on the organization name.
    pub name: Option<String>,
    /// Match organizations tagged with this activity category.
    pub activity_id: Option<i64>,
    /// Expand `activity_id` to include all descendant categories.
    pub include_children: bool,
    /// Match organizations whose building falls inside this box (inclusive).
    pub bounds: Option<Bounds>,
}

/// A rendered WHERE clause plus its bind parameters.
#[derive(Debug)]
pub(crate) struct SqlPredicates {
    /// Either empty or `"WHERE ..."` ready to splice into a query.
    pub where_clause: String,
    pub params: Vec<Value>,
}

impl OrganizationFilter {
    /// Render the filter into SQL predicates.
    ///
    /// `activity_ids` is the resolved category id set: `None` when no
    /// activity predicate applies, otherwise the exact id or its hierarchy
    /// expansion. An empty set means the category matched nothing, which
    /// must yield an empty result, not an unfiltered one.
    pub(crate) fn predicates(&self, activity_ids: Option<&[i64]>) -> SqlPredicates {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(building_id) = self.building_id {
            clauses.push("o.building_id = ?".to_string());
            params.push(Value::Integer(building_id));
        }

        if let Some(name) = self.name.as_deref() {
            if !name.is_empty() {
                clauses.push("instr(lower(o.name), lower(?)) > 0".to_string());
                params.push(Value::Text(name.to_string()));
            }
        }

        if let Some(ids) = activity_ids {
            if ids.is_empty() {
                // Category resolved to nothing: force an empty result
                clauses.push("0 = 1".to_string());
            } else {
                let placeholders = vec!["?"; ids.len()].join(", ");
                clauses.push(format!(
                    "o.id IN (SELECT oa.organization_id FROM organization_activity oa \
                     WHERE oa.activity_id IN ({placeholders}))"
                ));
                params.extend(ids.iter().map(|id| Value::Integer(*id)));
            }
        }

        if let Some(bounds) = &self.bounds {
            clauses.push(
                "b.latitude >= ? AND b.latitude <= ? AND b.longitude >= ? AND b.longitude <= ?"
                    .to_string(),
            );
            params.push(Value::Real(bounds.min_lat));
            params.push(Value::Real(bounds.max_lat));
            params.push(Value::Real(bounds.min_lon));
            params.push(Value::Real(bounds.max_lon));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        SqlPredicates {
            where_clause,
            params,
        }
    }
}
