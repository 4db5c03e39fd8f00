//! Job repository: CRUD operations for the `jobs` table.
//!
//! Functions take a plain `&Connection` so they work both on a locked
//! connection and inside a transaction (`Transaction` derefs to it).

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::DatabaseError;

/// A job row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobRow {
    pub load_id: String,
    /// Jobs dispatched together share this key.
    #[serde(default)]
    pub dispatch_group: Option<String>,
    #[serde(default)]
    pub date_plan: Option<String>,
    #[serde(default)]
    pub head_plate: Option<String>,
    #[serde(default)]
    pub tail_plate: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub driver_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Derived from the checkpoint record; never set directly by callers.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub remark: Option<String>,
    /// Pickup location. Also selects the status rule variant.
    #[serde(default)]
    pub origin_location: Option<String>,
    #[serde(default)]
    pub pickup_date: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub pallet_type: Option<String>,
    #[serde(default)]
    pub pallet_plan: Option<i64>,
    #[serde(default)]
    pub unload_cost: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub updated_at: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            load_id: row.get("load_id")?,
            dispatch_group: row.get("dispatch_group")?,
            date_plan: row.get("date_plan")?,
            head_plate: row.get("head_plate")?,
            tail_plate: row.get("tail_plate")?,
            fuel_type: row.get("fuel_type")?,
            height: row.get("height")?,
            weight: row.get("weight")?,
            driver_name: row.get("driver_name")?,
            phone: row.get("phone")?,
            status: row.get("status")?,
            remark: row.get("remark")?,
            origin_location: row.get("origin_location")?,
            pickup_date: row.get("pickup_date")?,
            destination: row.get("destination")?,
            delivery_date: row.get("delivery_date")?,
            pallet_type: row.get("pallet_type")?,
            pallet_plan: row.get("pallet_plan")?,
            unload_cost: row.get("unload_cost")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
            updated_by: row.get("updated_by")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Canonical form of a dispatch group key: trimmed, with blank meaning
/// no group. Keys are stored and looked up in this form only.
pub fn group_key(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
}

/// Query filter parameters for job listing.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub status: Option<String>,
    pub dispatch_group: Option<String>,
    pub origin_location: Option<String>,
    /// Inclusive lower bound on `date_plan`.
    pub from_date: Option<String>,
    /// Inclusive upper bound on `date_plan`.
    pub to_date: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a new job row.
pub fn insert(conn: &Connection, job: &JobRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO jobs (load_id, dispatch_group, date_plan, head_plate, tail_plate, fuel_type,
         height, weight, driver_name, phone, status, remark, origin_location, pickup_date,
         destination, delivery_date, pallet_type, pallet_plan, unload_cost, created_by,
         created_at, updated_by, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
         ?18, ?19, ?20, ?21, ?22, ?23)",
        params![
            job.load_id,
            job.dispatch_group,
            job.date_plan,
            job.head_plate,
            job.tail_plate,
            job.fuel_type,
            job.height,
            job.weight,
            job.driver_name,
            job.phone,
            job.status,
            job.remark,
            job.origin_location,
            job.pickup_date,
            job.destination,
            job.delivery_date,
            job.pallet_type,
            job.pallet_plan,
            job.unload_cost,
            job.created_by,
            job.created_at,
            job.updated_by,
            job.updated_at,
        ],
    )?;
    Ok(())
}

/// Finds a job by its load id.
pub fn find_by_id(conn: &Connection, load_id: &str) -> Result<Option<JobRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM jobs WHERE load_id = ?1")?;
    let mut rows = stmt.query_map(params![load_id], JobRow::from_row)?;
    match rows.next() {
        Some(Ok(row)) => Ok(Some(row)),
        Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
        None => Ok(None),
    }
}

/// Returns every job in a dispatch group, ordered by load id.
pub fn find_by_group(conn: &Connection, group: &str) -> Result<Vec<JobRow>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT * FROM jobs WHERE dispatch_group = ?1 ORDER BY load_id")?;
    let rows = stmt
        .query_map(params![group], JobRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Counts the jobs in a dispatch group.
pub fn count_by_group(conn: &Connection, group: &str) -> Result<u64, DatabaseError> {
    let count: u64 = conn.query_row(
        "SELECT COUNT(*) FROM jobs WHERE dispatch_group = ?1",
        params![group],
        |r| r.get(0),
    )?;
    Ok(count)
}

/// Queries jobs with filters, returning (rows, total_count).
pub fn query(conn: &Connection, filter: &JobFilter) -> Result<(Vec<JobRow>, u64), DatabaseError> {
    let mut conditions = Vec::new();
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(ref status) = filter.status {
        conditions.push(format!("status = ?{}", param_values.len() + 1));
        param_values.push(Box::new(status.clone()));
    }
    if let Some(ref group) = filter.dispatch_group {
        conditions.push(format!("dispatch_group = ?{}", param_values.len() + 1));
        param_values.push(Box::new(group.clone()));
    }
    if let Some(ref location) = filter.origin_location {
        conditions.push(format!("origin_location = ?{}", param_values.len() + 1));
        param_values.push(Box::new(location.clone()));
    }
    if let Some(ref from_date) = filter.from_date {
        conditions.push(format!("date_plan >= ?{}", param_values.len() + 1));
        param_values.push(Box::new(from_date.clone()));
    }
    if let Some(ref to_date) = filter.to_date {
        conditions.push(format!("date_plan <= ?{}", param_values.len() + 1));
        param_values.push(Box::new(to_date.clone()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM jobs {}", where_clause);
    let params_ref: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();
    let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

    let limit = filter.limit.unwrap_or(100) as i64;
    let offset = filter.offset.unwrap_or(0) as i64;
    param_values.push(Box::new(limit));
    param_values.push(Box::new(offset));
    let query_sql = format!(
        "SELECT * FROM jobs {} ORDER BY date_plan DESC, load_id LIMIT ?{} OFFSET ?{}",
        where_clause,
        param_values.len() - 1,
        param_values.len()
    );

    let params_ref: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&query_sql)?;
    let rows: Vec<JobRow> = stmt
        .query_map(params_ref.as_slice(), JobRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((rows, total))
}

/// Writes a derived status onto a job. Fails if the job does not exist.
pub fn update_status(
    conn: &Connection,
    load_id: &str,
    status: &str,
    updated_at: &str,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE jobs SET status = ?2, updated_at = ?3 WHERE load_id = ?1",
        params![load_id, status, updated_at],
    )?;
    if changed == 0 {
        return Err(DatabaseError::MissingRow {
            table: "jobs",
            load_id: load_id.to_string(),
        });
    }
    Ok(())
}

/// Deletes a job. Its checkpoint and pallet rows cascade. Returns whether
/// a row was removed.
pub fn delete(conn: &Connection, load_id: &str) -> Result<bool, DatabaseError> {
    let changed = conn.execute("DELETE FROM jobs WHERE load_id = ?1", params![load_id])?;
    Ok(changed > 0)
}
