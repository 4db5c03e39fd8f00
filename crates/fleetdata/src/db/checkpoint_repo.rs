//! Checkpoint repository: reads and writes the `checkpoints` table.
//!
//! Column names come from [`Checkpoint`] so the SQL is assembled from a
//! fixed set of identifiers, never from caller input.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::DatabaseError;
use crate::status::{Checkpoint, CheckpointRecord};

fn column_list() -> Vec<&'static str> {
    Checkpoint::ALL
        .iter()
        .flat_map(|cp| [cp.datetime_column(), cp.coords_column()])
        .collect()
}

/// Values in the same order as [`column_list`].
fn column_values(record: &CheckpointRecord) -> Vec<Option<&str>> {
    Checkpoint::ALL
        .iter()
        .flat_map(|cp| {
            let mark = record.mark(*cp);
            [mark.at.as_deref(), mark.coords.as_deref()]
        })
        .collect()
}

fn record_from_row(row: &Row<'_>) -> Result<CheckpointRecord, rusqlite::Error> {
    let mut record = CheckpointRecord::new(row.get::<_, String>("load_id")?);
    for cp in Checkpoint::ALL {
        let mark = record.mark_mut(cp);
        mark.at = row.get(cp.datetime_column())?;
        mark.coords = row.get(cp.coords_column())?;
    }
    Ok(record)
}

/// Finds the checkpoint record of a job.
pub fn find(conn: &Connection, load_id: &str) -> Result<Option<CheckpointRecord>, DatabaseError> {
    let record = conn
        .query_row(
            "SELECT * FROM checkpoints WHERE load_id = ?1",
            params![load_id],
            record_from_row,
        )
        .optional()?;
    Ok(record)
}

/// Inserts a new checkpoint record with whatever marks it already carries.
pub fn insert(conn: &Connection, record: &CheckpointRecord) -> Result<(), DatabaseError> {
    let columns = column_list();
    let placeholders: Vec<String> = (0..=columns.len()).map(|i| format!("?{}", i + 1)).collect();
    let sql = format!(
        "INSERT INTO checkpoints (load_id, {}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    );

    let mut values = vec![Some(record.load_id.as_str())];
    values.extend(column_values(record));
    conn.execute(&sql, params_from_iter(values))?;
    Ok(())
}

/// Overwrites every checkpoint column of an existing record.
pub fn update(conn: &Connection, record: &CheckpointRecord) -> Result<(), DatabaseError> {
    let assignments: Vec<String> = column_list()
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{} = ?{}", col, i + 2))
        .collect();
    let sql = format!(
        "UPDATE checkpoints SET {} WHERE load_id = ?1",
        assignments.join(", ")
    );

    let mut values = vec![Some(record.load_id.as_str())];
    values.extend(column_values(record));
    let changed = conn.execute(&sql, params_from_iter(values))?;
    if changed == 0 {
        return Err(DatabaseError::MissingRow {
            table: "checkpoints",
            load_id: record.load_id.clone(),
        });
    }
    Ok(())
}
