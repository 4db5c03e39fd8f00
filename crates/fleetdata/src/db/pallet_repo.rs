//! Pallet repository: per-job pallet movement counters.
//!
//! Counters are stored as reported. Ledger arithmetic across jobs happens
//! elsewhere.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::DatabaseError;

/// Pallet counters for one job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PalletRow {
    pub load_id: String,
    pub transfer_pallet: i64,
    pub change_pallet: i64,
    pub drop_pallet: i64,
    pub return_pallet: i64,
    pub borrow_customer_pallet: i64,
    pub return_customer_pallet: i64,
}

impl PalletRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            load_id: row.get("load_id")?,
            transfer_pallet: row.get("transfer_pallet")?,
            change_pallet: row.get("change_pallet")?,
            drop_pallet: row.get("drop_pallet")?,
            return_pallet: row.get("return_pallet")?,
            borrow_customer_pallet: row.get("borrow_customer_pallet")?,
            return_customer_pallet: row.get("return_customer_pallet")?,
        })
    }
}

/// A partial pallet update. Absent counters keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PalletUpdate {
    pub load_id: String,
    #[serde(default, alias = "tranfer_pallet")]
    pub transfer_pallet: Option<i64>,
    #[serde(default)]
    pub change_pallet: Option<i64>,
    #[serde(default)]
    pub drop_pallet: Option<i64>,
    #[serde(default)]
    pub return_pallet: Option<i64>,
    #[serde(default)]
    pub borrow_customer_pallet: Option<i64>,
    #[serde(default)]
    pub return_customer_pallet: Option<i64>,
}

/// Finds the pallet counters of a job.
pub fn find(conn: &Connection, load_id: &str) -> Result<Option<PalletRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM pallets WHERE load_id = ?1",
            params![load_id],
            PalletRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Applies a partial update, creating the row on first use.
///
/// Fails with a constraint error if the job does not exist.
pub fn apply_update(conn: &Connection, update: &PalletUpdate) -> Result<PalletRow, DatabaseError> {
    conn.execute(
        "INSERT INTO pallets (load_id, transfer_pallet, change_pallet, drop_pallet,
         return_pallet, borrow_customer_pallet, return_customer_pallet)
         VALUES (?1, COALESCE(?2, 0), COALESCE(?3, 0), COALESCE(?4, 0),
                 COALESCE(?5, 0), COALESCE(?6, 0), COALESCE(?7, 0))
         ON CONFLICT(load_id) DO UPDATE SET
           transfer_pallet = COALESCE(?2, transfer_pallet),
           change_pallet = COALESCE(?3, change_pallet),
           drop_pallet = COALESCE(?4, drop_pallet),
           return_pallet = COALESCE(?5, return_pallet),
           borrow_customer_pallet = COALESCE(?6, borrow_customer_pallet),
           return_customer_pallet = COALESCE(?7, return_customer_pallet)",
        params![
            update.load_id,
            update.transfer_pallet,
            update.change_pallet,
            update.drop_pallet,
            update.return_pallet,
            update.borrow_customer_pallet,
            update.return_customer_pallet,
        ],
    )?;

    find(conn, &update.load_id)?.ok_or_else(|| DatabaseError::MissingRow {
        table: "pallets",
        load_id: update.load_id.clone(),
    })
}
