use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Watcher persistence: the block cursor, applied-event log and group
/// membership in join order.
pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sync_cursor (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                next_block INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS applied_events (
                tx_hash TEXT NOT NULL,
                log_index INTEGER NOT NULL,
                block INTEGER NOT NULL,
                name TEXT NOT NULL,
                PRIMARY KEY (tx_hash, log_index)
            );
            CREATE TABLE IF NOT EXISTS members (
                group_id INTEGER NOT NULL,
                idx INTEGER NOT NULL,
                commitment TEXT NOT NULL,
                PRIMARY KEY (group_id, idx),
                UNIQUE (group_id, commitment)
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // a poisoned lock still holds a usable connection
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn save_cursor(&self, next_block: u64) -> rusqlite::Result<()> {
        self.conn().execute(
            "INSERT INTO sync_cursor (id, next_block) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET next_block = ?1",
            params![next_block as i64],
        )?;
        Ok(())
    }

    /// First block not yet scanned, if the watcher has run before.
    pub fn load_cursor(&self) -> rusqlite::Result<Option<u64>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT next_block FROM sync_cursor WHERE id = 1")?;
        let mut rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        match rows.next() {
            Some(row) => Ok(Some(row? as u64)),
            None => Ok(None),
        }
    }

    /// Record a log as applied. `false` if it was already recorded.
    pub fn record_event(&self, tx_hash: &str, log_index: u64, block: u64, name: &str) -> rusqlite::Result<bool> {
        let changed = self.conn().execute(
            "INSERT OR IGNORE INTO applied_events (tx_hash, log_index, block, name)
             VALUES (?1, ?2, ?3, ?4)",
            params![tx_hash, log_index as i64, block as i64, name],
        )?;
        Ok(changed == 1)
    }

    pub fn is_applied(&self, tx_hash: &str, log_index: u64) -> rusqlite::Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM applied_events WHERE tx_hash = ?1 AND log_index = ?2",
            params![tx_hash, log_index as i64],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn events_applied(&self) -> rusqlite::Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM applied_events", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Append a member; returns its index, or `None` if already present.
    pub fn insert_member(&self, group_id: u64, commitment: &str) -> rusqlite::Result<Option<usize>> {
        let conn = self.conn();
        let next: i64 = conn.query_row(
            "SELECT COUNT(*) FROM members WHERE group_id = ?1",
            params![group_id as i64],
            |row| row.get(0),
        )?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO members (group_id, idx, commitment) VALUES (?1, ?2, ?3)",
            params![group_id as i64, next, commitment],
        )?;
        Ok((changed == 1).then_some(next as usize))
    }

    pub fn load_members(&self, group_id: u64) -> rusqlite::Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT commitment FROM members WHERE group_id = ?1 ORDER BY idx")?;
        let members = stmt
            .query_map(params![group_id as i64], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(members)
    }
}
