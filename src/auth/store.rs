//! SQLite-backed principal and refresh-token store.
//!
//! Tables:
//! - `users`: principal accounts (one admin, any number of staff)
//! - `refresh_tokens`: active refresh records, keyed by SHA-256 token hash
//! - `refresh_tokens_revoked`: bounded history of rotated-out hashes, kept
//!   for a grace window to recognize reuse of an already-rotated token

use anyhow::{bail, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{credentials, epoch_secs};

/// Principal role. Exactly one `admin` exists per deployment — enforced at
/// creation time, not by schema constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }
}

/// A principal account. Never physically deleted; only the active flag is
/// toggled.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_at: i64,
}

/// Fields for creating a principal. The password arrives in plaintext and
/// is hashed here; it is never stored.
#[derive(Debug, Clone, Copy)]
pub struct NewPrincipal<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
    pub full_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub created_by: Option<&'a str>,
}

/// A staff listing row, including who created the account.
#[derive(Debug, Clone, Serialize)]
pub struct StaffEntry {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub created_by_username: Option<String>,
}

/// An active refresh-token record. The raw secret is never stored; its
/// SHA-256 hash is the natural key.
#[derive(Debug, Clone)]
pub struct RefreshRecord {
    pub token_hash: String,
    pub user_id: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: i64,
    pub expires_at: i64,
}

/// A rotated-out token hash retained for reuse detection.
#[derive(Debug, Clone)]
pub struct RevokedRecord {
    pub token_hash: String,
    pub user_id: String,
    pub revoked_at: i64,
}

/// SQLite-backed session store.
pub struct SessionStore {
    conn: Mutex<rusqlite::Connection>,
}

impl SessionStore {
    /// Open (or create) the database at the given path.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = rusqlite::Connection::open(db_path)?;

        // WAL mode for concurrent reads + crash safety
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password_hash TEXT NOT NULL,
                salt TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('admin', 'staff')),
                full_name TEXT,
                phone TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_by TEXT REFERENCES users(id),
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS refresh_tokens (
                token_hash TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                ip TEXT,
                user_agent TEXT,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_refresh_user ON refresh_tokens(user_id);
            CREATE INDEX IF NOT EXISTS idx_refresh_expires ON refresh_tokens(expires_at);

            CREATE TABLE IF NOT EXISTS refresh_tokens_revoked (
                token_hash TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                revoked_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_revoked_at ON refresh_tokens_revoked(revoked_at);",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // ── Principals ──────────────────────────────────────────────────

    /// Create a principal. Enforces the single-admin rule and email
    /// uniqueness. Returns the stored record.
    pub fn create_principal(&self, new: &NewPrincipal<'_>) -> Result<Principal> {
        // Hash before taking the lock: key stretching is slow on purpose.
        let id = uuid::Uuid::new_v4().to_string();
        let salt = credentials::generate_salt();
        let password_hash = credentials::hash_password(new.password, &salt);
        let now = epoch_secs() as i64;

        let conn = self.conn.lock();

        if new.role == Role::Admin {
            let admins: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE role = 'admin'",
                [],
                |row| row.get(0),
            )?;
            if admins > 0 {
                bail!("An admin account already exists. Only one admin is allowed.");
            }
        }

        let result = conn.execute(
            "INSERT INTO users (id, username, email, password_hash, salt, role,
                                full_name, phone, is_active, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?10)",
            rusqlite::params![
                id,
                new.username,
                new.email,
                password_hash,
                salt,
                new.role.as_str(),
                new.full_name,
                new.phone,
                new.created_by,
                now,
            ],
        );

        match result {
            Ok(_) => Ok(Principal {
                id,
                username: new.username.to_string(),
                email: new.email.to_string(),
                password_hash,
                salt,
                role: new.role,
                full_name: new.full_name.map(str::to_string),
                phone: new.phone.map(str::to_string),
                is_active: true,
                created_by: new.created_by.map(str::to_string),
                created_at: now,
            }),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                bail!("Email already registered")
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a principal by email (case-insensitive). Inactive accounts
    /// are returned too; the caller decides how to fail.
    pub fn find_by_email(&self, email: &str) -> Result<Option<Principal>> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            &format!("SELECT {PRINCIPAL_COLUMNS} FROM users WHERE email = ?1 COLLATE NOCASE"),
            rusqlite::params![email.trim()],
            principal_from_row,
        );
        optional(row)
    }

    /// Look up a principal by id.
    pub fn find_by_id(&self, id: &str) -> Result<Option<Principal>> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            &format!("SELECT {PRINCIPAL_COLUMNS} FROM users WHERE id = ?1"),
            rusqlite::params![id],
            principal_from_row,
        );
        optional(row)
    }

    /// Toggle the active flag. Returns false if no such principal.
    pub fn set_active(&self, id: &str, active: bool) -> Result<bool> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE users SET is_active = ?1 WHERE id = ?2",
            rusqlite::params![active as i64, id],
        )?;
        Ok(updated > 0)
    }

    /// List all accounts with creator info, newest first.
    pub fn list_staff(&self) -> Result<Vec<StaffEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.email, u.role, u.full_name, u.phone,
                    u.is_active, u.created_at, creator.username
             FROM users u
             LEFT JOIN users creator ON u.created_by = creator.id
             ORDER BY u.created_at DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let role: String = row.get(3)?;
                Ok(StaffEntry {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    email: row.get(2)?,
                    role: Role::parse(&role).unwrap_or(Role::Staff),
                    full_name: row.get(4)?,
                    phone: row.get(5)?,
                    is_active: row.get::<_, i64>(6)? != 0,
                    created_at: row.get(7)?,
                    created_by_username: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Count registered principals.
    pub fn count_users(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ── Active refresh tokens ───────────────────────────────────────

    /// Persist a new active refresh record.
    pub fn create_active(&self, record: &RefreshRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO refresh_tokens (token_hash, user_id, ip, user_agent, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                record.token_hash,
                record.user_id,
                record.ip,
                record.user_agent,
                record.created_at,
                record.expires_at,
            ],
        )?;
        Ok(())
    }

    /// Look up an active record by hash. Uses the server clock at lookup
    /// time: an expired-but-still-present record is treated as not found.
    pub fn find_active_by_hash(&self, token_hash: &str) -> Result<Option<RefreshRecord>> {
        let now = epoch_secs() as i64;
        let conn = self.conn.lock();
        let row = conn.query_row(
            "SELECT token_hash, user_id, ip, user_agent, created_at, expires_at
             FROM refresh_tokens
             WHERE token_hash = ?1 AND expires_at > ?2",
            rusqlite::params![token_hash, now],
            refresh_from_row,
        );
        optional(row)
    }

    /// Delete an active record by hash. Returns whether a row was removed.
    pub fn delete_active_by_hash(&self, token_hash: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM refresh_tokens WHERE token_hash = ?1",
            rusqlite::params![token_hash],
        )?;
        Ok(deleted > 0)
    }

    /// Cascade revocation: delete every active record for a principal.
    pub fn delete_all_active_for_principal(&self, user_id: &str) -> Result<u64> {
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM refresh_tokens WHERE user_id = ?1",
            rusqlite::params![user_id],
        )?;
        Ok(deleted as u64)
    }

    /// Atomically rotate a refresh token: delete the old active record,
    /// move its hash into the revoked history, and insert the new record
    /// — a single transaction keyed by the old hash. The delete is the
    /// guard: if it touches no row, a concurrent rotation already consumed
    /// this hash, the transaction rolls back, and `false` is returned so
    /// the caller can take the reuse path. Exactly one of two racing
    /// rotations on the same hash commits.
    pub fn rotate(&self, old: &RefreshRecord, new: &RefreshRecord) -> Result<bool> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let deleted = tx.execute(
            "DELETE FROM refresh_tokens WHERE token_hash = ?1",
            rusqlite::params![old.token_hash],
        )?;
        if deleted == 0 {
            // Dropping the transaction rolls it back.
            return Ok(false);
        }
        tx.execute(
            "INSERT OR IGNORE INTO refresh_tokens_revoked (token_hash, user_id, revoked_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![old.token_hash, old.user_id, epoch_secs() as i64],
        )?;
        tx.execute(
            "INSERT INTO refresh_tokens (token_hash, user_id, ip, user_agent, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                new.token_hash,
                new.user_id,
                new.ip,
                new.user_agent,
                new.created_at,
                new.expires_at,
            ],
        )?;
        tx.commit()?;
        Ok(true)
    }

    // ── Revoked history ─────────────────────────────────────────────

    /// Record a rotated-out hash. Idempotent: re-inserting the same hash is
    /// a no-op.
    pub fn insert_revoked_if_absent(&self, token_hash: &str, user_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO refresh_tokens_revoked (token_hash, user_id, revoked_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![token_hash, user_id, epoch_secs() as i64],
        )?;
        Ok(())
    }

    /// Look up a hash in the revoked history.
    pub fn find_revoked_by_hash(&self, token_hash: &str) -> Result<Option<RevokedRecord>> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            "SELECT token_hash, user_id, revoked_at
             FROM refresh_tokens_revoked WHERE token_hash = ?1",
            rusqlite::params![token_hash],
            |row| {
                Ok(RevokedRecord {
                    token_hash: row.get(0)?,
                    user_id: row.get(1)?,
                    revoked_at: row.get(2)?,
                })
            },
        );
        optional(row)
    }

    // ── Retention ───────────────────────────────────────────────────

    /// Delete active records whose expiry has passed.
    pub fn purge_expired_active(&self) -> Result<u64> {
        let now = epoch_secs() as i64;
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM refresh_tokens WHERE expires_at <= ?1",
            rusqlite::params![now],
        )?;
        Ok(deleted as u64)
    }

    /// Delete revoked-history records older than the grace window.
    pub fn purge_old_revoked(&self, older_than_secs: u64) -> Result<u64> {
        let cutoff = epoch_secs() as i64 - older_than_secs as i64;
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM refresh_tokens_revoked WHERE revoked_at < ?1",
            rusqlite::params![cutoff],
        )?;
        Ok(deleted as u64)
    }

    /// Test hook: whether a hash is physically present in the active table,
    /// expired or not.
    #[cfg(test)]
    pub fn active_row_exists(&self, token_hash: &str) -> bool {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT 1 FROM refresh_tokens WHERE token_hash = ?1",
            rusqlite::params![token_hash],
            |_| Ok(()),
        )
        .is_ok()
    }
}

const PRINCIPAL_COLUMNS: &str = "id, username, email, password_hash, salt, role, \
                                 full_name, phone, is_active, created_by, created_at";

fn principal_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Principal> {
    let role: String = row.get(5)?;
    Ok(Principal {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        salt: row.get(4)?,
        role: Role::parse(&role).unwrap_or(Role::Staff),
        full_name: row.get(6)?,
        phone: row.get(7)?,
        is_active: row.get::<_, i64>(8)? != 0,
        created_by: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn refresh_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RefreshRecord> {
    Ok(RefreshRecord {
        token_hash: row.get(0)?,
        user_id: row.get(1)?,
        ip: row.get(2)?,
        user_agent: row.get(3)?,
        created_at: row.get(4)?,
        expires_at: row.get(5)?,
    })
}

fn optional<T>(row: rusqlite::Result<T>) -> Result<Option<T>> {
    match row {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
