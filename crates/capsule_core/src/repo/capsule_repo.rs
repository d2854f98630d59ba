//! Capsule store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist capsules and their contents.
//! - Own the atomic check-then-write units for time-gated mutations.
//!
//! # Invariants
//! - `insert_content_while_locked` and `apply_patch` sample the clock inside an
//!   IMMEDIATE transaction, after every competing writer has committed.
//! - `delete_capsule_cascade` never leaves content rows for a missing capsule.
//! - Capsule lists are newest first and content lists oldest first; rows
//!   sharing a millisecond keep insertion order via SQLite's `rowid`.

use crate::clock::Clock;
use crate::db::DbError;
use crate::model::capsule::{Capsule, CapsuleId, CapsulePatch, LockState, PrincipalId};
use crate::model::content::{Content, ContentType};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CAPSULE_SELECT_SQL: &str = "SELECT
    capsule_id,
    creator_id,
    title,
    description,
    unlock_at,
    is_communal,
    created_at
FROM capsules";

const CONTENT_SELECT_SQL: &str = "SELECT
    content_id,
    capsule_id,
    contributor_id,
    content_type,
    content_text,
    storage_key,
    sentiment_score,
    created_at
FROM contents";

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level error for capsule persistence and time-gated writes.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target capsule does not exist.
    CapsuleNotFound(CapsuleId),
    /// Capsule reached its unlock instant before the write could commit.
    CapsuleUnlocked(CapsuleId),
    /// Connection schema is missing a required table.
    MissingRequiredTable(&'static str),
    /// Persisted row cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::CapsuleNotFound(id) => write!(f, "capsule not found: {id}"),
            Self::CapsuleUnlocked(id) => write!(f, "capsule already unlocked: {id}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "capsule store requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted capsule data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract for capsules and their contents.
pub trait CapsuleStore {
    /// Inserts a new capsule record.
    fn insert_capsule(&self, capsule: &Capsule) -> RepoResult<()>;
    /// Loads one capsule by id.
    fn get_capsule(&self, id: CapsuleId) -> RepoResult<Option<Capsule>>;
    /// Lists capsules created by `creator`, newest first.
    fn list_capsules_by_creator(&self, creator: &PrincipalId) -> RepoResult<Vec<Capsule>>;
    /// Applies a metadata patch if the capsule is still locked at commit time.
    fn apply_patch(
        &self,
        id: CapsuleId,
        patch: &CapsulePatch,
        clock: &dyn Clock,
    ) -> RepoResult<Capsule>;
    /// Deletes the capsule and all its contents; returns removed content count.
    fn delete_capsule_cascade(&self, id: CapsuleId) -> RepoResult<usize>;
    /// Inserts content if the parent capsule is still locked at commit time.
    ///
    /// The returned record carries `created_at` as sampled inside the
    /// transaction.
    fn insert_content_while_locked(&self, content: &Content, clock: &dyn Clock)
        -> RepoResult<Content>;
    /// Lists all contents of one capsule in contribution order.
    fn list_contents(&self, capsule_id: CapsuleId) -> RepoResult<Vec<Content>>;
    /// Counts contents of one capsule.
    fn count_contents(&self, capsule_id: CapsuleId) -> RepoResult<usize>;
}

/// SQLite-backed capsule store.
///
/// Borrowing the connection keeps the store cheap to copy into several
/// services sharing one connection.
#[derive(Clone, Copy)]
pub struct SqliteCapsuleStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCapsuleStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in ["capsules", "contents"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }
}

impl CapsuleStore for SqliteCapsuleStore<'_> {
    fn insert_capsule(&self, capsule: &Capsule) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO capsules (
                capsule_id,
                creator_id,
                title,
                description,
                unlock_at,
                is_communal,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                capsule.id.to_string(),
                capsule.creator_id.as_str(),
                capsule.title.as_str(),
                capsule.description.as_deref(),
                capsule.unlock_at,
                bool_to_int(capsule.is_communal),
                capsule.created_at,
            ],
        )?;
        Ok(())
    }

    fn get_capsule(&self, id: CapsuleId) -> RepoResult<Option<Capsule>> {
        load_capsule(self.conn, id)
    }

    fn list_capsules_by_creator(&self, creator: &PrincipalId) -> RepoResult<Vec<Capsule>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CAPSULE_SELECT_SQL}
             WHERE creator_id = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([creator.as_str()])?;
        let mut capsules = Vec::new();
        while let Some(row) = rows.next()? {
            capsules.push(parse_capsule_row(row)?);
        }
        Ok(capsules)
    }

    fn apply_patch(
        &self,
        id: CapsuleId,
        patch: &CapsulePatch,
        clock: &dyn Clock,
    ) -> RepoResult<Capsule> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut capsule = load_capsule(&tx, id)?.ok_or(RepoError::CapsuleNotFound(id))?;
        if capsule.lock_state(clock.now_ms()) == LockState::Unlocked {
            return Err(RepoError::CapsuleUnlocked(id));
        }

        patch.apply_to(&mut capsule);
        tx.execute(
            "UPDATE capsules
             SET
                title = ?2,
                description = ?3,
                is_communal = ?4
             WHERE capsule_id = ?1;",
            params![
                id.to_string(),
                capsule.title.as_str(),
                capsule.description.as_deref(),
                bool_to_int(capsule.is_communal),
            ],
        )?;
        tx.commit()?;
        Ok(capsule)
    }

    fn delete_capsule_cascade(&self, id: CapsuleId) -> RepoResult<usize> {
        let id_text = id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let removed_contents =
            tx.execute("DELETE FROM contents WHERE capsule_id = ?1;", [&id_text])?;
        let removed_capsules =
            tx.execute("DELETE FROM capsules WHERE capsule_id = ?1;", [&id_text])?;
        if removed_capsules == 0 {
            // Dropping `tx` rolls back; nothing was visible anyway.
            return Err(RepoError::CapsuleNotFound(id));
        }
        tx.commit()?;
        Ok(removed_contents)
    }

    fn insert_content_while_locked(
        &self,
        content: &Content,
        clock: &dyn Clock,
    ) -> RepoResult<Content> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let unlock_at: i64 = tx
            .query_row(
                "SELECT unlock_at FROM capsules WHERE capsule_id = ?1;",
                [content.capsule_id.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(RepoError::CapsuleNotFound(content.capsule_id))?;

        let now = clock.now_ms();
        if LockState::at(unlock_at, now) == LockState::Unlocked {
            return Err(RepoError::CapsuleUnlocked(content.capsule_id));
        }

        let mut committed = content.clone();
        committed.created_at = now;
        tx.execute(
            "INSERT INTO contents (
                content_id,
                capsule_id,
                contributor_id,
                content_type,
                content_text,
                storage_key,
                sentiment_score,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                committed.id.to_string(),
                committed.capsule_id.to_string(),
                committed.contributor_id.as_str(),
                committed.content_type.as_str(),
                committed.text.as_deref(),
                committed.storage_key.as_deref(),
                committed.sentiment_score,
                committed.created_at,
            ],
        )?;
        tx.commit()?;
        Ok(committed)
    }

    fn list_contents(&self, capsule_id: CapsuleId) -> RepoResult<Vec<Content>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONTENT_SELECT_SQL}
             WHERE capsule_id = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([capsule_id.to_string()])?;
        let mut contents = Vec::new();
        while let Some(row) = rows.next()? {
            contents.push(parse_content_row(row)?);
        }
        Ok(contents)
    }

    fn count_contents(&self, capsule_id: CapsuleId) -> RepoResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM contents WHERE capsule_id = ?1;",
            [capsule_id.to_string()],
            |row| row.get(0),
        )?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative content count `{count}`")))
    }
}

fn load_capsule(conn: &Connection, id: CapsuleId) -> RepoResult<Option<Capsule>> {
    let mut stmt = conn.prepare(&format!("{CAPSULE_SELECT_SQL} WHERE capsule_id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_capsule_row(row)?));
    }
    Ok(None)
}

fn parse_capsule_row(row: &Row<'_>) -> RepoResult<Capsule> {
    let id_text: String = row.get("capsule_id")?;
    let is_communal = match row.get::<_, i64>("is_communal")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_communal value `{other}` in capsules.is_communal"
            )));
        }
    };

    Ok(Capsule {
        id: parse_uuid(&id_text, "capsules.capsule_id")?,
        creator_id: PrincipalId::new(row.get::<_, String>("creator_id")?),
        title: row.get("title")?,
        description: row.get("description")?,
        unlock_at: row.get("unlock_at")?,
        is_communal,
        created_at: row.get("created_at")?,
    })
}

fn parse_content_row(row: &Row<'_>) -> RepoResult<Content> {
    let id_text: String = row.get("content_id")?;
    let capsule_text: String = row.get("capsule_id")?;
    let type_text: String = row.get("content_type")?;
    let content_type = ContentType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid content type `{type_text}` in contents.content_type"
        ))
    })?;

    let content = Content {
        id: parse_uuid(&id_text, "contents.content_id")?,
        capsule_id: parse_uuid(&capsule_text, "contents.capsule_id")?,
        contributor_id: PrincipalId::new(row.get::<_, String>("contributor_id")?),
        content_type,
        text: row.get("content_text")?,
        storage_key: row.get("storage_key")?,
        sentiment_score: row.get("sentiment_score")?,
        created_at: row.get("created_at")?,
    };

    let shape_ok = match content.content_type {
        ContentType::Text => content.text.is_some() && content.storage_key.is_none(),
        _ => content.text.is_none() && content.storage_key.is_some(),
    };
    if !shape_ok {
        return Err(RepoError::InvalidData(format!(
            "content {} has payload fields inconsistent with type `{type_text}`",
            content.id
        )));
    }
    Ok(content)
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
