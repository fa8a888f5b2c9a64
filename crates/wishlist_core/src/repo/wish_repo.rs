//! Wish repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/update/soft-delete APIs over the `wishes` table.
//! - Serialize read-check-write sequences per wish.
//!
//! # Invariants
//! - Write paths validate through `Wish` methods before SQL mutations.
//! - Lookups by id or secret also find soft-deleted wishes.
//! - Fulfill/reopen use compare-and-set updates inside `IMMEDIATE`
//!   transactions, so racing callers get exactly one winner.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::wish::{
    Wish, WishFields, WishId, WishKey, WishRecord, WishStateError, WishValidationError,
};
use crate::secret::verify_secret;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const WISH_SELECT_SQL: &str = "SELECT
    id,
    title,
    priority,
    description,
    link,
    endless,
    giver,
    secret,
    deleted
FROM wishes";

const WISH_COLUMNS: &[&str] = &[
    "id",
    "title",
    "priority",
    "description",
    "link",
    "endless",
    "giver",
    "secret",
    "deleted",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for wish persistence and lookups.
#[derive(Debug)]
pub enum RepoError {
    Validation(WishValidationError),
    Db(DbError),
    /// No wish, active or deleted, matches the key.
    NotFound(WishKey),
    /// Wish already has a giver; the first claim stays.
    WishFulfilled(WishId),
    /// Wish is endless and cannot be fulfilled.
    EndlessWish(WishId),
    /// Supplied secret does not match the wish's current secret.
    SecretMismatch(WishId),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "wish not found: {key}"),
            Self::WishFulfilled(id) => write!(f, "wish {id} is already fulfilled"),
            Self::EndlessWish(id) => write!(f, "wish {id} is endless and cannot be fulfilled"),
            Self::SecretMismatch(id) => write!(f, "secret does not match wish {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "wish repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "wish repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "wish repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted wish data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<WishValidationError> for RepoError {
    fn from(value: WishValidationError) -> Self {
        Self::Validation(value)
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

impl RepoError {
    fn from_state(id: WishId, err: WishStateError) -> Self {
        match err {
            WishStateError::AlreadyFulfilled => Self::WishFulfilled(id),
            WishStateError::Endless => Self::EndlessWish(id),
            WishStateError::Invalid(err) => Self::Validation(err),
        }
    }
}

/// Repository interface for wish storage.
///
/// Every mutating call is one atomic read-modify-write on a single wish.
pub trait WishRepository {
    /// Inserts a new wish and returns it with its assigned id.
    fn add(&self, fields: &WishFields) -> RepoResult<Wish>;
    fn get_by_id(&self, id: WishId) -> RepoResult<Wish>;
    /// Resolves an undo link. An empty secret never matches.
    fn get_by_secret(&self, secret: &str) -> RepoResult<Wish>;
    /// Full-field admin overwrite of title/priority/desc/link/endless/giver.
    fn modify(&self, id: WishId, fields: &WishFields) -> RepoResult<Wish>;
    /// Claims an open, active wish for `giver`.
    fn mark_fulfilled(&self, id: WishId, giver: &str) -> RepoResult<Wish>;
    /// Reopens a wish after verifying `secret` against the stored one.
    fn reopen(&self, id: WishId, secret: &str) -> RepoResult<Wish>;
    fn soft_delete(&self, key: &WishKey) -> RepoResult<Wish>;
    fn restore(&self, key: &WishKey) -> RepoResult<Wish>;
    /// Non-deleted wishes in insertion order.
    fn list_active(&self) -> RepoResult<Vec<Wish>>;
    /// Soft-deleted wishes, most recently deleted first.
    fn list_deleted(&self) -> RepoResult<Vec<Wish>>;

    fn get(&self, key: &WishKey) -> RepoResult<Wish> {
        match key {
            WishKey::Id(id) => self.get_by_id(*id),
            WishKey::Secret(secret) => self.get_by_secret(secret),
        }
    }
}

/// SQLite-backed wish repository.
pub struct SqliteWishRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWishRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_wish_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn immediate(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl WishRepository for SqliteWishRepository<'_> {
    fn add(&self, fields: &WishFields) -> RepoResult<Wish> {
        let wish = Wish::create(fields)?;

        self.conn.execute(
            "INSERT INTO wishes (
                title,
                priority,
                description,
                link,
                endless,
                giver,
                secret,
                deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                wish.title(),
                wish.priority(),
                wish.desc(),
                wish.link(),
                bool_to_int(wish.endless()),
                wish.giver(),
                wish.secret(),
                wish.deleted(),
            ],
        )?;

        Ok(wish.with_assigned_id(self.conn.last_insert_rowid()))
    }

    fn get_by_id(&self, id: WishId) -> RepoResult<Wish> {
        load_wish(self.conn, &WishKey::Id(id))
    }

    fn get_by_secret(&self, secret: &str) -> RepoResult<Wish> {
        load_wish(self.conn, &WishKey::Secret(secret.to_string()))
    }

    fn modify(&self, id: WishId, fields: &WishFields) -> RepoResult<Wish> {
        let tx = self.immediate()?;
        let mut wish = load_wish(&tx, &WishKey::Id(id))?;
        wish.apply_fields(fields)?;

        tx.execute(
            "UPDATE wishes
             SET
                title = ?2,
                priority = ?3,
                description = ?4,
                link = ?5,
                endless = ?6,
                giver = ?7,
                secret = ?8,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id,
                wish.title(),
                wish.priority(),
                wish.desc(),
                wish.link(),
                bool_to_int(wish.endless()),
                wish.giver(),
                wish.secret(),
            ],
        )?;

        tx.commit()?;
        Ok(wish)
    }

    fn mark_fulfilled(&self, id: WishId, giver: &str) -> RepoResult<Wish> {
        let tx = self.immediate()?;
        let mut wish = load_wish(&tx, &WishKey::Id(id))?;
        if wish.is_deleted() {
            return Err(RepoError::NotFound(WishKey::Id(id)));
        }
        wish.mark_fulfilled(giver)
            .map_err(|err| RepoError::from_state(id, err))?;

        let changed = tx.execute(
            "UPDATE wishes
             SET
                giver = ?2,
                secret = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND giver = ''
               AND endless = 0
               AND deleted IS NULL;",
            params![id, wish.giver(), wish.secret()],
        )?;
        if changed == 0 {
            return Err(RepoError::WishFulfilled(id));
        }

        tx.commit()?;
        Ok(wish)
    }

    fn reopen(&self, id: WishId, secret: &str) -> RepoResult<Wish> {
        let tx = self.immediate()?;
        let mut wish = load_wish(&tx, &WishKey::Id(id))?;
        verify_secret(secret, wish.secret()).map_err(|_| RepoError::SecretMismatch(id))?;
        let previous_secret = wish.secret().to_string();
        wish.reopen();

        let changed = tx.execute(
            "UPDATE wishes
             SET
                giver = '',
                secret = '',
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND secret = ?2;",
            params![id, previous_secret],
        )?;
        if changed == 0 {
            return Err(RepoError::SecretMismatch(id));
        }

        tx.commit()?;
        Ok(wish)
    }

    fn soft_delete(&self, key: &WishKey) -> RepoResult<Wish> {
        let tx = self.immediate()?;
        let mut wish = load_wish(&tx, key)?;
        wish.delete();
        write_deleted(&tx, &wish)?;
        tx.commit()?;
        Ok(wish)
    }

    fn restore(&self, key: &WishKey) -> RepoResult<Wish> {
        let tx = self.immediate()?;
        let mut wish = load_wish(&tx, key)?;
        wish.undelete();
        write_deleted(&tx, &wish)?;
        tx.commit()?;
        Ok(wish)
    }

    fn list_active(&self) -> RepoResult<Vec<Wish>> {
        query_wishes(
            self.conn,
            &format!("{WISH_SELECT_SQL} WHERE deleted IS NULL ORDER BY id ASC;"),
        )
    }

    fn list_deleted(&self) -> RepoResult<Vec<Wish>> {
        query_wishes(
            self.conn,
            &format!("{WISH_SELECT_SQL} WHERE deleted IS NOT NULL ORDER BY deleted DESC, id DESC;"),
        )
    }
}

fn load_wish(conn: &Connection, key: &WishKey) -> RepoResult<Wish> {
    let found = match key {
        WishKey::Id(id) => conn
            .query_row(
                &format!("{WISH_SELECT_SQL} WHERE id = ?1;"),
                [id],
                read_record,
            )
            .optional()?,
        // Empty secrets belong to open wishes and must never resolve.
        WishKey::Secret(secret) if secret.is_empty() => None,
        WishKey::Secret(secret) => conn
            .query_row(
                &format!("{WISH_SELECT_SQL} WHERE secret = ?1;"),
                [secret.as_str()],
                read_record,
            )
            .optional()?,
    };

    match found {
        Some(record) => record_to_wish(record?),
        None => Err(RepoError::NotFound(key.clone())),
    }
}

fn query_wishes(conn: &Connection, sql: &str) -> RepoResult<Vec<Wish>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut wishes = Vec::new();
    while let Some(row) = rows.next()? {
        wishes.push(record_to_wish(read_record(row)??)?);
    }
    Ok(wishes)
}

fn write_deleted(tx: &Transaction<'_>, wish: &Wish) -> RepoResult<()> {
    tx.execute(
        "UPDATE wishes
         SET
            deleted = ?2,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
        params![wish.id(), wish.deleted()],
    )?;
    Ok(())
}

/// Reads one row; the inner result carries data-shape errors that rusqlite
/// cannot express.
fn read_record(row: &Row<'_>) -> rusqlite::Result<RepoResult<WishRecord>> {
    let id: WishId = row.get("id")?;
    let endless = match row.get::<_, i64>("endless")? {
        0 => false,
        1 => true,
        other => {
            return Ok(Err(RepoError::InvalidData(format!(
                "invalid endless value `{other}` in wishes.endless for wish {id}"
            ))));
        }
    };

    Ok(Ok(WishRecord {
        id,
        title: row.get("title")?,
        priority: row.get("priority")?,
        desc: row.get("description")?,
        link: row.get("link")?,
        endless,
        giver: row.get("giver")?,
        secret: row.get("secret")?,
        deleted: row.get("deleted")?,
    }))
}

fn record_to_wish(record: WishRecord) -> RepoResult<Wish> {
    let id = record.id;
    Wish::try_from(record).map_err(|err| RepoError::InvalidData(format!("wish {id}: {err}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_wish_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "wishes")? {
        return Err(RepoError::MissingRequiredTable("wishes"));
    }

    for &column in WISH_COLUMNS {
        if !table_has_column(conn, "wishes", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "wishes",
                column,
            });
        }
    }

    Ok(())
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

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
