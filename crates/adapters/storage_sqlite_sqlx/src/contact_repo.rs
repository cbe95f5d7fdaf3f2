//! `SQLite` implementation of [`ContactRepository`].
//!
//! Contacts are owned by the surrounding CRM. [`SqliteContactRepository::insert`]
//! exists for seeding and tests; the engine itself only reads them and
//! appends notes.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use crmflow_app::ports::{ContactFilter, ContactRepository};
use crmflow_domain::contact::Contact;
use crmflow_domain::error::{CrmFlowError, NotFoundError};
use crmflow_domain::id::ContactId;
use crmflow_domain::time::now;

use crate::codec::{decode, decode_opt_ts, encode_ts, narrow};
use crate::error::StorageError;

struct Wrapper(Contact);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let owner_id: String = row.try_get("owner_id")?;
        let score: i64 = row.try_get("score")?;
        let last_contacted_at: Option<String> = row.try_get("last_contacted_at")?;

        Ok(Self(Contact {
            id: decode(&id)?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            whatsapp: row.try_get("whatsapp")?,
            company: row.try_get("company")?,
            status_tag: row.try_get("status_tag")?,
            owner_id: decode(&owner_id)?,
            score: narrow(score)?,
            last_contacted_at: decode_opt_ts(last_contacted_at)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO contacts (
        id, name, email, phone, whatsapp, company, status_tag, owner_id, score, last_contacted_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";
const SELECT_ALL: &str = "SELECT * FROM contacts ORDER BY rowid";
const SELECT_ONE: &str = "SELECT * FROM contacts WHERE id = ?";
const INSERT_NOTE: &str =
    "INSERT INTO contact_notes (contact_id, note, created_at) VALUES (?, ?, ?)";
const SELECT_NOTES: &str = "SELECT note FROM contact_notes WHERE contact_id = ? ORDER BY id";
const CONTACT_EXISTS: &str = "SELECT COUNT(*) FROM contacts WHERE id = ?";

/// `SQLite`-backed contact repository.
pub struct SqliteContactRepository {
    pool: SqlitePool,
}

impl SqliteContactRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a contact.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the row cannot be written, for instance
    /// when the id already exists.
    pub async fn insert(&self, contact: &Contact) -> Result<(), CrmFlowError> {
        sqlx::query(INSERT)
            .bind(contact.id.to_string())
            .bind(&contact.name)
            .bind(&contact.email)
            .bind(&contact.phone)
            .bind(&contact.whatsapp)
            .bind(&contact.company)
            .bind(&contact.status_tag)
            .bind(contact.owner_id.to_string())
            .bind(i64::from(contact.score))
            .bind(contact.last_contacted_at.map(encode_ts))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    /// Notes appended to a contact, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn notes(&self, id: ContactId) -> Result<Vec<String>, CrmFlowError> {
        let notes: Vec<String> = sqlx::query_scalar(SELECT_NOTES)
            .bind(id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(notes)
    }
}

impl ContactRepository for SqliteContactRepository {
    async fn list(&self, filter: ContactFilter) -> Result<Vec<Contact>, CrmFlowError> {
        let rows: Vec<Wrapper> = match filter {
            ContactFilter::All => sqlx::query_as(SELECT_ALL).fetch_all(&self.pool).await,
            ContactFilter::Only(id) => {
                sqlx::query_as(SELECT_ONE)
                    .bind(id.to_string())
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn append_note(&self, id: ContactId, note: String) -> Result<(), CrmFlowError> {
        let exists: i64 = sqlx::query_scalar(CONTACT_EXISTS)
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;
        if exists == 0 {
            return Err(NotFoundError {
                entity: "Contact",
                id: id.to_string(),
            }
            .into());
        }

        sqlx::query(INSERT_NOTE)
            .bind(id.to_string())
            .bind(note)
            .bind(encode_ts(now()))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
