use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use crate::{
    contact::{Contact, ContactFields},
    error::{Error, Result},
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS contacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL CHECK (name <> ''),
        phone TEXT NOT NULL CHECK (phone <> ''),
        email TEXT,
        type TEXT NOT NULL CHECK (type <> ''),
        image_url TEXT
    );
";

const COLUMNS: &str = "id, name, phone, email, type, image_url";

/// Single SQLite connection shared by all request handlers.
///
/// Every write runs inside its own transaction which is rolled back when dropped without commit.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;

        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn create(&self, fields: ContactFields, image_url: Option<String>) -> Result<Contact> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO contacts (name, phone, email, type, image_url) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                fields.name,
                fields.phone,
                fields.email,
                fields.kind,
                image_url
            ],
        )?;

        let id = tx.last_insert_rowid();

        tx.commit()?;

        tracing::debug!("Created contact {}", id);

        let contact = Contact {
            id,
            name: fields.name,
            phone: fields.phone,
            email: fields.email,
            kind: fields.kind,
            image_url,
        };

        Ok(contact)
    }

    pub fn get(&self, id: i64) -> Result<Contact> {
        let conn = self.conn.lock();

        find(&conn, id)?.ok_or(Error::NotFound { id })
    }

    pub fn list(&self) -> Result<Vec<Contact>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!("SELECT {} FROM contacts ORDER BY id", COLUMNS))?;

        let contacts = stmt
            .query_map([], from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(contacts)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();

        let count = conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;

        Ok(count)
    }

    /// Overwrites the form-editable fields, leaving `id` and `image_url` untouched.
    pub fn update(&self, id: i64, fields: ContactFields) -> Result<Contact> {
        self.modify(id, |contact| {
            contact.apply(fields);

            Ok(())
        })
    }

    /// Loads the contact, lets `f` change it and writes it back, all within one transaction.
    ///
    /// If `f` fails, nothing is written.
    pub fn modify<F>(&self, id: i64, f: F) -> Result<Contact>
    where
        F: FnOnce(&mut Contact) -> Result<()>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let mut contact = find(&tx, id)?.ok_or(Error::NotFound { id })?;

        f(&mut contact)?;

        write(&tx, &contact)?;

        tx.commit()?;

        tracing::debug!("Updated contact {}", id);

        Ok(contact)
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let deleted = tx.execute("DELETE FROM contacts WHERE id = ?1", params![id])?;

        if deleted == 0 {
            return Err(Error::NotFound { id });
        }

        tx.commit()?;

        tracing::debug!("Deleted contact {}", id);

        Ok(())
    }
}

fn find(conn: &Connection, id: i64) -> Result<Option<Contact>> {
    let contact = conn
        .query_row(
            &format!("SELECT {} FROM contacts WHERE id = ?1", COLUMNS),
            params![id],
            from_row,
        )
        .optional()?;

    Ok(contact)
}

fn write(tx: &Transaction, contact: &Contact) -> Result<()> {
    tx.execute(
        "UPDATE contacts SET name = ?1, phone = ?2, email = ?3, type = ?4, image_url = ?5 WHERE id = ?6",
        params![
            contact.name,
            contact.phone,
            contact.email,
            contact.kind,
            contact.image_url,
            contact.id
        ],
    )?;

    Ok(())
}

fn from_row(row: &Row) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        kind: row.get(4)?,
        image_url: row.get(5)?,
    })
}
