//! SQLite-backed fulfillment store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{FulfillmentStore, StoreError, TicketRecord, TransactionRecord};
use crate::identifiers::TransactionCode;

/// SQLite-backed fulfillment store.
pub struct SqliteFulfillmentStore {
    conn: Mutex<Connection>,
}

impl SqliteFulfillmentStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS transactions (
                transaction_code TEXT PRIMARY KEY,
                buyer_email TEXT NOT NULL,
                ticket_quantity INTEGER NOT NULL,
                delivered INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tickets (
                ticket_code TEXT NOT NULL,
                event_id TEXT NOT NULL,
                transaction_code TEXT NOT NULL REFERENCES transactions(transaction_code),
                scanned INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                PRIMARY KEY (event_id, ticket_code)
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_transaction ON tickets(transaction_code);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn map_insert_error(e: rusqlite::Error, key: &str) -> StoreError {
        match &e {
            rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                StoreError::Conflict(key.to_string())
            }
            _ => StoreError::Database(e.to_string()),
        }
    }

    fn parse_timestamp(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<TransactionRecord> {
        let created_at: String = row.get(4)?;
        Ok(TransactionRecord {
            transaction_code: TransactionCode::from(row.get::<_, String>(0)?),
            buyer_email: row.get(1)?,
            ticket_quantity: row.get(2)?,
            delivered: row.get(3)?,
            created_at: Self::parse_timestamp(&created_at),
        })
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<TicketRecord> {
        let created_at: String = row.get(4)?;
        Ok(TicketRecord {
            ticket_code: row.get::<_, String>(0)?.into(),
            event_id: row.get(1)?,
            transaction_code: TransactionCode::from(row.get::<_, String>(2)?),
            scanned: row.get(3)?,
            created_at: Self::parse_timestamp(&created_at),
        })
    }
}

#[async_trait]
impl FulfillmentStore for SqliteFulfillmentStore {
    async fn insert_transaction(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO transactions (transaction_code, buyer_email, ticket_quantity, delivered, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                record.transaction_code.as_str(),
                record.buyer_email,
                record.ticket_quantity,
                record.delivered,
                record.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Self::map_insert_error(e, record.transaction_code.as_str()))?;
        Ok(())
    }

    async fn insert_ticket(&self, record: &TicketRecord) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO tickets (ticket_code, event_id, transaction_code, scanned, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                record.ticket_code.as_str(),
                record.event_id,
                record.transaction_code.as_str(),
                record.scanned,
                record.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Self::map_insert_error(e, record.ticket_code.as_str()))?;
        Ok(())
    }

    async fn mark_delivered(&self, code: &TransactionCode) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE transactions SET delivered = 1 WHERE transaction_code = ?",
                params![code.as_str()],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if updated == 0 {
            return Err(StoreError::Database(format!(
                "transaction not found: {}",
                code
            )));
        }
        Ok(())
    }

    async fn get_transaction(
        &self,
        code: &TransactionCode,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT transaction_code, buyer_email, ticket_quantity, delivered, created_at FROM transactions WHERE transaction_code = ?",
            params![code.as_str()],
            Self::row_to_transaction,
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn list_tickets(&self, code: &TransactionCode) -> Result<Vec<TicketRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT ticket_code, event_id, transaction_code, scanned, created_at FROM tickets WHERE transaction_code = ? ORDER BY created_at, ticket_code",
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let tickets = stmt
            .query_map(params![code.as_str()], Self::row_to_ticket)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(tickets)
    }
}
