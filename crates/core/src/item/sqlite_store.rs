//! SQLite-backed item repository.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Type;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{Item, ItemError, ItemRepository, ItemStatus};

/// SQLite-backed item repository.
pub struct SqliteItemRepository {
    conn: Mutex<Connection>,
}

impl SqliteItemRepository {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn new(path: &Path) -> Result<Self, ItemError> {
        let conn = Connection::open(path).map_err(persistence)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory repository (useful for testing).
    pub fn in_memory() -> Result<Self, ItemError> {
        let conn = Connection::open_in_memory().map_err(persistence)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), ItemError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                email TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'NEW'
            );

            CREATE INDEX IF NOT EXISTS idx_items_status ON items(status);
            "#,
        )
        .map_err(persistence)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, ItemError> {
        self.conn
            .lock()
            .map_err(|_| ItemError::Persistence("connection lock poisoned".to_string()))
    }

    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<Item> {
        let id: String = row.get(0)?;
        let name: String = row.get(1)?;
        let description: String = row.get(2)?;
        let email: String = row.get(3)?;
        let status: String = row.get(4)?;

        let id = Uuid::parse_str(&id)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
        let status: ItemStatus = status
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

        Ok(Item {
            id,
            name,
            description,
            email,
            status,
        })
    }
}

fn persistence(e: rusqlite::Error) -> ItemError {
    ItemError::Persistence(e.to_string())
}

impl ItemRepository for SqliteItemRepository {
    fn find_all(&self) -> Result<Vec<Item>, ItemError> {
        let conn = self.connection()?;

        let mut stmt = conn
            .prepare("SELECT id, name, description, email, status FROM items ORDER BY rowid")
            .map_err(persistence)?;

        let rows = stmt.query_map([], Self::row_to_item).map_err(persistence)?;

        let mut items = Vec::new();
        for row_result in rows {
            items.push(row_result.map_err(persistence)?);
        }

        Ok(items)
    }

    fn find_all_ids(&self) -> Result<Vec<Uuid>, ItemError> {
        let conn = self.connection()?;

        let mut stmt = conn
            .prepare("SELECT id FROM items ORDER BY rowid")
            .map_err(persistence)?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(persistence)?;

        let mut ids = Vec::new();
        for row_result in rows {
            let raw = row_result.map_err(persistence)?;
            let id = Uuid::parse_str(&raw)
                .map_err(|e| ItemError::Persistence(format!("Invalid item id '{}': {}", raw, e)))?;
            ids.push(id);
        }

        Ok(ids)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Item>, ItemError> {
        let conn = self.connection()?;

        let result = conn.query_row(
            "SELECT id, name, description, email, status FROM items WHERE id = ?",
            params![id.to_string()],
            Self::row_to_item,
        );

        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(persistence(e)),
        }
    }

    fn save(&self, item: Item) -> Result<Item, ItemError> {
        let conn = self.connection()?;

        // Upsert keeps the rowid, so identifier order stays stable.
        conn.execute(
            "INSERT INTO items (id, name, description, email, status) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                email = excluded.email,
                status = excluded.status",
            params![
                item.id.to_string(),
                item.name,
                item.description,
                item.email,
                item.status.as_str(),
            ],
        )
        .map_err(persistence)?;

        Ok(item)
    }

    fn delete_by_id(&self, id: Uuid) -> Result<(), ItemError> {
        let conn = self.connection()?;

        let deleted = conn
            .execute("DELETE FROM items WHERE id = ?", params![id.to_string()])
            .map_err(persistence)?;

        if deleted == 0 {
            return Err(ItemError::NotFound(id));
        }

        Ok(())
    }
}
