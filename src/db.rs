// Record store: JSON documents in SQLite, keyed by (collection, key).

use serde::{de::DeserializeOwned, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;

// Collection names. Users are keyed by email, sessions by token.
pub const PLAYS: &str = "plays";
pub const PLAYBOOKS: &str = "playbooks";
pub const PLAYSHEETS: &str = "playsheets";
pub const USERS: &str = "users";
pub const SESSIONS: &str = "sessions";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt {collection} record {key}: {source}")]
    Corrupt {
        collection: String,
        key: String,
        source: serde_json::Error,
    },
    #[error("failed to encode {collection} record {key}: {source}")]
    Encode {
        collection: String,
        key: String,
        source: serde_json::Error,
    },
}

/// Flat key-value persistence for all collections. Each call is atomic with
/// respect to its own key; there are no cross-collection transactions.
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                collection TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (collection, key)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert or overwrite a record. Overwriting keeps the record's original
    /// rowid, so `list` order reflects first insertion.
    pub async fn put<T: Serialize>(
        &self,
        collection: &str,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            collection: collection.to_string(),
            key: key.to_string(),
            source,
        })?;
        sqlx::query(
            "INSERT INTO records (collection, key, value) VALUES (?, ?, ?) \
             ON CONFLICT(collection, key) DO UPDATE SET value = excluded.value",
        )
        .bind(collection)
        .bind(key)
        .bind(encoded)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM records WHERE collection = ? AND key = ?")
                .bind(collection)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        match raw {
            Some(raw) => {
                let value = serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                    collection: collection.to_string(),
                    key: key.to_string(),
                    source,
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// All records in a collection, in insertion order.
    pub async fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, StoreError> {
        let rows =
            sqlx::query("SELECT key, value FROM records WHERE collection = ? ORDER BY rowid")
                .bind(collection)
                .fetch_all(&self.pool)
                .await?;
        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            let key: String = row.get("key");
            let raw: String = row.get("value");
            let value = serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                collection: collection.to_string(),
                key,
                source,
            })?;
            values.push(value);
        }
        Ok(values)
    }

    /// Delete a record. Returns whether a record was actually removed.
    pub async fn delete(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM records WHERE collection = ? AND key = ?")
            .bind(collection)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{play_id, Play, StoredPlay};

    async fn test_store() -> RecordStore {
        RecordStore::new("sqlite::memory:").await.unwrap()
    }

    fn stored_play(name: &str, tags: Vec<String>) -> StoredPlay {
        StoredPlay {
            id: play_id("offense", name),
            play: Play {
                name: name.to_string(),
                formation: "Gun Trips Right".to_string(),
                personnel: "11".to_string(),
                players: vec![],
                routes: vec![],
                concept: Some("Mesh".to_string()),
                description: None,
            },
            category: "offense".to_string(),
            tags,
        }
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = test_store().await;
        let play = stored_play("Mesh Drive", vec![]);

        store.put(PLAYS, &play.id, &play).await.unwrap();
        let fetched: Option<StoredPlay> = store.get(PLAYS, "offense_mesh_drive").await.unwrap();
        assert_eq!(fetched.unwrap().play.name, "Mesh Drive");

        let missing: Option<StoredPlay> = store.get(PLAYS, "offense_nope").await.unwrap();
        assert!(missing.is_none());

        assert!(store.delete(PLAYS, "offense_mesh_drive").await.unwrap());
        assert!(!store.delete(PLAYS, "offense_mesh_drive").await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_keeps_one_record() {
        let store = test_store().await;
        let first = stored_play("Mesh Drive", vec!["quick".to_string()]);
        let second = stored_play("Mesh Drive", vec!["3rd-down".to_string()]);

        store.put(PLAYS, &first.id, &first).await.unwrap();
        store.put(PLAYS, &second.id, &second).await.unwrap();

        let plays: Vec<StoredPlay> = store.list(PLAYS).await.unwrap();
        assert_eq!(plays.len(), 1);
        assert_eq!(plays[0].tags, vec!["3rd-down".to_string()]);
    }

    #[tokio::test]
    async fn test_list_insertion_order_survives_overwrite() {
        let store = test_store().await;
        let a = stored_play("Alpha", vec![]);
        let b = stored_play("Bravo", vec![]);

        store.put(PLAYS, &a.id, &a).await.unwrap();
        store.put(PLAYS, &b.id, &b).await.unwrap();
        // Overwriting the first record must not move it to the end.
        store.put(PLAYS, &a.id, &a).await.unwrap();

        let plays: Vec<StoredPlay> = store.list(PLAYS).await.unwrap();
        let names: Vec<&str> = plays.iter().map(|p| p.play.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Bravo"]);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = test_store().await;
        let play = stored_play("Mesh Drive", vec![]);
        store.put(PLAYS, &play.id, &play).await.unwrap();

        let playbooks: Vec<serde_json::Value> = store.list(PLAYBOOKS).await.unwrap();
        assert!(playbooks.is_empty());

        let cross: Option<StoredPlay> = store.get(PLAYBOOKS, &play.id).await.unwrap();
        assert!(cross.is_none());
    }
}
