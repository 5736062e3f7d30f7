//! SQLite-backed graph storage.

use async_trait::async_trait;
use kg_types::{
    check_observations, Entity, GraphStorage, KgError, KnowledgeGraph, Relation, ValidationError,
};
use std::path::Path;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS entities (
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    observations TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS relations (
    position INTEGER NOT NULL,
    from_entity TEXT NOT NULL,
    to_entity TEXT NOT NULL,
    relation_type TEXT NOT NULL
);
"#;

/// Stores the graph in two tables. Every save replaces all rows in one
/// transaction; `position` keeps insertion order.
pub struct SqliteGraphStorage {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteGraphStorage {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, KgError> {
        let conn = rusqlite::Connection::open(path).map_err(backend)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, KgError> {
        let conn = rusqlite::Connection::open_in_memory().map_err(backend)?;
        Self::init(conn)
    }

    fn init(conn: rusqlite::Connection) -> Result<Self, KgError> {
        conn.execute_batch(SCHEMA).map_err(backend)?;
        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, KgError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| KgError::Backend(format!("failed to acquire lock: {}", e)))?;
        f(&conn).map_err(backend)
    }
}

fn backend(e: rusqlite::Error) -> KgError {
    KgError::Backend(e.to_string())
}

type EntityRow = (String, String, String);

#[async_trait]
impl GraphStorage for SqliteGraphStorage {
    async fn load(&self) -> Result<KnowledgeGraph, KgError> {
        let (entity_rows, relations) = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name, entity_type, observations FROM entities ORDER BY position",
            )?;
            let entity_rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                .collect::<Result<Vec<EntityRow>, _>>()?;

            let mut stmt = conn.prepare(
                "SELECT from_entity, to_entity, relation_type FROM relations ORDER BY position",
            )?;
            let relations = stmt
                .query_map([], |row| {
                    Ok(Relation {
                        from: row.get(0)?,
                        to: row.get(1)?,
                        relation_type: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok((entity_rows, relations))
        })?;

        let mut entities = Vec::with_capacity(entity_rows.len());
        for (idx, (name, entity_type, observations)) in entity_rows.into_iter().enumerate() {
            let at_row = |reason: String| ValidationError::Record {
                line: idx + 1,
                reason,
            };
            let value: serde_json::Value =
                serde_json::from_str(&observations).map_err(|e| at_row(e.to_string()))?;
            check_observations(&value).map_err(|e| at_row(e.to_string()))?;
            let observations: Vec<String> =
                serde_json::from_value(value).map_err(|e| at_row(e.to_string()))?;
            entities.push(Entity {
                name,
                entity_type,
                observations,
            });
        }
        Ok(KnowledgeGraph {
            entities,
            relations,
        })
    }

    async fn save(&self, graph: &KnowledgeGraph) -> Result<(), KgError> {
        let encoded = graph
            .entities
            .iter()
            .map(|e| serde_json::to_string(&e.observations))
            .collect::<Result<Vec<_>, _>>()?;

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute("DELETE FROM entities", [])?;
            tx.execute("DELETE FROM relations", [])?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO entities (position, name, entity_type, observations) VALUES (?1, ?2, ?3, ?4)",
                )?;
                for (pos, (entity, observations)) in
                    graph.entities.iter().zip(&encoded).enumerate()
                {
                    stmt.execute(rusqlite::params![
                        pos as i64,
                        entity.name,
                        entity.entity_type,
                        observations
                    ])?;
                }
                let mut stmt = tx.prepare(
                    "INSERT INTO relations (position, from_entity, to_entity, relation_type) VALUES (?1, ?2, ?3, ?4)",
                )?;
                for (pos, relation) in graph.relations.iter().enumerate() {
                    stmt.execute(rusqlite::params![
                        pos as i64,
                        relation.from,
                        relation.to,
                        relation.relation_type
                    ])?;
                }
            }
            tx.commit()
        })?;
        tracing::debug!(
            entities = graph.entities.len(),
            relations = graph.relations.len(),
            "graph saved to sqlite"
        );
        Ok(())
    }
}
