//! JSONL file-backed graph storage.

use async_trait::async_trait;
use kg_types::{decode_graph, encode_graph, GraphStorage, KgError, KnowledgeGraph};
use std::path::{Path, PathBuf};

/// Stores the graph as one JSON record per line in a single file.
///
/// Saves write a sibling `.tmp` file and rename it over the target, so readers
/// see either the previous or the new graph, never a truncated one.
pub struct JsonlGraphStorage {
    path: PathBuf,
}

impl JsonlGraphStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

#[async_trait]
impl GraphStorage for JsonlGraphStorage {
    async fn load(&self) -> Result<KnowledgeGraph, KgError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "graph file missing, starting empty");
                return Ok(KnowledgeGraph::new());
            }
            Err(e) => return Err(KgError::Storage(e)),
        };
        let graph = decode_graph(&content)?;
        tracing::debug!(
            path = %self.path.display(),
            entities = graph.entities.len(),
            relations = graph.relations.len(),
            "graph loaded"
        );
        Ok(graph)
    }

    async fn save(&self, graph: &KnowledgeGraph) -> Result<(), KgError> {
        let text = encode_graph(graph)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.temp_path();
        let written = match tokio::fs::write(&tmp, text.as_bytes()).await {
            Ok(()) => tokio::fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(KgError::Storage(e));
        }
        tracing::debug!(
            path = %self.path.display(),
            entities = graph.entities.len(),
            relations = graph.relations.len(),
            "graph saved"
        );
        Ok(())
    }
}
