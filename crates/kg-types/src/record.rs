//! Line-delimited record codec.
//!
//! Each non-blank line is one JSON object tagged by `"type"`:
//!
//! ```text
//! {"type":"entity","name":"Alice","entityType":"person","observations":["likes tea"]}
//! {"type":"relation","from":"Alice","to":"Bob","relationType":"knows"}
//! ```

use crate::{check_record, Entity, KnowledgeGraph, Relation, ValidationError};
use serde::{Deserialize, Serialize};

/// One persisted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    Entity(Entity),
    Relation(Relation),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RecordRef<'a> {
    Entity(&'a Entity),
    Relation(&'a Relation),
}

impl Record {
    /// Parse a single line. `line_no` is 1-based and only used for errors.
    pub fn from_line(line: &str, line_no: usize) -> Result<Self, ValidationError> {
        let at_line = |reason: String| ValidationError::Record {
            line: line_no,
            reason,
        };
        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| at_line(e.to_string()))?;
        check_record(&value).map_err(|e| at_line(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| at_line(e.to_string()))
    }
}

/// Decode a whole document. Any bad line fails the whole decode.
pub fn decode_graph(text: &str) -> Result<KnowledgeGraph, ValidationError> {
    let mut graph = KnowledgeGraph::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match Record::from_line(line, idx + 1)? {
            Record::Entity(e) => graph.entities.push(e),
            Record::Relation(r) => graph.relations.push(r),
        }
    }
    Ok(graph)
}

/// Encode every entity, then every relation, one record per line.
pub fn encode_graph(graph: &KnowledgeGraph) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    let records = graph
        .entities
        .iter()
        .map(RecordRef::Entity)
        .chain(graph.relations.iter().map(RecordRef::Relation));
    for record in records {
        out.push_str(&serde_json::to_string(&record)?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tagged_lines_and_skips_blanks() {
        let text = concat!(
            r#"{"type":"relation","from":"Alice","to":"Bob","relationType":"knows"}"#,
            "\n\n   \n",
            r#"{"type":"entity","name":"Alice","entityType":"person","observations":["likes tea"]}"#,
            "\n",
        );
        let graph = decode_graph(text).unwrap();
        assert_eq!(
            graph.entities,
            vec![Entity::new("Alice", "person", vec!["likes tea".into()])]
        );
        assert_eq!(graph.relations, vec![Relation::new("Alice", "Bob", "knows")]);
    }

    #[test]
    fn encode_writes_entities_before_relations() {
        let graph = KnowledgeGraph {
            entities: vec![Entity::new("A", "t", vec![])],
            relations: vec![Relation::new("A", "B", "r")],
        };
        let text = encode_graph(&graph).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"type":"entity","name":"A","entityType":"t","observations":[]}"#
        );
        assert_eq!(
            lines[1],
            r#"{"type":"relation","from":"A","to":"B","relationType":"r"}"#
        );
    }

    #[test]
    fn untagged_or_misshaped_records_fail_with_line_number() {
        let err = decode_graph("{\"name\":\"A\"}").unwrap_err();
        assert!(matches!(err, ValidationError::Record { line: 1, .. }));

        let text = concat!(
            r#"{"type":"entity","name":"A","entityType":"t","observations":[]}"#,
            "\n",
            r#"{"type":"entity","name":"B","entityType":"t","observations":[1, 2]}"#,
        );
        let err = decode_graph(text).unwrap_err();
        assert!(matches!(err, ValidationError::Record { line: 2, .. }));
    }

    #[test]
    fn missing_field_is_rejected() {
        let err = decode_graph(r#"{"type":"relation","from":"A","to":"B"}"#).unwrap_err();
        match err {
            ValidationError::Record { reason, .. } => assert!(reason.contains("relationType")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_strings_survive_a_round_trip() {
        let line = r#"{"type":"entity","name":"A","entityType":"","observations":[""]}"#;
        let graph = decode_graph(line).unwrap();
        assert_eq!(graph.entities, vec![Entity::new("A", "", vec![String::new()])]);
        assert_eq!(encode_graph(&graph).unwrap().trim_end(), line);
    }

    #[test]
    fn empty_document_is_empty_graph() {
        assert!(decode_graph("").unwrap().is_empty());
        assert_eq!(encode_graph(&KnowledgeGraph::new()).unwrap(), "");
    }
}
