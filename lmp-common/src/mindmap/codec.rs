//! Composite id codec
//!
//! Converts engine ids (`"lesson|42"`) into the numeric primary keys the
//! progress tables use, grouped by entity kind.
//!
//! Ids that are empty, have no separator, or have an empty kind or number
//! segment are dropped. An id of a kind with no progress table fails the
//! whole batch.

use super::tree::{EntityKind, NodeId, ID_SEPARATOR};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Numeric ids per progress table, deduplicated in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbIds {
    pub lessons: Vec<i64>,
    pub chapters: Vec<i64>,
    pub subchapters: Vec<i64>,
}

impl DbIds {
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty() && self.chapters.is_empty() && self.subchapters.is_empty()
    }

    /// Total number of ids across all buckets
    pub fn len(&self) -> usize {
        self.lessons.len() + self.chapters.len() + self.subchapters.len()
    }

    /// Rebuild composite ids, lessons first, then subchapters, then chapters
    pub fn to_composite_ids(&self) -> Vec<String> {
        let lessons = self.lessons.iter().map(|id| NodeId::lesson(*id));
        let subchapters = self.subchapters.iter().map(|id| NodeId::subchapter(*id));
        let chapters = self.chapters.iter().map(|id| NodeId::chapter(*id));

        lessons.chain(subchapters).chain(chapters).map(|id| id.to_string()).collect()
    }

    fn push(&mut self, kind: EntityKind, id: i64, raw: &str) -> Result<()> {
        let bucket = match kind {
            EntityKind::Lesson => &mut self.lessons,
            EntityKind::Chapter => &mut self.chapters,
            EntityKind::Subchapter => &mut self.subchapters,
            EntityKind::Subject => return Err(Error::UnknownEntityKind(raw.to_string())),
        };

        if !bucket.contains(&id) {
            bucket.push(id);
        }
        Ok(())
    }
}

/// Group composite ids into numeric ids per progress table
///
/// # Errors
/// - [`Error::UnknownEntityKind`] for any kind other than lesson, chapter
///   or subchapter
/// - [`Error::InvalidInput`] for a non-integer numeric part
pub fn mindmap_ids_to_db_ids<S: AsRef<str>>(ids: &[S]) -> Result<DbIds> {
    let mut db_ids = DbIds::default();

    for raw in ids {
        let raw = raw.as_ref();
        let Some((prefix, suffix)) = raw.split_once(ID_SEPARATOR) else {
            debug!("Skipping unsplittable mindmap id {:?}", raw);
            continue;
        };
        if prefix.is_empty() || suffix.is_empty() {
            debug!("Skipping mindmap id with empty segment {:?}", raw);
            continue;
        }

        let kind = EntityKind::from_prefix(prefix)
            .ok_or_else(|| Error::UnknownEntityKind(raw.to_string()))?;
        let id = suffix
            .parse::<i64>()
            .map_err(|e| Error::InvalidInput(format!("bad numeric id in {:?}: {}", raw, e)))?;

        db_ids.push(kind, id, raw)?;
    }

    Ok(db_ids)
}

/// Typed variant of [`mindmap_ids_to_db_ids`]
pub fn db_ids_from_nodes(ids: &[NodeId]) -> Result<DbIds> {
    let mut db_ids = DbIds::default();
    for node_id in ids {
        db_ids.push(node_id.kind, node_id.id, &node_id.to_string())?;
    }
    Ok(db_ids)
}
