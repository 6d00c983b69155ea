//! Mindmap tree node model
//!
//! A `MindmapTree` is one node of a learner's progress tree. Trees are plain
//! nested values without parent pointers; ancestry is computed on demand by
//! the navigation functions.
//!
//! The serialized form matches the JSON contract consumed by the UI layer:
//! ids are `"<kind>|<numericId>"` strings and attributes are camelCase.

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Separator between kind and numeric id in a composite id
pub const ID_SEPARATOR: char = '|';

/// Kind of curriculum entity a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Subject,
    Chapter,
    Subchapter,
    Lesson,
}

impl EntityKind {
    /// Prefix used in composite ids
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Subject => "subject",
            EntityKind::Chapter => "chapter",
            EntityKind::Subchapter => "subchapter",
            EntityKind::Lesson => "lesson",
        }
    }

    /// Parse a composite id prefix (exact, case-sensitive)
    pub fn from_prefix(s: &str) -> Option<Self> {
        match s {
            "subject" => Some(EntityKind::Subject),
            "chapter" => Some(EntityKind::Chapter),
            "subchapter" => Some(EntityKind::Subchapter),
            "lesson" => Some(EntityKind::Lesson),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed composite identifier of a tree node
///
/// Unique across a tree: numeric ids are unique per kind and the kind is
/// part of the key. Renders as `"lesson|42"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub kind: EntityKind,
    pub id: i64,
}

impl NodeId {
    pub fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }

    pub fn lesson(id: i64) -> Self {
        Self::new(EntityKind::Lesson, id)
    }

    pub fn subchapter(id: i64) -> Self {
        Self::new(EntityKind::Subchapter, id)
    }

    pub fn chapter(id: i64) -> Self {
        Self::new(EntityKind::Chapter, id)
    }

    pub fn subject(id: i64) -> Self {
        Self::new(EntityKind::Subject, id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.kind, ID_SEPARATOR, self.id)
    }
}

impl FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (prefix, suffix) = s.split_once(ID_SEPARATOR).ok_or_else(|| {
            Error::InvalidInput(format!("missing '{}' in mindmap id {:?}", ID_SEPARATOR, s))
        })?;

        let kind = EntityKind::from_prefix(prefix)
            .ok_or_else(|| Error::UnknownEntityKind(s.to_string()))?;

        let id = suffix
            .parse::<i64>()
            .map_err(|e| Error::InvalidInput(format!("bad numeric id in {:?}: {}", s, e)))?;

        Ok(NodeId { kind, id })
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Learner progress marker for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressState {
    /// Not yet reachable
    #[default]
    Locked,
    /// Active node the learner should work on next
    InProgress,
    /// Completed
    Done,
}

impl ProgressState {
    /// Parse a stored state value
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "LOCKED" => Some(ProgressState::Locked),
            "IN_PROGRESS" => Some(ProgressState::InProgress),
            "DONE" => Some(ProgressState::Done),
            _ => None,
        }
    }

    /// Convert to database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            ProgressState::Locked => "LOCKED",
            ProgressState::InProgress => "IN_PROGRESS",
            ProgressState::Done => "DONE",
        }
    }

    /// Resolve a raw stored value to a state
    ///
    /// Every builder goes through this function: no progress row means the
    /// learner has never visited the node, and an unparsable value is treated
    /// the same way. Both resolve to `Locked`.
    pub fn resolve(raw: Option<&str>) -> Self {
        match raw {
            None => ProgressState::Locked,
            Some(s) => Self::from_db_str(s).unwrap_or_else(|| {
                warn!("Unrecognized progress state {:?}, treating as LOCKED", s);
                ProgressState::Locked
            }),
        }
    }
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Node attributes
///
/// Only `state`, `no_popup` and `id` are read by the engine. The layout
/// fields belong to the renderer and are carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAttributes {
    pub state: ProgressState,
    #[serde(default)]
    pub no_popup: bool,
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_siblings: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_parent: Option<bool>,
}

/// One node of a learner's progress tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindmapTree {
    pub id: NodeId,
    pub name: String,
    pub attributes: NodeAttributes,
    #[serde(default)]
    pub children: Vec<MindmapTree>,
}

impl MindmapTree {
    /// Create a leaf node with default presentation attributes
    pub fn new(id: NodeId, name: impl Into<String>, state: ProgressState) -> Self {
        Self {
            id,
            name: name.into(),
            attributes: NodeAttributes {
                state,
                id: id.id,
                ..NodeAttributes::default()
            },
            children: Vec::new(),
        }
    }

    /// Builder-style setter for the pass-through flag
    pub fn with_no_popup(mut self, no_popup: bool) -> Self {
        self.attributes.no_popup = no_popup;
        self
    }

    /// Builder-style setter for children
    pub fn with_children(mut self, children: Vec<MindmapTree>) -> Self {
        self.children = children;
        self
    }

    pub fn state(&self) -> ProgressState {
        self.attributes.state
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in this subtree, including `self`
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MindmapTree::node_count).sum::<usize>()
    }
}
