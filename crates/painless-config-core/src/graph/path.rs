//! Addressable locations inside a configuration graph

use std::fmt;

use serde_json::Value;

/// One step from a container to a child
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Property of a mapping
    Key(String),
    /// Element of a sequence
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Location of a value in the graph, from the root down
///
/// Paths are kept as segments so that a key containing a literal `.` never
/// collides with a nested location. The dotted form produced by `Display`
/// is only for messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GraphPath {
    segments: Vec<Segment>,
}

impl GraphPath {
    /// The root of the graph
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from segments
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Path of a mapping property below this one
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.into()));
        Self { segments }
    }

    /// Path of a sequence element below this one
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Borrow the value at this path
    pub fn locate<'a>(&self, graph: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(graph, |node, segment| match (segment, node) {
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            (Segment::Index(index), Value::Array(items)) => items.get(*index),
            _ => None,
        })
    }

    /// Mutably borrow the value at this path
    ///
    /// Never creates intermediate structure: if any step is missing the
    /// result is `None`.
    pub fn locate_mut<'a>(&self, graph: &'a mut Value) -> Option<&'a mut Value> {
        self.segments.iter().try_fold(graph, |node, segment| match (segment, node) {
            (Segment::Key(key), Value::Object(map)) => map.get_mut(key),
            (Segment::Index(index), Value::Array(items)) => items.get_mut(*index),
            _ => None,
        })
    }

    /// Replace the value at this path, returning whether the location existed
    pub fn replace(&self, graph: &mut Value, value: Value) -> bool {
        match self.locate_mut(graph) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for GraphPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
