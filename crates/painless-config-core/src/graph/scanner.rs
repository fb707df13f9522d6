//! Placeholder scanner
//!
//! Walks a graph and collects every string leaf that a recognizer claims.
//! Mappings are walked by key (in the map's iteration order) and sequences
//! by index. Numbers, booleans and nulls are skipped.

use serde_json::Value;

use super::path::GraphPath;
use crate::error::{ResolveError, ResolveResult};

/// Outcome of matching one string against a placeholder scheme
#[derive(Debug, Clone, PartialEq)]
pub enum Recognized<D> {
    /// The value is a placeholder for this scheme
    Match(D),
    /// The value is an ordinary string
    NotPlaceholder,
    /// The value carries the scheme prefix but does not parse
    Malformed(String),
}

/// How the scanner treats `Recognized::Malformed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Malformed values are left alone as ordinary strings
    Tolerant,
    /// Malformed values abort the scan
    Strict,
}

/// A placeholder found in the graph
#[derive(Debug, Clone, PartialEq)]
pub struct ScanEntry<D> {
    pub path: GraphPath,
    pub descriptor: D,
}

/// Collect every placeholder the recognizer accepts, in traversal order
pub fn scan<D, F>(
    graph: &Value,
    scheme: &'static str,
    mode: ScanMode,
    recognize: F,
) -> ResolveResult<Vec<ScanEntry<D>>>
where
    F: Fn(&str) -> Recognized<D>,
{
    let mut entries = Vec::new();
    visit(graph, &GraphPath::root(), scheme, mode, &recognize, &mut entries)?;
    Ok(entries)
}

fn visit<D, F>(
    node: &Value,
    path: &GraphPath,
    scheme: &'static str,
    mode: ScanMode,
    recognize: &F,
    entries: &mut Vec<ScanEntry<D>>,
) -> ResolveResult<()>
where
    F: Fn(&str) -> Recognized<D>,
{
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                visit(child, &path.key(key.as_str()), scheme, mode, recognize, entries)?;
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                visit(child, &path.index(index), scheme, mode, recognize, entries)?;
            }
        }
        Value::String(text) => match recognize(text) {
            Recognized::Match(descriptor) => entries.push(ScanEntry {
                path: path.clone(),
                descriptor,
            }),
            Recognized::NotPlaceholder => {}
            Recognized::Malformed(reason) => {
                if mode == ScanMode::Strict {
                    return Err(ResolveError::malformed(scheme, path.to_string(), reason));
                }
            }
        },
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}
