//! Details Tree Builder
//!
//! Flattens a document into the ordered, depth-annotated node sequence
//! the details panel renders. Each node is a leaf (`string` / `date`)
//! or a group-opening `title`; group-opening nodes and most leaves
//! carry a block id the consumer uses to toggle subtree visibility.
//!
//! Trees are always rebuilt from scratch for the current document
//! state, never patched incrementally, so the ordering and numbering
//! invariants hold by construction. `build_stub` is the cheap variant
//! used straight after a lookup, before the user asks for the full
//! view.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Document, FieldValue, ValueClass};

/// Identifier field, never rendered at any depth.
const ID_FIELD: &str = "_id";

/// Separator for primitive-array leaf values.
const ARRAY_JOIN: &str = ", ";

/// Rendered node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Date,
    Title,
}

/// One row of the rendered tree.
///
/// `key` is set for nodes that came from a named field and absent for
/// array elements; `display_name` is the key verbatim or empty. Leaf
/// nodes carry `value`; title nodes carry `expanded` when they open an
/// array group that starts collapsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub display_name: String,
    pub kind: FieldKind,
    pub depth: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub block_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
}

/// The flattened document a consumer renders.
///
/// `keys` maps each rendered top-level field to the index of its first
/// node in `fields`, giving O(1) presence checks for addable-field
/// computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsTree {
    pub id: String,
    pub title: String,
    pub keys: BTreeMap<String, usize>,
    pub fields: Vec<FieldNode>,
}

impl DetailsTree {
    /// Which of the configured comma-delimited field names are not yet
    /// present in the document. Present fields are edited instead of
    /// added.
    pub fn addable_fields(&self, configured: &str) -> Vec<String> {
        configured
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty() && !self.keys.contains_key(*field))
            .map(str::to_string)
            .collect()
    }
}

/// Build the fully expanded tree for a document.
///
/// Deterministic: the block counter starts at zero for every call and
/// is never shared across calls, so the same document and title field
/// always produce the same node sequence.
pub fn build(document: &Document, title_field: &str) -> DetailsTree {
    let mut ctx = BuildContext::default();

    for (key, value) in document.iter() {
        if key == ID_FIELD {
            continue;
        }
        ctx.keys.insert(key.clone(), ctx.nodes.len());
        walk(Some(key), value, 0, &mut ctx);
    }

    DetailsTree {
        id: tree_id(document),
        title: tree_title(document, title_field),
        keys: ctx.keys,
        fields: ctx.nodes,
    }
}

/// Build the identity-only stub: id and title populated, fields and
/// keys left empty until the full view is requested.
pub fn build_stub(document: &Document, title_field: &str) -> DetailsTree {
    DetailsTree {
        id: tree_id(document),
        title: tree_title(document, title_field),
        keys: BTreeMap::new(),
        fields: Vec::new(),
    }
}

fn tree_id(document: &Document) -> String {
    document.display_id().unwrap_or_default()
}

fn tree_title(document: &Document, title_field: &str) -> String {
    document
        .get_path(title_field)
        .map(FieldValue::display_text)
        .or_else(|| document.display_id())
        .unwrap_or_default()
}

/// Build state threaded through the recursion explicitly, so the
/// counter is local to one call and the walk stays reentrant.
#[derive(Default)]
struct BuildContext {
    next_block_id: u64,
    nodes: Vec<FieldNode>,
    keys: BTreeMap<String, usize>,
}

impl BuildContext {
    /// Claim a block id and advance the counter.
    fn next_block(&mut self) -> u64 {
        let id = self.next_block_id;
        self.next_block_id += 1;
        id
    }

    /// The counter as-is, for leaves that do not consume an id.
    fn current_block(&self) -> u64 {
        self.next_block_id
    }

    fn push_leaf(
        &mut self,
        key: Option<&str>,
        kind: FieldKind,
        text: String,
        depth: u32,
        block_id: u64,
    ) {
        self.nodes.push(FieldNode {
            key: key.map(str::to_string),
            display_name: key.unwrap_or_default().to_string(),
            kind,
            depth,
            value: Some(text),
            block_id,
            expanded: None,
        });
    }

    fn push_title(&mut self, key: Option<&str>, depth: u32, block_id: u64, expanded: Option<bool>) {
        self.nodes.push(FieldNode {
            key: key.map(str::to_string),
            display_name: key.unwrap_or_default().to_string(),
            kind: FieldKind::Title,
            depth,
            value: None,
            block_id,
            expanded,
        });
    }
}

/// One step of the flattening recursion.
///
/// Depth rules: object fields nest one level deeper than their parent;
/// arrays recurse into elements at their own depth, so only the objects
/// inside them add depth. Block ids: titles, date leaves, and plain
/// scalar leaves consume an id; binary, boxed-scalar, and
/// primitive-array leaves record the current counter without advancing
/// it.
fn walk(key: Option<&str>, value: &FieldValue, depth: u32, ctx: &mut BuildContext) {
    if key == Some(ID_FIELD) {
        return;
    }

    match value.classify() {
        ValueClass::Binary | ValueClass::BoxedScalar => {
            let block_id = ctx.current_block();
            ctx.push_leaf(key, FieldKind::String, value.display_text(), depth, block_id);
        }
        ValueClass::PrimitiveArray => {
            let block_id = ctx.current_block();
            ctx.push_leaf(key, FieldKind::String, join_primitives(value), depth, block_id);
        }
        ValueClass::ObjectArray => {
            if key.is_some() {
                let block_id = ctx.next_block();
                ctx.push_title(key, depth, block_id, Some(false));
            }
            if let FieldValue::Array(items) = value {
                for item in items {
                    walk(None, item, depth, ctx);
                }
            }
        }
        ValueClass::Date => {
            let block_id = ctx.next_block();
            ctx.push_leaf(key, FieldKind::Date, value.display_text(), depth, block_id);
        }
        ValueClass::Object => {
            if let FieldValue::Object(fields) = value {
                if key.is_some() && !fields.is_empty() {
                    let block_id = ctx.next_block();
                    ctx.push_title(key, depth, block_id, None);
                }
                for (child_key, child_value) in fields.iter() {
                    walk(Some(child_key), child_value, depth + 1, ctx);
                }
            }
        }
        ValueClass::Scalar => {
            let block_id = ctx.next_block();
            ctx.push_leaf(key, FieldKind::String, value.display_text(), depth, block_id);
        }
    }
}

fn join_primitives(value: &FieldValue) -> String {
    match value {
        FieldValue::Array(items) => items
            .iter()
            .map(FieldValue::display_text)
            .collect::<Vec<_>>()
            .join(ARRAY_JOIN),
        other => other.display_text(),
    }
}
