//! Browse tree and listing tables
//!
//! The browse tree is a list of named nodes; a node either carries its
//! children inline, references another node's children by key, or
//! references a listing of series rows. References are resolved by key
//! lookup rather than ownership, so a target may be shared across paths and
//! the structure stays acyclic by construction.

use crate::model::Metadata;

/// One node in the browse tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub title: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Children carried inline.
    Children(Vec<TreeNode>),
    /// Key into the node-reference table; the target's children appear here.
    ChildrenRef(String),
    /// Key into the listing table.
    SeriesRef(String),
}

impl TreeNode {
    pub fn group(title: &str, children: Vec<TreeNode>) -> Self {
        Self {
            title: title.to_string(),
            kind: NodeKind::Children(children),
        }
    }

    pub fn children_ref(title: &str, reference: &str) -> Self {
        Self {
            title: title.to_string(),
            kind: NodeKind::ChildrenRef(reference.to_string()),
        }
    }

    pub fn series_ref(title: &str, reference: &str) -> Self {
        Self {
            title: title.to_string(),
            kind: NodeKind::SeriesRef(reference.to_string()),
        }
    }
}

/// A grouped table of series rows behind one browse reference.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Display-only tab labels.
    pub aspects: Option<Vec<String>>,
    pub groups: Vec<ListingGroup>,
}

#[derive(Debug, Clone)]
pub struct ListingGroup {
    pub name: String,
    pub rows: Vec<ListingRow>,
}

impl ListingGroup {
    pub fn new(name: &str, rows: Vec<ListingRow>) -> Self {
        Self {
            name: name.to_string(),
            rows,
        }
    }
}

/// One row: display hints plus the series names it references.
///
/// A row may reference several names for side-by-side comparison columns;
/// their metadata is resolved at listing time, never cached here.
#[derive(Debug, Clone)]
pub struct ListingRow {
    pub indentation: u32,
    pub emphasis: bool,
    pub space_above: bool,
    pub names: Vec<String>,
}

impl ListingRow {
    pub fn new(names: &[&str]) -> Self {
        Self {
            indentation: 0,
            emphasis: false,
            space_above: false,
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn indented(mut self, levels: u32) -> Self {
        self.indentation = levels;
        self
    }

    pub fn emphasized(mut self) -> Self {
        self.emphasis = true;
        self
    }

    pub fn spaced(mut self) -> Self {
        self.space_above = true;
        self
    }
}

/// A listing with every row's names resolved to current metadata.
///
/// Entity slots are index-aligned with the row's names; a missing series
/// yields `None` rather than failing the listing.
#[derive(Debug, Clone)]
pub struct ResolvedListing {
    pub aspects: Option<Vec<String>>,
    pub groups: Vec<ResolvedGroup>,
}

#[derive(Debug, Clone)]
pub struct ResolvedGroup {
    pub name: String,
    pub rows: Vec<ResolvedRow>,
}

#[derive(Debug, Clone)]
pub struct ResolvedRow {
    pub indentation: u32,
    pub emphasis: bool,
    pub space_above: bool,
    pub names: Vec<String>,
    pub entities: Vec<Option<Metadata>>,
}
