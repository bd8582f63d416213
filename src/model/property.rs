//! Property arenas.
//!
//! Tasks and resources form trees addressed by dotted full ids
//! (`sw.compile.link`). A [`PropertySet`] stores one property type in
//! declaration order and indexes it by full id; tree edges are parent
//! indices on the items themselves.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::SourceRef;

/// A textual reference to another property, kept together with the
/// location of the use site so late resolution can still point at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRef {
    pub text: SmolStr,
    pub at: SourceRef,
}

impl PathRef {
    pub fn new(text: impl Into<SmolStr>, at: SourceRef) -> Self {
        Self { text: text.into(), at }
    }
}

/// Anything stored in a [`PropertySet`].
pub trait Property {
    /// Dotted path from the tree root. Unique within one set.
    fn full_id(&self) -> &SmolStr;
}

/// Arena for one property type. Items are addressed by insertion index;
/// indices stay stable because nothing is ever removed during a parse.
#[derive(Debug)]
pub struct PropertySet<T> {
    items: Vec<T>,
    index: FxHashMap<SmolStr, usize>,
}

impl<T> Default for PropertySet<T> {
    fn default() -> Self {
        Self { items: Vec::new(), index: FxHashMap::default() }
    }
}

impl<T: Property> PropertySet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item. Fails with the offending full id when one with the
    /// same full id already exists.
    pub fn insert(&mut self, item: T) -> Result<usize, SmolStr> {
        let full_id = item.full_id().clone();
        if self.index.contains_key(&full_id) {
            return Err(full_id);
        }
        let position = self.items.len();
        self.index.insert(full_id, position);
        self.items.push(item);
        Ok(position)
    }

    pub fn lookup(&self, full_id: &str) -> Option<usize> {
        self.index.get(full_id).copied()
    }

    pub fn get(&self, position: usize) -> &T {
        &self.items[position]
    }

    pub fn get_mut(&mut self, position: usize) -> &mut T {
        &mut self.items[position]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}
