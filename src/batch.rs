//! Batch model: an immutable, ordered selection of files.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static ITEM_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Stable identifier minted when the batch is constructed.
///
/// Progress slots are addressed by batch index, but reports carry the id so
/// items stay unambiguous even if a future flow reorders or removes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(u64);

impl ItemId {
    fn mint() -> Self {
        Self(ITEM_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// One file submitted to the generation operation.
#[derive(Debug, Clone)]
pub struct Item {
    id: ItemId,
    name: String,
}

impl Item {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The ordered set of items selected for one run. Order defines processing
/// order and progress-slot attribution; the batch is immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    items: Vec<Item>,
}

impl Batch {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = names
            .into_iter()
            .map(|name| Item {
                id: ItemId::mint(),
                name: name.into(),
            })
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }
}
