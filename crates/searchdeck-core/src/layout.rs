//! Position-addressed column layout: an ordered, sparse array of report
//! blocks, edited by insert/remove/move commands.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analytics::MetricKind;
use crate::error::CoreError;
use crate::timerange::TimeRange;

/// The layout never shrinks below this many visible slots on load, so a
/// freshly created or sparsely persisted report still presents a usable
/// grid.
pub const MIN_VISIBLE_SLOTS: usize = 3;

/// A user-chosen report column definition: a metric at a time range, or the
/// intent-analysis column. `id` is unique per block instance; uniqueness of
/// (metric, timeRange) across the grid is a [`ColumnLayout`] invariant, not
/// an identity invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Metric {
        #[serde(default)]
        id: String,
        metric: MetricKind,
        #[serde(rename = "timeRange")]
        time_range: TimeRange,
    },
    Intent {
        #[serde(default)]
        id: String,
    },
}

impl Block {
    pub fn id(&self) -> &str {
        match self {
            Block::Metric { id, .. } | Block::Intent { id } => id,
        }
    }

    fn set_id(&mut self, new_id: String) {
        match self {
            Block::Metric { id, .. } | Block::Intent { id } => *id = new_id,
        }
    }

    /// Duplicate-check identity: the (metric, range) pair for metric
    /// blocks, nothing for the intent block.
    fn metric_identity(&self) -> Option<(MetricKind, String)> {
        match self {
            Block::Metric {
                metric, time_range, ..
            } => Some((*metric, time_range.range_key())),
            Block::Intent { .. } => None,
        }
    }
}

/// The mutable report grid: a vector of slots indexed by position, layered
/// over a map from block id to block.
///
/// Two synchronized views on purpose — slots answer "what is at position
/// i", the map answers "which blocks exist" — so resizing slots can never
/// alias or drop block state.
#[derive(Debug, Clone, Default)]
pub struct ColumnLayout {
    slots: Vec<Option<String>>,
    blocks: HashMap<String, Block>,
}

impl ColumnLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// A layout of `MIN_VISIBLE_SLOTS` empty slots, the shape a new report
    /// starts with.
    pub fn empty_grid() -> Self {
        Self {
            slots: vec![None; MIN_VISIBLE_SLOTS],
            blocks: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// The block currently occupying `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Block> {
        self.slots
            .get(index)?
            .as_deref()
            .and_then(|id| self.blocks.get(id))
    }

    /// Non-empty blocks in slot order, with their positions.
    pub fn blocks_in_order(&self) -> impl Iterator<Item = (usize, &Block)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let id = slot.as_deref()?;
            Some((index, self.blocks.get(id)?))
        })
    }

    fn check_duplicate(&self, block: &Block) -> Result<(), CoreError> {
        let Some((metric, range)) = block.metric_identity() else {
            return Ok(());
        };
        let taken = self
            .blocks
            .values()
            .any(|existing| existing.metric_identity() == Some((metric, range.clone())));
        if taken {
            return Err(CoreError::DuplicateMetric { metric, range });
        }
        Ok(())
    }

    fn place(&mut self, mut block: Block, index: usize) -> &Block {
        // Ids supplied by callers are never trusted across reloads; a fresh
        // one guarantees session-wide uniqueness.
        let id = uuid::Uuid::new_v4().to_string();
        block.set_id(id.clone());
        self.slots[index] = Some(id.clone());
        self.blocks.insert(id.clone(), block);
        &self.blocks[&id]
    }

    /// Place `block` at `index`, growing the sparse array when the index is
    /// past the end. Rejects duplicates of an existing (metric, timeRange)
    /// pair before rejecting an occupied slot; a failed edit leaves the
    /// layout untouched.
    pub fn insert_at(&mut self, block: Block, index: usize) -> Result<&Block, CoreError> {
        self.check_duplicate(&block)?;
        if index < self.slots.len() && self.slots[index].is_some() {
            return Err(CoreError::SlotOccupied(index));
        }
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        Ok(self.place(block, index))
    }

    /// Grow the grid by one slot and place `block` in it.
    pub fn append(&mut self, block: Block) -> Result<&Block, CoreError> {
        self.check_duplicate(&block)?;
        self.slots.push(None);
        let index = self.slots.len() - 1;
        Ok(self.place(block, index))
    }

    /// Remove the block with `block_id`. With `compact` the slot itself is
    /// deleted and the tail shifts left by one ("delete column"); without
    /// it the slot is cleared in place, preserving the grid size. Returns
    /// whether a block was removed.
    pub fn remove(&mut self, block_id: &str, compact: bool) -> bool {
        let Some(index) = self
            .slots
            .iter()
            .position(|slot| slot.as_deref() == Some(block_id))
        else {
            return false;
        };
        self.blocks.remove(block_id);
        if compact {
            self.slots.remove(index);
        } else {
            self.slots[index] = None;
        }
        true
    }

    /// Splice-style reorder: the slot at `from` (block or empty) is lifted
    /// out and reinserted at `to`, shifting the slots in between.
    pub fn move_slot(&mut self, from: usize, to: usize) -> bool {
        if from >= self.slots.len() || to >= self.slots.len() {
            return false;
        }
        let slot = self.slots.remove(from);
        self.slots.insert(to, slot);
        true
    }

    /// Rebuild the layout from a persisted column vector on report load.
    ///
    /// The grid gets max(persisted length, minimum visible slots) slots,
    /// each persisted block lands at its recorded position, and every id is
    /// regenerated so ids stay unique within the session even when the same
    /// snapshot is loaded twice.
    pub fn from_persisted(columns: Vec<Option<Block>>) -> Self {
        let len = columns.len().max(MIN_VISIBLE_SLOTS);
        let mut layout = Self {
            slots: vec![None; len],
            blocks: HashMap::new(),
        };
        for (index, column) in columns.into_iter().enumerate() {
            if let Some(block) = column {
                layout.place(block, index);
            }
        }
        layout
    }

    /// The persistable view: one entry per slot, cloned blocks in place.
    pub fn to_columns(&self) -> Vec<Option<Block>> {
        self.slots
            .iter()
            .map(|slot| {
                slot.as_deref()
                    .and_then(|id| self.blocks.get(id))
                    .cloned()
            })
            .collect()
    }
}
