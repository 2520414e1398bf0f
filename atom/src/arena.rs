//! Bucketed node storage with free-list recycling.
//!
//! Nodes live in fixed-size buckets. Released slots are threaded onto a free
//! list through the slot itself and are handed out again before the arena
//! grows. Handles carry a generation so that a handle to a released node can
//! never observe whatever node reuses its slot.
use std::fmt;
use std::ops::{Index, IndexMut};

use tracing::trace;

use crate::node::Node;

/// Number of nodes per bucket unless configured otherwise.
pub const DEFAULT_BUCKET_SIZE: usize = 64;

/// Nesting limit unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Handle to a node in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Position of the node's slot within the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Arena sizing options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Nodes allocated at once whenever the free list runs dry.
    pub bucket_size: usize,
    /// Upper bound on live nodes; `None` means only memory limits growth.
    pub max_nodes: Option<usize>,
    /// Upper bound on the number of ancestors of any node in a tree.
    ///
    /// Printing and copying trees recurse once per level, so this bounds their
    /// stack use.
    pub max_depth: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE,
            max_nodes: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    #[error("out of memory while growing the node arena")]
    OutOfMemory,
    #[error("node arena is limited to {limit} nodes")]
    Exhausted { limit: usize },
}

#[derive(Debug)]
enum Slot {
    /// Link to the next free slot. Only meaningful while the slot is free.
    Free { next: Option<u32> },
    Occupied(Node),
}

#[derive(Debug)]
struct Entry {
    generation: u32,
    slot: Slot,
}

/// Owner of every node of one or more trees.
#[derive(Debug)]
pub struct NodeArena {
    config: ArenaConfig,
    buckets: Vec<Vec<Entry>>,
    free: Option<u32>,
    live: usize,
    epoch: u32,
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeArena {
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    pub fn with_config(config: ArenaConfig) -> Self {
        Self {
            config: ArenaConfig {
                bucket_size: config.bucket_size.max(1),
                max_depth: config.max_depth.max(1),
                ..config
            },
            buckets: Vec::new(),
            free: None,
            live: 0,
            epoch: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Number of live nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots across all buckets, free or not.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len() * self.config.bucket_size
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Stores `node` in a free slot, growing the arena by one bucket if needed.
    pub fn allocate(&mut self, node: Node) -> Result<NodeId, ArenaError> {
        if let Some(limit) = self.config.max_nodes {
            if self.live >= limit {
                return Err(ArenaError::Exhausted { limit });
            }
        }

        let index = match self.free {
            Some(index) => index,
            None => self.grow()?,
        };

        let entry = self.entry_mut(index);
        let next = match entry.slot {
            Slot::Free { next } => next,
            Slot::Occupied(_) => unreachable!("free list points at occupied slot {index}"),
        };
        entry.slot = Slot::Occupied(node);
        let generation = entry.generation;

        self.free = next;
        self.live += 1;
        Ok(NodeId { index, generation })
    }

    /// Returns the node's slot to the free list.
    ///
    /// This does not touch the node's links or children; see
    /// [`NodeArena::delete`] for releasing a whole subtree.
    pub fn release(&mut self, id: NodeId) -> Option<Node> {
        self.get(id)?;

        let free = self.free;
        let entry = self.entry_mut(id.index);
        let Slot::Occupied(node) = std::mem::replace(&mut entry.slot, Slot::Free { next: free })
        else {
            unreachable!("checked slot {id} is occupied");
        };
        entry.generation = entry.generation.wrapping_add(1);

        self.free = Some(id.index);
        self.live -= 1;
        Some(node)
    }

    /// Frees every bucket. All outstanding handles become stale.
    pub fn release_all(&mut self) {
        let newest = self
            .buckets
            .iter()
            .flatten()
            .map(|entry| entry.generation)
            .max()
            .unwrap_or(self.epoch);
        self.epoch = newest.wrapping_add(1);
        self.buckets = Vec::new();
        self.free = None;
        self.live = 0;
        trace!(epoch = self.epoch, "released node arena");
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let entry = self.entry(id.index)?;
        match &entry.slot {
            Slot::Occupied(node) if entry.generation == id.generation => Some(node),
            _ => None,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let size = self.config.bucket_size;
        let entry = self
            .buckets
            .get_mut(id.index() / size)?
            .get_mut(id.index() % size)?;
        match &mut entry.slot {
            Slot::Occupied(node) if entry.generation == id.generation => Some(node),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    fn entry(&self, index: u32) -> Option<&Entry> {
        let size = self.config.bucket_size;
        let index = index as usize;
        self.buckets.get(index / size)?.get(index % size)
    }

    fn entry_mut(&mut self, index: u32) -> &mut Entry {
        let size = self.config.bucket_size;
        let index = index as usize;
        &mut self.buckets[index / size][index % size]
    }

    /// Appends a bucket of free slots and returns the first of them.
    fn grow(&mut self) -> Result<u32, ArenaError> {
        let size = self.config.bucket_size;
        let start = self.capacity();
        let end = start.checked_add(size).ok_or(ArenaError::OutOfMemory)?;
        if end > u32::MAX as usize {
            return Err(ArenaError::OutOfMemory);
        }

        self.buckets
            .try_reserve(1)
            .map_err(|_| ArenaError::OutOfMemory)?;
        let mut bucket = Vec::new();
        bucket
            .try_reserve_exact(size)
            .map_err(|_| ArenaError::OutOfMemory)?;

        for index in start..end {
            let next = if index + 1 < end {
                Some(index as u32 + 1)
            } else {
                self.free
            };
            bucket.push(Entry {
                generation: self.epoch,
                slot: Slot::Free { next },
            });
        }

        self.buckets.push(bucket);
        self.free = Some(start as u32);
        trace!(
            buckets = self.buckets.len(),
            capacity = self.capacity(),
            "grew node arena"
        );
        Ok(start as u32)
    }
}

impl Index<NodeId> for NodeArena {
    type Output = Node;

    #[track_caller]
    fn index(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale node handle {id}"),
        }
    }
}

impl IndexMut<NodeId> for NodeArena {
    #[track_caller]
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("stale node handle {id}"),
        }
    }
}
