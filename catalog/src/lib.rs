//! Tile Economy Catalog
//!
//! The shared catalog every engine reads: scenes with their derived
//! puzzles and tile-token ranges, optional rarity-class partitions, and
//! box definitions with probability tables and supply caps. The registry
//! also owns the three mutable counters of the economy (scene reward
//! pools, puzzle solve counts, and box supply) behind invariant-keeping
//! mutators.

pub mod boxes;
pub mod registry;
pub mod scene;

pub use boxes::BoxDef;
pub use registry::SceneRegistry;
pub use scene::{Puzzle, Scene, TileClass};

pub type SceneId = u64;
pub type BoxId = u64;
pub type ClassId = u32;
