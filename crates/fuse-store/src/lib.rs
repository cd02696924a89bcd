//! Entity storage for the Fuse pool indexer.
//!
//! The reconcilers only need load-by-id, create and save. `InMemoryStore`
//! provides them over an ordered map so that snapshots come out in a
//! stable order; `SnapshotWriter` dumps a store to JSON Lines.

pub mod error;
pub mod store;
pub mod writer;

pub use error::{StoreError, StoreResult};
pub use store::{EntityStore, InMemoryStore};
pub use writer::{read_snapshot, SnapshotWriter};
