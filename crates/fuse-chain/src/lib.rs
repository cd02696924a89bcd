//! Chain-state access for the Fuse pool indexer.
//!
//! Every contract read made by the reconcilers goes through the
//! `ChainReader` trait: one synchronous call at one block height that
//! either returns data or reverts. No retries happen at this layer.
//!
//! - `bindings`: typed call encodings for the contracts the indexer reads
//! - `reader`: the `ChainReader` seam, `Reverted` and block-pinned calls
//! - `recorded`: a deterministic chain reader answering from captured results

pub mod bindings;
pub mod error;
pub mod reader;
pub mod recorded;

pub use error::{ChainError, ChainResult};
pub use reader::{try_call, BlockView, CallResult, ChainReader, Reverted};
pub use recorded::{RecordedCall, RecordedChain};
