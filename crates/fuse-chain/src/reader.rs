//! The chain-state reader seam.

use alloy::primitives::{Address, Bytes};
use alloy::sol_types::SolCall;
use fuse_telemetry::Metrics;
use thiserror::Error;
use tracing::debug;

/// A contract read that failed and returned no usable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("call reverted")]
pub struct Reverted;

/// Result of a single fallible contract read.
pub type CallResult<T> = Result<T, Reverted>;

/// Synchronous, fallible contract reads pinned to a block height.
#[cfg_attr(test, mockall::automock)]
pub trait ChainReader {
    /// Execute `calldata` against `to` at `block` and return the raw output.
    fn call(&self, to: Address, calldata: &[u8], block: u64) -> CallResult<Bytes>;
}

/// Encode `call`, execute it, and decode the return value.
///
/// An output that does not decode as the declared return type is treated
/// the same as a revert.
pub fn try_call<C: SolCall>(
    reader: &dyn ChainReader,
    to: Address,
    call: &C,
    block: u64,
) -> CallResult<C::Return> {
    let calldata = call.abi_encode();
    let output = reader.call(to, &calldata, block).map_err(|reverted| {
        debug!(%to, block, method = C::SIGNATURE, "Call reverted");
        Metrics::call_reverted(C::SIGNATURE);
        reverted
    })?;

    C::abi_decode_returns(&output, true).map_err(|e| {
        debug!(%to, block, method = C::SIGNATURE, error = %e, "Undecodable call output");
        Metrics::call_reverted(C::SIGNATURE);
        Reverted
    })
}

/// A chain reader pinned to one block.
///
/// One reconciliation step reads everything at the block of the event
/// being processed; this keeps that block out of every call site.
#[derive(Clone, Copy)]
pub struct BlockView<'a> {
    reader: &'a dyn ChainReader,
    block: u64,
}

impl<'a> BlockView<'a> {
    pub fn new(reader: &'a dyn ChainReader, block: u64) -> Self {
        Self { reader, block }
    }

    #[inline]
    pub fn block(&self) -> u64 {
        self.block
    }

    /// `try_call` at this view's block.
    pub fn call<C: SolCall>(&self, to: Address, call: &C) -> CallResult<C::Return> {
        try_call(self.reader, to, call, self.block)
    }
}
