//! Chain reader backed by captured call results.
//!
//! Answers each `(contract, calldata)` pair from a table of responses,
//! optionally restricted to a block range. Calls without a recorded
//! response revert, which is exactly how a missing method behaves on chain.
//! Responses registered later take precedence over earlier ones covering
//! the same block, so a fixture can model state changing over time.

use crate::error::{ChainError, ChainResult};
use crate::reader::{CallResult, ChainReader, Reverted};
use alloy::primitives::{Address, Bytes};
use alloy::sol_types::{SolCall, SolType};
use fuse_core::ids::display_fromstr;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One captured call result, as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedCall {
    #[serde(with = "display_fromstr")]
    pub to: Address,
    /// `0x`-prefixed calldata.
    pub calldata: String,
    /// First block this response applies to (inclusive).
    #[serde(default)]
    pub from_block: Option<u64>,
    /// Last block this response applies to (inclusive).
    #[serde(default)]
    pub to_block: Option<u64>,
    /// `0x`-prefixed return data; absent when the call reverted.
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
struct Response {
    from_block: u64,
    to_block: u64,
    output: Option<Bytes>,
}

impl Response {
    fn covers(&self, block: u64) -> bool {
        self.from_block <= block && block <= self.to_block
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordedFile {
    calls: Vec<RecordedCall>,
}

/// Deterministic `ChainReader` for replay and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordedChain {
    responses: HashMap<(Address, Bytes), Vec<Response>>,
}

impl RecordedChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load captured responses from a JSON file (`{"calls": [...]}`).
    pub fn from_file(path: impl AsRef<Path>) -> ChainResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> ChainResult<Self> {
        let file: RecordedFile = serde_json::from_str(json)?;
        let mut chain = Self::new();
        for call in file.calls {
            let calldata = decode_hex("calldata", &call.calldata)?;
            let output = call
                .output
                .as_deref()
                .map(|hex| decode_hex("output", hex))
                .transpose()?;
            chain.insert(
                call.to,
                calldata,
                call.from_block.unwrap_or(0),
                call.to_block.unwrap_or(u64::MAX),
                output,
            );
        }
        Ok(chain)
    }

    /// Serialize the table back into the on-disk form.
    pub fn to_json(&self) -> ChainResult<String> {
        let mut calls = Vec::new();
        for ((to, calldata), responses) in &self.responses {
            for response in responses {
                calls.push(RecordedCall {
                    to: *to,
                    calldata: format!("0x{}", hex::encode(calldata)),
                    from_block: Some(response.from_block),
                    to_block: Some(response.to_block),
                    output: response
                        .output
                        .as_ref()
                        .map(|o| format!("0x{}", hex::encode(o))),
                });
            }
        }
        calls.sort_by(|a, b| (a.to, &a.calldata).cmp(&(b.to, &b.calldata)));
        Ok(serde_json::to_string_pretty(&RecordedFile { calls })?)
    }

    /// Answer `call` on `to` with `value` at every block.
    pub fn respond<'a, C: SolCall>(
        &mut self,
        to: Address,
        call: &C,
        value: &'a <C::ReturnTuple<'a> as SolType>::RustType,
    ) -> &mut Self {
        self.respond_between(to, call, 0, u64::MAX, value)
    }

    /// Answer `call` on `to` with `value` for blocks in `from..=to_block`.
    pub fn respond_between<'a, C: SolCall>(
        &mut self,
        to: Address,
        call: &C,
        from_block: u64,
        to_block: u64,
        value: &'a <C::ReturnTuple<'a> as SolType>::RustType,
    ) -> &mut Self {
        let output = C::abi_encode_returns(value);
        self.insert(
            to,
            call.abi_encode().into(),
            from_block,
            to_block,
            Some(output.into()),
        );
        self
    }

    /// Make `call` on `to` revert at every block.
    pub fn revert<C: SolCall>(&mut self, to: Address, call: &C) -> &mut Self {
        self.insert(to, call.abi_encode().into(), 0, u64::MAX, None);
        self
    }

    /// Number of distinct `(contract, calldata)` pairs recorded.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    fn insert(
        &mut self,
        to: Address,
        calldata: Bytes,
        from_block: u64,
        to_block: u64,
        output: Option<Bytes>,
    ) {
        self.responses
            .entry((to, calldata))
            .or_default()
            .push(Response {
                from_block,
                to_block,
                output,
            });
    }
}

impl ChainReader for RecordedChain {
    fn call(&self, to: Address, calldata: &[u8], block: u64) -> CallResult<Bytes> {
        let key = (to, Bytes::copy_from_slice(calldata));
        self.responses
            .get(&key)
            .and_then(|responses| responses.iter().rev().find(|r| r.covers(block)))
            .and_then(|r| r.output.clone())
            .ok_or(Reverted)
    }
}

fn decode_hex(field: &'static str, value: &str) -> ChainResult<Bytes> {
    let trimmed = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(trimmed)
        .map(Bytes::from)
        .map_err(|e| ChainError::InvalidHex {
            field,
            reason: e.to_string(),
        })
}
