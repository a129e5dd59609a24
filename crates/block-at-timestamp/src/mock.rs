//! An in-memory chain implementing `ChainReader`, with read counters, for unit tests.

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use alloy_primitives::U256;

use crate::{
    block::Block,
    error::NetworkError,
    search::{SearchEvent, SearchObserver},
    source::ChainReader,
};

#[derive(Debug)]
enum Timestamps {
    Linear { len: u64, genesis: u64, interval: u64 },
    Explicit(Vec<u64>),
}

#[derive(Debug)]
pub(crate) struct MockChain {
    timestamps: Timestamps,
    fail_at: Option<U256>,
    head_reads: AtomicUsize,
    block_reads: AtomicUsize,
}

impl MockChain {
    /// Block `n` at `genesis + interval * n`, for `n` in `0..len`.
    pub(crate) fn linear(len: u64, genesis: u64, interval: u64) -> Self {
        Self::with(Timestamps::Linear {
            len,
            genesis,
            interval,
        })
    }

    pub(crate) fn from_timestamps(timestamps: Vec<u64>) -> Self {
        Self::with(Timestamps::Explicit(timestamps))
    }

    fn with(timestamps: Timestamps) -> Self {
        Self {
            timestamps,
            fail_at: None,
            head_reads: AtomicUsize::new(0),
            block_reads: AtomicUsize::new(0),
        }
    }

    /// Make reads of block `number` fail with an RPC error.
    pub(crate) fn failing_at(mut self, number: u64) -> Self {
        self.fail_at = Some(U256::from(number));
        self
    }

    pub(crate) fn len(&self) -> u64 {
        match &self.timestamps {
            Timestamps::Linear { len, .. } => *len,
            Timestamps::Explicit(timestamps) => timestamps.len() as u64,
        }
    }

    pub(crate) fn timestamp(&self, number: u64) -> Option<u64> {
        match &self.timestamps {
            Timestamps::Linear {
                len,
                genesis,
                interval,
            } => (number < *len).then(|| genesis + interval * number),
            Timestamps::Explicit(timestamps) => timestamps.get(number as usize).copied(),
        }
    }

    pub(crate) fn head_reads(&self) -> usize {
        self.head_reads.load(Ordering::SeqCst)
    }

    pub(crate) fn block_reads(&self) -> usize {
        self.block_reads.load(Ordering::SeqCst)
    }

    pub(crate) fn reads(&self) -> usize {
        self.head_reads() + self.block_reads()
    }
}

impl ChainReader for MockChain {
    async fn current_block_number(&self) -> Result<U256, NetworkError> {
        self.head_reads.fetch_add(1, Ordering::SeqCst);
        Ok(U256::from(self.len().saturating_sub(1)))
    }

    async fn block(&self, number: U256) -> Result<Block, NetworkError> {
        self.block_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(number) {
            return Err(NetworkError::Rpc {
                code: -32000,
                message: "header not found".to_string(),
            });
        }
        let timestamp = u64::try_from(number)
            .ok()
            .and_then(|n| self.timestamp(n))
            .ok_or(NetworkError::BlockNotFound(number))?;
        Ok(Block::new(number, U256::from(timestamp)))
    }
}

/// Records every event as a line of text, plus the blocks probed.
#[derive(Debug, Default)]
pub(crate) struct RecordingObserver {
    pub(crate) events: Mutex<Vec<String>>,
    pub(crate) probes: Mutex<Vec<Block>>,
}

impl SearchObserver for RecordingObserver {
    fn on_event(&self, event: &SearchEvent<'_>) {
        let line = match event {
            SearchEvent::Started { .. } => "started".to_string(),
            SearchEvent::Check { probe, .. } => {
                self.probes.lock().unwrap().push(*probe);
                format!("check {}", probe.number)
            }
            SearchEvent::Found { block, outcome } => format!("found {} {outcome}", block.number),
            SearchEvent::Failed { .. } => "failed".to_string(),
            SearchEvent::Completed { .. } => "completed".to_string(),
        };
        self.events.lock().unwrap().push(line);
    }
}
