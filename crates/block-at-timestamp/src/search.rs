//! Timestamp search.
//!
//! Chains can only be read by block number, so the block nearest a target
//! timestamp is found by alternating two probes per round:
//!
//! 1. a binary squeeze, reading the midpoint of the current bounds, and
//! 2. a rate estimate, reading the block the target would fall on if blocks
//!    between the bounds were evenly spaced in time.
//!
//! The squeeze bounds the number of rounds by the logarithm of the chain
//! length; the estimate usually lands within range after one or two rounds.

use std::{
    cmp::Ordering,
    fmt,
    time::{Duration, Instant},
};

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    block::Block,
    error::{Error, Result},
    source::ChainReader,
};

/// Fixed-point scale applied to seconds-per-block before dividing.
pub const RATE_SCALE: u64 = 1_000_000;

/// Default tolerance in seconds.
pub const DEFAULT_TARGET_RANGE_SECONDS: u64 = 60;

/// Per-call search options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SearchOptions {
    /// Maximum distance in seconds between the target and the returned block.
    /// Best effort: when no block lies this close, the closest one is returned.
    pub target_range_seconds: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            target_range_seconds: DEFAULT_TARGET_RANGE_SECONDS,
        }
    }
}

impl SearchOptions {
    /// Options with the given tolerance.
    pub fn new(target_range_seconds: u64) -> Self {
        Self {
            target_range_seconds,
        }
    }

    /// Rejects a tolerance below one second.
    pub fn validate(&self) -> Result<()> {
        if self.target_range_seconds < 1 {
            return Err(Error::Config(
                "target_range_seconds too small: must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The target is at or before the first block.
    BeforeFirstBlock,
    /// The target is at or after the latest block considered.
    AfterLatestBlock,
    /// A midpoint probe hit the target exactly.
    ExactMatch,
    /// The bounds are adjacent; the closer of the two was returned.
    Exhausted,
    /// A rate-estimate probe landed within the tolerance.
    WithinRange,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BeforeFirstBlock => "before first block",
            Self::AfterLatestBlock => "after latest block",
            Self::ExactMatch => "exact match",
            Self::Exhausted => "no blocks left to check",
            Self::WithinRange => "within range",
        })
    }
}

/// Progress of a single search.
#[derive(Debug)]
pub enum SearchEvent<'a> {
    /// The search began.
    Started {
        /// Target timestamp.
        target: U256,
        /// Options the search runs with.
        options: &'a SearchOptions,
    },
    /// A block was probed.
    Check {
        /// Number of checks so far, counting from 1.
        index: usize,
        /// Target timestamp.
        target: U256,
        /// Lower bound when the probe was classified.
        lower: Block,
        /// Block just read.
        probe: Block,
        /// Upper bound when the probe was classified.
        upper: Block,
    },
    /// The search settled on a block.
    Found {
        /// Block returned to the caller.
        block: Block,
        /// Why the search stopped.
        outcome: Outcome,
    },
    /// The search was aborted.
    Failed {
        /// Error returned to the caller.
        error: &'a Error,
    },
    /// The search ended, successfully or not.
    Completed {
        /// Time since the search started.
        elapsed: Duration,
    },
}

/// Receives search progress. Has no effect on the result.
pub trait SearchObserver {
    fn on_event(&self, event: &SearchEvent<'_>);
}

/// Reports progress as `tracing` events. Enable with `RUST_LOG=block_at_timestamp=debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SearchObserver for TracingObserver {
    fn on_event(&self, event: &SearchEvent<'_>) {
        match event {
            SearchEvent::Started { target, options } => debug!(
                %target,
                target_range_seconds = options.target_range_seconds,
                "Looking for block"
            ),
            SearchEvent::Check {
                index,
                target,
                lower,
                probe,
                upper,
            } => debug!(
                check = index,
                lower = %lower,
                lower_diff = %lower.offset(*target),
                checking = %probe,
                checking_diff = %probe.offset(*target),
                upper = %upper,
                upper_diff = %upper.offset(*target),
                "Checking block"
            ),
            SearchEvent::Found { block, outcome } => debug!(
                number = %block.number,
                timestamp = %block.timestamp,
                %outcome,
                "Found block"
            ),
            SearchEvent::Failed { error } => warn!(%error, "Block search failed"),
            SearchEvent::Completed { elapsed } => debug!(?elapsed, "Completed search"),
        }
    }
}

/// Returns the block closest to `target`, reporting progress through `tracing`.
///
/// See [`block_at_timestamp_with`].
pub async fn block_at_timestamp<R>(
    reader: &R,
    target: U256,
    options: &SearchOptions,
) -> Result<Block>
where
    R: ChainReader + ?Sized,
{
    block_at_timestamp_with(reader, target, options, &TracingObserver).await
}

/// Returns the block closest to `target`, reporting progress to `observer`.
///
/// If any block between the first block and the latest block considered lies
/// within `options.target_range_seconds` of `target`, the returned block does.
/// Targets outside that span return the boundary block. The latest block
/// considered is one behind the chain head, since backends may not have
/// indexed the head yet.
///
/// # Errors
///
/// [`Error::Config`] for an invalid tolerance, before any read. Any failed
/// read aborts the search with [`Error::Network`].
pub async fn block_at_timestamp_with<R, O>(
    reader: &R,
    target: U256,
    options: &SearchOptions,
    observer: &O,
) -> Result<Block>
where
    R: ChainReader + ?Sized,
    O: SearchObserver + ?Sized,
{
    let start = Instant::now();
    observer.on_event(&SearchEvent::Started { target, options });

    let mut search = Search {
        reader,
        observer,
        target,
        checks: 0,
    };
    let result = search.run(options).await;

    if let Err(error) = &result {
        observer.on_event(&SearchEvent::Failed { error });
    }
    observer.on_event(&SearchEvent::Completed {
        elapsed: start.elapsed(),
    });
    result
}

struct Search<'a, R: ?Sized, O: ?Sized> {
    reader: &'a R,
    observer: &'a O,
    target: U256,
    checks: usize,
}

impl<R, O> Search<'_, R, O>
where
    R: ChainReader + ?Sized,
    O: SearchObserver + ?Sized,
{
    async fn run(&mut self, options: &SearchOptions) -> Result<Block> {
        options.validate()?;
        let range = U256::from(options.target_range_seconds);
        let target = self.target;

        let mut lower = self.reader.block(U256::ZERO).await?;
        let head = self.reader.current_block_number().await?;
        let mut upper = self.reader.block(head.saturating_sub(U256::from(1))).await?;

        if target <= lower.timestamp {
            return Ok(self.found(lower, Outcome::BeforeFirstBlock));
        }
        if target >= upper.timestamp {
            return Ok(self.found(upper, Outcome::AfterLatestBlock));
        }

        // From here on `lower.timestamp < target < upper.timestamp`, and
        // `lower.number < upper.number`.
        self.check(&lower, &upper, &upper);

        loop {
            let middle = lower.number + (upper.number - lower.number) / U256::from(2);
            let middle = self.reader.block(middle).await?;
            self.check(&lower, &middle, &upper);
            match middle.timestamp.cmp(&target) {
                Ordering::Greater => upper = middle,
                Ordering::Less => lower = middle,
                Ordering::Equal => return Ok(self.found(middle, Outcome::ExactMatch)),
            }

            if upper.number - lower.number <= U256::from(1) {
                let closest = if lower.distance(target) < upper.distance(target) {
                    lower
                } else {
                    upper
                };
                return Ok(self.found(closest, Outcome::Exhausted));
            }

            let estimate = self
                .reader
                .block(estimate_block_number(&lower, &upper, target))
                .await?;
            self.check(&lower, &estimate, &upper);
            if estimate.timestamp > target {
                upper = estimate;
            } else {
                lower = estimate;
            }

            if estimate.distance(target) <= range {
                return Ok(self.found(estimate, Outcome::WithinRange));
            }
        }
    }

    fn check(&mut self, lower: &Block, probe: &Block, upper: &Block) {
        self.checks += 1;
        self.observer.on_event(&SearchEvent::Check {
            index: self.checks,
            target: self.target,
            lower: *lower,
            probe: *probe,
            upper: *upper,
        });
    }

    fn found(&self, block: Block, outcome: Outcome) -> Block {
        self.observer.on_event(&SearchEvent::Found { block, outcome });
        block
    }
}

/// Projects the block holding `target` from the average block time between
/// the bounds.
///
/// Requires `lower.timestamp <= target < upper.timestamp` and at least one
/// block strictly between the bounds. The result lies in
/// `lower.number..upper.number` and may be `lower` itself.
fn estimate_block_number(lower: &Block, upper: &Block, target: U256) -> U256 {
    let scale = U256::from(RATE_SCALE);
    let one = U256::from(1);
    let blocks = upper.number - lower.number;

    let scaled_seconds_per_block =
        (upper.timestamp - lower.timestamp).saturating_mul(scale) / blocks;
    let estimate = if scaled_seconds_per_block.is_zero() {
        lower.number + blocks / U256::from(2)
    } else {
        let elapsed = (target - lower.timestamp).saturating_mul(scale);
        lower
            .number
            .saturating_add(elapsed / scaled_seconds_per_block)
    };

    // A truncated rate can overshoot once the interval spans more than
    // `RATE_SCALE` blocks.
    estimate.min(upper.number - one)
}
