// ─── Acquisition primitives ───
// Mirror ordering, resumable transfers, hashing, rate limiting, the worker
// pool and progress records.

mod client;
mod hash;
mod mirrors;
mod pool;
mod progress;
mod rate;

pub use client::{backoff, part_path, ByteProgress, Downloader, FetchOptions, FetchOutcome, PART_SUFFIX};
pub use hash::{ContentHash, HashAlgorithm};
pub use mirrors::{build_mirrors, MirrorRule, MirrorTable};
pub use pool::run_pool;
pub use progress::{
    silent_progress, ProgressAggregator, ProgressEvent, ProgressPhase, ProgressSink, TaskCategory,
};
pub use rate::TokenBucket;

/// Default BMCLAPI-compatible mirror.
pub const BMCLAPI_BASE: &str = "https://bmclapi2.bangbang93.com";
