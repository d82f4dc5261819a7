//! Nonce search.
//!
//! A search packs candidates from one order with successive nonces and
//! stops at the first whose hash is below the target. When the nonce range
//! is spent it advances the message timestamp and starts over, up to a
//! bounded number of rolls, then reports exhaustion so the caller can
//! supply a fresh order.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::candidate::Candidate;
use crate::error::{Result, WorkError};
use crate::order::MiningOrder;
use crate::params::{DEFAULT_TIME_ROLLS, DEFAULT_VERSION};
use crate::U256;

const NONCE_SPACE: u64 = 1 << 32;

/// Search for a satisfying candidate with default settings.
///
/// Tries every nonce, then up to [`DEFAULT_TIME_ROLLS`] later timestamps.
/// Identity-mode orders are never rolled.
pub fn work(order: &MiningOrder) -> Result<Candidate> {
    Search::default().work(order)
}

/// Outcome of one pass over a nonce range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scan {
    /// The satisfying candidate, if one was found.
    pub found: Option<Candidate>,
    /// Number of hashes computed.
    pub hashes: u64,
    /// The candidate with the lowest hash seen.
    pub best: Option<Candidate>,
}

impl Scan {
    fn empty() -> Self {
        Scan {
            found: None,
            hashes: 0,
            best: None,
        }
    }

    fn merge(self, other: Scan) -> Scan {
        let best = match (self.best, other.best) {
            (Some(a), Some(b)) => {
                if b.hash().as_number() < a.hash().as_number() {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (a, b) => a.or(b),
        };
        Scan {
            found: self.found.or(other.found),
            hashes: self.hashes + other.hashes,
            best,
        }
    }
}

/// Search settings.
#[derive(Debug, Clone)]
pub struct Search {
    version: u32,
    nonce_start: u32,
    nonce_count: u64,
    time_rolls: u32,
    threads: usize,
    stop: Option<Arc<AtomicBool>>,
}

impl Default for Search {
    fn default() -> Self {
        Search {
            version: DEFAULT_VERSION,
            nonce_start: 0,
            nonce_count: NONCE_SPACE,
            time_rolls: DEFAULT_TIME_ROLLS,
            threads: 1,
            stop: None,
        }
    }
}

impl Search {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header version packed into every candidate.
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// First nonce tried.
    pub fn nonce_start(mut self, start: u32) -> Self {
        self.nonce_start = start;
        self
    }

    /// Number of nonces tried per timestamp. Clamped to the end of the nonce space.
    pub fn nonce_count(mut self, count: u64) -> Self {
        self.nonce_count = count;
        self
    }

    /// Number of times the timestamp is advanced by one second after the
    /// nonce range is spent. Ignored for orders that are not
    /// [`MiningOrder::rollable`].
    pub fn time_rolls(mut self, rolls: u32) -> Self {
        self.time_rolls = rolls;
        self
    }

    /// Worker threads. Zero means one per CPU. Ignored without `std`.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Shared flag that cancels the search when raised.
    pub fn stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Search until a satisfying candidate is found.
    ///
    /// Fails with [`WorkError::InvalidOrder`] before hashing anything if the
    /// order is invalid, [`WorkError::Exhausted`] if every nonce and
    /// timestamp roll was tried, and [`WorkError::Cancelled`] if the stop
    /// flag was raised. Cancellation reports hashes from every pass.
    pub fn work(&self, order: &MiningOrder) -> Result<Candidate> {
        order.validate()?;

        let rolls = if order.rollable() {
            self.time_rolls
        } else {
            debug!("identity order, timestamp rolling disabled");
            0
        };

        let mut hashes = 0u64;
        for roll in 0..=rolls {
            let scan = self.scan(&order.rolled(roll)).map_err(|err| match err {
                WorkError::Cancelled { hashes: pass } => WorkError::Cancelled {
                    hashes: hashes + pass,
                },
                other => other,
            })?;
            hashes += scan.hashes;
            if let Some(candidate) = scan.found {
                info!(
                    nonce = candidate.nonce(),
                    roll,
                    hashes,
                    hash = %candidate.hash(),
                    "found satisfying candidate"
                );
                return Ok(candidate);
            }
            debug!(roll, hashes, "nonce range spent, rolling timestamp");
        }

        warn!(hashes, rolls, "search space exhausted");
        Err(WorkError::Exhausted { hashes })
    }

    /// One pass over the configured nonce range for `order` as given.
    ///
    /// Not finding a solution is a normal outcome here, reported through
    /// [`Scan::found`].
    pub fn scan(&self, order: &MiningOrder) -> Result<Scan> {
        order.validate()?;

        let start = self.nonce_start as u64;
        let end = start.saturating_add(self.nonce_count).min(NONCE_SPACE);
        let found = AtomicBool::new(false);
        let halt = Halt {
            found: &found,
            external: self.stop.as_deref(),
        };

        let threads = self.worker_count();
        debug!(start, end, threads, target = %order.target, "scanning nonce range");

        let scan = if threads <= 1 || end - start < threads as u64 {
            scan_range(self.version, order, start, end, &halt)
        } else {
            self.scan_parallel(order, start, end, threads, &halt)
        };

        if scan.found.is_none() && halt.cancelled() {
            warn!(hashes = scan.hashes, "search cancelled");
            return Err(WorkError::Cancelled {
                hashes: scan.hashes,
            });
        }
        Ok(scan)
    }

    #[cfg(feature = "std")]
    fn worker_count(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    #[cfg(not(feature = "std"))]
    fn worker_count(&self) -> usize {
        1
    }

    /// Split `start..end` into one disjoint slice per worker.
    #[cfg(feature = "std")]
    fn scan_parallel(
        &self,
        order: &MiningOrder,
        start: u64,
        end: u64,
        threads: usize,
        halt: &Halt<'_>,
    ) -> Scan {
        let chunk = (end - start + threads as u64 - 1) / threads as u64;
        std::thread::scope(|scope| {
            let workers: alloc::vec::Vec<_> = (0..threads as u64)
                .map(|i| {
                    let from = start + i * chunk;
                    let to = (from + chunk).min(end);
                    scope.spawn(move || {
                        debug!(worker = i, from, to, "worker started");
                        scan_range(self.version, order, from, to, halt)
                    })
                })
                .collect();

            join_workers(workers)
        })
    }

    #[cfg(not(feature = "std"))]
    fn scan_parallel(
        &self,
        order: &MiningOrder,
        start: u64,
        end: u64,
        _threads: usize,
        halt: &Halt<'_>,
    ) -> Scan {
        scan_range(self.version, order, start, end, halt)
    }
}

/// Join every worker and merge their results. A worker panic is re-raised.
#[cfg(feature = "std")]
fn join_workers(workers: alloc::vec::Vec<std::thread::ScopedJoinHandle<'_, Scan>>) -> Scan {
    workers
        .into_iter()
        .map(|worker| worker.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
        .fold(Scan::empty(), Scan::merge)
}

/// Stop conditions shared by every worker of one pass.
struct Halt<'a> {
    found: &'a AtomicBool,
    external: Option<&'a AtomicBool>,
}

impl Halt<'_> {
    fn raised(&self) -> bool {
        self.found.load(Ordering::Relaxed) || self.cancelled()
    }

    fn cancelled(&self) -> bool {
        self.external
            .map(|stop| stop.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

/// Try nonces `start..end`, checking the halt flags between attempts.
fn scan_range(version: u32, order: &MiningOrder, start: u64, end: u64, halt: &Halt<'_>) -> Scan {
    let target = order.target.expand();
    let base = Candidate::pack(version, order, 0);
    let mut best: Option<(U256, Candidate)> = None;
    let mut hashes = 0u64;

    for nonce in start..end {
        if halt.raised() {
            break;
        }
        let candidate = base.with_nonce(nonce as u32);
        let value = candidate.hash().as_number();
        hashes += 1;

        if value < target {
            halt.found.store(true, Ordering::Relaxed);
            return Scan {
                found: Some(candidate),
                hashes,
                best: Some(candidate),
            };
        }
        if best.map(|(lowest, _)| value < lowest).unwrap_or(true) {
            best = Some((value, candidate));
        }
    }

    Scan {
        found: None,
        hashes,
        best: best.map(|(_, candidate)| candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::CompactTarget;
    use crate::hash::Digest;
    use crate::order::{Message, COMPRESSED_KEY_SIZE};

    fn order(target: CompactTarget) -> MiningOrder {
        MiningOrder::header(
            Digest::hash(b"previous block"),
            &Digest::hash(b"merkle root"),
            1_700_000_000,
            target,
        )
    }

    #[test]
    fn test_easy_target_solves_on_first_nonce() {
        let candidate = work(&order(CompactTarget::EASY)).unwrap();

        assert!(candidate.satisfied());
        assert!(candidate.valid());
        assert_eq!(candidate.nonce(), 0);
        assert_eq!(candidate.version(), DEFAULT_VERSION);
        assert_eq!(candidate.order(), order(CompactTarget::EASY));
    }

    #[test]
    fn test_hard_target_reports_exhaustion() {
        let search = Search::new().nonce_count(256).time_rolls(2);
        let result = search.work(&order(CompactTarget::HARD));

        assert_eq!(result, Err(WorkError::Exhausted { hashes: 256 * 3 }));
    }

    #[test]
    fn test_invalid_order_is_rejected_before_hashing() {
        let search = Search::new().nonce_count(16);

        let bad_target = order(CompactTarget::INVALID);
        assert!(matches!(
            search.work(&bad_target),
            Err(WorkError::InvalidOrder { .. })
        ));

        let bad_reference = MiningOrder {
            reference: Digest::ZERO,
            ..order(CompactTarget::EASY)
        };
        assert!(matches!(
            search.scan(&bad_reference),
            Err(WorkError::InvalidOrder { .. })
        ));
    }

    #[test]
    fn test_scan_not_found_is_not_an_error() {
        let scan = Search::new()
            .nonce_start(1000)
            .nonce_count(64)
            .scan(&order(CompactTarget::HARD))
            .unwrap();

        assert!(scan.found.is_none());
        assert_eq!(scan.hashes, 64);
        let best = scan.best.unwrap();
        assert!((1000..1064).contains(&best.nonce()));
        assert!(!best.satisfied());
    }

    #[test]
    fn test_nonce_range_clamped_to_nonce_space() {
        let scan = Search::new()
            .nonce_start(u32::MAX - 3)
            .nonce_count(100)
            .scan(&order(CompactTarget::HARD))
            .unwrap();
        assert_eq!(scan.hashes, 4);
    }

    #[test]
    fn test_moderate_target_is_found() {
        // Roughly one in 65536 hashes passes.
        let target = CompactTarget::new(31, 0x00ffff);
        let candidate = Search::new().work(&order(target)).unwrap();

        assert!(candidate.satisfied());
        assert!(candidate.hash().as_number() < target.expand());
    }

    #[test]
    fn test_time_roll_changes_timestamp() {
        // One nonce per timestamp against a one-in-sixteen target.
        let target = CompactTarget::new(32, 0x10_0000);
        let base = order(target);
        let search = Search::new().nonce_count(1).time_rolls(5000);

        let candidate = search.work(&base).unwrap();
        let roll = candidate
            .order()
            .message
            .timestamp()
            .wrapping_sub(base.message.timestamp());
        assert!(roll <= 5000);
        assert_eq!(candidate.nonce(), 0);
        assert_eq!(candidate.reference(), base.reference);
        assert_eq!(candidate.message().digest(), base.message.digest());
        assert!(candidate.satisfied());
    }

    #[test]
    fn test_stop_flag_cancels() {
        let stop = Arc::new(AtomicBool::new(true));
        let search = Search::new().nonce_count(1024).stop_flag(stop);

        assert_eq!(
            search.work(&order(CompactTarget::HARD)),
            Err(WorkError::Cancelled { hashes: 0 })
        );
    }

    fn identity_order(target: CompactTarget) -> MiningOrder {
        let mut key = [0x5Au8; COMPRESSED_KEY_SIZE];
        key[0] = 0x02;
        MiningOrder::new(
            Digest::hash(b"previous block"),
            Message::compressed_key(&key),
            target,
        )
    }

    #[test]
    fn test_identity_order_is_never_rolled() {
        let order = identity_order(CompactTarget::HARD);
        let result = Search::new().nonce_count(4).work(&order);

        // One pass only, despite the default roll budget.
        assert_eq!(result, Err(WorkError::Exhausted { hashes: 4 }));
    }

    #[test]
    fn test_identity_order_solution_keeps_key() {
        let order = identity_order(CompactTarget::new(32, 0x10_0000));
        let search = Search::new().nonce_count(1);

        match search.work(&order) {
            Ok(candidate) => {
                assert_eq!(candidate.order(), order);
                assert!(candidate.satisfied());
            }
            Err(err) => assert_eq!(err, WorkError::Exhausted { hashes: 1 }),
        }

        let candidate = work(&identity_order(CompactTarget::EASY)).unwrap();
        assert_eq!(candidate.order(), identity_order(CompactTarget::EASY));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_cancellation_counts_earlier_passes() {
        use std::thread;
        use std::time::Duration;

        let stop = Arc::new(AtomicBool::new(false));
        let search = Search::new()
            .nonce_count(64)
            .time_rolls(u32::MAX)
            .stop_flag(stop.clone());

        let handle = thread::spawn(move || search.work(&order(CompactTarget::HARD)));
        thread::sleep(Duration::from_millis(50));
        stop.store(true, Ordering::Relaxed);

        match handle.join().unwrap() {
            Err(WorkError::Cancelled { hashes }) => assert!(hashes > 64),
            other => panic!("expected cancellation, got {:?}", other),
        }
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_worker_panic_propagates() {
        let result = std::panic::catch_unwind(|| {
            std::thread::scope(|scope| {
                let workers = vec![
                    scope.spawn(Scan::empty),
                    scope.spawn(|| -> Scan { panic!("worker failed") }),
                ];
                join_workers(workers)
            })
        });

        let payload = result.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"worker failed"));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_parallel_search_finds_solution() {
        let target = CompactTarget::new(31, 0x00ffff);
        let candidate = Search::new().threads(4).work(&order(target)).unwrap();

        // Which worker wins is nondeterministic; only the result is checked.
        assert!(candidate.satisfied());
        assert!(candidate.valid());
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_parallel_exhaustion_counts_every_hash() {
        let scan = Search::new()
            .threads(3)
            .nonce_count(300)
            .scan(&order(CompactTarget::HARD))
            .unwrap();

        assert!(scan.found.is_none());
        assert_eq!(scan.hashes, 300);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_stop_flag_cancels_running_workers() {
        use std::thread;
        use std::time::Duration;

        let stop = Arc::new(AtomicBool::new(false));
        let search = Search::new().threads(2).time_rolls(0).stop_flag(stop.clone());

        let handle = thread::spawn(move || search.work(&order(CompactTarget::HARD)));
        thread::sleep(Duration::from_millis(50));
        stop.store(true, Ordering::Relaxed);

        assert!(matches!(
            handle.join().unwrap(),
            Err(WorkError::Cancelled { .. })
        ));
    }
}
