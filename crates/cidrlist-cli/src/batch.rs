//! Parallel batch checks using Rayon
//!
//! One [`NetworkSet`] is shared read-only across the worker pool. Each
//! input line yields its own [`CheckResult`]; a bad line never aborts the
//! batch.

use anyhow::{Context, Result};
use cidrlist_set::config::entry_lines;
use cidrlist_set::{NetworkSet, QueryMode};
use rayon::prelude::*;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::report::{check_address, CheckResult};

/// Emit a progress event every this many checked addresses
const PROGRESS_INTERVAL: usize = 1000;

/// Batch checker with parallel execution
pub struct BatchProcessor {
    set: Arc<NetworkSet>,
    mode: QueryMode,
    thread_pool: rayon::ThreadPool,
}

impl BatchProcessor {
    /// Create a new batch processor
    ///
    /// # Arguments
    ///
    /// * `set` - networks to check against
    /// * `num_threads` - worker count (default: CPU cores)
    pub fn new(set: Arc<NetworkSet>, mode: QueryMode, num_threads: Option<usize>) -> Result<Self> {
        let num_threads = num_threads.unwrap_or_else(num_cpus::get).max(1);

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;

        debug!(num_threads, "batch thread pool ready");
        Ok(Self {
            set,
            mode,
            thread_pool,
        })
    }

    /// Check addresses in parallel; output order matches input order
    pub fn process(&self, addresses: &[String]) -> Vec<CheckResult> {
        let total = addresses.len();
        let processed = AtomicUsize::new(0);

        let results: Vec<CheckResult> = self.thread_pool.install(|| {
            addresses
                .par_iter()
                .map(|address| {
                    let result = check_address(&self.set, address, self.mode);
                    let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if progress_due(count, total) {
                        debug!(count, total, "batch progress");
                    }
                    result
                })
                .collect()
        });

        let members = results.iter().filter(|r| r.is_member()).count();
        let errors = results.iter().filter(|r| r.error.is_some()).count();
        info!(total, members, errors, "batch complete");
        results
    }
}

fn progress_due(count: usize, total: usize) -> bool {
    count % PROGRESS_INTERVAL == 0 || count == total
}

/// Read one address per line from a file, or stdin for `None` / `-`
///
/// Blank lines and `#` comments are skipped.
pub fn read_addresses(path: Option<&Path>) -> Result<Vec<String>> {
    let text = match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read addresses from {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read addresses from stdin")?;
            buf
        }
    };

    Ok(entry_lines(&text).map(|line| line.entry.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor(threads: usize) -> BatchProcessor {
        let set = NetworkSet::new(["10.0.0.0/8", "127.0.0.1/8", "1.2.3.0/24", "8.8.8.8"]).unwrap();
        BatchProcessor::new(Arc::new(set), QueryMode::DualStack, Some(threads)).unwrap()
    }

    #[test]
    fn test_process_keeps_order() {
        let addresses: Vec<String> = ["10.10.10.1", "192.168.1.1", "bogus", "::ffff:8.8.8.8"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let results = processor(2).process(&addresses);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].member, Some(true));
        assert_eq!(results[1].member, Some(false));
        assert_eq!(results[2].member, None);
        assert!(results[2].error.is_some());
        assert_eq!(results[3].matched.as_deref(), Some("8.8.8.8/32"));
    }

    #[test]
    fn test_process_many() {
        let addresses: Vec<String> = (0..=255).map(|i| format!("10.0.{}.1", i)).collect();
        let results = processor(4).process(&addresses);
        assert!(results.iter().all(CheckResult::is_member));
        assert_eq!(results[255].address, "10.0.255.1");
    }

    #[test]
    fn test_zero_workers_clamped() {
        let set = Arc::new(NetworkSet::default());
        assert!(BatchProcessor::new(set, QueryMode::DualStack, Some(0)).is_ok());
    }

    #[test]
    fn test_progress_due() {
        assert!(!progress_due(1, 2500));
        assert!(progress_due(1000, 2500));
        assert!(!progress_due(1001, 2500));
        assert!(progress_due(2000, 2500));
        assert!(progress_due(2500, 2500));
        assert!(progress_due(3, 3));
    }

    #[test]
    fn test_read_addresses_from_file() {
        let path = std::env::temp_dir().join(format!("cidrlist-batch-{}.txt", std::process::id()));
        std::fs::write(&path, "# queries\n10.0.0.1\n\n  8.8.8.8  # dns\n").unwrap();

        let addresses = read_addresses(Some(&path)).unwrap();
        assert_eq!(addresses, ["10.0.0.1", "8.8.8.8"]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_addresses_missing_file() {
        let err = read_addresses(Some(Path::new("/nonexistent/cidrlist/queries.txt"))).unwrap_err();
        assert!(err.to_string().contains("failed to read addresses"));
    }
}
