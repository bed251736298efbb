//! Per-call latency tracking for backend reads.
//!
//! [`TimedBackend`](crate::backend::TimedBackend) reports every query and
//! count here, keyed by call kind and table (`count:leads`). Calls slower
//! than the configured budget are logged at `warn` when they complete.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::backend::Table;

/// Recent durations kept per call key for the quantiles.
const RECENT_WINDOW: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    Query,
    Count,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Query => "query",
            CallKind::Count => "count",
        }
    }
}

/// One kind of backend call against one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallKey {
    pub kind: CallKind,
    pub table: Table,
}

impl CallKey {
    pub fn query(table: Table) -> Self {
        Self {
            kind: CallKind::Query,
            table,
        }
    }

    pub fn count(table: Table) -> Self {
        Self {
            kind: CallKind::Count,
            table,
        }
    }
}

impl fmt::Display for CallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.table)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStats {
    pub call: String,
    pub calls: u64,
    pub failures: u64,
    pub over_budget: u64,
    pub median_ms: u64,
    pub p95_ms: u64,
    pub slowest_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyReport {
    pub budget_ms: u64,
    pub generated_at: DateTime<Utc>,
    /// Ordered by call kind, then table.
    pub calls: Vec<CallStats>,
}

#[derive(Debug, Default)]
struct Tally {
    recent: VecDeque<Duration>,
    calls: u64,
    failures: u64,
    over_budget: u64,
    slowest: Duration,
}

impl Tally {
    fn stats(&self, key: CallKey) -> CallStats {
        let mut sorted: Vec<Duration> = self.recent.iter().copied().collect();
        sorted.sort_unstable();
        CallStats {
            call: key.to_string(),
            calls: self.calls,
            failures: self.failures,
            over_budget: self.over_budget,
            median_ms: millis(quantile(&sorted, 0.5)),
            p95_ms: millis(quantile(&sorted, 0.95)),
            slowest_ms: millis(self.slowest),
        }
    }
}

#[derive(Debug)]
pub struct LatencyRecorder {
    budget: Duration,
    tallies: Mutex<BTreeMap<CallKey, Tally>>,
}

impl LatencyRecorder {
    pub fn new(budget_ms: u64) -> Self {
        Self {
            budget: Duration::from_millis(budget_ms),
            tallies: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn budget_ms(&self) -> u64 {
        millis(self.budget)
    }

    /// Record one finished call. Failed calls count toward the timings too.
    pub fn observe(&self, key: CallKey, elapsed: Duration, ok: bool) {
        let over = elapsed > self.budget;
        {
            let mut tallies = self.tallies.lock();
            let tally = tallies.entry(key).or_default();
            tally.calls += 1;
            if !ok {
                tally.failures += 1;
            }
            if over {
                tally.over_budget += 1;
            }
            tally.slowest = tally.slowest.max(elapsed);
            if tally.recent.len() == RECENT_WINDOW {
                tally.recent.pop_front();
            }
            tally.recent.push_back(elapsed);
        }

        if over {
            log::warn!(
                "{} took {}ms, over the {}ms budget",
                key,
                millis(elapsed),
                self.budget_ms()
            );
        }
    }

    pub fn stats(&self, key: CallKey) -> Option<CallStats> {
        self.tallies.lock().get(&key).map(|tally| tally.stats(key))
    }

    pub fn report(&self) -> LatencyReport {
        let calls = self
            .tallies
            .lock()
            .iter()
            .map(|(key, tally)| tally.stats(*key))
            .collect();
        LatencyReport {
            budget_ms: self.budget_ms(),
            generated_at: Utc::now(),
            calls,
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Value at fraction `q` of an ascending slice, rounding to the nearest index.
fn quantile(sorted: &[Duration], q: f64) -> Duration {
    match sorted.len() {
        0 => Duration::ZERO,
        len => sorted[((len - 1) as f64 * q).round() as usize],
    }
}
