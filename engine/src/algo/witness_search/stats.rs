//! Counters of the witness search and the estimator for its settled edge limit.

use crate::report::*;
use std::fmt;

/// Running mean and population variance of a series of observations (Welford's algorithm).
#[derive(Debug, Clone, Default)]
pub struct OnFlyStatistics {
    count: u64,
    mean: f64,
    m2: f64,
}

impl OnFlyStatistics {
    pub fn add_observation(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Effort counters over a number of searches.
/// `max_num_settled_edges` sums up the settled edge limit in effect for each search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub num_searches: u64,
    pub num_polled_edges: u64,
    pub num_settled_edges: u64,
    pub max_num_settled_edges: u64,
}

impl Stats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn merge(&mut self, other: &Stats) {
        self.num_searches += other.num_searches;
        self.num_polled_edges += other.num_polled_edges;
        self.num_settled_edges += other.num_settled_edges;
        self.max_num_settled_edges = self.max_num_settled_edges.saturating_add(other.max_num_settled_edges);
    }

    pub fn report(&self) {
        report!("num_searches", self.num_searches);
        report!("num_polled_edges", self.num_polled_edges);
        report!("num_settled_edges", self.num_settled_edges);
        report!("max_num_settled_edges", self.max_num_settled_edges);
    }
}

fn quotient(a: u64, b: u64) -> String {
    if b == 0 {
        "NaN".to_string()
    } else {
        format!("{:5.1}", a as f64 / b as f64)
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "limit-exhaustion: {} %, avg-settled: {}, avg-max-settled: {}, avg-polled-edges: {}",
            quotient(100 * self.num_settled_edges, self.max_num_settled_edges),
            quotient(self.num_settled_edges, self.num_searches),
            quotient(self.max_num_settled_edges, self.num_searches),
            quotient(self.num_polled_edges, self.num_searches)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_variance() {
        let mut stats = OnFlyStatistics::default();
        for &x in &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stats.add_observation(x);
        }
        assert_eq!(stats.count(), 8);
        assert!((stats.mean() - 5.0).abs() < 1e-12);
        assert!((stats.variance() - 4.0).abs() < 1e-12);

        stats.reset();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.variance(), 0.0);
    }

    #[test]
    fn summary_without_searches() {
        assert_eq!(
            Stats::default().to_string(),
            "limit-exhaustion: NaN %, avg-settled: NaN, avg-max-settled: NaN, avg-polled-edges: NaN"
        );
    }

    #[test]
    fn summary_and_merge() {
        let mut stats = Stats {
            num_searches: 2,
            num_polled_edges: 9,
            num_settled_edges: 50,
            max_num_settled_edges: 200,
        };
        assert_eq!(
            stats.to_string(),
            "limit-exhaustion:  25.0 %, avg-settled:  25.0, avg-max-settled: 100.0, avg-polled-edges:   4.5"
        );

        stats.merge(&Stats {
            num_searches: 1,
            num_polled_edges: 1,
            num_settled_edges: 1,
            max_num_settled_edges: 100,
        });
        assert_eq!(stats.num_searches, 3);
        assert_eq!(stats.max_num_settled_edges, 300);

        stats.reset();
        assert_eq!(stats, Stats::default());
    }

    #[test]
    fn unbounded_limits_saturate() {
        let mut stats = Stats {
            num_searches: 1,
            max_num_settled_edges: u64::MAX,
            ..Stats::default()
        };
        stats.merge(&stats.clone());
        assert_eq!(stats.num_searches, 2);
        assert_eq!(stats.max_num_settled_edges, u64::MAX);
    }
}
