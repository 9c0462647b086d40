//! Smurfing Detector — fan-in/fan-out bursts centered on one account,
//! qualified by peer count and a sliding-window temporal density score.

use std::collections::BTreeSet;

use crate::graph::TransactionGraph;
use crate::AnalysisConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmurfDirection {
    FanIn,
    FanOut,
}

#[derive(Debug, Clone)]
pub struct SmurfPattern {
    pub direction: SmurfDirection,
    pub center_account: String,
    pub connected_accounts: Vec<String>,
    pub temporal_score: f64,
    pub total_amount: f64,
    pub tx_count: usize,
}

/// Computes the sliding-window temporal density of a set of epoch-second
/// timestamps: the largest fraction of events falling within any
/// window of length `window_s`. Returns 0.0 for fewer than two values.
pub fn temporal_density(epochs: &[i64], window_s: i64) -> f64 {
    if epochs.len() < 2 {
        return 0.0;
    }
    let mut sorted = epochs.to_vec();
    sorted.sort_unstable();

    let n = sorted.len();
    let mut best = 0usize;
    let mut left = 0usize;
    for right in 0..n {
        while sorted[right] - sorted[left] >= window_s {
            left += 1;
        }
        let count = right - left + 1;
        if count > best {
            best = count;
        }
    }

    best as f64 / n as f64
}

/// Scans every account for fan-in and fan-out smurfing patterns.
pub fn detect(graph: &TransactionGraph, config: &AnalysisConfig) -> Vec<SmurfPattern> {
    let mut patterns = Vec::new();

    for account in graph.nodes() {
        let stats = match graph.stats(account) {
            Some(s) => s,
            None => continue,
        };

        if stats.in_degree >= config.fanin_threshold {
            let in_edges = graph.in_edges(account);
            let distinct_senders: BTreeSet<&str> =
                in_edges.iter().map(|e| e.sender.as_str()).collect();
            if distinct_senders.len() >= config.fanin_threshold {
                let epochs: Vec<i64> = in_edges.iter().map(|e| e.epoch_seconds).collect();
                let score = temporal_density(&epochs, config.temporal_window_s);
                if score > 0.0 {
                    patterns.push(SmurfPattern {
                        direction: SmurfDirection::FanIn,
                        center_account: account.clone(),
                        connected_accounts: distinct_senders.into_iter().map(String::from).collect(),
                        temporal_score: score,
                        total_amount: in_edges.iter().map(|e| e.amount).sum(),
                        tx_count: in_edges.len(),
                    });
                }
            }
        }

        if stats.out_degree >= config.fanout_threshold {
            let out_edges = graph.out_edges(account);
            let distinct_receivers: BTreeSet<&str> =
                out_edges.iter().map(|e| e.receiver.as_str()).collect();
            if distinct_receivers.len() >= config.fanout_threshold {
                let epochs: Vec<i64> = out_edges.iter().map(|e| e.epoch_seconds).collect();
                let score = temporal_density(&epochs, config.temporal_window_s);
                if score > 0.0 {
                    patterns.push(SmurfPattern {
                        direction: SmurfDirection::FanOut,
                        center_account: account.clone(),
                        connected_accounts: distinct_receivers.into_iter().map(String::from).collect(),
                        temporal_score: score,
                        total_amount: out_edges.iter().map(|e| e.amount).sum(),
                        tx_count: out_edges.len(),
                    });
                }
            }
        }
    }

    patterns
}
