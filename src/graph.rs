//! Graph Builder — reshapes a raw transaction batch into adjacency lists,
//! reverse-adjacency lists, and per-account statistics.
//!
//! This is the only stage that touches the raw [`Transaction`] records;
//! every later stage reads the immutable [`TransactionGraph`] it produces.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDateTime, TimeZone, Utc};
use tracing::warn;

use crate::Transaction;

/// Accepted timestamp formats, tried in this exact priority order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parses a timestamp against the accepted format list, trimming first.
/// Returns `None` if no format matches.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp());
        }
    }
    None
}

/// An occurrence of a transaction on a sender's outgoing adjacency list.
#[derive(Debug, Clone)]
pub struct OutEdge {
    pub receiver: String,
    pub amount: f64,
    pub epoch_seconds: i64,
    pub transaction_id: String,
}

/// An occurrence of a transaction on a receiver's incoming adjacency list.
#[derive(Debug, Clone)]
pub struct InEdge {
    pub sender: String,
    pub amount: f64,
    pub epoch_seconds: i64,
    pub transaction_id: String,
}

/// Per-account aggregate statistics.
#[derive(Debug, Clone, Default)]
pub struct NodeStats {
    pub in_degree: usize,
    pub out_degree: usize,
    pub total_in: f64,
    pub total_out: f64,
    pub tx_count: usize,
    pub epochs: Vec<i64>,
}

/// The in-memory directed multigraph produced by [`build`].
///
/// Read-only once constructed: no later stage mutates this structure.
#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    adjacency: HashMap<String, Vec<OutEdge>>,
    reverse: HashMap<String, Vec<InEdge>>,
    node_order: Vec<String>,
    node_set: HashSet<String>,
    stats: HashMap<String, NodeStats>,
}

impl TransactionGraph {
    /// Accounts in first-appearance (insertion) order.
    pub fn nodes(&self) -> &[String] {
        &self.node_order
    }

    /// Outgoing edges for an account, in input order. Empty slice if the
    /// account never sent a transaction.
    pub fn out_edges(&self, account: &str) -> &[OutEdge] {
        self.adjacency.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Incoming edges for an account, in input order. Empty slice if the
    /// account never received a transaction.
    pub fn in_edges(&self, account: &str) -> &[InEdge] {
        self.reverse.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Aggregate statistics for an account, if it appears in the graph.
    pub fn stats(&self, account: &str) -> Option<&NodeStats> {
        self.stats.get(account)
    }

    fn touch_node(&mut self, account: &str) {
        if self.node_set.insert(account.to_string()) {
            self.node_order.push(account.to_string());
        }
    }
}

/// Builds a [`TransactionGraph`] from a raw transaction batch.
///
/// Records with an amount that isn't a finite, non-negative real, or a
/// timestamp that matches none of the accepted formats, are skipped and
/// logged; the batch continues. Self-loops (`sender_id == receiver_id`) are
/// accepted and counted on both sides of the account's statistics.
pub fn build(transactions: &[Transaction]) -> TransactionGraph {
    let mut graph = TransactionGraph::default();

    for tx in transactions {
        if !tx.amount.is_finite() || tx.amount < 0.0 {
            warn!(
                transaction_id = %tx.transaction_id,
                amount = tx.amount,
                "skipping transaction: amount is not a finite, non-negative real"
            );
            continue;
        }

        let epoch_seconds = match parse_timestamp(&tx.timestamp) {
            Some(epoch) => epoch,
            None => {
                warn!(
                    transaction_id = %tx.transaction_id,
                    timestamp = %tx.timestamp,
                    "skipping transaction: unrecognized timestamp format"
                );
                continue;
            }
        };

        graph.touch_node(&tx.sender_id);
        graph.touch_node(&tx.receiver_id);

        graph
            .adjacency
            .entry(tx.sender_id.clone())
            .or_default()
            .push(OutEdge {
                receiver: tx.receiver_id.clone(),
                amount: tx.amount,
                epoch_seconds,
                transaction_id: tx.transaction_id.clone(),
            });
        graph
            .reverse
            .entry(tx.receiver_id.clone())
            .or_default()
            .push(InEdge {
                sender: tx.sender_id.clone(),
                amount: tx.amount,
                epoch_seconds,
                transaction_id: tx.transaction_id.clone(),
            });

        let sender_stats = graph.stats.entry(tx.sender_id.clone()).or_default();
        sender_stats.out_degree += 1;
        sender_stats.total_out += tx.amount;
        sender_stats.tx_count += 1;
        sender_stats.epochs.push(epoch_seconds);

        let receiver_stats = graph.stats.entry(tx.receiver_id.clone()).or_default();
        receiver_stats.in_degree += 1;
        receiver_stats.total_in += tx.amount;
        receiver_stats.tx_count += 1;
        receiver_stats.epochs.push(epoch_seconds);
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: &str, from: &str, to: &str, amount: f64, ts: &str) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            sender_id: from.to_string(),
            receiver_id: to.to_string(),
            amount,
            timestamp: ts.to_string(),
        }
    }

    #[test]
    fn parses_all_accepted_formats() {
        assert!(parse_timestamp("2024-01-05 10:30:00").is_some());
        assert!(parse_timestamp("05-01-2024 10:30").is_some());
        assert!(parse_timestamp("05-01-2024 10:30:15").is_some());
        assert!(parse_timestamp("01-05-2024 10:30").is_some());
        assert!(parse_timestamp("2024/01/05 10:30:00").is_some());
        assert!(parse_timestamp("05/01/2024 10:30").is_some());
    }

    #[test]
    fn trims_before_parsing() {
        assert!(parse_timestamp("  2024-01-05 10:30:00  ").is_some());
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(parse_timestamp("not a timestamp").is_none());
        assert!(parse_timestamp("Jan 5th 2024").is_none());
    }

    #[test]
    fn priority_order_prefers_day_month_over_month_day() {
        // 13 can't be a month, so this disambiguates: DD-MM-YYYY wins.
        let epoch = parse_timestamp("13-01-2024 08:00").unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 1, 13, 8, 0, 0).unwrap().timestamp();
        assert_eq!(epoch, expected);
    }

    #[test]
    fn builds_adjacency_and_stats() {
        let txs = vec![
            tx("T1", "A", "B", 100.0, "2024-01-01 00:00:00"),
            tx("T2", "B", "C", 50.0, "2024-01-01 01:00:00"),
        ];
        let graph = build(&txs);
        assert_eq!(graph.nodes(), &["A".to_string(), "B".to_string(), "C".to_string()]);
        assert_eq!(graph.out_edges("A").len(), 1);
        assert_eq!(graph.in_edges("B").len(), 1);
        let b_stats = graph.stats("B").unwrap();
        assert_eq!(b_stats.in_degree, 1);
        assert_eq!(b_stats.out_degree, 1);
        assert_eq!(b_stats.tx_count, 2);
    }

    #[test]
    fn self_loop_counts_both_sides() {
        let txs = vec![tx("T1", "A", "A", 10.0, "2024-01-01 00:00:00")];
        let graph = build(&txs);
        let stats = graph.stats("A").unwrap();
        assert_eq!(stats.in_degree, 1);
        assert_eq!(stats.out_degree, 1);
        assert_eq!(stats.tx_count, 2);
        assert_eq!(stats.epochs.len(), 2);
    }

    #[test]
    fn skips_invalid_amount_and_timestamp() {
        let txs = vec![
            tx("T1", "A", "B", -5.0, "2024-01-01 00:00:00"),
            tx("T2", "A", "B", f64::NAN, "2024-01-01 00:00:00"),
            tx("T3", "A", "B", 10.0, "garbage"),
            tx("T4", "A", "B", 10.0, "2024-01-01 00:00:00"),
        ];
        let graph = build(&txs);
        assert_eq!(graph.out_edges("A").len(), 1);
        assert_eq!(graph.out_edges("A")[0].transaction_id, "T4");
    }
}
