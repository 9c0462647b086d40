//! # Fraud Ring Forensics
//!
//! A batch graph-analytics engine for detecting money-laundering topologies
//! in transaction data.
//!
//! ## Features
//!
//! - **Circular fund routing** — bounded-length simple cycle enumeration with
//!   strongly-connected-component pruning.
//! - **Smurfing detection** — fan-in/fan-out bursts qualified by sliding-window
//!   temporal density.
//! - **Shell-chain discovery** — greedy chain extension through low-activity
//!   pass-through accounts.
//! - **Legitimacy dampening** — amount-variance heuristics suppress merchant
//!   and payroll false positives.
//! - **Bounded visualization projection** — a size-capped node/edge set for
//!   downstream rendering.
//!
//! The entire pipeline is exposed through one pure function, [`analyze`],
//! which never performs I/O and never blocks except on its own CPU budget.

pub mod cycles;
pub mod graph;
pub mod legitimacy;
pub mod projection;
pub mod scoring;
pub mod shell_chains;
pub mod smurfing;

use std::collections::BTreeSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A single directed, timestamped transfer between two accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub amount: f64,
    pub timestamp: String,
}

/// Every numeric threshold used across the pipeline, collected so callers
/// can tune the run (e.g. a faster budget for tests) without the crate
/// hard-coding constants.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub max_cycles: usize,
    pub max_time_s: f64,
    pub fanin_threshold: usize,
    pub fanout_threshold: usize,
    pub temporal_window_s: i64,
    pub max_chains: usize,
    pub merchant_min_in_degree: usize,
    pub merchant_max_out_degree: usize,
    pub merchant_cv_threshold: f64,
    pub payroll_min_out_degree: usize,
    pub payroll_max_in_degree: usize,
    pub payroll_cv_threshold: f64,
    pub max_nodes: usize,
    pub max_edges: usize,
    /// Score addend for each member of a detected cycle.
    pub cycle_score_addend: f64,
    /// Score addend for a smurfing pattern's center account.
    pub smurf_center_score_addend: f64,
    /// Score addend for a smurfing pattern's peer accounts.
    pub smurf_peer_score_addend: f64,
    /// Score addend for each member of a detected shell chain.
    pub shell_score_addend: f64,
    /// Score addend for the high-velocity behavioral heuristic.
    pub velocity_score_addend: f64,
    /// Score addend for the in/out degree-anomaly behavioral heuristic.
    pub degree_anomaly_score_addend: f64,
    /// Score addend for the pass-through behavioral heuristic.
    pub pass_through_score_addend: f64,
    /// Minimum transaction count for the high-velocity heuristic to fire.
    pub velocity_min_tx_count: usize,
    /// Mean inter-transaction interval, in seconds, below which the
    /// high-velocity heuristic fires.
    pub velocity_max_mean_interval_s: f64,
    /// In/out degree ratio above which the degree-anomaly heuristic fires.
    pub degree_anomaly_ratio_threshold: f64,
    /// Minimum transaction count for the pass-through heuristic to fire.
    pub pass_through_min_tx_count: usize,
    /// In/out volume ratio at or above which the pass-through heuristic fires.
    pub pass_through_ratio_threshold: f64,
    /// Multiplier applied to a likely-legitimate account's raw score.
    pub legitimacy_dampening_factor: f64,
    /// Maximum hops a shell-chain walk will extend before stopping.
    pub max_chain_length: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_cycles: 200,
            max_time_s: 4.0,
            fanin_threshold: 10,
            fanout_threshold: 10,
            temporal_window_s: 72 * 3600,
            max_chains: 100,
            merchant_min_in_degree: 20,
            merchant_max_out_degree: 3,
            merchant_cv_threshold: 0.5,
            payroll_min_out_degree: 20,
            payroll_max_in_degree: 3,
            payroll_cv_threshold: 0.3,
            max_nodes: 300,
            max_edges: 2000,
            cycle_score_addend: 30.0,
            smurf_center_score_addend: 25.0,
            smurf_peer_score_addend: 15.0,
            shell_score_addend: 20.0,
            velocity_score_addend: 10.0,
            degree_anomaly_score_addend: 10.0,
            pass_through_score_addend: 5.0,
            velocity_min_tx_count: 5,
            velocity_max_mean_interval_s: 3600.0,
            degree_anomaly_ratio_threshold: 5.0,
            pass_through_min_tx_count: 4,
            pass_through_ratio_threshold: 0.85,
            legitimacy_dampening_factor: 0.5,
            max_chain_length: 11,
        }
    }
}

/// Errors that abort the batch outright. Every other documented error class
/// (record skips, budget exhaustion) is absorbed into a successful report.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

/// A detected ring's pattern-specific payload, discriminated by
/// `pattern_type` in its serialized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "pattern_type", rename_all = "snake_case")]
pub enum RingPattern {
    Cycle { cycle_length: usize },
    FanIn { temporal_score: f64 },
    FanOut { temporal_score: f64 },
    ShellNetwork { hop_count: usize },
}

/// One detected fraud ring: an ordered group of accounts implicated by a
/// single pattern occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudRing {
    pub ring_id: String,
    pub member_accounts: Vec<String>,
    pub risk_score: f64,
    #[serde(flatten)]
    pub pattern: RingPattern,
}

/// An account's final suspicion outcome. Absent from the report entirely
/// when its score is zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSuspicion {
    pub account_id: String,
    pub suspicion_score: f64,
    pub detected_patterns: BTreeSet<String>,
    pub ring_id: Option<String>,
}

/// A node in the bounded visualization projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub account_id: String,
    pub classification: String,
    pub score: f64,
    pub in_degree: usize,
    pub out_degree: usize,
    pub total_in: f64,
    pub total_out: f64,
    pub tx_count: usize,
    pub ring_id: Option<String>,
    pub detected_patterns: BTreeSet<String>,
    pub size_val: f64,
}

/// An aggregated `(source, target)` edge in the bounded visualization
/// projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub total_amount: f64,
    pub tx_count: usize,
    pub is_suspicious: bool,
    pub suspicion_score: f64,
    pub weight: f64,
}

/// The bounded node/edge projection handed to downstream rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub total_nodes: usize,
    pub rendered_nodes: usize,
    pub is_filtered: bool,
}

/// Aggregate counters surfaced alongside the detailed findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total_accounts_analyzed: usize,
    pub total_transactions: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    pub processing_time_seconds: f64,
}

/// The complete forensic report produced by one [`analyze`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub suspicious_accounts: Vec<AccountSuspicion>,
    pub fraud_rings: Vec<FraudRing>,
    pub summary: Summary,
    pub graph_data: GraphData,
}

/// Runs the full seven-stage pipeline over one batch of transactions.
///
/// `transactions` is consumed as a pure value; nothing in this crate
/// performs I/O or blocks beyond the cycle detector's own CPU budget.
/// Malformed records are skipped and logged, never surfaced as an error.
/// Only a defensive internal-invariant failure returns `Err`.
pub fn analyze(
    transactions: &[Transaction],
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    let started_at = Instant::now();
    let total_transactions = transactions.len();

    debug!(count = total_transactions, "building transaction graph");
    let tx_graph = graph::build(transactions);

    check_invariants(&tx_graph)?;

    debug!(accounts = tx_graph.nodes().len(), "running cycle detector");
    let cycles = cycles::detect(&tx_graph, config);

    debug!(cycles = cycles.len(), "running smurfing detector");
    let smurf_patterns = smurfing::detect(&tx_graph, config);

    debug!(patterns = smurf_patterns.len(), "running shell-chain detector");
    let chains = shell_chains::detect(&tx_graph, config);

    debug!(chains = chains.len(), "assembling scores and rings");
    let scored = scoring::assemble(&tx_graph, &cycles, &smurf_patterns, &chains, config);

    debug!("projecting bounded graph for visualization");
    let graph_data = projection::build(&tx_graph, &scored, config);

    let summary = Summary {
        total_accounts_analyzed: tx_graph.nodes().len(),
        total_transactions,
        suspicious_accounts_flagged: scored.suspicious_accounts.len(),
        fraud_rings_detected: scored.fraud_rings.len(),
        processing_time_seconds: (started_at.elapsed().as_secs_f64() * 100.0).round() / 100.0,
    };

    Ok(AnalysisReport {
        suspicious_accounts: scored.suspicious_accounts,
        fraud_rings: scored.fraud_rings,
        summary,
        graph_data,
    })
}

/// Defensive pass over the just-built graph. These conditions should be
/// unreachable given the builder's own filtering; this exists to catch a
/// future regression rather than to handle an expected input shape.
fn check_invariants(tx_graph: &graph::TransactionGraph) -> Result<(), AnalysisError> {
    for account in tx_graph.nodes() {
        let stats = tx_graph.stats(account).ok_or_else(|| {
            AnalysisError::InvariantViolation(format!("account {account} has no stats entry"))
        })?;
        if stats.total_in < 0.0 || stats.total_out < 0.0 {
            return Err(AnalysisError::InvariantViolation(format!(
                "account {account} carries a negative accumulated amount"
            )));
        }
        if stats.tx_count != stats.epochs.len() {
            return Err(AnalysisError::InvariantViolation(format!(
                "account {account} has {} epoch entries but tx_count {}",
                stats.epochs.len(),
                stats.tx_count
            )));
        }
    }
    Ok(())
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
    fn triangle_cycle_end_to_end() {
        let txs = vec![
            tx("T1", "A", "B", 100.0, "2024-01-01 00:00:00"),
            tx("T2", "B", "C", 100.0, "2024-01-01 01:00:00"),
            tx("T3", "C", "A", 100.0, "2024-01-01 02:00:00"),
        ];
        let report = analyze(&txs, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.summary.total_transactions, 3);
        assert_eq!(report.fraud_rings.len(), 1);
        assert_eq!(report.fraud_rings[0].ring_id, "RING_001");
        assert_eq!(report.suspicious_accounts.len(), 3);
        assert!(!report.graph_data.is_filtered);
    }

    #[test]
    fn malformed_timestamp_is_skipped_not_fatal() {
        let txs = vec![
            tx("T1", "A", "B", 10.0, "not-a-timestamp"),
            tx("T2", "C", "D", 10.0, "2024-01-01 00:00:00"),
        ];
        let report = analyze(&txs, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.summary.total_transactions, 2);
        assert_eq!(report.summary.total_accounts_analyzed, 2);
    }

    #[test]
    fn empty_batch_produces_empty_report() {
        let report = analyze(&[], &AnalysisConfig::default()).unwrap();
        assert_eq!(report.summary.total_accounts_analyzed, 0);
        assert!(report.suspicious_accounts.is_empty());
        assert!(report.fraud_rings.is_empty());
        assert!(!report.graph_data.is_filtered);
    }
}
