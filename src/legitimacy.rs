//! Legitimacy Filter — tags accounts whose traffic shape resembles benign
//! merchants or payroll distributors, based on amount coefficient of
//! variation rather than volume alone.

use std::collections::HashSet;

use crate::graph::TransactionGraph;
use crate::AnalysisConfig;

/// Population coefficient of variation: `sqrt(population_variance) / mean`.
/// `None` when the sample is empty or its mean is not positive.
pub fn coefficient_of_variation(amounts: &[f64]) -> Option<f64> {
    if amounts.is_empty() {
        return None;
    }
    let n = amounts.len() as f64;
    let mean = amounts.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return None;
    }
    let variance = amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt() / mean)
}

/// Accounts whose in/out traffic shape matches a merchant (many small,
/// steady incoming payments) or payroll (many small, steady outgoing
/// payments) pattern.
pub fn detect(graph: &TransactionGraph, config: &AnalysisConfig) -> HashSet<String> {
    let mut legitimate = HashSet::new();

    for account in graph.nodes() {
        let stats = match graph.stats(account) {
            Some(s) => s,
            None => continue,
        };

        if stats.in_degree >= config.merchant_min_in_degree && stats.out_degree <= config.merchant_max_out_degree {
            let amounts: Vec<f64> = graph.in_edges(account).iter().map(|e| e.amount).collect();
            if let Some(cv) = coefficient_of_variation(&amounts) {
                if cv < config.merchant_cv_threshold {
                    legitimate.insert(account.clone());
                    continue;
                }
            }
        }

        if stats.out_degree >= config.payroll_min_out_degree && stats.in_degree <= config.payroll_max_in_degree {
            let amounts: Vec<f64> = graph.out_edges(account).iter().map(|e| e.amount).collect();
            if let Some(cv) = coefficient_of_variation(&amounts) {
                if cv < config.payroll_cv_threshold {
                    legitimate.insert(account.clone());
                }
            }
        }
    }

    legitimate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build;
    use crate::Transaction;

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
    fn cv_none_for_empty_or_zero_mean() {
        assert_eq!(coefficient_of_variation(&[]), None);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), None);
    }

    #[test]
    fn cv_zero_for_uniform_sample() {
        let cv = coefficient_of_variation(&[50.0, 50.0, 50.0]).unwrap();
        assert!(cv.abs() < 1e-12);
    }

    #[test]
    fn merchant_pattern_detected() {
        let mut txs = Vec::new();
        for i in 0..25 {
            let amount = 50.0 + (i % 3) as f64;
            txs.push(tx(
                &format!("T{i}"),
                &format!("C{i}"),
                "SHOP",
                amount,
                &format!("2024-01-{:02} 00:00:00", (i % 28) + 1),
            ));
        }
        let graph = build(&txs);
        let legit = detect(&graph, &AnalysisConfig::default());
        assert!(legit.contains("SHOP"));
    }

    #[test]
    fn high_variance_incoming_not_flagged_merchant() {
        let mut txs = Vec::new();
        for i in 0..25 {
            let amount = if i % 2 == 0 { 1.0 } else { 5000.0 };
            txs.push(tx(
                &format!("T{i}"),
                &format!("C{i}"),
                "VOLATILE",
                amount,
                "2024-01-01 00:00:00",
            ));
        }
        let graph = build(&txs);
        let legit = detect(&graph, &AnalysisConfig::default());
        assert!(!legit.contains("VOLATILE"));
    }
}
