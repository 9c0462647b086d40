//! Graph Projector — builds a size-bounded node/edge set for downstream
//! visualization, prioritizing ring members and suspicious accounts when
//! the full graph exceeds the rendering budget.

use std::collections::{HashMap, HashSet};

use crate::graph::TransactionGraph;
use crate::scoring::ScoringOutput;
use crate::{AnalysisConfig, GraphData, GraphEdge, GraphNode};

const CONTEXT_NEIGHBOR_CAP: usize = 5;
const CONTEXT_SCORE_THRESHOLD: f64 = 50.0;

fn degree_sum(graph: &TransactionGraph, account: &str) -> usize {
    graph.stats(account).map(|s| s.in_degree + s.out_degree).unwrap_or(0)
}

fn select_nodes(
    graph: &TransactionGraph,
    scoring: &ScoringOutput,
    config: &AnalysisConfig,
) -> (HashSet<String>, bool) {
    let total = graph.nodes().len();
    if total <= config.max_nodes {
        return (graph.nodes().iter().cloned().collect(), false);
    }

    let mut selected: HashSet<String> = HashSet::new();

    for account in scoring.ring_membership.keys() {
        selected.insert(account.clone());
    }
    for account in &scoring.suspicious_accounts {
        selected.insert(account.account_id.clone());
    }

    if selected.len() < config.max_nodes {
        let mut remaining: Vec<&String> = graph
            .nodes()
            .iter()
            .filter(|a| !selected.contains(a.as_str()))
            .collect();
        remaining.sort_by(|a, b| degree_sum(graph, b).cmp(&degree_sum(graph, a)));
        for account in remaining {
            if selected.len() >= config.max_nodes {
                break;
            }
            selected.insert(account.clone());
        }
    }

    let context_cap = config.max_nodes + 50;
    if selected.len() < context_cap {
        let mut high_score_accounts: Vec<String> = scoring
            .account_scores
            .iter()
            .filter(|(_, score)| **score >= CONTEXT_SCORE_THRESHOLD)
            .map(|(account, _)| account.clone())
            .collect();
        high_score_accounts.sort();

        'outer: for account in &high_score_accounts {
            let mut out_added = 0usize;
            for edge in graph.out_edges(account) {
                if out_added >= CONTEXT_NEIGHBOR_CAP {
                    break;
                }
                if selected.len() >= context_cap {
                    break 'outer;
                }
                if selected.insert(edge.receiver.clone()) {
                    out_added += 1;
                }
            }
            let mut in_added = 0usize;
            for edge in graph.in_edges(account) {
                if in_added >= CONTEXT_NEIGHBOR_CAP {
                    break;
                }
                if selected.len() >= context_cap {
                    break 'outer;
                }
                if selected.insert(edge.sender.clone()) {
                    in_added += 1;
                }
            }
        }
    }

    (selected, true)
}

fn classification(account: &str, scoring: &ScoringOutput) -> &'static str {
    if scoring.ring_membership.contains_key(account) {
        "ring"
    } else if scoring.account_scores.get(account).copied().unwrap_or(0.0) > 0.0 {
        "suspicious"
    } else {
        "normal"
    }
}

fn size_val(total_volume: f64) -> f64 {
    let raw = 20.0 + 3.0 * (total_volume + 1.0).log2();
    (raw.min(50.0) * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Builds the bounded node/edge projection for visualization.
pub fn build(graph: &TransactionGraph, scoring: &ScoringOutput, config: &AnalysisConfig) -> GraphData {
    let total_nodes = graph.nodes().len();
    let (selected, is_filtered) = select_nodes(graph, scoring, config);

    let mut nodes: Vec<GraphNode> = selected
        .iter()
        .map(|account| {
            let stats = graph.stats(account);
            let in_degree = stats.map(|s| s.in_degree).unwrap_or(0);
            let out_degree = stats.map(|s| s.out_degree).unwrap_or(0);
            let total_in = stats.map(|s| s.total_in).unwrap_or(0.0);
            let total_out = stats.map(|s| s.total_out).unwrap_or(0.0);
            let tx_count = stats.map(|s| s.tx_count).unwrap_or(0);
            let score = scoring.account_scores.get(account).copied().unwrap_or(0.0);

            GraphNode {
                account_id: account.clone(),
                classification: classification(account, scoring).to_string(),
                score,
                in_degree,
                out_degree,
                total_in: round2(total_in),
                total_out: round2(total_out),
                tx_count,
                ring_id: scoring.ring_membership.get(account).cloned(),
                detected_patterns: scoring
                    .account_tags
                    .get(account)
                    .cloned()
                    .unwrap_or_default(),
                size_val: size_val(total_in + total_out),
            }
        })
        .collect();
    nodes.sort_by(|a, b| a.account_id.cmp(&b.account_id));

    let mut aggregated: HashMap<(String, String), (f64, usize)> = HashMap::new();
    for account in &selected {
        for edge in graph.out_edges(account) {
            if !selected.contains(&edge.receiver) {
                continue;
            }
            let entry = aggregated
                .entry((account.clone(), edge.receiver.clone()))
                .or_insert((0.0, 0));
            entry.0 += edge.amount;
            entry.1 += 1;
        }
    }

    let suspicious_set: HashSet<&String> = scoring
        .account_scores
        .iter()
        .filter(|(_, s)| **s > 0.0)
        .map(|(a, _)| a)
        .chain(scoring.ring_membership.keys())
        .collect();

    let mut edges: Vec<GraphEdge> = aggregated
        .into_iter()
        .map(|((source, target), (total_amount, tx_count))| {
            let source_score = scoring.account_scores.get(&source).copied().unwrap_or(0.0);
            let target_score = scoring.account_scores.get(&target).copied().unwrap_or(0.0);
            let suspicious = suspicious_set.contains(&source) || suspicious_set.contains(&target);
            let suspicion_score = source_score.max(target_score);
            let weight = (((total_amount + 1.0).log2() * 0.5).clamp(1.0, 5.0) * 100.0).round() / 100.0;

            GraphEdge {
                id: format!("{source}->{target}"),
                source,
                target,
                total_amount: round2(total_amount),
                tx_count,
                is_suspicious: suspicious,
                suspicion_score: (suspicion_score * 10.0).round() / 10.0,
                weight,
            }
        })
        .collect();

    edges.sort_by(|a, b| a.id.cmp(&b.id));
    if edges.len() > config.max_edges {
        edges.sort_by(|a, b| {
            b.is_suspicious
                .cmp(&a.is_suspicious)
                .then_with(|| b.total_amount.partial_cmp(&a.total_amount).unwrap_or(std::cmp::Ordering::Equal))
        });
        edges.truncate(config.max_edges);
    }

    let rendered_nodes = nodes.len();
    GraphData {
        nodes,
        edges,
        total_nodes,
        rendered_nodes,
        is_filtered,
    }
}
