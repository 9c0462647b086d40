//! Shell-Chain Detector — greedy chain extension through low-activity
//! pass-through accounts ("shell candidates").

use std::collections::HashSet;

use crate::graph::TransactionGraph;
use crate::AnalysisConfig;

#[derive(Debug, Clone)]
pub struct ShellChain {
    pub chain: Vec<String>,
    pub shell_accounts: Vec<String>,
    pub hop_count: usize,
}

/// An account is a shell candidate when it relays funds with minimal
/// activity: 2 or 3 total transactions, with at least one in and one out.
pub fn is_shell_candidate(graph: &TransactionGraph, account: &str) -> bool {
    match graph.stats(account) {
        Some(stats) => {
            (2..=3).contains(&stats.tx_count) && stats.in_degree > 0 && stats.out_degree > 0
        }
        None => false,
    }
}

/// Walks a greedy chain starting at `start`, preferring to extend through
/// an unvisited shell candidate and otherwise taking the first unvisited
/// non-shell receiver before stopping.
fn walk_chain(graph: &TransactionGraph, start: &str, config: &AnalysisConfig) -> Vec<String> {
    let mut chain = vec![start.to_string()];
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.to_string());

    while chain.len() < config.max_chain_length {
        let tail = chain.last().unwrap().clone();
        let out_edges = graph.out_edges(&tail);

        let mut shell_next: Option<String> = None;
        let mut plain_next: Option<String> = None;
        for edge in out_edges {
            if visited.contains(&edge.receiver) {
                continue;
            }
            if is_shell_candidate(graph, &edge.receiver) {
                shell_next = Some(edge.receiver.clone());
                break;
            }
            if plain_next.is_none() {
                plain_next = Some(edge.receiver.clone());
            }
        }

        if let Some(next) = shell_next {
            visited.insert(next.clone());
            chain.push(next);
            continue;
        }
        if let Some(next) = plain_next {
            visited.insert(next.clone());
            chain.push(next);
        }
        break;
    }

    chain
}

/// Discovers chains of length >= 4 whose interior contains at least one
/// shell candidate, iterating starts in node insertion order.
pub fn detect(graph: &TransactionGraph, config: &AnalysisConfig) -> Vec<ShellChain> {
    let mut chains = Vec::new();

    for start in graph.nodes() {
        if chains.len() >= config.max_chains {
            break;
        }
        if is_shell_candidate(graph, start) {
            continue;
        }

        let chain = walk_chain(graph, start, config);
        if chain.len() < 4 {
            continue;
        }

        let interior = &chain[1..chain.len() - 1];
        let shell_accounts: Vec<String> = interior
            .iter()
            .filter(|account| is_shell_candidate(graph, account))
            .cloned()
            .collect();

        if shell_accounts.is_empty() {
            continue;
        }

        let hop_count = chain.len() - 1;
        chains.push(ShellChain {
            chain,
            shell_accounts,
            hop_count,
        });
    }

    chains
}
