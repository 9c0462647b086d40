//! Scorer & Ring Assembler — combines cycle, smurfing, and shell-chain
//! findings with behavioral heuristics into bounded suspicion scores and
//! ring records, applying legitimacy dampening last.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::cycles::CycleResult;
use crate::graph::TransactionGraph;
use crate::legitimacy;
use crate::shell_chains::ShellChain;
use crate::smurfing::{SmurfDirection, SmurfPattern};
use crate::{AccountSuspicion, AnalysisConfig, FraudRing, RingPattern};

/// Everything downstream stages (graph projection) need about an account's
/// scoring outcome, including zero-score accounts that never surface in
/// `suspicious_accounts`.
pub struct ScoringOutput {
    pub suspicious_accounts: Vec<AccountSuspicion>,
    pub fraud_rings: Vec<FraudRing>,
    pub account_scores: HashMap<String, f64>,
    pub account_tags: HashMap<String, BTreeSet<String>>,
    pub ring_membership: HashMap<String, String>,
}

#[derive(Default)]
struct Accumulator {
    raw: HashMap<String, f64>,
    tags: HashMap<String, BTreeSet<String>>,
}

impl Accumulator {
    fn add(&mut self, account: &str, amount: f64, tags: &[&str]) {
        *self.raw.entry(account.to_string()).or_insert(0.0) += amount;
        let entry = self.tags.entry(account.to_string()).or_default();
        for tag in tags {
            entry.insert(tag.to_string());
        }
    }
}

struct PendingRing {
    ring_id: String,
    members: Vec<String>,
    pattern: RingPattern,
}

fn ring_id(counter: usize) -> String {
    let width = counter.to_string().len().max(3);
    format!("RING_{counter:0width$}")
}

fn mean_interval_seconds(epochs: &[i64]) -> Option<f64> {
    if epochs.len() < 2 {
        return None;
    }
    let mut sorted = epochs.to_vec();
    sorted.sort_unstable();
    let diffs: Vec<f64> = sorted.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    Some(diffs.iter().sum::<f64>() / diffs.len() as f64)
}

/// Runs the fixed-order additive scoring table and ring assembly over the
/// findings of the earlier detector stages.
pub fn assemble(
    graph: &TransactionGraph,
    cycles: &[CycleResult],
    smurf_patterns: &[SmurfPattern],
    shell_chains: &[ShellChain],
    config: &AnalysisConfig,
) -> ScoringOutput {
    let mut acc = Accumulator::default();
    let mut ring_membership: HashMap<String, String> = HashMap::new();
    let mut pending_rings: Vec<PendingRing> = Vec::new();
    let mut counter = 0usize;

    for cycle in cycles {
        counter += 1;
        let id = ring_id(counter);
        let tag = format!("cycle_length_{}", cycle.cycle_length);
        for member in &cycle.members {
            acc.add(member, config.cycle_score_addend, &[tag.as_str()]);
            ring_membership.entry(member.clone()).or_insert_with(|| id.clone());
        }
        pending_rings.push(PendingRing {
            ring_id: id,
            members: cycle.members.clone(),
            pattern: RingPattern::Cycle {
                cycle_length: cycle.cycle_length,
            },
        });
    }

    for pattern in smurf_patterns {
        counter += 1;
        let id = ring_id(counter);
        let (center_tag, peer_tag) = match pattern.direction {
            SmurfDirection::FanIn => ("fan_in", "smurfing_fan_in"),
            SmurfDirection::FanOut => ("fan_out", "smurfing_fan_out"),
        };
        acc.add(
            &pattern.center_account,
            config.smurf_center_score_addend,
            &[center_tag, "high_velocity"],
        );
        ring_membership
            .entry(pattern.center_account.clone())
            .or_insert_with(|| id.clone());

        let mut members = vec![pattern.center_account.clone()];
        for peer in &pattern.connected_accounts {
            acc.add(peer, config.smurf_peer_score_addend, &[peer_tag]);
            ring_membership.entry(peer.clone()).or_insert_with(|| id.clone());
            members.push(peer.clone());
        }

        let pattern_variant = match pattern.direction {
            SmurfDirection::FanIn => RingPattern::FanIn {
                temporal_score: pattern.temporal_score,
            },
            SmurfDirection::FanOut => RingPattern::FanOut {
                temporal_score: pattern.temporal_score,
            },
        };
        pending_rings.push(PendingRing {
            ring_id: id,
            members,
            pattern: pattern_variant,
        });
    }

    for chain in shell_chains {
        counter += 1;
        let id = ring_id(counter);
        let shell_set: HashSet<&String> = chain.shell_accounts.iter().collect();
        for member in &chain.chain {
            let mut tags = vec!["shell_network"];
            if shell_set.contains(member) {
                tags.push("shell_intermediary");
            }
            acc.add(member, config.shell_score_addend, &tags);
            ring_membership.entry(member.clone()).or_insert_with(|| id.clone());
        }
        pending_rings.push(PendingRing {
            ring_id: id,
            members: chain.chain.clone(),
            pattern: RingPattern::ShellNetwork {
                hop_count: chain.hop_count,
            },
        });
    }

    for account in graph.nodes() {
        let stats = match graph.stats(account) {
            Some(s) => s,
            None => continue,
        };

        if stats.tx_count >= config.velocity_min_tx_count {
            if let Some(mean_interval) = mean_interval_seconds(&stats.epochs) {
                if mean_interval < config.velocity_max_mean_interval_s {
                    acc.add(account, config.velocity_score_addend, &["high_velocity"]);
                }
            }
        }

        if stats.in_degree > 0 && stats.out_degree > 0 {
            let (hi, lo) = if stats.in_degree > stats.out_degree {
                (stats.in_degree, stats.out_degree)
            } else {
                (stats.out_degree, stats.in_degree)
            };
            if lo > 0 && (hi as f64 / lo as f64) > config.degree_anomaly_ratio_threshold {
                acc.add(account, config.degree_anomaly_score_addend, &["degree_anomaly"]);
            }
        }

        if stats.total_in > 0.0 && stats.total_out > 0.0 && stats.tx_count >= config.pass_through_min_tx_count {
            let (hi, lo) = if stats.total_in > stats.total_out {
                (stats.total_in, stats.total_out)
            } else {
                (stats.total_out, stats.total_in)
            };
            if hi > 0.0 && (lo / hi) >= config.pass_through_ratio_threshold {
                acc.add(account, config.pass_through_score_addend, &["pass_through"]);
            }
        }
    }

    let legitimate = legitimacy::detect(graph, config);
    for account in &legitimate {
        if let Some(score) = acc.raw.get_mut(account) {
            *score = (*score * config.legitimacy_dampening_factor).round();
        }
        acc.tags
            .entry(account.clone())
            .or_default()
            .insert("likely_legitimate".to_string());
    }

    let mut account_scores: HashMap<String, f64> = HashMap::new();
    let mut account_tags: HashMap<String, BTreeSet<String>> = HashMap::new();
    for account in graph.nodes() {
        let raw = *acc.raw.get(account).unwrap_or(&0.0);
        let final_score = ((raw * 10.0).round() / 10.0).min(100.0);
        account_scores.insert(account.clone(), final_score);
        account_tags.insert(account.clone(), acc.tags.get(account).cloned().unwrap_or_default());
    }

    let mut suspicious_accounts: Vec<AccountSuspicion> = graph
        .nodes()
        .iter()
        .filter_map(|account| {
            let score = account_scores[account];
            if score > 0.0 {
                Some(AccountSuspicion {
                    account_id: account.clone(),
                    suspicion_score: score,
                    detected_patterns: account_tags[account].clone(),
                    ring_id: ring_membership.get(account).cloned(),
                })
            } else {
                None
            }
        })
        .collect();
    suspicious_accounts.sort_by(|a, b| {
        b.suspicion_score
            .partial_cmp(&a.suspicion_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut fraud_rings: Vec<FraudRing> = pending_rings
        .into_iter()
        .map(|pending| {
            let mean = pending
                .members
                .iter()
                .map(|m| account_scores.get(m).copied().unwrap_or(0.0))
                .sum::<f64>()
                / pending.members.len() as f64;
            FraudRing {
                ring_id: pending.ring_id,
                member_accounts: pending.members,
                risk_score: (mean * 10.0).round() / 10.0,
                pattern: pending.pattern,
            }
        })
        .collect();
    fraud_rings.sort_by(|a, b| {
        b.risk_score.partial_cmp(&a.risk_score).unwrap_or(std::cmp::Ordering::Equal)
    });

    ScoringOutput {
        suspicious_accounts,
        fraud_rings,
        account_scores,
        account_tags,
        ring_membership,
    }
}
