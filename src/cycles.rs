//! Cycle Detector — Tarjan SCC pruning followed by bounded-depth DFS to
//! enumerate simple directed cycles of length 3–5.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::graph::TransactionGraph;
use crate::AnalysisConfig;

/// A normalized simple cycle: members rotated to start at the
/// lexicographically smallest account, traversal direction preserved.
#[derive(Debug, Clone)]
pub struct CycleResult {
    pub members: Vec<String>,
    pub cycle_length: usize,
}

/// Runs the candidate/SCC-prune/bounded-DFS pipeline described in the
/// cycle detector's contract. Aborts cleanly once `config.max_time_s`
/// elapses or `config.max_cycles` cycles have been found, returning
/// whatever was found so far.
pub fn detect(graph: &TransactionGraph, config: &AnalysisConfig) -> Vec<CycleResult> {
    let candidates: HashSet<String> = graph
        .nodes()
        .iter()
        .filter(|account| {
            graph
                .stats(account)
                .map(|s| s.in_degree > 0 && s.out_degree > 0)
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    if candidates.is_empty() {
        return Vec::new();
    }

    let scc_nodes = tarjan_scc_nodes(graph, &candidates);
    if scc_nodes.is_empty() {
        return Vec::new();
    }

    let mut starts: Vec<String> = scc_nodes.iter().cloned().collect();
    starts.sort_by(|a, b| {
        let da = degree_sum(graph, a);
        let db = degree_sum(graph, b);
        db.cmp(&da).then_with(|| a.cmp(b))
    });

    let deadline = Instant::now() + Duration::from_secs_f64(config.max_time_s.max(0.0));
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut results: Vec<CycleResult> = Vec::new();

    for start in &starts {
        if Instant::now() >= deadline || results.len() >= config.max_cycles {
            break;
        }
        let mut visited: HashSet<String> = HashSet::new();
        let mut path: Vec<String> = vec![start.clone()];
        visited.insert(start.clone());
        dfs_bounded(
            graph,
            &scc_nodes,
            start,
            start,
            &mut visited,
            &mut path,
            0,
            &mut results,
            &mut seen_keys,
            config,
            deadline,
        );
    }

    results
}

fn degree_sum(graph: &TransactionGraph, account: &str) -> usize {
    graph.stats(account).map(|s| s.in_degree + s.out_degree).unwrap_or(0)
}

#[allow(clippy::too_many_arguments)]
fn dfs_bounded(
    graph: &TransactionGraph,
    scc_nodes: &HashSet<String>,
    start: &str,
    current: &str,
    visited: &mut HashSet<String>,
    path: &mut Vec<String>,
    depth: usize,
    results: &mut Vec<CycleResult>,
    seen_keys: &mut HashSet<String>,
    config: &AnalysisConfig,
    deadline: Instant,
) {
    for edge in graph.out_edges(current) {
        if Instant::now() >= deadline || results.len() >= config.max_cycles {
            return;
        }
        if !scc_nodes.contains(edge.receiver.as_str()) {
            continue;
        }

        if edge.receiver == start && depth >= 2 {
            let (normalized, key) = normalize_cycle(path);
            if seen_keys.insert(key) {
                results.push(CycleResult {
                    cycle_length: normalized.len(),
                    members: normalized,
                });
            }
        } else if edge.receiver != start && !visited.contains(edge.receiver.as_str()) && depth < 4 {
            visited.insert(edge.receiver.clone());
            path.push(edge.receiver.clone());
            dfs_bounded(
                graph,
                scc_nodes,
                start,
                edge.receiver.as_str(),
                visited,
                path,
                depth + 1,
                results,
                seen_keys,
                config,
                deadline,
            );
            path.pop();
            visited.remove(edge.receiver.as_str());
        }
    }
}

/// Rotates a cycle to start at its lexicographically smallest member,
/// preserving traversal direction. Returns the rotated members and the
/// `"a->b->c"` dedup key.
pub fn normalize_cycle(path: &[String]) -> (Vec<String>, String) {
    let n = path.len();
    let min_idx = (0..n).min_by_key(|&i| &path[i]).unwrap_or(0);
    let rotated: Vec<String> = (0..n).map(|i| path[(min_idx + i) % n].clone()).collect();
    let key = rotated.join("->");
    (rotated, key)
}

/// Iterative Tarjan SCC over the candidate-induced subgraph, returning the
/// union of members of every SCC with at least 3 nodes.
fn tarjan_scc_nodes(graph: &TransactionGraph, candidates: &HashSet<String>) -> HashSet<String> {
    struct Frame {
        node: String,
        neighbors: Vec<String>,
        next: usize,
    }

    let mut index_counter: usize = 0;
    let mut indices: HashMap<String, usize> = HashMap::new();
    let mut low_link: HashMap<String, usize> = HashMap::new();
    let mut on_stack: HashSet<String> = HashSet::new();
    let mut tarjan_stack: Vec<String> = Vec::new();
    let mut result: HashSet<String> = HashSet::new();

    for root in candidates {
        if indices.contains_key(root) {
            continue;
        }

        indices.insert(root.clone(), index_counter);
        low_link.insert(root.clone(), index_counter);
        index_counter += 1;
        tarjan_stack.push(root.clone());
        on_stack.insert(root.clone());

        let neighbors: Vec<String> = graph
            .out_edges(root)
            .iter()
            .map(|e| e.receiver.clone())
            .filter(|r| candidates.contains(r))
            .collect();
        let mut call_stack: Vec<Frame> = vec![Frame {
            node: root.clone(),
            neighbors,
            next: 0,
        }];

        while let Some(frame) = call_stack.last_mut() {
            if frame.next < frame.neighbors.len() {
                let w = frame.neighbors[frame.next].clone();
                frame.next += 1;

                if !indices.contains_key(&w) {
                    indices.insert(w.clone(), index_counter);
                    low_link.insert(w.clone(), index_counter);
                    index_counter += 1;
                    tarjan_stack.push(w.clone());
                    on_stack.insert(w.clone());

                    let w_neighbors: Vec<String> = graph
                        .out_edges(&w)
                        .iter()
                        .map(|e| e.receiver.clone())
                        .filter(|r| candidates.contains(r))
                        .collect();
                    call_stack.push(Frame {
                        node: w,
                        neighbors: w_neighbors,
                        next: 0,
                    });
                } else if on_stack.contains(&w) {
                    let w_index = indices[&w];
                    let v = &frame.node;
                    let v_low = low_link[v];
                    if w_index < v_low {
                        low_link.insert(v.clone(), w_index);
                    }
                }
            } else {
                let v = frame.node.clone();
                call_stack.pop();

                if let Some(parent) = call_stack.last() {
                    let v_low = low_link[&v];
                    let p_low = low_link[&parent.node];
                    if v_low < p_low {
                        low_link.insert(parent.node.clone(), v_low);
                    }
                }

                if low_link[&v] == indices[&v] {
                    let mut scc: Vec<String> = Vec::new();
                    while let Some(w) = tarjan_stack.pop() {
                        on_stack.remove(&w);
                        let is_v = w == v;
                        scc.push(w);
                        if is_v {
                            break;
                        }
                    }
                    if scc.len() >= 3 {
                        result.extend(scc);
                    }
                }
            }
        }
    }

    result
}
