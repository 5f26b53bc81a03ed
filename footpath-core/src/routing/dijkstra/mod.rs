//! Single-source shortest paths over non-negative edge weights

mod state;

use std::collections::BinaryHeap;

use state::State;

use crate::model::FootpathGraph;
use crate::{Meters, NodeId};

/// Node sequence of a shortest path and its total weight
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    /// From source to target, both included
    pub nodes: Vec<NodeId>,
    pub cost: Meters,
}

/// Dijkstra's algorithm from `source` to `target`.
///
/// Stops as soon as the target is settled. Returns `None` when the target is
/// unreachable or either node does not exist.
pub fn shortest_path(
    graph: &FootpathGraph,
    source: NodeId,
    target: NodeId,
) -> Option<ShortestPath> {
    let n = graph.node_count();
    if source >= n || target >= n {
        return None;
    }
    if source == target {
        return Some(ShortestPath {
            nodes: vec![source],
            cost: 0.0,
        });
    }

    let mut distances = vec![f64::INFINITY; n];
    let mut predecessors: Vec<Option<NodeId>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    // Start node has distance 0
    distances[source] = 0.0;
    heap.push(State {
        cost: 0.0,
        node: source,
    });

    while let Some(State { cost, node }) = heap.pop() {
        if node == target {
            break;
        }

        // Skip if we've found a better path
        if cost > distances[node] {
            continue;
        }

        for edge in graph.edges(node) {
            let next_cost = cost + edge.weight;
            if next_cost < distances[edge.to] {
                distances[edge.to] = next_cost;
                predecessors[edge.to] = Some(node);
                heap.push(State {
                    cost: next_cost,
                    node: edge.to,
                });
            }
        }
    }

    if !distances[target].is_finite() {
        return None;
    }

    // Follow predecessors backward from target to source
    let mut nodes = vec![target];
    let mut current = target;
    while let Some(prev) = predecessors[current] {
        nodes.push(prev);
        current = prev;
    }
    nodes.reverse();

    Some(ShortestPath {
        nodes,
        cost: distances[target],
    })
}
