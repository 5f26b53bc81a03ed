//! Query-time heuristic hops between components that build-time repair left apart

use log::{debug, trace};
use serde::Serialize;

use crate::model::QueryGraph;
use crate::{Meters, NodeId, PatchConfig, haversine_meters};

/// Result of heuristic patching
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatchOutcome {
    /// Hops added, as `(from, to, distance_m)`; their weights carry the penalty
    pub hops: Vec<(NodeId, NodeId, Meters)>,
    /// Iterations spent, including the final unsuccessful search if any
    pub iterations: usize,
    pub connected: bool,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    from: NodeId,
    to: NodeId,
    distance: Meters,
    score: f64,
}

/// Adds penalised hops to `graph` until `origin` and `destination` share a
/// component, no hop within `max_hop_m` remains, or the iteration cap is hit.
///
/// Hop sources come from the origin's component, preferring low-degree
/// frontier nodes. Each hop minimises
/// `distance(a, b) + target_bias * distance(b, destination)`, so hops lean
/// towards the destination rather than just towards any other component.
pub fn connect_heuristically(
    graph: &mut QueryGraph,
    origin: NodeId,
    destination: NodeId,
    config: &PatchConfig,
) -> PatchOutcome {
    let mut outcome = PatchOutcome::default();
    let Some(destination_position) = graph.position(destination) else {
        return outcome;
    };
    if graph.position(origin).is_none() {
        return outcome;
    }

    while outcome.iterations < config.max_iterations {
        if graph.components().same(origin, destination) {
            break;
        }
        outcome.iterations += 1;

        let Some(best) = best_hop(graph, origin, destination_position, config) else {
            debug!("Heuristic patching: no further hop within {} m", config.max_hop_m);
            break;
        };

        graph.add_query_edge(best.from, best.to, best.distance * config.hop_penalty);
        trace!(
            "Heuristic hop {} <-> {} ({:.1} m, weighted {:.1} m)",
            best.from,
            best.to,
            best.distance,
            best.distance * config.hop_penalty
        );
        outcome.hops.push((best.from, best.to, best.distance));
    }

    outcome.connected = graph.components().same(origin, destination);
    debug!(
        "Heuristic patching: {} hops in {} iterations, connected: {}",
        outcome.hops.len(),
        outcome.iterations,
        outcome.connected
    );
    outcome
}

fn best_hop(
    graph: &QueryGraph,
    origin: NodeId,
    destination_position: crate::LatLng,
    config: &PatchConfig,
) -> Option<Candidate> {
    let components = graph.components();
    let origin_component = components.of(origin)?;

    let members: Vec<NodeId> = components.members(origin_component).collect();
    let frontier: Vec<NodeId> = members
        .iter()
        .copied()
        .filter(|&id| graph.degree(id) <= config.frontier_max_degree)
        .collect();
    let sources = if frontier.is_empty() { members } else { frontier };

    let mut best: Option<Candidate> = None;
    for from in sources {
        let Some(from_position) = graph.position(from) else {
            continue;
        };
        for (to, distance) in graph.nodes_within(from_position, config.max_hop_m) {
            if components.of(to) == Some(origin_component) {
                continue;
            }
            let Some(to_position) = graph.position(to) else {
                continue;
            };
            let score =
                distance + config.target_bias * haversine_meters(to_position, destination_position);
            let candidate = Candidate {
                from,
                to,
                distance,
                score,
            };
            if best.is_none_or(|b| is_better(&candidate, &b)) {
                best = Some(candidate);
            }
        }
    }
    best
}

fn is_better(candidate: &Candidate, current: &Candidate) -> bool {
    candidate
        .score
        .total_cmp(&current.score)
        .then(candidate.from.cmp(&current.from))
        .then(candidate.to.cmp(&current.to))
        .is_lt()
}
