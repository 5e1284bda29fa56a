//! Workload fitter & scorer (component E).
//!
//! Drives the single-container fitter (component D) across every container
//! of a workload, applying each container's reservations to the node
//! snapshot before considering the next container, then scores the node.
//! Grounded on the original scheduler's `fitInDevices` + `calcScore`.

use crate::config::ScoringConfig;
use crate::error::{Error, Result};
use crate::fitter::{fit_container, FitOutcome};
use crate::ordering::sort_devices;
use crate::registry::DeviceTypeRegistry;
use crate::types::{
    Annotations, ContainerDevices, ContainerRequest, NodeScore, NodeScoreList, NodeUsage,
    SchedulingRequest,
};
use tracing::{debug, info};

/// Whether a node could host the whole workload, and if so its score and
/// per-container allocations.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeFitOutcome {
    Fit {
        allocations: Vec<ContainerDevices>,
        score: f64,
    },
    NoFit,
}

/// Score every candidate node in `request` against its container list,
/// emitting only the nodes that could host every container.
///
/// Node snapshots are mutated in place during evaluation (reservations from
/// earlier containers are visible to later ones) and are not meant to be
/// reused afterward — callers should discard `request.nodes` once scoring
/// completes, matching the snapshot's evaluation-scoped lifetime.
pub fn score_nodes(
    request: &mut SchedulingRequest,
    registry: &DeviceTypeRegistry,
    scoring: &ScoringConfig,
) -> NodeScoreList {
    let mut results = Vec::with_capacity(request.nodes.len());
    for (node_id, node) in request.nodes.iter_mut() {
        match score_node(node_id, node, &request.containers, &request.workload.annotations, registry, scoring) {
            NodeFitOutcome::Fit { allocations, score } => {
                info!(node_id = %node_id, score, "node fit workload");
                results.push(NodeScore {
                    node_id: node_id.clone(),
                    allocations,
                    score,
                });
            }
            NodeFitOutcome::NoFit => {
                debug!(node_id = %node_id, "node could not host every container");
            }
        }
    }
    results
}

/// Evaluate one node against a workload's container list (the body of the
/// loop in `score_nodes`, split out so tests can exercise a single node
/// without building a full `SchedulingRequest`).
pub fn score_node(
    node_id: &str,
    node: &mut NodeUsage,
    containers: &[ContainerRequest],
    annotations: &Annotations,
    registry: &DeviceTypeRegistry,
    scoring: &ScoringConfig,
) -> NodeFitOutcome {
    let mut allocations: Vec<ContainerDevices> = Vec::with_capacity(containers.len());
    let mut score = 0.0f64;

    for container in containers {
        let sums: u32 = container.iter().map(|r| r.nums).sum();
        if sums == 0 {
            allocations.push(Vec::new());
            continue;
        }

        match fit_container_vector(node_id, node, container, annotations, registry) {
            Ok(Some((devices, container_total, container_free))) => {
                let ratio = if container_free == 0 {
                    scoring.zero_free_ratio
                } else {
                    container_total as f64 / container_free as f64
                };
                score += ratio + (node.devices.len() as f64 - sums as f64);
                allocations.push(devices);
            }
            Ok(None) | Err(_) => return NodeFitOutcome::NoFit,
        }
    }

    if allocations.len() != containers.len() {
        return NodeFitOutcome::NoFit;
    }

    NodeFitOutcome::Fit { allocations, score }
}

/// Fit every per-family request of one container, applying reservations
/// for any that succeed, and return the merged allocation plus the
/// `(total, free)` contributions for the scoring formula. `Ok(None)` means
/// the container could not be placed on this node; the caller aborts the
/// node without scoring it.
fn fit_container_vector(
    node_id: &str,
    node: &mut NodeUsage,
    container: &ContainerRequest,
    annotations: &Annotations,
    registry: &DeviceTypeRegistry,
) -> Result<Option<(ContainerDevices, u64, u64)>> {
    let mut merged = Vec::new();
    let mut total = 0u64;
    let mut free = 0u64;

    for request in container {
        if request.nums as usize > node.devices.len() {
            return Err(Error::CapacityExceeded {
                node_id: node_id.to_string(),
                requested: request.nums,
                available: node.devices.len(),
            });
        }

        sort_devices(&mut node.devices);

        match fit_container(node, request, annotations, registry)? {
            FitOutcome::Fit { devices } => {
                for record in &devices {
                    let device = &mut node.devices[record.idx];
                    total += device.count as u64;
                    free += (device.count - device.used) as u64;
                    device.used += 1;
                    device.usedcores += record.usedcores;
                    device.usedmem += record.usedmem;
                }
                merged.extend(devices);
            }
            FitOutcome::NoFit { .. } => return Ok(None),
        }
    }

    Ok(Some((merged, total, free)))
}
