//! Integration tests for the workload fitter & scorer, exercising the
//! public crate API end to end against the scenarios a scheduling
//! extension point is expected to handle.

use gpu_scheduler_kernel::config::ScoringConfig;
use gpu_scheduler_kernel::registry::DeviceTypeRegistry;
use gpu_scheduler_kernel::scheduler::{score_nodes, NodeFitOutcome};
use gpu_scheduler_kernel::types::{
    ContainerDeviceRequest, DeviceUsage, NodeUsage, SchedulingRequest, Workload,
};
use std::collections::HashMap;

fn device(id: &str, numa: i32, count: u32, totalmem: u64) -> DeviceUsage {
    DeviceUsage {
        id: id.into(),
        r#type: "NVIDIA".into(),
        numa,
        count,
        used: 0,
        totalmem,
        usedmem: 0,
        totalcore: 100,
        usedcores: 0,
    }
}

#[test]
fn single_exclusive_container_is_scored_and_allocated() {
    let mut nodes = HashMap::new();
    nodes.insert(
        "node-a".to_string(),
        NodeUsage::new(vec![device("gpu-0", 0, 10, 16000), device("gpu-1", 0, 10, 16000)]),
    );

    let mut request = SchedulingRequest {
        workload: Workload {
            id: "wl-1".into(),
            annotations: HashMap::new(),
        },
        containers: vec![vec![ContainerDeviceRequest {
            r#type: "NVIDIA".into(),
            nums: 1,
            memreq: 16000,
            mempercentagereq: 101,
            coresreq: 100,
        }]],
        nodes,
    };

    let registry = DeviceTypeRegistry::with_builtins();
    let scoring = ScoringConfig::default();
    let ranked = score_nodes(&mut request, &registry, &scoring);

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].node_id, "node-a");
    assert!((ranked[0].score - 2.0).abs() < 1e-9);
    assert_eq!(ranked[0].allocations[0].len(), 1);
}

#[test]
fn multi_container_workload_only_matches_nodes_with_capacity_for_all() {
    let mut nodes = HashMap::new();
    nodes.insert(
        "roomy".to_string(),
        NodeUsage::new(vec![
            device("gpu-0", 0, 10, 16000),
            device("gpu-1", 0, 10, 16000),
            device("gpu-2", 1, 10, 16000),
        ]),
    );
    nodes.insert(
        "cramped".to_string(),
        NodeUsage::new(vec![device("gpu-3", 0, 10, 16000)]),
    );

    let two_partition_container = vec![ContainerDeviceRequest {
        r#type: "NVIDIA".into(),
        nums: 2,
        memreq: 2000,
        mempercentagereq: 101,
        coresreq: 20,
    }];

    let mut request = SchedulingRequest {
        workload: Workload {
            id: "wl-2".into(),
            annotations: HashMap::new(),
        },
        containers: vec![two_partition_container],
        nodes,
    };

    let registry = DeviceTypeRegistry::with_builtins();
    let scoring = ScoringConfig::default();
    let ranked = score_nodes(&mut request, &registry, &scoring);

    let ids: Vec<&str> = ranked.iter().map(|n| n.node_id.as_str()).collect();
    assert_eq!(ids, vec!["roomy"], "a node with only one device cannot host a two-partition request spread across distinct cards");
}

#[test]
fn devices_are_conserved_across_multiple_node_reservations() {
    let mut nodes = HashMap::new();
    nodes.insert(
        "node-a".to_string(),
        NodeUsage::new(vec![device("gpu-0", 0, 10, 16000), device("gpu-1", 0, 10, 16000)]),
    );

    let mut request = SchedulingRequest {
        workload: Workload {
            id: "wl-3".into(),
            annotations: HashMap::new(),
        },
        containers: vec![
            vec![ContainerDeviceRequest {
                r#type: "NVIDIA".into(),
                nums: 1,
                memreq: 4000,
                mempercentagereq: 101,
                coresreq: 30,
            }],
            vec![ContainerDeviceRequest {
                r#type: "NVIDIA".into(),
                nums: 1,
                memreq: 4000,
                mempercentagereq: 101,
                coresreq: 30,
            }],
        ],
        nodes,
    };

    let registry = DeviceTypeRegistry::with_builtins();
    let scoring = ScoringConfig::default();
    let ranked = score_nodes(&mut request, &registry, &scoring);

    assert_eq!(ranked.len(), 1);
    let node = &request.nodes["node-a"];
    let total_used_mem: u64 = node.devices.iter().map(|d| d.usedmem).sum();
    assert_eq!(total_used_mem, 8000);
    // Each container lands on its own fresh device (10/10 + (2-1)), summed across both containers.
    assert!((ranked[0].score - 4.0).abs() < 1e-6, "expected score 4.0, got {}", ranked[0].score);
}

#[test]
fn numa_affinity_annotation_keeps_a_multi_partition_container_on_one_numa() {
    let mut nodes = HashMap::new();
    nodes.insert(
        "node-a".to_string(),
        NodeUsage::new(vec![
            device("gpu-0", 0, 10, 16000),
            device("gpu-1", 0, 10, 16000),
            device("gpu-2", 1, 10, 16000),
            device("gpu-3", 1, 10, 16000),
        ]),
    );

    let mut annotations = HashMap::new();
    annotations.insert("gpu-scheduler/numa-affinity".to_string(), "true".to_string());

    let mut request = SchedulingRequest {
        workload: Workload {
            id: "wl-4".into(),
            annotations,
        },
        containers: vec![vec![ContainerDeviceRequest {
            r#type: "NVIDIA".into(),
            nums: 2,
            memreq: 1000,
            mempercentagereq: 101,
            coresreq: 10,
        }]],
        nodes,
    };

    let registry = DeviceTypeRegistry::with_builtins();
    let scoring = ScoringConfig::default();
    let ranked = score_nodes(&mut request, &registry, &scoring);

    assert_eq!(ranked.len(), 1);
    let allocation = &ranked[0].allocations[0];
    assert_eq!(allocation.len(), 2);
    let node = &request.nodes["node-a"];
    let numas: Vec<i32> = allocation
        .iter()
        .map(|d| node.devices.iter().find(|dev| dev.id == d.uuid).unwrap().numa)
        .collect();
    assert_eq!(numas[0], numas[1]);
}

#[test]
fn node_with_too_few_devices_is_excluded_without_panicking() {
    let mut nodes = HashMap::new();
    nodes.insert("tiny".to_string(), NodeUsage::new(vec![device("gpu-0", 0, 10, 16000)]));

    let mut request = SchedulingRequest {
        workload: Workload {
            id: "wl-5".into(),
            annotations: HashMap::new(),
        },
        containers: vec![vec![ContainerDeviceRequest {
            r#type: "NVIDIA".into(),
            nums: 4,
            memreq: 1000,
            mempercentagereq: 101,
            coresreq: 10,
        }]],
        nodes,
    };

    let registry = DeviceTypeRegistry::with_builtins();
    let scoring = ScoringConfig::default();
    let ranked = score_nodes(&mut request, &registry, &scoring);
    assert!(ranked.is_empty());
}

#[test]
fn score_node_outcome_type_is_exported_and_matchable() {
    let outcome = NodeFitOutcome::NoFit;
    assert_eq!(outcome, NodeFitOutcome::NoFit);
}
