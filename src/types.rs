//! Core data model for the GPU scheduler kernel.
//!
//! Mirrors the fields of the original vGPU scheduler's device-usage and
//! request structs one-for-one; see `DESIGN.md` for the module-by-module
//! grounding.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel NUMA index meaning "unknown" / "not applicable".
pub const NO_NUMA: i32 = -1;

/// Sentinel for `ContainerDeviceRequest::mempercentagereq` meaning "not set; use `memreq`".
pub const MEM_PERCENTAGE_UNSET: u32 = 101;

/// A workload's string-keyed annotation map (vendor-defined recognized keys).
pub type Annotations = HashMap<String, String>;

/// One physical device instance on a node, and its live consumption.
///
/// Invariants: `0 <= used <= count`, `0 <= usedmem <= totalmem`,
/// `0 <= usedcores <= totalcore`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceUsage {
    /// Opaque vendor-unique identifier, stable across scheduling cycles.
    pub id: String,
    /// Vendor-family token, e.g. `"NVIDIA"`, `"MLU"`.
    pub r#type: String,
    /// NUMA node index, or [`NO_NUMA`] if unknown.
    pub numa: i32,
    /// Total logical partitions this device exposes.
    pub count: u32,
    /// Partitions currently held.
    pub used: u32,
    /// Device memory capacity, MiB.
    pub totalmem: u64,
    /// Device memory currently allocated, MiB.
    pub usedmem: u64,
    /// Compute-core capacity, percent (conventionally 100 for a full card).
    pub totalcore: u32,
    /// Compute cores currently allocated, percent.
    pub usedcores: u32,
}

impl DeviceUsage {
    /// Partitions still free on this device.
    pub fn free_partitions(&self) -> u32 {
        self.count.saturating_sub(self.used)
    }
}

/// One container's request for a single vendor family.
///
/// `coresreq > 100` is a user-input error; callers should reject the whole
/// request before scheduling rather than let the fitter discover it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerDeviceRequest {
    /// Requested vendor family.
    pub r#type: String,
    /// Number of device partitions required.
    pub nums: u32,
    /// Absolute memory per partition, MiB, or 0 to defer to percentage.
    pub memreq: u64,
    /// Percentage of per-device memory, 0..100, or [`MEM_PERCENTAGE_UNSET`].
    pub mempercentagereq: u32,
    /// Compute cores per partition, percent, 0..100.
    pub coresreq: u32,
}

/// A full container's request: one [`ContainerDeviceRequest`] per vendor
/// family it needs devices from.
pub type ContainerRequest = Vec<ContainerDeviceRequest>;

/// A successful per-partition allocation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerDevice {
    /// Position of the device in the NUMA/remaining-capacity ordered list.
    pub idx: usize,
    /// The device's stable identifier.
    pub uuid: String,
    /// The vendor family that was matched.
    pub r#type: String,
    /// Memory reserved on this partition, MiB.
    pub usedmem: u64,
    /// Compute cores reserved on this partition, percent.
    pub usedcores: u32,
}

/// The merged allocation for a single container (across its vendor-family
/// requests), or empty if the container requested zero partitions.
pub type ContainerDevices = Vec<ContainerDevice>;

/// A mutable, evaluation-scoped snapshot of one node's devices.
///
/// Owned by a single scheduling cycle; mutated in place as reservations are
/// applied, then discarded. Never shared across threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeUsage {
    pub devices: Vec<DeviceUsage>,
}

impl NodeUsage {
    /// Build a snapshot from a device list.
    pub fn new(devices: Vec<DeviceUsage>) -> Self {
        Self { devices }
    }
}

/// Workload metadata: identity plus a string-to-string annotation map whose
/// recognized keys are vendor-defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub id: String,
    pub annotations: Annotations,
}

/// A scheduling request: a workload's containers, evaluated against a set
/// of candidate node snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingRequest {
    pub workload: Workload,
    /// Ordered list of per-container request vectors.
    pub containers: Vec<ContainerRequest>,
    /// Candidate nodes, keyed by node ID.
    pub nodes: HashMap<String, NodeUsage>,
}

/// A node's scoring result: aligned with the request's container list, one
/// allocation (possibly empty) per container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeScore {
    pub node_id: String,
    pub allocations: Vec<ContainerDevices>,
    pub score: f64,
}

/// A node is only emitted if it produced an allocation for every container
/// in the workload; callers sort this ascending by score and take the tail.
pub type NodeScoreList = Vec<NodeScore>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_partitions_saturates() {
        let d = DeviceUsage {
            id: "gpu-0".into(),
            r#type: "NVIDIA".into(),
            numa: 0,
            count: 10,
            used: 12,
            totalmem: 16000,
            usedmem: 0,
            totalcore: 100,
            usedcores: 0,
        };
        assert_eq!(d.free_partitions(), 0);
    }
}
