//! Device ordering (component C).
//!
//! Total order over the devices on a node: ascending NUMA index, then
//! ascending remaining capacity (`count - used`) within the same NUMA.
//! Grounded on the original scheduler's `DeviceUsageList.Less`.
//!
//! The fitter (component D) scans this order in reverse, so the
//! least-free devices sort first here and the scanner tries the
//! most-free devices first.

use crate::types::DeviceUsage;
use std::cmp::Ordering;

/// Compare two devices per the total order: NUMA ascending, then remaining
/// capacity ascending within the same NUMA.
pub fn compare(a: &DeviceUsage, b: &DeviceUsage) -> Ordering {
    a.numa
        .cmp(&b.numa)
        .then_with(|| a.free_partitions().cmp(&b.free_partitions()))
}

/// Sort a node's devices in place per [`compare`].
///
/// Must be called again after every container's reservations are applied,
/// since the sort key includes live `used` counts.
pub fn sort_devices(devices: &mut [DeviceUsage]) {
    devices.sort_by(compare);
}
