//! Single-container fitter (component D).
//!
//! Grounded on the original scheduler's `fitInCertainDevice`: scans a
//! node's devices in reverse of the §4.C order (most-free device within a
//! NUMA group first), accumulating a tentative allocation for one
//! container's per-family request. Never mutates the snapshot; the caller
//! (component E) applies reservations only after a container-wide success.

use crate::error::{Error, Result};
use crate::registry::DeviceTypeRegistry;
use crate::types::{Annotations, ContainerDevice, ContainerDeviceRequest, NodeUsage};
use tracing::trace;

/// Outcome of fitting a single `ContainerDeviceRequest` against a node.
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    /// All `nums` partitions were found; `devices.len() == request.nums`.
    Fit { devices: Vec<ContainerDevice> },
    /// The scan ended before satisfying the request; `devices` holds
    /// whatever partial progress existed when the scan ended (for
    /// diagnostics only — callers must not apply a `NoFit` reservation).
    NoFit { partial: Vec<ContainerDevice> },
}

/// Attempt to satisfy one per-family request against a node snapshot.
///
/// `node.devices` must already be sorted per [`crate::ordering::sort_devices`];
/// this function iterates it in reverse. The snapshot is read-only here.
///
/// # Errors
///
/// Returns [`Error::InvalidRequest`] if `request.coresreq > 100`.
pub fn fit_container(
    node: &NodeUsage,
    request: &ContainerDeviceRequest,
    annotations: &Annotations,
    registry: &DeviceTypeRegistry,
) -> Result<FitOutcome> {
    if request.coresreq > 100 {
        return Err(Error::InvalidRequest {
            message: format!("coresreq {} exceeds 100", request.coresreq),
        });
    }

    let mut remaining = request.nums;
    let mut tmp: Vec<ContainerDevice> = Vec::new();
    let mut prev_numa = crate::types::NO_NUMA;

    for idx in (0..node.devices.len()).rev() {
        let device = &node.devices[idx];

        let (pass, numa_required) = registry.resolve(annotations, device, request);
        if !pass {
            trace!(device = %device.id, "card type mismatch, skipping");
            continue;
        }

        if numa_required && prev_numa != device.numa {
            trace!(device = %device.id, numa = device.numa, prev_numa, "numa boundary crossed, resetting partial progress");
            remaining = request.nums;
            tmp.clear();
            prev_numa = device.numa;
        }

        if device.used >= device.count {
            continue;
        }

        let effective_mem = if request.memreq > 0 {
            request.memreq
        } else if request.mempercentagereq != crate::types::MEM_PERCENTAGE_UNSET {
            device.totalmem * request.mempercentagereq as u64 / 100
        } else {
            0
        };

        if device.totalmem - device.usedmem < effective_mem {
            trace!(device = %device.id, "insufficient remaining memory");
            continue;
        }
        if device.totalcore - device.usedcores < request.coresreq {
            trace!(device = %device.id, "insufficient remaining cores");
            continue;
        }
        if device.totalcore == 100 && request.coresreq == 100 && device.used > 0 {
            trace!(device = %device.id, "exclusive request refused, card already sliced");
            continue;
        }
        if device.totalcore != 0 && device.usedcores == device.totalcore && request.coresreq == 0 {
            trace!(device = %device.id, "refusing core=0 request on a fully committed device");
            continue;
        }

        if remaining > 0 {
            tmp.push(ContainerDevice {
                idx,
                uuid: device.id.clone(),
                r#type: request.r#type.clone(),
                usedmem: effective_mem,
                usedcores: request.coresreq,
            });
            remaining -= 1;
        }
        if remaining == 0 {
            return Ok(FitOutcome::Fit { devices: tmp });
        }
    }

    Ok(FitOutcome::NoFit { partial: tmp })
}
