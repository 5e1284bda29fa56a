//! Device-type registry (component A).
//!
//! A process-wide, read-only-after-startup mapping from vendor family to a
//! predicate deciding whether a device instance satisfies a request. Grounded
//! on the original scheduler's `checkType`/`device.GetDevices()` dispatch:
//! predicates are consulted in registration order and the first one that
//! recognizes the device type wins.

use crate::types::{Annotations, DeviceUsage, ContainerDeviceRequest};
use tracing::info;

/// Outcome of consulting a single vendor predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredicateResult {
    /// Whether this predicate claims the device's type.
    pub recognized: bool,
    /// Whether the device satisfies vendor-specific constraints.
    pub pass: bool,
    /// Whether NUMA affinity must be enforced for this allocation.
    pub numa_required: bool,
}

impl PredicateResult {
    fn unrecognized() -> Self {
        Self {
            recognized: false,
            pass: false,
            numa_required: false,
        }
    }
}

/// A vendor-specific device predicate.
///
/// Given the workload's annotations, a candidate device and the container's
/// request, decide whether this predicate's vendor family recognizes the
/// device, and if so whether it passes and whether NUMA affinity applies.
pub trait DevicePredicate: Send + Sync {
    /// The vendor family token this predicate recognizes, e.g. `"NVIDIA"`.
    fn family(&self) -> &str;

    /// Evaluate the predicate against a device/request pair.
    fn check(
        &self,
        annotations: &Annotations,
        device: &DeviceUsage,
        request: &ContainerDeviceRequest,
    ) -> PredicateResult;
}

/// Process-wide registry of vendor predicates, consulted in registration
/// order.
pub struct DeviceTypeRegistry {
    predicates: Vec<Box<dyn DevicePredicate>>,
}

impl DeviceTypeRegistry {
    /// Build an empty registry.
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Build a registry with the built-in NVIDIA and MLU predicates
    /// registered, in that order.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(NvidiaPredicate));
        registry.register(Box::new(MluPredicate));
        registry
    }

    /// Register a predicate. Later registrations are consulted only after
    /// all earlier ones have declined to recognize the device.
    pub fn register(&mut self, predicate: Box<dyn DevicePredicate>) {
        self.predicates.push(predicate);
    }

    /// Resolve `(pass, numa_required)` for a device/request pair.
    ///
    /// Applies the general pre-check first: if the request's type is not a
    /// substring of the device's type, short-circuits to `(false, false)`
    /// without consulting any predicate. Otherwise predicates are consulted
    /// in registration order; the first one that recognizes the device wins.
    /// If none recognize it, returns `(false, false)` and logs at info level.
    pub fn resolve(
        &self,
        annotations: &Annotations,
        device: &DeviceUsage,
        request: &ContainerDeviceRequest,
    ) -> (bool, bool) {
        if !device.r#type.contains(&request.r#type) {
            return (false, false);
        }

        for predicate in &self.predicates {
            let result = predicate.check(annotations, device, request);
            if result.recognized {
                return (result.pass, result.numa_required);
            }
        }

        info!(device_type = %device.r#type, "unrecognized device type");
        (false, false)
    }
}

impl Default for DeviceTypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Annotation key a workload can set to request NUMA-affine packing for
/// device families whose predicate honors it.
pub const NUMA_AFFINITY_ANNOTATION: &str = "gpu-scheduler/numa-affinity";

/// Built-in NVIDIA predicate: passes any request whose type substring
/// matched, honors NUMA affinity only when the workload opted in via
/// [`NUMA_AFFINITY_ANNOTATION`].
pub struct NvidiaPredicate;

impl DevicePredicate for NvidiaPredicate {
    fn family(&self) -> &str {
        "NVIDIA"
    }

    fn check(
        &self,
        annotations: &Annotations,
        device: &DeviceUsage,
        _request: &ContainerDeviceRequest,
    ) -> PredicateResult {
        if !device.r#type.contains(self.family()) {
            return PredicateResult::unrecognized();
        }
        let numa_required = annotations
            .get(NUMA_AFFINITY_ANNOTATION)
            .map(|v| v == "true")
            .unwrap_or(false);
        PredicateResult {
            recognized: true,
            pass: true,
            numa_required,
        }
    }
}

/// Built-in MLU predicate: identical shape to [`NvidiaPredicate`] but for
/// the `"MLU"` family, matching the original scheduler's symmetric
/// per-vendor dispatch.
pub struct MluPredicate;

impl DevicePredicate for MluPredicate {
    fn family(&self) -> &str {
        "MLU"
    }

    fn check(
        &self,
        annotations: &Annotations,
        device: &DeviceUsage,
        _request: &ContainerDeviceRequest,
    ) -> PredicateResult {
        if !device.r#type.contains(self.family()) {
            return PredicateResult::unrecognized();
        }
        let numa_required = annotations
            .get(NUMA_AFFINITY_ANNOTATION)
            .map(|v| v == "true")
            .unwrap_or(false);
        PredicateResult {
            recognized: true,
            pass: true,
            numa_required,
        }
    }
}
