//! Event dispatch: the single side-effecting exit point of the crate.
//!
//! A [`Dispatch`] wraps the caller-supplied function that delivers a
//! finalized event (merged tracking data plus event-specific data) to an
//! external sink — console, network beacon, queue; this crate has no
//! opinion. The library-wide default ([`Dispatch::default`]) emits the
//! event through `tracing` under the `treemetry::event` target.
//!
//! [`DispatchOnMount`] is the tagged form of the mount-time automatic
//! event configuration: fire nothing, fire with empty event data, or fire
//! with data computed from the instance's merged tracking data.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::data::TrackingData;

/// Shared handle to a dispatcher function `(event data, owner props)`.
///
/// The second argument is the owning component's props captured as a JSON
/// snapshot, so one dispatcher stored in an ancestor's context can serve
/// descendants with different concrete props types.
///
/// Cloning is cheap (`Rc`); the crate is single-threaded by design, like
/// the lifecycle callbacks that drive it.
#[derive(Clone)]
pub struct Dispatch(Rc<dyn Fn(&TrackingData, &Value)>);

impl Dispatch {
    /// Wrap a dispatcher function.
    pub fn new(f: impl Fn(&TrackingData, &Value) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Deliver an event to the sink.
    pub fn call(&self, data: &TrackingData, owner_props: &Value) {
        (self.0)(data, owner_props);
    }

    /// Whether two handles point at the same dispatcher function.
    #[must_use]
    pub fn same_as(&self, other: &Dispatch) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Dispatch {
    /// The library-wide fallback: log the event via `tracing` at `info`
    /// level under target `treemetry::event`.
    fn default() -> Self {
        Self::new(|data, owner_props| {
            tracing::info!(
                target: "treemetry::event",
                data = %data.to_value(),
                props = %owner_props,
                "tracking event"
            );
        })
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch").finish_non_exhaustive()
    }
}

/// Mount-time automatic event configuration.
///
/// The source of truth for how this interacts with a tree-level process
/// capability is [`TrackScope::on_mount`](crate::scope::TrackScope::on_mount).
#[derive(Clone, Default)]
pub enum DispatchOnMount {
    /// No automatic event on mount.
    #[default]
    NoAuto,
    /// Fire one event with empty event data on mount.
    Always,
    /// Fire one event whose data is computed from the instance's merged
    /// tracking data. The result is never checked for emptiness before
    /// dispatch (unlike a process result).
    Computed(Rc<dyn Fn(&TrackingData) -> TrackingData>),
}

impl DispatchOnMount {
    /// Wrap a compute function.
    pub fn computed(f: impl Fn(&TrackingData) -> TrackingData + 'static) -> Self {
        Self::Computed(Rc::new(f))
    }
}

impl From<bool> for DispatchOnMount {
    fn from(fire: bool) -> Self {
        if fire { Self::Always } else { Self::NoAuto }
    }
}

impl fmt::Debug for DispatchOnMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAuto => f.write_str("NoAuto"),
            Self::Always => f.write_str("Always"),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}
