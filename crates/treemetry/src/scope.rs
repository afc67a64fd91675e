#![forbid(unsafe_code)]

//! Per-instance tracking state: construction, updates, mount events.
//!
//! A [`TrackScope`] is the tracking state attached to one decorated
//! component instance. The host framework drives it through three
//! synchronous lifecycle moments:
//!
//! - **construct** ([`TrackScope::new`]): read the inherited context,
//!   compute own and merged tracking data, resolve the dispatcher.
//! - **update** ([`TrackScope::update`]): props or context changed;
//!   recompute everything. No re-warning, no mount re-fire.
//! - **mount** ([`TrackScope::on_mount`]): fire the automatic mount event,
//!   if one is configured at this level or imposed by an ancestor process.
//!
//! # Invariants
//!
//! 1. Merged data always equals `inherited.merged_with(&own)` for the most
//!    recently seen props/context pair; own keys win at every level.
//! 2. The published child context carries the merged data, the resolved
//!    dispatcher, and the inherited process when one exists (a locally
//!    declared process never displaces an ancestor's).
//! 3. [`TrackScope::track_event`] invokes the resolved dispatcher exactly
//!    once per call, with event keys merged over the accumulated data.
//! 4. Dispatcher resolution order: nearest ancestor, else the decoration's
//!    configured dispatcher, else the library default.
//!
//! # Failure Modes
//!
//! - Duplicate process declarations across levels: `tracing::warn!`
//!   diagnostic at construction, then first-ancestor-wins. Never a panic.
//! - Missing context / data / dispatcher: degrade to empty data and the
//!   default dispatcher.
//! - Props that fail to serialize: the snapshot becomes `Value::Null`;
//!   events still dispatch.

use serde::Serialize;
use serde_json::Value;

use crate::context::{Process, TrackingContext};
use crate::data::TrackingData;
use crate::decorator::Track;
use crate::dispatch::{Dispatch, DispatchOnMount};

/// Tracking state for a single decorated component instance.
pub struct TrackScope<P> {
    config: Track<P>,
    own: TrackingData,
    inherited: TrackingData,
    merged: TrackingData,
    dispatch: Dispatch,
    inherited_process: Option<Process>,
    props: Value,
}

impl<P: Serialize> TrackScope<P> {
    /// Construct the scope from the decoration config, the instance's
    /// current props, and the context inherited from the nearest decorated
    /// ancestor (`None` at the root of a tree).
    ///
    /// Emits a `warn!` diagnostic when an ancestor already supplies a
    /// process capability and this decoration declares another; the
    /// ancestor's stays in force.
    pub fn new(config: Track<P>, props: &P, parent: Option<&TrackingContext>) -> Self {
        let inherited_process = parent.and_then(|ctx| ctx.process.clone());
        if inherited_process.is_some() && config.process.is_some() {
            tracing::warn!(
                target: "treemetry",
                "process should be declared once, on the top-level component; \
                 ignoring the nested declaration"
            );
        }

        let mut scope = Self {
            config,
            own: TrackingData::new(),
            inherited: TrackingData::new(),
            merged: TrackingData::new(),
            dispatch: Dispatch::default(),
            inherited_process: None,
            props: Value::Null,
        };
        scope.recompute(props, parent);
        scope
    }

    /// Props or inherited context changed: recompute own, inherited, and
    /// merged data, and re-resolve the dispatcher and process from the
    /// latest context.
    pub fn update(&mut self, props: &P, parent: Option<&TrackingContext>) {
        self.recompute(props, parent);
    }

    fn recompute(&mut self, props: &P, parent: Option<&TrackingContext>) {
        self.own = self.config.own_data(props);
        self.inherited = parent.map(|ctx| ctx.data.clone()).unwrap_or_default();
        self.merged = self.inherited.merged_with(&self.own);
        self.dispatch = parent
            .map(|ctx| ctx.dispatch.clone())
            .or_else(|| self.config.dispatch.clone())
            .unwrap_or_default();
        self.inherited_process = parent.and_then(|ctx| ctx.process.clone());
        self.props = serde_json::to_value(props).unwrap_or(Value::Null);
    }

    /// The context this instance publishes to its descendants.
    ///
    /// Carries the merged data, the resolved dispatcher, and the process
    /// in force — the inherited one when present, otherwise the one
    /// declared by this decoration.
    #[must_use]
    pub fn child_context(&self) -> TrackingContext {
        TrackingContext {
            data: self.merged.clone(),
            dispatch: self.dispatch.clone(),
            process: self
                .inherited_process
                .clone()
                .or_else(|| self.config.process.clone()),
        }
    }

    /// Fire the automatic mount event, if any.
    ///
    /// Resolution, in order:
    ///
    /// 1. Inherited process and `DispatchOnMount::Computed`: one event with
    ///    the computed result merged over the process result (computed keys
    ///    win).
    /// 2. Inherited process alone (this branch also shadows `Always`): one
    ///    event with the process result, only when it is `Some`.
    /// 3. `DispatchOnMount::Computed` alone: one event with the computed
    ///    result, dispatched even when empty.
    /// 4. `DispatchOnMount::Always`: one event with empty event data.
    /// 5. Otherwise: no event.
    ///
    /// The host calls this once per mount; the scope does not guard
    /// against repeat calls.
    pub fn on_mount(&self) {
        match (&self.inherited_process, &self.config.dispatch_on_mount) {
            (Some(process), DispatchOnMount::Computed(compute)) => {
                let processed = process.call(&self.own).unwrap_or_default();
                let computed = compute(&self.merged);
                self.track_event(processed.merged_with(&computed));
            }
            (Some(process), _) => {
                if let Some(processed) = process.call(&self.own) {
                    self.track_event(processed);
                }
            }
            (None, DispatchOnMount::Computed(compute)) => {
                self.track_event(compute(&self.merged));
            }
            (None, DispatchOnMount::Always) => {
                self.track_event(TrackingData::new());
            }
            (None, DispatchOnMount::NoAuto) => {}
        }
    }

    /// Deliver an event: `event_data` merged over the accumulated tracking
    /// data (event keys win), handed to the resolved dispatcher together
    /// with the owner props snapshot.
    pub fn track_event(&self, event_data: TrackingData) {
        self.dispatch
            .call(&self.merged.merged_with(&event_data), &self.props);
    }

    /// The current merged tracking data. Side-effect free.
    #[must_use]
    pub fn tracking_data(&self) -> &TrackingData {
        &self.merged
    }

    /// This instance's own contribution (before merging).
    #[must_use]
    pub fn own_data(&self) -> &TrackingData {
        &self.own
    }

    /// The owner props snapshot passed to the dispatcher.
    #[must_use]
    pub fn props_snapshot(&self) -> &Value {
        &self.props
    }

    /// The capability handle handed to the wrapped component.
    #[must_use]
    pub fn handle(&self) -> Tracking {
        Tracking {
            data: self.merged.clone(),
            dispatch: self.dispatch.clone(),
            props: self.props.clone(),
        }
    }
}

impl<P> std::fmt::Debug for TrackScope<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackScope")
            .field("own", &self.own)
            .field("inherited", &self.inherited)
            .field("merged", &self.merged)
            .finish_non_exhaustive()
    }
}

/// The capability pair a wrapped component receives at render time.
///
/// `track_event` fires an event through the scope's resolved dispatcher;
/// `tracking_data` reads the merged data without side effects. The handle
/// snapshots the scope at render time and stays valid for the duration of
/// the render call.
#[derive(Clone, Debug)]
pub struct Tracking {
    data: TrackingData,
    dispatch: Dispatch,
    props: Value,
}

impl Tracking {
    /// Fire an event: `event_data` merged over the accumulated tracking
    /// data, event keys winning.
    pub fn track_event(&self, event_data: TrackingData) {
        self.dispatch
            .call(&self.data.merged_with(&event_data), &self.props);
    }

    /// The accumulated tracking data for this instance.
    #[must_use]
    pub fn tracking_data(&self) -> &TrackingData {
        &self.data
    }
}
