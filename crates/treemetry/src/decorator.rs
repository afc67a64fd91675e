//! The decoration step: describe a component's tracking contribution and
//! wrap the component with it.
//!
//! [`Track`] is the decoration description — own tracking data (static or
//! derived from props) plus the dispatch / mount / process options.
//! [`Track::wrap`] produces a [`Tracked`] wrapper around any
//! [`Trackable`] component; the host drives the wrapper through mount,
//! update, and render, threading the parent's [`TrackingContext`]
//! explicitly at each step.
//!
//! # Example
//!
//! ```
//! use treemetry::{Track, Trackable, Tracking, tracking_data};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct PageProps { name: &'static str }
//!
//! struct Page;
//!
//! impl Trackable for Page {
//!     type Props = PageProps;
//!
//!     fn render(&mut self, props: &PageProps, tracking: &Tracking) {
//!         tracking.track_event(tracking_data! { "event": "render", "page": props.name });
//!     }
//! }
//!
//! let mut page = Track::derived(|p: &PageProps| tracking_data! { "page": p.name })
//!     .dispatch(|data, _props| println!("{}", data.to_value()))
//!     .dispatch_on_mount(true)
//!     .wrap(Page);
//!
//! let props = PageProps { name: "home" };
//! page.mount(&props, None);
//! page.render(&props);
//! ```

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

use crate::context::{Process, TrackingContext};
use crate::data::TrackingData;
use crate::dispatch::{Dispatch, DispatchOnMount};
use crate::scope::{TrackScope, Tracking};

/// Where a decoration's own tracking data comes from.
pub(crate) enum DataSource<P> {
    /// A fixed bag supplied at decoration time.
    Static(TrackingData),
    /// A pure function of the component's current props, invoked fresh on
    /// every recomputation.
    Derived(Rc<dyn Fn(&P) -> TrackingData>),
}

impl<P> Clone for DataSource<P> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(data) => Self::Static(data.clone()),
            Self::Derived(f) => Self::Derived(Rc::clone(f)),
        }
    }
}

/// A decoration description for components with props type `P`.
///
/// Built with [`Track::new`] (static data) or [`Track::derived`] (data
/// computed from props), refined with the builder methods, and applied
/// with [`Track::wrap`]. One `Track` can decorate many component
/// instances; the shared pieces are `Rc` handles.
pub struct Track<P> {
    pub(crate) source: DataSource<P>,
    pub(crate) dispatch: Option<Dispatch>,
    pub(crate) dispatch_on_mount: DispatchOnMount,
    pub(crate) process: Option<Process>,
}

impl<P> Track<P> {
    /// Decorate with a fixed tracking data bag.
    #[must_use]
    pub fn new(data: impl Into<TrackingData>) -> Self {
        Self {
            source: DataSource::Static(data.into()),
            dispatch: None,
            dispatch_on_mount: DispatchOnMount::NoAuto,
            process: None,
        }
    }

    /// Decorate with tracking data derived from the component's props.
    ///
    /// `f` must be pure; it is invoked fresh on every props/context change
    /// and never memoized.
    #[must_use]
    pub fn derived(f: impl Fn(&P) -> TrackingData + 'static) -> Self {
        Self {
            source: DataSource::Derived(Rc::new(f)),
            dispatch: None,
            dispatch_on_mount: DispatchOnMount::NoAuto,
            process: None,
        }
    }

    /// Set the dispatcher used when no ancestor supplies one via context.
    /// Without this, the library-wide default dispatcher is the fallback.
    #[must_use]
    pub fn dispatch(self, f: impl Fn(&TrackingData, &Value) + 'static) -> Self {
        self.dispatch_handle(Dispatch::new(f))
    }

    /// Set the fallback dispatcher from an existing handle (for sharing
    /// one dispatcher across decorations).
    #[must_use]
    pub fn dispatch_handle(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Configure the automatic mount event. Accepts `bool` (`true` fires
    /// with empty event data) or a [`DispatchOnMount`] variant.
    #[must_use]
    pub fn dispatch_on_mount(mut self, on_mount: impl Into<DispatchOnMount>) -> Self {
        self.dispatch_on_mount = on_mount.into();
        self
    }

    /// Declare the tree-level process capability. Intended for the
    /// top-level decoration only; a nested declaration is diagnosed at
    /// construction and functionally ignored.
    #[must_use]
    pub fn process(mut self, f: impl Fn(&TrackingData) -> Option<TrackingData> + 'static) -> Self {
        self.process = Some(Process::new(f));
        self
    }

    /// Wrap a component, producing the decorated component type.
    #[must_use]
    pub fn wrap<C>(self, component: C) -> Tracked<C>
    where
        C: Trackable<Props = P>,
    {
        Tracked {
            inner: component,
            config: self,
            scope: None,
        }
    }

    /// Resolve this decoration's own contribution for the given props.
    pub(crate) fn own_data(&self, props: &P) -> TrackingData {
        match &self.source {
            DataSource::Static(data) => data.clone(),
            DataSource::Derived(f) => f(props),
        }
    }
}

impl<P> Default for Track<P> {
    /// A decoration contributing no data of its own.
    fn default() -> Self {
        Self::new(TrackingData::new())
    }
}

impl<P> Clone for Track<P> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            dispatch: self.dispatch.clone(),
            dispatch_on_mount: self.dispatch_on_mount.clone(),
            process: self.process.clone(),
        }
    }
}

impl<P> fmt::Debug for Track<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            DataSource::Static(data) => format!("Static({})", data.to_value()),
            DataSource::Derived(_) => "Derived(..)".to_owned(),
        };
        f.debug_struct("Track")
            .field("source", &source)
            .field("dispatch", &self.dispatch)
            .field("dispatch_on_mount", &self.dispatch_on_mount)
            .field("process", &self.process.is_some())
            .finish()
    }
}

/// A component that can receive the tracking capability at render time.
///
/// The host framework owns everything else about the component; this
/// crate only asks that props serialize (for the dispatcher's owner-props
/// snapshot) and that render accept the [`Tracking`] handle alongside
/// the unchanged props.
pub trait Trackable {
    /// The component's props type.
    type Props: Serialize;

    /// Render with the original props plus the tracking capability.
    fn render(&mut self, props: &Self::Props, tracking: &Tracking);
}

/// The decorated component: the inner [`Trackable`] plus its
/// [`TrackScope`].
///
/// The host drives the wrapper through its lifecycle, threading the
/// parent's context explicitly:
///
/// 1. [`attach`](Tracked::attach) (or [`mount`](Tracked::mount)) when the
///    instance enters the tree — parents before children, so each child
///    can be handed its parent's [`child_context`](Tracked::child_context).
/// 2. [`did_mount`](Tracked::did_mount) once the subtree is in place
///    (children first, as lifecycle frameworks do).
/// 3. [`update`](Tracked::update) whenever props or the inherited context
///    change, then [`render`](Tracked::render).
/// 4. [`unmount`](Tracked::unmount) on teardown; no tracking state
///    survives it.
///
/// Calling `render` or `update` before any mount degrades to constructing
/// the scope on the spot with no inherited context, matching the crate's
/// default-to-empty policy.
pub struct Tracked<C: Trackable> {
    inner: C,
    config: Track<C::Props>,
    scope: Option<TrackScope<C::Props>>,
}

impl<C: Trackable> Tracked<C> {
    /// Wrap `component` with a decoration. Equivalent to
    /// [`Track::wrap`].
    #[must_use]
    pub fn new(component: C, config: Track<C::Props>) -> Self {
        config.wrap(component)
    }

    /// Construct the tracking scope for this instance without firing the
    /// mount event. Parents attach before their children so the child can
    /// inherit [`child_context`](Tracked::child_context).
    pub fn attach(&mut self, props: &C::Props, parent: Option<&TrackingContext>) {
        self.scope = Some(TrackScope::new(self.config.clone(), props, parent));
    }

    /// Fire the automatic mount event, if one is configured. No-op when
    /// the instance is not attached.
    pub fn did_mount(&self) {
        if let Some(scope) = &self.scope {
            scope.on_mount();
        }
    }

    /// Convenience for leaf-driven hosts: [`attach`](Tracked::attach)
    /// followed by [`did_mount`](Tracked::did_mount).
    pub fn mount(&mut self, props: &C::Props, parent: Option<&TrackingContext>) {
        self.attach(props, parent);
        self.did_mount();
    }

    /// Props or inherited context changed: recompute tracking state.
    /// Never re-fires the mount event. Degrades to
    /// [`attach`](Tracked::attach) when not yet mounted.
    pub fn update(&mut self, props: &C::Props, parent: Option<&TrackingContext>) {
        match &mut self.scope {
            Some(scope) => scope.update(props, parent),
            None => self.attach(props, parent),
        }
    }

    /// Render the inner component with its unchanged props plus the
    /// tracking capability handle.
    ///
    /// Tracking data reflects the most recent mount/update; hosts call
    /// [`update`](Tracked::update) first when props changed.
    pub fn render(&mut self, props: &C::Props) {
        let config = &self.config;
        let scope = self
            .scope
            .get_or_insert_with(|| TrackScope::new(config.clone(), props, None));
        let tracking = scope.handle();
        self.inner.render(props, &tracking);
    }

    /// The context this instance publishes to its descendants, or `None`
    /// before the first mount/attach.
    #[must_use]
    pub fn child_context(&self) -> Option<TrackingContext> {
        self.scope.as_ref().map(TrackScope::child_context)
    }

    /// The tracking capability for this instance, or `None` before the
    /// first mount/attach.
    #[must_use]
    pub fn tracking(&self) -> Option<Tracking> {
        self.scope.as_ref().map(TrackScope::handle)
    }

    /// Whether the instance currently holds tracking state.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.scope.is_some()
    }

    /// Tear down tracking state. Derived values do not survive this.
    pub fn unmount(&mut self) {
        self.scope = None;
    }

    /// Borrow the wrapped component.
    #[must_use]
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Mutably borrow the wrapped component.
    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Unwrap, discarding tracking state.
    #[must_use]
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Trackable + fmt::Debug> fmt::Debug for Tracked<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("inner", &self.inner)
            .field("config", &self.config)
            .field("mounted", &self.scope.is_some())
            .finish()
    }
}
