//! End-to-end tree composition: several decorated levels wired together
//! the way a host framework would drive them, with a capture dispatcher
//! standing in for the external sink.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use serde_json::Value;
use treemetry::{
    Dispatch, DispatchOnMount, Track, Trackable, Tracked, Tracking, TrackingData, tracking_data,
};

#[derive(Serialize)]
struct Props {
    id: u32,
}

/// Inner component that records every render's tracking data and fires an
/// event when asked.
#[derive(Default)]
struct Probe {
    seen: Vec<TrackingData>,
    fire: Option<TrackingData>,
}

impl Probe {
    fn firing(event: TrackingData) -> Self {
        Self {
            seen: Vec::new(),
            fire: Some(event),
        }
    }
}

impl Trackable for Probe {
    type Props = Props;

    fn render(&mut self, _props: &Props, tracking: &Tracking) {
        self.seen.push(tracking.tracking_data().clone());
        if let Some(event) = &self.fire {
            tracking.track_event(event.clone());
        }
    }
}

type Calls = Rc<RefCell<Vec<(TrackingData, Value)>>>;

fn capture() -> (Dispatch, Calls) {
    let calls: Calls = Rc::default();
    let sink = Rc::clone(&calls);
    let dispatch = Dispatch::new(move |data, props| {
        sink.borrow_mut().push((data.clone(), props.clone()));
    });
    (dispatch, calls)
}

/// Mount a three-level tree (root → mid → leaf) the way a host would:
/// attach top-down, fire mounts bottom-up.
fn mount_tree(
    root: &mut Tracked<Probe>,
    mid: &mut Tracked<Probe>,
    leaf: &mut Tracked<Probe>,
    props: &Props,
) {
    root.attach(props, None);
    mid.attach(props, root.child_context().as_ref());
    leaf.attach(props, mid.child_context().as_ref());
    leaf.did_mount();
    mid.did_mount();
    root.did_mount();
}

#[test]
fn three_levels_accumulate_data_top_down() {
    let (dispatch, calls) = capture();
    let mut root = Track::new(tracking_data! { "app": "shop", "ctx": { "region": "eu" } })
        .dispatch_handle(dispatch)
        .wrap(Probe::default());
    let mut mid = Track::new(tracking_data! { "page": "cart", "ctx": { "zone": "a" } })
        .wrap(Probe::default());
    let mut leaf = Track::derived(|p: &Props| tracking_data! { "widget": p.id })
        .wrap(Probe::default());

    let props = Props { id: 7 };
    mount_tree(&mut root, &mut mid, &mut leaf, &props);

    leaf.tracking()
        .unwrap()
        .track_event(tracking_data! { "event": "click" });

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].0,
        tracking_data! {
            "app": "shop",
            "ctx": { "region": "eu", "zone": "a" },
            "page": "cart",
            "widget": 7,
            "event": "click"
        }
    );
    assert_eq!(calls[0].1, serde_json::json!({ "id": 7 }));
}

#[test]
fn root_dispatcher_serves_the_whole_tree() {
    let (root_dispatch, root_calls) = capture();
    let (leaf_dispatch, leaf_calls) = capture();

    let mut root = Track::new(tracking_data! { "app": "shop" })
        .dispatch_handle(root_dispatch)
        .wrap(Probe::default());
    let mut mid = Track::<Props>::default().wrap(Probe::default());
    // The leaf's locally configured dispatcher must lose to the ancestor's.
    let mut leaf = Track::<Props>::default()
        .dispatch_handle(leaf_dispatch)
        .wrap(Probe::default());

    let props = Props { id: 1 };
    mount_tree(&mut root, &mut mid, &mut leaf, &props);

    leaf.tracking().unwrap().track_event(TrackingData::new());
    assert_eq!(root_calls.borrow().len(), 1);
    assert!(leaf_calls.borrow().is_empty());
}

#[test]
fn inner_component_fires_through_capability_during_render() {
    let (dispatch, calls) = capture();
    let mut root = Track::new(tracking_data! { "app": "shop" })
        .dispatch_handle(dispatch)
        .wrap(Probe::firing(tracking_data! { "event": "impression" }));

    let props = Props { id: 1 };
    root.mount(&props, None);
    root.render(&props);

    assert_eq!(root.inner().seen.len(), 1);
    assert_eq!(root.inner().seen[0], tracking_data! { "app": "shop" });

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].0,
        tracking_data! { "app": "shop", "event": "impression" }
    );
}

#[test]
fn context_update_propagates_on_rerender() {
    let (dispatch, calls) = capture();
    let mut root = Track::derived(|p: &Props| tracking_data! { "version": p.id })
        .dispatch_handle(dispatch)
        .wrap(Probe::default());
    let mut leaf = Track::new(tracking_data! { "widget": "list" }).wrap(Probe::default());

    let props = Props { id: 1 };
    root.attach(&props, None);
    leaf.attach(&props, root.child_context().as_ref());
    leaf.did_mount();
    root.did_mount();

    // Host-side prop change: update flows root → leaf.
    let props = Props { id: 2 };
    root.update(&props, None);
    leaf.update(&props, root.child_context().as_ref());

    leaf.tracking().unwrap().track_event(TrackingData::new());
    assert_eq!(calls.borrow()[0].0.get("version").unwrap(), 2);
}

// ── Mount-time firing scenarios ─────────────────────────────────────

#[test]
fn mount_true_fires_once_with_empty_event_data() {
    let (dispatch, calls) = capture();
    let mut tracked = Track::new(tracking_data! { "page": "home" })
        .dispatch_handle(dispatch)
        .dispatch_on_mount(true)
        .wrap(Probe::default());

    tracked.mount(&Props { id: 1 }, None);

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, tracking_data! { "page": "home" });
}

#[test]
fn mount_computed_fires_once_with_computed_event_data() {
    let (dispatch, calls) = capture();
    let mut tracked = Track::new(tracking_data! { "page": "home" })
        .dispatch_handle(dispatch)
        .dispatch_on_mount(DispatchOnMount::computed(|_| tracking_data! { "click": 1 }))
        .wrap(Probe::default());

    tracked.mount(&Props { id: 1 }, None);

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.get("click").unwrap(), 1);
}

#[test]
fn ancestor_process_fires_for_descendant_mount() {
    let (dispatch, calls) = capture();
    let mut root = Track::new(tracking_data! { "app": "shop" })
        .dispatch_handle(dispatch)
        .process(|own| Some(own.clone().with("seen", true)))
        .wrap(Probe::default());
    let mut leaf = Track::new(tracking_data! { "page": "cart" }).wrap(Probe::default());

    let props = Props { id: 1 };
    root.attach(&props, None);
    leaf.attach(&props, root.child_context().as_ref());
    leaf.did_mount();
    root.did_mount();

    // Only the leaf mount fires: the root inherits no process itself.
    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.get("seen").unwrap(), true);
    assert_eq!(calls[0].0.get("page").unwrap(), "cart");
}

#[test]
fn process_and_computed_merge_with_computed_keys_winning() {
    let (dispatch, calls) = capture();
    let mut root = Track::<Props>::default()
        .dispatch_handle(dispatch)
        .process(|_| Some(tracking_data! { "seen": true, "origin": "process" }))
        .wrap(Probe::default());
    let mut leaf = Track::<Props>::default()
        .dispatch_on_mount(DispatchOnMount::computed(|_| {
            tracking_data! { "click": 1, "origin": "mount" }
        }))
        .wrap(Probe::default());

    let props = Props { id: 1 };
    root.attach(&props, None);
    leaf.attach(&props, root.child_context().as_ref());
    leaf.did_mount();
    root.did_mount();

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.get("seen").unwrap(), true);
    assert_eq!(calls[0].0.get("click").unwrap(), 1);
    assert_eq!(calls[0].0.get("origin").unwrap(), "mount");
}

#[test]
fn neither_process_nor_dispatch_on_mount_fires_nothing() {
    let (dispatch, calls) = capture();
    let mut root = Track::<Props>::default()
        .dispatch_handle(dispatch)
        .wrap(Probe::default());
    let mut mid = Track::<Props>::default().wrap(Probe::default());
    let mut leaf = Track::<Props>::default().wrap(Probe::default());

    let props = Props { id: 1 };
    mount_tree(&mut root, &mut mid, &mut leaf, &props);
    assert!(calls.borrow().is_empty());
}

// ── Default dispatcher resolution ───────────────────────────────────

/// Counts events emitted under the library default dispatcher's target.
struct EventCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> tracing_subscriber::layer::Layer<S> for EventCounter {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if event.metadata().target() == "treemetry::event" {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[test]
fn default_dispatcher_resolved_without_ancestor_or_configured_dispatch() {
    use tracing_subscriber::prelude::*;

    let events = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(EventCounter(Arc::clone(&events)));

    tracing::subscriber::with_default(subscriber, || {
        // No parent context, no dispatch option: resolution falls through
        // to the library-wide default, which logs under `treemetry::event`.
        let mut tracked = Track::new(tracking_data! { "page": "home" }).wrap(Probe::default());
        tracked.mount(&Props { id: 1 }, None);
        tracked
            .tracking()
            .unwrap()
            .track_event(tracking_data! { "event": "click" });
    });

    assert_eq!(events.load(Ordering::Relaxed), 1);
}

// ── Duplicate process declarations ──────────────────────────────────

/// Counts `warn`-level events emitted under the crate's diagnostic target.
struct WarnCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> tracing_subscriber::layer::Layer<S> for WarnCounter {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if event.metadata().target() == "treemetry"
            && *event.metadata().level() == tracing::Level::WARN
        {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[test]
fn nested_process_warns_and_ancestor_stays_in_force() {
    use tracing_subscriber::prelude::*;

    let warnings = Arc::new(AtomicUsize::new(0));
    let subscriber =
        tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));

    let (dispatch, calls) = capture();
    tracing::subscriber::with_default(subscriber, || {
        let mut root = Track::<Props>::default()
            .dispatch_handle(dispatch)
            .process(|_| Some(tracking_data! { "from": "ancestor" }))
            .wrap(Probe::default());
        // A descendant declaring its own process: diagnosed, then ignored.
        let mut mid = Track::<Props>::default()
            .process(|_| Some(tracking_data! { "from": "nested" }))
            .wrap(Probe::default());
        let mut leaf = Track::<Props>::default().wrap(Probe::default());

        let props = Props { id: 1 };
        mount_tree(&mut root, &mut mid, &mut leaf, &props);

        root.render(&props);
        mid.render(&props);
        leaf.render(&props);
        assert!(root.is_mounted() && mid.is_mounted() && leaf.is_mounted());
    });

    assert_eq!(warnings.load(Ordering::Relaxed), 1);

    // Both the mid and leaf mounts ran the ancestor's process.
    let calls = calls.borrow();
    assert_eq!(calls.len(), 2);
    for (data, _) in calls.iter() {
        assert_eq!(data.get("from").unwrap(), "ancestor");
    }
}
