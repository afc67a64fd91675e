#![forbid(unsafe_code)]

//! Analytics tracking for UI component trees.
//!
//! `treemetry` attaches tracking capability to a tree of components: each
//! decorated level contributes a bag of analytics attributes, merges it
//! over data inherited from its ancestors, and republishes the merged
//! result to its descendants through an explicitly threaded
//! [`TrackingContext`]. Firing an event merges per-call event data over
//! the accumulated bag and hands the result to the resolved dispatcher.
//!
//! The host UI framework stays in charge of rendering and lifecycle; it
//! drives this crate by calling into [`Tracked`] (or [`TrackScope`]
//! directly) at construction, update, and mount time, passing each child
//! its parent's [`child_context`](Tracked::child_context). All of it is
//! synchronous and single-threaded.
//!
//! # Quick start
//!
//! ```
//! use treemetry::{Track, Trackable, Tracking, tracking_data};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct CartProps { items: u32 }
//!
//! struct CartButton;
//!
//! impl Trackable for CartButton {
//!     type Props = CartProps;
//!
//!     fn render(&mut self, _props: &CartProps, tracking: &Tracking) {
//!         // The capability pair: fire events, read accumulated data.
//!         tracking.track_event(tracking_data! { "event": "impression" });
//!         assert_eq!(tracking.tracking_data().get("app").unwrap(), "shop");
//!     }
//! }
//!
//! // Root level: app-wide data plus a dispatcher.
//! let mut app = Track::new(tracking_data! { "app": "shop" })
//!     .dispatch(|data, _props| println!("{}", data.to_value()))
//!     .wrap(CartButton);
//!
//! let props = CartProps { items: 2 };
//! app.mount(&props, None);
//!
//! // A nested level inherits through the explicitly threaded context.
//! let mut nested = Track::derived(|p: &CartProps| tracking_data! { "items": p.items })
//!     .dispatch_on_mount(true)
//!     .wrap(CartButton);
//! nested.mount(&props, app.child_context().as_ref());
//! nested.render(&props);
//! ```
//!
//! # Behavioral contract
//!
//! - **Merge**: own keys win over inherited keys at every nesting level;
//!   when both sides hold an object at a key the merge recurses; no key
//!   is ever lost. See [`data`].
//! - **Dispatch resolution**: nearest ancestor's dispatcher, else the
//!   decoration's configured one, else the library default (a `tracing`
//!   event under target `treemetry::event`). See [`dispatch`].
//! - **Mount events**: governed by [`DispatchOnMount`] and the tree-level
//!   process capability; the exact tie-break lives in
//!   [`TrackScope::on_mount`].
//! - **Diagnostics, not errors**: the only anomalous condition — a
//!   process capability declared at two tree levels — is a `tracing`
//!   warning; everything else degrades to empty data or a no-op. The
//!   crate defines no error type and never interrupts rendering.

pub mod context;
pub mod data;
pub mod decorator;
pub mod dispatch;
pub mod scope;

pub use context::{Process, TrackingContext};
pub use data::TrackingData;
pub use decorator::{Track, Trackable, Tracked};
pub use dispatch::{Dispatch, DispatchOnMount};
pub use scope::{TrackScope, Tracking};

// Support for the `tracking_data!` macro; not public API.
#[doc(hidden)]
pub use serde_json as __serde_json;
