//! The explicitly threaded tracking context and the process capability.
//!
//! In the host framework's terms this is the "ambient" value a decorated
//! component publishes to its entire subtree. Rust has no implicit context
//! lookup, so the host threads a [`TrackingContext`] explicitly: each
//! parent hands `child_context()` to its children at construction and
//! update time (see [`Tracked`](crate::decorator::Tracked)).
//!
//! A context is conceptually immutable per level — a child never mutates
//! an inherited context, it publishes a freshly merged one.

use std::fmt;
use std::rc::Rc;

use crate::data::TrackingData;
use crate::dispatch::Dispatch;

/// An optional, root-declared function deriving extra event data for the
/// mount-time automatic event.
///
/// Returning `None` means "do not fire"; `Some(empty)` fires with empty
/// event data. Intended to be declared once, at the top of a tree; a
/// nested declaration is diagnosed and ignored (first ancestor wins).
#[derive(Clone)]
pub struct Process(Rc<dyn Fn(&TrackingData) -> Option<TrackingData>>);

impl Process {
    /// Wrap a process function.
    pub fn new(f: impl Fn(&TrackingData) -> Option<TrackingData> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Apply the process function to an instance's own tracking data.
    #[must_use]
    pub fn call(&self, own_data: &TrackingData) -> Option<TrackingData> {
        (self.0)(own_data)
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process").finish_non_exhaustive()
    }
}

/// The value a decorated component publishes to its descendants.
///
/// Shape is stable across nested instances: accumulated tracking data, the
/// resolved dispatcher, and the active process capability (if any).
#[derive(Clone, Debug)]
pub struct TrackingContext {
    /// Tracking data accumulated from the root down to the publishing
    /// level, descendant keys already merged over ancestor keys.
    pub data: TrackingData,
    /// The dispatcher in force for the subtree.
    pub dispatch: Dispatch,
    /// The process capability in force for the subtree, if one was
    /// declared at or above the publishing level.
    pub process: Option<Process>,
}

impl TrackingContext {
    /// A root context: empty data, the given dispatcher, no process.
    #[must_use]
    pub fn root(dispatch: Dispatch) -> Self {
        Self {
            data: TrackingData::new(),
            dispatch,
            process: None,
        }
    }
}
