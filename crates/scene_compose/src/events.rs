//! Event types and sinks for observing composition passes.
//!
//! [`crate::compose::SceneComposer::compose_with_events`] reports each stage of a pass as a
//! [`ComposeEvent`]. Sinks collect, forward, or ignore them.
use glam::Vec2;

use crate::catalog::ShapeId;
use crate::compose::{PlacedItem, PostFixChange};
use crate::grid::Grid;
use crate::quota::KindCounts;

/// Describes events emitted during a composition pass.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum ComposeEvent {
    /// Emitted when a pass starts.
    Started {
        /// Canvas size in pixels.
        canvas: Vec2,
        /// Control value after clamping.
        u: f32,
        /// Number of pool members entering the pass.
        pool_len: usize,
    },

    /// Emitted once the grid is known. Not emitted for degenerate grids.
    GridBuilt { grid: Grid },

    /// Emitted after the kind counts were resolved.
    QuotaResolved { counts: KindCounts },

    /// Emitted after minimal-churn reassignment.
    KindsRetargeted {
        /// Ids of members that changed kind.
        ids: Vec<u32>,
    },

    /// Emitted when an item receives a footprint.
    ItemPlaced { item: PlacedItem },

    /// Emitted when an item could not be placed.
    ItemDropped { id: u32, shape: ShapeId },

    /// Emitted when a post-fix hook swapped an item's shape.
    PostFixApplied {
        /// Name of the hook.
        fix: String,
        id: u32,
        from: ShapeId,
        to: ShapeId,
    },

    /// Emitted when the pass finishes.
    Finished { placed: usize, dropped: usize },

    /// Non-fatal warning generated during composition.
    Warning {
        /// Context string (e.g. stage or item id).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// A generic event sink that accepts [`ComposeEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: ComposeEvent);
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: ComposeEvent) {}
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(ComposeEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(ComposeEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(ComposeEvent),
{
    #[inline]
    fn send(&mut self, event: ComposeEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<ComposeEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<ComposeEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[ComposeEvent] {
        &self.events
    }

    /// Shape swaps reported by post-fix hooks, in emission order.
    pub fn post_fixes(&self) -> impl Iterator<Item = PostFixChange> + '_ {
        self.events.iter().filter_map(|e| match e {
            ComposeEvent::PostFixApplied { id, from, to, .. } => Some(PostFixChange {
                id: *id,
                from: *from,
                to: *to,
            }),
            _ => None,
        })
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: ComposeEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_collects_events() {
        let mut sink = VecSink::new();
        assert!(sink.as_slice().is_empty());
        sink.send(ComposeEvent::Finished {
            placed: 3,
            dropped: 1,
        });
        sink.send(ComposeEvent::Warning {
            context: "grid".into(),
            message: "degenerate".into(),
        });
        let events = sink.into_inner();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            ComposeEvent::Finished {
                placed: 3,
                dropped: 1
            }
        ));
    }

    #[test]
    fn post_fixes_are_listed_in_order() {
        let mut sink = VecSink::new();
        sink.send(ComposeEvent::ItemDropped {
            id: 4,
            shape: ShapeId::Bus,
        });
        sink.send(ComposeEvent::PostFixApplied {
            fix: "first".into(),
            id: 7,
            from: ShapeId::House,
            to: ShapeId::Sun,
        });
        sink.send(ComposeEvent::PostFixApplied {
            fix: "second".into(),
            id: 2,
            from: ShapeId::Tree,
            to: ShapeId::Bird,
        });
        let ids: Vec<u32> = sink.post_fixes().map(|c| c.id).collect();
        assert_eq!(ids, vec![7, 2]);
        assert_eq!(sink.post_fixes().next().map(|c| c.to), Some(ShapeId::Sun));
    }

    #[test]
    fn fn_sink_invokes_callback() {
        let mut count = 0;
        let mut sink = FnSink::new(|_event| {
            count += 1;
        });
        sink.send(ComposeEvent::QuotaResolved {
            counts: [1, 2, 3, 4],
        });
        assert_eq!(count, 1);
    }
}
