//! Pagination Trigger - One-shot "load older" latch on a sequence frontier.
//!
//! The trigger observes the entity at the frontier of a sequence (the end
//! holding the oldest item) and walks an explicit cursor:
//!
//! ```text
//!            hidden               visible
//!   Idle ────────────▶ Armed ────────────▶ Triggered
//!    ▲                                        │
//!    └──────────────── arm() ◀────────────────┘
//! ```
//!
//! Every other (cursor, visibility) pair is a no-op. Entering `Triggered`
//! stops the observation and invokes the callback exactly once with the
//! anchor value captured at arm time. The owner re-arms after a non-empty
//! batch; an empty batch marks the frontier exhausted and arming stops.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::engine::visibility::{self, ObserverId};
use crate::sequence::ObservableSequence;
use crate::types::FieldValue;

/// Latch state of a [`PaginationTrigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationCursor {
    #[default]
    Idle,
    Armed,
    Triggered,
}

/// Which end of the sequence holds the oldest item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frontier {
    Front,
    Back,
}

/// Callback invoked with the anchor value of the frontier entity.
pub type LoadOlder = Rc<dyn Fn(&FieldValue)>;

#[derive(Debug, Default)]
struct TriggerState {
    cursor: PaginationCursor,
    observed: Option<(usize, ObserverId)>,
    anchor: Option<FieldValue>,
    exhausted: bool,
}

#[derive(Clone)]
pub struct PaginationTrigger {
    frontier: Frontier,
    anchor_field: String,
    on_load_older: LoadOlder,
    state: Rc<RefCell<TriggerState>>,
}

impl PaginationTrigger {
    pub fn new(
        frontier: Frontier,
        anchor_field: &str,
        on_load_older: impl Fn(&FieldValue) + 'static,
    ) -> Self {
        Self {
            frontier,
            anchor_field: anchor_field.to_string(),
            on_load_older: Rc::new(on_load_older),
            state: Rc::new(RefCell::new(TriggerState::default())),
        }
    }

    /// Observe the frontier entity of `sequence` and reset the cursor.
    ///
    /// Returns false (and observes nothing) when the sequence is empty, the
    /// frontier entity has no anchor value, or the frontier is exhausted.
    pub fn arm(&self, sequence: &ObservableSequence) -> bool {
        self.disarm();
        if self.is_exhausted() {
            return false;
        }

        let entity = match self.frontier {
            Frontier::Front => sequence.first(),
            Frontier::Back => sequence.last(),
        };
        let Some(entity) = entity else {
            return false;
        };
        let Some(anchor) = entity.get(&self.anchor_field).cloned() else {
            warn!(field = %self.anchor_field, "frontier entity has no anchor value");
            return false;
        };

        let node = entity.node();
        let state = self.state.clone();
        let on_load_older = self.on_load_older.clone();
        let id = visibility::observe(node, move |visible| {
            transition(&state, &on_load_older, visible);
        });

        let mut state = self.state.borrow_mut();
        state.cursor = PaginationCursor::Idle;
        state.observed = Some((node, id));
        state.anchor = Some(anchor);
        debug!(node, "pagination armed");
        true
    }

    /// Stop observing and return to `Idle`.
    pub fn disarm(&self) {
        let observed = {
            let mut state = self.state.borrow_mut();
            state.cursor = PaginationCursor::Idle;
            state.anchor = None;
            state.observed.take()
        };
        if let Some((node, id)) = observed {
            visibility::unobserve(node, id);
        }
    }

    /// Re-arm after an older batch of `batch_len` records was received.
    ///
    /// An empty batch means nothing older exists: the trigger is marked
    /// exhausted and stays unarmed. Otherwise the trigger re-arms on the
    /// current frontier, which is unchanged if no record could be inserted.
    pub fn rearm_after_batch(&self, sequence: &ObservableSequence, batch_len: usize) -> bool {
        if batch_len == 0 {
            self.mark_exhausted();
            return false;
        }
        self.arm(sequence)
    }

    pub fn mark_exhausted(&self) {
        self.disarm();
        self.state.borrow_mut().exhausted = true;
        debug!("pagination exhausted");
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.borrow().exhausted
    }

    pub fn cursor(&self) -> PaginationCursor {
        self.state.borrow().cursor
    }

    /// Node currently observed, if the observation is still live.
    pub fn observed(&self) -> Option<usize> {
        self.state
            .borrow()
            .observed
            .filter(|&(node, id)| visibility::is_observing(node, id))
            .map(|(node, _)| node)
    }

    /// True while the observation is live in the engine.
    pub fn is_observing(&self) -> bool {
        self.state
            .borrow()
            .observed
            .is_some_and(|(node, id)| visibility::is_observing(node, id))
    }

    pub fn frontier(&self) -> Frontier {
        self.frontier
    }
}

fn transition(state: &RefCell<TriggerState>, on_load_older: &LoadOlder, visible: bool) {
    let fired = {
        let mut state = state.borrow_mut();
        match (state.cursor, visible) {
            (PaginationCursor::Idle, false) => {
                state.cursor = PaginationCursor::Armed;
                None
            }
            (PaginationCursor::Armed, true) => {
                state.cursor = PaginationCursor::Triggered;
                Some((state.observed.take(), state.anchor.take()))
            }
            _ => None,
        }
    };

    let Some((observed, anchor)) = fired else {
        return;
    };
    if let Some((node, id)) = observed {
        visibility::unobserve(node, id);
    }
    if let Some(anchor) = anchor {
        debug!(?anchor, "pagination triggered");
        on_load_older(&anchor);
    }
}

impl fmt::Debug for PaginationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginationTrigger")
            .field("frontier", &self.frontier)
            .field("anchor_field", &self.anchor_field)
            .field("state", &self.state.borrow())
            .finish()
    }
}
