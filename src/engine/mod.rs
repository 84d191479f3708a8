//! Presentation Engine - Node registry, parallel arrays, tree and visibility.
//!
//! The engine manages the core data structures:
//! - Registry: Index allocation, release, destroy callbacks
//! - Arrays: Parallel arrays for node state
//! - Tree: Attach/detach and queries over parent/children links
//! - Visibility: Intersection observation reported by the host
//!
//! # Architecture
//!
//! Presentation nodes are NOT objects. They are indices into parallel arrays:
//!
//! ```text
//! Index 0: div  (parent=-,  classes=[chat],        children=[1, 2])
//! Index 1: ul   (parent=0,  binding=Container(msgs), flags=CONTAINER|FRONT_INSERT)
//! Index 2: div  (parent=1,  classes=[chat, chat-start], children=[3])
//! Index 3: span (parent=2,  binding=Display(msg),   text="hi")
//! ```
//!
//! Entities own their node index; sequences own their container's child order.
//! Everything here is thread-local: one tree per thread.

mod registry;
pub mod arrays;
pub mod tree;
pub mod visibility;

pub use registry::*;
