//! Peer Placement Layer
//!
//! Decides which node owns a key and abstracts how to reach it.
//!
//! ## Core Concepts
//! - **`ring`**: a consistent-hash ring with virtual nodes. Placement is
//!   stable under membership change: adding a peer only moves the keys that
//!   land on its new arcs.
//! - **`picker`**: the contracts separating "who owns key K" from "fetch K
//!   from peer P", so the group logic stays transport-agnostic.

pub mod picker;
pub mod ring;
