//! Conversation Memory
//!
//! Two stores with different lifetimes: the session slot store keeps the
//! slots collected so far for a live session, and the history store keeps
//! finished turns so the next turn can be given a context digest.

pub mod history;
pub mod sessions;

pub use history::{HistoryStore, TurnRecord};
pub use sessions::{SessionEntry, SessionSlotStore};
