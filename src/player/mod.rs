//! Move selection.
//!
//! A [`MoveSelector`] picks one move from the legal list. The standard
//! implementation is [`Player`]: a shared [`Strategy`](crate::strategy::Strategy)
//! plus a [`TieBreak`] policy that turns scores into a choice.

pub mod selector;

pub use selector::{MoveSelector, Player, TieBreak};
