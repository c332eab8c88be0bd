//! # stitch-github
//!
//! GitHub Issues as the ticket tracker backend: the [`TicketTracker`] trait
//! consumed by the sync pipeline, a REST client implementation, and the wire
//! codec for the hidden identity marker embedded in ticket bodies.

pub mod client;
pub mod error;
pub mod marker;

pub use client::{GithubClient, TicketTracker};
pub use error::TrackerError;
