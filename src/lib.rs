//! Persistence and access-control core for a group-based chat service.
//!
//! Users join named groups, exchange threaded text and system messages,
//! and track per-user read progress. This crate owns the data model and
//! the invariants around it: group lifecycle (single default group),
//! membership-scoped authorization, message threading and soft deletes,
//! idempotent read receipts, and in-order fan-out of committed messages to
//! live subscribers. Identity comes from an external service; transport is
//! whatever the embedding backend builds on top of [`feed::ChangeFeed`].

pub mod config;
pub mod core;
pub mod db;
pub mod dtos;
pub mod entities;
pub mod feed;
pub mod repositories;
pub mod services;

pub use config::Config;
pub use core::{AppState, Caller, ChatError, TrustLevel};
pub use feed::{ChangeFeed, MessageEvent};
