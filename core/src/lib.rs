//! Bathtub: a chat command bot with dice rolls and persistent players and items.
//!
//! `router::CommandRouter` turns one inbound message into an `Outcome`;
//! `dispatch::Dispatcher` runs routers concurrently behind a `ReplySink`;
//! `store::BotStore` is the SQLite document store behind both.

pub mod access;
pub mod command;
pub mod config;
pub mod dice;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod event;
pub mod rng;
pub mod router;
pub mod store;
pub mod types;
