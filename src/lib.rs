// src/lib.rs
//! Voting-poll backend.
//!
//! Requests flow through a [`pipeline::Pipeline`] of fallible steps, gated by
//! the session guards in [`guard`]. The poll mutation protocol lives in
//! [`poll`], vote casting and the tally in [`vote`].

pub mod config;
pub mod db;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod ids;
pub mod models;
pub mod pipeline;
pub mod poll;
pub mod routes;
pub mod services;
pub mod store;
pub mod users;
pub mod vote;

pub use error::AppError;
pub use services::Services;
