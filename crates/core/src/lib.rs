//! Commerce Core - Shared domain types.
//!
//! This crate provides the types shared by every commerce component:
//! - `market` - Schema, repositories and mutation actions
//! - `cli` - Command-line tools for migrations, seeding and catalog inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The optional `postgres` feature adds `sqlx`
//! encode/decode support for the newtypes.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, money, stock, slugs, emails and JSON document shapes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
