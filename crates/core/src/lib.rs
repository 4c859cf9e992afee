//! Domain types and pure-logic rules for the livestream overlay backend.
//!
//! Nothing in this crate touches the network, the database or child
//! processes; those live in `livestream-db`, `livestream-transcode` and
//! `livestream-api`.

pub mod error;
pub mod overlay;
pub mod stream;
pub mod types;
