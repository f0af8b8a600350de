//! Core library components.
//!
//! Document model, secret location, envelope encoding, key custody and the
//! pipelines that tie them together.

pub mod cipher;
pub mod config;
pub mod constants;
pub mod document;
pub mod envelope;
pub mod keyservice;
pub mod locate;
pub mod metadata;
pub mod path;
pub mod splice;
pub mod transform;
