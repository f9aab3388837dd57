// src/lib.rs

#[macro_use]
pub mod macros;

pub mod cli;
pub mod config;
pub mod core;
pub mod csv;
pub mod error;
pub mod log;
pub mod progress;
pub mod render;
pub mod runner;
pub mod scrape;
pub mod specs;
pub mod store;
pub mod transform;

pub use error::{Error, Result};
