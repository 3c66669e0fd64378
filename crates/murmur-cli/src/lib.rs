//! Terminal front end for Murmur
//!
//! A thin shell over [`murmur_core::Session`]: parses flags and environment
//! into a session config, reads operator lines from stdin, and prints
//! delivered messages. All protocol logic lives in the library crates.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
pub mod config;
pub mod display;
pub mod error;

pub use commands::Command;
pub use config::{Args, LogFormat, SchemeChoice};
pub use error::CliError;
