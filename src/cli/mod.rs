//! Command line interface module
//!
//! This module parses the command line and runs the `sync`, `ls`, `copy` and
//! `login` workflows on top of the library components.

pub mod args;
pub mod runner;

pub use args::{Args, Commands};
pub use runner::{Runner, SyncOptions};
