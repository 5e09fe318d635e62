//! Harbor air-gap mirror library
//!
//! This file serves as the library root for the airgap-mirror crate,
//! organizing and exposing the modules that make up the application:
//! catalog discovery, glob matching, sync planning, the copy worker pool
//! and the copy tool invoker.

pub mod cli;
pub mod concurrency;
pub mod config;
pub mod copy;
pub mod error;
pub mod logging;
pub mod registry;
pub mod sync;

pub use concurrency::{ExecutionReport, WorkerPool};
pub use config::AppConfig;
pub use error::{MirrorError, Result};
pub use logging::Logger;
pub use sync::{CopyTask, Plan, SyncPlanner};
