//! Runtime utilites
//!
//! This module is only used by the main binary and provides helper code
//! related to runtime configuration.

mod logging;

pub use logging::{LogRotationKind, Logging};
