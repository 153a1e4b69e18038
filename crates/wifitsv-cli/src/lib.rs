//! # wifitsv-cli
//!
//! Source format adapters, TSV output and the `wifitsv` command line driver.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod adapters;
pub mod args;
pub mod emit;
pub mod logging;
pub mod run;
