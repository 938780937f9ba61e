//! devscope: duplicate-aware device inventory dashboard for the command line.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use commands::run;
