//! Leadscout command-line front end: configuration, run driving and export.
pub mod config;
pub mod export;
pub mod runner;
