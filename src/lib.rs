//! Hollow rectangular ("square pipe") profiles for sketch-and-extrude CAD hosts.
//!
//! [`operations::profile::build`] turns a catalog pipe and placement
//! parameters into the outer and inner section loops plus an extrusion plan.
//! [`command::PipeCommand`] drives a host through the [`command::SketchBackend`]
//! trait and folds every outcome into a user-facing report.

pub mod addin;
pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;

pub use error::{Result, SquarePipeError};
