//! The control-flow graph representation the ownership analysis consumes.
//!
//! Built once per routine by a front end (or `RoutineBuilder`), then only read.

pub mod access_path;
pub mod ir_builder;
pub mod ir_display;
pub mod ir_nodes;
pub mod ir_validation;
