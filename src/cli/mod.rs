//! CLI utilities for the `snmpt-*` tools.
//!
//! Argument parsing and output formatting shared by `snmpt-get`,
//! `snmpt-set` and `snmpt-table`.
//!
//! This module is only available with the `cli` feature.

pub mod args;
pub mod output;
