//! Shared test utilities for snmp-tables integration tests.

// Not every test file uses every fixture
#![allow(dead_code)]
#![allow(unused_imports)]

mod fixtures;
mod stream;

pub use fixtures::*;
pub use stream::collect_stream;
