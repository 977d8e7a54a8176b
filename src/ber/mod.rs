//! BER (Basic Encoding Rules) codec for SNMP.
//!
//! Only the definite-length subset of X.690 that SNMP v1/v2c messages use.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;
