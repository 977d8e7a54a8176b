//! Commonly used types in one import.
//!
//! ```rust,no_run
//! use snmp_tables::prelude::*;
//! ```

pub use crate::client::{Client, WalkMode};
pub use crate::codec::{SetValue, ValueType};
pub use crate::error::{Error, Result};
pub use crate::oid::Oid;
pub use crate::session::Session;
pub use crate::table::{Table, TableSpec};
pub use crate::value::Value;
pub use crate::varbind::VarBind;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;
