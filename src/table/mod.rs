//! Conceptual tables assembled from walks.
//!
//! An SNMP table lives under an Entry OID. Every cell's OID is
//! `entry.columnId.rowId`, where the row ID may span several arcs (an IP
//! address index, for instance). A [`TableSpec`] names the interesting
//! columns and optionally maps raw values to display values; a [`Table`]
//! is the result, with rows keyed by [`RowId`] and columns by name.
//!
//! ```
//! use snmp_tables::{Oid, Table, TableSpec, Value, VarBind};
//!
//! let spec = TableSpec::new("1.3.6.1.9")?
//!     .column(3, "username")
//!     .map_value("username", "jdoe", "John Doe");
//! let walk = vec![
//!     VarBind::new(Oid::parse("1.3.6.1.9.3.1")?, Value::from("jdoe")),
//!     VarBind::new(Oid::parse("1.3.6.1.9.3.2")?, Value::from("rms")),
//! ];
//! let table = Table::from_walk(&spec, walk)?;
//! assert_eq!(table.len(), 2);
//! assert_eq!(table[0]["username"], Value::from("John Doe"));
//! # Ok::<(), snmp_tables::Error>(())
//! ```

mod model;
mod spec;

pub use model::{Column, Row, RowId, Table};
pub use spec::TableSpec;
