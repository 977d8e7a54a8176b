//! Table specifications.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::oid::{IntoOid, Oid};
use crate::value::{Native, Value};

/// Describes which conceptual table to fetch and how to present it.
///
/// ```
/// use snmp_tables::TableSpec;
///
/// let spec = TableSpec::new("1.3.6.1.4.1.9.9.273.1.2.1.1")?
///     .column(3, "username")
///     .column(25, "protocol")
///     .map_value("protocol", 3, "802.11g")
///     .map_value("protocol", 6, "802.11n");
/// assert_eq!(spec.column_name(25), Some("protocol"));
/// # Ok::<(), snmp_tables::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TableSpec {
    base: Oid,
    columns: Vec<(u32, String)>,
    mappings: HashMap<String, HashMap<Native, Value>>,
    fetch_all_columns: bool,
    named_columns_only: bool,
    max_repetitions: Option<u32>,
}

impl TableSpec {
    /// A spec for the table rooted at `base` (usually the table's Entry
    /// OID), fetching every column.
    pub fn new(base: impl IntoOid) -> Result<Self> {
        Ok(Self {
            base: base.into_oid()?,
            columns: Vec::new(),
            mappings: HashMap::new(),
            fetch_all_columns: true,
            named_columns_only: false,
            max_repetitions: None,
        })
    }

    /// Name the column whose ID is `id`.
    pub fn column(mut self, id: u32, name: impl Into<String>) -> Self {
        self.columns.push((id, name.into()));
        self
    }

    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = (u32, S)>) -> Self {
        self.columns
            .extend(columns.into_iter().map(|(id, name)| (id, name.into())));
        self
    }

    /// Replace `raw` with `display` wherever it appears in `column`.
    ///
    /// Values are compared in their [`Native`] form with integer widths
    /// unified, so `3` matches an INTEGER, Gauge32 or Counter of 3 and
    /// `"10.0.0.1"` matches that IpAddress. Mappings for columns that never
    /// appear in the result are ignored.
    pub fn map_value(
        mut self,
        column: impl Into<String>,
        raw: impl Into<Value>,
        display: impl Into<Value>,
    ) -> Self {
        self.mappings
            .entry(column.into())
            .or_default()
            .insert(mapping_key(&raw.into()), display.into());
        self
    }

    /// Walk the whole table (default) or only the declared columns.
    pub fn fetch_all_columns(mut self, fetch_all: bool) -> Self {
        self.fetch_all_columns = fetch_all;
        self
    }

    /// Drop columns that were not declared instead of naming them by ID.
    pub fn named_columns_only(mut self, named_only: bool) -> Self {
        self.named_columns_only = named_only;
        self
    }

    /// GETBULK max-repetitions for this table's walks, overriding the
    /// client's setting. Must be at least 1.
    pub fn max_repetitions(mut self, max_repetitions: u32) -> Self {
        self.max_repetitions = Some(max_repetitions);
        self
    }

    /// Reject specs that cannot be fetched.
    ///
    /// Column names and IDs must be unique and the base must be non-empty.
    /// A sparse fetch needs at least one column. A declared name may not be
    /// the decimal ID of a different column, since undeclared columns are
    /// named that way.
    pub fn validate(&self) -> Result<()> {
        if self.base.is_empty() {
            return Err(Error::invalid_table_spec("base OID is empty"));
        }
        if self.max_repetitions == Some(0) {
            return Err(Error::invalid_table_spec("max-repetitions must be at least 1"));
        }
        if !self.fetch_all_columns && self.columns.is_empty() {
            return Err(Error::invalid_table_spec(
                "fetching only declared columns needs at least one column",
            ));
        }

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for (id, name) in &self.columns {
            if !ids.insert(*id) {
                return Err(Error::invalid_table_spec(format!("duplicate column ID {}", id)));
            }
            if !names.insert(name.as_str()) {
                return Err(Error::invalid_table_spec(format!(
                    "duplicate column name {:?}",
                    name
                )));
            }
            if let Ok(other) = name.parse::<u32>()
                && other != *id
                && other.to_string() == *name
            {
                return Err(Error::invalid_table_spec(format!(
                    "column {} is named after column {}",
                    id, other
                )));
            }
        }
        Ok(())
    }

    pub fn base(&self) -> &Oid {
        &self.base
    }

    /// Declared `(id, name)` pairs in declaration order.
    pub fn declared_columns(&self) -> &[(u32, String)] {
        &self.columns
    }

    /// Declared name for a column ID.
    pub fn column_name(&self, id: u32) -> Option<&str> {
        self.columns
            .iter()
            .find(|(column, _)| *column == id)
            .map(|(_, name)| name.as_str())
    }

    pub fn fetches_all_columns(&self) -> bool {
        self.fetch_all_columns
    }

    pub fn only_named_columns(&self) -> bool {
        self.named_columns_only
    }

    pub fn max_repetitions_override(&self) -> Option<u32> {
        self.max_repetitions
    }

    /// The display value for `raw` in `column`, or `raw` itself.
    pub(crate) fn present(&self, column: &str, raw: Value) -> Value {
        match self
            .mappings
            .get(column)
            .and_then(|m| m.get(&mapping_key(&raw)))
        {
            Some(display) => display.clone(),
            None => raw,
        }
    }
}

fn mapping_key(value: &Value) -> Native {
    match value.to_native() {
        Native::Unsigned(v) => i64::try_from(v).map_or(Native::Unsigned(v), Native::Integer),
        native => native,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let spec = TableSpec::new("1.3.6.1.2.1.2.2.1").unwrap();
        assert!(spec.fetches_all_columns());
        assert!(!spec.only_named_columns());
        assert_eq!(spec.max_repetitions_override(), None);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_invalid_base() {
        assert!(matches!(
            TableSpec::new("1.3.x"),
            Err(Error::InvalidOid { .. })
        ));
        assert!(TableSpec::new(Oid::empty()).unwrap().validate().is_err());
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let spec = TableSpec::new("1.3.6.1.9").unwrap().columns([(3, "a"), (3, "b")]);
        assert!(matches!(spec.validate(), Err(Error::InvalidTableSpec { .. })));

        let spec = TableSpec::new("1.3.6.1.9").unwrap().columns([(3, "a"), (4, "a")]);
        assert!(matches!(spec.validate(), Err(Error::InvalidTableSpec { .. })));
    }

    #[test]
    fn test_name_shadowing_another_column_id_rejected() {
        let spec = TableSpec::new("1.3.6.1.9").unwrap().column(3, "4");
        assert!(matches!(spec.validate(), Err(Error::InvalidTableSpec { .. })));

        // a column may carry its own ID, and "04" is not an auto-generated name
        let spec = TableSpec::new("1.3.6.1.9").unwrap().columns([(3, "3"), (5, "04")]);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_zero_max_repetitions_rejected() {
        let spec = TableSpec::new("1.3.6.1.9").unwrap().max_repetitions(0);
        assert!(matches!(spec.validate(), Err(Error::InvalidTableSpec { .. })));
        assert!(spec.max_repetitions(1).validate().is_ok());
    }

    #[test]
    fn test_sparse_needs_columns() {
        let spec = TableSpec::new("1.3.6.1.9").unwrap().fetch_all_columns(false);
        assert!(matches!(spec.validate(), Err(Error::InvalidTableSpec { .. })));
        assert!(spec.column(3, "username").validate().is_ok());
    }

    #[test]
    fn test_present_applies_mapping_per_column() {
        let spec = TableSpec::new("1.3.6.1.9")
            .unwrap()
            .map_value("protocol", 3, "802.11g");
        assert_eq!(spec.present("protocol", Value::Integer(3)), Value::from("802.11g"));
        assert_eq!(spec.present("protocol", Value::Integer(4)), Value::Integer(4));
        assert_eq!(spec.present("other", Value::Integer(3)), Value::Integer(3));
    }

    #[test]
    fn test_present_matches_across_integer_widths() {
        let spec = TableSpec::new("1.3.6.1.9")
            .unwrap()
            .map_value("speed", 3, "three")
            .map_value("gateway", "10.0.0.1", "core");
        for raw in [
            Value::Integer(3),
            Value::Gauge32(3),
            Value::Counter32(3),
            Value::Counter64(3),
        ] {
            assert_eq!(spec.present("speed", raw), Value::from("three"));
        }
        assert_eq!(spec.present("speed", Value::Integer(-3)), Value::Integer(-3));
        assert_eq!(
            spec.present("gateway", Value::IpAddress([10, 0, 0, 1])),
            Value::from("core")
        );
        assert_eq!(
            spec.present("gateway", Value::IpAddress([10, 0, 0, 2])),
            Value::IpAddress([10, 0, 0, 2])
        );
    }
}
