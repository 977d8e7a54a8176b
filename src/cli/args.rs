//! Command-line argument structures for the `snmpt-*` tools.

use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::client::DEFAULT_PORT;
use crate::session::Session;
use crate::value::Value;
use crate::{Result, Version};

/// SNMP version for CLI argument parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SnmpVersion {
    /// SNMPv1
    #[value(name = "1")]
    V1,
    /// SNMPv2c (default)
    #[default]
    #[value(name = "2c")]
    V2c,
}

impl From<SnmpVersion> for Version {
    fn from(v: SnmpVersion) -> Self {
        match v {
            SnmpVersion::V1 => Version::V1,
            SnmpVersion::V2c => Version::V2c,
        }
    }
}

/// Output format for CLI tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with type information.
    #[default]
    Human,
    /// JSON output for scripting.
    Json,
    /// Raw tab-separated output for scripting.
    Raw,
}

/// Connection arguments shared by every tool.
#[derive(Debug, Parser)]
pub struct CommonArgs {
    /// Target host, optionally with `:port`.
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// SNMP version: 1 or 2c.
    #[arg(short = 'v', long = "snmp-version", default_value = "2c")]
    pub snmp_version: SnmpVersion,

    /// Community string.
    #[arg(short = 'c', long = "community", default_value = "public")]
    pub community: String,

    /// Agent port, used when TARGET has none.
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Per-attempt timeout in seconds.
    #[arg(short = 't', long = "timeout", default_value = "1")]
    pub timeout: f64,

    /// Retries after a timeout.
    #[arg(short = 'r', long = "retries", default_value = "5")]
    pub retries: u32,

    /// GETBULK max-repetitions for walks (v2c only).
    #[arg(long = "max-repetitions", default_value = "20")]
    pub max_repetitions: u32,
}

impl CommonArgs {
    /// Get the timeout as a Duration.
    ///
    /// Negative or non-finite values fall back to one second.
    pub fn timeout_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout).unwrap_or(Duration::from_secs(1))
    }

    /// Connect a blocking session configured from these arguments.
    pub fn connect(&self) -> Result<Session> {
        let community = self.community.as_bytes();
        match self.snmp_version {
            SnmpVersion::V1 => Session::v1(self.target.as_str())
                .community(community)
                .port(self.port)
                .timeout(self.timeout_duration())
                .retries(self.retries)
                .connect_blocking(),
            SnmpVersion::V2c => Session::v2c(self.target.as_str())
                .community(community)
                .port(self.port)
                .timeout(self.timeout_duration())
                .retries(self.retries)
                .max_repetitions(self.max_repetitions)
                .connect_blocking(),
        }
    }
}

/// Output control arguments.
#[derive(Debug, Parser)]
pub struct OutputArgs {
    /// Output format: human, json, or raw.
    #[arg(short = 'O', long = "output", default_value = "human")]
    pub format: OutputFormat,

    /// Always display OctetString as hex.
    #[arg(long = "hex")]
    pub hex: bool,

    /// Enable debug logging (snmp_tables=debug).
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Enable trace logging (snmp_tables=trace).
    #[arg(short = 'D', long = "trace")]
    pub trace: bool,
}

impl OutputArgs {
    /// Initialize tracing based on debug/trace flags.
    pub fn init_tracing(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = if self.trace {
            "snmp_tables=trace"
        } else if self.debug {
            "snmp_tables=debug"
        } else {
            "snmp_tables=warn"
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// A `-C id=name` column declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnArg {
    pub id: u32,
    pub name: String,
}

impl FromStr for ColumnArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (id, name) = s
            .split_once('=')
            .ok_or_else(|| format!("expected ID=NAME, got {:?}", s))?;
        let id = id
            .trim()
            .parse()
            .map_err(|_| format!("invalid column ID: {:?}", id))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("empty column name in {:?}", s));
        }
        Ok(ColumnArg {
            id,
            name: name.to_string(),
        })
    }
}

/// A `-M name:raw=display` value mapping.
///
/// `raw` is numeric when it parses as an integer and then matches any
/// integer-typed cell of that value. Otherwise it is text, which also
/// matches an IpAddress in dotted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingArg {
    pub column: String,
    pub raw: Value,
    pub display: Value,
}

impl FromStr for MappingArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || format!("expected NAME:RAW=DISPLAY, got {:?}", s);
        let (column, rest) = s.split_once(':').ok_or_else(invalid)?;
        let (raw, display) = rest.split_once('=').ok_or_else(invalid)?;
        if column.is_empty() {
            return Err(invalid());
        }
        let raw = match (raw.parse::<i32>(), raw.parse::<u64>()) {
            (Ok(n), _) => Value::Integer(n),
            (_, Ok(n)) => Value::Counter64(n),
            _ => Value::from(raw),
        };
        Ok(MappingArg {
            column: column.to_string(),
            raw,
            display: Value::from(display),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Parser)]
    struct TestArgs {
        #[command(flatten)]
        common: CommonArgs,
    }

    #[test]
    fn test_common_defaults() {
        let args = TestArgs::parse_from(["test", "192.0.2.1"]);
        assert_eq!(args.common.snmp_version, SnmpVersion::V2c);
        assert_eq!(args.common.community, "public");
        assert_eq!(args.common.port, 161);
        assert_eq!(args.common.timeout_duration(), Duration::from_secs(1));
        assert_eq!(args.common.retries, 5);
        assert_eq!(args.common.max_repetitions, 20);
    }

    #[test]
    fn test_common_flags() {
        let args = TestArgs::parse_from([
            "test", "-v", "1", "-c", "private", "-p", "1161", "-t", "0.5", "-r", "0", "router",
        ]);
        assert_eq!(args.common.snmp_version, SnmpVersion::V1);
        assert_eq!(args.common.community, "private");
        assert_eq!(args.common.port, 1161);
        assert_eq!(args.common.timeout_duration(), Duration::from_millis(500));
        assert_eq!(args.common.retries, 0);
        assert_eq!(args.common.target, "router");
    }

    #[test]
    fn test_negative_timeout_falls_back() {
        let args = TestArgs::parse_from(["test", "--timeout=-2", "router"]);
        assert_eq!(args.common.timeout_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_column_arg() {
        assert_eq!(
            "3=username".parse::<ColumnArg>().unwrap(),
            ColumnArg {
                id: 3,
                name: "username".into()
            }
        );
        assert!("username".parse::<ColumnArg>().is_err());
        assert!("x=username".parse::<ColumnArg>().is_err());
        assert!("3=".parse::<ColumnArg>().is_err());
    }

    #[test]
    fn test_mapping_arg() {
        let mapping: MappingArg = "protocol:3=802.11g".parse().unwrap();
        assert_eq!(mapping.column, "protocol");
        assert_eq!(mapping.raw, Value::Integer(3));
        assert_eq!(mapping.display, Value::from("802.11g"));

        let mapping: MappingArg = "state:up=UP".parse().unwrap();
        assert_eq!(mapping.raw, Value::from("up"));

        let mapping: MappingArg = "octets:4000000000=full".parse().unwrap();
        assert_eq!(mapping.raw, Value::Counter64(4_000_000_000));

        assert!("protocol=3".parse::<MappingArg>().is_err());
        assert!(":3=x".parse::<MappingArg>().is_err());
    }
}
