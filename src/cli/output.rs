//! Output formatting for CLI tools.
//!
//! Supports human-readable, JSON, and raw output formats for both plain
//! variable bindings and assembled tables.

use std::io::{self, Write};

use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::{Table, Value, VarBind};

/// A single varbind result.
#[derive(Debug, Serialize)]
pub struct VarBindResult {
    pub oid: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
}

/// One table row for JSON output.
#[derive(Debug, Serialize)]
struct RowResult {
    index: String,
    cells: serde_json::Map<String, serde_json::Value>,
}

/// Output context for formatting.
pub struct OutputContext {
    pub format: OutputFormat,
    pub force_hex: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            force_hex: false,
        }
    }

    /// Write variable bindings to stdout.
    pub fn write_varbinds(&self, varbinds: &[VarBind]) -> io::Result<()> {
        self.write_varbinds_to(&mut io::stdout().lock(), varbinds)
    }

    fn write_varbinds_to<W: Write>(&self, w: &mut W, varbinds: &[VarBind]) -> io::Result<()> {
        let results: Vec<_> = varbinds.iter().map(|vb| self.format_varbind(vb)).collect();

        match self.format {
            OutputFormat::Human => {
                for vb in &results {
                    write!(w, "{} = {}: ", vb.oid, vb.value_type)?;
                    writeln!(w, "{}", human_value(vb))?;
                }
                Ok(())
            }
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&results).map_err(io::Error::other)?;
                writeln!(w, "{}", json)
            }
            OutputFormat::Raw => {
                for vb in &results {
                    writeln!(w, "{}\t{}", vb.oid, raw_value(&vb.value))?;
                }
                Ok(())
            }
        }
    }

    /// Write an assembled table to stdout.
    pub fn write_table(&self, table: &Table) -> io::Result<()> {
        self.write_table_to(&mut io::stdout().lock(), table)
    }

    fn write_table_to<W: Write>(&self, w: &mut W, table: &Table) -> io::Result<()> {
        let names: Vec<&str> = table.column_names().collect();
        let grid: Vec<Vec<String>> = table
            .rows()
            .iter()
            .map(|row| {
                std::iter::once(row.id().to_string())
                    .chain(names.iter().map(|name| {
                        row.get(name)
                            .map(|v| self.cell_text(v))
                            .unwrap_or_default()
                    }))
                    .collect()
            })
            .collect();

        match self.format {
            OutputFormat::Human => {
                let header: Vec<String> = std::iter::once("index")
                    .chain(names.iter().copied())
                    .map(String::from)
                    .collect();
                let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
                for line in &grid {
                    for (width, cell) in widths.iter_mut().zip(line) {
                        *width = (*width).max(cell.chars().count());
                    }
                }
                write_aligned(w, &header, &widths)?;
                for line in &grid {
                    write_aligned(w, line, &widths)?;
                }
                Ok(())
            }
            OutputFormat::Json => {
                let rows: Vec<RowResult> = table
                    .rows()
                    .iter()
                    .map(|row| RowResult {
                        index: row.id().to_string(),
                        cells: row
                            .iter()
                            .map(|(name, value)| (name.to_string(), self.json_value(value)))
                            .collect(),
                    })
                    .collect();
                let json = serde_json::to_string_pretty(&rows).map_err(io::Error::other)?;
                writeln!(w, "{}", json)
            }
            OutputFormat::Raw => {
                writeln!(w, "index\t{}", names.join("\t"))?;
                for line in &grid {
                    writeln!(w, "{}", line.join("\t"))?;
                }
                Ok(())
            }
        }
    }

    fn format_varbind(&self, vb: &VarBind) -> VarBindResult {
        let (value_type, value, formatted) = format_value(&vb.value, self.force_hex);
        VarBindResult {
            oid: vb.oid.to_string(),
            value_type,
            value,
            formatted,
        }
    }

    fn json_value(&self, value: &Value) -> serde_json::Value {
        format_value(value, self.force_hex).1
    }

    /// Plain cell text for table output.
    fn cell_text(&self, value: &Value) -> String {
        let (_, json, formatted) = format_value(value, self.force_hex);
        match (formatted, json) {
            (Some(formatted), _) => formatted,
            (None, json) => raw_value(&json),
        }
    }
}

fn write_aligned<W: Write>(w: &mut W, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(w, "{}", line.trim_end())
}

fn human_value(vb: &VarBindResult) -> String {
    if let Some(ref formatted) = vb.formatted {
        return formatted.clone();
    }
    match &vb.value {
        serde_json::Value::String(s) => format!("\"{}\"", s),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn raw_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Format a value, returning (type_name, json_value, formatted_string).
fn format_value(value: &Value, force_hex: bool) -> (String, serde_json::Value, Option<String>) {
    match value {
        Value::Integer(v) => ("INTEGER".into(), (*v).into(), None),

        Value::OctetString(bytes) => {
            if force_hex || !is_printable(bytes) {
                (
                    "Hex-STRING".into(),
                    serde_json::Value::String(hex_string(bytes)),
                    Some(format_hex_string(bytes)),
                )
            } else {
                let s = String::from_utf8_lossy(bytes);
                ("STRING".into(), serde_json::Value::String(s.to_string()), None)
            }
        }

        Value::Null => ("NULL".into(), serde_json::Value::Null, None),

        Value::ObjectIdentifier(oid) => ("OID".into(), oid.to_string().into(), None),

        Value::IpAddress(bytes) => {
            let s = std::net::Ipv4Addr::from(*bytes).to_string();
            ("IpAddress".into(), serde_json::Value::String(s), None)
        }

        Value::Counter32(v) => ("Counter32".into(), (*v).into(), None),

        Value::Gauge32(v) => ("Gauge32".into(), (*v).into(), None),

        Value::TimeTicks(v) => (
            "TimeTicks".into(),
            (*v).into(),
            Some(format!("({}) {}", v, format_timeticks(*v))),
        ),

        Value::Opaque(bytes) => (
            "Opaque".into(),
            serde_json::Value::String(hex_string(bytes)),
            Some(format_hex_string(bytes)),
        ),

        Value::Counter64(v) => ("Counter64".into(), (*v).into(), None),

        Value::NoSuchObject => (
            "NoSuchObject".into(),
            serde_json::Value::Null,
            Some("No Such Object available".into()),
        ),

        Value::NoSuchInstance => (
            "NoSuchInstance".into(),
            serde_json::Value::Null,
            Some("No Such Instance currently exists".into()),
        ),

        Value::EndOfMibView => (
            "EndOfMibView".into(),
            serde_json::Value::Null,
            Some("No more variables left in this MIB View".into()),
        ),

        Value::Unknown { tag, data } => (
            format!("Unknown(0x{:02X})", tag),
            serde_json::Value::String(hex_string(data)),
            Some(format_hex_string(data)),
        ),
    }
}

/// Check if bytes are printable ASCII/UTF-8.
fn is_printable(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(s) => s
            .chars()
            .all(|c| c.is_ascii_graphic() || c.is_ascii_whitespace()),
        Err(_) => false,
    }
}

/// Format bytes as hex string (lowercase, no separator).
fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Format bytes as spaced hex for display.
fn format_hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format TimeTicks as `[Nd ]HH:MM:SS.cc`.
fn format_timeticks(centiseconds: u32) -> String {
    let total_seconds = crate::codec::time_ticks(centiseconds).as_secs();
    let cs = centiseconds % 100;

    let days = total_seconds / 86400;
    let hours = (total_seconds % 86400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if days > 0 {
        format!(
            "{}d {:02}:{:02}:{:02}.{:02}",
            days, hours, minutes, seconds, cs
        )
    } else {
        format!("{:02}:{:02}:{:02}.{:02}", hours, minutes, seconds, cs)
    }
}

/// Write an error message to stderr.
pub fn write_error(err: &crate::Error) {
    eprintln!("Error: {}", err);
}
