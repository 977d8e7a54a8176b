//! snmpt-table: Fetch and print a conceptual SNMP table.

use clap::Parser;
use snmp_tables::cli::args::{ColumnArg, CommonArgs, MappingArg, OutputArgs};
use snmp_tables::cli::output::{OutputContext, write_error};
use snmp_tables::{Oid, TableSpec};
use std::process::ExitCode;

/// Walk a table and print it as rows and columns.
#[derive(Debug, Parser)]
#[command(name = "snmpt-table", version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Table base OID, usually the Entry OID.
    #[arg(value_name = "BASE")]
    base: Oid,

    /// Name a column: ID=NAME. Repeatable.
    #[arg(short = 'C', long = "column", value_name = "ID=NAME")]
    columns: Vec<ColumnArg>,

    /// Map a raw value to a display value: NAME:RAW=DISPLAY. Repeatable.
    #[arg(short = 'M', long = "map", value_name = "NAME:RAW=DISPLAY")]
    mappings: Vec<MappingArg>,

    /// Walk only the declared columns.
    #[arg(long = "sparse")]
    sparse: bool,

    /// Drop columns that were not declared with -C.
    #[arg(long = "named-only")]
    named_only: bool,
}

impl Args {
    fn spec(&self) -> snmp_tables::Result<TableSpec> {
        let mut spec = TableSpec::new(&self.base)?
            .columns(self.columns.iter().map(|c| (c.id, c.name.as_str())))
            .fetch_all_columns(!self.sparse)
            .named_columns_only(self.named_only);
        for mapping in &self.mappings {
            spec = spec.map_value(
                mapping.column.as_str(),
                mapping.raw.clone(),
                mapping.display.clone(),
            );
        }
        spec.validate()?;
        Ok(spec)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let result = args
        .spec()
        .and_then(|spec| Ok((spec, args.common.connect()?)))
        .and_then(|(spec, session)| session.table(&spec));

    let table = match result {
        Ok(table) => table,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let output_ctx = OutputContext {
        format: args.output.format,
        force_hex: args.output.hex,
    };
    if let Err(e) = output_ctx.write_table(&table) {
        eprintln!("Error writing output: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
