//! snmpt-get: Retrieve SNMP OID values.

use clap::Parser;
use snmp_tables::cli::args::{CommonArgs, OutputArgs};
use snmp_tables::cli::output::{OutputContext, write_error};
use snmp_tables::{Oid, Session, VarBind};
use std::process::ExitCode;

/// Retrieve one or more SNMP OID values.
#[derive(Debug, Parser)]
#[command(name = "snmpt-get", version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// OIDs to retrieve, in dotted notation.
    #[arg(required = true, value_name = "OID")]
    oids: Vec<Oid>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let varbinds = match args.common.connect().and_then(|session| run_get(&session, &args.oids)) {
        Ok(varbinds) => varbinds,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let output_ctx = OutputContext {
        format: args.output.format,
        force_hex: args.output.hex,
    };
    if let Err(e) = output_ctx.write_varbinds(&varbinds) {
        eprintln!("Error writing output: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run_get(session: &Session, oids: &[Oid]) -> snmp_tables::Result<Vec<VarBind>> {
    oids.iter()
        .map(|oid| Ok(VarBind::new(oid.clone(), session.get(oid)?)))
        .collect()
}
