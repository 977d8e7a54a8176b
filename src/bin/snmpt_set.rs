//! snmpt-set: Write a single SNMP value.

use clap::Parser;
use snmp_tables::cli::args::{CommonArgs, OutputArgs};
use snmp_tables::cli::output::{OutputContext, write_error};
use snmp_tables::{Oid, SetValue, ValueType, VarBind};
use std::process::ExitCode;

/// Set an SNMP value, inferring its type unless `-T` is given.
#[derive(Debug, Parser)]
#[command(name = "snmpt-set", version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// SNMP type: Integer, Integer32, Unsigned32, Counter32, Counter64,
    /// Gauge32, TimeTicks, IpAddress or OctetString.
    #[arg(short = 'T', long = "type", value_name = "TYPE")]
    value_type: Option<ValueType>,

    /// OID to set, in dotted notation.
    #[arg(value_name = "OID")]
    oid: Oid,

    /// New value.
    #[arg(value_name = "VALUE", allow_hyphen_values = true)]
    value: String,
}

/// Without an explicit type, text that looks like an integer is sent as
/// one; everything else goes through type inference.
fn set_value(text: &str, value_type: Option<ValueType>) -> SetValue {
    match (value_type, text.parse::<i64>()) {
        (None, Ok(n)) => SetValue::Integer(n),
        _ => SetValue::from(text),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let value = set_value(&args.value, args.value_type);
    let result = args
        .common
        .connect()
        .and_then(|session| session.set(&args.oid, value, args.value_type));

    let echoed = match result {
        Ok(echoed) => echoed,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let output_ctx = OutputContext {
        format: args.output.format,
        force_hex: args.output.hex,
    };
    if let Err(e) = output_ctx.write_varbinds(&[VarBind::new(args.oid.clone(), echoed)]) {
        eprintln!("Error writing output: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
