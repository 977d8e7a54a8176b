#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use snmp_tables::message::CommunityMessage;
use snmp_tables::{Table, TableSpec, oid};

// Assemble whatever bindings a decoded response carries; malformed table
// data must never panic.
fuzz_target!(|data: &[u8]| {
    let Ok(msg) = CommunityMessage::decode(Bytes::copy_from_slice(data)) else {
        return;
    };
    let varbinds = msg.into_pdu().varbinds;
    let distinct = varbinds.len();

    let spec = TableSpec::new(oid!(1, 3, 6, 1))
        .expect("static base")
        .column(1, "one")
        .map_value("one", 0, "zero");
    let table = Table::from_walk(&spec, varbinds).expect("valid spec");

    assert!(table.len() <= distinct);
    for (_, column) in table.columns() {
        assert_eq!(column.value_count().values().sum::<usize>(), column.len());
    }
});
