#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use snmp_tables::ber::Decoder;
use snmp_tables::message::CommunityMessage;
use snmp_tables::pdu::Pdu;

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    // Anything that decodes must re-encode and decode to the same message
    if let Ok(msg) = CommunityMessage::decode(bytes.clone()) {
        let again = CommunityMessage::decode(msg.encode()).expect("re-encoded message decodes");
        assert_eq!(msg, again);
    }

    let mut decoder = Decoder::new(bytes);
    let _ = Pdu::decode(&mut decoder);
});
