//! Common test fixtures: agents pre-loaded with well-known tables.

use snmp_tables::{Client, ClientConfig, MockAgent, Oid, Session, Value, Version, oid};

// =============================================================================
// Wireless users table (one row per associated client)
// =============================================================================

/// Entry OID of the wireless users table.
pub fn wireless_entry() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 9, 9, 273, 1, 2, 1, 1)
}

pub const USERNAME_COLUMN: u32 = 3;
pub const PROTOCOL_COLUMN: u32 = 25;

/// `(row, username, protocol code)` for each associated user.
pub const WIRELESS_USERS: [(u32, &str, i32); 3] = [(1, "jdoe", 3), (2, "rms", 6), (3, "bwayne", 6)];

/// Agent serving the wireless users table, plus an unrelated column 4 and a
/// scalar after the table.
pub fn wireless_agent() -> MockAgent {
    let entry = wireless_entry();
    let mut agent = MockAgent::new();
    for (row, username, protocol) in WIRELESS_USERS {
        agent = agent
            .with_object(entry.child(USERNAME_COLUMN).child(row), username)
            .with_object(entry.child(PROTOCOL_COLUMN).child(row), protocol)
            .with_object(entry.child(4).child(row), Value::Counter32(row * 100));
    }
    agent.with_object(oid!(1, 3, 6, 1, 4, 1, 9, 9, 273, 1, 3, 0), Value::Integer(1))
}

// =============================================================================
// Interface table (ifTable subset, 1.3.6.1.2.1.2.2.1)
// =============================================================================

pub fn if_entry() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1)
}

pub const IF_DESCR: u32 = 2;
pub const IF_PHYS_ADDRESS: u32 = 6;
pub const IF_OPER_STATUS: u32 = 8;

pub fn interface_agent() -> MockAgent {
    let entry = if_entry();
    MockAgent::new()
        .with_object(entry.child(IF_DESCR).child(1), "lo")
        .with_object(entry.child(IF_DESCR).child(2), "eth0")
        .with_object(entry.child(IF_PHYS_ADDRESS).child(1), Value::OctetString(Default::default()))
        .with_object(
            entry.child(IF_PHYS_ADDRESS).child(2),
            &[0x74, 0x26, 0xac, 0x1b, 0xe7, 0xa1][..],
        )
        .with_object(entry.child(IF_OPER_STATUS).child(1), 1)
        .with_object(entry.child(IF_OPER_STATUS).child(2), 2)
}

// =============================================================================
// System scalars
// =============================================================================

pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}
pub fn sys_uptime() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
}
pub fn sys_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
}

/// Nonexistent OID for testing NoSuchObject
pub fn nonexistent_oid() -> Oid {
    oid!(1, 3, 6, 1, 99, 99, 99, 0)
}

pub fn system_agent() -> MockAgent {
    MockAgent::new()
        .with_object(sys_descr(), "Linux router 6.1")
        .with_object(sys_uptime(), Value::TimeTicks(123_456))
        .with_object(sys_name(), "core-sw-01")
}

// =============================================================================
// Clients and sessions over a mock agent
// =============================================================================

/// Async client with no retries, so scripted failures surface at once.
pub fn client(agent: &MockAgent, version: Version) -> Client<MockAgent> {
    let config = ClientConfig {
        version,
        retries: 0,
        ..ClientConfig::default()
    };
    Client::new(agent.clone(), config)
}

pub fn session(agent: &MockAgent) -> Session<MockAgent> {
    Client::v2c("192.0.2.1")
        .retries(0)
        .build_blocking(agent.clone())
        .unwrap()
}

pub fn v1_session(agent: &MockAgent) -> Session<MockAgent> {
    Client::v1("192.0.2.1")
        .retries(0)
        .build_blocking(agent.clone())
        .unwrap()
}
