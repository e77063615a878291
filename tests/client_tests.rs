//! Client Facade Tests
//!
//! Each test runs the client against a scripted in-process TCP server
//! that asserts the exact frames sent and plays back canned replies.

mod common;

use cinnabar::{CinnabarError, Client, KeyType};
use common::{dead_addr, ex, scripted_server};

fn client_for(addr: &(String, u16)) -> Client {
    Client::with_addr(addr.0.clone(), addr.1)
}

// =============================================================================
// Generic Key Operations
// =============================================================================

#[test]
fn test_ping() {
    let (addr, server) = scripted_server(vec![ex(b"PING\r\n", b"+PONG\r\n")]);
    let mut client = client_for(&addr);

    assert_eq!(client.ping().unwrap(), "PONG");

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_exists_maps_integer_to_bool() {
    let (addr, server) = scripted_server(vec![
        ex(b"EXISTS a\r\n", b":1\r\n"),
        ex(b"EXISTS b\r\n", b":0\r\n"),
    ]);
    let mut client = client_for(&addr);

    assert!(client.exists("a").unwrap());
    assert!(!client.exists("b").unwrap());

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_key_type_mapping() {
    let (addr, server) = scripted_server(vec![
        ex(b"TYPE a\r\n", b"+list\r\n"),
        ex(b"TYPE b\r\n", b"+none\r\n"),
        ex(b"TYPE c\r\n", b"+weird\r\n"),
    ]);
    let mut client = client_for(&addr);

    assert_eq!(client.key_type("a").unwrap(), KeyType::List);
    assert_eq!(client.key_type("b").unwrap(), KeyType::None);
    match client.key_type("c") {
        Err(CinnabarError::Protocol(_)) => {}
        other => panic!("expected protocol error, got {:?}", other),
    }

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_keys_splits_bulk_payload_on_spaces() {
    let (addr, server) = scripted_server(vec![ex(b"KEYS *\r\n", b"$7\r\nfoo bar\r\n")]);
    let mut client = client_for(&addr);

    assert_eq!(client.keys().unwrap(), vec!["foo", "bar"]);

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_keys_absent_payload_is_empty() {
    let (addr, server) = scripted_server(vec![ex(b"KEYS x*\r\n", b"$-1\r\n")]);
    let mut client = client_for(&addr);

    assert!(client.keys_matching("x*").unwrap().is_empty());

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_rename_and_rename_nx() {
    let (addr, server) = scripted_server(vec![
        ex(b"RENAME a b\r\n", b"+OK\r\n"),
        ex(b"RENAMENX a b\r\n", b":0\r\n"),
    ]);
    let mut client = client_for(&addr);

    assert!(client.rename("a", "b").unwrap());
    assert!(!client.rename_nx("a", "b").unwrap());

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_expire_true_only_on_exactly_one() {
    let (addr, server) = scripted_server(vec![
        ex(b"EXPIRE k 10\r\n", b":1\r\n"),
        ex(b"EXPIRE k 10\r\n", b":0\r\n"),
        ex(b"EXPIRE k 10\r\n", b":2\r\n"),
    ]);
    let mut client = client_for(&addr);

    assert!(client.expire("k", 10).unwrap());
    assert!(!client.expire("k", 10).unwrap());
    assert!(!client.expire("k", 10).unwrap());

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_select_db_caches_index() {
    let (addr, server) = scripted_server(vec![ex(b"SELECT 2\r\n", b"+OK\r\n")]);
    let mut client = client_for(&addr);

    assert_eq!(client.db(), 0);
    client.select_db(2).unwrap();
    assert_eq!(client.db(), 2);

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_raw_command_renders_replies() {
    let (addr, server) = scripted_server(vec![
        ex(b"TTL k\r\n", b":42\r\n"),
        ex(b"GET missing\r\n", b"$-1\r\n"),
    ]);
    let mut client = client_for(&addr);

    assert_eq!(client.raw_command("TTL k").unwrap(), "42");
    assert_eq!(client.raw_command("GET missing").unwrap(), "(nil)");

    drop(client);
    server.join().unwrap();
}

// =============================================================================
// String Operations
// =============================================================================

#[test]
fn test_set_sends_bulk_frame_and_get_round_trips() {
    let (addr, server) = scripted_server(vec![
        ex(b"SET a 5\r\nhello\r\n", b"+OK\r\n"),
        ex(b"GET a\r\n", b"$5\r\nhello\r\n"),
    ]);
    let mut client = client_for(&addr);

    client.set_string("a", "hello").unwrap();
    assert_eq!(client.get_string("a").unwrap(), Some("hello".to_string()));

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_get_absent_is_none_not_empty() {
    let (addr, server) = scripted_server(vec![
        ex(b"GET missing\r\n", b"$-1\r\n"),
        ex(b"GET empty\r\n", b"$0\r\n\r\n"),
    ]);
    let mut client = client_for(&addr);

    assert_eq!(client.get("missing").unwrap(), None);
    assert_eq!(client.get("empty").unwrap(), Some(Vec::new()));

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_get_set_returns_previous_value() {
    let (addr, server) =
        scripted_server(vec![ex(b"GETSET k 3\r\nnew\r\n", b"$3\r\nold\r\n")]);
    let mut client = client_for(&addr);

    assert_eq!(
        client.get_set_string("k", "new").unwrap(),
        Some("old".to_string())
    );

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_mget_preserves_interior_absent_entries() {
    let (addr, server) = scripted_server(vec![
        ex(b"MGET a b\r\n", b"*2\r\n$1\r\n1\r\n$-1\r\n"),
        ex(b"MGET a b\r\n", b"*-1\r\n"),
    ]);
    let mut client = client_for(&addr);

    assert_eq!(
        client.mget(&["a", "b"]).unwrap(),
        Some(vec![Some(b"1".to_vec()), None])
    );
    // A server-absent result stays distinct from an empty collection
    assert_eq!(client.mget(&["a", "b"]).unwrap(), None);

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_incr_decr_family() {
    let (addr, server) = scripted_server(vec![
        ex(b"INCR k\r\n", b":1\r\n"),
        ex(b"INCRBY k 5\r\n", b":6\r\n"),
        ex(b"DECR k\r\n", b":5\r\n"),
        ex(b"DECRBY k 4\r\n", b":1\r\n"),
    ]);
    let mut client = client_for(&addr);

    assert_eq!(client.incr("k").unwrap(), 1);
    assert_eq!(client.incr_by("k", 5).unwrap(), 6);
    assert_eq!(client.decr("k").unwrap(), 5);
    assert_eq!(client.decr_by("k", 4).unwrap(), 1);

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_server_error_normalization() {
    let (addr, server) = scripted_server(vec![
        ex(b"GET a\r\n", b"-ERR no such key\r\n"),
        ex(b"GET b\r\n", b"-WRONGTYPE bad op\r\n"),
    ]);
    let mut client = client_for(&addr);

    match client.get("a") {
        Err(CinnabarError::Server(msg)) => assert_eq!(msg, "no such key"),
        other => panic!("expected server error, got {:?}", other),
    }
    match client.get("b") {
        Err(CinnabarError::Server(msg)) => assert_eq!(msg, "WRONGTYPE bad op"),
        other => panic!("expected server error, got {:?}", other),
    }

    drop(client);
    server.join().unwrap();
}

// =============================================================================
// List Operations
// =============================================================================

#[test]
fn test_push_selects_command_by_end() {
    let (addr, server) = scripted_server(vec![
        ex(b"LPUSH l 1\r\n1\r\n", b":1\r\n"),
        ex(b"RPUSH l 1\r\n2\r\n", b":2\r\n"),
    ]);
    let mut client = client_for(&addr);

    client.push_string("l", "1", false).unwrap();
    client.push_string("l", "2", true).unwrap();

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_list_range_maps_absent_to_empty() {
    let (addr, server) = scripted_server(vec![
        ex(b"LRANGE l 0 -1\r\n", b"*2\r\n$1\r\n1\r\n$1\r\n2\r\n"),
        ex(b"LRANGE m 0 -1\r\n", b"*-1\r\n"),
    ]);
    let mut client = client_for(&addr);

    assert_eq!(
        client.list_range_string("l", 0, -1).unwrap(),
        vec!["1", "2"]
    );
    assert!(client.list_range("m", 0, -1).unwrap().is_empty());

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_pop_issues_rpop_for_both_ends() {
    // Wire-compatibility quirk: the end flag does not change the command
    let (addr, server) = scripted_server(vec![
        ex(b"RPOP l\r\n", b"$1\r\nx\r\n"),
        ex(b"RPOP l\r\n", b"$1\r\ny\r\n"),
    ]);
    let mut client = client_for(&addr);

    assert_eq!(client.pop_string("l", true).unwrap(), Some("x".to_string()));
    assert_eq!(
        client.pop_string("l", false).unwrap(),
        Some("y".to_string())
    );

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_list_index_and_set_and_trim() {
    let (addr, server) = scripted_server(vec![
        ex(b"LINDEX l 0\r\n", b"$1\r\na\r\n"),
        ex(b"LSET l 0 1\r\nb\r\n", b"+OK\r\n"),
        ex(b"LTRIM l 0 9\r\n", b"+OK\r\n"),
        ex(b"LLEN l\r\n", b":10\r\n"),
    ]);
    let mut client = client_for(&addr);

    assert_eq!(client.list_index_string("l", 0).unwrap(), Some("a".to_string()));
    client.list_set_string("l", 0, "b").unwrap();
    client.trim_list("l", 0, 9).unwrap();
    assert_eq!(client.list_len("l").unwrap(), 10);

    drop(client);
    server.join().unwrap();
}

// =============================================================================
// Set Operations
// =============================================================================

#[test]
fn test_set_add_remove_membership() {
    let (addr, server) = scripted_server(vec![
        ex(b"SADD s 1\r\nx\r\n", b":1\r\n"),
        ex(b"SISMEMBER s 1\r\nx\r\n", b":1\r\n"),
        ex(b"SREM s 1\r\nx\r\n", b":1\r\n"),
        ex(b"SCARD s\r\n", b":0\r\n"),
    ]);
    let mut client = client_for(&addr);

    client.set_add_string("s", "x").unwrap();
    assert!(client.is_set_member_string("s", "x").unwrap());
    assert!(client.set_remove_string("s", "x").unwrap());
    assert_eq!(client.set_cardinality("s").unwrap(), 0);

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_set_intersect_and_members() {
    let (addr, server) = scripted_server(vec![
        ex(b"SINTER s t\r\n", b"*1\r\n$1\r\na\r\n"),
        ex(b"SMEMBERS s\r\n", b"*2\r\n$1\r\na\r\n$1\r\nb\r\n"),
    ]);
    let mut client = client_for(&addr);

    assert_eq!(client.set_intersect_string(&["s", "t"]).unwrap(), vec!["a"]);
    assert_eq!(
        client.set_members_string("s").unwrap(),
        vec!["a", "b"]
    );

    drop(client);
    server.join().unwrap();
}

// =============================================================================
// Sorting
// =============================================================================

#[test]
fn test_sort_distinguishes_absent_from_empty() {
    let (addr, server) = scripted_server(vec![
        ex(b"SORT k ALPHA\r\n", b"*-1\r\n"),
        ex(b"SORT k ALPHA\r\n", b"*0\r\n"),
        ex(b"SORT k\r\n", b"*1\r\n$1\r\nz\r\n"),
    ]);
    let mut client = client_for(&addr);

    assert_eq!(client.sort_string("k", "ALPHA").unwrap(), None);
    assert_eq!(client.sort_string("k", "ALPHA").unwrap(), Some(Vec::new()));
    assert_eq!(
        client.sort_string("k", "").unwrap(),
        Some(vec!["z".to_string()])
    );

    drop(client);
    server.join().unwrap();
}

// =============================================================================
// Persistence and Server Control
// =============================================================================

#[test]
fn test_soft_calls_return_raw_lines_even_for_errors() {
    let (addr, server) = scripted_server(vec![
        ex(b"SAVE\r\n", b"+OK\r\n"),
        ex(b"BGSAVE\r\n", b"-ERR background save in progress\r\n"),
    ]);
    let mut client = client_for(&addr);

    assert_eq!(client.save().unwrap(), "+OK");
    assert_eq!(
        client.background_save().unwrap(),
        "-ERR background save in progress"
    );

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_last_save_converts_unix_seconds() {
    use std::time::{Duration, UNIX_EPOCH};

    let (addr, server) = scripted_server(vec![ex(b"LASTSAVE\r\n", b":1000\r\n")]);
    let mut client = client_for(&addr);

    assert_eq!(
        client.last_save().unwrap(),
        UNIX_EPOCH + Duration::from_secs(1000)
    );

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_info_parses_colon_pairs_and_skips_others() {
    let (addr, server) = scripted_server(vec![ex(
        b"INFO\r\n",
        b"$42\r\nredis_version:1.2.6\r\nuptime:100\r\nnocolon\r\n\r\n",
    )]);
    let mut client = client_for(&addr);

    let info = client.info().unwrap();
    assert_eq!(info.get("redis_version").map(String::as_str), Some("1.2.6"));
    assert_eq!(info.get("uptime").map(String::as_str), Some("100"));
    assert_eq!(info.len(), 2);

    drop(client);
    server.join().unwrap();
}

// =============================================================================
// Argument Validation (no I/O on invalid input)
// =============================================================================

#[test]
fn test_empty_key_rejected_before_any_io() {
    // Nothing listens on this address: reaching the network would fail
    // with a connection error instead of the expected argument error.
    let addr = dead_addr();
    let mut client = client_for(&addr);

    match client.get("") {
        Err(CinnabarError::InvalidArgument(_)) => {}
        other => panic!("expected invalid argument, got {:?}", other),
    }
    match client.set("", b"v") {
        Err(CinnabarError::InvalidArgument(_)) => {}
        other => panic!("expected invalid argument, got {:?}", other),
    }
    match client.mget(&[]) {
        Err(CinnabarError::InvalidArgument(_)) => {}
        other => panic!("expected invalid argument, got {:?}", other),
    }
    assert!(!client.is_connected());
}

#[test]
fn test_raw_command_rejects_embedded_line_breaks() {
    // A second line would smuggle an extra command onto the wire while
    // only one reply gets read, so it never reaches the network.
    let addr = dead_addr();
    let mut client = client_for(&addr);

    match client.raw_command("GET a\r\nSET a 5\r\nowned") {
        Err(CinnabarError::InvalidArgument(_)) => {}
        other => panic!("expected invalid argument, got {:?}", other),
    }
    match client.raw_command("GET a\nGET b") {
        Err(CinnabarError::InvalidArgument(_)) => {}
        other => panic!("expected invalid argument, got {:?}", other),
    }
    assert!(!client.is_connected());
}

#[test]
fn test_oversize_value_rejected_before_any_io() {
    let addr = dead_addr();
    let mut client = client_for(&addr);

    let value = vec![0u8; 1_073_741_825];
    match client.set("k", &value) {
        Err(CinnabarError::ValueTooLarge { size }) => assert_eq!(size, 1_073_741_825),
        other => panic!("expected ValueTooLarge, got {:?}", other),
    }
    assert!(!client.is_connected());
}

#[test]
fn test_connect_failure_surfaces_connection_error() {
    let addr = dead_addr();
    let mut client = client_for(&addr);

    match client.ping() {
        Err(CinnabarError::Connection(_)) => {}
        other => panic!("expected connection error, got {:?}", other),
    }
    assert!(!client.is_connected());
}
