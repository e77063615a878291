//! Shared test support: a scripted in-process TCP server
//!
//! The server plays back a fixed request/reply script: for each exchange
//! it reads exactly the expected frame, asserts it matches byte for byte,
//! and writes the canned reply. Strictly request/response, like the real
//! protocol.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// One request/reply exchange in a server script
pub struct Exchange {
    pub expect: &'static [u8],
    pub reply: &'static [u8],
}

/// Shorthand for building an exchange
pub fn ex(expect: &'static [u8], reply: &'static [u8]) -> Exchange {
    Exchange { expect, reply }
}

/// Spawn a server that serves one connection with the given script
///
/// Returns the `(host, port)` to connect to and the server thread handle.
/// The connection is dropped as soon as the script is played; a trailing
/// QUIT from the client's teardown is deliberately left unread, since the
/// client ignores failures while closing.
pub fn scripted_server(script: Vec<Exchange>) -> ((String, u16), JoinHandle<()>) {
    serve_connections(vec![script])
}

/// Spawn a server that serves several consecutive connections
///
/// Used by reconnect tests: each inner script runs against one accepted
/// connection, in order.
pub fn serve_connections(scripts: Vec<Vec<Exchange>>) -> ((String, u16), JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind scripted server");
    let addr = listener.local_addr().expect("local addr");

    let handle = thread::spawn(move || {
        for script in scripts {
            let (mut stream, _) = listener.accept().expect("accept");
            for exchange in script {
                let mut buf = vec![0u8; exchange.expect.len()];
                stream.read_exact(&mut buf).expect("read request frame");
                assert_eq!(
                    buf,
                    exchange.expect,
                    "unexpected frame: got {:?}, want {:?}",
                    String::from_utf8_lossy(&buf),
                    String::from_utf8_lossy(exchange.expect)
                );
                stream.write_all(exchange.reply).expect("write reply");
            }
        }
    });

    ((addr.ip().to_string(), addr.port()), handle)
}

/// An address nothing is listening on, for tests that must not do I/O
pub fn dead_addr() -> (String, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    (addr.ip().to_string(), addr.port())
}
