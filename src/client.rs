//! Command Facade
//!
//! The public client API, grouped by command category: generic key
//! operations, strings, lists, sets, sorting, persistence and server
//! info. Every operation validates its arguments, encodes a command
//! frame, sends it over the connection, decodes exactly one reply and
//! converts it to the operation's declared return type.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::config::Config;
use crate::connection::Connection;
use crate::error::{CinnabarError, Result};
use crate::protocol::{self, KeyType, Reply};

/// Synchronous client for the key-value store
///
/// Owns exactly one connection, opened lazily on the first command.
/// Strictly request/response: every call blocks until its reply has been
/// read to completion. Not safe for concurrent use from multiple threads;
/// callers needing concurrency must serialize access externally.
pub struct Client {
    conn: Connection,

    /// Database index last selected via [`Client::select_db`]. The server
    /// resets to database 0 on reconnect; the client does not re-apply
    /// the cached index, so callers must re-select after a failure.
    db: i64,
}

impl Client {
    /// Create a client for the given configuration
    ///
    /// No I/O happens until the first command is issued.
    pub fn new(config: Config) -> Self {
        Self {
            conn: Connection::new(config),
            db: 0,
        }
    }

    /// Create a client for `host:port` with default settings
    pub fn with_addr(host: impl Into<String>, port: u16) -> Self {
        Self::new(Config::builder().host(host).port(port).build())
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &Config {
        self.conn.config()
    }

    /// Whether the client currently holds a live connection
    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    /// Close the connection, best-effort sending a QUIT first
    ///
    /// Idempotent; also runs automatically when the client is dropped.
    pub fn close(&mut self) {
        self.conn.close();
    }

    // =========================================================================
    // Generic key operations
    // =========================================================================

    /// Check server liveness
    pub fn ping(&mut self) -> Result<String> {
        self.exec_status(protocol::encode_inline("PING", &[]))
    }

    /// Send a raw command line and render its reply as text
    ///
    /// Generic entry point for front ends that pass through free-form
    /// command text. The text must be a single command line: embedded
    /// line breaks are rejected, since a second line would put an extra
    /// command on the wire and desynchronize the request/response
    /// stream. Absent values render as `(nil)`; multi-bulk replies
    /// render one element per line.
    pub fn raw_command(&mut self, command: &str) -> Result<String> {
        if command.trim().is_empty() {
            return Err(CinnabarError::InvalidArgument(
                "command must not be empty".to_string(),
            ));
        }
        if command.contains(['\r', '\n']) {
            return Err(CinnabarError::InvalidArgument(
                "command must be a single line".to_string(),
            ));
        }

        match self.exec(protocol::encode_inline(command.trim(), &[]))? {
            Reply::Status(text) => Ok(text),
            Reply::Error(e) => Err(CinnabarError::Server(e)),
            Reply::Integer(n) => Ok(n.to_string()),
            Reply::Bulk(None) => Ok("(nil)".to_string()),
            Reply::Bulk(Some(payload)) => utf8(payload),
            Reply::MultiBulk(None) => Ok("(nil)".to_string()),
            Reply::MultiBulk(Some(items)) => {
                let lines: Vec<String> = items
                    .into_iter()
                    .map(|item| match item {
                        Some(payload) => utf8(payload),
                        None => Ok("(nil)".to_string()),
                    })
                    .collect::<Result<_>>()?;
                Ok(lines.join("\n"))
            }
        }
    }

    /// Test if a key exists
    pub fn exists(&mut self, key: &str) -> Result<bool> {
        check_key("key", key)?;
        let n = self.exec_int(protocol::encode_inline("EXISTS", &[key]))?;
        Ok(n == 1)
    }

    /// Remove a key, returning whether it existed
    pub fn del(&mut self, key: &str) -> Result<bool> {
        check_key("key", key)?;
        let n = self.exec_int(protocol::encode_inline("DEL", &[key]))?;
        Ok(n == 1)
    }

    /// Remove several keys, returning how many were deleted
    pub fn del_many(&mut self, keys: &[&str]) -> Result<i64> {
        check_keys(keys)?;
        self.exec_int(protocol::encode_inline("DEL", keys))
    }

    /// Return the category of the value stored at a key
    pub fn key_type(&mut self, key: &str) -> Result<KeyType> {
        check_key("key", key)?;
        let text = self.exec_status(protocol::encode_inline("TYPE", &[key]))?;
        KeyType::from_type_reply(&text).ok_or_else(|| {
            CinnabarError::Protocol(format!("unknown key type in reply: {:?}", text))
        })
    }

    /// Enumerate every key in the selected database
    ///
    /// See [`Client::keys_matching`] for the space-in-key caveat.
    pub fn keys(&mut self) -> Result<Vec<String>> {
        self.keys_matching("*")
    }

    /// Enumerate the keys matching a glob pattern
    ///
    /// The server returns the names as one space-separated bulk payload,
    /// so any key name that itself contains a space comes back split into
    /// pieces. Known protocol limitation.
    pub fn keys_matching(&mut self, pattern: &str) -> Result<Vec<String>> {
        check_key("pattern", pattern)?;
        let payload = self.exec_bulk(protocol::encode_inline("KEYS", &[pattern]))?;

        let text = utf8(payload.unwrap_or_default())?;
        Ok(text
            .split(' ')
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Return a random key from the selected database
    pub fn random_key(&mut self) -> Result<String> {
        self.exec_status(protocol::encode_inline("RANDOMKEY", &[]))
    }

    /// Rename a key, overwriting the destination if it exists
    pub fn rename(&mut self, old_key: &str, new_key: &str) -> Result<bool> {
        check_key("old_key", old_key)?;
        check_key("new_key", new_key)?;
        self.exec_status(protocol::encode_inline("RENAME", &[old_key, new_key]))?;
        Ok(true)
    }

    /// Rename a key, failing if the destination already exists
    pub fn rename_nx(&mut self, old_key: &str, new_key: &str) -> Result<bool> {
        check_key("old_key", old_key)?;
        check_key("new_key", new_key)?;
        let n = self.exec_int(protocol::encode_inline("RENAMENX", &[old_key, new_key]))?;
        Ok(n == 1)
    }

    /// Number of keys in the selected database
    pub fn db_size(&mut self) -> Result<i64> {
        self.exec_int(protocol::encode_inline("DBSIZE", &[]))
    }

    /// Set a time to live in seconds on a key
    pub fn expire(&mut self, key: &str, seconds: i64) -> Result<bool> {
        check_key("key", key)?;
        let n = self.exec_int(protocol::encode_inline(
            "EXPIRE",
            &[key, &seconds.to_string()],
        ))?;
        Ok(n == 1)
    }

    /// Set an absolute expiry on a key as a Unix timestamp
    pub fn expire_at(&mut self, key: &str, unix_time: i64) -> Result<bool> {
        check_key("key", key)?;
        let n = self.exec_int(protocol::encode_inline(
            "EXPIREAT",
            &[key, &unix_time.to_string()],
        ))?;
        Ok(n == 1)
    }

    /// Remaining time to live of a key, in seconds
    pub fn ttl(&mut self, key: &str) -> Result<i64> {
        check_key("key", key)?;
        self.exec_int(protocol::encode_inline("TTL", &[key]))
    }

    /// Select the database with the given zero-based index
    ///
    /// The index is cached, but a reconnect implicitly lands back on
    /// database 0: the client does not resend the selection, so callers
    /// must re-apply it after a connection failure.
    pub fn select_db(&mut self, index: i64) -> Result<()> {
        self.exec_status(protocol::encode_inline("SELECT", &[&index.to_string()]))?;
        self.db = index;
        Ok(())
    }

    /// The database index last selected through this client
    pub fn db(&self) -> i64 {
        self.db
    }

    // =========================================================================
    // String operations
    // =========================================================================

    /// Set a key to a binary value
    pub fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        check_key("key", key)?;
        self.exec_status(protocol::encode_bulk("SET", &[key], value)?)?;
        Ok(())
    }

    /// Set a key to a string value
    pub fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.set(key, value.as_bytes())
    }

    /// Set a key only if it does not exist
    ///
    /// Fire-and-forget: any non-error reply counts as success, regardless
    /// of whether the key was actually written.
    pub fn set_nx(&mut self, key: &str, value: &[u8]) -> Result<()> {
        check_key("key", key)?;
        self.exec_ack(protocol::encode_bulk("SETNX", &[key], value)?)
    }

    /// String variant of [`Client::set_nx`]
    pub fn set_nx_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_nx(key, value.as_bytes())
    }

    /// Return the value of a key, or `None` if it has never been set
    pub fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        check_key("key", key)?;
        self.exec_bulk(protocol::encode_inline("GET", &[key]))
    }

    /// Return the string value of a key
    pub fn get_string(&mut self, key: &str) -> Result<Option<String>> {
        self.get(key)?.map(utf8).transpose()
    }

    /// Atomically set a key and return its previous value
    pub fn get_set(&mut self, key: &str, value: &[u8]) -> Result<Option<Vec<u8>>> {
        check_key("key", key)?;
        self.exec_bulk(protocol::encode_bulk("GETSET", &[key], value)?)
    }

    /// String variant of [`Client::get_set`]
    pub fn get_set_string(&mut self, key: &str, value: &str) -> Result<Option<String>> {
        self.get_set(key, value.as_bytes())?.map(utf8).transpose()
    }

    /// Return the values of several keys in one round trip
    ///
    /// Keys that do not exist yield `None` entries in their position. The
    /// outer `None` is a server-absent result (`*-1`), distinct from an
    /// empty collection.
    pub fn mget(&mut self, keys: &[&str]) -> Result<Option<Vec<Option<Vec<u8>>>>> {
        check_keys(keys)?;
        self.exec_multi_bulk(protocol::encode_inline("MGET", keys))
    }

    /// Increment the integer value of a key by one
    pub fn incr(&mut self, key: &str) -> Result<i64> {
        check_key("key", key)?;
        self.exec_int(protocol::encode_inline("INCR", &[key]))
    }

    /// Increment the integer value of a key by `count`
    pub fn incr_by(&mut self, key: &str, count: i64) -> Result<i64> {
        check_key("key", key)?;
        self.exec_int(protocol::encode_inline("INCRBY", &[key, &count.to_string()]))
    }

    /// Decrement the integer value of a key by one
    pub fn decr(&mut self, key: &str) -> Result<i64> {
        check_key("key", key)?;
        self.exec_int(protocol::encode_inline("DECR", &[key]))
    }

    /// Decrement the integer value of a key by `count`
    pub fn decr_by(&mut self, key: &str, count: i64) -> Result<i64> {
        check_key("key", key)?;
        self.exec_int(protocol::encode_inline("DECRBY", &[key, &count.to_string()]))
    }

    /// Move a key from the selected database to another one
    pub fn move_key(&mut self, key: &str, db_index: i64) -> Result<bool> {
        check_key("key", key)?;
        let n = self.exec_int(protocol::encode_inline(
            "MOVE",
            &[key, &db_index.to_string()],
        ))?;
        Ok(n == 1)
    }

    // =========================================================================
    // List operations
    // =========================================================================

    /// Append an element to the head or tail of the list at `key`
    pub fn push(&mut self, key: &str, value: &[u8], tail: bool) -> Result<()> {
        check_key("key", key)?;
        let name = if tail { "RPUSH" } else { "LPUSH" };
        self.exec_ack(protocol::encode_bulk(name, &[key], value)?)
    }

    /// String variant of [`Client::push`]
    pub fn push_string(&mut self, key: &str, value: &str, tail: bool) -> Result<()> {
        self.push(key, value.as_bytes(), tail)
    }

    /// Overwrite the element at `index` of the list at `key`
    pub fn list_set(&mut self, key: &str, index: i64, value: &[u8]) -> Result<()> {
        check_key("key", key)?;
        self.exec_ack(protocol::encode_bulk(
            "LSET",
            &[key, &index.to_string()],
            value,
        )?)
    }

    /// String variant of [`Client::list_set`]
    pub fn list_set_string(&mut self, key: &str, index: i64, value: &str) -> Result<()> {
        self.list_set(key, index, value.as_bytes())
    }

    /// Length of the list stored at `key`
    pub fn list_len(&mut self, key: &str) -> Result<i64> {
        check_key("key", key)?;
        self.exec_int(protocol::encode_inline("LLEN", &[key]))
    }

    /// Return a range of elements from the list at `key`
    ///
    /// An absent or empty list maps to an empty collection.
    pub fn list_range(&mut self, key: &str, start: i64, end: i64) -> Result<Vec<Vec<u8>>> {
        check_key("key", key)?;
        let items = self.exec_multi_bulk(protocol::encode_inline(
            "LRANGE",
            &[key, &start.to_string(), &end.to_string()],
        ))?;
        Ok(flatten(items))
    }

    /// String variant of [`Client::list_range`]
    pub fn list_range_string(&mut self, key: &str, start: i64, end: i64) -> Result<Vec<String>> {
        self.list_range(key, start, end)?
            .into_iter()
            .map(utf8)
            .collect()
    }

    /// Return the element at `index` of the list at `key`
    pub fn list_index(&mut self, key: &str, index: i64) -> Result<Option<Vec<u8>>> {
        check_key("key", key)?;
        self.exec_bulk(protocol::encode_inline("LINDEX", &[key, &index.to_string()]))
    }

    /// String variant of [`Client::list_index`]
    pub fn list_index_string(&mut self, key: &str, index: i64) -> Result<Option<String>> {
        self.list_index(key, index)?.map(utf8).transpose()
    }

    /// Remove and return an element of the list at `key`
    ///
    /// Historical quirk, kept for wire compatibility: both ends issue
    /// RPOP, so the `tail` flag does not change which end is popped.
    pub fn pop(&mut self, key: &str, tail: bool) -> Result<Option<Vec<u8>>> {
        check_key("key", key)?;
        let _ = tail;
        self.exec_bulk(protocol::encode_inline("RPOP", &[key]))
    }

    /// String variant of [`Client::pop`]
    pub fn pop_string(&mut self, key: &str, tail: bool) -> Result<Option<String>> {
        self.pop(key, tail)?.map(utf8).transpose()
    }

    /// Trim the list at `key` to the given range of elements
    pub fn trim_list(&mut self, key: &str, start: i64, end: i64) -> Result<()> {
        check_key("key", key)?;
        self.exec_status(protocol::encode_inline(
            "LTRIM",
            &[key, &start.to_string(), &end.to_string()],
        ))?;
        Ok(())
    }

    // =========================================================================
    // Set operations
    // =========================================================================

    /// Add a value to the set at `key`
    pub fn set_add(&mut self, key: &str, value: &[u8]) -> Result<()> {
        check_key("key", key)?;
        self.exec_ack(protocol::encode_bulk("SADD", &[key], value)?)
    }

    /// String variant of [`Client::set_add`]
    pub fn set_add_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_add(key, value.as_bytes())
    }

    /// Remove a value from the set at `key`, returning whether it was
    /// a member
    pub fn set_remove(&mut self, key: &str, value: &[u8]) -> Result<bool> {
        check_key("key", key)?;
        let n = self.exec_int(protocol::encode_bulk("SREM", &[key], value)?)?;
        Ok(n == 1)
    }

    /// String variant of [`Client::set_remove`]
    pub fn set_remove_string(&mut self, key: &str, value: &str) -> Result<bool> {
        self.set_remove(key, value.as_bytes())
    }

    /// Number of elements in the set at `key`
    pub fn set_cardinality(&mut self, key: &str) -> Result<i64> {
        check_key("key", key)?;
        self.exec_int(protocol::encode_inline("SCARD", &[key]))
    }

    /// Test if a value is a member of the set at `key`
    pub fn is_set_member(&mut self, key: &str, member: &[u8]) -> Result<bool> {
        check_key("key", key)?;
        let n = self.exec_int(protocol::encode_bulk("SISMEMBER", &[key], member)?)?;
        Ok(n == 1)
    }

    /// String variant of [`Client::is_set_member`]
    pub fn is_set_member_string(&mut self, key: &str, member: &str) -> Result<bool> {
        self.is_set_member(key, member.as_bytes())
    }

    /// Intersection of the sets stored at the given keys
    pub fn set_intersect(&mut self, keys: &[&str]) -> Result<Vec<Vec<u8>>> {
        check_keys(keys)?;
        let items = self.exec_multi_bulk(protocol::encode_inline("SINTER", keys))?;
        Ok(flatten(items))
    }

    /// String variant of [`Client::set_intersect`]
    pub fn set_intersect_string(&mut self, keys: &[&str]) -> Result<Vec<String>> {
        self.set_intersect(keys)?.into_iter().map(utf8).collect()
    }

    /// All members of the set at `key`
    pub fn set_members(&mut self, key: &str) -> Result<Vec<Vec<u8>>> {
        check_key("key", key)?;
        let items = self.exec_multi_bulk(protocol::encode_inline("SMEMBERS", &[key]))?;
        Ok(flatten(items))
    }

    /// String variant of [`Client::set_members`]
    pub fn set_members_string(&mut self, key: &str) -> Result<Vec<String>> {
        self.set_members(key)?.into_iter().map(utf8).collect()
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    /// Sort the list or set at `key` with a query of sort options
    ///
    /// `None` means the server reported the whole result as absent
    /// (`*-1`), distinct from `Some` of an empty collection; interior
    /// entries may be absent when the query projects missing keys.
    pub fn sort(&mut self, key: &str, query: &str) -> Result<Option<Vec<Option<Vec<u8>>>>> {
        check_key("key", key)?;
        let frame = if query.is_empty() {
            protocol::encode_inline("SORT", &[key])
        } else {
            protocol::encode_inline("SORT", &[key, query])
        };
        self.exec_multi_bulk(frame)
    }

    /// String variant of [`Client::sort`]; interior absent entries are
    /// dropped
    pub fn sort_string(&mut self, key: &str, query: &str) -> Result<Option<Vec<String>>> {
        match self.sort(key, query)? {
            None => Ok(None),
            Some(items) => items
                .into_iter()
                .flatten()
                .map(utf8)
                .collect::<Result<Vec<_>>>()
                .map(Some),
        }
    }

    // =========================================================================
    // Persistence and server control
    // =========================================================================

    /// Synchronously save the dataset to disk
    ///
    /// Soft call: returns the raw reply line verbatim, error lines
    /// included, for the caller to inspect.
    pub fn save(&mut self) -> Result<String> {
        self.exec_raw_line(protocol::encode_inline("SAVE", &[]))
    }

    /// Save the dataset to disk in the background (soft call)
    pub fn background_save(&mut self) -> Result<String> {
        self.exec_raw_line(protocol::encode_inline("BGSAVE", &[]))
    }

    /// Save the dataset and shut the server down (soft call)
    ///
    /// A server that obeys closes the connection without replying, in
    /// which case the returned line is empty.
    pub fn shutdown(&mut self) -> Result<String> {
        self.exec_raw_line(protocol::encode_inline("SHUTDOWN", &[]))
    }

    /// Time of the last successful save of the dataset
    pub fn last_save(&mut self) -> Result<SystemTime> {
        let t = self.exec_int(protocol::encode_inline("LASTSAVE", &[]))?;
        Ok(UNIX_EPOCH + Duration::from_secs(t.max(0) as u64))
    }

    /// Server information and statistics as `key: value` pairs
    ///
    /// Lines without a colon are skipped.
    pub fn info(&mut self) -> Result<HashMap<String, String>> {
        let payload = self.exec_bulk(protocol::encode_inline("INFO", &[]))?;
        let text = utf8(payload.unwrap_or_default())?;

        let mut map = HashMap::new();
        for line in text.split('\n') {
            if let Some((name, value)) = line.split_once(':') {
                map.insert(name.to_string(), value.trim_end_matches('\r').to_string());
            }
        }
        Ok(map)
    }

    // =========================================================================
    // Send/decode plumbing
    // =========================================================================

    /// Send one frame and read its reply
    fn exec(&mut self, frame: Bytes) -> Result<Reply> {
        self.conn.send(&frame)?;
        self.conn.read_reply()
    }

    /// Expect a status reply, returning its text
    fn exec_status(&mut self, frame: Bytes) -> Result<String> {
        match self.exec(frame)? {
            Reply::Status(text) => Ok(text),
            Reply::Error(e) => Err(CinnabarError::Server(e)),
            other => Err(unexpected("status", &other)),
        }
    }

    /// Expect an integer reply
    fn exec_int(&mut self, frame: Bytes) -> Result<i64> {
        match self.exec(frame)? {
            Reply::Integer(n) => Ok(n),
            Reply::Error(e) => Err(CinnabarError::Server(e)),
            other => Err(unexpected("integer", &other)),
        }
    }

    /// Expect a bulk reply, `None` meaning absent
    fn exec_bulk(&mut self, frame: Bytes) -> Result<Option<Vec<u8>>> {
        match self.exec(frame)? {
            Reply::Bulk(payload) => Ok(payload),
            Reply::Error(e) => Err(CinnabarError::Server(e)),
            other => Err(unexpected("bulk", &other)),
        }
    }

    /// Expect a multi-bulk reply, `None` meaning an absent array
    fn exec_multi_bulk(&mut self, frame: Bytes) -> Result<Option<Vec<Option<Vec<u8>>>>> {
        match self.exec(frame)? {
            Reply::MultiBulk(items) => Ok(items),
            Reply::Error(e) => Err(CinnabarError::Server(e)),
            other => Err(unexpected("multi-bulk", &other)),
        }
    }

    /// Accept any non-error reply as an acknowledgement
    fn exec_ack(&mut self, frame: Bytes) -> Result<()> {
        match self.exec(frame)? {
            Reply::Error(e) => Err(CinnabarError::Server(e)),
            _ => Ok(()),
        }
    }

    /// Send one frame and return the raw reply line, never decoding it
    fn exec_raw_line(&mut self, frame: Bytes) -> Result<String> {
        self.conn.send(&frame)?;
        self.conn.read_raw_line()
    }
}

// =============================================================================
// Argument validation and reply conversion helpers
// =============================================================================

/// Reject an empty required argument before any network I/O
fn check_key(name: &str, key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CinnabarError::InvalidArgument(format!(
            "{} must not be empty",
            name
        )));
    }
    Ok(())
}

/// Reject an empty key list or any empty key within it
fn check_keys(keys: &[&str]) -> Result<()> {
    if keys.is_empty() {
        return Err(CinnabarError::InvalidArgument(
            "at least one key is required".to_string(),
        ));
    }
    for key in keys {
        check_key("key", key)?;
    }
    Ok(())
}

fn unexpected(wanted: &str, got: &Reply) -> CinnabarError {
    CinnabarError::Protocol(format!(
        "expected {} reply, got {}",
        wanted,
        got.kind_name()
    ))
}

/// Decode a reply payload as UTF-8 text
fn utf8(payload: Vec<u8>) -> Result<String> {
    String::from_utf8(payload)
        .map_err(|_| CinnabarError::Protocol("reply payload is not valid UTF-8".to_string()))
}

/// Map `None` (absent array) to empty and drop interior absent entries
fn flatten(items: Option<Vec<Option<Vec<u8>>>>) -> Vec<Vec<u8>> {
    items.unwrap_or_default().into_iter().flatten().collect()
}
