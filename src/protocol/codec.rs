//! Protocol codec
//!
//! Encoding of command frames and decoding of server replies.
//!
//! ## Wire Format
//!
//! ### Command Format
//! ```text
//! Inline: NAME arg1 .. argN\r\n
//! Bulk:   NAME arg1 .. argN <payload-len>\r\n<payload-bytes>\r\n
//! ```
//!
//! The bulk payload length is the raw byte length of the value,
//! independent of its textual encoding.
//!
//! ### Reply Format (dispatch on the first byte of the reply line)
//! - `+` status: remainder of the line is the status text
//! - `-` error:  remainder of the line is the error text
//! - `:` integer: remainder of the line is a base-10 signed integer
//! - `$` bulk: decimal length, then that many raw bytes, then CRLF
//!   (length `-1` = absent value)
//! - `*` multi-bulk: decimal count, then that many bulk replies
//!   (count `-1` = absent array)

use std::io::{BufRead, Read};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CinnabarError, Result};
use super::Reply;

/// Maximum accepted payload size: 1 GiB
pub const MAX_VALUE_SIZE: usize = 1_073_741_824;

/// Upper bound on the element buffer reserved ahead of decoding a
/// multi-bulk reply; the buffer still grows as elements arrive
const MAX_PREALLOC_ITEMS: usize = 1024;

// =============================================================================
// Command Encoding
// =============================================================================

/// Encode an inline command: `NAME arg1 .. argN\r\n`
///
/// Used for commands that carry no binary payload.
pub fn encode_inline(name: &str, args: &[&str]) -> Bytes {
    let arg_len: usize = args.iter().map(|a| a.len() + 1).sum();
    let mut frame = BytesMut::with_capacity(name.len() + arg_len + 2);

    frame.put_slice(name.as_bytes());
    for arg in args {
        frame.put_u8(b' ');
        frame.put_slice(arg.as_bytes());
    }
    frame.put_slice(b"\r\n");

    frame.freeze()
}

/// Encode a bulk command: `NAME arg1 .. argN <len>\r\n<payload>\r\n`
///
/// Used for commands that carry a value. The payload length is appended as
/// the final argument of the command line. Payloads over [`MAX_VALUE_SIZE`]
/// are rejected before any network I/O.
pub fn encode_bulk(name: &str, args: &[&str], payload: &[u8]) -> Result<Bytes> {
    if payload.len() > MAX_VALUE_SIZE {
        return Err(CinnabarError::ValueTooLarge {
            size: payload.len(),
        });
    }

    let len_text = payload.len().to_string();
    let arg_len: usize = args.iter().map(|a| a.len() + 1).sum();
    let mut frame =
        BytesMut::with_capacity(name.len() + arg_len + len_text.len() + payload.len() + 5);

    frame.put_slice(name.as_bytes());
    for arg in args {
        frame.put_u8(b' ');
        frame.put_slice(arg.as_bytes());
    }
    frame.put_u8(b' ');
    frame.put_slice(len_text.as_bytes());
    frame.put_slice(b"\r\n");
    frame.put_slice(payload);
    frame.put_slice(b"\r\n");

    Ok(frame.freeze())
}

// =============================================================================
// Reply Decoding
// =============================================================================

/// Read one complete reply from the stream
///
/// Blocks until a full reply is received. Any malformed reply is a
/// [`CinnabarError::Protocol`]; after one the stream position is
/// unreliable and the connection should not be reused.
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply> {
    let line = read_line(reader)?;
    if line.is_empty() {
        return Err(CinnabarError::Protocol("zero length reply line".to_string()));
    }

    match line.as_bytes()[0] {
        b'+' => Ok(Reply::Status(line[1..].to_string())),
        b'-' => Ok(Reply::Error(strip_err_token(&line[1..]).to_string())),
        b':' => line[1..]
            .parse::<i64>()
            .map(Reply::Integer)
            .map_err(|_| {
                CinnabarError::Protocol(format!("unparsable integer reply: {:?}", &line[1..]))
            }),
        b'$' => read_bulk_body(reader, &line[1..]).map(Reply::Bulk),
        b'*' => read_multi_bulk_body(reader, &line[1..]).map(Reply::MultiBulk),
        _ => Err(CinnabarError::Protocol(format!(
            "unexpected reply prefix: {:?}",
            line
        ))),
    }
}

/// Read one reply line, scanning bytes up to `\n`
///
/// Every `\r` encountered is discarded, so a line missing its `\r` is
/// accepted, but a line is always bounded by `\n`. End-of-stream before a
/// `\n` is a protocol violation.
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut buf = Vec::new();
    reader.read_until(b'\n', &mut buf)?;

    if buf.pop() != Some(b'\n') {
        return Err(CinnabarError::Protocol(
            "stream ended before reply line terminator".to_string(),
        ));
    }
    buf.retain(|&b| b != b'\r');

    String::from_utf8(buf)
        .map_err(|_| CinnabarError::Protocol("reply line is not valid UTF-8".to_string()))
}

/// Strip a leading `ERR ` token from a server error message
fn strip_err_token(text: &str) -> &str {
    text.strip_prefix("ERR ").unwrap_or(text)
}

/// A stream that ends inside a reply is a protocol violation, not a
/// plain I/O failure
fn eof_to_protocol(e: std::io::Error) -> CinnabarError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        CinnabarError::Protocol("stream ended inside bulk reply".to_string())
    } else {
        CinnabarError::Io(e)
    }
}

/// Read the body of a bulk reply, given the length text after `$`
///
/// A length of `-1` is an absent value. Otherwise exactly `len` raw bytes
/// are read, followed by a mandatory CRLF terminator.
fn read_bulk_body<R: BufRead>(reader: &mut R, len_text: &str) -> Result<Option<Vec<u8>>> {
    let len = len_text.parse::<i64>().map_err(|_| {
        CinnabarError::Protocol(format!("unparsable bulk length: {:?}", len_text))
    })?;

    if len == -1 {
        return Ok(None);
    }
    if len < 0 || len as usize > MAX_VALUE_SIZE {
        return Err(CinnabarError::Protocol(format!(
            "bulk length out of range: {}",
            len
        )));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).map_err(eof_to_protocol)?;

    let mut terminator = [0u8; 2];
    reader.read_exact(&mut terminator).map_err(eof_to_protocol)?;
    if terminator != *b"\r\n" {
        return Err(CinnabarError::Protocol(
            "invalid bulk reply terminator".to_string(),
        ));
    }

    Ok(Some(payload))
}

/// Read the body of a multi-bulk reply, given the count text after `*`
///
/// A count of `-1` is an absent array, distinct from an empty one. The
/// elements are returned in receipt order; each may itself be absent.
fn read_multi_bulk_body<R: BufRead>(
    reader: &mut R,
    count_text: &str,
) -> Result<Option<Vec<Option<Vec<u8>>>>> {
    let count = count_text.parse::<i64>().map_err(|_| {
        CinnabarError::Protocol(format!("unparsable multi-bulk count: {:?}", count_text))
    })?;

    if count == -1 {
        return Ok(None);
    }
    if count < 0 {
        return Err(CinnabarError::Protocol(format!(
            "multi-bulk count out of range: {}",
            count
        )));
    }

    // The count comes off the wire, so cap the pre-allocation; a count
    // larger than the actual stream contents fails on the missing
    // elements instead of allocating up front.
    let mut items = Vec::with_capacity((count as usize).min(MAX_PREALLOC_ITEMS));
    for _ in 0..count {
        items.push(read_bulk_item(reader)?);
    }
    Ok(Some(items))
}

/// Read a single bulk element inside a multi-bulk reply
///
/// An interior error line aborts the whole reply; its `ERR ` token is
/// stripped at the raw-line level before it surfaces.
fn read_bulk_item<R: BufRead>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let line = read_line(reader)?;
    if line.is_empty() {
        return Err(CinnabarError::Protocol("zero length reply line".to_string()));
    }

    match line.as_bytes()[0] {
        b'$' => read_bulk_body(reader, &line[1..]),
        b'-' => Err(CinnabarError::Server(
            strip_err_token(&line[1..]).to_string(),
        )),
        _ => Err(CinnabarError::Protocol(format!(
            "expected bulk element, got: {:?}",
            line
        ))),
    }
}
