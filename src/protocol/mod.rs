//! Protocol Module
//!
//! Defines the text/binary hybrid wire protocol spoken with the server.
//!
//! ## Protocol Format
//!
//! ### Command Formats
//! ```text
//! Inline: NAME arg1 .. argN\r\n
//! Bulk:   NAME arg1 .. argN <payload-len>\r\n<payload-bytes>\r\n
//! ```
//!
//! ### Reply Kinds (first byte of the reply line)
//! - `+` Status     - one-line acknowledgement
//! - `-` Error      - one-line error message
//! - `:` Integer    - signed base-10 integer
//! - `$` Bulk       - length-prefixed binary value, `-1` = absent
//! - `*` MultiBulk  - count-prefixed sequence of bulk values, `-1` = absent
//!
//! The protocol is strictly request/response: every command produces
//! exactly one reply, which is read to completion before the next command
//! is sent.

mod reply;
mod codec;

pub use reply::{KeyType, Reply};
pub use codec::{encode_bulk, encode_inline, read_line, read_reply, MAX_VALUE_SIZE};
