//! Reply definitions
//!
//! Typed representations of the five server reply shapes.

/// A single decoded server reply
///
/// Exactly one variant is produced per wire exchange. Facade operations
/// match exhaustively so that an unexpected shape surfaces as a protocol
/// error instead of falling through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// One-line non-error acknowledgement, e.g. `+OK`
    Status(String),

    /// One-line error message (`-` prefix), with a leading `ERR ` token
    /// already stripped
    Error(String),

    /// Signed integer reply (`:` prefix), also used for boolean 0/1
    Integer(i64),

    /// Single binary value (`$` prefix); `None` means the server reported
    /// the value as absent (`$-1`)
    Bulk(Option<Vec<u8>>),

    /// Ordered sequence of bulk values (`*` prefix); the outer `None` is an
    /// absent array (`*-1`), distinct from an empty one, and interior
    /// entries may themselves be absent
    MultiBulk(Option<Vec<Option<Vec<u8>>>>),
}

impl Reply {
    /// Short human-readable name of the reply kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Reply::Status(_) => "status",
            Reply::Error(_) => "error",
            Reply::Integer(_) => "integer",
            Reply::Bulk(_) => "bulk",
            Reply::MultiBulk(_) => "multi-bulk",
        }
    }
}

/// Server-reported category of a stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// Key does not exist
    None,
    String,
    List,
    Set,
}

impl KeyType {
    /// Map a `TYPE` status reply to a key type
    ///
    /// Returns `None` for any text outside the four known categories.
    pub fn from_type_reply(text: &str) -> Option<KeyType> {
        match text {
            "none" => Some(KeyType::None),
            "string" => Some(KeyType::String),
            "list" => Some(KeyType::List),
            "set" => Some(KeyType::Set),
            _ => None,
        }
    }
}
