use thiserror::Error;

/// An error surfaced to the client as a RESP error reply.
///
/// Every variant here corresponds to a documented failure mode of the command
/// surface; internal I/O errors (a dead pub/sub subscriber, say) are absorbed
/// silently elsewhere and never reach this type.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ReplyError {
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(Box<str>),

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArgCount(Box<str>),

    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    #[error("ERR value is not a positive integer or out of range")]
    NotAPositiveInteger,

    #[error("ERR timeout is not a float or out of range")]
    ParseTimeout,

    #[error("ERR invalid glob-style pattern")]
    InvalidPattern,

    #[error("ERR no such key")]
    KeyNotFound,

    #[error("ERR syntax error")]
    SyntaxError,

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
}

impl From<crate::glob::GlobError> for ReplyError {
    fn from(_: crate::glob::GlobError) -> Self {
        ReplyError::InvalidPattern
    }
}

impl From<crate::db::value::ValueError> for ReplyError {
    fn from(_: crate::db::value::ValueError) -> Self {
        ReplyError::WrongType
    }
}
