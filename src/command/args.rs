use bytes::Bytes;

use crate::error::ReplyError;

/// A cursor over a command's argument vector, offering the coercions the
/// dispatcher needs (spec §4.7: "for each positional, one of {string,
/// integer, positive-integer, byte-blob, key-value-map}").
///
/// Grounded on the teacher's `request.rs` `Request`, reduced from its many
/// domain-specific coercions (`client_id`, `bit_offset`, `not_nan`, …) to the
/// handful this command surface actually uses.
pub struct Args<'a> {
    name: &'a str,
    items: &'a [Bytes],
    next: usize,
}

impl<'a> Args<'a> {
    #[must_use]
    pub fn new(name: &'a str, items: &'a [Bytes]) -> Self {
        Args { name, items, next: 0 }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.items.len() - self.next
    }

    fn wrong_args(&self) -> ReplyError {
        ReplyError::WrongArgCount(self.name.into())
    }

    /// The next argument as a raw byte string.
    pub fn bytes(&mut self) -> Result<Bytes, ReplyError> {
        let item = self.items.get(self.next).ok_or_else(|| self.wrong_args())?;
        self.next += 1;
        Ok(item.clone())
    }

    /// The next argument parsed as a base-10 integer.
    pub fn int(&mut self) -> Result<i64, ReplyError> {
        let bytes = self.bytes()?;
        std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(ReplyError::NotAnInteger)
    }

    /// The next argument parsed as a non-negative integer.
    pub fn positive_int(&mut self) -> Result<i64, ReplyError> {
        let value: i64 = self.int().map_err(|_| ReplyError::NotAPositiveInteger)?;
        if value < 0 {
            return Err(ReplyError::NotAPositiveInteger);
        }
        Ok(value)
    }

    /// The next argument as an ASCII-uppercased keyword, for option flags
    /// like `EX`/`MATCH`/`COUNT`.
    pub fn keyword(&mut self) -> Result<Vec<u8>, ReplyError> {
        Ok(self.bytes()?.to_ascii_uppercase())
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}
