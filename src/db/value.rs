use std::collections::VecDeque;

use bytes::Bytes;
use hashbrown::HashMap;

use crate::db::sorted_set::OrderedSet;

/// A hash value: subkey to byte string, insertion order not observable.
pub type Hash = HashMap<Bytes, Bytes>;

/// A list value: an ordered sequence of byte strings with O(1) push/pop at
/// either end. The teacher's unsafe intrusive `linked_list.rs` supports
/// cursor splicing (`LINSERT`/`LTRIM`) this design's command surface doesn't
/// need; a safe `VecDeque` covers push/pop/index/remove at the cost this
/// design can afford.
pub type List = VecDeque<Bytes>;

/// The left or right edge of a list.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Edge {
    Left,
    Right,
}

/// An error from an operation on a [`Value`] of the wrong shape.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ValueError;

impl std::fmt::Display for ValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WRONGTYPE Operation against a key holding the wrong kind of value")
    }
}

impl std::error::Error for ValueError {}

/// A value in a database: the tagged-variant keyspace spec §3 recommends in
/// place of the source's four parallel maps. At most one shape exists per
/// key, enforced by construction rather than by convention.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(Bytes),
    Hash(Hash),
    List(List),
    SortedSet(OrderedSet),
}

impl Value {
    pub fn hash() -> Self {
        Value::Hash(Hash::new())
    }

    pub fn list() -> Self {
        Value::List(List::new())
    }

    pub fn sorted_set() -> Self {
        Value::SortedSet(OrderedSet::default())
    }

    /// The name `TYPE` reports for this shape.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Hash(_) => "hash",
            Value::List(_) => "list",
            Value::SortedSet(_) => "zset",
        }
    }

    pub fn as_string(&self) -> Result<&Bytes, ValueError> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(ValueError),
        }
    }

    pub fn as_hash(&self) -> Result<&Hash, ValueError> {
        match self {
            Value::Hash(h) => Ok(h),
            _ => Err(ValueError),
        }
    }

    pub fn mut_hash(&mut self) -> Result<&mut Hash, ValueError> {
        match self {
            Value::Hash(h) => Ok(h),
            _ => Err(ValueError),
        }
    }

    pub fn as_list(&self) -> Result<&List, ValueError> {
        match self {
            Value::List(l) => Ok(l),
            _ => Err(ValueError),
        }
    }

    pub fn mut_list(&mut self) -> Result<&mut List, ValueError> {
        match self {
            Value::List(l) => Ok(l),
            _ => Err(ValueError),
        }
    }

    pub fn as_sorted_set(&self) -> Result<&OrderedSet, ValueError> {
        match self {
            Value::SortedSet(s) => Ok(s),
            _ => Err(ValueError),
        }
    }

    pub fn mut_sorted_set(&mut self) -> Result<&mut OrderedSet, ValueError> {
        match self {
            Value::SortedSet(s) => Ok(s),
            _ => Err(ValueError),
        }
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::String(Bytes::from(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_shape_is_an_error() {
        let v = Value::hash();
        assert!(v.as_string().is_err());
        assert!(v.as_list().is_err());
    }

    #[test]
    fn type_names_match_the_wire_vocabulary() {
        assert_eq!(Value::String(Bytes::new()).type_name(), "string");
        assert_eq!(Value::hash().type_name(), "hash");
        assert_eq!(Value::list().type_name(), "list");
        assert_eq!(Value::sorted_set().type_name(), "zset");
    }
}
