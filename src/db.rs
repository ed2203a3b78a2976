pub mod sorted_set;
pub mod value;

pub use sorted_set::OrderedSet;
pub use value::{Edge, Hash, List, Value, ValueError};

use bytes::Bytes;
use hashbrown::{hash_map::Entry, HashMap};

use crate::time::epoch;

/// A single numbered keyspace: every value plus its expiration deadline.
///
/// Grounded on the teacher's `db.rs` `DB` struct — same two-map shape (an
/// `objects` map and a separate `expires` map of absolute millisecond
/// deadlines) — generalized from the teacher's memory-tuned `StringValue` key
/// type to a plain `Bytes` key, since this design doesn't need the small-
/// string inline optimization the teacher's `ArrayString` provides.
#[derive(Debug, Clone, Default)]
pub struct Db {
    objects: HashMap<Bytes, Value>,
    expires: HashMap<Bytes, u128>,
}

impl Db {
    /// The value for `key`, unless it has expired.
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        if self.is_expired(key) {
            None
        } else {
            self.objects.get(key)
        }
    }

    pub fn exists(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// The mutable value for `key`, unless it has expired (an expired key is
    /// removed on access rather than waiting for the reaper).
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Value> {
        if self.is_expired(key) {
            self.remove(key);
            None
        } else {
            self.objects.get_mut(key)
        }
    }

    /// Sets the expiration deadline for `key`. Returns `true` if the key exists.
    pub fn expire(&mut self, key: &[u8], at: u128) -> bool {
        if !self.objects.contains_key(key) {
            return false;
        }
        if at <= epoch().as_millis() {
            self.remove(key);
            return true;
        }
        self.expires.insert(Bytes::copy_from_slice(key), at);
        true
    }

    /// Removes the expiration deadline for `key`. Returns `true` if one existed.
    pub fn persist(&mut self, key: &[u8]) -> bool {
        self.expires.remove(key).is_some()
    }

    /// Sets the value of `key`, clearing any expiration deadline (spec §6.1:
    /// a plain `SET` clears a pre-existing TTL, matching Redis rather than
    /// the source, which left a stale deadline in place).
    pub fn set(&mut self, key: &[u8], value: impl Into<Value>) -> Option<Value> {
        self.persist(key);
        self.objects.insert(Bytes::copy_from_slice(key), value.into())
    }

    /// Sets the value of `key` with an expiration deadline.
    pub fn setex(&mut self, key: &[u8], value: impl Into<Value>, at: u128) -> Option<Value> {
        let key = Bytes::copy_from_slice(key);
        self.expires.insert(key.clone(), at);
        self.objects.insert(key, value.into())
    }

    /// Removes `key` from this database, returning its prior value if live.
    pub fn remove(&mut self, key: &[u8]) -> Option<Value> {
        let expired = self.is_expired(key);
        self.persist(key);
        let value = self.objects.remove(key);
        if expired {
            None
        } else {
            value
        }
    }

    /// Milliseconds remaining until `key` expires, if it has a deadline.
    pub fn ttl(&self, key: &[u8]) -> Option<u128> {
        let deadline = *self.expires.get(key)?;
        let now = epoch().as_millis();
        if now >= deadline {
            None
        } else {
            Some(deadline - now)
        }
    }

    fn is_expired(&self, key: &[u8]) -> bool {
        match self.expires.get(key) {
            Some(deadline) => epoch().as_millis() >= *deadline,
            None => false,
        }
    }

    /// Iterates over every live key in this database.
    pub fn keys(&self) -> impl Iterator<Item = &Bytes> {
        self.objects.keys().filter(move |key| !self.is_expired(key))
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.objects.len()
    }

    /// Deletes every expired key, returning how many were removed. Called by
    /// the per-database reaper once per second (spec §4.3).
    pub fn sweep_expired(&mut self) -> usize {
        let now = epoch().as_millis();
        let doomed: Vec<Bytes> = self
            .expires
            .iter()
            .filter(|(_, deadline)| now >= **deadline)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            self.objects.remove(key);
            self.expires.remove(key);
        }
        doomed.len()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.expires.clear();
    }

    pub fn get_hash(&self, key: &[u8]) -> Result<Option<&Hash>, ValueError> {
        self.get(key).map(Value::as_hash).transpose()
    }

    pub fn mut_hash(&mut self, key: &[u8]) -> Result<Option<&mut Hash>, ValueError> {
        self.get_mut(key).map(Value::mut_hash).transpose()
    }

    /// The hash at `key`, creating an empty one if absent. Errors if `key`
    /// already holds a different shape.
    pub fn hash_or_default(&mut self, key: &[u8]) -> Result<&mut Hash, ValueError> {
        if self.is_expired(key) {
            self.remove(key);
        }
        match self.objects.entry(Bytes::copy_from_slice(key)) {
            Entry::Occupied(entry) => entry.into_mut().mut_hash(),
            Entry::Vacant(entry) => entry.insert(Value::hash()).mut_hash(),
        }
    }

    pub fn get_list(&self, key: &[u8]) -> Result<Option<&List>, ValueError> {
        self.get(key).map(Value::as_list).transpose()
    }

    pub fn mut_list(&mut self, key: &[u8]) -> Result<Option<&mut List>, ValueError> {
        self.get_mut(key).map(Value::mut_list).transpose()
    }

    /// The list at `key`, creating an empty one if absent. Used directly by
    /// the blocking coordinator (spec §4.5 step 1: "ensures each named list
    /// exists").
    pub fn list_or_default(&mut self, key: &[u8]) -> Result<&mut List, ValueError> {
        if self.is_expired(key) {
            self.remove(key);
        }
        match self.objects.entry(Bytes::copy_from_slice(key)) {
            Entry::Occupied(entry) => entry.into_mut().mut_list(),
            Entry::Vacant(entry) => entry.insert(Value::list()).mut_list(),
        }
    }

    pub fn get_sorted_set(&self, key: &[u8]) -> Result<Option<&OrderedSet>, ValueError> {
        self.get(key).map(Value::as_sorted_set).transpose()
    }

    pub fn mut_sorted_set(&mut self, key: &[u8]) -> Result<Option<&mut OrderedSet>, ValueError> {
        self.get_mut(key).map(Value::mut_sorted_set).transpose()
    }

    pub fn sorted_set_or_default(&mut self, key: &[u8]) -> Result<&mut OrderedSet, ValueError> {
        if self.is_expired(key) {
            self.remove(key);
        }
        match self.objects.entry(Bytes::copy_from_slice(key)) {
            Entry::Occupied(entry) => entry.into_mut().mut_sorted_set(),
            Entry::Vacant(entry) => entry.insert(Value::sorted_set()).mut_sorted_set(),
        }
    }

    pub fn get_string(&self, key: &[u8]) -> Result<Option<&Bytes>, ValueError> {
        self.get(key).map(Value::as_string).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn set_then_get() {
        let mut db = Db::default();
        assert_eq!(db.set(b"a", b("x")), None);
        assert_eq!(db.get(b"a"), Some(&Value::String(b("x"))));
        assert_eq!(db.set(b"a", b("y")), Some(Value::String(b("x"))));
    }

    #[test]
    fn set_clears_ttl() {
        let mut db = Db::default();
        db.setex(b"a", b("x"), epoch().as_millis() + 10_000);
        db.set(b"a", b("y"));
        assert_eq!(db.ttl(b"a"), None);
    }

    #[test]
    fn expire_in_the_past_removes_the_key() {
        let mut db = Db::default();
        db.set(b"a", b("x"));
        assert!(db.expire(b"a", epoch().as_millis() - 10_000));
        assert_eq!(db.get(b"a"), None);
    }

    #[test]
    fn sweep_expired_removes_only_past_deadlines() {
        let mut db = Db::default();
        db.setex(b"a", b("x"), epoch().as_millis() - 1);
        db.setex(b"b", b("y"), epoch().as_millis() + 10_000);
        assert_eq!(db.sweep_expired(), 1);
        assert!(db.objects.contains_key(b"b".as_slice()));
        assert!(!db.objects.contains_key(b"a".as_slice()));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let mut db = Db::default();
        db.set(b"a", b("x"));
        assert!(matches!(db.hash_or_default(b"a"), Err(ValueError)));
    }
}
