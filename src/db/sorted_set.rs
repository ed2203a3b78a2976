use std::collections::{BTreeSet, HashMap};

use bytes::Bytes;

/// A mapping from member to integer score, iterable in ascending `(score,
/// member)` order.
///
/// Grounded on the shape of [`crate::db::value::Hash`] (a plain hashbrown map)
/// but keeps a second, ordered index so that range and rank queries don't
/// require sorting on every call. This replaces the teacher's skip-list plus
/// listpack dual encoding (`skiplist.rs`, `db/value/sorted_set.rs`), which
/// exists to support float scores and large-set performance this design's
/// integer-only scores don't need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedSet {
    by_score: BTreeSet<(i64, Bytes)>,
    scores: HashMap<Bytes, i64>,
}

impl OrderedSet {
    /// Inserts or updates `member`'s score. Returns `true` if `member` is new.
    pub fn add(&mut self, score: i64, member: Bytes) -> bool {
        match self.scores.insert(member.clone(), score) {
            Some(old) if old == score => false,
            Some(old) => {
                self.by_score.remove(&(old, member.clone()));
                self.by_score.insert((score, member));
                false
            }
            None => {
                self.by_score.insert((score, member));
                true
            }
        }
    }

    /// Removes `member`, returning `true` if it was present.
    pub fn remove(&mut self, member: &[u8]) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.by_score.remove(&(score, Bytes::copy_from_slice(member)));
                true
            }
            None => false,
        }
    }

    pub fn score(&self, member: &[u8]) -> Option<i64> {
        self.scores.get(member).copied()
    }

    #[must_use]
    pub fn card(&self) -> usize {
        self.scores.len()
    }

    /// Members at rank positions `[start, stop]` inclusive. Negative ranks
    /// count from the tail; out-of-range bounds are clamped.
    pub fn range_by_rank(&self, start: i64, stop: i64) -> Vec<(Bytes, i64)> {
        let len = self.by_score.len();
        let Some((start, stop)) = clamp_range(start, stop, len) else {
            return Vec::new();
        };
        self.by_score
            .iter()
            .skip(start)
            .take(stop - start + 1)
            .map(|(score, member)| (member.clone(), *score))
            .collect()
    }

    /// Members with `min <= score <= max`, ascending.
    pub fn range_by_score(&self, min: i64, max: i64) -> Vec<(Bytes, i64)> {
        self.by_score
            .iter()
            .filter(|(score, _)| *score >= min && *score <= max)
            .map(|(score, member)| (member.clone(), *score))
            .collect()
    }

    /// Removes every member with `min <= score <= max`, returning the count removed.
    pub fn remove_range_by_score(&mut self, min: i64, max: i64) -> usize {
        let doomed: Vec<(i64, Bytes)> = self
            .by_score
            .iter()
            .filter(|(score, _)| *score >= min && *score <= max)
            .cloned()
            .collect();
        for (score, member) in &doomed {
            self.scores.remove(member.as_ref());
            self.by_score.remove(&(*score, member.clone()));
        }
        doomed.len()
    }
}

/// Resolves a possibly-negative `[start, stop]` rank range against `len`,
/// clamping both ends into bounds. Returns `None` if the resolved range is
/// empty (e.g. `start` past the end, or `start > stop`).
fn clamp_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let resolve = |index: i64| if index < 0 { index + len } else { index };
    let start = resolve(start).max(0);
    let stop = resolve(stop).min(len - 1);
    if start > stop || start >= len {
        return None;
    }
    #[allow(clippy::cast_sign_loss)]
    Some((start as usize, stop as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn add_reports_new_vs_update() {
        let mut set = OrderedSet::default();
        assert!(set.add(2, b("x")));
        assert!(!set.add(2, b("x")));
        assert_eq!(set.score(b"x"), Some(2));
        assert_eq!(set.card(), 1);
    }

    #[test]
    fn ascending_order_breaks_ties_by_member() {
        let mut set = OrderedSet::default();
        set.add(3, b("x"));
        set.add(1, b("y"));
        set.add(2, b("z"));
        let members: Vec<_> = set
            .range_by_rank(0, -1)
            .into_iter()
            .map(|(m, _)| m)
            .collect();
        assert_eq!(members, vec![b("y"), b("z"), b("x")]);
    }

    #[test]
    fn remove_range_by_score() {
        let mut set = OrderedSet::default();
        set.add(1, b("a"));
        set.add(2, b("b"));
        set.add(3, b("c"));
        assert_eq!(set.remove_range_by_score(2, 3), 2);
        assert_eq!(set.card(), 1);
        assert_eq!(set.score(b"a"), Some(1));
    }

    #[test]
    fn range_by_rank_clamps() {
        let mut set = OrderedSet::default();
        set.add(1, b("a"));
        set.add(2, b("b"));
        assert_eq!(set.range_by_rank(-100, 100).len(), 2);
        assert!(set.range_by_rank(5, 10).is_empty());
    }
}
