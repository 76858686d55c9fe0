//! # LRU Map (C1)
//!
//! Namespace-aware mapping of qualified keys to entries with recency
//! order; O(1) amortized touch/insert/remove/evict.
//!
//! ## Design Principles
//!
//! 1. **Index-Based Intrusive List**: nodes live in a freelist-backed
//!    arena and link to each other via `prev`/`next` indices rather than
//!    owning references, so the list can be cyclic-shaped without unsafe
//!    code (spec §9: "represent nodes as indices into a freelist-backed
//!    arena").
//! 2. **Lazy Expiration**: `get` treats a past-expiry entry as absent
//!    without touching recency; the caller is responsible for physically
//!    removing it.
//! 3. **Head = Most Recently Used**: `get`/`put` move the touched node to
//!    `head`; `tail` is always the next eviction candidate.

use std::collections::HashMap;
use std::time::Instant;

use nskv_common::QualifiedKey;

#[derive(Debug)]
struct Node {
    key: QualifiedKey,
    value: String,
    expires_at: Option<Instant>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Outcome of a `get` lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetOutcome {
    /// No entry for this key.
    Absent,
    /// An entry exists but its expiry has passed; recency was not touched.
    /// The caller must remove it (the map does not mutate on a read-only
    /// expired lookup).
    Expired,
    /// A live entry; recency was moved to head.
    Live(String),
}

/// An entry evicted to make room for a new insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evicted {
    pub key: QualifiedKey,
    pub value: String,
}

/// Namespace-aware, TTL-aware, capacity-bounded LRU map.
#[derive(Debug)]
pub struct LruMap {
    capacity: usize,
    map: HashMap<QualifiedKey, usize>,
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    /// Most-recently-used end of the recency list.
    head: Option<usize>,
    /// Least-recently-used end; the eviction candidate.
    tail: Option<usize>,
}

impl LruMap {
    /// Creates an empty map bounded to `capacity` live entries.
    ///
    /// A capacity of 0 disables caching: every `put` evicts the entry it
    /// just inserted (spec §4.1).
    pub fn new(capacity: usize) -> Self {
        LruMap {
            capacity,
            map: HashMap::new(),
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }

    /// Current number of live entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Looks up `qk` at time `now`. Promotes to head only when live.
    pub fn get(&mut self, qk: &QualifiedKey, now: Instant) -> GetOutcome {
        let idx = match self.map.get(qk) {
            Some(&idx) => idx,
            None => return GetOutcome::Absent,
        };

        let expired = self.nodes[idx].as_ref().expect("indexed node exists").is_expired(now);
        if expired {
            return GetOutcome::Expired;
        }

        self.move_to_head(idx);
        let value = self.nodes[idx].as_ref().expect("indexed node exists").value.clone();
        GetOutcome::Live(value)
    }

    /// Inserts or updates `qk`. Updating an existing key never evicts,
    /// even if the new expiry would make the entry immediately dead —
    /// TTL is only enforced on read (spec §4.1).
    pub fn put(
        &mut self,
        qk: QualifiedKey,
        value: String,
        expires_at: Option<Instant>,
    ) -> Option<Evicted> {
        if let Some(&idx) = self.map.get(&qk) {
            let node = self.nodes[idx].as_mut().expect("indexed node exists");
            node.value = value;
            node.expires_at = expires_at;
            self.move_to_head(idx);
            return None;
        }

        let evicted = if self.capacity == 0 {
            // Capacity 0: nothing may live in the map. There is nothing to
            // evict since nothing was inserted yet, so a fresh SET simply
            // never lands — reads will see it as absent.
            return None;
        } else if self.len() >= self.capacity {
            self.evict_tail()
        } else {
            None
        };

        let idx = self.alloc_node(qk.clone(), value, expires_at);
        self.map.insert(qk, idx);
        self.push_front(idx);
        evicted
    }

    /// Inserts or updates `qk` without ever evicting, regardless of
    /// capacity. Used only while replaying the WAL, where eviction must
    /// not occur until the full log has been replayed (spec §4.2) —
    /// callers must follow up with [`LruMap::trim_to_capacity`] once
    /// replay completes.
    pub fn put_no_evict(&mut self, qk: QualifiedKey, value: String, expires_at: Option<Instant>) {
        if let Some(&idx) = self.map.get(&qk) {
            let node = self.nodes[idx].as_mut().expect("indexed node exists");
            node.value = value;
            node.expires_at = expires_at;
            self.move_to_head(idx);
            return;
        }

        let idx = self.alloc_node(qk.clone(), value, expires_at);
        self.map.insert(qk, idx);
        self.push_front(idx);
    }

    /// Evicts from the tail until `len() <= capacity`. Returns the
    /// number of entries evicted. The natural recency order already
    /// reflects replay order, so trimming from the tail here evicts the
    /// same entries ordinary capacity-checked `put` calls would have
    /// evicted along the way (spec §4.2).
    pub fn trim_to_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.len() > self.capacity {
            if self.evict_tail().is_none() {
                break;
            }
            evicted += 1;
        }
        evicted
    }

    /// Removes `qk` unconditionally. Returns whether it was present.
    pub fn delete(&mut self, qk: &QualifiedKey) -> bool {
        match self.map.get(qk).copied() {
            Some(idx) => {
                self.detach(idx);
                self.map.remove(qk);
                self.nodes[idx] = None;
                self.free.push(idx);
                true
            }
            None => false,
        }
    }

    /// Every qualified key whose expiry is at or before `now`. A full
    /// scan; used only by the sweeper and the compactor, neither of
    /// which is latency-critical (spec §4.1).
    pub fn iter_expired(&self, now: Instant) -> Vec<QualifiedKey> {
        self.nodes
            .iter()
            .flatten()
            .filter(|node| node.is_expired(now))
            .map(|node| node.key.clone())
            .collect()
    }

    /// Every qualified key currently in `namespace`, live or expired.
    pub fn keys_in_namespace(&self, namespace: &str) -> Vec<QualifiedKey> {
        self.nodes
            .iter()
            .flatten()
            .filter(|node| node.key.namespace == namespace)
            .map(|node| node.key.clone())
            .collect()
    }

    /// Snapshot of every non-expired entry at `now`, with the remaining
    /// time-to-live if the entry has an expiry. Used by compaction.
    pub fn snapshot_live(&self, now: Instant) -> Vec<(QualifiedKey, String, Option<std::time::Duration>)> {
        self.nodes
            .iter()
            .flatten()
            .filter(|node| !node.is_expired(now))
            .map(|node| {
                let remaining = node.expires_at.map(|deadline| deadline.saturating_duration_since(now));
                (node.key.clone(), node.value.clone(), remaining)
            })
            .collect()
    }

    /// Removes every entry in `namespace`; returns the count removed.
    pub fn clear_namespace(&mut self, namespace: &str) -> usize {
        let victims: Vec<QualifiedKey> = self
            .nodes
            .iter()
            .flatten()
            .filter(|node| node.key.namespace == namespace)
            .map(|node| node.key.clone())
            .collect();

        for qk in &victims {
            self.delete(qk);
        }
        victims.len()
    }

    /// Number of live entries (including not-yet-swept expired ones)
    /// whose namespace equals `namespace`.
    pub fn namespace_size(&self, namespace: &str) -> usize {
        self.nodes
            .iter()
            .flatten()
            .filter(|node| node.key.namespace == namespace)
            .count()
    }

    /// Every distinct namespace with at least one live entry.
    pub fn list_namespaces(&self) -> std::collections::BTreeSet<String> {
        self.nodes
            .iter()
            .flatten()
            .map(|node| node.key.namespace.clone())
            .collect()
    }

    // -- internal list surgery -------------------------------------------------

    fn alloc_node(&mut self, key: QualifiedKey, value: String, expires_at: Option<Instant>) -> usize {
        let node = Node {
            key,
            value,
            expires_at,
            prev: None,
            next: None,
        };
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = Some(node);
            idx
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    /// Detaches `idx` from the recency list without touching the map or arena slot.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.nodes[idx].as_ref().expect("indexed node exists");
            (node.prev, node.next)
        };

        match prev {
            Some(p) => self.nodes[p].as_mut().expect("indexed node exists").next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].as_mut().expect("indexed node exists").prev = prev,
            None => self.tail = prev,
        }

        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = None;
            node.next = None;
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            self.nodes[h].as_mut().expect("indexed node exists").prev = Some(idx);
        } else {
            self.tail = Some(idx);
        }
        self.head = Some(idx);
    }

    fn move_to_head(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.detach(idx);
        self.push_front(idx);
    }

    fn evict_tail(&mut self) -> Option<Evicted> {
        let idx = self.tail?;
        self.detach(idx);
        let node = self.nodes[idx].take().expect("indexed node exists");
        self.map.remove(&node.key);
        self.free.push(idx);
        Some(Evicted {
            key: node.key,
            value: node.value,
        })
    }
}

impl Node {
    fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn qk(ns: &str, key: &str) -> QualifiedKey {
        QualifiedKey::new(ns, key)
    }

    #[test]
    fn set_get_roundtrip() {
        let mut lru = LruMap::new(10);
        lru.put(qk("", "a"), "1".into(), None);
        assert_eq!(lru.get(&qk("", "a"), Instant::now()), GetOutcome::Live("1".into()));
    }

    #[test]
    fn delete_removes_key() {
        let mut lru = LruMap::new(10);
        lru.put(qk("", "a"), "1".into(), None);
        assert!(lru.delete(&qk("", "a")));
        assert_eq!(lru.get(&qk("", "a"), Instant::now()), GetOutcome::Absent);
    }

    #[test]
    fn eviction_picks_least_recently_used() {
        let mut lru = LruMap::new(2);
        lru.put(qk("d", "a"), "1".into(), None);
        lru.put(qk("d", "b"), "2".into(), None);
        lru.get(&qk("d", "a"), Instant::now());
        let evicted = lru.put(qk("d", "c"), "3".into(), None);
        assert_eq!(
            evicted,
            Some(Evicted {
                key: qk("d", "b"),
                value: "2".into(),
            })
        );
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.get(&qk("d", "a"), Instant::now()), GetOutcome::Live("1".into()));
        assert_eq!(lru.get(&qk("d", "c"), Instant::now()), GetOutcome::Live("3".into()));
    }

    #[test]
    fn expired_read_does_not_promote() {
        let mut lru = LruMap::new(2);
        let now = Instant::now();
        lru.put(qk("d", "a"), "1".into(), Some(now - Duration::from_secs(1)));
        lru.put(qk("d", "b"), "2".into(), None);
        assert_eq!(lru.get(&qk("d", "a"), now), GetOutcome::Expired);
        // "a" was not promoted; it is still the LRU tail candidate.
        let evicted = lru.put(qk("d", "c"), "3".into(), None);
        assert_eq!(evicted.map(|e| e.key), Some(qk("d", "a")));
    }

    #[test]
    fn update_existing_key_never_evicts() {
        let mut lru = LruMap::new(1);
        lru.put(qk("d", "a"), "1".into(), None);
        let evicted = lru.put(qk("d", "a"), "2".into(), Some(Instant::now() - Duration::from_secs(1)));
        assert!(evicted.is_none());
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn capacity_zero_disables_caching() {
        let mut lru = LruMap::new(0);
        lru.put(qk("", "a"), "1".into(), None);
        assert_eq!(lru.get(&qk("", "a"), Instant::now()), GetOutcome::Absent);
        assert_eq!(lru.len(), 0);
    }

    #[test]
    fn namespace_isolation() {
        let mut lru = LruMap::new(10);
        lru.put(qk("t1", "k"), "A".into(), None);
        lru.put(qk("t2", "k"), "B".into(), None);
        assert_eq!(lru.get(&qk("t1", "k"), Instant::now()), GetOutcome::Live("A".into()));
        assert_eq!(lru.get(&qk("t2", "k"), Instant::now()), GetOutcome::Live("B".into()));
        assert_eq!(lru.namespace_size("t1"), 1);
        let namespaces = lru.list_namespaces();
        assert!(namespaces.contains("t1"));
        assert!(namespaces.contains("t2"));
    }

    #[test]
    fn clear_namespace_removes_only_matching_entries() {
        let mut lru = LruMap::new(10);
        lru.put(qk("t1", "a"), "1".into(), None);
        lru.put(qk("t1", "b"), "2".into(), None);
        lru.put(qk("t2", "a"), "3".into(), None);
        assert_eq!(lru.clear_namespace("t1"), 2);
        assert_eq!(lru.len(), 1);
        assert_eq!(lru.get(&qk("t2", "a"), Instant::now()), GetOutcome::Live("3".into()));
    }

    #[test]
    fn put_no_evict_ignores_capacity_until_trimmed() {
        let mut lru = LruMap::new(1);
        lru.put_no_evict(qk("", "a"), "1".into(), None);
        lru.put_no_evict(qk("", "b"), "2".into(), None);
        assert_eq!(lru.len(), 2);
        lru.delete(&qk("", "b"));
        assert_eq!(lru.trim_to_capacity(), 0);
        assert_eq!(lru.get(&qk("", "a"), Instant::now()), GetOutcome::Live("1".into()));
    }

    #[test]
    fn trim_to_capacity_evicts_from_tail() {
        let mut lru = LruMap::new(2);
        lru.put_no_evict(qk("", "a"), "1".into(), None);
        lru.put_no_evict(qk("", "b"), "2".into(), None);
        lru.put_no_evict(qk("", "c"), "3".into(), None);
        assert_eq!(lru.trim_to_capacity(), 1);
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.get(&qk("", "a"), Instant::now()), GetOutcome::Absent);
        assert_eq!(lru.get(&qk("", "b"), Instant::now()), GetOutcome::Live("2".into()));
        assert_eq!(lru.get(&qk("", "c"), Instant::now()), GetOutcome::Live("3".into()));
    }

    #[test]
    fn iter_expired_finds_only_past_deadlines() {
        let mut lru = LruMap::new(10);
        let now = Instant::now();
        lru.put(qk("", "a"), "1".into(), Some(now - Duration::from_secs(1)));
        lru.put(qk("", "b"), "2".into(), Some(now + Duration::from_secs(60)));
        let expired = lru.iter_expired(now);
        assert_eq!(expired, vec![qk("", "a")]);
    }
}
