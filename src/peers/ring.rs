//! Consistent-Hash Ring
//!
//! Maps arbitrary keys to peer names. Each peer is expanded into a number of
//! virtual nodes to smooth the distribution; positions are 32-bit hashes on
//! a circle and lookup walks clockwise to the next position at or after the
//! key's hash.

use std::collections::HashMap;

/// Hash function mapping bytes to a position on the ring.
///
/// Injectable so tests can substitute a predictable function; defaults to
/// IEEE CRC-32.
pub type RingHash = Box<dyn Fn(&[u8]) -> u32 + Send + Sync>;

pub struct HashRing {
    hash: RingHash,
    replicas: usize,
    /// Sorted virtual-node positions.
    positions: Vec<u32>,
    /// Position to peer name. 32-bit collisions overwrite, last writer
    /// wins; acceptable under a uniform hash.
    owners: HashMap<u32, String>,
}

impl HashRing {
    pub fn new(replicas: usize) -> Self {
        Self::with_hash(replicas, Box::new(|data| crc32fast::hash(data)))
    }

    pub fn with_hash(replicas: usize, hash: RingHash) -> Self {
        Self {
            hash,
            replicas,
            positions: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Adds peers to the ring. Each peer name `n` contributes one position
    /// per replica `i`, hashed from the decimal of `i` concatenated with
    /// `n`.
    pub fn add<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let position = (self.hash)(format!("{i}{peer}").as_bytes());
                self.positions.push(position);
                self.owners.insert(position, peer.to_owned());
            }
        }
        self.positions.sort_unstable();
    }

    /// Returns the peer owning `key`, or `None` for an empty ring.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.positions.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = self.positions.partition_point(|&p| p < hash) % self.positions.len();
        self.owners
            .get(&self.positions[idx])
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parses the hashed bytes as a decimal number, making placement easy
    /// to reason about.
    fn decimal_ring(replicas: usize) -> HashRing {
        HashRing::with_hash(
            replicas,
            Box::new(|data| {
                std::str::from_utf8(data)
                    .expect("test keys are utf-8")
                    .parse()
                    .expect("test keys are decimal")
            }),
        )
    }

    #[test]
    fn routes_keys_clockwise_with_wraparound() {
        let mut ring = decimal_ring(3);
        // Virtual nodes land at 2/12/22, 4/14/24 and 6/16/26.
        ring.add(["6", "4", "2"]);

        for (key, owner) in [("2", "2"), ("11", "2"), ("23", "4"), ("27", "2")] {
            assert_eq!(ring.get(key), Some(owner), "key {key}");
        }

        // 8 adds 8/18/28; only 27 changes hands.
        ring.add(["8"]);
        for (key, owner) in [("2", "2"), ("11", "2"), ("23", "4"), ("27", "8")] {
            assert_eq!(ring.get(key), Some(owner), "key {key}");
        }
    }

    #[test]
    fn empty_ring_has_no_owner() {
        let ring = HashRing::new(50);
        assert!(ring.is_empty());
        assert_eq!(ring.get("anything"), None);
    }

    #[test]
    fn every_key_maps_to_some_peer() {
        let mut ring = HashRing::new(50);
        ring.add(["http://10.0.0.1:8001", "http://10.0.0.2:8001"]);

        for i in 0..500 {
            let key = format!("key-{i}");
            assert!(ring.get(&key).is_some());
        }
    }

    #[test]
    fn adding_a_peer_only_moves_keys_to_it() {
        let mut ring = HashRing::new(50);
        ring.add(["a", "b", "c"]);

        let before: Vec<(String, String)> = (0..500)
            .map(|i| {
                let key = format!("key-{i}");
                let owner = ring.get(&key).expect("three peers cover every key");
                (key, owner.to_owned())
            })
            .collect();

        ring.add(["d"]);
        for (key, old_owner) in before {
            let new_owner = ring.get(&key).expect("ring still covers every key");
            assert!(
                new_owner == old_owner || new_owner == "d",
                "key {key} moved from {old_owner} to {new_owner}"
            );
        }
    }
}
