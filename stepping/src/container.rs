//! Storage for completed hits.

use drich_types::{hit_key, Hit, HitKey};
use std::collections::{BTreeMap, HashMap};

/// Destination of finalized hits. Takes ownership of each hit it is given.
pub trait HitStore {
    /// Stable identifier of this store, used when linking truth records to hits.
    fn id(&self) -> u32;

    /// Store `hit` under `segment`, returning the key assigned to it.
    fn add_hit(&mut self, segment: i32, hit: Hit) -> HitKey;
}

/// Hits of one detector, ordered by key.
#[derive(Clone, Debug)]
pub struct HitContainer {
    name: String,
    id: u32,
    hits: BTreeMap<HitKey, Hit>,
    sequences: HashMap<i32, u32>,
}

impl HitContainer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: container_id(name),
            hits: BTreeMap::new(),
            sequences: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn get(&self, key: HitKey) -> Option<&Hit> {
        self.hits.get(&key)
    }

    pub fn hits(&self) -> impl Iterator<Item = (&HitKey, &Hit)> {
        self.hits.iter()
    }

    /// Hits stored under `segment`, in insertion order.
    pub fn segment_hits(&self, segment: i32) -> impl Iterator<Item = &Hit> {
        let first = hit_key(segment, 0);
        let last = hit_key(segment, u32::MAX);
        self.hits.range(first..=last).map(|(_, hit)| hit)
    }

    pub fn into_hits(self) -> Vec<Hit> {
        self.hits.into_values().collect()
    }

    /// Drop all hits, as done between events.
    pub fn clear(&mut self) {
        self.hits.clear();
        self.sequences.clear();
    }
}

impl HitStore for HitContainer {
    fn id(&self) -> u32 {
        self.id
    }

    fn add_hit(&mut self, segment: i32, mut hit: Hit) -> HitKey {
        let sequence = self.sequences.entry(segment).or_insert(0);
        let key = hit_key(segment, *sequence);
        *sequence += 1;
        hit.hit_id = Some(key);
        self.hits.insert(key, hit);
        key
    }
}

// FNV-1a: stable across runs and toolchains.
fn container_id(name: &str) -> u32 {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    name.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ byte as u32).wrapping_mul(PRIME))
}
