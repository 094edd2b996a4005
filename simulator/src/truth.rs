//! Per-event truth records attached to tracks as [`TrackLineage`].

use drich_types::{HitKey, StepRecord, TrackLineage};
use serde::{Deserialize, Serialize};
use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
};

/// Truth information the host keeps for one track.
#[derive(Debug)]
pub struct TrackInfo {
    user_track_id: i32,
    retained: Cell<bool>,
    hits: RefCell<Vec<(u32, HitKey)>>,
}

impl TrackInfo {
    pub fn new(user_track_id: i32) -> Self {
        Self {
            user_track_id,
            retained: Cell::new(false),
            hits: RefCell::new(Vec::new()),
        }
    }

    pub fn is_retained(&self) -> bool {
        self.retained.get()
    }

    pub fn hits(&self) -> Vec<(u32, HitKey)> {
        self.hits.borrow().clone()
    }
}

impl TrackLineage for TrackInfo {
    fn user_track_id(&self) -> i32 {
        self.user_track_id
    }

    fn mark_retained(&self) {
        self.retained.set(true);
    }

    fn link_hit(&self, container_id: u32, hit_id: HitKey) {
        self.hits.borrow_mut().push((container_id, hit_id));
    }
}

/// Association between a stored hit and the track that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitLink {
    pub track_id: i32,
    pub user_track_id: i32,
    pub container_id: u32,
    pub hit_id: HitKey,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthSummary {
    /// Transport IDs of the tracks marked for retention, ascending.
    pub retained: Vec<i32>,
    pub links: Vec<HitLink>,
}

/// Lineage of every truth-tracked particle in one event, keyed by transport track ID.
#[derive(Debug, Default)]
pub struct TruthTable {
    tracks: BTreeMap<i32, TrackInfo>,
}

impl TruthTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every track of `records` that carries a user track ID.
    pub fn from_records(records: &[StepRecord]) -> Self {
        let mut table = Self::new();
        for record in records {
            if let Some(user_track_id) = record.user_track_id {
                table.register(record.track_id, user_track_id);
            }
        }
        table
    }

    /// Track `track_id` under `user_track_id`. The first registration wins.
    pub fn register(&mut self, track_id: i32, user_track_id: i32) {
        self.tracks
            .entry(track_id)
            .or_insert_with(|| TrackInfo::new(user_track_id));
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, track_id: i32) -> Option<&TrackInfo> {
        self.tracks.get(&track_id)
    }

    pub fn lineage(&self, track_id: i32) -> Option<&dyn TrackLineage> {
        self.tracks
            .get(&track_id)
            .map(|info| info as &dyn TrackLineage)
    }

    pub fn summary(&self) -> TruthSummary {
        let mut summary = TruthSummary::default();
        for (&track_id, info) in &self.tracks {
            if info.is_retained() {
                summary.retained.push(track_id);
            }
            summary
                .links
                .extend(info.hits().into_iter().map(|(container_id, hit_id)| HitLink {
                    track_id,
                    user_track_id: info.user_track_id,
                    container_id,
                    hit_id,
                }));
        }
        summary
    }
}
