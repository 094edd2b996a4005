//! Data model shared by the dRICH stepping action and the hosts that drive it.
//!
//! The transport engine hands the stepping action a borrowed [`Step`] view on every call.
//! Hosts that replay recorded streams (and tests) hold owned [`StepRecord`]s and borrow a
//! [`Step`] out of them. Completed traversals are stored as [`Hit`] records.

pub mod hit;
pub mod lineage;
pub mod record;
pub mod step;
pub mod units;
pub mod vector;

pub use hit::{hit_key, key_segment, Hit, HitKey, HitSubtype, HitType, NO_ID};
pub use lineage::TrackLineage;
pub use record::{PointRecord, RecordError, StepRecord};
pub use step::{Particle, Step, StepPoint, StepStatus, Track, TrackStatus, Volume};
pub use vector::ThreeVector;

/// Track ID the transport engine assigns to the first thrown particle.
pub const PRIMARY_TRACK_ID: i32 = 1;
