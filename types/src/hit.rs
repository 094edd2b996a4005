use crate::vector::ThreeVector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of a stored hit: segment in the upper 32 bits, per-segment sequence in the lower.
pub type HitKey = u64;

/// Value of an identifier that has not been assigned.
pub const NO_ID: i32 = -1;

const KEY_BITS: u32 = 32;

pub fn hit_key(segment: i32, sequence: u32) -> HitKey {
    ((segment as u32 as u64) << KEY_BITS) | sequence as u64
}

pub fn key_segment(key: HitKey) -> i32 {
    (key >> KEY_BITS) as u32 as i32
}

/// Category of a step with respect to the detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitType {
    /// World to vessel crossing.
    Entrance,
    /// Vessel to world crossing.
    Exit,
    /// Petal to photosensor crossing.
    #[serde(rename = "psst")]
    Photosensor,
    /// Anything else.
    Ignore,
}

impl HitType {
    pub fn name(&self) -> &'static str {
        match self {
            HitType::Entrance => "entrance",
            HitType::Exit => "exit",
            HitType::Photosensor => "psst",
            HitType::Ignore => "ignore",
        }
    }
}

impl fmt::Display for HitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type-dependent refinement of [`HitType`], assigned when the hit is finalized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HitSubtype {
    /// Entrance of the primary track.
    EntPrimary,
    /// Entrance of a secondary track.
    EntSecondary,
    /// Entrance found on a step defined by a discrete process.
    EntPostStep,
    /// Exit of the primary track.
    ExPrimary,
    /// Exit of a secondary track.
    ExSecondary,
    /// Optical photon reaching a photosensor.
    PsOptical,
    /// Non-optical photon reaching a photosensor.
    PsGamma,
    /// Any other particle reaching a photosensor.
    PsOther,
    #[default]
    Unknown,
}

impl HitSubtype {
    pub fn name(&self) -> &'static str {
        match self {
            HitSubtype::EntPrimary | HitSubtype::ExPrimary => "primary",
            HitSubtype::EntSecondary | HitSubtype::ExSecondary => "secondary",
            HitSubtype::EntPostStep => "postStep",
            HitSubtype::PsOptical => "optical",
            HitSubtype::PsGamma => "gamma",
            HitSubtype::PsOther => "other",
            HitSubtype::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HitSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A particle's traversal of a region of interest, aggregated over one or more steps.
///
/// Positions are in cm, times in ns, momenta and energies in GeV.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub hit_id: Option<HitKey>,
    pub track_id: i32,
    pub user_track_id: Option<i32>,
    pub parent_id: i32,
    pub pdg: i32,
    pub particle_name: String,
    pub process: String,
    pub hit_type: HitType,
    pub hit_subtype: HitSubtype,
    pub segment: i32,
    pub photosensor: i32,
    pub entry_position: ThreeVector,
    pub exit_position: ThreeVector,
    pub entry_time: f64,
    pub exit_time: f64,
    pub momentum: ThreeVector,
    pub momentum_direction: ThreeVector,
    pub vertex_position: ThreeVector,
    pub vertex_momentum_direction: ThreeVector,
    pub edep: f64,
    pub eion: f64,
}

impl Default for Hit {
    fn default() -> Self {
        Self {
            hit_id: None,
            track_id: NO_ID,
            user_track_id: None,
            parent_id: NO_ID,
            pdg: 0,
            particle_name: String::new(),
            process: String::new(),
            hit_type: HitType::Ignore,
            hit_subtype: HitSubtype::Unknown,
            segment: NO_ID,
            photosensor: NO_ID,
            entry_position: ThreeVector::unset(),
            exit_position: ThreeVector::unset(),
            entry_time: f64::NAN,
            exit_time: f64::NAN,
            momentum: ThreeVector::unset(),
            momentum_direction: ThreeVector::unset(),
            vertex_position: ThreeVector::unset(),
            vertex_momentum_direction: ThreeVector::unset(),
            edep: f64::NAN,
            eion: f64::NAN,
        }
    }
}

impl Hit {
    /// Start a hit at the given entry point.
    pub fn open(track_id: i32, entry_position: ThreeVector, entry_time: f64) -> Self {
        Self {
            track_id,
            entry_position,
            entry_time,
            ..Self::default()
        }
    }

    /// Clear every field except the owning track ID, so the record can be reused
    /// by a later step of the same track.
    pub fn reset(&mut self) {
        let track_id = self.track_id;
        *self = Self {
            track_id,
            ..Self::default()
        };
    }

    pub fn has_finite_entry(&self) -> bool {
        self.entry_position.x.is_finite()
    }
}
