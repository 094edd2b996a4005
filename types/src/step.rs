use crate::{lineage::TrackLineage, vector::ThreeVector, PRIMARY_TRACK_ID};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Why the transport engine ended a step at a given point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step reached the world boundary; the point has no volume.
    WorldBoundary,
    /// Step was limited by a geometry boundary.
    GeomBoundary,
    /// Step was defined by an at-rest process.
    AtRestDoItProc,
    /// Step was defined by a continuous process.
    AlongStepDoItProc,
    /// Step was defined by a discrete process.
    PostStepDoItProc,
    /// Step was limited by a user-defined limit.
    UserDefinedLimit,
    /// Step was defined by an exclusively forced process.
    ExclusivelyForcedProc,
    /// The track was just created and has no history.
    Undefined,
}

impl StepStatus {
    pub fn name(&self) -> &'static str {
        match self {
            StepStatus::WorldBoundary => "fWorldBoundary",
            StepStatus::GeomBoundary => "fGeomBoundary",
            StepStatus::AtRestDoItProc => "fAtRestDoItProc",
            StepStatus::AlongStepDoItProc => "fAlongStepDoItProc",
            StepStatus::PostStepDoItProc => "fPostStepDoItProc",
            StepStatus::UserDefinedLimit => "fUserDefinedLimit",
            StepStatus::ExclusivelyForcedProc => "fExclusivelyForcedProc",
            StepStatus::Undefined => "fUndefined",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fate of a track after the current step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    #[default]
    Alive,
    StopButAlive,
    StopAndKill,
    KillTrackAndSecondaries,
    Suspend,
    PostponeToNextEvent,
}

/// A placed physical volume, identified by name and copy number.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Volume {
    pub name: Arc<str>,
    #[serde(default)]
    pub copy_no: i32,
}

impl Volume {
    pub fn new(name: &str, copy_no: i32) -> Self {
        Self {
            name: Arc::from(name),
            copy_no,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.copy_no)
    }
}

/// Static particle definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Particle {
    pub name: Arc<str>,
    pub pdg: i32,
}

impl Particle {
    pub const OPTICAL_PHOTON: &'static str = "opticalphoton";
    pub const GAMMA: &'static str = "gamma";

    pub fn new(name: &str, pdg: i32) -> Self {
        Self {
            name: Arc::from(name),
            pdg,
        }
    }

    pub fn optical_photon() -> Self {
        // The transport engine encodes optical photons with PDG code -22.
        Self::new(Self::OPTICAL_PHOTON, -22)
    }

    pub fn gamma() -> Self {
        Self::new(Self::GAMMA, 22)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optical_photon(&self) -> bool {
        &*self.name == Self::OPTICAL_PHOTON
    }

    pub fn is_gamma(&self) -> bool {
        &*self.name == Self::GAMMA
    }
}

/// One end of a step.
#[derive(Clone, Copy, Debug)]
pub struct StepPoint<'a> {
    pub position: ThreeVector,
    pub global_time: f64,
    pub status: StepStatus,
    /// `None` only when the point lies outside the world.
    pub volume: Option<&'a Volume>,
}

impl StepPoint<'_> {
    /// Name of the point's volume, empty outside the world.
    pub fn volume_name(&self) -> &str {
        self.volume.map(Volume::name).unwrap_or("")
    }
}

/// The track owning a step, as seen at the step's post point.
#[derive(Clone, Copy)]
pub struct Track<'a> {
    pub id: i32,
    pub parent_id: i32,
    pub particle: &'a Particle,
    pub status: TrackStatus,
    pub momentum: ThreeVector,
    pub momentum_direction: ThreeVector,
    pub vertex_position: ThreeVector,
    pub vertex_momentum_direction: ThreeVector,
    /// Name of the process that created the track; `None` for primaries.
    pub creator_process: Option<&'a str>,
    /// Lineage information attached by the truth manager, if any.
    pub lineage: Option<&'a dyn TrackLineage>,
}

impl Track<'_> {
    pub fn is_primary(&self) -> bool {
        self.id == PRIMARY_TRACK_ID
    }
}

impl fmt::Debug for Track<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("id", &self.id)
            .field("parent_id", &self.parent_id)
            .field("particle", &self.particle.name())
            .field("status", &self.status)
            .field("momentum", &self.momentum)
            .field("creator_process", &self.creator_process)
            .field("lineage", &self.lineage.is_some())
            .finish()
    }
}

/// Read-only snapshot of one transport step.
#[derive(Clone, Copy, Debug)]
pub struct Step<'a> {
    pub pre: StepPoint<'a>,
    pub post: StepPoint<'a>,
    pub track: Track<'a>,
    /// Total energy deposited in this step (MeV).
    pub total_energy_deposit: f64,
    /// Non-ionizing part of the deposit (MeV).
    pub non_ionizing_energy_deposit: f64,
}

impl Step<'_> {
    /// Ionizing-equivalent part of the deposit (MeV).
    pub fn ionizing_energy_deposit(&self) -> f64 {
        self.total_energy_deposit - self.non_ionizing_energy_deposit
    }

    pub fn leaves_world(&self) -> bool {
        self.post.status == StepStatus::WorldBoundary
    }
}
