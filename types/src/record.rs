//! Owned step records.
//!
//! A [`StepRecord`] is what a host keeps when steps come from a file rather than a live
//! transport engine. [`StepRecord::step`] borrows the per-call [`Step`] view from it.

use crate::{
    lineage::TrackLineage,
    step::{Particle, Step, StepPoint, StepStatus, Track, TrackStatus, Volume},
    vector::ThreeVector,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordError {
    #[error("track {track_id}: pre-step point has no volume")]
    MissingPreVolume { track_id: i32 },
    #[error("track {track_id}: post-step point has no volume but status is {status}")]
    MissingPostVolume { track_id: i32, status: StepStatus },
    #[error("track {track_id}: negative energy deposit ({edep} MeV)")]
    NegativeDeposit { track_id: i32, edep: f64 },
    #[error("track {track_id}: non-ionizing deposit {non_ionizing} exceeds total {edep} MeV")]
    NonIonizingExceedsTotal {
        track_id: i32,
        edep: f64,
        non_ionizing: f64,
    },
}

/// One end of a recorded step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    #[serde(default)]
    pub volume: Option<Volume>,
    pub position: ThreeVector,
    #[serde(default)]
    pub time: f64,
    pub status: StepStatus,
}

impl PointRecord {
    pub fn new(volume: Option<Volume>, position: ThreeVector, time: f64, status: StepStatus) -> Self {
        Self {
            volume,
            position,
            time,
            status,
        }
    }

    fn view(&self) -> StepPoint<'_> {
        StepPoint {
            position: self.position,
            global_time: self.time,
            status: self.status,
            volume: self.volume.as_ref(),
        }
    }
}

/// A recorded transport step, in transport-engine units (mm, ns, MeV).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub track_id: i32,
    #[serde(default)]
    pub parent_id: i32,
    pub particle: Particle,
    #[serde(default)]
    pub track_status: TrackStatus,
    #[serde(default)]
    pub creator_process: Option<String>,
    /// Present when the truth manager tracks this particle.
    #[serde(default)]
    pub user_track_id: Option<i32>,
    #[serde(default)]
    pub momentum: ThreeVector,
    #[serde(default)]
    pub vertex_position: ThreeVector,
    #[serde(default)]
    pub vertex_momentum_direction: ThreeVector,
    pub pre: PointRecord,
    pub post: PointRecord,
    #[serde(default)]
    pub edep: f64,
    #[serde(default)]
    pub non_ionizing_edep: f64,
}

impl StepRecord {
    pub fn new(track_id: i32, particle: Particle, pre: PointRecord, post: PointRecord) -> Self {
        Self {
            track_id,
            parent_id: 0,
            particle,
            track_status: TrackStatus::Alive,
            creator_process: None,
            user_track_id: None,
            momentum: ThreeVector::default(),
            vertex_position: ThreeVector::default(),
            vertex_momentum_direction: ThreeVector::default(),
            pre,
            post,
            edep: 0.0,
            non_ionizing_edep: 0.0,
        }
    }

    pub fn with_deposit(mut self, edep: f64, non_ionizing_edep: f64) -> Self {
        self.edep = edep;
        self.non_ionizing_edep = non_ionizing_edep;
        self
    }

    pub fn with_parent(mut self, parent_id: i32, creator_process: &str) -> Self {
        self.parent_id = parent_id;
        self.creator_process = Some(creator_process.to_string());
        self
    }

    pub fn with_track_status(mut self, status: TrackStatus) -> Self {
        self.track_status = status;
        self
    }

    pub fn with_user_track_id(mut self, user_track_id: i32) -> Self {
        self.user_track_id = Some(user_track_id);
        self
    }

    pub fn with_momentum(mut self, momentum: ThreeVector) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn with_vertex(mut self, position: ThreeVector, direction: ThreeVector) -> Self {
        self.vertex_position = position;
        self.vertex_momentum_direction = direction;
        self
    }

    /// Check the record describes a step the transport engine could have produced.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.pre.volume.is_none() {
            return Err(RecordError::MissingPreVolume {
                track_id: self.track_id,
            });
        }
        if self.post.volume.is_none() && self.post.status != StepStatus::WorldBoundary {
            return Err(RecordError::MissingPostVolume {
                track_id: self.track_id,
                status: self.post.status,
            });
        }
        if self.edep < 0.0 {
            return Err(RecordError::NegativeDeposit {
                track_id: self.track_id,
                edep: self.edep,
            });
        }
        if self.non_ionizing_edep > self.edep {
            return Err(RecordError::NonIonizingExceedsTotal {
                track_id: self.track_id,
                edep: self.edep,
                non_ionizing: self.non_ionizing_edep,
            });
        }
        Ok(())
    }

    /// Borrow the per-call step view, attaching `lineage` to the track.
    pub fn step<'a>(&'a self, lineage: Option<&'a dyn TrackLineage>) -> Step<'a> {
        Step {
            pre: self.pre.view(),
            post: self.post.view(),
            track: Track {
                id: self.track_id,
                parent_id: self.parent_id,
                particle: &self.particle,
                status: self.track_status,
                momentum: self.momentum,
                momentum_direction: self.momentum.unit(),
                vertex_position: self.vertex_position,
                vertex_momentum_direction: self.vertex_momentum_direction,
                creator_process: self.creator_process.as_deref(),
                lineage,
            },
            total_energy_deposit: self.edep,
            non_ionizing_energy_deposit: self.non_ionizing_edep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(volume: Option<&str>, status: StepStatus) -> PointRecord {
        PointRecord::new(
            volume.map(|name| Volume::new(name, 0)),
            ThreeVector::new(0.0, 0.0, 1000.0),
            1.0,
            status,
        )
    }

    #[test]
    fn test_validate() {
        let ok = StepRecord::new(
            1,
            Particle::new("pi+", 211),
            point(Some("World"), StepStatus::Undefined),
            point(None, StepStatus::WorldBoundary),
        );
        assert_eq!(ok.validate(), Ok(()));

        let missing_post = StepRecord::new(
            1,
            Particle::new("pi+", 211),
            point(Some("World"), StepStatus::Undefined),
            point(None, StepStatus::GeomBoundary),
        );
        assert!(matches!(
            missing_post.validate(),
            Err(RecordError::MissingPostVolume { .. })
        ));

        let bad_split = ok.clone().with_deposit(1.0, 2.0);
        assert!(matches!(
            bad_split.validate(),
            Err(RecordError::NonIonizingExceedsTotal { .. })
        ));
        let negative = ok.with_deposit(-1.0, 0.0);
        assert!(matches!(
            negative.validate(),
            Err(RecordError::NegativeDeposit { .. })
        ));
    }

    #[test]
    fn test_step_view() {
        let record = StepRecord::new(
            3,
            Particle::optical_photon(),
            point(Some("dRICHpetal_0"), StepStatus::GeomBoundary),
            point(Some("dRICHpsst_0"), StepStatus::GeomBoundary),
        )
        .with_parent(2, "Cerenkov")
        .with_momentum(ThreeVector::new(0.0, 0.0, 2.0e-6))
        .with_deposit(3.0, 1.0);

        let step = record.step(None);
        assert_eq!(step.track.id, 3);
        assert_eq!(step.track.creator_process, Some("Cerenkov"));
        assert_eq!(step.track.momentum_direction, ThreeVector::new(0.0, 0.0, 1.0));
        assert_eq!(step.pre.volume_name(), "dRICHpetal_0");
        assert_eq!(step.ionizing_energy_deposit(), 2.0);
        assert!(step.track.lineage.is_none());
    }

    #[test]
    fn test_deserialize_yaml() {
        let yaml = r#"
track_id: 1
particle: { name: "e-", pdg: 11 }
pre: { volume: { name: World }, position: { x: 0, y: 0, z: 0 }, status: undefined }
post: { volume: { name: dRICHvessel }, position: { x: 0, y: 0, z: 10 }, time: 0.1, status: geom_boundary }
"#;
        let record: StepRecord = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(record.track_status, TrackStatus::Alive);
        assert_eq!(record.post.status, StepStatus::GeomBoundary);
        assert_eq!(record.edep, 0.0);
        assert_eq!(record.validate(), Ok(()));
    }
}
