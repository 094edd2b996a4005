//! Fixtures for exercising the stepping action without a transport engine.

use crate::{
    hit_node_name, DetectorGeometry, HitContainer, NodeTree, ParameterSet, SteppingAction,
    StepParams, VolumeEntry,
};
use drich_types::{
    HitKey, Particle, PointRecord, StepRecord, StepStatus, ThreeVector, TrackLineage, Volume,
};
use std::cell::{Cell, RefCell};

pub const DETECTOR: &str = "dRICH";
pub const WORLD: &str = "World";
pub const VESSEL: &str = "dRICHvessel";
pub const SECTORS: i32 = 6;

/// Offset added to the sector number to form the photosensor ID of a sector's sensor.
pub const PHOTOSENSOR_BASE: i32 = 1000;

pub fn petal(sector: i32) -> String {
    format!("dRICHpetal_{sector}")
}

pub fn aerogel(sector: i32) -> String {
    format!("dRICHaerogel_{sector}")
}

pub fn sensor(sector: i32) -> String {
    format!("dRICHpsst_{sector}")
}

/// Vessel (passive) plus petal, aerogel, and photosensor volumes per sector.
pub fn fixture_volumes() -> Vec<VolumeEntry> {
    let mut volumes = vec![VolumeEntry::passive(VESSEL)];
    for sector in 0..SECTORS {
        volumes.push(VolumeEntry::active(&petal(sector), sector));
        volumes.push(VolumeEntry::active(&aerogel(sector), sector));
        volumes.push(VolumeEntry::sensor(
            &sensor(sector),
            sector,
            PHOTOSENSOR_BASE + sector,
        ));
    }
    volumes
}

pub fn fixture_geometry() -> DetectorGeometry {
    DetectorGeometry::new(&fixture_volumes()).expect("fixture volumes are unique")
}

pub fn active_parameters(verbosity: i64) -> ParameterSet {
    let mut params = ParameterSet::default();
    params
        .set_int(StepParams::ACTIVE, 1)
        .set_int(StepParams::VERBOSITY, verbosity);
    params
}

/// Active action over the fixture geometry with its container already attached.
pub fn fixture_action() -> SteppingAction<DetectorGeometry, HitContainer> {
    let mut action = SteppingAction::new(DETECTOR, fixture_geometry(), &active_parameters(0))
        .expect("fixture parameters are valid");
    let mut tree = NodeTree::new();
    let node = hit_node_name(DETECTOR);
    tree.insert(&node, HitContainer::new(&node));
    action.set_interface_pointers(&mut tree);
    action
}

/// Point in `volume` at `z` (mm) on the beam axis; time follows z at the speed of light.
pub fn point(volume: Option<&str>, z: f64, status: StepStatus) -> PointRecord {
    PointRecord::new(
        volume.map(|name| Volume::new(name, 0)),
        ThreeVector::new(0.0, 0.0, z),
        z / 299.792458,
        status,
    )
}

pub fn step_record(
    track_id: i32,
    particle: Particle,
    pre: (&str, StepStatus),
    post: (&str, StepStatus),
    z: f64,
) -> StepRecord {
    StepRecord::new(
        track_id,
        particle,
        point(Some(pre.0), z, pre.1),
        point(Some(post.0), z + 10.0, post.1),
    )
    .with_momentum(ThreeVector::new(0.0, 0.0, 5000.0))
}

pub fn pion() -> Particle {
    Particle::new("pi+", 211)
}

/// Lineage that records what the stepping action asked of it.
#[derive(Debug, Default)]
pub struct RecordingLineage {
    pub user_track_id: i32,
    pub retained: Cell<bool>,
    pub links: RefCell<Vec<(u32, HitKey)>>,
}

impl RecordingLineage {
    pub fn new(user_track_id: i32) -> Self {
        Self {
            user_track_id,
            ..Default::default()
        }
    }
}

impl TrackLineage for RecordingLineage {
    fn user_track_id(&self) -> i32 {
        self.user_track_id
    }

    fn mark_retained(&self) {
        self.retained.set(true);
    }

    fn link_hit(&self, container_id: u32, hit_id: HitKey) {
        self.links.borrow_mut().push((container_id, hit_id));
    }
}
