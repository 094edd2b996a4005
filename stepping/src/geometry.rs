//! Volume membership service.
//!
//! The stepping action only relies on [`VolumeClassifier`]. [`DetectorGeometry`] is a
//! table-driven implementation built from a list of placed volumes.

use drich_types::{Volume, NO_ID};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Where a volume sits with respect to the detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Membership {
    Outside,
    /// Signal-bearing volume of the given segment.
    Active(i32),
    /// Support or structural material.
    Passive,
}

impl Membership {
    pub fn is_outside(&self) -> bool {
        matches!(self, Membership::Outside)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Membership::Active(_))
    }
}

pub trait VolumeClassifier {
    fn membership(&self, volume: &Volume) -> Membership;

    /// Segment (petal) of a volume, [`NO_ID`] when it has none.
    fn segment(&self, volume: &Volume) -> i32;

    /// Photosensor of a volume, [`NO_ID`] when it is not a sensor.
    fn photosensor_id(&self, volume: &Volume) -> i32;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeKind {
    Active,
    Passive,
}

/// One placed detector volume.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeEntry {
    pub name: String,
    #[serde(default)]
    pub copy_no: i32,
    pub kind: VolumeKind,
    #[serde(default)]
    pub segment: Option<i32>,
    #[serde(default)]
    pub photosensor: Option<i32>,
}

impl VolumeEntry {
    pub fn active(name: &str, segment: i32) -> Self {
        Self {
            name: name.to_string(),
            copy_no: 0,
            kind: VolumeKind::Active,
            segment: Some(segment),
            photosensor: None,
        }
    }

    pub fn passive(name: &str) -> Self {
        Self {
            name: name.to_string(),
            copy_no: 0,
            kind: VolumeKind::Passive,
            segment: None,
            photosensor: None,
        }
    }

    pub fn sensor(name: &str, segment: i32, photosensor: i32) -> Self {
        Self {
            photosensor: Some(photosensor),
            ..Self::active(name, segment)
        }
    }

    pub fn with_copy_no(mut self, copy_no: i32) -> Self {
        self.copy_no = copy_no;
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("duplicate volume {name}[{copy_no}]")]
    Duplicate { name: String, copy_no: i32 },
    #[error("photosensor {photosensor} on volume {name} has no segment")]
    SensorWithoutSegment { name: String, photosensor: i32 },
}

#[derive(Clone, Copy, Debug)]
struct Placement {
    kind: VolumeKind,
    segment: i32,
    photosensor: i32,
}

/// Lookup table from placed volume to detector membership.
#[derive(Clone, Debug, Default)]
pub struct DetectorGeometry {
    placements: HashMap<Volume, Placement>,
}

impl DetectorGeometry {
    pub fn new(entries: &[VolumeEntry]) -> Result<Self, GeometryError> {
        let mut placements = HashMap::with_capacity(entries.len());
        for entry in entries {
            if let (Some(photosensor), None) = (entry.photosensor, entry.segment) {
                return Err(GeometryError::SensorWithoutSegment {
                    name: entry.name.clone(),
                    photosensor,
                });
            }
            let placement = Placement {
                kind: entry.kind,
                segment: entry.segment.unwrap_or(NO_ID),
                photosensor: entry.photosensor.unwrap_or(NO_ID),
            };
            let volume = Volume::new(&entry.name, entry.copy_no);
            if placements.insert(volume, placement).is_some() {
                return Err(GeometryError::Duplicate {
                    name: entry.name.clone(),
                    copy_no: entry.copy_no,
                });
            }
        }
        Ok(Self { placements })
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

impl VolumeClassifier for DetectorGeometry {
    fn membership(&self, volume: &Volume) -> Membership {
        match self.placements.get(volume) {
            None => Membership::Outside,
            Some(Placement {
                kind: VolumeKind::Active,
                segment,
                ..
            }) => Membership::Active(*segment),
            Some(Placement {
                kind: VolumeKind::Passive,
                ..
            }) => Membership::Passive,
        }
    }

    fn segment(&self, volume: &Volume) -> i32 {
        self.placements
            .get(volume)
            .map(|placement| placement.segment)
            .unwrap_or(NO_ID)
    }

    fn photosensor_id(&self, volume: &Volume) -> i32 {
        self.placements
            .get(volume)
            .map(|placement| placement.photosensor)
            .unwrap_or(NO_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> DetectorGeometry {
        DetectorGeometry::new(&[
            VolumeEntry::passive("dRICHvessel"),
            VolumeEntry::active("dRICHpetal_0", 0),
            VolumeEntry::active("dRICHpetal_1", 1).with_copy_no(1),
            VolumeEntry::sensor("dRICHpsst_1", 1, 42),
        ])
        .unwrap()
    }

    #[test]
    fn test_membership() {
        let geometry = geometry();
        assert_eq!(geometry.len(), 4);
        assert_eq!(
            geometry.membership(&Volume::new("World", 0)),
            Membership::Outside
        );
        assert_eq!(
            geometry.membership(&Volume::new("dRICHvessel", 0)),
            Membership::Passive
        );
        assert_eq!(
            geometry.membership(&Volume::new("dRICHpetal_0", 0)),
            Membership::Active(0)
        );
        // Copy number is part of the identity.
        assert_eq!(
            geometry.membership(&Volume::new("dRICHpetal_1", 0)),
            Membership::Outside
        );
        assert_eq!(
            geometry.membership(&Volume::new("dRICHpetal_1", 1)),
            Membership::Active(1)
        );
    }

    #[test]
    fn test_segment_and_photosensor() {
        let geometry = geometry();
        let sensor = Volume::new("dRICHpsst_1", 0);
        assert_eq!(geometry.segment(&sensor), 1);
        assert_eq!(geometry.photosensor_id(&sensor), 42);
        let vessel = Volume::new("dRICHvessel", 0);
        assert_eq!(geometry.segment(&vessel), NO_ID);
        assert_eq!(geometry.photosensor_id(&vessel), NO_ID);
        assert_eq!(geometry.segment(&Volume::new("World", 0)), NO_ID);
    }

    #[test]
    fn test_rejects_bad_tables() {
        let duplicate = DetectorGeometry::new(&[
            VolumeEntry::passive("dRICHvessel"),
            VolumeEntry::passive("dRICHvessel"),
        ]);
        assert!(matches!(duplicate, Err(GeometryError::Duplicate { .. })));

        let mut orphan = VolumeEntry::passive("dRICHpsst_9");
        orphan.photosensor = Some(3);
        assert!(matches!(
            DetectorGeometry::new(&[orphan]),
            Err(GeometryError::SensorWithoutSegment { .. })
        ));
    }
}
