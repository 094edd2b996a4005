//! Step classification from the names of the volumes a step connects.

use drich_types::HitType;
use serde::{Deserialize, Serialize};

/// Maps the (pre, post) volume names of a step to a hit category.
///
/// Evaluated on every step; implementations must not cache across calls.
pub trait StepClassifier {
    fn classify(&self, pre_volume: &str, post_volume: &str) -> HitType;
}

impl<F> StepClassifier for F
where
    F: Fn(&str, &str) -> HitType,
{
    fn classify(&self, pre_volume: &str, post_volume: &str) -> HitType {
        self(pre_volume, post_volume)
    }
}

/// Substrings that tag the regions of interest in volume names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeTags {
    pub petal: String,
    pub photosensor: String,
    pub world: String,
    pub vessel: String,
}

impl Default for VolumeTags {
    fn default() -> Self {
        Self {
            petal: "dRICHpetal".to_string(),
            photosensor: "dRICHpsst".to_string(),
            world: "World".to_string(),
            vessel: "dRICHvessel".to_string(),
        }
    }
}

/// Classifies by substring match against [`VolumeTags`].
#[derive(Clone, Debug, Default)]
pub struct NameClassifier {
    tags: VolumeTags,
}

impl NameClassifier {
    pub fn new(tags: VolumeTags) -> Self {
        Self { tags }
    }

    pub fn tags(&self) -> &VolumeTags {
        &self.tags
    }
}

impl StepClassifier for NameClassifier {
    fn classify(&self, pre_volume: &str, post_volume: &str) -> HitType {
        let tags = &self.tags;
        if pre_volume.contains(&tags.petal) && post_volume.contains(&tags.photosensor) {
            HitType::Photosensor
        } else if pre_volume.contains(&tags.world) && post_volume.contains(&tags.vessel) {
            HitType::Entrance
        } else if pre_volume.contains(&tags.vessel) && post_volume.contains(&tags.world) {
            HitType::Exit
        } else {
            HitType::Ignore
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tags() {
        let classifier = NameClassifier::default();
        assert_eq!(
            classifier.classify("dRICHpetal_3", "dRICHpsst_3_117"),
            HitType::Photosensor
        );
        assert_eq!(classifier.classify("World", "dRICHvessel"), HitType::Entrance);
        assert_eq!(classifier.classify("dRICHvessel", "World"), HitType::Exit);
        assert_eq!(classifier.classify("dRICHpetal_3", "dRICHaerogel_3"), HitType::Ignore);
        assert_eq!(classifier.classify("dRICHpsst_3_117", "dRICHpetal_3"), HitType::Ignore);
        assert_eq!(classifier.classify("World", ""), HitType::Ignore);
    }

    #[test]
    fn test_custom_tags() {
        let classifier = NameClassifier::new(VolumeTags {
            petal: "sector".to_string(),
            photosensor: "sipm".to_string(),
            world: "Hall".to_string(),
            vessel: "tank".to_string(),
        });
        assert_eq!(classifier.classify("Hall", "tank_0"), HitType::Entrance);
        assert_eq!(classifier.classify("sector_1", "sipm_9"), HitType::Photosensor);
        assert_eq!(classifier.classify("World", "dRICHvessel"), HitType::Ignore);
    }

    #[test]
    fn test_closure_classifier() {
        let classifier = |pre: &str, _post: &str| {
            if pre == "x" {
                HitType::Exit
            } else {
                HitType::Ignore
            }
        };
        assert_eq!(classifier.classify("x", "y"), HitType::Exit);
        assert_eq!(classifier.classify("y", "x"), HitType::Ignore);
    }
}
