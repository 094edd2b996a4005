//! Invariants checked on every step and the diagnostics dumped when they fail.
//!
//! A violation means the transport engine delivered a step sequence that contradicts
//! itself. Nothing downstream of such a step can be trusted, so every [`StepError`] is
//! fatal: hosts must stop the run after reporting it.

use crate::accumulator::LastObserved;
use drich_types::{Hit, Step, StepStatus};
use std::fmt;
use thiserror::Error;
use tracing::error;

/// Snapshot of the current step and the previously observed one.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub detector: String,
    pub track_id: i32,
    pub saved_track_id: Option<i32>,
    pub pre_status: StepStatus,
    pub post_status: StepStatus,
    pub last_pre_status: Option<StepStatus>,
    pub last_post_status: Option<StepStatus>,
    pub pre_volume: String,
    pub post_volume: String,
    pub last_pre_volume: Option<String>,
    pub last_post_volume: Option<String>,
}

impl Diagnostic {
    pub fn capture(detector: &str, step: &Step<'_>, last: &LastObserved) -> Self {
        Self {
            detector: detector.to_string(),
            track_id: step.track.id,
            saved_track_id: last.track_id,
            pre_status: step.pre.status,
            post_status: step.post.status,
            last_pre_status: last.pre_status,
            last_post_status: last.post_status,
            pre_volume: step.pre.volume_name().to_string(),
            post_volume: step.post.volume_name().to_string(),
            last_pre_volume: last.pre_volume.as_ref().map(|v| v.name().to_string()),
            last_post_volume: last.post_volume.as_ref().map(|v| v.name().to_string()),
        }
    }
}

fn status_or_unknown(status: Option<StepStatus>) -> &'static str {
    status.map(|status| status.name()).unwrap_or("Unknown")
}

fn volume_or_none(volume: &Option<String>) -> &str {
    volume.as_deref().unwrap_or("<none>")
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: prestep status: {}, poststep status: {}, last pre step status: {}, \
             last post step status: {}; last track: {}, current track: {}; \
             phys pre vol: {}, post vol: {}; previous phys pre vol: {}, previous phys post vol: {}",
            self.detector,
            self.pre_status,
            self.post_status,
            status_or_unknown(self.last_pre_status),
            status_or_unknown(self.last_post_status),
            self.saved_track_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "none".to_string()),
            self.track_id,
            self.pre_volume,
            self.post_volume,
            volume_or_none(&self.last_pre_volume),
            volume_or_none(&self.last_post_volume),
        )
    }
}

/// A step sequence the accumulator cannot continue from.
///
/// Every variant ends the run: the host stops feeding steps and exits.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StepError {
    #[error("hit was not created ({diagnostic})")]
    MissingHit { diagnostic: Box<Diagnostic> },
    #[error("hit entry position is not finite ({diagnostic})")]
    NonFiniteEntry { diagnostic: Box<Diagnostic> },
    #[error("hits do not belong to the same track (saved={saved}, current={current}) ({diagnostic})")]
    TrackMismatch {
        saved: i32,
        current: i32,
        diagnostic: Box<Diagnostic>,
    },
    #[error("{detector}: no hit container attached (expected node {node})")]
    MissingContainer { detector: String, node: String },
}

impl StepError {
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            StepError::MissingHit { diagnostic }
            | StepError::NonFiniteEntry { diagnostic }
            | StepError::TrackMismatch { diagnostic, .. } => Some(diagnostic),
            StepError::MissingContainer { .. } => None,
        }
    }
}

/// Check that an open hit exists for the current step and belongs to its track.
///
/// `last` must still describe the previous step; it is updated only after this passes.
pub fn check_open_hit(
    detector: &str,
    hit: Option<&Hit>,
    step: &Step<'_>,
    last: &LastObserved,
) -> Result<(), StepError> {
    let diagnostic = || Box::new(Diagnostic::capture(detector, step, last));
    let Some(hit) = hit else {
        return Err(StepError::MissingHit {
            diagnostic: diagnostic(),
        });
    };
    if !hit.has_finite_entry() {
        return Err(StepError::NonFiniteEntry {
            diagnostic: diagnostic(),
        });
    }
    match last.track_id {
        Some(saved) if saved == step.track.id => Ok(()),
        saved => Err(StepError::TrackMismatch {
            saved: saved.unwrap_or(drich_types::NO_ID),
            current: step.track.id,
            diagnostic: diagnostic(),
        }),
    }
}

/// Log a discrete-process step that follows a boundary crossing without entering the
/// vessel. Processing continues.
pub fn report_impossible_step(detector: &str, step: &Step<'_>, last: &LastObserved) {
    let diagnostic = Diagnostic::capture(detector, step, last);
    error!(%diagnostic, "impossible step");
}

#[cfg(test)]
mod tests {
    use super::*;
    use drich_types::{Particle, PointRecord, StepRecord, ThreeVector, Volume};

    fn record(track_id: i32) -> StepRecord {
        StepRecord::new(
            track_id,
            Particle::new("e-", 11),
            PointRecord::new(
                Some(Volume::new("dRICHpetal_0", 0)),
                ThreeVector::default(),
                0.0,
                StepStatus::AlongStepDoItProc,
            ),
            PointRecord::new(
                Some(Volume::new("dRICHpetal_0", 0)),
                ThreeVector::default(),
                0.1,
                StepStatus::AlongStepDoItProc,
            ),
        )
    }

    fn last(track_id: i32) -> LastObserved {
        LastObserved {
            track_id: Some(track_id),
            pre_status: Some(StepStatus::GeomBoundary),
            post_status: Some(StepStatus::AlongStepDoItProc),
            pre_volume: Some(Volume::new("dRICHvessel", 0)),
            post_volume: Some(Volume::new("dRICHpetal_0", 0)),
        }
    }

    #[test]
    fn test_open_hit_passes() {
        let record = record(5);
        let hit = Hit::open(5, ThreeVector::new(1.0, 1.0, 1.0), 0.0);
        assert_eq!(
            check_open_hit("dRICH", Some(&hit), &record.step(None), &last(5)),
            Ok(())
        );
    }

    #[test]
    fn test_missing_hit() {
        let record = record(5);
        let err = check_open_hit("dRICH", None, &record.step(None), &last(5)).unwrap_err();
        assert!(matches!(err, StepError::MissingHit { .. }));
        let text = err.to_string();
        assert!(text.contains("hit was not created"), "{text}");
        assert!(text.contains("last pre step status: fGeomBoundary"), "{text}");
        assert!(text.contains("previous phys pre vol: dRICHvessel"), "{text}");
    }

    #[test]
    fn test_non_finite_entry() {
        let record = record(5);
        let mut hit = Hit::open(5, ThreeVector::new(1.0, 1.0, 1.0), 0.0);
        hit.reset();
        let err = check_open_hit("dRICH", Some(&hit), &record.step(None), &last(5)).unwrap_err();
        assert!(matches!(err, StepError::NonFiniteEntry { .. }));
    }

    #[test]
    fn test_track_mismatch() {
        let record = record(6);
        let hit = Hit::open(5, ThreeVector::new(1.0, 1.0, 1.0), 0.0);
        let err = check_open_hit("dRICH", Some(&hit), &record.step(None), &last(5)).unwrap_err();
        match &err {
            StepError::TrackMismatch { saved, current, .. } => {
                assert_eq!((*saved, *current), (5, 6));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let diagnostic = err.diagnostic().unwrap();
        assert_eq!(diagnostic.saved_track_id, Some(5));
        assert_eq!(diagnostic.track_id, 6);
    }

    #[test]
    fn test_display_without_history() {
        let record = record(1);
        let diagnostic = Diagnostic::capture("dRICH", &record.step(None), &LastObserved::default());
        let text = diagnostic.to_string();
        assert!(text.starts_with("dRICH: "), "{text}");
        assert!(text.contains("last post step status: Unknown"), "{text}");
        assert!(text.contains("last track: none"), "{text}");
        assert!(text.contains("previous phys post vol: <none>"), "{text}");
    }
}
