//! Replay of recorded events through per-worker stepping actions.
//!
//! Events are split into contiguous partitions, one per worker. Each worker owns its own
//! [`SteppingAction`] and processes its partition in order; with the `parallel` feature the
//! partitions run on a rayon pool. Every event gets a fresh hit container registered in a
//! fresh node tree.

use crate::{truth::TruthTable, TruthSummary, ValidatedConfig};
use drich_stepping::{
    hit_node_name, DetectorGeometry, HitContainer, NameClassifier, NodeTree, StepError,
    SteppingAction,
};
use drich_types::{Hit, RecordError, StepRecord};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;
use tracing::{debug, info};

/// Steps of one event, in transport order.
pub type Event = Vec<StepRecord>;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path} as JSON")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse {path} as YAML")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("event {event}, step {step}: invalid record")]
    InvalidRecord {
        event: usize,
        step: usize,
        #[source]
        source: RecordError,
    },
    #[error("event {event}, step {step}: fatal stepping error")]
    Fatal {
        event: usize,
        step: usize,
        #[source]
        source: StepError,
    },
    #[cfg(feature = "parallel")]
    #[error("failed to build worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Read events from `path`: JSON when the extension is `.json`, YAML otherwise.
pub fn load_events(path: &Path) -> Result<Vec<Event>, ReplayError> {
    let display = || path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: display(),
        source,
    })?;
    let is_json = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&contents).map_err(|source| ReplayError::Json {
            path: display(),
            source,
        })
    } else {
        serde_yaml::from_str(&contents).map_err(|source| ReplayError::Yaml {
            path: display(),
            source,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventResult {
    pub event: usize,
    pub worker: usize,
    pub steps: usize,
    pub used_steps: usize,
    pub hits: Vec<Hit>,
    pub truth: TruthSummary,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub detector: String,
    pub active: bool,
    pub workers: usize,
    pub total_steps: usize,
    pub used_steps: usize,
    pub total_hits: usize,
    pub events: Vec<EventResult>,
}

/// One transport worker: an optional stepping action and the events assigned to it.
struct Worker<'a> {
    id: usize,
    config: &'a ValidatedConfig,
    action: Option<SteppingAction<DetectorGeometry, HitContainer>>,
}

impl<'a> Worker<'a> {
    fn new(id: usize, config: &'a ValidatedConfig) -> Self {
        // An inactive detector never attaches its action to the transport loop.
        let action = config.params.active.then(|| {
            SteppingAction::with_params(&config.detector, config.geometry.clone(), config.params)
                .with_classifier(NameClassifier::new(config.tags.clone()))
        });
        Self { id, config, action }
    }

    fn run_event(&mut self, event: usize, steps: &[StepRecord]) -> Result<EventResult, ReplayError> {
        for (step, record) in steps.iter().enumerate() {
            record
                .validate()
                .map_err(|source| ReplayError::InvalidRecord {
                    event,
                    step,
                    source,
                })?;
        }

        let truth = TruthTable::from_records(steps);
        let node = hit_node_name(&self.config.detector);
        let mut tree = NodeTree::new();
        tree.insert(&node, HitContainer::new(&node));

        let mut used_steps = 0;
        if let Some(action) = self.action.as_mut() {
            action.begin_event();
            action.set_interface_pointers(&mut tree);
            for (step, record) in steps.iter().enumerate() {
                let used = action
                    .user_stepping_action(&record.step(truth.lineage(record.track_id)), false)
                    .map_err(|source| ReplayError::Fatal {
                        event,
                        step,
                        source,
                    })?;
                if used {
                    used_steps += 1;
                }
            }
        }
        let hits = self
            .action
            .as_mut()
            .and_then(|action| action.take_container())
            .map(HitContainer::into_hits)
            .unwrap_or_default();
        debug!(
            worker = self.id,
            event,
            steps = steps.len(),
            used_steps,
            hits = hits.len(),
            "event replayed"
        );

        Ok(EventResult {
            event,
            worker: self.id,
            steps: steps.len(),
            used_steps,
            hits,
            truth: truth.summary(),
        })
    }
}

fn run_partition(
    config: &ValidatedConfig,
    worker: usize,
    offset: usize,
    events: &[Event],
) -> Result<Vec<EventResult>, ReplayError> {
    let mut worker = Worker::new(worker, config);
    events
        .iter()
        .enumerate()
        .map(|(i, steps)| worker.run_event(offset + i, steps))
        .collect()
}

/// Replay `events` across `config.workers` workers, stopping at the first error.
///
/// Results are returned in event order regardless of how partitions were scheduled.
pub fn replay(config: &ValidatedConfig, events: &[Event]) -> Result<RunReport, ReplayError> {
    let workers = config.workers.clamp(1, events.len().max(1));
    let chunk = events.len().div_ceil(workers).max(1);
    let partitions: Vec<(usize, &[Event])> = events.chunks(chunk).enumerate().collect();
    let workers = partitions.len().max(1);
    info!(
        detector = %config.detector,
        active = config.params.active,
        events = events.len(),
        workers,
        "replaying events"
    );

    #[cfg(feature = "parallel")]
    let results: Vec<Vec<EventResult>> = {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()?;
        pool.install(|| {
            partitions
                .into_par_iter()
                .map(|(worker, events)| run_partition(config, worker, worker * chunk, events))
                .collect::<Result<Vec<_>, ReplayError>>()
        })?
    };
    #[cfg(not(feature = "parallel"))]
    let results: Vec<Vec<EventResult>> = partitions
        .into_iter()
        .map(|(worker, events)| run_partition(config, worker, worker * chunk, events))
        .collect::<Result<Vec<_>, ReplayError>>()?;

    let events: Vec<EventResult> = results.into_iter().flatten().collect();
    let total_steps: usize = events.iter().map(|event| event.steps).sum();
    let used_steps: usize = events.iter().map(|event| event.used_steps).sum();
    let total_hits: usize = events.iter().map(|event| event.hits.len()).sum();
    info!(total_steps, used_steps, total_hits, "replay finished");

    Ok(RunReport {
        detector: config.detector.clone(),
        active: config.params.active,
        workers,
        total_steps,
        used_steps,
        total_hits,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use drich_stepping::mocks::{
        aerogel, fixture_volumes, petal, pion, sensor, step_record, VESSEL, WORLD,
    };
    use drich_types::{HitSubtype, HitType, Particle, StepStatus};
    use std::io::Write;

    fn config(workers: usize, active: i64) -> ValidatedConfig {
        let mut config = Config {
            workers,
            volumes: fixture_volumes(),
            ..Config::default()
        };
        config.parameters.set_int("active", active);
        config.validate().unwrap()
    }

    fn entrance(track_id: i32) -> StepRecord {
        step_record(
            track_id,
            pion(),
            (WORLD, StepStatus::GeomBoundary),
            (VESSEL, StepStatus::GeomBoundary),
            -100.0,
        )
        .with_user_track_id(track_id * 10)
    }

    fn photon(track_id: i32, sector: i32) -> StepRecord {
        step_record(
            track_id,
            Particle::optical_photon(),
            (&petal(sector), StepStatus::GeomBoundary),
            (&sensor(sector), StepStatus::GeomBoundary),
            1800.0,
        )
        .with_parent(1, "Cerenkov")
    }

    fn outside(track_id: i32) -> StepRecord {
        step_record(
            track_id,
            pion(),
            (WORLD, StepStatus::AlongStepDoItProc),
            (WORLD, StepStatus::AlongStepDoItProc),
            -500.0,
        )
    }

    fn events() -> Vec<Event> {
        vec![
            vec![outside(1), entrance(1), photon(2, 0)],
            vec![entrance(1)],
            vec![photon(3, 4), photon(4, 4), outside(5)],
        ]
    }

    #[test]
    fn test_replay_collects_hits_per_event() {
        let report = replay(&config(1, 1), &events()).unwrap();
        assert!(report.active);
        assert_eq!(report.events.len(), 3);
        assert_eq!(report.total_steps, 7);
        assert_eq!(report.used_steps, 5);
        assert_eq!(report.total_hits, 5);

        let first = &report.events[0];
        assert_eq!(first.hits.len(), 2);
        assert!(first
            .hits
            .iter()
            .any(|hit| hit.hit_type == HitType::Entrance && hit.user_track_id == Some(10)));
        assert_eq!(first.truth.retained, vec![1]);
        assert_eq!(first.truth.links.len(), 1);
        assert_eq!(first.truth.links[0].user_track_id, 10);

        let third = &report.events[2];
        assert!(third
            .hits
            .iter()
            .all(|hit| hit.hit_subtype == HitSubtype::PsOptical && hit.segment == 4));
        assert!(third.truth.links.is_empty());
    }

    #[test]
    fn test_worker_count_does_not_change_results() {
        let single = replay(&config(1, 1), &events()).unwrap();
        let many = replay(&config(8, 1), &events()).unwrap();
        assert_eq!(many.workers, 3);
        assert_eq!(
            many.events.iter().map(|event| event.worker).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        for (a, b) in single.events.iter().zip(&many.events) {
            assert_eq!(a.event, b.event);
            assert_eq!(a.hits, b.hits);
        }
    }

    #[test]
    fn test_discarded_hit_does_not_leak_into_next_event() {
        let crossing = step_record(
            1,
            pion(),
            (&petal(0), StepStatus::GeomBoundary),
            (&aerogel(0), StepStatus::GeomBoundary),
            0.0,
        )
        .with_deposit(5.0, 0.0);
        let events = vec![vec![crossing], vec![entrance(1)]];

        let single = replay(&config(1, 1), &events).unwrap();
        let split = replay(&config(2, 1), &events).unwrap();
        assert_eq!(single.workers, 1);
        assert_eq!(split.workers, 2);
        assert!(single.events[0].hits.is_empty());
        assert_eq!(single.events[0].used_steps, 1);
        for (a, b) in single.events.iter().zip(&split.events) {
            assert_eq!(a.hits, b.hits);
        }

        let hits = &single.events[1].hits;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].hit_type, HitType::Entrance);
        assert_eq!(hits[0].edep, 0.0);
        assert_eq!(hits[0].eion, 0.0);
    }

    #[test]
    fn test_inactive_detector_uses_no_steps() {
        let report = replay(&config(2, 0), &events()).unwrap();
        assert!(!report.active);
        assert_eq!(report.total_steps, 7);
        assert_eq!(report.used_steps, 0);
        assert_eq!(report.total_hits, 0);
    }

    #[test]
    fn test_fatal_error_stops_replay() {
        let open = step_record(
            3,
            pion(),
            (&petal(1), StepStatus::GeomBoundary),
            (&petal(1), StepStatus::AlongStepDoItProc),
            0.0,
        );
        let foreign = step_record(
            4,
            pion(),
            (&petal(1), StepStatus::AlongStepDoItProc),
            (&petal(1), StepStatus::AlongStepDoItProc),
            10.0,
        );
        let events = vec![vec![entrance(1)], vec![open, foreign]];
        let err = replay(&config(1, 1), &events).unwrap_err();
        match err {
            ReplayError::Fatal { event, step, source } => {
                assert_eq!((event, step), (1, 1));
                assert!(matches!(source, StepError::TrackMismatch { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_record_is_rejected() {
        let bad = entrance(1).with_deposit(-1.0, 0.0);
        let err = replay(&config(1, 1), &[vec![bad]]).unwrap_err();
        assert!(matches!(
            err,
            ReplayError::InvalidRecord { event: 0, step: 0, .. }
        ));
    }

    #[test]
    fn test_empty_input() {
        let report = replay(&config(4, 1), &[]).unwrap();
        assert!(report.events.is_empty());
        assert_eq!(report.workers, 1);
    }

    #[test]
    fn test_load_events_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("events.json");
        fs::write(&json, serde_json::to_string(&events()).unwrap()).unwrap();
        assert_eq!(load_events(&json).unwrap(), events());

        let yaml = dir.path().join("events.yaml");
        let mut file = fs::File::create(&yaml).unwrap();
        file.write_all(serde_yaml::to_string(&events()).unwrap().as_bytes())
            .unwrap();
        assert_eq!(load_events(&yaml).unwrap(), events());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "[[{").unwrap();
        assert!(matches!(
            load_events(&broken),
            Err(ReplayError::Json { .. })
        ));
        assert!(matches!(
            load_events(&dir.path().join("missing.yaml")),
            Err(ReplayError::Read { .. })
        ));
    }
}
