//! The per-step entry point called by the transport engine.

use crate::{
    accumulator::{Accumulator, Completed, Outcome, StepContext},
    classifier::{NameClassifier, StepClassifier},
    container::HitStore,
    finalizer::{finalize, Stamp},
    geometry::{Membership, VolumeClassifier},
    node_tree::{hit_node_name, NodeTree},
    params::{ParamError, ParameterSet, StepParams, Verbosity},
    StepError,
};
use drich_types::{HitKey, HitType, Step, Volume, NO_ID};
use tracing::{debug, warn};

/// Stepping action of one detector.
///
/// Each transport worker owns its own instance; nothing is shared between instances.
pub struct SteppingAction<G, S, K = NameClassifier> {
    detector: String,
    params: StepParams,
    geometry: G,
    classifier: K,
    container: Option<S>,
    accumulator: Accumulator,
}

impl<G: VolumeClassifier, S: HitStore> SteppingAction<G, S> {
    /// Build an action for `detector`, reading its settings from `params`.
    pub fn new(detector: &str, geometry: G, params: &ParameterSet) -> Result<Self, ParamError> {
        let params = StepParams::from_parameters(params)?;
        Ok(Self::with_params(detector, geometry, params))
    }

    pub fn with_params(detector: &str, geometry: G, params: StepParams) -> Self {
        Self {
            detector: detector.to_string(),
            params,
            geometry,
            classifier: NameClassifier::default(),
            container: None,
            accumulator: Accumulator::new(detector, params.verbosity),
        }
    }
}

impl<G: VolumeClassifier, S: HitStore, K: StepClassifier> SteppingAction<G, S, K> {
    /// Replace the step classifier.
    pub fn with_classifier<C: StepClassifier>(self, classifier: C) -> SteppingAction<G, S, C> {
        SteppingAction {
            detector: self.detector,
            params: self.params,
            geometry: self.geometry,
            classifier,
            container: self.container,
            accumulator: self.accumulator,
        }
    }

    pub fn detector(&self) -> &str {
        &self.detector
    }

    pub fn is_active(&self) -> bool {
        self.params.active
    }

    pub fn verbosity(&self) -> Verbosity {
        self.params.verbosity
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    pub fn container(&self) -> Option<&S> {
        self.container.as_ref()
    }

    /// Hand back the attached container, leaving the action without one.
    pub fn take_container(&mut self) -> Option<S> {
        self.container.take()
    }

    /// Resolve this detector's hit container from `tree`.
    ///
    /// The container is removed from the tree; a missing node is logged and leaves the
    /// action without a container.
    pub fn set_interface_pointers(&mut self, tree: &mut NodeTree<S>) {
        let node = hit_node_name(&self.detector);
        self.container = tree.take(&node);
        if self.container.is_none() {
            warn!(detector = %self.detector, %node, "unable to find hit container node");
        }
    }

    /// Start a new event: no hit, energy sum, or step history carries over from the last one.
    pub fn begin_event(&mut self) {
        self.accumulator.begin_event();
    }

    /// Process one step. Returns whether the step contributed to a hit.
    ///
    /// `was_used` is accepted for interface compatibility and not consulted. An error
    /// means the run must stop.
    pub fn user_stepping_action(
        &mut self,
        step: &Step<'_>,
        _was_used: bool,
    ) -> Result<bool, StepError> {
        if step.leaves_world() {
            self.accumulator.leave_world();
            return Ok(false);
        }

        let hit_type = self
            .classifier
            .classify(step.pre.volume_name(), step.post.volume_name());
        let membership = self.membership(step.pre.volume);
        if self.outside(hit_type, membership) {
            return Ok(false);
        }
        if self.verbose() {
            debug!(
                track = step.track.id,
                pre = step.pre.volume_name(),
                post = step.post.volume_name(),
                hit_type = hit_type.name(),
                "step in detector"
            );
        }

        let ctx = StepContext {
            hit_type,
            membership,
        };
        if let Outcome::Complete(completed) = self.accumulator.advance(step, ctx)? {
            self.store(step, hit_type, completed)?;
        }
        // Leaving for a volume outside the detector still counts the deposit, but the
        // step itself is not reported as used.
        Ok(!(hit_type == HitType::Ignore && self.membership(step.post.volume).is_outside()))
    }

    fn verbose(&self) -> bool {
        self.params.verbosity >= Verbosity::More
    }

    fn membership(&self, volume: Option<&Volume>) -> Membership {
        volume
            .map(|volume| self.geometry.membership(volume))
            .unwrap_or(Membership::Outside)
    }

    /// Steps that neither cross the vessel wall nor start inside the detector.
    fn outside(&self, hit_type: HitType, pre: Membership) -> bool {
        !matches!(hit_type, HitType::Entrance | HitType::Exit) && pre.is_outside()
    }

    fn store(
        &mut self,
        step: &Step<'_>,
        hit_type: HitType,
        completed: Completed,
    ) -> Result<HitKey, StepError> {
        let Some(container) = self.container.as_mut() else {
            return Err(StepError::MissingContainer {
                detector: self.detector.clone(),
                node: hit_node_name(&self.detector),
            });
        };

        let segment_volume = match hit_type {
            HitType::Entrance => step.post.volume,
            _ => step.pre.volume,
        };
        let segment = segment_volume
            .map(|volume| self.geometry.segment(volume))
            .unwrap_or(NO_ID);
        let photosensor = step
            .post
            .volume
            .map(|volume| self.geometry.photosensor_id(volume))
            .unwrap_or(NO_ID);
        let hit = finalize(
            completed.hit,
            step,
            Stamp {
                hit_type,
                segment,
                photosensor,
                edep: completed.edep,
                eion: completed.eion,
            },
        );
        if self.params.verbosity >= Verbosity::More {
            debug!(
                track = hit.track_id,
                hit_type = hit.hit_type.name(),
                subtype = hit.hit_subtype.name(),
                process = %hit.process,
                segment,
                edep = hit.edep,
                "keeping hit"
            );
        }

        let lineage = step.track.lineage;
        if let Some(lineage) = lineage {
            lineage.mark_retained();
        }
        let key = container.add_hit(segment, hit);
        if let Some(lineage) = lineage {
            lineage.link_hit(container.id(), key);
        }
        Ok(key)
    }
}
