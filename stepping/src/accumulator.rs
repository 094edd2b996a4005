//! Hit accumulator: the state machine that stitches steps into hits.
//!
//! Steps are volume-local and the transport engine recreates them on every boundary
//! crossing, so a hit is opened when a track is seen entering a region of interest,
//! extended while the track stays, and handed back to the caller when the engine
//! reports the track left the volume, stopped, or was killed.
//!
//! All state lives in [`Accumulator`]; [`Accumulator::advance`] consumes one step and
//! reports what happened to the open hit as an [`Outcome`].

use crate::{
    consistency::{check_open_hit, report_impossible_step},
    geometry::Membership,
    params::Verbosity,
    StepError,
};
use drich_types::{
    units::{CENTIMETER, GEV, NANOSECOND},
    Hit, HitSubtype, HitType, Step, StepStatus, TrackStatus, Volume,
};
use tracing::{debug, trace, warn};

/// What the accumulator remembers about the previous step.
///
/// Only used to diagnose illegal transitions; `track_id` is the track that opened the
/// current hit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LastObserved {
    pub track_id: Option<i32>,
    pub pre_status: Option<StepStatus>,
    pub post_status: Option<StepStatus>,
    pub pre_volume: Option<Volume>,
    pub post_volume: Option<Volume>,
}

impl LastObserved {
    fn observe(&mut self, step: &Step<'_>) {
        self.pre_status = Some(step.pre.status);
        self.post_status = Some(step.post.status);
        self.pre_volume = step.pre.volume.cloned();
        self.post_volume = step.post.volume.cloned();
    }
}

/// Per-step facts computed by the caller from its collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepContext {
    pub hit_type: HitType,
    /// Membership of the step's pre-volume.
    pub membership: Membership,
}

/// A hit whose last step has been seen, with the energy totals to stamp on it (GeV).
#[derive(Clone, Debug, PartialEq)]
pub struct Completed {
    pub hit: Hit,
    pub edep: f64,
    pub eion: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The hit stays open.
    Continue,
    /// The hit is complete and must be finalized and stored by the caller.
    Complete(Completed),
    /// The hit ended on an ignored step and was reset in place.
    Discarded,
}

pub struct Accumulator {
    detector: String,
    verbose: bool,
    hit: Option<Hit>,
    edep_sum: f64,
    eion_sum: f64,
    last: LastObserved,
}

impl Accumulator {
    pub fn new(detector: &str, verbosity: Verbosity) -> Self {
        Self {
            detector: detector.to_string(),
            verbose: verbosity >= Verbosity::More,
            hit: None,
            edep_sum: 0.0,
            eion_sum: 0.0,
            last: LastObserved::default(),
        }
    }

    pub fn hit(&self) -> Option<&Hit> {
        self.hit.as_ref()
    }

    /// Running (total, ionizing) deposit of the current track segment, in GeV.
    pub fn energy(&self) -> (f64, f64) {
        (self.edep_sum, self.eion_sum)
    }

    pub fn last(&self) -> &LastObserved {
        &self.last
    }

    /// The track left the world: keep the record but clear it.
    pub fn leave_world(&mut self) {
        if let Some(hit) = self.hit.as_mut() {
            hit.reset();
        }
    }

    /// Forget everything about the previous event: the open hit, both energy sums, and
    /// the last observed step. Track IDs restart with every event.
    pub fn begin_event(&mut self) {
        self.release();
        self.edep_sum = 0.0;
        self.eion_sum = 0.0;
        self.last = LastObserved::default();
    }

    fn release(&mut self) {
        if let Some(hit) = self.hit.take() {
            debug!(
                detector = %self.detector,
                track = hit.track_id,
                "releasing hit that was never stored"
            );
        }
    }

    /// Feed one step through the state machine.
    ///
    /// Errors are fatal: the accumulator must not be advanced again after one.
    pub fn advance(&mut self, step: &Step<'_>, ctx: StepContext) -> Result<Outcome, StepError> {
        // Entrance steps lie in world material; nothing they deposit belongs to the hit.
        let (edep, eion) = match ctx.hit_type {
            HitType::Entrance => (0.0, 0.0),
            _ => (
                step.total_energy_deposit / GEV,
                step.ionizing_energy_deposit() / GEV,
            ),
        };
        if self.verbose {
            trace!(edep, eion, "step deposit");
        }

        match step.pre.status {
            StepStatus::PostStepDoItProc => self.on_post_step(step, ctx),
            status => self.on_boundary(step, ctx, status),
        }

        check_open_hit(&self.detector, self.hit.as_ref(), step, &self.last)?;
        self.last.observe(step);

        self.edep_sum += edep;
        if ctx.membership.is_active() {
            self.eion_sum += eion;
        }
        if self.verbose {
            trace!(edep_sum = self.edep_sum, eion_sum = self.eion_sum, "accumulated");
        }

        let last_in_volume = matches!(
            step.post.status,
            StepStatus::GeomBoundary | StepStatus::WorldBoundary | StepStatus::AtRestDoItProc
        ) || step.track.status == TrackStatus::StopAndKill;
        if !last_in_volume {
            return Ok(Outcome::Continue);
        }
        if self.verbose {
            debug!(
                pre = step.pre.volume_name(),
                post = step.post.volume_name(),
                "last step in the volume"
            );
        }

        if ctx.hit_type == HitType::Ignore {
            if self.verbose {
                debug!(track = step.track.id, "not keeping this hit");
            }
            self.leave_world();
            return Ok(Outcome::Discarded);
        }
        match self.hit.take() {
            Some(hit) => Ok(Outcome::Complete(Completed {
                hit,
                edep: self.edep_sum,
                eion: self.eion_sum,
            })),
            None => Ok(Outcome::Continue),
        }
    }

    /// Pre-point defined by a discrete process.
    fn on_post_step(&mut self, step: &Step<'_>, ctx: StepContext) {
        let mut post_step_entrance = false;
        if self.last.post_status != Some(StepStatus::GeomBoundary) {
            if self.verbose {
                trace!("first step in a new volume");
            }
        } else if ctx.hit_type == HitType::Entrance {
            post_step_entrance = true;
        } else {
            report_impossible_step(&self.detector, step, &self.last);
        }

        if ctx.hit_type == HitType::Entrance {
            self.replace_hit(step);
            if self.verbose {
                debug!(track = step.track.id, "new hit (entrance)");
            }
            let hit = self.init_hit(step, true);
            if post_step_entrance {
                hit.hit_subtype = HitSubtype::EntPostStep;
            }
        }
    }

    /// Pre-point on a geometry boundary, newly created, or anything else.
    fn on_boundary(&mut self, step: &Step<'_>, ctx: StepContext, status: StepStatus) {
        if status != StepStatus::GeomBoundary
            && status != StepStatus::Undefined
            && ctx.hit_type != HitType::Entrance
        {
            if self.verbose {
                trace!(%status, "prepoint status ignored");
            }
            return;
        }

        let reset_accumulators = match self.hit.as_ref().map(|hit| hit.track_id) {
            Some(track_id) if track_id == step.track.id => false,
            Some(_) => {
                self.replace_hit(step);
                true
            }
            None => {
                self.hit = Some(Hit::default());
                true
            }
        };
        if self.verbose {
            debug!(
                track = step.track.id,
                particle = step.track.particle.name(),
                creator = step.track.creator_process.unwrap_or("primary"),
                %status,
                reuse = !reset_accumulators,
                "new hit"
            );
        }
        self.init_hit(step, reset_accumulators);
    }

    /// Drop whatever hit is open and start an empty one.
    fn replace_hit(&mut self, step: &Step<'_>) {
        if let Some(stale) = self.hit.replace(Hit::default()) {
            if stale.has_finite_entry() {
                warn!(
                    detector = %self.detector,
                    stale_track = stale.track_id,
                    track = step.track.id,
                    "overwriting a hit that was never stored"
                );
            }
        }
    }

    fn init_hit(&mut self, step: &Step<'_>, reset_accumulators: bool) -> &mut Hit {
        let track = &step.track;
        self.last.track_id = Some(track.id);
        if reset_accumulators {
            self.edep_sum = 0.0;
            self.eion_sum = 0.0;
        }
        let hit = self.hit.get_or_insert_with(Hit::default);
        hit.entry_position = step.pre.position / CENTIMETER;
        hit.entry_time = step.pre.global_time / NANOSECOND;
        hit.track_id = track.id;
        hit.user_track_id = track.lineage.map(|lineage| lineage.user_track_id());
        hit
    }
}

impl Drop for Accumulator {
    fn drop(&mut self) {
        self.release();
    }
}
