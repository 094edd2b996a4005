//! Stamping the physical attributes of a completed hit.

use drich_types::{
    units::{CENTIMETER, GEV, NANOSECOND},
    Hit, HitSubtype, HitType, Step, Track,
};

const POST_STEP_PROCESS: &str = "postStep";
const PRIMARY_PROCESS: &str = "primary";
const EXIT_PROCESS: &str = "exitProcess";
const UNKNOWN_PROCESS: &str = "unknown";

/// Subtype of a hit of `hit_type` completed by `track`.
///
/// `pending` is the subtype recorded while the hit was open; only an entrance found on a
/// post-step point survives to here.
pub fn classify_subtype(hit_type: HitType, pending: HitSubtype, track: &Track<'_>) -> HitSubtype {
    match hit_type {
        HitType::Entrance if pending == HitSubtype::EntPostStep => HitSubtype::EntPostStep,
        HitType::Entrance if track.is_primary() => HitSubtype::EntPrimary,
        HitType::Entrance => HitSubtype::EntSecondary,
        HitType::Exit if track.is_primary() => HitSubtype::ExPrimary,
        HitType::Exit => HitSubtype::ExSecondary,
        HitType::Photosensor if track.particle.is_optical_photon() => HitSubtype::PsOptical,
        HitType::Photosensor if track.particle.is_gamma() => HitSubtype::PsGamma,
        HitType::Photosensor => HitSubtype::PsOther,
        HitType::Ignore => HitSubtype::Unknown,
    }
}

/// Process name recorded on a hit.
pub fn process_name<'a>(
    hit_type: HitType,
    subtype: HitSubtype,
    creator_process: Option<&'a str>,
) -> &'a str {
    match (hit_type, subtype) {
        (HitType::Entrance, HitSubtype::EntPostStep) => POST_STEP_PROCESS,
        (HitType::Entrance, HitSubtype::EntPrimary) => PRIMARY_PROCESS,
        (HitType::Entrance, _) => creator_process.unwrap_or(PRIMARY_PROCESS),
        (HitType::Exit, _) => EXIT_PROCESS,
        _ => creator_process.unwrap_or(UNKNOWN_PROCESS),
    }
}

/// Values computed by the caller for the hit being finalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stamp {
    pub hit_type: HitType,
    pub segment: i32,
    pub photosensor: i32,
    /// Total deposit over the hit (GeV).
    pub edep: f64,
    /// Ionizing-equivalent deposit over the hit (GeV).
    pub eion: f64,
}

/// Classify `hit` and copy the exit-point attributes of `step` onto it.
pub fn finalize(mut hit: Hit, step: &Step<'_>, stamp: Stamp) -> Hit {
    let track = &step.track;
    let subtype = classify_subtype(stamp.hit_type, hit.hit_subtype, track);

    hit.hit_type = stamp.hit_type;
    hit.hit_subtype = subtype;
    hit.segment = stamp.segment;
    hit.photosensor = stamp.photosensor;
    hit.pdg = track.particle.pdg;
    hit.particle_name = track.particle.name().to_string();
    hit.process = process_name(stamp.hit_type, subtype, track.creator_process).to_string();
    hit.parent_id = track.parent_id;

    hit.exit_position = step.post.position / CENTIMETER;
    hit.exit_time = step.post.global_time / NANOSECOND;
    hit.momentum = track.momentum / GEV;
    hit.momentum_direction = track.momentum_direction;
    hit.vertex_position = track.vertex_position / CENTIMETER;
    hit.vertex_momentum_direction = track.vertex_momentum_direction;

    hit.edep = stamp.edep;
    hit.eion = stamp.eion;
    hit
}
