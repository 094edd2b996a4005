use crate::hit::HitKey;

/// Truth-record capability optionally attached to a track.
///
/// The transport engine passes shared references, so implementations that record
/// state use interior mutability.
pub trait TrackLineage {
    /// Track ID assigned by the truth manager (may differ from the transport ID).
    fn user_track_id(&self) -> i32;

    /// Ask the truth manager to keep this track in the output record.
    fn mark_retained(&self);

    /// Associate a stored hit with the track's shower.
    fn link_hit(&self, container_id: u32, hit_id: HitKey);
}
