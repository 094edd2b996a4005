//! dRICH stepping action.
//!
//! This crate turns the per-step callbacks of a particle-transport engine into hit records
//! for the dual-radiator RICH: one hit per traversal of a region of interest (vessel
//! entrance, vessel exit, photosensor).
//!
//! ## Per-step pipeline
//! 1. [`StepClassifier`] maps the (pre, post) volume names to a [`drich_types::HitType`].
//! 2. [`VolumeClassifier`] filters out steps that never touch the detector.
//! 3. [`Accumulator`] opens, extends, or closes the in-progress hit.
//! 4. [`finalizer`] stamps the completed hit, which is then handed to a [`HitStore`].
//!
//! Invariant violations surface as [`StepError`]. They are always fatal: the host must
//! report the diagnostic and stop the run.
//!
//! The primary entrypoint is [`SteppingAction`].
//!
//! ## Minimal host loop (example)
//! ```rust,ignore
//! use drich_stepping::{
//!     hit_node_name, DetectorGeometry, HitContainer, NodeTree, ParameterSet, SteppingAction,
//! };
//!
//! let mut params = ParameterSet::default();
//! params.set_int("active", 1);
//! let geometry = DetectorGeometry::new(&volumes)?;
//! let mut action = SteppingAction::new("dRICH", geometry, &params)?;
//!
//! let mut tree = NodeTree::new();
//! tree.insert(&hit_node_name("dRICH"), HitContainer::new(&hit_node_name("dRICH")));
//! action.set_interface_pointers(&mut tree);
//! for record in &steps {
//!     action.user_stepping_action(&record.step(None), false)?;
//! }
//! let hits = action.take_container();
//! ```

pub mod accumulator;
pub mod action;
pub mod classifier;
pub mod consistency;
pub mod container;
pub mod finalizer;
pub mod geometry;
pub mod node_tree;
pub mod params;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


pub use accumulator::{Accumulator, LastObserved, Outcome, StepContext};
pub use action::SteppingAction;
pub use classifier::{NameClassifier, StepClassifier, VolumeTags};
pub use consistency::{Diagnostic, StepError};
pub use container::{HitContainer, HitStore};
pub use geometry::{
    DetectorGeometry, GeometryError, Membership, VolumeClassifier, VolumeEntry, VolumeKind,
};
pub use node_tree::{hit_node_name, NodeTree};
pub use params::{ParamError, ParameterSet, StepParams, Verbosity};
