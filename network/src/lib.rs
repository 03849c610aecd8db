pub mod node;
pub mod pairing;
pub mod pipeline;
pub mod pred_succ;
pub mod sequence;
pub mod subsample;
pub mod timed_arc;
pub mod untimed_arc;

pub use node::{NodeIx, NodeKey, Nodes};
pub use pairing::SequencePair;
pub use pipeline::{build_network, Network};
pub use pred_succ::PredSuccIndex;
pub use sequence::Sequence;
pub use timed_arc::TimedArc;
pub use untimed_arc::UntimedArc;

/// Index into a flat `Vec<UntimedArc>` (`spec.md` §9: "flat records ... avoid
/// object graphs with back-pointers").
pub type UntimedArcIx = usize;
/// Index into a flat `Vec<TimedArc>`.
pub type TimedArcIx = usize;
