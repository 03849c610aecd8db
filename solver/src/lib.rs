//! The MIP formulation, valid-inequality separation, and illegal-path
//! branch-and-cut callback (`spec.md` §4.I-§4.K).

pub mod cuts;
pub mod driver;
pub mod formulation;
pub mod ipd;
pub mod vi_separation;

pub use cuts::Cut;
pub use driver::{solve, DriverOutcome};
