//! The unified (instruction + data) cache model and the trace driver around it.
pub mod cache;
pub(self) mod simulator;
pub(self) mod statistics;
pub mod trace;

pub use cache::{AccessResult, CacheGeometry, GeometryError, MissKind, TagMatch};
pub use simulator::{SimState, Simulator};
pub use statistics::{StatReport, Statistics};
