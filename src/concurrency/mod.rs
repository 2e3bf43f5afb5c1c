pub mod affinity;
pub mod barrier;
pub mod gate;
