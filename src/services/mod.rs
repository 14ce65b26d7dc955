pub mod phase_timer;
pub mod sequencer;

pub use phase_timer::PhaseTimer;
pub use sequencer::build_sequence;
