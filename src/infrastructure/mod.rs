pub mod capture;
pub mod playback;

pub use capture::{
    CaptureHandle, CaptureManager, InputStream, RecordingDevice, SimulatedMicMode,
    SimulatedMicrophone,
};
pub use playback::{SimulatedSpeaker, StimulusPlayer};
