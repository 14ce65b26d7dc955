pub mod exam_client;

pub use exam_client::{ExamClient, ScoringBackend};
