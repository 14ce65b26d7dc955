pub mod session;

pub use session::{ExamSession, SessionHandles, SessionOutcome, SessionStats};
