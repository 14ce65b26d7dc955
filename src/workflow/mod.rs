pub mod question_ctx;
pub mod question_flow;

pub use question_ctx::{Phase, QuestionCtx, SessionCommand, SessionView};
pub use question_flow::{FlowOutcome, QuestionFlow};
