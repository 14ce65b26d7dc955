pub mod answer;
pub mod loaders;
pub mod question;
pub mod task_type;
pub mod test_result;

pub use answer::{Answer, AnswerRecord, AnswerSet, RecordedAudio};
pub use loaders::{load_all_fixtures, load_fixture, QuestionFixture};
pub use question::{CategoryPayload, Question, RawQuestion, Stimulus, TimingPlan};
pub use task_type::{ResponseMode, Section, TaskProfile, TaskType, CATEGORY_ORDER};
pub use test_result::{QuestionAnalysis, SectionScores, SubmissionPayload, TestResult};
