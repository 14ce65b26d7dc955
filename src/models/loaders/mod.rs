pub mod toml_loader;

pub use toml_loader::{load_all_fixtures, load_fixture, QuestionFixture};
