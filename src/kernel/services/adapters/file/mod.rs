pub mod local;

pub use local::{is_likely_binary, should_ignore, LocalProjectProvider};
