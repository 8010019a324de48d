pub mod engine;
pub mod keywords;
pub mod script;

use thiserror::Error;

pub use engine::{FaqAction, FaqEngine, Reply};
pub use script::{FaqOption, FaqScript, FaqState};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaqError {
    #[error("Invalid FAQ script: {0}")]
    InvalidScript(String),

    #[error("Unknown FAQ state '{0}'")]
    UnknownState(String),

    #[error("'{choice}' is not an option of '{state}'")]
    NotAnOption { state: String, choice: String },

    #[error("FAQ state '{0}' does not accept text")]
    NotAnInput(String),

    #[error("Please type a message")]
    EmptyInput,
}
