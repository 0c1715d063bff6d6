//! Race-plan pipeline: prompt building, the oracle call and reply parsing.

mod generator;
mod oracle;
mod parser;
mod prompt;

pub use generator::{CoachError, RacePlanGenerator};
pub use oracle::{CompletionRequest, OpenAiClient, Oracle, OracleError};
pub use parser::parse_race_plan;
pub use prompt::{build_race_context, ValidationError, SYSTEM_PROMPT};
