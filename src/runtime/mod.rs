/// Runtime orchestrator module - Gateway

mod non_interactive;
mod orchestrator;
mod repl;

pub use non_interactive::{NonInteractiveResult, NonInteractiveRunner};
pub use orchestrator::Orchestrator;
pub use repl::{parse_input, render_message, ReplInput};
