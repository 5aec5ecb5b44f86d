//! The static directive registry and the dispatcher that applies directives to a session.

mod command;
mod dispatch;
mod name;

pub use command::{ArgumentError, Command, SettingCommand};
pub use dispatch::{DirectiveOutcome, DirectiveOutcomes, Dispatcher};
pub use name::DirectiveName;
