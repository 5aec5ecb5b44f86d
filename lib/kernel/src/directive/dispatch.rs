use crate::cell::{is_comment, DirectiveInvocation};
use crate::collaborator::{FileStore, LogControl};
use crate::directive::command::displayed_arguments;
use crate::directive::{Command, DirectiveName};
use crate::error::DirectiveError;
use crate::help::directive_listing;
use crate::session::Session;
use std::path::Path;
use tracing::{debug, info};

/// The successful result of a single directive line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectiveOutcome {
    /// The session was changed. Holds the confirmation text.
    Applied(String),
    /// A read-only directive produced a listing. Cells with a listing do not run their query.
    Listing(String),
}

/// The outcome of every directive line of a cell, in order. Files pulled in with `%load`
/// contribute one entry per line.
pub type DirectiveOutcomes = Vec<Result<DirectiveOutcome, DirectiveError>>;

/// Applies directive invocations to a [Session].
///
/// Each line is applied on its own: an unknown name or an invalid argument is reported for that
/// line and the next line is attempted anyway. Lines that succeeded are never rolled back.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    files: &'a dyn FileStore,
    log_control: Option<&'a dyn LogControl>,
}

impl<'a> Dispatcher<'a> {
    /// How deep `%load` files may include each other.
    pub const MAX_LOAD_DEPTH: usize = 10;

    pub fn new(files: &'a dyn FileStore, log_control: Option<&'a dyn LogControl>) -> Self {
        Self { files, log_control }
    }

    pub fn dispatch(
        &self,
        session: &mut Session,
        invocations: &[DirectiveInvocation],
    ) -> DirectiveOutcomes {
        let mut outcomes = Vec::with_capacity(invocations.len());
        for invocation in invocations {
            self.dispatch_one(session, invocation, 0, &mut outcomes);
        }
        outcomes
    }

    fn dispatch_one(
        &self,
        session: &mut Session,
        invocation: &DirectiveInvocation,
        depth: usize,
        outcomes: &mut DirectiveOutcomes,
    ) {
        let Some(directive) = DirectiveName::from_name(&invocation.name) else {
            outcomes.push(Err(DirectiveError::UnknownDirective {
                name: invocation.name.clone(),
                line: invocation.line,
            }));
            return;
        };

        let command = match Command::parse(directive, &invocation.arguments) {
            Ok(command) => command,
            Err(error) => {
                outcomes.push(Err(DirectiveError::InvalidArgument {
                    directive,
                    argument: displayed_arguments(directive, &invocation.arguments),
                    reason: error.reason().to_owned(),
                    line: invocation.line,
                }));
                return;
            }
        };

        match command {
            Command::Setting(setting) => {
                let message = setting.apply(session);
                info!("{directive}: {}", message.replace('\n', ", "));
                outcomes.push(Ok(DirectiveOutcome::Applied(message)));
            }
            Command::Load(path) => self.load(session, &path, depth + 1, outcomes),
            Command::Log(level) => {
                session.log_level = Some(level);
                let outcome = match self.log_control {
                    Some(control) => control
                        .set_level(level)
                        .map(|()| DirectiveOutcome::Applied(format!("Logging set to {level}")))
                        .map_err(DirectiveError::from),
                    None => Ok(DirectiveOutcome::Applied(format!(
                        "Logging set to {level} (no log control attached)"
                    ))),
                };
                outcomes.push(outcome);
            }
            Command::ListDirectives => {
                outcomes.push(Ok(DirectiveOutcome::Listing(directive_listing())));
            }
        }
    }

    fn load(
        &self,
        session: &mut Session,
        path: &Path,
        depth: usize,
        outcomes: &mut DirectiveOutcomes,
    ) {
        if depth > Self::MAX_LOAD_DEPTH {
            outcomes.push(Err(DirectiveError::RecursionLimit(Self::MAX_LOAD_DEPTH)));
            return;
        }

        let text = match self.files.read_to_string(path) {
            Ok(text) => text,
            Err(source) => {
                outcomes.push(Err(DirectiveError::LoadFailed {
                    path: path.to_path_buf(),
                    source,
                }));
                return;
            }
        };
        debug!("Loading directives from {} (depth {depth})", path.display());
        outcomes.push(Ok(DirectiveOutcome::Applied(format!(
            "Loading directives from: {}",
            path.display()
        ))));

        for (index, line) in text.lines().enumerate() {
            if is_comment(line) {
                continue;
            }
            if !line.trim_start().starts_with('%') {
                outcomes.push(Err(DirectiveError::InvalidArgument {
                    directive: DirectiveName::Load,
                    argument: path.display().to_string(),
                    reason: format!("not a directive line: {}", line.trim()),
                    line: index + 1,
                }));
                continue;
            }
            let invocation = DirectiveInvocation::parse(line, index + 1);
            self.dispatch_one(session, &invocation, depth, outcomes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::classify;
    use crate::collaborator::LocalFileStore;
    use crate::session::RequestFormat;

    fn dispatch(session: &mut Session, text: &str) -> DirectiveOutcomes {
        let files = LocalFileStore;
        Dispatcher::new(&files, None).dispatch(session, &classify(text).directives)
    }

    #[test]
    fn failures_are_isolated_per_line() {
        let mut session = Session::new();
        let outcomes = dispatch(
            &mut session,
            "%format xml\n%bogus 1\n%show zero\n%graph http://example.com/g",
        );
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].is_ok());
        assert!(matches!(
            outcomes[1],
            Err(DirectiveError::UnknownDirective { line: 2, .. })
        ));
        assert!(matches!(
            outcomes[2],
            Err(DirectiveError::InvalidArgument {
                directive: DirectiveName::Show,
                line: 3,
                ..
            })
        ));
        assert!(outcomes[3].is_ok());
        assert_eq!(session.request_format(), RequestFormat::Xml);
        assert_eq!(session.default_graph(), Some("http://example.com/g"));
    }

    #[test]
    fn names_are_case_insensitive() {
        let mut session = Session::new();
        let outcomes = dispatch(&mut session, "%ENDPOINT http://example.com/sparql");
        assert_eq!(
            outcomes[0].as_ref().ok(),
            Some(&DirectiveOutcome::Applied(
                "Endpoint set to: http://example.com/sparql".to_owned()
            ))
        );
    }

    #[test]
    fn doubled_percent_is_unknown() {
        let mut session = Session::new();
        let outcomes = dispatch(&mut session, "%%endpoint http://example.com/sparql");
        assert!(matches!(
            &outcomes[0],
            Err(DirectiveError::UnknownDirective { name, line: 1 }) if name == "%endpoint"
        ));
        assert_eq!(session.endpoint(), None);
    }

    #[test]
    fn invalid_auth_does_not_leak_password() {
        let mut session = Session::new();
        let outcomes = dispatch(&mut session, "%auth ntlm bob hunter2");
        let error = outcomes[0].as_ref().unwrap_err().to_string();
        assert!(!error.contains("hunter2"), "{error}");
        assert!(session.auth().is_none());
    }

    #[test]
    fn log_without_control_is_recorded() {
        let mut session = Session::new();
        let outcomes = dispatch(&mut session, "%log debug");
        assert!(outcomes[0].is_ok());
        assert_eq!(session.log_level(), Some(crate::session::LogLevel::Debug));
    }

    #[test]
    fn listing_does_not_touch_session() {
        let mut session = Session::new();
        let outcomes = dispatch(&mut session, "%lsmagics");
        assert!(matches!(
            &outcomes[0],
            Ok(DirectiveOutcome::Listing(listing)) if listing.contains("%endpoint <url>")
        ));
        assert_eq!(session.endpoint(), None);
    }
}
