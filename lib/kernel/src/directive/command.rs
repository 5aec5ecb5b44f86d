use crate::directive::DirectiveName;
use crate::outfile::{padding_width, MAX_PADDING};
use crate::session::{
    edit_setting, split_word, AuthScheme, Credentials, DisplayShape, HttpMethod, ImageFormat,
    LogLevel, RequestFormat, Session, SettingEdit, ShowLimit,
};
use oxiri::Iri;
use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// The arguments of a directive do not match its grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ArgumentError(String);

impl ArgumentError {
    fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

/// A directive whose arguments have been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Changes the session.
    Setting(SettingCommand),
    /// Applies the directives of a file.
    Load(PathBuf),
    /// Changes the verbosity of the log output.
    Log(LogLevel),
    /// Lists all directives.
    ListDirectives,
}

/// A validated change of the [Session]. Applying it cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingCommand {
    Endpoint(Option<String>),
    Format(RequestFormat),
    Display(DisplayShape),
    Show(ShowLimit),
    Lang(Vec<String>),
    Prefix(SettingEdit),
    Graph(Option<String>),
    AddHeader(String),
    ClearHeaders,
    QParam(SettingEdit),
    HttpHeader(SettingEdit),
    Auth(Option<Credentials>),
    Outfile(Option<String>),
    Method(HttpMethod),
}

impl Command {
    /// Validates `arguments` against the grammar of `directive`.
    ///
    /// An empty argument removes the setting where that makes sense (e.g., `%graph` alone clears
    /// the default graph).
    pub fn parse(directive: DirectiveName, arguments: &str) -> Result<Self, ArgumentError> {
        let arguments = arguments.trim();
        let setting = match directive {
            DirectiveName::Endpoint => SettingCommand::Endpoint(optional_iri(arguments)?),
            DirectiveName::Format => SettingCommand::Format(if arguments.is_empty() {
                RequestFormat::Default
            } else {
                RequestFormat::from_name(arguments).ok_or_else(|| {
                    ArgumentError::new(
                        "unsupported format, expected one of JSON, XML, N3, ANY, DEFAULT, NONE",
                    )
                })?
            }),
            DirectiveName::Display => SettingCommand::Display(parse_display(arguments)?),
            DirectiveName::Show => SettingCommand::Show(parse_show(arguments)?),
            DirectiveName::Lang => SettingCommand::Lang(
                if arguments.is_empty()
                    || arguments.eq_ignore_ascii_case("all")
                    || arguments.eq_ignore_ascii_case("default")
                {
                    Vec::new()
                } else {
                    arguments.split_whitespace().map(str::to_owned).collect()
                },
            ),
            DirectiveName::Prefix => SettingCommand::Prefix(parse_prefix(arguments)?),
            DirectiveName::Graph => SettingCommand::Graph(optional_iri(arguments)?),
            DirectiveName::Header => {
                if arguments.is_empty() || arguments.eq_ignore_ascii_case("off") {
                    SettingCommand::ClearHeaders
                } else {
                    SettingCommand::AddHeader(arguments.to_owned())
                }
            }
            DirectiveName::QParam => SettingCommand::QParam(
                SettingEdit::parse(arguments)
                    .ok_or_else(|| ArgumentError::new("missing parameter name"))?,
            ),
            DirectiveName::HttpHeader => SettingCommand::HttpHeader(parse_http_header(arguments)?),
            DirectiveName::Auth => SettingCommand::Auth(parse_auth(arguments)?),
            DirectiveName::Outfile => SettingCommand::Outfile(parse_outfile(arguments)?),
            DirectiveName::Method => SettingCommand::Method(if arguments.is_empty() {
                HttpMethod::default()
            } else {
                HttpMethod::from_name(arguments)
                    .ok_or_else(|| ArgumentError::new("invalid HTTP method, expected GET or POST"))?
            }),
            DirectiveName::Load => {
                if arguments.is_empty() {
                    return Err(ArgumentError::new("missing file name"));
                }
                return Ok(Self::Load(PathBuf::from(arguments)));
            }
            DirectiveName::Log => {
                if arguments.is_empty() {
                    return Err(ArgumentError::new("missing log level"));
                }
                let level = LogLevel::from_name(arguments)
                    .ok_or_else(|| ArgumentError::new("unknown log level"))?;
                return Ok(Self::Log(level));
            }
            DirectiveName::LsMagics => return Ok(Self::ListDirectives),
        };
        Ok(Self::Setting(setting))
    }
}

impl SettingCommand {
    /// Applies the change to `session` and returns the confirmation text.
    pub fn apply(self, session: &mut Session) -> String {
        match self {
            Self::Endpoint(Some(endpoint)) => {
                let message = format!("Endpoint set to: {endpoint}");
                session.endpoint = Some(endpoint);
                message
            }
            Self::Endpoint(None) => {
                session.endpoint = None;
                "Endpoint cleared".to_owned()
            }
            Self::Format(format) => {
                session.request_format = format;
                format!("Request format: {format}")
            }
            Self::Display(display) => {
                session.display = display;
                display_confirmation(display)
            }
            Self::Show(limit) => {
                session.show_limit = limit;
                format!("Result maximum size: {limit}")
            }
            Self::Lang(languages) => {
                let message = if languages.is_empty() {
                    "Label preferred languages: all".to_owned()
                } else {
                    format!("Label preferred languages: {}", languages.join(", "))
                };
                session.language_preference = languages;
                message
            }
            Self::Prefix(edit) => edit_setting(&mut session.prefixes, &edit, "Prefix"),
            Self::Graph(Some(graph)) => {
                let message = format!("Default graph: {graph}");
                session.default_graph = Some(graph);
                message
            }
            Self::Graph(None) => {
                session.default_graph = None;
                "Default graph: None".to_owned()
            }
            Self::AddHeader(line) => {
                if session.header_lines.contains(&line) {
                    "Header skipped (repeated)".to_owned()
                } else {
                    let message = format!("Header added: {line}");
                    session.header_lines.push(line);
                    message
                }
            }
            Self::ClearHeaders => {
                let count = session.header_lines.len();
                session.header_lines.clear();
                format!("All headers deleted ({count})")
            }
            Self::QParam(edit) => edit_setting(&mut session.query_params, &edit, "Param"),
            Self::HttpHeader(edit) => edit_setting(&mut session.http_headers, &edit, "HTTP header"),
            Self::Auth(Some(credentials)) => {
                let message = format!(
                    "HTTP authentication: method={}, user={}, password set",
                    credentials.scheme, credentials.user
                );
                session.auth = Some(credentials);
                message
            }
            Self::Auth(None) => {
                session.auth = None;
                "HTTP authentication: None".to_owned()
            }
            Self::Outfile(Some(template)) => {
                let message = format!("Output file: {template}");
                session.outfile_template = Some(template);
                message
            }
            Self::Outfile(None) => {
                session.outfile_template = None;
                "No output file".to_owned()
            }
            Self::Method(method) => {
                session.method = method;
                format!("HTTP method: {method}")
            }
        }
    }
}

fn display_confirmation(display: DisplayShape) -> String {
    match display {
        DisplayShape::Raw => "Display: raw".to_owned(),
        DisplayShape::Table { with_types } => {
            if with_types {
                "Display: table\nShow types: on".to_owned()
            } else {
                "Display: table".to_owned()
            }
        }
        DisplayShape::Diagram {
            image_format,
            with_literals,
        } => {
            let mut message = format!("Display: diagram ({})", image_format.name());
            if with_literals {
                message.push_str("\nShow literals: on");
            }
            message
        }
    }
}

/// Accepts an IRI, optionally written between angle brackets. An empty argument yields [None].
fn optional_iri(text: &str) -> Result<Option<String>, ArgumentError> {
    if text.is_empty() {
        return Ok(None);
    }
    parse_iri(text).map(Some)
}

fn parse_iri(text: &str) -> Result<String, ArgumentError> {
    let iri = text
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(text);
    Iri::parse(iri.to_owned())
        .map(Iri::into_inner)
        .map_err(|e| ArgumentError::new(format!("invalid IRI: {e}")))
}

fn parse_display(arguments: &str) -> Result<DisplayShape, ArgumentError> {
    let arguments = arguments.to_ascii_lowercase();
    let mut words = arguments.split_whitespace();

    let display = match words.next() {
        None => return Ok(DisplayShape::default()),
        Some("raw") => DisplayShape::Raw,
        Some("table") => {
            let with_types = match words.next() {
                None => false,
                Some(word) if word.starts_with("withtype") => true,
                Some(word) => {
                    return Err(ArgumentError::new(format!("invalid table option: {word}")))
                }
            };
            DisplayShape::Table { with_types }
        }
        Some("diagram" | "graph") => {
            let mut next = words.next();
            let image_format = match next {
                Some("svg") => {
                    next = words.next();
                    ImageFormat::Svg
                }
                Some("png") => {
                    next = words.next();
                    ImageFormat::Png
                }
                _ => ImageFormat::Svg,
            };
            let with_literals = match next {
                None => false,
                Some(word) if word.starts_with("withlit") => true,
                Some(word) => {
                    return Err(ArgumentError::new(format!("invalid diagram option: {word}")))
                }
            };
            DisplayShape::Diagram {
                image_format,
                with_literals,
            }
        }
        Some(other) => {
            return Err(ArgumentError::new(format!(
                "unknown display shape '{other}', expected raw, table or diagram"
            )))
        }
    };

    if let Some(extra) = words.next() {
        return Err(ArgumentError::new(format!("unexpected option: {extra}")));
    }
    Ok(display)
}

fn parse_outfile(arguments: &str) -> Result<Option<String>, ArgumentError> {
    if arguments.is_empty()
        || arguments.eq_ignore_ascii_case("off")
        || arguments.eq_ignore_ascii_case("none")
    {
        return Ok(None);
    }
    if padding_width(arguments) > MAX_PADDING {
        return Err(ArgumentError::new(format!(
            "placeholder padding is wider than {MAX_PADDING} digits"
        )));
    }
    Ok(Some(arguments.to_owned()))
}

fn parse_show(arguments: &str) -> Result<ShowLimit, ArgumentError> {
    if arguments.is_empty() {
        return Ok(ShowLimit::default());
    }
    if arguments.eq_ignore_ascii_case("all") {
        return Ok(ShowLimit::Unbounded);
    }
    arguments
        .parse::<NonZeroUsize>()
        .map(ShowLimit::Limited)
        .map_err(|_| ArgumentError::new("expected a positive integer or 'all'"))
}

fn parse_prefix(arguments: &str) -> Result<SettingEdit, ArgumentError> {
    let edit =
        SettingEdit::parse(arguments).ok_or_else(|| ArgumentError::new("missing prefix name"))?;
    Ok(match edit {
        SettingEdit::Set { name, value } => SettingEdit::Set {
            name: name.trim_end_matches(':').to_owned(),
            value: parse_iri(&value)?,
        },
        SettingEdit::Remove { name } => SettingEdit::Remove {
            name: name.trim_end_matches(':').to_owned(),
        },
    })
}

fn parse_http_header(arguments: &str) -> Result<SettingEdit, ArgumentError> {
    let edit = SettingEdit::parse(arguments)
        .ok_or_else(|| ArgumentError::new("missing HTTP header name"))?;
    let is_token_char = |c: char| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c);
    if !edit.name().chars().all(is_token_char) {
        return Err(ArgumentError::new(format!(
            "invalid HTTP header name: {}",
            edit.name()
        )));
    }
    Ok(edit)
}

fn parse_auth(arguments: &str) -> Result<Option<Credentials>, ArgumentError> {
    let (scheme, rest) = split_word(arguments);
    let scheme = match scheme.to_ascii_lowercase().as_str() {
        "" | "none" => return Ok(None),
        "basic" => AuthScheme::Basic,
        "digest" => AuthScheme::Digest,
        _ => {
            return Err(ArgumentError::new(
                "unknown authentication method, expected basic, digest or none",
            ))
        }
    };
    let (user, password) = split_word(rest);
    if user.is_empty() || password.is_empty() {
        return Err(ArgumentError::new("expected <username> <passwd>"));
    }
    Ok(Some(Credentials {
        scheme,
        user: resolve_environment(user)?,
        password: resolve_environment(password)?,
    }))
}

/// Resolves `env:<VAR>` references against the process environment.
fn resolve_environment(value: &str) -> Result<String, ArgumentError> {
    match value
        .strip_prefix("env:")
        .or_else(|| value.strip_prefix("ENV:"))
    {
        Some(variable) => env::var(variable).map_err(|_| {
            ArgumentError::new(format!("cannot find environment variable: {variable}"))
        }),
        None => Ok(value.to_owned()),
    }
}

/// The argument text that may be shown back to the user. Passwords of `%auth` are hidden.
pub(crate) fn displayed_arguments(directive: DirectiveName, arguments: &str) -> String {
    if directive != DirectiveName::Auth {
        return arguments.to_owned();
    }
    let (scheme, rest) = split_word(arguments);
    let (user, password) = split_word(rest);
    match (user.is_empty(), password.is_empty()) {
        (true, _) => scheme.to_owned(),
        (false, true) => format!("{scheme} {user}"),
        (false, false) => format!("{scheme} {user} ***"),
    }
}
