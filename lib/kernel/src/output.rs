use crate::error::KernelError;
use crate::render::RenderResult;
use std::fmt::{Display, Formatter};

/// One item shown for a cell.
#[derive(Debug)]
pub enum CellEntry {
    /// The confirmation of an applied directive.
    Message(String),
    /// The output of a read-only directive such as `%lsmagics`.
    Listing(String),
    /// The rendered result of the cell's query.
    Result(RenderResult),
    Error(KernelError),
}

impl CellEntry {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl Display for CellEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) | Self::Listing(message) => f.write_str(message),
            Self::Result(result) => result.fmt(f),
            Self::Error(error) => write!(f, "Error: {error}"),
        }
    }
}

/// Everything a cell produced, in order: directive confirmations and errors, then the query
/// result or error.
#[derive(Debug, Default)]
pub struct CellOutput {
    pub entries: Vec<CellEntry>,
}

impl CellOutput {
    /// Whether any entry is an error.
    pub fn is_error(&self) -> bool {
        self.entries.iter().any(CellEntry::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The rendered query result, if the cell ran a query successfully.
    pub fn result(&self) -> Option<&RenderResult> {
        self.entries.iter().find_map(|entry| match entry {
            CellEntry::Result(result) => Some(result),
            _ => None,
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &KernelError> {
        self.entries.iter().filter_map(|entry| match entry {
            CellEntry::Error(error) => Some(error),
            _ => None,
        })
    }
}

impl Display for CellOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}
