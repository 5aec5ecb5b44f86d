use std::collections::BTreeMap;

/// A keyed collection of settings that is edited by `%<directive> <name> [<value>]` lines.
///
/// `%prefix`, `%qparam` and `%http_header` all share the same convention: a name with a value
/// sets the entry and a name alone removes it. The directives only differ in the map they edit,
/// so the edit is applied through this trait (see [edit_setting]).
pub trait SettingMap {
    /// Sets `name` to `value`, replacing an existing entry.
    fn set(&mut self, name: &str, value: &str);

    /// Removes `name`. Returns whether an entry was present.
    fn remove(&mut self, name: &str) -> bool;
}

impl SettingMap for BTreeMap<String, String> {
    fn set(&mut self, name: &str, value: &str) {
        self.insert(name.to_owned(), value.to_owned());
    }

    fn remove(&mut self, name: &str) -> bool {
        BTreeMap::remove(self, name).is_some()
    }
}

/// A single edit of a [SettingMap].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingEdit {
    /// Sets an entry.
    Set { name: String, value: String },
    /// Removes an entry.
    Remove { name: String },
}

impl SettingEdit {
    /// Parses `<name> [<value>]`. The value is the remainder of the line after the name.
    ///
    /// Returns [None] if no name is given.
    pub fn parse(arguments: &str) -> Option<Self> {
        let (name, value) = split_word(arguments);
        if name.is_empty() {
            return None;
        }

        Some(if value.is_empty() {
            Self::Remove {
                name: name.to_owned(),
            }
        } else {
            Self::Set {
                name: name.to_owned(),
                value: value.to_owned(),
            }
        })
    }

    /// The name of the edited entry.
    pub fn name(&self) -> &str {
        match self {
            Self::Set { name, .. } | Self::Remove { name } => name,
        }
    }
}

/// Applies `edit` to `map` and returns the confirmation text. `label` names the kind of entry
/// (e.g., "Param") in the confirmation.
pub fn edit_setting<M: SettingMap + ?Sized>(
    map: &mut M,
    edit: &SettingEdit,
    label: &str,
) -> String {
    match edit {
        SettingEdit::Set { name, value } => {
            map.set(name, value);
            format!("{label} set: {name} = {value}")
        }
        SettingEdit::Remove { name } => {
            if map.remove(name) {
                format!("{label} deleted: {name}")
            } else {
                format!("{label} not defined: {name}")
            }
        }
    }
}

/// HTTP headers whose names compare case-insensitively.
///
/// Setting a header that is already present (in any casing) replaces it. Insertion order is kept
/// so that requests are assembled deterministically.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    entries: Vec<(String, String)>,
}

impl HttpHeaders {
    /// Creates an empty set of headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of `name`, ignoring the casing of the name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].1.as_str())
    }

    /// Iterates over the headers as `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl SettingMap for HttpHeaders {
    fn set(&mut self, name: &str, value: &str) {
        match self.position(name) {
            Some(i) => self.entries[i] = (name.to_owned(), value.to_owned()),
            None => self.entries.push((name.to_owned(), value.to_owned())),
        }
    }

    fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }
}

/// Splits `text` into its first whitespace-delimited word and the trimmed remainder.
pub(crate) fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], text[i..].trim_start()),
        None => (text, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_edit() {
        assert_eq!(SettingEdit::parse("  "), None);
        assert_eq!(
            SettingEdit::parse("x"),
            Some(SettingEdit::Remove {
                name: "x".to_owned()
            })
        );
        assert_eq!(
            SettingEdit::parse("x  a value "),
            Some(SettingEdit::Set {
                name: "x".to_owned(),
                value: "a value".to_owned()
            })
        );
    }

    #[test]
    fn set_then_remove_leaves_no_entry() {
        let mut params = BTreeMap::new();
        for line in ["x", "x v", "x"] {
            let edit = SettingEdit::parse(line).unwrap();
            edit_setting(&mut params, &edit, "Param");
        }
        assert!(params.is_empty());
    }

    #[test]
    fn headers_are_case_insensitive() {
        let mut headers = HttpHeaders::new();
        headers.set("Accept", "text/plain");
        headers.set("accept", "text/turtle");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("ACCEPT"), Some("text/turtle"));
        assert!(SettingMap::remove(&mut headers, "AcCePt"));
        assert!(headers.is_empty());
    }

    #[test]
    fn remove_reports_missing_entry() {
        let mut headers = HttpHeaders::new();
        let message = edit_setting(
            &mut headers,
            &SettingEdit::Remove {
                name: "X-Foo".to_owned(),
            },
            "HTTP header",
        );
        assert_eq!(message, "HTTP header not defined: X-Foo");
    }
}
