use regex::{Captures, Regex};
use std::path::PathBuf;
use std::sync::LazyLock;

/// The widest zero padding a placeholder may ask for.
pub const MAX_PADDING: usize = 32;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%(0\d+)?d").unwrap());

/// The zero padding of the first placeholder of `template`. `0` without padding or placeholder.
///
/// Widths that do not fit a `usize` are reported as [usize::MAX].
pub fn padding_width(template: &str) -> usize {
    PLACEHOLDER
        .captures(template)
        .and_then(|captures| captures.get(1))
        .map_or(0, |width| width.as_str().parse().unwrap_or(usize::MAX))
}

/// Produces the path of an `%outfile` template for a cell number.
///
/// The first `%d` (or zero-padded `%0<width>d`) placeholder is replaced by `counter`. A template
/// without a placeholder is used as is. The padding is capped at [MAX_PADDING].
pub fn expand_template(template: &str, counter: u64) -> PathBuf {
    let width = padding_width(template).min(MAX_PADDING);
    PLACEHOLDER
        .replace(template, |_: &Captures<'_>| format!("{counter:0width$}"))
        .into_owned()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_files() {
        let paths: Vec<_> = (1..=3)
            .map(|i| expand_template("/tmp/q-%d.txt", i))
            .collect();
        assert_eq!(
            paths,
            [
                PathBuf::from("/tmp/q-1.txt"),
                PathBuf::from("/tmp/q-2.txt"),
                PathBuf::from("/tmp/q-3.txt")
            ]
        );
    }

    #[test]
    fn padding_and_single_substitution() {
        assert_eq!(
            expand_template("out-%03d-%d.json", 7),
            PathBuf::from("out-007-%d.json")
        );
        assert_eq!(expand_template("fixed.json", 7), PathBuf::from("fixed.json"));
    }

    #[test]
    fn huge_padding_is_capped() {
        assert_eq!(padding_width("/tmp/q-%099999999999d.txt"), 99_999_999_999);
        assert_eq!(padding_width("/tmp/q-%0999999999999999999999d.txt"), usize::MAX);
        assert_eq!(
            expand_template("/tmp/q-%099999999999d.txt", 1),
            PathBuf::from(format!("/tmp/q-{}1.txt", "0".repeat(MAX_PADDING - 1)))
        );
    }
}
