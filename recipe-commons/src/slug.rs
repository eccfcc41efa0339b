//! File-name safe slugs derived from catalog entry names.

/// Turn a display name into a file stem: whitespace becomes `_`, path
/// separators and other characters that are awkward in file names become
/// `-`. An empty or all-stripped name falls back to `command`.
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|ch| match ch {
            c if c.is_whitespace() => '_',
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();

    let stem = stem.trim_matches('.');
    if stem.is_empty() {
        "command".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::file_stem;

    #[test]
    fn spaces_become_underscores() {
        assert_eq!(file_stem("Disk Space"), "Disk_Space");
    }

    #[test]
    fn separators_are_replaced() {
        assert_eq!(file_stem("a/b\\c:d"), "a-b-c-d");
    }

    #[test]
    fn empty_names_fall_back() {
        assert_eq!(file_stem("   "), "command");
        assert_eq!(file_stem(".."), "command");
    }
}
