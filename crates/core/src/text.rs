pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Word tokens of an already normalized string: maximal runs of alphanumeric or `_`
/// characters. A non-empty string without any word character is its own single token.
pub fn tokenize(normalized: &str) -> Vec<&str> {
    let tokens: Vec<&str> = normalized
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() && !normalized.is_empty() {
        vec![normalized]
    } else {
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  Process\tPAYMENT \n now "), "process payment now");
        assert_eq!(normalize(" \t "), "");
    }

    #[test]
    fn tokenize_splits_on_punctuation() {
        assert_eq!(
            tokenize("user-login, via oauth_2.0"),
            vec!["user", "login", "via", "oauth_2", "0"]
        );
        assert_eq!(tokenize("!!!"), vec!["!!!"]);
        assert!(tokenize("").is_empty());
    }
}
