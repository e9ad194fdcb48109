use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i-u)^(https?://)?",                            // scheme, ASCII only
        r"((([a-z\d]([a-z\d-]*[a-z\d])*)\.)+[a-z]{2,}|",   // domain
        r"((\d{1,3}\.){3}\d{1,3}))",                       // or IPv4
        r"(:\d+)?(/[-a-z\d%_.~+]*)*",                      // port and path
        r"(\?[;&a-z\d%_.~+=-]*)?",                         // query
        r"(#[-a-z\d_]*)?$",                                // fragment
    ))
    .expect("URL pattern is valid")
});

pub fn is_valid_url(candidate: &str) -> bool {
    URL_PATTERN.is_match(candidate)
}

/// Split newline-separated input into trimmed, non-empty URLs and check
/// every one. Duplicates are kept as entered.
pub fn parse_url_list(input: &str) -> Result<Vec<String>, ValidationError> {
    let urls: Vec<String> = input
        .lines()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(String::from)
        .collect();

    if urls.is_empty() {
        return Err(ValidationError::Empty);
    }

    let rejected: Vec<String> = urls.iter().filter(|u| !is_valid_url(u)).cloned().collect();
    if !rejected.is_empty() {
        tracing::debug!(?rejected, "URL list failed validation");
        return Err(ValidationError::Invalid { rejected });
    }

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_forms() {
        for url in [
            "https://example.com",
            "http://example.com:8080/path/to/page.html",
            "example.org",
            "EXAMPLE.COM/About",
            "https://sub.domain-name.co.uk/a?x=1&y=2#top",
            "192.168.0.1:3000/status",
        ] {
            assert!(is_valid_url(url), "{url} should be valid");
        }
    }

    #[test]
    fn rejects_garbage() {
        for url in ["not a url", "https://", "localhost", "ftp://example.com", "https://exa mple.com"] {
            assert!(!is_valid_url(url), "{url} should be invalid");
        }
    }

    #[test]
    fn rejects_non_ascii_lookalikes() {
        for url in [
            "https://\u{212A}elvin.com",
            "https://exam\u{17F}ple.com",
            "192.168.0.\u{0661}",
            "https://example.com:\u{0668}080",
        ] {
            assert!(!is_valid_url(url), "{url} should be invalid");
        }
    }

    #[test]
    fn trims_and_drops_blank_lines() {
        let urls = parse_url_list("  https://a.com \n\n\r\nhttps://b.com\n").unwrap();
        assert_eq!(urls, ["https://a.com", "https://b.com"]);
    }

    #[test]
    fn keeps_duplicates() {
        let urls = parse_url_list("https://a.com\nhttps://a.com").unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(parse_url_list(" \n \n"), Err(ValidationError::Empty));
        assert_eq!(
            ValidationError::Empty.to_string(),
            "Please enter a valid URL (e.g. https://example.com)"
        );
    }

    #[test]
    fn one_bad_entry_rejects_the_list() {
        let err = parse_url_list("https://good.com\nnot a url").unwrap_err();
        assert_eq!(
            err,
            ValidationError::Invalid {
                rejected: vec!["not a url".into()]
            }
        );
        assert_eq!(err.to_string(), "Please enter valid URLs (e.g. https://example.com)");
    }
}
