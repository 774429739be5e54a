//! Which tabs may be instrumented.
//!
//! A tab is eligible when its URL is known, non-empty and does not start
//! with a restricted prefix. Browsers refuse debugger sessions on their own
//! pages, so those are never attempted.

// ============================================================================
// Eligibility
// ============================================================================

/// Returns `true` if a tab with this URL may be instrumented.
#[must_use]
pub fn is_eligible_url(url: Option<&str>, restricted_prefixes: &[String]) -> bool {
    let Some(url) = url.map(str::trim).filter(|url| !url.is_empty()) else {
        return false;
    };

    !restricted_prefixes
        .iter()
        .any(|prefix| url.starts_with(prefix.as_str()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::coordinator::options::DEFAULT_RESTRICTED_PREFIXES;

    fn prefixes() -> Vec<String> {
        DEFAULT_RESTRICTED_PREFIXES
            .iter()
            .map(|prefix| (*prefix).to_string())
            .collect()
    }

    #[test]
    fn test_regular_pages_eligible() {
        let prefixes = prefixes();
        assert!(is_eligible_url(Some("https://example.com/"), &prefixes));
        assert!(is_eligible_url(Some("http://localhost:8080"), &prefixes));
        assert!(is_eligible_url(Some("file:///tmp/index.html"), &prefixes));
    }

    #[test]
    fn test_browser_pages_ineligible() {
        let prefixes = prefixes();
        for url in [
            "chrome://settings",
            "chrome-extension://abc/panel.html",
            "moz-extension://abc/panel.html",
            "edge://newtab",
            "about:blank",
            "view-source:https://example.com",
            "devtools://devtools/bundled/inspector.html",
        ] {
            assert!(!is_eligible_url(Some(url), &prefixes), "{url}");
        }
    }

    #[test]
    fn test_missing_or_blank_url_ineligible() {
        let prefixes = prefixes();
        assert!(!is_eligible_url(None, &prefixes));
        assert!(!is_eligible_url(Some(""), &prefixes));
        assert!(!is_eligible_url(Some("   "), &prefixes));
    }

    #[test]
    fn test_custom_prefixes() {
        let prefixes = vec!["https://bank.".to_string()];
        assert!(!is_eligible_url(Some("https://bank.example"), &prefixes));
        assert!(is_eligible_url(Some("chrome://settings"), &prefixes));
    }

    proptest! {
        #[test]
        fn prop_restricted_prefix_never_eligible(
            index in 0..DEFAULT_RESTRICTED_PREFIXES.len(),
            rest in "[a-z0-9/._-]{0,24}",
        ) {
            let url = format!("{}{}", DEFAULT_RESTRICTED_PREFIXES[index], rest);
            prop_assert!(!is_eligible_url(Some(&url), &prefixes()));
        }

        #[test]
        fn prop_web_pages_eligible(host in "[a-z]{1,12}", path in "[a-z0-9/]{0,16}") {
            let url = format!("https://{host}.example/{path}");
            prop_assert!(is_eligible_url(Some(&url), &prefixes()));
        }
    }
}
