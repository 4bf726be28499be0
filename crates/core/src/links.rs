//! Resource tokens in generated text.
//!
//! Model output may reference outside resources with `{{Platform|query}}`.
//! [`rewrite_links`] turns every well-formed token into a Markdown link to a
//! search on that platform and leaves everything else untouched.

use std::fmt;

use serde::Serialize;
use url::form_urlencoded::byte_serialize;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Platform {
    YouTube,
    Google,
    Images,
    Pinterest,
    Twinkl,
    Wikipedia,
}

impl Platform {
    pub const ALL: [Self; 6] = [
        Self::YouTube,
        Self::Google,
        Self::Images,
        Self::Pinterest,
        Self::Twinkl,
        Self::Wikipedia,
    ];

    /// Case-insensitive lookup by canonical name.
    #[must_use]
    pub fn from_name(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(raw))
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::Google => "Google",
            Self::Images => "Images",
            Self::Pinterest => "Pinterest",
            Self::Twinkl => "Twinkl",
            Self::Wikipedia => "Wikipedia",
        }
    }

    fn search_base(self) -> &'static str {
        match self {
            Self::YouTube => "https://www.youtube.com/results?search_query=",
            Self::Google => "https://www.google.com/search?q=",
            Self::Images => "https://www.google.com/search?tbm=isch&q=",
            Self::Pinterest => "https://www.pinterest.com/search/pins/?q=",
            Self::Twinkl => "https://www.twinkl.co.uk/search?q=",
            Self::Wikipedia => "https://en.wikipedia.org/w/index.php?search=",
        }
    }

    /// Search URL for `query`, form-url-encoded.
    #[must_use]
    pub fn search_url(self, query: &str) -> String {
        let encoded: String = byte_serialize(query.as_bytes()).collect();
        format!("{}{encoded}", self.search_base())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed `{{Platform|query}}` token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceLink {
    /// `None` when the token named a platform we do not know.
    pub platform: Option<Platform>,
    /// Canonical platform name, or the raw name for unknown platforms.
    pub label: String,
    pub query: String,
    pub url: String,
}

impl ResourceLink {
    fn parse(inner: &str) -> Option<Self> {
        if inner.contains('\n') || inner.contains('{') {
            return None;
        }
        let (platform, query) = inner.split_once('|')?;
        let (platform_raw, query) = (platform.trim(), query.trim());
        if platform_raw.is_empty() || query.is_empty() {
            return None;
        }

        let platform = Platform::from_name(platform_raw);
        let (label, url) = match platform {
            Some(p) => (p.name().to_owned(), p.search_url(query)),
            None => (platform_raw.to_owned(), Platform::Google.search_url(query)),
        };
        Some(Self {
            platform,
            label,
            query: query.to_owned(),
            url,
        })
    }

    #[must_use]
    pub fn markdown(&self) -> String {
        format!("[{} ({})]({})", self.query, self.label, self.url)
    }
}

enum Segment<'a> {
    Text(&'a str),
    Link(ResourceLink),
}

fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(OPEN) {
        let after_open = &rest[open + OPEN.len()..];
        let Some(close) = after_open.find(CLOSE) else {
            break;
        };

        match ResourceLink::parse(&after_open[..close]) {
            Some(link) => {
                if open > 0 {
                    out.push(Segment::Text(&rest[..open]));
                }
                out.push(Segment::Link(link));
                rest = &after_open[close + CLOSE.len()..];
            }
            None => {
                // Keep the braces and rescan from just after them so a
                // valid token nested behind a broken one is still found.
                let keep = open + OPEN.len();
                out.push(Segment::Text(&rest[..keep]));
                rest = &rest[keep..];
            }
        }
    }

    if !rest.is_empty() {
        out.push(Segment::Text(rest));
    }
    out
}

/// Replace every well-formed resource token with a Markdown link.
#[must_use]
pub fn rewrite_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in segments(text) {
        match segment {
            Segment::Text(t) => out.push_str(t),
            Segment::Link(link) => out.push_str(&link.markdown()),
        }
    }
    out
}

/// Well-formed resource tokens in order of appearance.
#[must_use]
pub fn extract_links(text: &str) -> Vec<ResourceLink> {
    segments(text)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Link(link) => Some(link),
            Segment::Text(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_known_platforms() {
        let out = rewrite_links("Watch {{YouTube|turn taking song}} today.");
        assert_eq!(
            out,
            "Watch [turn taking song (YouTube)](https://www.youtube.com/results?search_query=turn+taking+song) today."
        );
    }

    #[test]
    fn platform_match_is_case_insensitive_and_trimmed() {
        let out = rewrite_links("{{ twinkl | emotions cards }}");
        assert_eq!(
            out,
            "[emotions cards (Twinkl)](https://www.twinkl.co.uk/search?q=emotions+cards)"
        );
    }

    #[test]
    fn every_platform_has_its_own_url() {
        let urls: Vec<String> = Platform::ALL.iter().map(|p| p.search_url("a b")).collect();
        assert_eq!(urls[2], "https://www.google.com/search?tbm=isch&q=a+b");
        assert_eq!(urls[3], "https://www.pinterest.com/search/pins/?q=a+b");
        assert_eq!(urls[5], "https://en.wikipedia.org/w/index.php?search=a+b");
    }

    #[test]
    fn query_is_url_encoded() {
        let links = extract_links("{{Google|fish & chips?}}");
        assert_eq!(links[0].url, "https://www.google.com/search?q=fish+%26+chips%3F");
    }

    #[test]
    fn unknown_platform_falls_back_to_google() {
        let out = rewrite_links("{{Bing|social stories}}");
        assert_eq!(
            out,
            "[social stories (Bing)](https://www.google.com/search?q=social+stories)"
        );
        let links = extract_links("{{Bing|social stories}}");
        assert_eq!(links[0].platform, None);
        assert_eq!(links[0].label, "Bing");
    }

    #[test]
    fn malformed_tokens_stay_verbatim() {
        for input in [
            "{{YouTube}}",
            "{{YouTube|   }}",
            "{{|query}}",
            "start {{Google|never closed",
            "{{Google|line\nbreak}}",
            "plain text with } and { braces",
        ] {
            assert_eq!(rewrite_links(input), input, "input {input:?}");
            assert!(extract_links(input).is_empty(), "input {input:?}");
        }
    }

    #[test]
    fn valid_token_after_broken_one_is_found() {
        let out = rewrite_links("{{oops {{Images|calm down}}");
        assert_eq!(
            out,
            "{{oops [calm down (Images)](https://www.google.com/search?tbm=isch&q=calm+down)"
        );
    }

    #[test]
    fn extract_returns_tokens_in_order() {
        let links = extract_links("a {{Wikipedia|Makaton}} b {{Pinterest|sensory bin}} c");
        let queries: Vec<&str> = links.iter().map(|l| l.query.as_str()).collect();
        assert_eq!(queries, ["Makaton", "sensory bin"]);
        assert_eq!(links[0].platform, Some(Platform::Wikipedia));
    }

    #[test]
    fn text_without_tokens_is_unchanged() {
        let text = "No links here. Just **markdown**.";
        assert_eq!(rewrite_links(text), text);
    }
}
