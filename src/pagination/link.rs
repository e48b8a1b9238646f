//! Link header parsing
//!
//! Extracts pagination relations from an HTTP `Link` header:
//!
//! ```text
//! Link: <https://lms.example.com/api/v1/courses/1/files?page=2&per_page=10>; rel="next",
//!       <https://lms.example.com/api/v1/courses/1/files?page=9&per_page=10>; rel="last"
//! ```
//!
//! Every linked URL must carry a numeric `page` query parameter.

use crate::error::{Error, Result};
use regex::Regex;
use reqwest::header::{HeaderMap, LINK};
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<(.*?)>; rel="(.*?)""#).expect("link pattern is valid"));

/// Base used to resolve relative link targets (`/files?page=2`)
static RELATIVE_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/").expect("relative base is valid"));

/// A single linked page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    /// Target URL
    pub url: Url,
    /// Value of the URL's `page` query parameter
    pub page: u32,
}

impl PageLink {
    /// Parse a linked URL and read its page number
    pub fn parse(raw: &str) -> Result<Self> {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => RELATIVE_BASE.join(raw)?,
            Err(e) => return Err(Error::link_parse(raw, e.to_string())),
        };

        let page = url
            .query_pairs()
            .find(|(k, _)| k == "page")
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| Error::link_parse(raw, "missing page parameter"))?;

        let page = page
            .parse::<u32>()
            .map_err(|e| Error::link_parse(raw, format!("could not parse page num '{page}': {e}")))?;

        Ok(Self { url, page })
    }
}

/// Relations advertised by one response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    links: HashMap<String, PageLink>,
}

impl LinkSet {
    /// Parse a raw `Link` header value
    ///
    /// An empty value yields an empty set. Any relation whose URL lacks a
    /// numeric `page` parameter fails the whole parse.
    pub fn parse(header: &str) -> Result<Self> {
        let (set, errors) = Self::parse_lenient(header);
        match errors.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(set),
        }
    }

    /// Parse a raw `Link` header value, keeping every relation that parses
    ///
    /// Relations that fail are returned alongside their error.
    pub fn parse_lenient(header: &str) -> (Self, Vec<(String, Error)>) {
        let mut set = Self::default();
        let mut errors = Vec::new();

        for caps in LINK_PATTERN.captures_iter(header) {
            let rel = caps[2].to_string();
            match PageLink::parse(&caps[1]) {
                Ok(link) => {
                    set.links.insert(rel, link);
                }
                Err(err) => errors.push((rel, err)),
            }
        }

        (set, errors)
    }

    /// Parse the `Link` header of a response; a missing header is an empty set
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        match headers.get(LINK).and_then(|v| v.to_str().ok()) {
            Some(value) => Self::parse(value),
            None => Ok(Self::default()),
        }
    }

    /// Get a relation by name
    pub fn get(&self, rel: &str) -> Option<&PageLink> {
        self.links.get(rel)
    }

    /// The "first" relation
    pub fn first(&self) -> Option<&PageLink> {
        self.get("first")
    }

    /// The "next" relation
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> Option<&PageLink> {
        self.get("next")
    }

    /// The "prev" relation
    pub fn prev(&self) -> Option<&PageLink> {
        self.get("prev")
    }

    /// The "last" relation, which carries the page count
    pub fn last(&self) -> Option<&PageLink> {
        self.get("last")
    }

    /// Page number of the "last" relation
    pub fn last_page(&self) -> Option<u32> {
        self.last().map(|link| link.page)
    }

    /// Iterate over relation names and links
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PageLink)> {
        self.links.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of distinct relations
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// True when the header carried no usable relation
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
