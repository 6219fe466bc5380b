//! Accept header parsing and content negotiation.
//!
//! # Responsibilities
//! - Parse `Accept` into weighted media ranges
//! - Score every available type by its most specific matching range
//! - Pick exactly one type, or report why none is acceptable
//!
//! # Design Decisions
//! - A range with `q=0` excludes every type it is the most specific match for
//! - Ranking: quality, then specificity, then catalog order
//! - An absent or malformed header is a negotiation failure, never a panic

use thiserror::Error;

use crate::maintenance::catalog::{Catalog, CatalogEntry};
use crate::maintenance::media_type::{split_unquoted, MediaType};

/// Reasons negotiation can fail. All of them lead to the fallback response.
#[derive(Debug, Error, PartialEq)]
pub enum NegotiationError {
    #[error("request has no Accept header")]
    MissingHeader,

    #[error("malformed Accept entry: {0}")]
    Malformed(String),

    #[error("no available media type is acceptable")]
    NotAcceptable,
}

/// One entry of an Accept header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    /// The range itself, without the `q` parameter.
    pub media: MediaType,
    pub quality: f32,
}

impl MediaRange {
    fn parse(entry: &str) -> Result<Self, NegotiationError> {
        let malformed = || NegotiationError::Malformed(entry.to_string());
        let mut media = MediaType::parse(entry).ok_or_else(malformed)?;
        if media.main == "*" && media.subtype != "*" {
            return Err(malformed());
        }

        // Parameters after `q` are accept-extensions, not part of the range.
        let mut quality = 1.0;
        if let Some(pos) = media.params.iter().position(|(name, _)| name == "q") {
            let raw = &media.params[pos].1;
            quality = raw.parse::<f32>().map_err(|_| malformed())?;
            if !(0.0..=1.0).contains(&quality) {
                return Err(malformed());
            }
            media.params.truncate(pos);
        }

        Ok(Self { media, quality })
    }

    /// 0 for `*/*`, 1 for `type/*`, 2 for `type/subtype`, 3 with parameters.
    pub fn specificity(&self) -> u8 {
        if self.media.main == "*" {
            0
        } else if self.media.subtype == "*" {
            1
        } else if self.media.params.is_empty() {
            2
        } else {
            3
        }
    }

    pub fn matches(&self, available: &MediaType) -> bool {
        if self.media.main == "*" {
            return true;
        }
        if self.media.main != available.main {
            return false;
        }
        if self.media.subtype == "*" {
            return true;
        }
        self.media.subtype == available.subtype
            && self.media.params.iter().all(|(name, value)| {
                available
                    .param(name)
                    .is_some_and(|v| v.eq_ignore_ascii_case(value))
            })
    }
}

/// A parsed Accept header, in header order.
#[derive(Debug, Clone)]
pub struct AcceptHeader {
    pub ranges: Vec<MediaRange>,
}

impl AcceptHeader {
    /// Parse a header value. Empty list elements are ignored; any other
    /// unparsable element rejects the whole header.
    pub fn parse(header: &str) -> Result<Self, NegotiationError> {
        let ranges = split_unquoted(header, ',')
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(MediaRange::parse)
            .collect::<Result<Vec<_>, _>>()?;

        if ranges.is_empty() {
            return Err(NegotiationError::MissingHeader);
        }
        Ok(Self { ranges })
    }

    /// Quality and specificity of the most specific range matching `available`.
    ///
    /// Among equally specific ranges the first one in the header wins.
    pub fn preference(&self, available: &MediaType) -> Option<(f32, u8)> {
        let mut best: Option<&MediaRange> = None;
        for range in self.ranges.iter().filter(|r| r.matches(available)) {
            if best.map_or(true, |b| range.specificity() > b.specificity()) {
                best = Some(range);
            }
        }
        best.map(|r| (r.quality, r.specificity()))
    }

    /// Pick the best of `available`, keeping the earliest on a full tie.
    pub fn best_match<'a, I>(&self, available: I) -> Option<&'a MediaType>
    where
        I: IntoIterator<Item = &'a MediaType>,
    {
        let mut best: Option<(&'a MediaType, f32, u8)> = None;
        for media in available {
            let Some((quality, specificity)) = self.preference(media) else {
                continue;
            };
            if quality <= 0.0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, q, s)) => quality > q || (quality == q && specificity > s),
            };
            if better {
                best = Some((media, quality, specificity));
            }
        }
        best.map(|(media, _, _)| media)
    }
}

/// Select the catalog entry that best satisfies `accept`.
pub fn negotiate<'a>(
    accept: Option<&str>,
    catalog: &'a Catalog,
) -> Result<&'a CatalogEntry, NegotiationError> {
    let header = accept.ok_or(NegotiationError::MissingHeader)?;
    let accept = AcceptHeader::parse(header)?;
    let media = accept
        .best_match(catalog.entries().iter().map(|e| &e.media_type))
        .ok_or(NegotiationError::NotAcceptable)?;
    catalog.get(media).ok_or(NegotiationError::NotAcceptable)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(list: &[&str]) -> Vec<MediaType> {
        list.iter().map(|s| MediaType::parse(s).unwrap()).collect()
    }

    #[test]
    fn test_parse_defaults_quality() {
        let accept = AcceptHeader::parse("text/html, application/json;q=0.9").unwrap();
        assert_eq!(accept.ranges.len(), 2);
        assert_eq!(accept.ranges[0].quality, 1.0);
        assert_eq!(accept.ranges[1].quality, 0.9);
        assert!(accept.ranges[1].media.params.is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            AcceptHeader::parse("text/html;q=abc"),
            Err(NegotiationError::Malformed(_))
        ));
        assert!(matches!(
            AcceptHeader::parse("text/html;q=1.5"),
            Err(NegotiationError::Malformed(_))
        ));
        assert!(matches!(
            AcceptHeader::parse("*/html"),
            Err(NegotiationError::Malformed(_))
        ));
        assert!(matches!(
            AcceptHeader::parse("html"),
            Err(NegotiationError::Malformed(_))
        ));
        assert_eq!(AcceptHeader::parse(" , ").unwrap_err(), NegotiationError::MissingHeader);
    }

    #[test]
    fn test_parse_quoted_commas() {
        let accept = AcceptHeader::parse(r#"text/html;foo="a,b", application/json;q=0.5"#).unwrap();
        assert_eq!(accept.ranges.len(), 2);
        assert_eq!(accept.ranges[0].media.param("foo"), Some("a,b"));
        assert_eq!(accept.ranges[1].quality, 0.5);

        let available = types(&["application/json", "text/html; foo=\"a,b\""]);
        assert_eq!(accept.best_match(&available).unwrap().essence(), "text/html");
    }

    #[test]
    fn test_prefers_higher_quality() {
        let available = types(&["text/html", "application/json"]);
        let accept = AcceptHeader::parse("text/html,application/json;q=0.9,*/*;q=0.8").unwrap();
        assert_eq!(accept.best_match(&available).unwrap().essence(), "text/html");

        let accept = AcceptHeader::parse("text/plain;q=0.1, application/json").unwrap();
        assert_eq!(accept.best_match(&available).unwrap().essence(), "application/json");
    }

    #[test]
    fn test_most_specific_range_sets_quality() {
        let available = types(&["text/html", "application/json"]);
        let accept = AcceptHeader::parse("text/html;q=0.5, */*").unwrap();
        assert_eq!(accept.best_match(&available).unwrap().essence(), "application/json");

        let accept = AcceptHeader::parse("*/*;q=0.5, text/*").unwrap();
        assert_eq!(accept.best_match(&available).unwrap().essence(), "text/html");
    }

    #[test]
    fn test_specificity_breaks_quality_ties() {
        let available = types(&["image/png", "text/html"]);
        let accept = AcceptHeader::parse("image/*, text/html").unwrap();
        assert_eq!(accept.best_match(&available).unwrap().essence(), "text/html");
    }

    #[test]
    fn test_catalog_order_breaks_full_ties() {
        let available = types(&["application/json", "text/html"]);
        let accept = AcceptHeader::parse("*/*").unwrap();
        assert_eq!(accept.best_match(&available).unwrap().essence(), "application/json");
    }

    #[test]
    fn test_zero_quality_excludes() {
        let available = types(&["text/html"]);
        let accept = AcceptHeader::parse("text/html;q=0, */*").unwrap();
        assert!(accept.best_match(&available).is_none());

        let accept = AcceptHeader::parse("*/*;q=0").unwrap();
        assert!(accept.best_match(&available).is_none());
    }

    #[test]
    fn test_range_parameters_must_match() {
        let available = types(&["text/html; charset=utf-8", "text/html"]);
        let accept = AcceptHeader::parse("text/html;charset=UTF-8").unwrap();
        assert_eq!(
            accept.best_match(&available).unwrap().to_string(),
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn test_no_match() {
        let available = types(&["image/png"]);
        let accept = AcceptHeader::parse("text/html, application/*").unwrap();
        assert!(accept.best_match(&available).is_none());
    }
}
