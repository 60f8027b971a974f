//! Listing request construction.
//!
//! Turns a [`SearchSpec`] plus a page offset into the parameter set the
//! search backend expects. An image token, when present, takes the place of
//! the recency filter in the `tbs` field.

use url::Url;

use crate::error::ScrapeError;
use crate::types::SearchSpec;

/// Results per listing page; the `start` parameter advances by this much.
pub const RESULTS_PER_PAGE: usize = 10;

/// A fully formed listing fetch: endpoint plus ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub endpoint: Url,
    pub params: Vec<(&'static str, String)>,
}

impl ListingRequest {
    /// The endpoint with every parameter appended to its query string.
    pub fn url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .extend_pairs(self.params.iter().map(|(key, value)| (*key, value.as_str())));
        url
    }

    /// Value of the named parameter, if set.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Encode the listing request for `page` (0-based).
///
/// # Errors
///
/// Returns [`ScrapeError::Config`] if `endpoint` is not an absolute URL.
pub fn encode_listing_request(
    spec: &SearchSpec,
    image_token: Option<&str>,
    page: usize,
    endpoint: &str,
) -> Result<ListingRequest, ScrapeError> {
    let endpoint = Url::parse(endpoint)
        .map_err(|e| ScrapeError::Config(format!("invalid search endpoint {endpoint}: {e}")))?;

    let tbs = match image_token {
        Some(token) => token.to_owned(),
        None => spec
            .recency
            .code()
            .map(|code| format!("qdr:{code}"))
            .unwrap_or_default(),
    };
    let lr = spec
        .language
        .code()
        .map(|code| format!("lang_{code}"))
        .unwrap_or_default();
    let text = spec.query.text();

    Ok(ListingRequest {
        endpoint,
        params: vec![
            ("tbs", tbs),
            ("tbm", spec.kind.code().to_owned()),
            ("q", text.clone()),
            ("oq", text),
            ("start", (page * RESULTS_PER_PAGE).to_string()),
            ("lr", lr),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Language, Query, Recency, SearchKind};

    const ENDPOINT: &str = "https://www.google.com/search";

    fn encode(spec: &SearchSpec, token: Option<&str>, page: usize) -> ListingRequest {
        encode_listing_request(spec, token, page, ENDPOINT).expect("encode")
    }

    #[test]
    fn defaults_produce_empty_filters() {
        let req = encode(&SearchSpec::new("rust ownership"), None, 0);
        assert_eq!(req.param("tbs"), Some(""));
        assert_eq!(req.param("tbm"), Some(""));
        assert_eq!(req.param("q"), Some("rust ownership"));
        assert_eq!(req.param("oq"), Some("rust ownership"));
        assert_eq!(req.param("start"), Some("0"));
        assert_eq!(req.param("lr"), Some(""));
    }

    #[test]
    fn recency_language_and_kind_mapped() {
        let spec = SearchSpec {
            kind: SearchKind::News,
            recency: Recency::Week,
            language: Language::Pt,
            ..SearchSpec::new("eleições")
        };
        let req = encode(&spec, None, 0);
        assert_eq!(req.param("tbs"), Some("qdr:w"));
        assert_eq!(req.param("tbm"), Some("nws"));
        assert_eq!(req.param("lr"), Some("lang_pt"));
    }

    #[test]
    fn start_offset_is_page_times_ten() {
        let spec = SearchSpec::new("rust");
        assert_eq!(encode(&spec, None, 1).param("start"), Some("10"));
        assert_eq!(encode(&spec, None, 4).param("start"), Some("40"));
    }

    #[test]
    fn keywords_joined_into_both_query_fields() {
        let spec = SearchSpec::new(Query::Keywords(vec!["a".into(), "b".into()]));
        let req = encode(&spec, None, 0);
        assert_eq!(req.param("q"), Some("a b"));
        assert_eq!(req.param("oq"), Some("a b"));
    }

    #[test]
    fn image_token_ignores_recency() {
        for recency in [Recency::Any, Recency::Hour, Recency::Year] {
            let spec = SearchSpec {
                recency,
                ..SearchSpec::new("cat")
            };
            let req = encode(&spec, Some("sbi:AMhZZtoken"), 0);
            assert_eq!(req.param("tbs"), Some("sbi:AMhZZtoken"));
        }
    }

    #[test]
    fn url_carries_all_params_in_order() {
        let req = encode(&SearchSpec::new("rust book"), None, 2);
        let url = req.url();
        assert_eq!(url.path(), "/search");
        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(keys, vec!["tbs", "tbm", "q", "oq", "start", "lr"]);
        assert!(url.as_str().contains("q=rust+book"));
        assert!(url.as_str().contains("start=20"));
    }

    #[test]
    fn invalid_endpoint_rejected() {
        let result = encode_listing_request(&SearchSpec::new("x"), None, 0, "not a url");
        assert!(matches!(result, Err(ScrapeError::Config(_))));
    }
}
