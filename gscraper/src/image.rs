//! Reverse-image token exchange.
//!
//! Uploads a locally staged image to the backend's search-by-image endpoint
//! and pulls the opaque `tbs` token out of the link it answers with. The
//! token then replaces the recency filter in listing requests.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use scraper::{Html, Selector};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::http;

/// Query parameter holding the token in the upload response link.
const TOKEN_PARAM: &str = "tbs";

/// Viewport size reported with the upload.
const VIEWPORT: &str = "777";

/// Obtains reverse-image tokens from the upload endpoint.
#[derive(Debug, Clone)]
pub struct ImageFingerprinter {
    client: reqwest::Client,
    upload_url: String,
}

impl ImageFingerprinter {
    /// # Errors
    ///
    /// Returns [`ScrapeError::Transport`] if the upload client cannot be built.
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        Ok(Self {
            client: http::build_upload_client(config)?,
            upload_url: config.image_upload_url.clone(),
        })
    }

    /// Token for `image`, or `None` when no image was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::ImageEncoding`] if the file cannot be read, the
    /// upload fails, or the response carries no token.
    pub async fn encode(&self, image: Option<&Path>) -> Result<Option<String>, ScrapeError> {
        let Some(path) = image else {
            return Ok(None);
        };

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ScrapeError::ImageEncoding(format!("cannot read image {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_owned());

        tracing::trace!(bytes = bytes.len(), file = %file_name, "uploading image");

        let form = Form::new()
            .text("image_url", "")
            .text("image_content", "")
            .text("filename", "")
            .text("bih", VIEWPORT)
            .text("biw", VIEWPORT)
            .part("encoded_image", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ScrapeError::ImageEncoding(format!("image upload failed: {e}")))?;

        let status = response.status();
        if !status.is_success() && !status.is_redirection() {
            return Err(ScrapeError::ImageEncoding(format!(
                "image upload answered {status}"
            )));
        }

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response
            .text()
            .await
            .map_err(|e| ScrapeError::ImageEncoding(format!("reading upload response failed: {e}")))?;

        let token = match parse_image_token(&body, &self.upload_url) {
            Ok(token) => token,
            Err(err) => match location {
                Some(ref href) => token_from_href(href, &self.upload_url)?,
                None => return Err(err),
            },
        };
        tracing::debug!("image token obtained");
        Ok(Some(token))
    }
}

/// Extract the token from the first anchor in an upload response body.
///
/// # Errors
///
/// Returns [`ScrapeError::ImageEncoding`] if there is no anchor with an
/// `href`, or the link has no token parameter.
pub fn parse_image_token(body: &str, base_url: &str) -> Result<String, ScrapeError> {
    let document = Html::parse_document(body);
    let anchor_sel = Selector::parse("a")
        .map_err(|e| ScrapeError::Parse(format!("invalid anchor selector: {e:?}")))?;

    let href = document
        .select(&anchor_sel)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| ScrapeError::ImageEncoding("upload response has no link".into()))?;

    token_from_href(href, base_url)
}

fn token_from_href(href: &str, base_url: &str) -> Result<String, ScrapeError> {
    let base = Url::parse(base_url)
        .map_err(|e| ScrapeError::ImageEncoding(format!("invalid upload URL: {e}")))?;
    let link = base
        .join(href)
        .map_err(|e| ScrapeError::ImageEncoding(format!("unusable link {href}: {e}")))?;

    link.query_pairs()
        .find(|(key, _)| key == TOKEN_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ScrapeError::ImageEncoding(format!("link {href} carries no token")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BASE: &str = "https://www.google.com/searchbyimage/upload";

    const UPLOAD_RESPONSE: &str = r#"<HTML><HEAD><meta http-equiv="content-type" content="text/html;charset=utf-8">
<TITLE>302 Moved</TITLE></HEAD><BODY>
<H1>302 Moved</H1>
The document has moved
<A HREF="https://www.google.com/search?tbs=sbi:AMhZZitoken42&amp;hl=en">here</A>.
</BODY></HTML>"#;

    #[test]
    fn token_parsed_from_first_anchor() {
        let token = parse_image_token(UPLOAD_RESPONSE, BASE).expect("token");
        assert_eq!(token, "sbi:AMhZZitoken42");
    }

    #[test]
    fn relative_link_resolved_against_upload_url() {
        let body = r#"<a href="/search?hl=en&tbs=sbi:rel">x</a><a href="/other?tbs=no">y</a>"#;
        assert_eq!(parse_image_token(body, BASE).expect("token"), "sbi:rel");
    }

    #[test]
    fn missing_anchor_is_image_error() {
        let err = parse_image_token("<html><body>nothing</body></html>", BASE).unwrap_err();
        assert!(matches!(err, ScrapeError::ImageEncoding(_)));
    }

    #[test]
    fn missing_token_param_is_image_error() {
        let err = parse_image_token(r#"<a href="/search?q=cat">x</a>"#, BASE).unwrap_err();
        assert!(err.to_string().contains("no token"));
    }

    #[tokio::test]
    async fn no_image_yields_no_token() {
        let fp = ImageFingerprinter::new(&ScraperConfig::default()).expect("fingerprinter");
        assert_eq!(fp.encode(None).await.expect("ok"), None);
    }

    #[tokio::test]
    async fn unreadable_file_is_image_error() {
        let fp = ImageFingerprinter::new(&ScraperConfig::default()).expect("fingerprinter");
        let err = fp
            .encode(Some(Path::new("/nonexistent/cat.png")))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::ImageEncoding(_)));
    }

    #[tokio::test]
    async fn upload_exchange_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/searchbyimage/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_string(UPLOAD_RESPONSE))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let image = dir.path().join("cat.png");
        std::fs::write(&image, b"\x89PNG fake").expect("write image");

        let config = ScraperConfig {
            image_upload_url: format!("{}/searchbyimage/upload", server.uri()),
            ..Default::default()
        };
        let fp = ImageFingerprinter::new(&config).expect("fingerprinter");
        let token = fp.encode(Some(&image)).await.expect("token");
        assert_eq!(token.as_deref(), Some("sbi:AMhZZitoken42"));

        let requests = server.received_requests().await.expect("recorded");
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"encoded_image\"; filename=\"cat.png\""));
        assert!(body.contains("name=\"biw\""));
    }

    #[tokio::test]
    async fn redirect_location_used_when_body_has_no_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "/search?tbs=sbi:fromheader"),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let image = dir.path().join("dog.jpg");
        std::fs::write(&image, b"jpeg").expect("write image");

        let config = ScraperConfig {
            image_upload_url: format!("{}/searchbyimage/upload", server.uri()),
            ..Default::default()
        };
        let fp = ImageFingerprinter::new(&config).expect("fingerprinter");
        let token = fp.encode(Some(&image)).await.expect("token");
        assert_eq!(token.as_deref(), Some("sbi:fromheader"));
    }

    #[tokio::test]
    async fn server_error_is_image_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let image = dir.path().join("cat.png");
        std::fs::write(&image, b"png").expect("write image");

        let config = ScraperConfig {
            image_upload_url: format!("{}/upload", server.uri()),
            ..Default::default()
        };
        let fp = ImageFingerprinter::new(&config).expect("fingerprinter");
        let err = fp.encode(Some(&image)).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
