use reqwest::StatusCode;
use std::path::PathBuf;

/// Errors returned by every public operation of this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller supplied a malformed location, bounding box or output path.
    ///
    /// Always raised before any network access.
    #[error("invalid argument `{field}`: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    /// The SoilGrids service was unreachable, rejected the request, or replied
    /// with something that could not be decoded.
    #[error("SoilGrids request failed ({url}): {reason}")]
    ExternalService { url: String, reason: String },

    /// Local filesystem failure while writing the output file.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn external(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ExternalService {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ApiErrorResponse {
    // FastAPI style: either a string or a list of {"loc":..,"msg":..}
    #[serde(default)]
    pub(crate) detail: Option<serde_json::Value>,
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) title: Option<String>,
}

impl ApiErrorResponse {
    fn summary(&self) -> String {
        let detail = match &self.detail {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(|item| {
                    let msg = item.get("msg").and_then(|m| m.as_str()).unwrap_or("");
                    let loc = item
                        .get("loc")
                        .and_then(|l| l.as_array())
                        .map(|l| {
                            l.iter()
                                .map(|p| match p {
                                    serde_json::Value::String(s) => s.clone(),
                                    other => other.to_string(),
                                })
                                .collect::<Vec<_>>()
                                .join(".")
                        })
                        .unwrap_or_default();
                    if loc.is_empty() {
                        msg.to_string()
                    } else {
                        format!("{loc}: {msg}")
                    }
                })
                .collect::<Vec<_>>()
                .join("; "),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let title = self
            .title
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("");

        match (title.is_empty(), detail.is_empty()) {
            (true, _) => detail,
            (false, true) => title.to_string(),
            (false, false) => format!("{title}: {detail}"),
        }
    }
}

/// Turns a non-success HTTP reply into an [`Error::ExternalService`] with an
/// actionable message.
pub(crate) fn format_api_error(status: StatusCode, url: &str, body: &str) -> Error {
    let server = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.summary())
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| crate::util::ows_exception_text(body))
        .unwrap_or_else(|| crate::util::truncate(body.trim(), 300));

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Error::external(
            url,
            format!(
                "HTTP 429: rate limit exceeded.\n- The public SoilGrids REST API allows about 5 requests per minute\n- Wait a minute and re-run, or query fewer points\n\nServer message: {server}"
            ),
        );
    }

    if status == StatusCode::NOT_FOUND {
        return Error::external(
            url,
            format!(
                "HTTP 404: endpoint not found.\n- The configured base URL may be wrong (default REST: {}, WCS: {})\n\nServer message: {server}",
                crate::client::DEFAULT_REST_URL,
                crate::client::DEFAULT_WCS_URL
            ),
        );
    }

    if status == StatusCode::UNPROCESSABLE_ENTITY {
        return Error::external(url, format!("HTTP 422: request rejected: {server}"));
    }

    Error::external(url, format!("HTTP {}: {server}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_details_are_flattened() {
        let body = r#"{"detail":[{"loc":["query","lat"],"msg":"ensure this value is less than or equal to 90","type":"value_error"}]}"#;
        let err = format_api_error(StatusCode::UNPROCESSABLE_ENTITY, "http://x", body);
        let msg = err.to_string();
        assert!(msg.contains("HTTP 422"));
        assert!(msg.contains("query.lat: ensure this value"));
    }

    #[test]
    fn rate_limit_gets_a_hint() {
        let err = format_api_error(
            StatusCode::TOO_MANY_REQUESTS,
            "http://x",
            r#"{"detail":"Too many requests"}"#,
        );
        match err {
            Error::ExternalService { url, reason } => {
                assert_eq!(url, "http://x");
                assert!(reason.contains("rate limit"));
                assert!(reason.contains("Too many requests"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn plain_text_body_is_kept() {
        let err = format_api_error(StatusCode::BAD_GATEWAY, "http://x", "upstream down\n");
        assert!(err.to_string().contains("HTTP 502: upstream down"));
    }
}
