use thiserror::Error;

/// Why a document could not be loaded.
///
/// The controller logs these and collapses them into a single
/// "data unavailable" state; they never reach the presentation layer.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The request could not be sent or the body could not be received.
    #[error("transport error fetching {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The body was not valid JSON for the expected document.
    #[error("failed to parse {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The widget's controller has been torn down.
#[derive(Debug, Error)]
#[error("footer widget has shut down")]
pub struct WidgetClosed;

impl LoadError {
    pub fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Short kind tag for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::HttpStatus { .. } => "http_status",
            Self::Parse { .. } => "parse",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_url() {
        let err = LoadError::HttpStatus {
            url: "http://h/contact.json".into(),
            status: 404,
        };
        assert_eq!(err.to_string(), "http://h/contact.json returned HTTP 404");
        assert_eq!(err.kind(), "http_status");

        let err = LoadError::transport("http://h/blog.json", "connection refused");
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.kind(), "transport");
    }

    #[test]
    fn parse_error_keeps_source() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = LoadError::Parse {
            url: "contact.json".into(),
            source,
        };
        assert_eq!(err.kind(), "parse");
        assert!(std::error::Error::source(&err).is_some());
    }
}
