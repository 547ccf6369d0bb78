use chrono::NaiveDateTime;
use reqwest::StatusCode;

/// Everything that can go wrong between fetching a page and producing a breakdown.
///
/// Leaf variants describe the failure itself; `Group`, `Stages` and
/// `Discovery` only add the context of the layer that saw it and keep the
/// underlying error as their source.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("request to {url} failed")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: StatusCode },

    #[error("{what} not found at {url}")]
    MarkupShape { url: String, what: String },

    #[error("invalid configuration for `{key}`: {reason}")]
    Configuration { key: String, reason: String },

    #[error("date `{raw}` does not match format `{format}`")]
    DateParse {
        raw: String,
        format: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("cannot shift {date} by {days} days")]
    DateRange { date: NaiveDateTime, days: i64 },

    #[error("invalid url `{url}`")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to process group `{name}`")]
    Group {
        name: String,
        #[source]
        source: Box<ScrapeError>,
    },

    #[error("failed to resolve stages for {url}")]
    Stages {
        url: String,
        #[source]
        source: Box<ScrapeError>,
    },

    #[error("group discovery failed")]
    Discovery {
        #[source]
        source: Box<ScrapeError>,
    },
}

impl ScrapeError {
    pub fn markup(url: impl Into<String>, what: impl Into<String>) -> Self {
        Self::MarkupShape {
            url: url.into(),
            what: what.into(),
        }
    }

    pub fn configuration(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn in_group(self, name: &str) -> Self {
        Self::Group {
            name: name.to_string(),
            source: Box::new(self),
        }
    }

    /// Worth another attempt: transport errors, throttling and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch { source, .. } => source.is_timeout() || source.is_connect(),
            Self::HttpStatus { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}
