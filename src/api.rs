// API client module: a small blocking HTTP client for the movie catalog API.
// It turns "give me page N of list K" into one GET request and maps the reply
// either to a list of movies or to a classified `Error`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::Error;

/// Host used when no override is configured.
pub const DEFAULT_HOST: &str = "https://api.themoviedb.org";

/// Shortest request timeout the client accepts.
pub const MIN_TIMEOUT: Duration = Duration::from_secs(5);

/// `status_code` the API uses for a page outside 1..=500.
const OUT_OF_RANGE_CODE: i64 = 22;

/// One movie entry from a listing page. `release_date` is kept verbatim.
/// Missing or `null` fields decode to their empty value.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Movie {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(deserialize_with = "null_as_default")]
    pub release_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub popularity: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub vote_count: u64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Which listing endpoint to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    NowPlaying,
    Popular,
    TopRated,
    Upcoming,
}

impl FetchKind {
    pub const ALL: [FetchKind; 4] = [
        FetchKind::NowPlaying,
        FetchKind::Popular,
        FetchKind::TopRated,
        FetchKind::Upcoming,
    ];

    /// Name accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            FetchKind::NowPlaying => "playing",
            FetchKind::Popular => "popular",
            FetchKind::TopRated => "top",
            FetchKind::Upcoming => "upcoming",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            FetchKind::NowPlaying => "/3/movie/now_playing",
            FetchKind::Popular => "/3/movie/popular",
            FetchKind::TopRated => "/3/movie/top_rated",
            FetchKind::Upcoming => "/3/movie/upcoming",
        }
    }
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FetchKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FetchKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

/// Anything that can hand out pages of movies. The session loop only talks
/// to this trait, so tests can swap the real client for a stub.
pub trait MovieSource {
    fn movies(&self, kind: FetchKind, page: i64) -> Result<Vec<Movie>, Error>;

    /// Release whatever the source holds. Called once at shutdown.
    fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// Connection settings for [`ApiClient`].
#[derive(Clone)]
pub struct ClientConfig {
    pub host: String,
    pub token: String,
    pub timeout: Duration,
    /// Log raw response bodies at debug level.
    pub debug: bool,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("debug", &self.debug)
            .finish()
    }
}

impl ClientConfig {
    /// Reject configurations that could never produce a working request.
    pub fn validate(&self) -> Result<(), Error> {
        if self.host.is_empty() {
            return Err(Error::InvalidConfig("host is required".into()));
        }
        let url = Url::parse(&self.host)
            .map_err(|e| Error::InvalidConfig(format!("host {:?} is not a url: {e}", self.host)))?;
        if url.host_str().is_none() {
            return Err(Error::InvalidConfig(format!(
                "host {:?} has no host part",
                self.host
            )));
        }
        if self.token.is_empty() {
            return Err(Error::InvalidConfig("token is required".into()));
        }
        if self.timeout < MIN_TIMEOUT {
            return Err(Error::InvalidConfig(format!(
                "timeout {:?} is below the minimum of {:?}",
                self.timeout, MIN_TIMEOUT
            )));
        }
        Ok(())
    }
}

/// Blocking client that owns one pooled reqwest `Client`.
pub struct ApiClient {
    http: Option<Client>,
    base_url: String,
    config: ClientConfig,
}

#[derive(Deserialize)]
struct MoviePage {
    #[serde(default)]
    results: Vec<Movie>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ErrorReply {
    status_code: i64,
    status_message: String,
}

impl ErrorReply {
    fn unexpected() -> Self {
        ErrorReply {
            status_code: -1,
            status_message: "Unexpected response from the API.".into(),
        }
    }
}

impl ApiClient {
    /// Validate `config` and build the underlying HTTP client. No request is
    /// sent here.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cannot build http client: {e}")))?;
        Ok(ApiClient {
            http: Some(http),
            base_url: config.host.trim_end_matches('/').to_string(),
            config,
        })
    }

    /// Replace the transport. Auth and query parameters are still added per
    /// request, so any reqwest client works here.
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn now_playing(&self, page: i64) -> Result<Vec<Movie>, Error> {
        self.get(FetchKind::NowPlaying, page)
    }

    pub fn popular(&self, page: i64) -> Result<Vec<Movie>, Error> {
        self.get(FetchKind::Popular, page)
    }

    pub fn top_rated(&self, page: i64) -> Result<Vec<Movie>, Error> {
        self.get(FetchKind::TopRated, page)
    }

    pub fn upcoming(&self, page: i64) -> Result<Vec<Movie>, Error> {
        self.get(FetchKind::Upcoming, page)
    }

    fn get(&self, kind: FetchKind, page: i64) -> Result<Vec<Movie>, Error> {
        let http = self.http.as_ref().ok_or(Error::Closed)?;
        let url = format!("{}{}", self.base_url, kind.path());
        let page_param = page.to_string();
        debug!(%url, page, "requesting movies");

        let response = http
            .get(&url)
            .bearer_auth(&self.config.token)
            .header(ACCEPT, "application/json")
            .query(&[("language", "en"), ("page", page_param.as_str())])
            .send()
            .map_err(Error::Transport)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(Error::Transport)?;
        if self.config.debug {
            debug!(status, %body, "raw response");
        } else {
            debug!(status, bytes = body.len(), "response received");
        }

        parse_movies(status, &body)
    }
}

impl MovieSource for ApiClient {
    fn movies(&self, kind: FetchKind, page: i64) -> Result<Vec<Movie>, Error> {
        self.get(kind, page)
    }

    fn close(&mut self) -> Result<(), Error> {
        // Dropping the client tears down its pool and background runtime.
        match self.http.take() {
            Some(http) => {
                drop(http);
                debug!("client connections released");
                Ok(())
            }
            None => Err(Error::Closed),
        }
    }
}

/// Map an HTTP status and body to movies or a classified error.
pub fn parse_movies(status: u16, body: &str) -> Result<Vec<Movie>, Error> {
    if status != 200 {
        // Only a JSON object counts as an error reply; absent fields stay empty.
        let reply = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .filter(serde_json::Value::is_object)
            .and_then(|value| serde_json::from_value::<ErrorReply>(value).ok())
            .unwrap_or_else(ErrorReply::unexpected);
        let message = if reply.status_code == OUT_OF_RANGE_CODE {
            "Page number out of range.".to_string()
        } else {
            reply.status_message
        };
        return Err(Error::Response {
            status,
            code: reply.status_code,
            message,
        });
    }
    let page: MoviePage = serde_json::from_str(body).map_err(Error::Decode)?;
    Ok(page.results)
}
