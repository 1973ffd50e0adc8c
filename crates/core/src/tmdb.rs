//! Client for the remote movie metadata API.
//!
//! The favorites core never calls this; screens use it to find movies and
//! hand the results to the toggle controls.

use std::fmt;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use crate::{
    config::AppConfig,
    models::{Credits, MovieDetails, MovieId, SearchPage},
};

/// Country whose certification is preferred.
pub const DEFAULT_CERTIFICATION_COUNTRY: &str = "US";

/// Time window for trending lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendingWindow {
    /// Trending today.
    #[default]
    Day,
    /// Trending this week.
    Week,
}

impl TrendingWindow {
    fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

impl fmt::Display for TrendingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Release dates grouped by country.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseDates {
    /// One entry per country.
    #[serde(default)]
    pub results: Vec<CountryReleases>,
}

/// Releases in one country.
#[derive(Debug, Clone, Deserialize)]
pub struct CountryReleases {
    /// ISO 3166-1 country code.
    pub iso_3166_1: String,
    /// Individual releases.
    #[serde(default)]
    pub release_dates: Vec<Release>,
}

/// A single release.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Age certification, possibly empty.
    #[serde(default)]
    pub certification: String,
}

impl ReleaseDates {
    /// First non-empty certification in `country`, else the first country
    /// whose first release carries one.
    pub fn certification(&self, country: &str) -> Option<&str> {
        let preferred = self
            .results
            .iter()
            .find(|entry| entry.iso_3166_1.eq_ignore_ascii_case(country))
            .and_then(|entry| {
                entry
                    .release_dates
                    .iter()
                    .map(|release| release.certification.trim())
                    .find(|cert| !cert.is_empty())
            });

        preferred.or_else(|| {
            self.results.iter().find_map(|entry| {
                entry
                    .release_dates
                    .first()
                    .map(|release| release.certification.trim())
                    .filter(|cert| !cert.is_empty())
            })
        })
    }
}

/// Minimum viewer age implied by a certification label.
pub fn certification_to_age(certification: &str) -> Option<u8> {
    let cert = certification.trim().to_ascii_uppercase();
    match cert.as_str() {
        "" => None,
        "G" => Some(0),
        "PG" => Some(10),
        "PG-13" => Some(13),
        "R" => Some(17),
        "NC-17" => Some(18),
        _ => {
            let digits: String = cert
                .chars()
                .skip_while(|ch| !ch.is_ascii_digit())
                .take_while(|ch| ch.is_ascii_digit())
                .take(2)
                .collect();
            digits.parse().ok()
        }
    }
}

/// Async HTTP client for the metadata API.
#[derive(Clone)]
pub struct TmdbClient {
    http: Client,
    base_url: String,
    api_token: Option<String>,
    api_key: Option<String>,
    language: String,
}

impl TmdbClient {
    /// Build a client from configuration.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        })
    }

    /// Search movies by title.
    ///
    /// A blank query yields an empty page without a request.
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        language: Option<&str>,
    ) -> Result<SearchPage> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchPage::empty());
        }
        let language = language.unwrap_or(&self.language);
        self.get(
            "search/movie",
            &[
                ("query", query.to_string()),
                ("include_adult", "false".to_string()),
                ("language", language.to_string()),
                ("page", page.max(1).to_string()),
            ],
        )
        .await
    }

    /// Like [`search`](Self::search), substituting an empty page on failure.
    pub async fn search_or_empty(
        &self,
        query: &str,
        page: u32,
        language: Option<&str>,
    ) -> SearchPage {
        match self.search(query, page, language).await {
            Ok(results) => results,
            Err(err) => {
                warn!("search for {query:?} failed: {err:#}");
                SearchPage::empty()
            }
        }
    }

    /// Trending movies.
    pub async fn trending(&self, window: TrendingWindow) -> Result<SearchPage> {
        self.get(
            &format!("trending/movie/{window}"),
            &[("language", self.language.clone()), ("page", "1".to_string())],
        )
        .await
    }

    /// Movies currently in theatres.
    pub async fn now_playing(&self, page: u32) -> Result<SearchPage> {
        self.get(
            "movie/now_playing",
            &[("language", self.language.clone()), ("page", page.max(1).to_string())],
        )
        .await
    }

    /// Full record for one movie.
    pub async fn details(&self, id: MovieId) -> Result<MovieDetails> {
        self.get(&format!("movie/{id}"), &[("language", self.language.clone())])
            .await
    }

    /// Cast list for one movie.
    pub async fn credits(&self, id: MovieId) -> Result<Credits> {
        self.get(
            &format!("movie/{id}/credits"),
            &[("language", self.language.clone())],
        )
        .await
    }

    /// Release dates per country.
    pub async fn release_dates(&self, id: MovieId) -> Result<ReleaseDates> {
        self.get(&format!("movie/{id}/release_dates"), &[]).await
    }

    /// Certification for `country`, falling back to any country.
    pub async fn release_certification(
        &self,
        id: MovieId,
        country: &str,
    ) -> Result<Option<String>> {
        let releases = self.release_dates(id).await?;
        Ok(releases.certification(country).map(str::to_string))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("GET {url}");

        let mut request = self.http.get(&url).query(params);
        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key)]);
        }
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("{url} returned an error status"))?;
        response
            .json::<T>()
            .await
            .with_context(|| format!("failed to decode response from {url}"))
    }
}
