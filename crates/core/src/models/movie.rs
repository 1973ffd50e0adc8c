use serde::{Deserialize, Serialize};

use super::MovieId;

/// Movie record as returned by list endpoints (search, trending, now playing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    /// Movie identifier.
    pub id: MovieId,
    /// Localised title.
    #[serde(default)]
    pub title: Option<String>,
    /// Title in the original language.
    #[serde(default)]
    pub original_title: Option<String>,
    /// Relative poster path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Relative backdrop path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Release date.
    #[serde(default)]
    pub release_date: Option<String>,
    /// Rating on a 0–10 scale.
    #[serde(default)]
    pub vote_average: Option<f64>,
    /// Synopsis.
    #[serde(default)]
    pub overview: Option<String>,
}

impl MovieSummary {
    /// Title to show, falling back to the original title.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|value| !value.is_empty())
            .or_else(|| {
                self.original_title
                    .as_deref()
                    .filter(|value| !value.is_empty())
            })
            .unwrap_or("Untitled")
    }

    /// Video search URL for `"{title} trailer"`.
    pub fn trailer_search_url(&self) -> String {
        super::trailer_url(&format!("{} trailer", self.display_title()))
    }
}

/// One page of movie results plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Movies on this page.
    #[serde(default)]
    pub results: Vec<MovieSummary>,
    /// 1-based page number.
    #[serde(default = "first_page")]
    pub page: u32,
    /// Total number of pages available.
    #[serde(default = "first_page")]
    pub total_pages: u32,
}

impl SearchPage {
    /// The substitute page used for empty queries and failed requests.
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            page: 1,
            total_pages: 1,
        }
    }

    /// Whether a following page exists.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

impl Default for SearchPage {
    fn default() -> Self {
        Self::empty()
    }
}

fn first_page() -> u32 {
    1
}

/// Genre tag attached to movie details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    /// Genre identifier.
    pub id: u64,
    /// Genre name.
    pub name: String,
}

/// Full movie record from the details endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    /// Summary attributes shared with list endpoints.
    #[serde(flatten)]
    pub summary: MovieSummary,
    /// Genres, most relevant first.
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Runtime in minutes.
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Short tagline.
    #[serde(default)]
    pub tagline: Option<String>,
}

impl MovieDetails {
    /// First listed genre.
    pub fn main_genre(&self) -> Option<&str> {
        self.genres.first().map(|genre| genre.name.as_str())
    }
}

/// Cast entry from the credits endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    /// Person identifier.
    pub id: u64,
    /// Credited name.
    #[serde(default)]
    pub name: Option<String>,
    /// Name in the original language.
    #[serde(default)]
    pub original_name: Option<String>,
    /// Character played.
    #[serde(default)]
    pub character: Option<String>,
    /// Relative profile image path.
    #[serde(default)]
    pub profile_path: Option<String>,
}

impl CastMember {
    /// Name to show, falling back to the original name.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.original_name.as_deref())
            .unwrap_or("Unknown")
    }
}

/// Credits for a movie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    /// Billed cast, in billing order.
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_trailer_search_leaves_out_the_year() {
        let summary: MovieSummary = serde_json::from_value(json!({
            "id": 603,
            "title": "The Matrix",
            "release_date": "1999-03-31"
        }))
        .unwrap();
        assert_eq!(
            summary.trailer_search_url(),
            "https://www.youtube.com/results?search_query=The+Matrix+trailer"
        );
    }

    #[test]
    fn details_flatten_summary_fields() {
        let details: MovieDetails = serde_json::from_value(json!({
            "id": 603,
            "original_title": "The Matrix",
            "poster_path": "/matrix.jpg",
            "vote_average": 8.2,
            "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
            "runtime": 136
        }))
        .unwrap();
        assert_eq!(details.summary.display_title(), "The Matrix");
        assert_eq!(details.main_genre(), Some("Action"));
        assert_eq!(details.runtime, Some(136));
    }

    #[test]
    fn search_page_defaults_pagination() {
        let page: SearchPage = serde_json::from_value(json!({"results": []})).unwrap();
        assert_eq!(page, SearchPage::empty());
        assert!(!page.has_next());
    }
}
