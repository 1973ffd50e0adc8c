//! Shared domain models.

mod movie;

pub use movie::{CastMember, Credits, Genre, MovieDetails, MovieSummary, SearchPage};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier assigned by the movie-data source.
pub type MovieId = u64;

/// Snapshot of a movie captured at the moment it was favorited.
///
/// Optional attributes are omitted from the persisted JSON when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteMovie {
    /// Primary key within the favorites list.
    pub id: MovieId,
    /// Display title.
    pub title: String,
    /// Relative poster path; `None` means the placeholder image is shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    /// ISO-like release date (`YYYY-MM-DD`) or any year-bearing string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Rating on a 0–10 scale.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_rating"
    )]
    pub vote_average: Option<f64>,
    /// Synopsis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
}

impl FavoriteMovie {
    /// Release year parsed from `release_date`.
    pub fn release_year(&self) -> Option<i32> {
        let raw = self.release_date.as_deref()?.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date.year());
        }
        let prefix = raw.get(..4)?;
        if prefix.chars().all(|ch| ch.is_ascii_digit()) {
            prefix.parse().ok()
        } else {
            None
        }
    }

    /// Rating formatted as `7.5/10`.
    pub fn rating_label(&self) -> Option<String> {
        self.vote_average.map(|value| format!("{value:.1}/10"))
    }

    /// Video search URL for the movie's trailer.
    pub fn trailer_search_url(&self) -> String {
        let query = match self.release_year() {
            Some(year) => format!("{} {} trailer", self.title, year),
            None => format!("{} trailer", self.title),
        };
        trailer_url(&query)
    }
}

pub(crate) fn trailer_url(query: &str) -> String {
    reqwest::Url::parse_with_params(
        "https://www.youtube.com/results",
        &[("search_query", query)],
    )
    .map(String::from)
    .unwrap_or_else(|_| "https://www.youtube.com".to_string())
}

/// Raw payload handed to the favorites store by a toggle control.
///
/// Converting into [`FavoriteMovie`] is the single place where optional
/// attributes are normalised: blank strings and out-of-range ratings become
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FavoriteInput {
    /// Movie identifier.
    pub id: MovieId,
    /// Display title.
    pub title: String,
    /// Relative poster path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Release date.
    #[serde(default)]
    pub release_date: Option<String>,
    /// Rating.
    #[serde(default)]
    pub vote_average: Option<f64>,
    /// Synopsis.
    #[serde(default)]
    pub overview: Option<String>,
}

impl FavoriteInput {
    /// Payload carrying only the required attributes.
    pub fn new(id: MovieId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Self::default()
        }
    }
}

impl From<FavoriteInput> for FavoriteMovie {
    fn from(input: FavoriteInput) -> Self {
        Self {
            id: input.id,
            title: input.title,
            poster_path: non_blank(input.poster_path),
            release_date: non_blank(input.release_date),
            vote_average: input
                .vote_average
                .filter(|value| value.is_finite() && (0.0..=10.0).contains(value)),
            overview: non_blank(input.overview),
        }
    }
}

impl From<&FavoriteMovie> for FavoriteInput {
    fn from(movie: &FavoriteMovie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            release_date: movie.release_date.clone(),
            vote_average: movie.vote_average,
            overview: movie.overview.clone(),
        }
    }
}

impl From<&MovieSummary> for FavoriteInput {
    fn from(movie: &MovieSummary) -> Self {
        Self {
            id: movie.id,
            title: movie.display_title().to_string(),
            poster_path: movie.poster_path.clone(),
            release_date: movie.release_date.clone(),
            vote_average: movie.vote_average,
            overview: movie.overview.clone(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

// Older clients persisted the rating as a string.
fn deserialize_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(value)) => Some(value),
        Some(Raw::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_fields_are_omitted_when_serialised() {
        let movie = FavoriteMovie::from(FavoriteInput::new(1, "Alpha"));
        let value = serde_json::to_value(&movie).unwrap();
        assert_eq!(value, json!({"id": 1, "title": "Alpha"}));
    }

    #[test]
    fn normalisation_drops_blank_and_invalid_fields() {
        let input = FavoriteInput {
            id: 7,
            title: "Seven".to_string(),
            poster_path: Some("   ".to_string()),
            release_date: Some(String::new()),
            vote_average: Some(f64::NAN),
            overview: Some("Detectives".to_string()),
        };
        let movie = FavoriteMovie::from(input);
        assert_eq!(movie.poster_path, None);
        assert_eq!(movie.release_date, None);
        assert_eq!(movie.vote_average, None);
        assert_eq!(movie.overview.as_deref(), Some("Detectives"));

        let out_of_range = FavoriteInput {
            vote_average: Some(11.0),
            ..FavoriteInput::new(8, "Eight")
        };
        assert_eq!(FavoriteMovie::from(out_of_range).vote_average, None);
    }

    #[test]
    fn tolerates_nulls_and_string_ratings() {
        let movie: FavoriteMovie = serde_json::from_value(json!({
            "id": 3,
            "title": "Gamma",
            "poster_path": null,
            "vote_average": "7.25"
        }))
        .unwrap();
        assert_eq!(movie.poster_path, None);
        assert_eq!(movie.vote_average, Some(7.25));

        let movie: FavoriteMovie =
            serde_json::from_value(json!({"id": 4, "title": "Delta", "vote_average": "n/a"}))
                .unwrap();
        assert_eq!(movie.vote_average, None);
    }

    #[test]
    fn release_year_handles_dates_and_prefixes() {
        let mut movie = FavoriteMovie::from(FavoriteInput::new(1, "Alpha"));
        assert_eq!(movie.release_year(), None);

        movie.release_date = Some("1999-03-31".to_string());
        assert_eq!(movie.release_year(), Some(1999));

        movie.release_date = Some("2004".to_string());
        assert_eq!(movie.release_year(), Some(2004));

        movie.release_date = Some("soon".to_string());
        assert_eq!(movie.release_year(), None);
    }

    #[test]
    fn labels_and_trailer_links() {
        let movie = FavoriteMovie::from(FavoriteInput {
            release_date: Some("1999-03-31".to_string()),
            vote_average: Some(8.7),
            ..FavoriteInput::new(603, "The Matrix")
        });
        assert_eq!(movie.rating_label().as_deref(), Some("8.7/10"));
        assert_eq!(
            movie.trailer_search_url(),
            "https://www.youtube.com/results?search_query=The+Matrix+1999+trailer"
        );
    }
}
