use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display};

/// Sentinel the provider uses for "no value"
pub const NOT_AVAILABLE: &str = "N/A";

/// Review sources a score can be stored under
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RatingSource {
    #[serde(rename = "imdb")]
    Imdb,
    #[serde(rename = "rotten_toms")]
    RottenTomatoes,
    #[serde(rename = "metacritic")]
    Metacritic,
}

impl RatingSource {
    /// Maps the provider's source label to a rating source
    pub fn from_provider(label: &str) -> Option<Self> {
        match label {
            "Internet Movie Database" => Some(Self::Imdb),
            "Rotten Tomatoes" => Some(Self::RottenTomatoes),
            "Metacritic" => Some(Self::Metacritic),
            _ => None,
        }
    }

    /// Storage representation, also used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imdb => "imdb",
            Self::RottenTomatoes => "rotten_toms",
            Self::Metacritic => "metacritic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "imdb" => Some(Self::Imdb),
            "rotten_toms" => Some(Self::RottenTomatoes),
            "metacritic" => Some(Self::Metacritic),
            _ => None,
        }
    }

    /// Extracts a 0-100 score from the provider's value string.
    ///
    /// IMDB reports "6.5/10", Metacritic "76/100", Rotten Tomatoes "91%".
    /// Returns `None` when the value does not parse or lands outside 0..=100.
    pub fn extract_score(&self, value: &str) -> Option<i32> {
        let value = value.trim();
        let score = match self {
            Self::Imdb => {
                let (numerator, _) = value.split_once('/')?;
                let parsed: f64 = numerator.trim().parse().ok()?;
                if !parsed.is_finite() {
                    return None;
                }
                (parsed * 10.0).round() as i64
            }
            Self::Metacritic => {
                let (numerator, _) = value.split_once('/')?;
                numerator.trim().parse::<i64>().ok()?
            }
            Self::RottenTomatoes => value.strip_suffix('%')?.trim().parse::<i64>().ok()?,
        };

        if (0..=100).contains(&score) {
            Some(score as i32)
        } else {
            None
        }
    }
}

impl Display for RatingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validated, typed output of normalizing one provider record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMovie {
    pub imdb_id: String,
    pub title: String,
    pub rated: Option<String>,
    pub released: Option<NaiveDate>,
    pub runtime: Option<i32>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub actors: Option<String>,
    pub writer: Option<String>,
    pub plot: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub poster_url: Option<String>,
    pub ratings: BTreeMap<RatingSource, i32>,
}

impl NormalizedMovie {
    pub fn genre_names(&self) -> Vec<String> {
        split_names(self.genre.as_deref())
    }

    pub fn director_names(&self) -> Vec<String> {
        split_names(self.director.as_deref())
    }

    pub fn actor_names(&self) -> Vec<String> {
        split_names(self.actors.as_deref())
    }
}

/// Splits a provider "A, B, C" list into trimmed names, ignoring blanks and "N/A"
pub fn split_names(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != NOT_AVAILABLE)
        .map(str::to_string)
        .collect()
}

/// A movie ready to be persisted. Built only from content-validated records.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub imdb_id: String,
    /// Assigned by the store at creation when absent
    pub slug: Option<String>,
    pub title: String,
    pub rated: Option<String>,
    pub released: NaiveDate,
    pub runtime: Option<i32>,
    pub writer: Option<String>,
    pub plot: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub poster_url: String,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub actors: Vec<String>,
    pub ratings: BTreeMap<RatingSource, i32>,
}

impl TryFrom<NormalizedMovie> for NewMovie {
    type Error = String;

    fn try_from(movie: NormalizedMovie) -> Result<Self, Self::Error> {
        let released = movie
            .released
            .ok_or_else(|| format!("{} has no release date", movie.imdb_id))?;

        Ok(Self {
            genres: movie.genre_names(),
            directors: movie.director_names(),
            actors: movie.actor_names(),
            imdb_id: movie.imdb_id,
            slug: None,
            title: movie.title,
            rated: movie.rated,
            released,
            runtime: movie.runtime,
            writer: movie.writer,
            plot: movie.plot,
            language: movie.language,
            country: movie.country,
            poster_url: movie.poster_url.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ratings: movie.ratings,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Actor or director
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Person {
    pub id: i64,
    pub name: String,
}

/// Where a movie can be watched on demand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OnDemand {
    pub id: i64,
    pub service: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub source: RatingSource,
    pub score: i32,
}

/// A stored movie with all of its related rows loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub imdb_id: String,
    pub slug: String,
    pub title: String,
    pub rated: Option<String>,
    pub released: NaiveDate,
    pub runtime: Option<i32>,
    pub writer: Option<String>,
    pub plot: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub poster_url: String,
    pub genres: Vec<Genre>,
    pub directors: Vec<Person>,
    pub actors: Vec<Person>,
    pub on_demand: Vec<OnDemand>,
    pub reviews: Vec<Review>,
}

impl Movie {
    /// Mean of the stored review scores, `None` when there are none
    pub fn mean_rating(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            return None;
        }
        let total: i64 = self.reviews.iter().map(|r| i64::from(r.score)).sum();
        Some(total as f64 / self.reviews.len() as f64)
    }
}

/// Read-only projection of a movie for one viewer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatedMovie {
    pub slug: String,
    pub title: String,
    pub released: NaiveDate,
    pub runtime: Option<i32>,
    pub writer: Option<String>,
    pub plot: Option<String>,
    pub country: Option<String>,
    pub poster_url: String,
    pub actors: Vec<Person>,
    pub director: Vec<Person>,
    pub genre: Vec<Genre>,
    pub ondemand: Vec<OnDemand>,
    pub reviews: Vec<Review>,
    pub avg_rating: Option<f64>,
    pub on_list: bool,
    #[serde(skip)]
    pub imdb_id: String,
}

impl RatedMovie {
    /// Projects a stored movie, computing its mean rating
    pub fn new(movie: Movie, on_list: bool) -> Self {
        let avg_rating = movie.mean_rating();
        Self {
            imdb_id: movie.imdb_id,
            slug: movie.slug,
            title: movie.title,
            released: movie.released,
            runtime: movie.runtime,
            writer: movie.writer,
            plot: movie.plot,
            country: movie.country,
            poster_url: movie.poster_url,
            actors: movie.actors,
            director: movie.directors,
            genre: movie.genres,
            ondemand: movie.on_demand,
            reviews: movie.reviews,
            avg_rating,
            on_list,
        }
    }
}

/// Genre with the number of movies tagged with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct GenreCount {
    pub id: i64,
    pub name: String,
    pub movie_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_source_from_provider() {
        assert_eq!(
            RatingSource::from_provider("Internet Movie Database"),
            Some(RatingSource::Imdb)
        );
        assert_eq!(
            RatingSource::from_provider("Rotten Tomatoes"),
            Some(RatingSource::RottenTomatoes)
        );
        assert_eq!(
            RatingSource::from_provider("Metacritic"),
            Some(RatingSource::Metacritic)
        );
        assert_eq!(RatingSource::from_provider("Letterboxd"), None);
    }

    #[test]
    fn test_extract_score_imdb_rounds() {
        assert_eq!(RatingSource::Imdb.extract_score("6.5/10"), Some(65));
        assert_eq!(RatingSource::Imdb.extract_score("7.84/10"), Some(78));
        assert_eq!(RatingSource::Imdb.extract_score("10/10"), Some(100));
    }

    #[test]
    fn test_extract_score_metacritic_and_rotten_tomatoes() {
        assert_eq!(RatingSource::Metacritic.extract_score("76/100"), Some(76));
        assert_eq!(RatingSource::RottenTomatoes.extract_score("91%"), Some(91));
    }

    #[test]
    fn test_extract_score_out_of_range_is_discarded() {
        assert_eq!(RatingSource::Metacritic.extract_score("176/100"), None);
        assert_eq!(RatingSource::RottenTomatoes.extract_score("-1%"), None);
        assert_eq!(RatingSource::Imdb.extract_score("12/10"), None);
    }

    #[test]
    fn test_extract_score_malformed() {
        assert_eq!(RatingSource::Imdb.extract_score("N/A"), None);
        assert_eq!(RatingSource::RottenTomatoes.extract_score("91"), None);
        assert_eq!(RatingSource::Metacritic.extract_score(""), None);
        assert_eq!(RatingSource::Imdb.extract_score("NaN/10"), None);
        assert_eq!(RatingSource::Imdb.extract_score("inf/10"), None);
    }

    #[test]
    fn test_rating_source_serializes_to_storage_name() {
        let json = serde_json::to_string(&RatingSource::RottenTomatoes).unwrap();
        assert_eq!(json, "\"rotten_toms\"");
        assert_eq!(RatingSource::parse("metacritic"), Some(RatingSource::Metacritic));
    }

    #[test]
    fn test_split_names() {
        assert_eq!(
            split_names(Some("Crime, Drama,  Mystery")),
            vec!["Crime", "Drama", "Mystery"]
        );
        assert!(split_names(Some("N/A")).is_empty());
        assert!(split_names(None).is_empty());
    }

    #[test]
    fn test_mean_rating() {
        let mut movie = Movie {
            imdb_id: "tt0000001".to_string(),
            slug: "abcdefgh-tester".to_string(),
            title: "Tester".to_string(),
            rated: None,
            released: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            runtime: Some(90),
            writer: None,
            plot: None,
            language: None,
            country: None,
            poster_url: "www.poster.jpg".to_string(),
            genres: vec![],
            directors: vec![],
            actors: vec![],
            on_demand: vec![],
            reviews: vec![],
        };
        assert_eq!(movie.mean_rating(), None);

        movie.reviews = vec![
            Review { id: 1, source: RatingSource::Imdb, score: 65 },
            Review { id: 2, source: RatingSource::Metacritic, score: 75 },
        ];
        assert_eq!(movie.mean_rating(), Some(70.0));
    }
}
