//! Turns raw OMDB records into validated, typed movie records.
//!
//! `get_data` runs the whole chain: fetch, shape check, normalization and
//! content check. Every step after the fetch is a pure function so it can be
//! tested against hand-built records.

use std::{collections::BTreeMap, sync::Arc};

use chrono::NaiveDate;

use crate::{
    error::IngestError,
    models::{NormalizedMovie, OmdbRating, OmdbRecord, RatingSource, NOT_AVAILABLE},
    services::providers::MetadataProvider,
};

const RELEASED_FORMAT: &str = "%d %b %Y";

pub struct Normalizer {
    provider: Arc<dyn MetadataProvider>,
}

impl Normalizer {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self { provider }
    }

    /// Fetches and normalizes one title, rejecting incomplete records
    pub async fn get_data(&self, imdb_id: &str) -> Result<NormalizedMovie, IngestError> {
        let raw = self.provider.fetch(imdb_id).await?;

        if !validate_shape(&raw) {
            return Err(IngestError::MalformedData(format!(
                "{} is missing required fields",
                imdb_id
            )));
        }

        let normalized = normalize(&raw);

        if !validate_content(&normalized) {
            return Err(IngestError::MalformedData(format!(
                "{} has empty genre, director, plot or release date",
                imdb_id
            )));
        }

        tracing::debug!(
            imdb_id = %imdb_id,
            provider = self.provider.name(),
            ratings = normalized.ratings.len(),
            "Record normalized"
        );
        Ok(normalized)
    }
}

/// True when every field the catalog depends on is present in the record
pub fn validate_shape(raw: &OmdbRecord) -> bool {
    raw.imdb_id.is_some()
        && raw.genre.is_some()
        && raw.ratings.is_some()
        && raw.actors.is_some()
        && raw.director.is_some()
        && raw.runtime.is_some()
        && raw.released.is_some()
        && raw.plot.is_some()
}

/// Pure and total: the same record always yields the same output
pub fn normalize(raw: &OmdbRecord) -> NormalizedMovie {
    NormalizedMovie {
        imdb_id: raw.imdb_id.clone().unwrap_or_default(),
        title: raw.title.clone().unwrap_or_default(),
        rated: raw.rated.clone(),
        released: released_to_date(raw.released.as_deref()),
        runtime: runtime_to_int(raw.runtime.as_deref()),
        genre: raw.genre.clone(),
        director: raw.director.clone(),
        actors: raw.actors.clone(),
        writer: raw.writer.clone(),
        plot: raw.plot.clone(),
        language: raw.language.clone(),
        country: raw.country.clone(),
        poster_url: raw.poster.clone(),
        ratings: format_ratings(raw.ratings.as_deref().unwrap_or_default()),
    }
}

/// "115 min" -> 115. Every non-digit is dropped first.
pub fn runtime_to_int(runtime: Option<&str>) -> Option<i32> {
    let digits: String = runtime?.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Maps provider ratings to 0-100 scores keyed by source.
///
/// Unknown sources and unusable values are skipped, not fatal.
pub fn format_ratings(ratings: &[OmdbRating]) -> BTreeMap<RatingSource, i32> {
    let mut scores = BTreeMap::new();

    for rating in ratings {
        let Some(source) = RatingSource::from_provider(&rating.source) else {
            tracing::warn!(source = %rating.source, "Skipping rating from unknown source");
            continue;
        };

        match source.extract_score(&rating.value) {
            Some(score) => {
                scores.insert(source, score);
            }
            None => {
                tracing::warn!(
                    source = %source,
                    value = %rating.value,
                    "Skipping unparsable rating"
                );
            }
        }
    }

    scores
}

/// "01 Jul 2021" -> 2021-07-01; "N/A" and anything unparsable -> None
pub fn released_to_date(released: Option<&str>) -> Option<NaiveDate> {
    let released = released?.trim();
    if released == NOT_AVAILABLE {
        return None;
    }
    NaiveDate::parse_from_str(released, RELEASED_FORMAT).ok()
}

/// Genre, director, plot and release date must all carry real values
pub fn validate_content(movie: &NormalizedMovie) -> bool {
    has_value(movie.genre.as_deref())
        && has_value(movie.director.as_deref())
        && has_value(movie.plot.as_deref())
        && movie.released.is_some()
}

fn has_value(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some(v) if !v.is_empty() && v != NOT_AVAILABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockMetadataProvider;

    fn rating(source: &str, value: &str) -> OmdbRating {
        OmdbRating {
            source: source.to_string(),
            value: value.to_string(),
        }
    }

    fn complete_record() -> OmdbRecord {
        OmdbRecord {
            title: Some("No Sudden Move".to_string()),
            year: Some("2021".to_string()),
            rated: Some("R".to_string()),
            released: Some("01 Jul 2021".to_string()),
            runtime: Some("115 min".to_string()),
            genre: Some("Crime, Drama, Mystery".to_string()),
            director: Some("Steven Soderbergh".to_string()),
            writer: Some("Ed Solomon".to_string()),
            actors: Some("Don Cheadle, Benicio Del Toro, David Harbour".to_string()),
            plot: Some("A group of criminals are brought together...".to_string()),
            language: Some("English".to_string()),
            country: Some("United States".to_string()),
            poster: Some("https://m.media-amazon.com/images/poster.jpg".to_string()),
            ratings: Some(vec![
                rating("Internet Movie Database", "6.5/10"),
                rating("Rotten Tomatoes", "91%"),
                rating("Metacritic", "76/100"),
            ]),
            imdb_id: Some("tt11525644".to_string()),
            title_type: Some("movie".to_string()),
            response: Some("True".to_string()),
            error: None,
        }
    }

    #[test]
    fn test_runtime_to_int() {
        assert_eq!(runtime_to_int(Some("115 min")), Some(115));
        assert_eq!(runtime_to_int(Some("1,115 min")), Some(1115));
    }

    #[test]
    fn test_runtime_to_int_without_runtime() {
        assert_eq!(runtime_to_int(None), None);
        assert_eq!(runtime_to_int(Some("N/A")), None);
        assert_eq!(runtime_to_int(Some("99999999999 min")), None);
    }

    #[test]
    fn test_format_ratings() {
        let scores = format_ratings(&[
            rating("Internet Movie Database", "6.5/10"),
            rating("Rotten Tomatoes", "91%"),
            rating("Metacritic", "76/100"),
        ]);

        assert_eq!(scores.get(&RatingSource::Imdb), Some(&65));
        assert_eq!(scores.get(&RatingSource::RottenTomatoes), Some(&91));
        assert_eq!(scores.get(&RatingSource::Metacritic), Some(&76));
    }

    #[test]
    fn test_format_ratings_skips_bad_pairs() {
        let scores = format_ratings(&[
            rating("Letterboxd", "4/5"),
            rating("Rotten Tomatoes", "N/A"),
            rating("Metacritic", "150/100"),
            rating("Internet Movie Database", "7.0/10"),
        ]);

        assert_eq!(scores.len(), 1);
        assert_eq!(scores.get(&RatingSource::Imdb), Some(&70));
    }

    #[test]
    fn test_released_to_date() {
        assert_eq!(
            released_to_date(Some("01 Jul 2021")),
            NaiveDate::from_ymd_opt(2021, 7, 1)
        );
    }

    #[test]
    fn test_released_to_date_with_not_available() {
        assert_eq!(released_to_date(Some("N/A")), None);
        assert_eq!(released_to_date(Some("July 2021")), None);
        assert_eq!(released_to_date(None), None);
    }

    #[test]
    fn test_validate_shape() {
        assert!(validate_shape(&complete_record()));
        assert!(!validate_shape(&OmdbRecord::default()));
    }

    #[test]
    fn test_validate_shape_each_field_required() {
        let strip: [fn(&mut OmdbRecord); 8] = [
            |r| r.imdb_id = None,
            |r| r.genre = None,
            |r| r.ratings = None,
            |r| r.actors = None,
            |r| r.director = None,
            |r| r.runtime = None,
            |r| r.released = None,
            |r| r.plot = None,
        ];

        for remove in strip {
            let mut record = complete_record();
            remove(&mut record);
            assert!(!validate_shape(&record));
        }
    }

    #[test]
    fn test_validate_content() {
        assert!(validate_content(&normalize(&complete_record())));
    }

    #[test]
    fn test_validate_content_rejects_not_available() {
        let mut record = complete_record();
        record.released = Some("N/A".to_string());
        record.genre = Some("N/A".to_string());
        assert!(!validate_content(&normalize(&record)));

        let mut record = complete_record();
        record.director = Some("  ".to_string());
        assert!(!validate_content(&normalize(&record)));

        let mut record = complete_record();
        record.plot = Some("N/A".to_string());
        assert!(!validate_content(&normalize(&record)));
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let record = complete_record();
        assert_eq!(normalize(&record), normalize(&record));
    }

    #[tokio::test]
    async fn test_get_data() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_fetch().returning(|_| {
            let mut record = complete_record();
            record.runtime = Some("999 min".to_string());
            Ok(record)
        });
        provider.expect_name().return_const("mock");

        let normalizer = Normalizer::new(Arc::new(provider));
        let movie = normalizer.get_data("tt11525644").await.unwrap();

        assert_eq!(movie.runtime, Some(999));
        assert_eq!(movie.released, NaiveDate::from_ymd_opt(2021, 7, 1));
        assert_eq!(movie.ratings.len(), 3);
        assert_eq!(movie.genre_names(), vec!["Crime", "Drama", "Mystery"]);
    }

    #[tokio::test]
    async fn test_get_data_rejects_incomplete_record() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_fetch().returning(|_| {
            let mut record = complete_record();
            record.plot = None;
            Ok(record)
        });
        provider.expect_name().return_const("mock");

        let normalizer = Normalizer::new(Arc::new(provider));
        let result = normalizer.get_data("tt11525644").await;
        assert!(matches!(result, Err(IngestError::MalformedData(_))));
    }

    #[tokio::test]
    async fn test_get_data_propagates_not_found() {
        let mut provider = MockMetadataProvider::new();
        provider
            .expect_fetch()
            .returning(|id| Err(IngestError::NotFound(id.to_string())));
        provider.expect_name().return_const("mock");

        let normalizer = Normalizer::new(Arc::new(provider));
        let result = normalizer.get_data("tt0000000").await;
        assert!(matches!(result, Err(IngestError::NotFound(_))));
    }
}
