use serde::{Deserialize, Serialize};

// ============================================================================
// OMDB API Types
// ============================================================================

/// Raw title record returned by the OMDB API.
///
/// Every field is optional: the provider omits fields freely and uses "N/A"
/// for unknown values. Nothing here is trusted until it has been through
/// the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OmdbRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub rated: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub writer: Option<String>,
    #[serde(default)]
    pub actors: Option<String>,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub ratings: Option<Vec<OmdbRating>>,
    #[serde(default, rename = "imdbID")]
    pub imdb_id: Option<String>,
    #[serde(default, rename = "Type")]
    pub title_type: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl OmdbRecord {
    /// The provider signals "no match" with `"Response": "False"`
    pub fn is_found(&self) -> bool {
        !matches!(self.response.as_deref(), Some(r) if r.eq_ignore_ascii_case("false"))
    }
}

/// One `{ "Source": ..., "Value": ... }` pair from the `Ratings` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OmdbRating {
    pub source: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_omdb_record_deserialization() {
        let json = r#"{
            "Title": "No Sudden Move",
            "Year": "2021",
            "Rated": "R",
            "Released": "01 Jul 2021",
            "Runtime": "115 min",
            "Genre": "Crime, Drama, Mystery",
            "Director": "Steven Soderbergh",
            "Writer": "Ed Solomon",
            "Actors": "Don Cheadle, Benicio Del Toro, David Harbour",
            "Plot": "A group of criminals are brought together...",
            "Language": "English",
            "Country": "United States",
            "Poster": "https://m.media-amazon.com/images/poster.jpg",
            "Ratings": [
                {"Source": "Internet Movie Database", "Value": "6.5/10"},
                {"Source": "Rotten Tomatoes", "Value": "91%"}
            ],
            "imdbID": "tt11525644",
            "Type": "movie",
            "Response": "True"
        }"#;

        let record: OmdbRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.imdb_id.as_deref(), Some("tt11525644"));
        assert_eq!(record.title_type.as_deref(), Some("movie"));
        assert_eq!(record.runtime.as_deref(), Some("115 min"));
        assert_eq!(record.ratings.as_ref().map(Vec::len), Some(2));
        assert!(record.is_found());
    }

    #[test]
    fn test_omdb_not_found_response() {
        let json = r#"{"Response": "False", "Error": "Incorrect IMDb ID."}"#;
        let record: OmdbRecord = serde_json::from_str(json).unwrap();
        assert!(!record.is_found());
        assert_eq!(record.error.as_deref(), Some("Incorrect IMDb ID."));
        assert_eq!(record.title, None);
    }
}
