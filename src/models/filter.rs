use crate::error::{AppError, AppResult};

/// Query parameters accepted by the movie listing endpoint
#[derive(Debug, Default, Clone)]
pub struct MovieQuery {
    /// Comma-separated genre ids
    pub g: Option<String>,
    pub dmin: Option<String>,
    pub dmax: Option<String>,
    pub rmin: Option<String>,
    pub rmax: Option<String>,
}

/// Builds the query from raw key/value pairs.
///
/// `g` may repeat (`?g=1&g=2`) and each occurrence is merged with the
/// comma-separated form. Other keys keep their last value; unknown keys are
/// ignored.
impl FromIterator<(String, String)> for MovieQuery {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "g" => {
                    query.g = Some(match query.g.take() {
                        Some(ids) => format!("{},{}", ids, value),
                        None => value,
                    })
                }
                "dmin" => query.dmin = Some(value),
                "dmax" => query.dmax = Some(value),
                "rmin" => query.rmin = Some(value),
                "rmax" => query.rmax = Some(value),
                _ => {}
            }
        }
        query
    }
}

/// One end of a decade range: a 4-digit year or "pre" (before the 1960s)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecadeBound {
    Pre,
    Year(u16),
}

impl DecadeBound {
    pub fn parse(field: &str, value: &str) -> AppResult<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("pre") {
            return Ok(Self::Pre);
        }
        if value.len() == 4 && value.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(year) = value.parse::<u16>() {
                if year >= 1000 {
                    return Ok(Self::Year(year));
                }
            }
        }
        Err(AppError::validation(
            field,
            format!("expected a 4-digit year or \"pre\", got \"{}\"", value),
        ))
    }
}

/// One end of a runtime range: exact minutes, or an open-ended "<N" / ">N"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeBound {
    Minutes(u32),
    Below(u32),
    Above(u32),
}

impl RuntimeBound {
    pub fn parse(field: &str, value: &str) -> AppResult<Self> {
        let value = value.trim();
        let (ctor, digits): (fn(u32) -> Self, &str) = if let Some(rest) = value.strip_prefix('<') {
            (Self::Below, rest)
        } else if let Some(rest) = value.strip_prefix('>') {
            (Self::Above, rest)
        } else {
            (Self::Minutes, value)
        };

        digits.trim().parse::<u32>().map(ctor).map_err(|_| {
            AppError::validation(
                field,
                format!("expected minutes, \"<N\" or \">N\", got \"{}\"", value),
            )
        })
    }
}

/// Request-scoped filters for the catalog listing.
///
/// A range only takes effect when both of its bounds were supplied.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub genres: Vec<i64>,
    pub decades: Option<(DecadeBound, DecadeBound)>,
    pub runtimes: Option<(RuntimeBound, RuntimeBound)>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.genres.is_empty() && self.decades.is_none() && self.runtimes.is_none()
    }
}

impl TryFrom<MovieQuery> for FilterCriteria {
    type Error = AppError;

    fn try_from(query: MovieQuery) -> AppResult<Self> {
        let genres = match query.g.as_deref().map(str::trim) {
            Some(ids) if !ids.is_empty() => ids
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| {
                    id.parse::<i64>().map_err(|_| {
                        AppError::validation("g", format!("\"{}\" is not a genre id", id))
                    })
                })
                .collect::<AppResult<Vec<_>>>()?,
            _ => Vec::new(),
        };

        let dmin = non_blank(query.dmin.as_deref())
            .map(|v| DecadeBound::parse("dmin", v))
            .transpose()?;
        let dmax = non_blank(query.dmax.as_deref())
            .map(|v| DecadeBound::parse("dmax", v))
            .transpose()?;
        let rmin = non_blank(query.rmin.as_deref())
            .map(|v| RuntimeBound::parse("rmin", v))
            .transpose()?;
        let rmax = non_blank(query.rmax.as_deref())
            .map(|v| RuntimeBound::parse("rmax", v))
            .transpose()?;

        Ok(Self {
            genres,
            decades: dmin.zip(dmax),
            runtimes: rmin.zip(rmax),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
