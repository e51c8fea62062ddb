use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    db::store::{MovieStore, WatchlistStore},
    error::{AppError, AppResult},
    models::{
        Genre, GenreCount, Movie, NewMovie, OnDemand, Person, RatingSource, Review, WatchList,
        WatchListItem,
    },
    services::slug,
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the bundled migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

const MOVIE_COLUMNS: &str = "imdb_id, slug, title, rated, released, runtime, writer, plot, \
                             language, country, poster_url";

#[derive(sqlx::FromRow)]
struct MovieRow {
    imdb_id: String,
    slug: String,
    title: String,
    rated: Option<String>,
    released: NaiveDate,
    runtime: Option<i32>,
    writer: Option<String>,
    plot: Option<String>,
    language: Option<String>,
    country: Option<String>,
    poster_url: String,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Self {
            imdb_id: row.imdb_id,
            slug: row.slug,
            title: row.title,
            rated: row.rated,
            released: row.released,
            runtime: row.runtime,
            writer: row.writer,
            plot: row.plot,
            language: row.language,
            country: row.country,
            poster_url: row.poster_url,
            genres: Vec::new(),
            directors: Vec::new(),
            actors: Vec::new(),
            on_demand: Vec::new(),
            reviews: Vec::new(),
        }
    }
}

/// Catalog and watchlist persistence on PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads related rows for the given movies in one query per relation
    async fn hydrate(&self, rows: Vec<MovieRow>) -> AppResult<Vec<Movie>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = rows.iter().map(|r| r.imdb_id.clone()).collect();
        let mut movies: Vec<Movie> = rows.into_iter().map(Movie::from).collect();
        let index: HashMap<String, usize> = movies
            .iter()
            .enumerate()
            .map(|(i, m)| (m.imdb_id.clone(), i))
            .collect();

        let genres: Vec<(String, i64, String)> = sqlx::query_as(
            "SELECT mg.movie_id, g.id, g.name FROM movie_genres mg \
             JOIN genres g ON g.id = mg.genre_id \
             WHERE mg.movie_id = ANY($1) ORDER BY g.id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (movie_id, id, name) in genres {
            if let Some(&i) = index.get(&movie_id) {
                movies[i].genres.push(Genre { id, name });
            }
        }

        let directors: Vec<(String, i64, String)> = sqlx::query_as(
            "SELECT md.movie_id, d.id, d.name FROM movie_directors md \
             JOIN directors d ON d.id = md.director_id \
             WHERE md.movie_id = ANY($1) ORDER BY d.id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (movie_id, id, name) in directors {
            if let Some(&i) = index.get(&movie_id) {
                movies[i].directors.push(Person { id, name });
            }
        }

        let actors: Vec<(String, i64, String)> = sqlx::query_as(
            "SELECT ma.movie_id, a.id, a.name FROM movie_actors ma \
             JOIN actors a ON a.id = ma.actor_id \
             WHERE ma.movie_id = ANY($1) ORDER BY a.id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (movie_id, id, name) in actors {
            if let Some(&i) = index.get(&movie_id) {
                movies[i].actors.push(Person { id, name });
            }
        }

        let reviews: Vec<(String, i64, String, i32)> = sqlx::query_as(
            "SELECT movie_id, id, source, score FROM reviews \
             WHERE movie_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (movie_id, id, source, score) in reviews {
            let Some(source) = RatingSource::parse(&source) else {
                tracing::warn!(imdb_id = %movie_id, source = %source, "Skipping review with unknown source");
                continue;
            };
            if let Some(&i) = index.get(&movie_id) {
                movies[i].reviews.push(Review { id, source, score });
            }
        }

        let on_demand: Vec<(String, i64, String, String)> = sqlx::query_as(
            "SELECT movie_id, id, service, url FROM on_demand \
             WHERE movie_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (movie_id, id, service, url) in on_demand {
            if let Some(&i) = index.get(&movie_id) {
                movies[i].on_demand.push(OnDemand { id, service, url });
            }
        }

        Ok(movies)
    }

    /// Get-or-create a named row and link it to the movie through a join table
    async fn link_named(
        tx: &mut Transaction<'_, Postgres>,
        table: &str,
        join_table: &str,
        join_column: &str,
        movie_id: &str,
        name: &str,
    ) -> AppResult<()> {
        let id: i64 = sqlx::query_scalar(&format!(
            "INSERT INTO {table} (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id"
        ))
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(&format!(
            "INSERT INTO {join_table} (movie_id, {join_column}) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING"
        ))
        .bind(movie_id)
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl MovieStore for PgStore {
    async fn all_movies(&self) -> AppResult<Vec<Movie>> {
        let rows: Vec<MovieRow> = sqlx::query_as(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY created_at, imdb_id"
        ))
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    async fn movie_by_slug(&self, slug: &str) -> AppResult<Option<Movie>> {
        let rows: Vec<MovieRow> =
            sqlx::query_as(&format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE slug = $1"))
                .bind(slug)
                .fetch_all(&self.pool)
                .await?;
        Ok(self.hydrate(rows).await?.into_iter().next())
    }

    async fn movie_by_imdb_id(&self, imdb_id: &str) -> AppResult<Option<Movie>> {
        let rows: Vec<MovieRow> =
            sqlx::query_as(&format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE imdb_id = $1"))
                .bind(imdb_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(self.hydrate(rows).await?.into_iter().next())
    }

    async fn all_slugs(&self) -> AppResult<Vec<String>> {
        let slugs = sqlx::query_scalar("SELECT slug FROM movies ORDER BY created_at, imdb_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(slugs)
    }

    async fn existing_imdb_ids(&self) -> AppResult<HashSet<String>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT imdb_id FROM movies")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn insert_movie(&self, movie: NewMovie) -> AppResult<Movie> {
        let slug = movie
            .slug
            .clone()
            .unwrap_or_else(|| slug::generate(&movie.title));

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO movies (imdb_id, slug, title, rated, released, runtime, writer, plot, \
             language, country, poster_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(&movie.imdb_id)
        .bind(&slug)
        .bind(&movie.title)
        .bind(&movie.rated)
        .bind(movie.released)
        .bind(movie.runtime)
        .bind(&movie.writer)
        .bind(&movie.plot)
        .bind(&movie.language)
        .bind(&movie.country)
        .bind(&movie.poster_url)
        .execute(&mut *tx)
        .await?;

        for name in &movie.genres {
            Self::link_named(&mut tx, "genres", "movie_genres", "genre_id", &movie.imdb_id, name)
                .await?;
        }
        for name in &movie.directors {
            Self::link_named(
                &mut tx,
                "directors",
                "movie_directors",
                "director_id",
                &movie.imdb_id,
                name,
            )
            .await?;
        }
        for name in &movie.actors {
            Self::link_named(&mut tx, "actors", "movie_actors", "actor_id", &movie.imdb_id, name)
                .await?;
        }
        for (source, score) in &movie.ratings {
            sqlx::query("INSERT INTO reviews (movie_id, source, score) VALUES ($1, $2, $3)")
                .bind(&movie.imdb_id)
                .bind(source.as_str())
                .bind(*score)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(imdb_id = %movie.imdb_id, slug = %slug, "Movie stored");

        self.movie_by_imdb_id(&movie.imdb_id).await?.ok_or_else(|| {
            AppError::Internal(format!("movie {} missing after insert", movie.imdb_id))
        })
    }

    async fn add_on_demand(
        &self,
        imdb_id: &str,
        service: &str,
        url: &str,
    ) -> AppResult<OnDemand> {
        let on_demand: OnDemand = sqlx::query_as(
            "INSERT INTO on_demand (movie_id, service, url) VALUES ($1, $2, $3) \
             RETURNING id, service, url",
        )
        .bind(imdb_id)
        .bind(service)
        .bind(url)
        .fetch_one(&self.pool)
        .await?;
        Ok(on_demand)
    }

    async fn genre_counts(&self) -> AppResult<Vec<GenreCount>> {
        let genres = sqlx::query_as(
            "SELECT g.id, g.name, COUNT(mg.movie_id) AS movie_count \
             FROM genres g LEFT JOIN movie_genres mg ON mg.genre_id = g.id \
             GROUP BY g.id, g.name \
             ORDER BY movie_count DESC, g.name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }
}

#[async_trait::async_trait]
impl WatchlistStore for PgStore {
    async fn get_or_create_list(&self, owner: Uuid, name: &str) -> AppResult<WatchList> {
        // The (owner_id, name) constraint decides the winner of concurrent creates;
        // the loser's insert is a no-op and both read the same row back.
        sqlx::query(
            "INSERT INTO watch_lists (owner_id, name) VALUES ($1, $2) \
             ON CONFLICT (owner_id, name) DO NOTHING",
        )
        .bind(owner)
        .bind(name)
        .execute(&self.pool)
        .await?;

        let list = sqlx::query_as(
            "SELECT id, owner_id, name, added, updated FROM watch_lists \
             WHERE owner_id = $1 AND name = $2",
        )
        .bind(owner)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(list)
    }

    async fn listed_imdb_ids(&self, owner: Uuid) -> AppResult<HashSet<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT i.imdb_id FROM watch_list_items i \
             JOIN watch_lists l ON l.id = i.list_id WHERE l.owner_id = $1",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn list_items(&self, list_id: i64) -> AppResult<Vec<WatchListItem>> {
        let items = sqlx::query_as(
            "SELECT uid, list_id, imdb_id, watched, added FROM watch_list_items \
             WHERE list_id = $1 ORDER BY added DESC",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn add_item(&self, list_id: i64, imdb_id: &str) -> AppResult<WatchListItem> {
        let item = sqlx::query_as(
            "INSERT INTO watch_list_items (uid, list_id, imdb_id) VALUES ($1, $2, $3) \
             RETURNING uid, list_id, imdb_id, watched, added",
        )
        .bind(Uuid::new_v4())
        .bind(list_id)
        .bind(imdb_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn owned_item(
        &self,
        owner: Uuid,
        uid: Uuid,
    ) -> AppResult<Option<(WatchList, WatchListItem)>> {
        let item: Option<WatchListItem> = sqlx::query_as(
            "SELECT i.uid, i.list_id, i.imdb_id, i.watched, i.added FROM watch_list_items i \
             JOIN watch_lists l ON l.id = i.list_id WHERE i.uid = $1 AND l.owner_id = $2",
        )
        .bind(uid)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        let Some(item) = item else {
            return Ok(None);
        };

        let list: WatchList = sqlx::query_as(
            "SELECT id, owner_id, name, added, updated FROM watch_lists WHERE id = $1",
        )
        .bind(item.list_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some((list, item)))
    }

    async fn delete_item(&self, uid: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM watch_list_items WHERE uid = $1")
            .bind(uid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
