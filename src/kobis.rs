use std::{num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use jiff::civil::Date;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    models::{DetailIndex, DetailRecord},
};

pub const DEFAULT_MAX_ITEMS: u32 = 100;

/// Client for the KOBIS (Korean Film Council) open API movie list.
pub struct KobisClient {
    client: wreq::Client,
    api_key: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

/// One registry row, before grouping by title.
#[derive(Clone, Debug, PartialEq)]
pub struct RegistryEntry {
    pub title: String,
    pub title_en: String,
    pub directors: Vec<String>,
    pub genre: String,
    pub nationality: String,
    pub open_date: Option<Date>,
}

#[derive(Clone, Debug, Default)]
pub struct MovieQuery<'a> {
    pub title: Option<&'a str>,
    pub start_year: Option<i16>,
    pub end_year: Option<i16>,
    pub max_items: Option<u32>,
}

impl KobisClient {
    pub fn new(client: wreq::Client, api_key: String, base_url: String, rps: u32) -> Self {
        if api_key.trim().is_empty() {
            warn!("no KOBIS_API_KEY provided, movie details are disabled");
        }

        let quota = Quota::per_second(NonZeroU32::new(rps.max(1)).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        Self { client, api_key, base_url, limiter }
    }

    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub async fn search_movies(&self, query: &MovieQuery<'_>) -> Result<Vec<RegistryEntry>> {
        if !self.is_enabled() {
            return Err(Error::RegistryUnavailable("no API key configured".into()));
        }

        let current_year = jiff::Zoned::now().year();
        let (start_year, end_year) = year_window(current_year, query.start_year, query.end_year);
        let items = query.max_items.unwrap_or(DEFAULT_MAX_ITEMS);

        let mut params = vec![
            ("key", self.api_key.clone()),
            ("openStartDt", start_year.to_string()),
            ("openEndDt", end_year.to_string()),
            ("itemPerPage", items.to_string()),
        ];
        if let Some(title) = query.title {
            params.push(("movieNm", title.to_string()));
        }

        self.limiter.until_ready().await;

        debug!(start_year = start_year, end_year = end_year, items = items, title = ?query.title, "querying KOBIS");
        let url = format!("{}/movie/searchMovieList.json", self.base_url.trim_end_matches('/'));
        let resp: SearchResponse = self
            .client
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(registry_error)?
            .error_for_status()
            .map_err(registry_error)?
            .json()
            .await
            .map_err(registry_error)?;

        if let Some(fault) = resp.fault_info {
            return Err(Error::RegistryUnavailable(fault.message));
        }
        let list = resp.movie_list_result.map(|r| r.movie_list).unwrap_or_default();
        debug!(entries = list.len(), "fetched KOBIS movie list");

        Ok(list.into_iter().map(RegistryEntry::from).collect())
    }

    /// Title to detail index for the window; see [`index_entries`].
    pub async fn get_detail(
        &self,
        items: Option<u32>,
        start_year: Option<i16>,
        end_year: Option<i16>,
    ) -> Result<DetailIndex> {
        let query = MovieQuery { title: None, start_year, end_year, max_items: items };
        Ok(index_entries(self.search_movies(&query).await?))
    }

    pub async fn lookup(
        &self,
        title: &str,
        start_year: Option<i16>,
        end_year: Option<i16>,
        max_items: Option<u32>,
    ) -> Result<DetailRecord> {
        let query = MovieQuery { title: Some(title), start_year, end_year, max_items };
        let entries = self.search_movies(&query).await?;
        index_entries(entries).remove(title).ok_or_else(|| Error::NotFound(title.to_string()))
    }
}

fn registry_error(err: wreq::Error) -> Error {
    Error::RegistryUnavailable(err.to_string())
}

/// Defaults to the year before `current_year` through `current_year`.
fn year_window(current_year: i16, start: Option<i16>, end: Option<i16>) -> (i16, i16) {
    match (start, end) {
        (Some(s), Some(e)) => (s, e),
        (Some(s), None) => (s, current_year),
        (None, Some(e)) => (e - 1, e),
        (None, None) => (current_year - 1, current_year),
    }
}

/// Groups entries by exact Korean title. When titles collide (remakes,
/// re-releases) the latest open date wins, a dated entry beats an undated one,
/// and equal dates keep the entry listed first.
pub fn index_entries(entries: impl IntoIterator<Item = RegistryEntry>) -> DetailIndex {
    let mut index = DetailIndex::new();
    for entry in entries {
        if let Some(existing) = index.get(&entry.title)
            && existing.open_date >= entry.open_date
        {
            continue;
        }
        let record = DetailRecord {
            title_en: entry.title_en,
            directors: entry.directors.join(", "),
            genre: entry.genre,
            nationality: entry.nationality,
            open_date: entry.open_date,
        };
        index.insert(entry.title, record);
    }
    index
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    movie_list_result: Option<MovieListResult>,
    fault_info: Option<FaultInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovieListResult {
    #[serde(default)]
    movie_list: Vec<KobisMovie>,
}

#[derive(Debug, Deserialize)]
struct FaultInfo {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KobisMovie {
    movie_nm: String,
    #[serde(default)]
    movie_nm_en: String,
    #[serde(default)]
    open_dt: String,
    #[serde(default)]
    genre_alt: String,
    #[serde(default)]
    rep_nation_nm: String,
    #[serde(default)]
    directors: Vec<KobisPerson>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KobisPerson {
    people_nm: String,
}

impl From<KobisMovie> for RegistryEntry {
    fn from(m: KobisMovie) -> Self {
        let open_date = match m.open_dt.trim() {
            "" => None,
            s => Date::strptime("%Y%m%d", s).ok(),
        };
        Self {
            title: m.movie_nm,
            title_en: m.movie_nm_en,
            directors: m.directors.into_iter().map(|d| d.people_nm).collect(),
            genre: m.genre_alt,
            nationality: m.rep_nation_nm,
            open_date,
        }
    }
}
