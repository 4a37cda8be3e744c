use std::time::Duration;

use anyhow::Context;
use futures::future::join_all;
use jiff::{ToSpan, civil::Date};
use tracing::{debug, info, warn};
use wreq::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::{
    clip::Clip,
    codes,
    config::Config,
    error::{Error, Result},
    kobis::KobisClient,
    locations::{CodeTable, LocationResolver},
    lotte,
    models::{Chain, DetailIndex, DetailRecord},
    normalize::{ScheduleFilter, normalize},
    raw::RawSchedule,
    render::RenderStyle,
    scraper,
};

/// Entry point for showtime queries: one HTTP client and resolver shared by
/// every chain, plus the KOBIS client used for enrichment.
pub struct ShowtimeClient {
    http: wreq::Client,
    resolver: LocationResolver,
    kobis: KobisClient,
    days_ahead: u8,
}

/// Chains are merged in [`Chain::ALL`] order; chains that failed are listed
/// instead of aborting the whole query.
#[derive(Debug)]
pub struct AggregateResult {
    pub clip: Clip,
    pub failures: Vec<(Chain, Error)>,
}

impl ShowtimeClient {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("USER_AGENT is not a valid header value")?,
        );
        let http = wreq::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("building HTTP client")?;

        let resolver = match &config.code_table_dir {
            Some(dir) => LocationResolver::load_dir(dir)
                .with_context(|| format!("loading code tables from {}", dir.display()))?,
            None => LocationResolver::packaged().context("loading packaged code tables")?,
        };

        let kobis = KobisClient::new(
            http.clone(),
            config.kobis_api_key.clone(),
            config.kobis_base_url.clone(),
            config.kobis_rps,
        );

        Ok(Self::new(http, resolver, kobis, config.schedule_days_ahead))
    }

    pub fn new(http: wreq::Client, resolver: LocationResolver, kobis: KobisClient, days_ahead: u8) -> Self {
        Self { http, resolver, kobis, days_ahead: days_ahead.max(1) }
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub async fn cgv(&self, location: &str, day: Option<u8>, title: Option<&str>) -> Result<Clip> {
        self.query(Chain::Cgv, location, day, title).await
    }

    pub async fn lotci(&self, location: &str, day: Option<u8>, title: Option<&str>) -> Result<Clip> {
        self.query(Chain::Lotte, location, day, title).await
    }

    pub async fn megabox(&self, location: &str, day: Option<u8>, title: Option<&str>) -> Result<Clip> {
        self.query(Chain::Megabox, location, day, title).await
    }

    /// Resolve, fetch and normalize one chain's schedule for `location`.
    pub async fn query(
        &self,
        chain: Chain,
        location: &str,
        day: Option<u8>,
        title: Option<&str>,
    ) -> Result<Clip> {
        let (name, code) = self.resolver.resolve_entry(chain, location)?;
        let today = jiff::Zoned::now().date();
        let (date, offset) = resolve_play_date(today, day, self.days_ahead)?;
        debug!(chain = %chain, location = %location, theater = %name, code = %code, date = %date, "querying showtimes");

        let raw = match chain {
            Chain::Cgv => RawSchedule::Cgv(scraper::fetch_cgv(&self.http, code, name, date).await?),
            Chain::Lotte => RawSchedule::Lotte(lotte::fetch_lotte(&self.http, code, date).await?),
            Chain::Megabox => {
                RawSchedule::Megabox(scraper::fetch_megabox(&self.http, code, name, date, offset).await?)
            },
        };
        if raw.is_empty() {
            info!(chain = %chain, theater = %name, date = %date, "no screenings published");
        }

        let filter = ScheduleFilter::new(Some(date.day() as u8), title);
        Ok(normalize(&raw, &filter))
    }

    /// Queries every chain concurrently for the same location name.
    pub async fn aggregate(&self, location: &str, day: Option<u8>, title: Option<&str>) -> AggregateResult {
        let results = join_all(Chain::ALL.map(|chain| self.query(chain, location, day, title))).await;

        let mut clips = Vec::new();
        let mut failures = Vec::new();
        for (chain, result) in Chain::ALL.into_iter().zip(results) {
            match result {
                Ok(clip) => clips.push(clip),
                Err(err) => {
                    warn!(chain = %chain, location = %location, error = %err, "chain query failed");
                    failures.push((chain, err));
                },
            }
        }

        let clip = Clip::merge_all(&clips);
        debug!(movies = clip.len(), showtimes = clip.showtime_count(), failed = failures.len(), "aggregated showtimes");
        AggregateResult { clip, failures }
    }

    pub fn available_locations(&self, chain: Chain) -> Vec<String> {
        self.resolver.available_locations(chain)
    }

    pub async fn get_detail(
        &self,
        items: Option<u32>,
        start_year: Option<i16>,
        end_year: Option<i16>,
    ) -> Result<DetailIndex> {
        self.kobis.get_detail(items, start_year, end_year).await
    }

    pub async fn lookup_detail(&self, title: &str) -> Result<DetailRecord> {
        self.kobis.lookup(title, None, None, None).await
    }

    /// Fetches a fresh table from the chain's theater directory. The resolver
    /// in use is not modified.
    pub async fn refresh_code_table(&self, chain: Chain) -> Result<CodeTable> {
        codes::refresh_code_table(&self.http, chain).await
    }

    /// Renders with registry details when the registry answers, plain otherwise.
    pub async fn render(&self, clip: &Clip, style: RenderStyle) -> String {
        if clip.is_empty() || !self.kobis.is_enabled() {
            return clip.render_with(None, style);
        }
        match self.get_detail(None, None, None).await {
            Ok(details) => clip.render_with(Some(&details), style),
            Err(err) => {
                warn!(error = %err, "rendering without movie details");
                clip.render_with(None, style)
            },
        }
    }
}

/// Maps a day of month onto the chains' published window starting at `today`.
/// Returns the play date and its distance from today in days.
pub fn resolve_play_date(today: Date, day: Option<u8>, days_ahead: u8) -> Result<(Date, i64)> {
    let Some(day) = day else { return Ok((today, 0)) };
    if !(1..=31).contains(&day) {
        return Err(Error::InvalidDate(day));
    }

    today
        .series(1.day())
        .take(usize::from(days_ahead.max(1)))
        .enumerate()
        .find(|(_, d)| d.day() as u8 == day)
        .map(|(offset, d)| (d, offset as i64))
        .ok_or(Error::DateUnavailable(day))
}
