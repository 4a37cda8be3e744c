use std::path::PathBuf;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub kobis_api_key: String,
    pub kobis_base_url: String,
    pub kobis_rps: u32,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    /// Days of schedule the chains publish, today included.
    pub schedule_days_ahead: u8,
    pub code_table_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kobis_api_key: String::new(),
            kobis_base_url: "http://www.kobis.or.kr/kobisopenapi/webservice/rest".to_string(),
            kobis_rps: 4,
            http_timeout_secs: 30,
            user_agent: "kr-showtimes/0.1".to_string(),
            schedule_days_ahead: 6,
            code_table_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let kobis_api_key = std::env::var("KOBIS_API_KEY").unwrap_or_default();
        let kobis_base_url =
            std::env::var("KOBIS_BASE_URL").unwrap_or_else(|_| defaults.kobis_base_url.clone());

        let kobis_rps: u32 =
            std::env::var("KOBIS_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(defaults.kobis_rps);

        let http_timeout_secs: u64 = match std::env::var("HTTP_TIMEOUT_SECS") {
            Ok(s) => s.parse().context("HTTP_TIMEOUT_SECS")?,
            Err(_) => defaults.http_timeout_secs,
        };

        let user_agent = std::env::var("USER_AGENT").unwrap_or_else(|_| defaults.user_agent.clone());

        let schedule_days_ahead: u8 = match std::env::var("SCHEDULE_DAYS_AHEAD") {
            Ok(s) => s.parse().context("SCHEDULE_DAYS_AHEAD")?,
            Err(_) => defaults.schedule_days_ahead,
        };
        anyhow::ensure!(schedule_days_ahead > 0, "SCHEDULE_DAYS_AHEAD must be at least 1");

        let code_table_dir =
            std::env::var("CODE_TABLE_DIR").ok().filter(|s| !s.trim().is_empty()).map(PathBuf::from);

        Ok(Self {
            kobis_api_key,
            kobis_base_url,
            kobis_rps,
            http_timeout_secs,
            user_agent,
            schedule_days_ahead,
            code_table_dir,
        })
    }
}
