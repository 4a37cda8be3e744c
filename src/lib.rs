//! Showtime collection for the CGV, Lotte Cinema and Megabox chains, merged
//! into one [`Clip`] and optionally enriched with KOBIS film details.

pub mod clip;
pub mod codes;
pub mod config;
pub mod error;
pub mod kobis;
pub mod locations;
pub mod lotte;
pub mod models;
pub mod normalize;
pub mod query;
pub mod raw;
pub mod render;
pub mod scraper;

pub use clip::Clip;
pub use config::Config;
pub use error::{Error, Result};
pub use kobis::KobisClient;
pub use locations::{CodeTable, LocationResolver};
pub use models::{Chain, DetailIndex, DetailRecord, MovieGroup, Showtime};
pub use normalize::{ScheduleFilter, normalize};
pub use query::{AggregateResult, ShowtimeClient, resolve_play_date};
pub use raw::{RawCount, RawSchedule};
pub use render::RenderStyle;
