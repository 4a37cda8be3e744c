use std::{fmt, str::FromStr};

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Upstream cinema chain. The wire ids (`cgv`, `lotci`, `megabox`) name the
/// code tables and the query entry points.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Cgv,
    #[serde(rename = "lotci")]
    Lotte,
    Megabox,
}

impl Chain {
    pub const ALL: [Chain; 3] = [Chain::Cgv, Chain::Lotte, Chain::Megabox];

    pub fn as_str(self) -> &'static str {
        match self {
            Chain::Cgv => "cgv",
            Chain::Lotte => "lotci",
            Chain::Megabox => "megabox",
        }
    }

    /// Brand label used as the `cinema_info` prefix.
    pub fn label(self) -> &'static str {
        match self {
            Chain::Cgv => "CGV",
            Chain::Lotte => "롯데시네마",
            Chain::Megabox => "메가박스",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cgv" => Ok(Chain::Cgv),
            "lotci" => Ok(Chain::Lotte),
            "megabox" => Ok(Chain::Megabox),
            _ => Err(Error::UnknownChain(s.to_string())),
        }
    }
}

/// One screening. `start` and `end` are "HH:MM" where hours 24-29 belong to
/// the early hours after the queried day.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Showtime {
    pub start: String,
    pub end: String,
    pub hall_info: String,
    pub cinema_info: String,
    pub total_capacity: u32,
    pub available_capacity: u32,
}

/// One movie's showtimes inside a [`Clip`](crate::Clip). `rating` is empty
/// when the source publishes none.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MovieGroup {
    pub title: String,
    pub rating: String,
    pub timeline: Vec<Showtime>,
}

impl MovieGroup {
    pub fn new(title: impl Into<String>, rating: impl Into<String>) -> Self {
        Self { title: title.into(), rating: rating.into(), timeline: Vec::new() }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DetailRecord {
    pub title_en: String,
    pub directors: String,
    pub genre: String,
    pub nationality: String,
    pub open_date: Option<Date>,
}

/// Registry details keyed by Korean title.
pub type DetailIndex = std::collections::HashMap<String, DetailRecord>;
