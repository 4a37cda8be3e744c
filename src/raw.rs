//! Per-chain raw schedule shapes, as decoded by the adapters before any
//! normalization. Capacities and times are kept exactly as published.

use jiff::civil::Date;
use serde::{Deserialize, Deserializer};

use crate::models::Chain;

#[derive(Clone, Debug)]
pub enum RawSchedule {
    Cgv(CgvSchedule),
    Lotte(LotteSchedule),
    Megabox(MegaboxSchedule),
}

impl RawSchedule {
    pub fn chain(&self) -> Chain {
        match self {
            RawSchedule::Cgv(_) => Chain::Cgv,
            RawSchedule::Lotte(_) => Chain::Lotte,
            RawSchedule::Megabox(_) => Chain::Megabox,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RawSchedule::Cgv(s) => s.movies.is_empty(),
            RawSchedule::Lotte(s) => s.sequences.is_empty(),
            RawSchedule::Megabox(s) => s.rows.is_empty(),
        }
    }
}

/// A seat count as published: a JSON number or a text cell.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawCount {
    Number(i64),
    Text(String),
}

impl From<i64> for RawCount {
    fn from(n: i64) -> Self {
        RawCount::Number(n)
    }
}

impl From<&str> for RawCount {
    fn from(s: &str) -> Self {
        RawCount::Text(s.to_string())
    }
}

/// The shape every chain is flattened into before filtering.
#[derive(Clone, Debug, PartialEq)]
pub struct RawShowtime {
    pub play_date: Date,
    pub title: String,
    pub rating: String,
    pub hall_info: String,
    pub cinema_info: String,
    pub start: String,
    pub end: String,
    pub total_capacity: RawCount,
    pub available_capacity: RawCount,
}

#[derive(Clone, Debug)]
pub struct CgvSchedule {
    pub date: Date,
    /// Display name the theater was resolved from.
    pub location: String,
    pub movies: Vec<CgvMovie>,
}

#[derive(Clone, Debug)]
pub struct CgvMovie {
    pub title: String,
    /// Grade badge text, e.g. "15세 이상" or "청소년 관람불가".
    pub grade: String,
    pub halls: Vec<CgvHall>,
}

#[derive(Clone, Debug)]
pub struct CgvHall {
    pub screen_type: String,
    pub hall_name: String,
    pub total_seats: RawCount,
    pub slots: Vec<CgvSlot>,
}

/// `start`/`end` are `HHMM` (`data-playstarttime`).
#[derive(Clone, Debug)]
pub struct CgvSlot {
    pub start: String,
    pub end: String,
    pub remaining_seats: RawCount,
}

#[derive(Clone, Debug)]
pub struct LotteSchedule {
    pub date: Date,
    pub movies: Vec<LotteMovie>,
    pub sequences: Vec<LottePlaySeq>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LotteMovie {
    #[serde(rename = "RepresentationMovieCode", deserialize_with = "string_or_number")]
    pub movie_code: String,
    #[serde(rename = "MovieNameKR")]
    pub title: String,
    #[serde(rename = "ViewGradeCode", default, deserialize_with = "opt_string_or_number")]
    pub grade_code: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LottePlaySeq {
    #[serde(rename = "RepresentationMovieCode", deserialize_with = "string_or_number")]
    pub movie_code: String,
    #[serde(rename = "CinemaNameKR", default)]
    pub cinema_name: String,
    #[serde(rename = "ScreenNameKR", default)]
    pub screen_name: String,
    #[serde(rename = "FourDTypeCode", default, deserialize_with = "opt_string_or_number")]
    pub four_d_type: Option<String>,
    #[serde(rename = "FilmCode", default, deserialize_with = "opt_string_or_number")]
    pub film_code: Option<String>,
    #[serde(rename = "StartTime")]
    pub start: String,
    #[serde(rename = "EndTime")]
    pub end: String,
    /// Despite the name, Lotte reports remaining seats here.
    #[serde(rename = "BookingSeatCount")]
    pub booking_seats: RawCount,
    #[serde(rename = "TotalSeatCount")]
    pub total_seats: RawCount,
    /// `YYYY-MM-DD`; blank when the sequence carries no date of its own.
    #[serde(rename = "PlayDt", default)]
    pub play_date: String,
}

#[derive(Clone, Debug)]
pub struct MegaboxSchedule {
    pub date: Date,
    pub location: String,
    pub rows: Vec<MegaboxRow>,
}

#[derive(Clone, Debug)]
pub struct MegaboxRow {
    pub title: String,
    pub room: String,
    pub slots: Vec<MegaboxSlot>,
}

#[derive(Clone, Debug)]
pub struct MegaboxSlot {
    /// `HH:MM~HH:MM`
    pub time_range: String,
    /// `avail/total`
    pub seats: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(i64),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            StringOrNumber::Text(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(d).map(StringOrNumber::into_string)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(d)?.map(StringOrNumber::into_string))
}
