use std::collections::HashMap;

use jiff::civil::Date;
use tracing::{debug, warn};

use crate::{
    clip::Clip,
    error::{Error, Result},
    models::{Chain, Showtime},
    raw::{
        CgvSchedule, LotteMovie, LotteSchedule, MegaboxSchedule, RawCount, RawSchedule, RawShowtime,
    },
};

/// Latest hour a chain may use for screenings belonging to the queried day.
const LAST_SERVICE_HOUR: u32 = 29;

#[derive(Clone, Debug, Default)]
pub struct ScheduleFilter {
    /// Day of month; `None` means today in the local time zone.
    pub day: Option<u8>,
    /// Case-sensitive substring of the title.
    pub title: Option<String>,
}

impl ScheduleFilter {
    pub fn new(day: Option<u8>, title: Option<&str>) -> Self {
        Self { day, title: title.map(str::to_string) }
    }
}

/// Flattens `raw` into a [`Clip`] of the showtimes on `filter.day`.
///
/// A day outside 1-31 matches nothing and yields an empty clip; callers that
/// take the day from users go through
/// [`resolve_play_date`](crate::query::resolve_play_date), which rejects it.
pub fn normalize(raw: &RawSchedule, filter: &ScheduleFilter) -> Clip {
    let chain = raw.chain();
    let day = filter.day.unwrap_or_else(today_day);
    if !(1..=31).contains(&day) {
        warn!(chain = %chain, day = day, "day of month out of range, nothing to normalize");
        return Clip::new();
    }

    let records = match raw {
        RawSchedule::Cgv(s) => cgv_showtimes(s),
        RawSchedule::Lotte(s) => lotte_showtimes(s),
        RawSchedule::Megabox(s) => megabox_showtimes(s),
    };
    debug!(chain = %chain, records = records.len(), day = day, "normalizing schedule");

    let mut clip = Clip::new();
    let mut off_day = 0usize;
    for record in records {
        if record.play_date.day() as u8 != day {
            off_day += 1;
            continue;
        }
        if let Some(needle) = &filter.title
            && !record.title.contains(needle.as_str())
        {
            continue;
        }
        let (title, rating) = (record.title.clone(), record.rating.clone());
        match to_showtime(record) {
            Ok(showtime) => clip.push(&title, &rating, showtime),
            Err(err) => {
                warn!(chain = %chain, title = %title, error = %err, "dropping malformed showtime")
            },
        }
    }

    debug!(chain = %chain, movies = clip.len(), showtimes = clip.showtime_count(), off_day = off_day, "normalized schedule");
    clip
}

fn today_day() -> u8 {
    jiff::Zoned::now().day() as u8
}

fn to_showtime(raw: RawShowtime) -> Result<Showtime> {
    let start = normalize_clock(&raw.start)?;
    let end = normalize_clock(&raw.end)?;
    let total_capacity = coerce_count(&raw.total_capacity)?;
    let available_capacity = coerce_count(&raw.available_capacity)?;
    if available_capacity > total_capacity {
        return Err(Error::malformed(format!(
            "{available_capacity} seats available out of {total_capacity}"
        )));
    }
    Ok(Showtime {
        start,
        end,
        hall_info: raw.hall_info,
        cinema_info: raw.cinema_info,
        total_capacity,
        available_capacity,
    })
}

/// Accepts `HHMM`, `HH:MM` and `H:MM`. Hours past midnight stay as published
/// (`24:30`, `27:09`), never wrapped back into 0-23.
pub fn normalize_clock(raw: &str) -> Result<String> {
    let s = raw.trim();
    let (hour, minute) = match s.split_once(':') {
        Some(parts) => parts,
        None if s.len() == 4 && s.is_ascii() => s.split_at(2),
        None => return Err(Error::malformed(format!("unrecognized time `{raw}`"))),
    };

    let digits = |v: &str| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit());
    if !digits(hour) || hour.len() > 2 || !digits(minute) || minute.len() != 2 {
        return Err(Error::malformed(format!("unrecognized time `{raw}`")));
    }

    let hour: u32 = hour.parse().map_err(|_| Error::malformed(format!("bad hour in `{raw}`")))?;
    let minute: u32 =
        minute.parse().map_err(|_| Error::malformed(format!("bad minute in `{raw}`")))?;
    if hour > LAST_SERVICE_HOUR || minute > 59 {
        return Err(Error::malformed(format!("time `{raw}` out of range")));
    }

    Ok(format!("{hour:02}:{minute:02}"))
}

pub fn coerce_count(raw: &RawCount) -> Result<u32> {
    match raw {
        RawCount::Number(n) => {
            u32::try_from(*n).map_err(|_| Error::malformed(format!("seat count `{n}` out of range")))
        },
        RawCount::Text(s) => {
            let t = s.trim();
            if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::malformed(format!("seat count `{s}` is not a number")));
            }
            t.parse().map_err(|_| Error::malformed(format!("seat count `{s}` out of range")))
        },
    }
}

fn cgv_showtimes(schedule: &CgvSchedule) -> Vec<RawShowtime> {
    let cinema_info = format!("{} {}", Chain::Cgv.label(), schedule.location);
    let mut out = Vec::new();
    for movie in &schedule.movies {
        let rating = cgv_rating(&movie.grade);
        for hall in &movie.halls {
            let hall_info = format!("{} {}", hall.screen_type, hall.hall_name).trim().to_string();
            for slot in &hall.slots {
                out.push(RawShowtime {
                    play_date: schedule.date,
                    title: movie.title.clone(),
                    rating: rating.clone(),
                    hall_info: hall_info.clone(),
                    cinema_info: cinema_info.clone(),
                    start: slot.start.clone(),
                    end: slot.end.clone(),
                    total_capacity: hall.total_seats.clone(),
                    available_capacity: slot.remaining_seats.clone(),
                });
            }
        }
    }
    out
}

fn cgv_rating(grade: &str) -> String {
    let grade = grade.trim();
    let head: String = grade.chars().take(2).collect();
    match head.as_str() {
        "청소" => "19".to_string(),
        "15" => "15".to_string(),
        "12" => "12".to_string(),
        "전체" => "ALL".to_string(),
        _ => grade.to_string(),
    }
}

fn lotte_showtimes(schedule: &LotteSchedule) -> Vec<RawShowtime> {
    let movies: HashMap<&str, &LotteMovie> =
        schedule.movies.iter().map(|m| (m.movie_code.as_str(), m)).collect();

    let mut out = Vec::new();
    for seq in &schedule.sequences {
        let Some(movie) = movies.get(seq.movie_code.as_str()) else {
            warn!(movie_code = %seq.movie_code, "play sequence references unknown movie");
            continue;
        };

        let play_date = match seq.play_date.trim() {
            "" => schedule.date,
            s => match s.parse::<Date>() {
                Ok(date) => date,
                Err(err) => {
                    warn!(play_date = %s, error = %err, "dropping play sequence with bad date");
                    continue;
                },
            },
        };

        let format = if seq.four_d_type.as_deref() == Some("200") {
            "4D"
        } else if seq.film_code.as_deref() == Some("300") {
            "3D"
        } else {
            "2D"
        };

        out.push(RawShowtime {
            play_date,
            title: movie.title.clone(),
            rating: lotte_rating(movie.grade_code.as_deref()),
            hall_info: format!("{format} {}", seq.screen_name),
            cinema_info: format!("{} {}", Chain::Lotte.label(), seq.cinema_name),
            start: seq.start.clone(),
            end: seq.end.clone(),
            total_capacity: seq.total_seats.clone(),
            available_capacity: seq.booking_seats.clone(),
        });
    }
    out
}

fn lotte_rating(code: Option<&str>) -> String {
    match code.map(str::trim) {
        None | Some("") => String::new(),
        Some("0") => "ALL".to_string(),
        Some("18") | Some("19") => "19".to_string(),
        Some(other) => other.to_string(),
    }
}

fn megabox_showtimes(schedule: &MegaboxSchedule) -> Vec<RawShowtime> {
    let cinema_info = format!("{} {}", Chain::Megabox.label(), schedule.location);
    let mut out = Vec::new();
    for row in &schedule.rows {
        for slot in &row.slots {
            let Some((start, end)) = slot.time_range.split_once('~') else {
                warn!(title = %row.title, time = %slot.time_range, "dropping slot without time range");
                continue;
            };
            let (available, total) = slot.seats.split_once('/').unwrap_or((slot.seats.as_str(), ""));
            out.push(RawShowtime {
                play_date: schedule.date,
                title: row.title.clone(),
                rating: String::new(),
                hall_info: row.room.trim().to_string(),
                cinema_info: cinema_info.clone(),
                start: start.to_string(),
                end: end.to_string(),
                total_capacity: RawCount::from(total),
                available_capacity: RawCount::from(available),
            });
        }
    }
    out
}
