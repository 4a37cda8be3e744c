use std::fmt::Write;

use colored::Colorize;

use crate::{
    clip::Clip,
    models::{DetailIndex, DetailRecord, MovieGroup, Showtime},
};

const RULE: &str = "--------------------------------------------------------------";

/// Megabox prefixes dubbed screenings; the registry only knows the bare title.
const DUBBED_PREFIX: &str = "(더빙) ";

#[derive(Clone, Copy, Debug, Default)]
pub struct RenderStyle {
    pub color: bool,
}

pub fn render(clip: &Clip, details: Option<&DetailIndex>, style: RenderStyle) -> String {
    let mut out = String::new();
    for group in clip.groups() {
        let detail = details.and_then(|d| lookup(d, &group.title));
        movie_block(&mut out, group, detail, style);
    }
    out
}

fn lookup<'a>(details: &'a DetailIndex, title: &str) -> Option<&'a DetailRecord> {
    details.get(title.strip_prefix(DUBBED_PREFIX).unwrap_or(title))
}

fn movie_block(out: &mut String, group: &MovieGroup, detail: Option<&DetailRecord>, style: RenderStyle) {
    let title = paint(&group.title, style, |s| s.bright_blue().bold().to_string());

    let _ = writeln!(out, "{RULE}");
    match detail.filter(|d| !d.title_en.is_empty()) {
        Some(d) => {
            let _ = writeln!(out, " {}{} ({})", rating_badge(&group.rating, style), title, d.title_en);
        },
        None => {
            let _ = writeln!(out, " {}{}", rating_badge(&group.rating, style), title);
        },
    }
    let _ = writeln!(out, "{RULE}");

    if let Some(d) = detail {
        let _ = match d.open_date {
            Some(date) => writeln!(
                out,
                " {} | {} | {} 개봉",
                d.genre,
                d.nationality,
                date.strftime("%Y.%m.%d.")
            ),
            None => writeln!(out, " {} | {}", d.genre, d.nationality),
        };
        let _ = writeln!(out, "{RULE}");
    }

    for showtime in &group.timeline {
        let _ = writeln!(out, "{}", timeline_line(showtime, style));
    }

    let _ = writeln!(out, "{RULE}");
    out.push('\n');
}

fn timeline_line(s: &Showtime, style: RenderStyle) -> String {
    let start = paint(&s.start, style, |v| v.bright_blue().to_string());
    let avail = format!("{:3}", s.available_capacity);
    let avail = paint(&avail, style, |v| match seat_level(s) {
        SeatLevel::Low => v.bright_red().to_string(),
        SeatLevel::Half => v.bright_yellow().to_string(),
        SeatLevel::Plenty => v.bright_blue().to_string(),
    });
    format!(
        " {} - {} | {} / {:3} | {} ({})",
        start, s.end, avail, s.total_capacity, s.cinema_info, s.hall_info
    )
}

fn rating_badge(rating: &str, style: RenderStyle) -> String {
    if rating.is_empty() {
        return String::new();
    }
    let painted = paint(rating, style, |r| match r {
        "12" => r.bright_blue().to_string(),
        "15" => r.bright_yellow().to_string(),
        "19" => r.bright_red().to_string(),
        _ => r.to_string(),
    });
    format!("{painted} | ")
}

#[derive(Debug, Eq, PartialEq)]
enum SeatLevel {
    Low,
    Half,
    Plenty,
}

fn seat_level(s: &Showtime) -> SeatLevel {
    if s.available_capacity < s.total_capacity / 4 {
        SeatLevel::Low
    } else if s.available_capacity < s.total_capacity / 2 {
        SeatLevel::Half
    } else {
        SeatLevel::Plenty
    }
}

fn paint(text: &str, style: RenderStyle, f: impl FnOnce(&str) -> String) -> String {
    if style.color { f(text) } else { text.to_string() }
}
