use jiff::civil::Date;
use scraper::{CaseSensitivity, ElementRef, Html, Selector};
use tracing::debug;
use wreq::header::REFERER;

use crate::{
    error::{Error, Result},
    models::Chain,
    raw::{CgvHall, CgvMovie, CgvSchedule, CgvSlot, MegaboxRow, MegaboxSchedule, MegaboxSlot, RawCount},
};

const CGV_SHOWTIMES_URL: &str = "http://www.cgv.co.kr/common/showtimes/iframeTheater.aspx";
const MEGABOX_SCHEDULE_URL: &str = "http://www.megabox.co.kr/pages/theater/Theater_Schedule.jsp";

/// `code` is the table value, e.g. `areacode=02&theatercode=0012`.
pub async fn fetch_cgv(
    client: &wreq::Client,
    code: &str,
    location: &str,
    date: Date,
) -> Result<CgvSchedule> {
    let url = format!("{}?{}&date={}", CGV_SHOWTIMES_URL, code, date.strftime("%Y%m%d"));
    debug!(location = %location, date = %date, "fetching CGV showtimes");

    let html = client
        .get(&url)
        .header(REFERER, "http://www.cgv.co.kr/")
        .send()
        .await
        .map_err(|e| Error::source_unavailable(Chain::Cgv, e))?
        .error_for_status()
        .map_err(|e| Error::source_unavailable(Chain::Cgv, e))?
        .text()
        .await
        .map_err(|e| Error::source_unavailable(Chain::Cgv, e))?;

    let schedule = parse_cgv_page(&html, location, date)?;
    debug!(location = %location, movies = schedule.movies.len(), "parsed CGV showtimes");
    Ok(schedule)
}

pub fn parse_cgv_page(html: &str, location: &str, date: Date) -> Result<CgvSchedule> {
    let doc = Html::parse_document(html);
    let movie_sel = selector(Chain::Cgv, "div.col-times")?;
    let title_sel = selector(Chain::Cgv, "strong")?;
    let grade_sel = selector(Chain::Cgv, "span.ico-grade")?;
    let hall_sel = selector(Chain::Cgv, "div.type-hall")?;
    let info_sel = selector(Chain::Cgv, "div.info-hall li")?;
    let li_sel = selector(Chain::Cgv, "li")?;
    let slot_sel = selector(Chain::Cgv, "a[data-playstarttime]")?;

    let mut movies = Vec::new();
    for mv in doc.select(&movie_sel) {
        let Some(title) = mv.select(&title_sel).next().map(text) else { continue };
        let grade = mv.select(&grade_sel).next().map(text).unwrap_or_default();

        let mut halls = Vec::new();
        for hall in mv.select(&hall_sel) {
            let mut info: Vec<String> = hall.select(&info_sel).map(text).collect();
            if info.is_empty() {
                info = hall.select(&li_sel).map(text).collect();
            }
            let field = |i: usize| info.get(i).cloned().unwrap_or_default();

            let slots = hall
                .select(&slot_sel)
                .filter_map(|a| {
                    let el = a.value();
                    // sold-out or closed slots lack the end time
                    let end = el.attr("data-playendtime")?;
                    Some(CgvSlot {
                        start: el.attr("data-playstarttime").unwrap_or_default().to_string(),
                        end: end.to_string(),
                        remaining_seats: RawCount::from(el.attr("data-seatremaincnt").unwrap_or_default()),
                    })
                })
                .collect();

            halls.push(CgvHall {
                screen_type: field(0),
                hall_name: field(1),
                total_seats: seat_total(&field(2)),
                slots,
            });
        }

        movies.push(CgvMovie { title, grade, halls });
    }

    Ok(CgvSchedule { date, location: location.to_string(), movies })
}

/// "총 250석" -> "250"; text without digits is kept for the normalizer to reject.
fn seat_total(cell: &str) -> RawCount {
    let digits: String = cell.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() { RawCount::from(cell) } else { RawCount::Text(digits) }
}

/// `day_offset` is the number of days between today and the play date.
pub async fn fetch_megabox(
    client: &wreq::Client,
    code: &str,
    location: &str,
    date: Date,
    day_offset: i64,
) -> Result<MegaboxSchedule> {
    debug!(location = %location, date = %date, "fetching Megabox showtimes");
    let form = [("count", (day_offset + 1).to_string()), ("cinema", code.to_string())];

    let html = client
        .post(MEGABOX_SCHEDULE_URL)
        .form(&form)
        .send()
        .await
        .map_err(|e| Error::source_unavailable(Chain::Megabox, e))?
        .error_for_status()
        .map_err(|e| Error::source_unavailable(Chain::Megabox, e))?
        .text()
        .await
        .map_err(|e| Error::source_unavailable(Chain::Megabox, e))?;

    let schedule = parse_megabox_page(&html, location, date)?;
    debug!(location = %location, rows = schedule.rows.len(), "parsed Megabox showtimes");
    Ok(schedule)
}

pub fn parse_megabox_page(html: &str, location: &str, date: Date) -> Result<MegaboxSchedule> {
    let doc = Html::parse_document(html);
    let row_sel = selector(Chain::Megabox, "table.movie_time_table tr.lineheight_80")?;
    let title_sel = selector(Chain::Megabox, "th#th_theaterschedule_title a")?;
    let room_sel = selector(Chain::Megabox, "th#th_theaterschedule_room div")?;
    let slot_sel = selector(Chain::Megabox, "div.cinema_time")?;
    let time_sel = selector(Chain::Megabox, "span.hover_time")?;
    let seat_sel = selector(Chain::Megabox, "span.seat")?;

    let mut rows = Vec::new();
    // a title cell spans every room row of that movie
    let mut title: Option<String> = None;

    for row in doc.select(&row_sel) {
        if let Some(a) = row.select(&title_sel).next() {
            title = Some(text(a));
        }
        let Some(current) = title.clone() else { continue };
        let room = row.select(&room_sel).next().map(text).unwrap_or_default();

        let mut slots = Vec::new();
        for slot in row.select(&slot_sel) {
            if slot.value().has_class("done", CaseSensitivity::CaseSensitive) {
                continue;
            }
            let time = slot.select(&time_sel).next().map(text);
            let seats = slot.select(&seat_sel).next().map(text);
            match (time, seats) {
                (Some(time_range), Some(seats)) => slots.push(MegaboxSlot { time_range, seats }),
                _ => debug!(title = %current, room = %room, "skipping slot without time or seats"),
            }
        }

        if !slots.is_empty() {
            rows.push(MegaboxRow { title: current, room, slots });
        }
    }

    Ok(MegaboxSchedule { date, location: location.to_string(), rows })
}

pub(crate) fn selector(chain: Chain, css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::source_unavailable(chain, format!("selector `{css}`: {e}")))
}

pub(crate) fn text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
