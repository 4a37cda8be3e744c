//! Rebuilds the per-chain code tables from each chain's theater directory.

use ::scraper::Html;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    locations::CodeTable,
    lotte::{self, Items},
    models::Chain,
    scraper::selector,
};

const CGV_THEATERS_URL: &str = "http://www.cgv.co.kr/theaters/";
const CGV_THEATER_LIST_KEY: &str = r#"[{"AreaTheaterDetailList":"#;
const MEGABOX_THEATER_MENU_URL: &str = "http://www.megabox.co.kr/?menuId=theater";
const MEGABOX_DATA_PROVIDER_URL: &str = "http://www.megabox.co.kr/DataProvider";

pub async fn refresh_code_table(client: &wreq::Client, chain: Chain) -> Result<CodeTable> {
    let table = match chain {
        Chain::Cgv => cgv_codes(client).await?,
        Chain::Lotte => lotte_codes(client).await?,
        Chain::Megabox => megabox_codes(client).await?,
    };
    info!(chain = %chain, entries = table.len(), "rebuilt code table");
    Ok(table)
}

async fn get_text(client: &wreq::Client, chain: Chain, url: &str) -> Result<String> {
    client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::source_unavailable(chain, e))?
        .error_for_status()
        .map_err(|e| Error::source_unavailable(chain, e))?
        .text()
        .await
        .map_err(|e| Error::source_unavailable(chain, e))
}

async fn cgv_codes(client: &wreq::Client) -> Result<CodeTable> {
    let page = get_text(client, Chain::Cgv, CGV_THEATERS_URL).await?;
    parse_cgv_theaters(&page)
}

#[derive(Debug, Deserialize)]
struct CgvArea {
    #[serde(rename = "RegionCode")]
    region_code: String,
    #[serde(rename = "AreaTheaterDetailList", default)]
    theaters: Vec<CgvTheater>,
}

#[derive(Debug, Deserialize)]
struct CgvTheater {
    #[serde(rename = "TheaterCode")]
    theater_code: String,
    #[serde(rename = "TheaterName")]
    theater_name: String,
}

/// The theater page embeds the list as a script literal ending with `;`.
fn parse_cgv_theaters(page: &str) -> Result<CodeTable> {
    let start = page
        .find(CGV_THEATER_LIST_KEY)
        .ok_or_else(|| Error::CodeTable("CGV theater list not found".into()))?;
    let rest = &page[start..];
    let end = rest.find(';').unwrap_or(rest.len());
    let areas: Vec<CgvArea> = serde_json::from_str(&rest[..end])?;

    let mut table = CodeTable::default();
    for area in areas {
        for theater in area.theaters {
            let name = theater.theater_name.trim();
            let name = name.strip_prefix("CGV").unwrap_or(name).trim().to_string();
            let code = format!(
                "areacode={}&theatercode={}",
                urlencoding::encode(&area.region_code),
                urlencoding::encode(&theater.theater_code)
            );
            table.insert(name, code);
        }
    }
    Ok(table)
}

async fn lotte_codes(client: &wreq::Client) -> Result<CodeTable> {
    let params = json!({
        "channelType": "MW",
        "osType": "",
        "osVersion": "",
        "MethodName": "GetCinemaItems",
    });
    let body = lotte::post_param_list(client, lotte::CINEMA_URL, params).await?;
    parse_lotte_cinemas(&body)
}

#[derive(Debug, Deserialize)]
struct LotteCinemas {
    #[serde(rename = "Cinemas", default)]
    cinemas: Items<LotteCinema>,
}

#[derive(Debug, Deserialize)]
struct LotteCinema {
    #[serde(rename = "DivisionCode")]
    division_code: Value,
    #[serde(rename = "SortSequence")]
    sort_sequence: Value,
    #[serde(rename = "CinemaID")]
    cinema_id: Value,
    #[serde(rename = "CinemaNameKR")]
    name: String,
}

fn parse_lotte_cinemas(body: &str) -> Result<CodeTable> {
    let resp: LotteCinemas = serde_json::from_str(body)?;
    let mut table = CodeTable::default();
    for cinema in resp.cinemas.items {
        let code = format!(
            "{}|{}|{}",
            scalar(&cinema.division_code),
            scalar(&cinema.sort_sequence),
            scalar(&cinema.cinema_id)
        );
        // the same cinema is listed once per region it belongs to
        table.insert(strip_parenthesized(&cinema.name), code);
    }
    Ok(table)
}

async fn megabox_codes(client: &wreq::Client) -> Result<CodeTable> {
    let menu = get_text(client, Chain::Megabox, MEGABOX_THEATER_MENU_URL).await?;
    let regions = parse_megabox_regions(&menu)?;
    debug!(regions = regions.len(), "found Megabox regions");

    let mut table = CodeTable::default();
    for region in regions {
        let form = [
            ("_command", "Cinema.getCinemasInRegion"),
            ("siteCode", "36"),
            ("areaGroupCode", region.as_str()),
            ("reservationYn", "N"),
        ];
        let body = client
            .post(MEGABOX_DATA_PROVIDER_URL)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::source_unavailable(Chain::Megabox, e))?
            .error_for_status()
            .map_err(|e| Error::source_unavailable(Chain::Megabox, e))?
            .text()
            .await
            .map_err(|e| Error::source_unavailable(Chain::Megabox, e))?;

        let resp: MegaboxCinemas = serde_json::from_str(&body)?;
        for cinema in resp.cinema_list {
            table.insert(strip_parenthesized(&cinema.cinema_name), scalar(&cinema.cinema_code));
        }
    }
    Ok(table)
}

/// Region codes sit in `onclick` handlers of the theater menu, skipping the
/// leading "all" entry.
fn parse_megabox_regions(html: &str) -> Result<Vec<String>> {
    let doc = Html::parse_document(html);
    let menu_sel = selector(Chain::Megabox, "ul.menu")?;
    let li_sel = selector(Chain::Megabox, "li")?;
    let a_sel = selector(Chain::Megabox, "a[onclick]")?;

    let Some(menu) = doc.select(&menu_sel).next() else {
        return Err(Error::CodeTable("Megabox theater menu not found".into()));
    };

    let regions = menu
        .select(&li_sel)
        .skip(1)
        .filter_map(|li| li.select(&a_sel).next())
        .filter_map(|a| a.value().attr("onclick")?.split('\'').nth(1).map(str::to_string))
        .collect();
    Ok(regions)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MegaboxCinemas {
    #[serde(default)]
    cinema_list: Vec<MegaboxCinema>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MegaboxCinema {
    cinema_name: String,
    cinema_code: Value,
}

fn scalar(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// "수원(수원역)" -> "수원"
fn strip_parenthesized(name: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {},
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cgv_theater_list_is_cut_from_the_page() {
        let page = r#"<script>
            var theaterJsonData = [{"AreaTheaterDetailList":[{"TheaterCode":"0056","TheaterName":"CGV강남"},{"TheaterCode":"0001","TheaterName":"CGV강변"}],"RegionCode":"01"},{"AreaTheaterDetailList":[{"TheaterCode":"0007","TheaterName":"CGV대전"}],"RegionCode":"03,205"}];
            var other = 1;
        </script>"#;

        let table = parse_cgv_theaters(page).unwrap();
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["강남", "강변", "대전"]);
        assert_eq!(table.get("강남"), Some("areacode=01&theatercode=0056"));
        assert_eq!(table.get("대전"), Some("areacode=03%2C205&theatercode=0007"));
    }

    #[test]
    fn cgv_page_without_list_fails() {
        assert!(matches!(parse_cgv_theaters("<html></html>"), Err(Error::CodeTable(_))));
    }

    #[test]
    fn lotte_cinemas_drop_parentheses_and_keep_first() {
        let body = r#"{"Cinemas":{"Items":[
            {"DivisionCode":1,"SortSequence":21,"CinemaID":3016,"CinemaNameKR":"시화"},
            {"DivisionCode":1,"SortSequence":12,"CinemaID":3017,"CinemaNameKR":"수원(수원역)"},
            {"DivisionCode":2,"SortSequence":1,"CinemaID":9999,"CinemaNameKR":"시화"}
        ]}}"#;

        let table = parse_lotte_cinemas(body).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("시화"), Some("1|21|3016"));
        assert_eq!(table.get("수원"), Some("1|12|3017"));
    }

    #[test]
    fn megabox_regions_come_from_menu_handlers() {
        let html = r#"<ul class="menu">
            <li><a onclick="showAll()">전체</a></li>
            <li><a onclick="getRegion('10')">서울</a></li>
            <li><a onclick="getRegion('30')">경기</a></li>
        </ul>"#;
        assert_eq!(parse_megabox_regions(html).unwrap(), vec!["10", "30"]);
    }

    #[test]
    fn parentheses_are_removed() {
        assert_eq!(strip_parenthesized("수원(수원역)"), "수원");
        assert_eq!(strip_parenthesized("동성로 (대구)점"), "동성로 점");
        assert_eq!(strip_parenthesized("안동"), "안동");
    }
}
