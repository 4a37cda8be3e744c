use jiff::civil::Date;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{
    error::{Error, Result},
    models::Chain,
    raw::{LotteMovie, LottePlaySeq, LotteSchedule},
};

pub(crate) const TICKETING_URL: &str =
    "https://www.lottecinema.co.kr/LCWS/Ticketing/TicketingData.aspx";
pub(crate) const CINEMA_URL: &str = "https://www.lottecinema.co.kr/LCWS/Cinema/CinemaData.aspx";

/// Posts `ParamList=<json>` the way the Lotte mobile web client does.
pub(crate) async fn post_param_list(
    client: &wreq::Client,
    url: &str,
    params: serde_json::Value,
) -> Result<String> {
    let form = [("ParamList", params.to_string())];
    client
        .post(url)
        .form(&form)
        .send()
        .await
        .map_err(|e| Error::source_unavailable(Chain::Lotte, e))?
        .error_for_status()
        .map_err(|e| Error::source_unavailable(Chain::Lotte, e))?
        .text()
        .await
        .map_err(|e| Error::source_unavailable(Chain::Lotte, e))
}

/// `cinema_id` is the table value, e.g. `1|21|3016`.
pub async fn fetch_lotte(client: &wreq::Client, cinema_id: &str, date: Date) -> Result<LotteSchedule> {
    debug!(cinema_id = %cinema_id, date = %date, "fetching Lotte Cinema play sequences");
    let params = json!({
        "channelType": "MW",
        "osType": "",
        "osVersion": "",
        "MethodName": "GetPlaySequence",
        "playDate": date.strftime("%Y-%m-%d").to_string(),
        "representationMovieCode": "",
        "cinemaID": cinema_id,
    });

    let body = post_param_list(client, TICKETING_URL, params).await?;
    let schedule = parse_play_sequences(&body, date)?;
    debug!(cinema_id = %cinema_id, movies = schedule.movies.len(), sequences = schedule.sequences.len(), "parsed Lotte Cinema play sequences");
    Ok(schedule)
}

pub fn parse_play_sequences(body: &str, date: Date) -> Result<LotteSchedule> {
    let resp: PlaySequenceResponse =
        serde_json::from_str(body).map_err(|e| Error::source_unavailable(Chain::Lotte, e))?;
    Ok(LotteSchedule { date, movies: resp.header.items, sequences: resp.sequences.items })
}

#[derive(Debug, Deserialize)]
struct PlaySequenceResponse {
    #[serde(rename = "PlaySeqsHeader", default)]
    header: Items<LotteMovie>,
    #[serde(rename = "PlaySeqs", default)]
    sequences: Items<LottePlaySeq>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Items<T> {
    #[serde(rename = "Items", default = "Vec::new")]
    pub(crate) items: Vec<T>,
}

impl<T> Default for Items<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;
    use crate::raw::RawCount;

    #[test]
    fn parses_play_sequence_response() {
        let body = r#"{
            "PlaySeqsHeader": { "Items": [
                { "RepresentationMovieCode": "12966", "MovieNameKR": "어벤져스: 인피니티 워", "ViewGradeCode": 12 }
            ]},
            "PlaySeqs": { "Items": [
                {
                    "RepresentationMovieCode": "12966",
                    "CinemaNameKR": "수원",
                    "ScreenNameKR": "1관",
                    "FourDTypeCode": 0,
                    "FilmCode": 300,
                    "StartTime": "21:30",
                    "EndTime": "24:09",
                    "BookingSeatCount": 216,
                    "TotalSeatCount": 250,
                    "PlayDt": "2018-05-03"
                }
            ]},
            "IsOK": "true"
        }"#;

        let schedule = parse_play_sequences(body, date(2018, 5, 3)).unwrap();
        assert_eq!(schedule.movies[0].grade_code.as_deref(), Some("12"));
        assert_eq!(schedule.sequences.len(), 1);
        assert_eq!(schedule.sequences[0].booking_seats, RawCount::Number(216));
        assert_eq!(schedule.sequences[0].film_code.as_deref(), Some("300"));
    }

    #[test]
    fn missing_sections_mean_no_schedule() {
        let schedule = parse_play_sequences("{}", date(2018, 5, 3)).unwrap();
        assert!(schedule.movies.is_empty());
        assert!(schedule.sequences.is_empty());
    }

    #[test]
    fn undecodable_body_is_source_unavailable() {
        let err = parse_play_sequences("<html>error</html>", date(2018, 5, 3)).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { chain: Chain::Lotte, .. }));
    }
}
