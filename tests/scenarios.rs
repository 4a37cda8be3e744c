use jiff::civil::{Date, date};
use kr_showtimes::{
    Chain, Clip, Error, LocationResolver, RenderStyle, ScheduleFilter, normalize,
    raw::{CgvHall, CgvMovie, CgvSchedule, CgvSlot, MegaboxRow, MegaboxSchedule, MegaboxSlot, RawSchedule},
};

fn cgv_slot(start: &str, end: &str, remaining: &str) -> CgvSlot {
    CgvSlot { start: start.into(), end: end.into(), remaining_seats: remaining.into() }
}

fn cgv_schedule(date: Date, title: &str, grade: &str, slots: Vec<CgvSlot>) -> RawSchedule {
    cgv_schedule_at("수원", date, title, grade, slots)
}

fn cgv_schedule_at(location: &str, date: Date, title: &str, grade: &str, slots: Vec<CgvSlot>) -> RawSchedule {
    RawSchedule::Cgv(CgvSchedule {
        date,
        location: location.into(),
        movies: vec![CgvMovie {
            title: title.into(),
            grade: grade.into(),
            halls: vec![CgvHall {
                screen_type: "2D".into(),
                hall_name: "8관".into(),
                total_seats: "250".into(),
                slots,
            }],
        }],
    })
}

fn megabox_schedule(date: Date, title: &str, slots: &[(&str, &str)]) -> RawSchedule {
    RawSchedule::Megabox(MegaboxSchedule {
        date,
        location: "수원".into(),
        rows: vec![MegaboxRow {
            title: title.into(),
            room: "컴포트 1관".into(),
            slots: slots
                .iter()
                .map(|(time, seats)| MegaboxSlot { time_range: time.to_string(), seats: seats.to_string() })
                .collect(),
        }],
    })
}

#[test]
fn avengers_post_midnight_showings_stay_on_the_queried_day() {
    let raw = cgv_schedule(date(2018, 5, 3), "어벤져스: 인피니티 워", "12세 이상", vec![
        cgv_slot("2130", "2409", "216"),
        cgv_slot("2430", "2709", "235"),
    ]);
    let clip = normalize(&raw, &ScheduleFilter::new(Some(3), None));

    let group = clip.get("어벤져스: 인피니티 워").unwrap();
    let times: Vec<(&str, &str)> = group.timeline.iter().map(|s| (s.start.as_str(), s.end.as_str())).collect();
    assert_eq!(times, vec![("21:30", "24:09"), ("24:30", "27:09")]);
    assert!(group.timeline.iter().all(|s| s.total_capacity == 250));
    assert_eq!(group.timeline[1].available_capacity, 235);
}

#[test]
fn branch_name_resolves_and_unknown_name_fails() {
    let resolver = LocationResolver::packaged().unwrap();

    assert_eq!(resolver.resolve(Chain::Cgv, "북수원").unwrap(), "areacode=02&theatercode=0049");
    assert!(resolver.available_locations(Chain::Cgv).contains(&"북수원".to_string()));

    for chain in Chain::ALL {
        let err = resolver.resolve(chain, "존재하지않는동네").unwrap_err();
        assert!(matches!(err, Error::LocationNotFound { chain: c, .. } if c == chain));
    }
}

#[test]
fn alias_spellings_share_the_table_display_name() {
    let resolver = LocationResolver::packaged().unwrap();
    let day = date(2018, 5, 3);

    let clips: Vec<Clip> = ["북수원", "CGV 북수원점", "cgv북수원"]
        .into_iter()
        .map(|spelling| {
            let (name, code) = resolver.resolve_entry(Chain::Cgv, spelling).unwrap();
            assert_eq!(code, "areacode=02&theatercode=0049");
            let raw = cgv_schedule_at(name, day, "독전", "청소년 관람불가", vec![cgv_slot("2130", "2335", "40")]);
            normalize(&raw, &ScheduleFilter::new(Some(3), None))
        })
        .collect();

    let merged = Clip::merge_all(&clips);
    let group = merged.get("독전").unwrap();
    assert_eq!(group.timeline.len(), 3);
    assert!(group.timeline.iter().all(|s| s.cinema_info == "CGV 북수원"));
}

#[test]
fn parasite_across_cgv_and_megabox_merges_into_one_group() {
    let day = date(2019, 6, 1);
    let cgv = normalize(
        &cgv_schedule(day, "기생충", "15세 이상", vec![cgv_slot("1000", "1212", "120"), cgv_slot("1330", "1542", "80")]),
        &ScheduleFilter::new(Some(1), None),
    );
    let megabox = normalize(
        &megabox_schedule(day, "기생충", &[("11:00~13:12", "80/150"), ("24:10~26:22", "150/150")]),
        &ScheduleFilter::new(Some(1), None),
    );

    let merged = cgv.merge(&megabox);
    assert_eq!(merged.len(), 1);

    let group = merged.get("기생충").unwrap();
    assert_eq!(group.rating, "15");
    assert_eq!(group.timeline.len(), 4);
    assert_eq!(group.timeline[..2], cgv.get("기생충").unwrap().timeline[..]);
    assert_eq!(group.timeline[2..], megabox.get("기생충").unwrap().timeline[..]);
    assert_eq!(group.timeline[3].start, "24:10");
    assert_eq!(group.timeline[3].cinema_info, "메가박스 수원");
}

#[test]
fn rendered_clip_lists_every_showtime() {
    let raw = megabox_schedule(date(2019, 6, 1), "기생충", &[("11:00~13:12", "80/150"), ("24:10~26:22", "150/150")]);
    let clip = normalize(&raw, &ScheduleFilter::new(Some(1), None));

    let text = clip.render_with(None, RenderStyle::default());
    assert!(text.contains("기생충"));
    assert!(text.contains(" 11:00 - 13:12 |  80 / 150 | 메가박스 수원 (컴포트 1관)"));
    assert!(text.contains(" 24:10 - 26:22 | 150 / 150 | 메가박스 수원 (컴포트 1관)"));
    assert_eq!(Clip::from_json(&clip.to_json().unwrap()).unwrap(), clip);
}
