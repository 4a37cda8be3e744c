use kr_showtimes::{Clip, MovieGroup, Showtime};

fn showtime(start: &str, end: &str, cinema: &str, avail: u32, total: u32) -> Showtime {
    Showtime {
        start: start.into(),
        end: end.into(),
        hall_info: "2D 1관".into(),
        cinema_info: cinema.into(),
        total_capacity: total,
        available_capacity: avail,
    }
}

fn group(title: &str, rating: &str, timeline: Vec<Showtime>) -> MovieGroup {
    MovieGroup { title: title.into(), rating: rating.into(), timeline }
}

fn cgv() -> Clip {
    Clip::from_groups([
        group("기생충", "15", vec![showtime("10:00", "12:12", "CGV 수원", 100, 150)]),
        group("독전", "19", vec![showtime("21:30", "23:35", "CGV 수원", 40, 120)]),
    ])
}

fn lotte() -> Clip {
    Clip::from_groups([
        group("독전", "19", vec![showtime("24:10", "26:15", "롯데시네마 수원", 12, 98)]),
        group("버닝", "", vec![showtime("13:00", "15:28", "롯데시네마 수원", 0, 98)]),
    ])
}

fn megabox() -> Clip {
    Clip::from_groups([
        group("기생충", "", vec![
            showtime("11:00", "13:12", "메가박스 수원", 80, 90),
            showtime("25:00", "27:12", "메가박스 수원", 90, 90),
        ]),
        group("버닝", "", vec![showtime("19:00", "21:28", "메가박스 수원", 30, 60)]),
    ])
}

#[test]
fn merge_is_associative() {
    let (a, b, c) = (cgv(), lotte(), megabox());
    assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
}

#[test]
fn empty_clip_is_merge_identity() {
    let a = cgv();
    assert_eq!(Clip::new().merge(&a), a);
    assert_eq!(a.merge(&Clip::new()), a);
}

#[test]
fn merge_leaves_operands_untouched() {
    let (a, b) = (cgv(), megabox());
    let before = (a.clone(), b.clone());
    let merged = a.merge(&b);
    assert_eq!((a, b), before);
    assert_ne!(merged, before.0);
}

#[test]
fn merged_timelines_hold_every_showtime() {
    let (a, c) = (cgv(), megabox());
    let merged = a.merge(&c);

    let parasite = merged.get("기생충").unwrap();
    assert_eq!(
        parasite.timeline.len(),
        a.get("기생충").unwrap().timeline.len() + c.get("기생충").unwrap().timeline.len()
    );
    assert_eq!(parasite.timeline[0].cinema_info, "CGV 수원");
    assert_eq!(parasite.timeline[1].cinema_info, "메가박스 수원");
    assert_eq!(parasite.rating, "15");
    assert_eq!(merged.showtime_count(), a.showtime_count() + c.showtime_count());
}

#[test]
fn merge_all_follows_argument_order() {
    let all = Clip::merge_all([&cgv(), &lotte(), &megabox()]);
    assert_eq!(all.titles().collect::<Vec<_>>(), vec!["기생충", "독전", "버닝"]);
    let burning = all.get("버닝").unwrap();
    assert_eq!(burning.timeline[0].cinema_info, "롯데시네마 수원");
    assert_eq!(burning.timeline[1].cinema_info, "메가박스 수원");
}

#[test]
fn title_filter_is_idempotent() {
    let all = cgv().merge(&lotte()).merge(&megabox());
    let once = all.filter_title("기생");
    assert_eq!(once.filter_title("기생"), once);
    assert_eq!(once.titles().collect::<Vec<_>>(), vec!["기생충"]);
    assert!(all.filter_title("없는영화").is_empty());
}

#[test]
fn capacity_never_exceeds_total() {
    let all = Clip::merge_all([&cgv(), &lotte(), &megabox()]);
    for g in all.groups() {
        for s in &g.timeline {
            assert!(s.available_capacity <= s.total_capacity, "{} {}", g.title, s.start);
        }
    }
}

#[test]
fn exported_forms_round_trip() {
    let all = Clip::merge_all([&cgv(), &lotte(), &megabox()]);

    assert_eq!(Clip::from_structured(all.to_structured().unwrap()).unwrap(), all);
    assert_eq!(Clip::from_json(&all.to_json().unwrap()).unwrap(), all);
    assert_eq!(Clip::from_groups(all.to_list()), all);

    let keys: Vec<String> = all.to_structured().unwrap().as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["기생충", "독전", "버닝"]);
}
