use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use serde_json::Value;

use crate::{
    error::Result,
    models::{DetailIndex, MovieGroup, Showtime},
    render::{self, RenderStyle},
};

/// Showtimes grouped by movie title, in the order titles were first seen.
///
/// A `Clip` only grows through [`Clip::merge`], which returns a new value and
/// concatenates timelines of equal titles without deduplicating them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Clip {
    groups: Vec<MovieGroup>,
}

impl Clip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a clip from groups, folding groups that share a title.
    pub fn from_groups(groups: impl IntoIterator<Item = MovieGroup>) -> Self {
        let mut clip = Self::new();
        for group in groups {
            clip.absorb(group);
        }
        clip
    }

    pub fn merge(&self, other: &Clip) -> Clip {
        let mut out = self.clone();
        for group in &other.groups {
            out.absorb(group.clone());
        }
        out
    }

    pub fn merge_all<'a>(clips: impl IntoIterator<Item = &'a Clip>) -> Clip {
        clips.into_iter().fold(Clip::new(), |acc, clip| acc.merge(clip))
    }

    pub(crate) fn push(&mut self, title: &str, rating: &str, showtime: Showtime) {
        match self.position(title) {
            Some(idx) => {
                let group = &mut self.groups[idx];
                if group.rating.is_empty() {
                    group.rating = rating.to_string();
                }
                group.timeline.push(showtime);
            },
            None => {
                let mut group = MovieGroup::new(title, rating);
                group.timeline.push(showtime);
                self.groups.push(group);
            },
        }
    }

    fn absorb(&mut self, group: MovieGroup) {
        match self.position(&group.title) {
            Some(idx) => {
                let existing = &mut self.groups[idx];
                if existing.rating.is_empty() {
                    existing.rating = group.rating;
                }
                existing.timeline.extend(group.timeline);
            },
            None => self.groups.push(group),
        }
    }

    fn position(&self, title: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.title == title)
    }

    pub fn get(&self, title: &str) -> Option<&MovieGroup> {
        self.position(title).map(|idx| &self.groups[idx])
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.title.as_str())
    }

    pub fn groups(&self) -> &[MovieGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn showtime_count(&self) -> usize {
        self.groups.iter().map(|g| g.timeline.len()).sum()
    }

    /// Keeps the groups whose title contains `needle` (case-sensitive).
    pub fn filter_title(&self, needle: &str) -> Clip {
        let groups = self.groups.iter().filter(|g| g.title.contains(needle)).cloned().collect();
        Clip { groups }
    }

    pub fn to_list(&self) -> Vec<MovieGroup> {
        self.groups.clone()
    }

    /// `{title: {title, rating, timeline: [showtime, ..]}, ..}` in insertion order.
    pub fn to_structured(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_structured(value: Value) -> Result<Clip> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Clip> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn render(&self, details: Option<&DetailIndex>) -> String {
        render::render(self, details, RenderStyle::default())
    }

    pub fn render_with(&self, details: Option<&DetailIndex>, style: RenderStyle) -> String {
        render::render(self, details, style)
    }
}

impl Serialize for Clip {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.title, group)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Clip {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(ClipVisitor)
    }
}

struct ClipVisitor;

impl<'de> Visitor<'de> for ClipVisitor {
    type Value = Clip;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping of movie title to movie group")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Clip, A::Error> {
        let mut clip = Clip::new();
        while let Some((title, mut group)) = access.next_entry::<String, MovieGroup>()? {
            // the key is the merge key
            group.title = title;
            clip.absorb(group);
        }
        Ok(clip)
    }
}
