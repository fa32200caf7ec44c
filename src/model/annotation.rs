//! Segment / link / group annotations carried by `#!` directives.
//!
//! Segments cover a character range `[start, end)` of their scope (the
//! sentence for `*_S` directives, the whole document otherwise). Links and
//! groups refer to segments by their position in the owning list.

use std::collections::{BTreeMap, HashMap};

pub type Range = (usize, usize);

/// Whether an annotation came from a sentence-scoped (`*_S`) directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Document,
    Sentence,
}

impl Scope {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Document => "",
            Self::Sentence => "_S",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub scope: Scope,
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub comment: String,
    pub attrs: BTreeMap<String, String>,
}

impl Segment {
    pub fn range(&self) -> Range {
        (self.start, self.end)
    }

    /// True if this segment covers `range` entirely.
    pub fn covers(&self, range: Range) -> bool {
        self.start <= range.0 && range.1 <= self.end && range.0 < range.1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub scope: Scope,
    pub name: String,
    pub from: usize,
    pub to: usize,
    pub comment: String,
    pub attrs: BTreeMap<String, String>,
}

impl Link {
    /// Case label of a predicate-argument link (`pas:ga` → `ga`).
    pub fn pas_case(&self) -> Option<&str> {
        self.name.strip_prefix("pas:")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub scope: Scope,
    pub name: String,
    pub members: Vec<usize>,
    pub comment: String,
    pub attrs: BTreeMap<String, String>,
}

/// Annotations of one scope plus range indices for O(1) lookups.
#[derive(Debug, Clone, Default)]
pub struct AnnotationList {
    segments: Vec<Segment>,
    links: Vec<Link>,
    groups: Vec<Group>,
    by_range: HashMap<Range, Vec<usize>>,
    link_index: HashMap<(Range, Range), Vec<usize>>,
    group_index: HashMap<(Range, Range), Vec<usize>>,
    /// Insertion order across the three kinds, for faithful re-serialization.
    order: Vec<(AnnotationKind, usize)>,
}

impl AnnotationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.links.is_empty() && self.groups.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn push_segment(&mut self, seg: Segment) {
        let idx = self.segments.len();
        self.by_range.entry(seg.range()).or_default().push(idx);
        self.order.push((AnnotationKind::Segment, idx));
        self.segments.push(seg);
    }

    /// Adds a link. Links pointing at unknown segments are kept verbatim but
    /// are not indexed.
    pub fn push_link(&mut self, link: Link) {
        let idx = self.links.len();
        if let (Some(a), Some(b)) = (self.segments.get(link.from), self.segments.get(link.to)) {
            self.link_index
                .entry((a.range(), b.range()))
                .or_default()
                .push(idx);
        }
        self.order.push((AnnotationKind::Link, idx));
        self.links.push(link);
    }

    pub fn push_group(&mut self, group: Group) {
        let idx = self.groups.len();
        for &a in &group.members {
            for &b in &group.members {
                if a == b {
                    continue;
                }
                if let (Some(sa), Some(sb)) = (self.segments.get(a), self.segments.get(b)) {
                    self.group_index
                        .entry((sa.range(), sb.range()))
                        .or_default()
                        .push(idx);
                }
            }
        }
        self.order.push((AnnotationKind::Group, idx));
        self.groups.push(group);
    }

    /// Annotations in the order they were added.
    pub fn in_order(&self) -> impl Iterator<Item = (AnnotationKind, usize)> + '_ {
        self.order.iter().copied()
    }

    /// Attaches an `ATTR` key/value to the most recently added annotation of
    /// the given kind.
    pub fn last_attrs_mut(&mut self, kind: AnnotationKind) -> Option<&mut BTreeMap<String, String>> {
        match kind {
            AnnotationKind::Segment => self.segments.last_mut().map(|s| &mut s.attrs),
            AnnotationKind::Link => self.links.last_mut().map(|l| &mut l.attrs),
            AnnotationKind::Group => self.groups.last_mut().map(|g| &mut g.attrs),
        }
    }

    /// Segments whose range is exactly `range`.
    pub fn segments_at(&self, range: Range) -> impl Iterator<Item = &Segment> {
        self.by_range
            .get(&range)
            .into_iter()
            .flatten()
            .map(move |&i| &self.segments[i])
    }

    /// Positions of segments covering `range`.
    pub fn covering(&self, range: Range) -> impl Iterator<Item = usize> + '_ {
        self.segments
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.covers(range))
            .map(|(i, _)| i)
    }

    pub fn segment(&self, idx: usize) -> Option<&Segment> {
        self.segments.get(idx)
    }

    pub fn links_between(&self, from: Range, to: Range) -> impl Iterator<Item = &Link> {
        self.link_index
            .get(&(from, to))
            .into_iter()
            .flatten()
            .map(move |&i| &self.links[i])
    }

    pub fn groups_between(&self, a: Range, b: Range) -> impl Iterator<Item = &Group> {
        self.group_index
            .get(&(a, b))
            .into_iter()
            .flatten()
            .map(move |&i| &self.groups[i])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Segment,
    Link,
    Group,
}
