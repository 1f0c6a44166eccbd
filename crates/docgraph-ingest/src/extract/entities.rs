//! Rule-based entity spotting.
//!
//! Rules run in a fixed order (person, organization, location, concept) and
//! each claims the byte spans it matched, so later rules never re-use text
//! an earlier rule already explained.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::{Entity, EntityKind};

static CAPITALIZED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+\b").expect("valid capitalized-word regex"));

static ORGANIZATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:[A-Z][A-Za-z0-9&'\-]*[ \t]+)+(?:Inc\.|Corp\.|Ltd\.|Co\.|LLC\b|Company\b|Corporation\b|University\b|Institute\b|Foundation\b|Association\b|Group\b)",
    )
    .expect("valid organization regex")
});

static LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:[A-Z][A-Za-z'\-]*[ \t]+)+(?:City|County|River|Lake|Mountains|Mountain|Valley|Island|State|Province|Bay)\b",
    )
    .expect("valid location regex")
});

static CONCEPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][A-Za-z]{3,}\b").expect("valid concept regex"));

/// Second words that make a two-word capitalized phrase an organization or
/// place rather than a person.
const NON_PERSON_SUFFIXES: &[&str] = &[
    "Inc", "Corp", "Ltd", "Co", "Company", "Corporation", "University", "Institute",
    "Foundation", "Association", "Group", "City", "County", "River", "Lake", "Mountain",
    "Mountains", "Valley", "Island", "State", "Province", "Bay",
];

/// Capitalized words that are usually sentence openers, not names.
const STOP_WORDS: &[&str] = &[
    "The", "This", "That", "These", "Those", "There", "Their", "They", "Then", "When", "Where",
    "What", "Which", "While", "Who", "Why", "How", "With", "Without", "From", "Into", "About",
    "After", "Before", "Also", "However", "Here", "Some", "Many", "Most", "Each", "Every",
    "Other", "Such", "Only", "Because", "Although", "Since", "Until", "Tell", "Show", "Please",
    "Dear", "Hello", "Thanks", "Yes", "Our", "Your", "His", "Her", "Its", "And", "But", "For",
    "Not", "All", "Any", "Chunk", "Page", "January", "February", "March", "April", "June",
    "July", "August", "September", "October", "November", "December", "Monday", "Tuesday",
    "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

/// One matched occurrence of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mention {
    pub start: usize,
    pub end: usize,
    /// Index into [`FoundEntities::entities`].
    pub entity: usize,
}

/// Entities plus every span the rules matched, ordered by position.
#[derive(Debug, Default)]
pub struct FoundEntities {
    pub entities: Vec<Entity>,
    pub mentions: Vec<Mention>,
}

impl FoundEntities {
    pub fn entity(&self, mention: &Mention) -> &Entity {
        &self.entities[mention.entity]
    }
}

#[derive(Default)]
struct Claims {
    spans: Vec<(usize, usize)>,
}

impl Claims {
    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.spans.iter().any(|&(s, e)| start < e && s < end)
    }

    fn claim(&mut self, start: usize, end: usize) {
        self.spans.push((start, end));
    }
}

/// Collects entities keyed by `(name, kind)` in first-seen order.
struct Collector<'t> {
    text: &'t str,
    found: FoundEntities,
    index: HashMap<(String, EntityKind), usize>,
    claims: Claims,
}

impl<'t> Collector<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            found: FoundEntities::default(),
            index: HashMap::new(),
            claims: Claims::default(),
        }
    }

    /// Record a mention unless its span is already claimed.
    fn add(&mut self, start: usize, end: usize, kind: EntityKind) {
        if start >= end || self.claims.overlaps(start, end) {
            return;
        }
        let name = &self.text[start..end];
        let key = (name.to_string(), kind);
        let entity = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                let i = self.found.entities.len();
                self.found.entities.push(Entity {
                    name: name.to_string(),
                    kind,
                    mentions: self.text.matches(name).count(),
                });
                self.index.insert(key, i);
                i
            }
        };
        self.claims.claim(start, end);
        self.found.mentions.push(Mention { start, end, entity });
    }

    fn finish(mut self) -> FoundEntities {
        self.found.mentions.sort_by_key(|m| (m.start, m.end));
        self.found
    }
}

/// Find entities and their mentions in `text`.
pub fn find_entities(text: &str) -> FoundEntities {
    let mut collector = Collector::new(text);
    find_persons(&mut collector);
    find_phrases(&mut collector, &ORGANIZATION, EntityKind::Organization);
    find_phrases(&mut collector, &LOCATION, EntityKind::Location);
    find_concepts(&mut collector);
    collector.finish()
}

/// Two adjacent capitalized words separated by a single space, unless the
/// pair opens an organization or place name.
fn find_persons(collector: &mut Collector<'_>) {
    let text = collector.text;
    let words: Vec<_> = CAPITALIZED_WORD.find_iter(text).collect();
    let adjacent = |a: &regex::Match<'_>, b: &regex::Match<'_>| &text[a.end()..b.start()] == " ";

    let mut i = 0;
    while i + 1 < words.len() {
        let (first, second) = (&words[i], &words[i + 1]);
        let continues_as_place = words
            .get(i + 2)
            .is_some_and(|third| adjacent(second, third) && NON_PERSON_SUFFIXES.contains(&third.as_str()));
        if adjacent(first, second)
            && !continues_as_place
            && !STOP_WORDS.contains(&first.as_str())
            && !NON_PERSON_SUFFIXES.contains(&second.as_str())
        {
            collector.add(first.start(), second.end(), EntityKind::Person);
            i += 2;
        } else {
            i += 1;
        }
    }
}

/// Capitalized phrases ending in a suffix, with leading stop words dropped.
fn find_phrases(collector: &mut Collector<'_>, pattern: &Regex, kind: EntityKind) {
    let text = collector.text;
    for m in pattern.find_iter(text) {
        let mut start = m.start();
        while let Some((first, rest)) = text[start..m.end()].split_once([' ', '\t']) {
            if !STOP_WORDS.contains(&first) {
                break;
            }
            start = m.end() - rest.trim_start().len();
        }
        if text[start..m.end()].split_whitespace().count() < 2 {
            continue;
        }
        collector.add(start, m.end(), kind);
    }
}

fn find_concepts(collector: &mut Collector<'_>) {
    let text = collector.text;
    for m in CONCEPT.find_iter(text) {
        if STOP_WORDS.contains(&m.as_str()) {
            continue;
        }
        collector.add(m.start(), m.end(), EntityKind::Concept);
    }
}
