//! Hierarchical concept graph used by semantic similarity.
//!
//! A taxonomy is a set of senses, each with the lemmas that express it and the more
//! general senses (hypernyms) it specializes. It is built once at startup from a JSON
//! sense list, a WordNet database directory, or the bundled seed, and shared read-only
//! afterwards.

use crate::text::normalize;
use crate::wordnet;
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use thiserror::Error;

const BUILTIN: &str = include_str!("../data/taxonomy.json");

/// Name of the simulated root placed above every root of a verb, adjective or adverb
/// hierarchy. Sorts before any real sense name.
const SIMULATED_ROOT: &str = "*ROOT*";

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("failed to read taxonomy {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid taxonomy json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("malformed wordnet line {line} in {path}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("no wordnet data files in {0}")]
    NoWordNetData(PathBuf),
    #[error("duplicate sense id: {0}")]
    DuplicateSense(String),
    #[error("sense {sense} names unknown hypernym {hypernym}")]
    UnknownHypernym { sense: String, hypernym: String },
    #[error("hypernym cycle through {0}")]
    Cycle(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum PartOfSpeech {
    #[default]
    #[serde(rename = "n")]
    Noun,
    #[serde(rename = "v")]
    Verb,
    #[serde(rename = "a")]
    Adjective,
    #[serde(rename = "s")]
    Satellite,
    #[serde(rename = "r")]
    Adverb,
}

const LOOKUP_ORDER: [PartOfSpeech; 4] = [
    PartOfSpeech::Noun,
    PartOfSpeech::Verb,
    PartOfSpeech::Adjective,
    PartOfSpeech::Adverb,
];

impl PartOfSpeech {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "n" => Some(Self::Noun),
            "v" => Some(Self::Verb),
            "a" => Some(Self::Adjective),
            "s" => Some(Self::Satellite),
            "r" => Some(Self::Adverb),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Noun => "n",
            Self::Verb => "v",
            Self::Adjective => "a",
            Self::Satellite => "s",
            Self::Adverb => "r",
        }
    }

    /// Satellites are indexed with their head adjectives.
    pub fn index_category(self) -> Self {
        match self {
            Self::Satellite => Self::Adjective,
            other => other,
        }
    }

    fn has_single_root(self) -> bool {
        self == Self::Noun
    }

    fn substitutions(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Noun => &[
                ("s", ""),
                ("ses", "s"),
                ("ves", "f"),
                ("xes", "x"),
                ("zes", "z"),
                ("ches", "ch"),
                ("shes", "sh"),
                ("men", "man"),
                ("ies", "y"),
            ],
            Self::Verb => &[
                ("s", ""),
                ("ies", "y"),
                ("es", "e"),
                ("es", ""),
                ("ed", "e"),
                ("ed", ""),
                ("ing", "e"),
                ("ing", ""),
            ],
            Self::Adjective | Self::Satellite => {
                &[("er", ""), ("est", ""), ("er", "e"), ("est", "e")]
            }
            Self::Adverb => &[],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SenseRecord {
    pub id: String,
    #[serde(default)]
    pub pos: PartOfSpeech,
    pub lemmas: Vec<String>,
    #[serde(default)]
    pub hypernyms: Vec<String>,
}

pub type SenseId = usize;

#[derive(Debug)]
struct Sense {
    id: String,
    pos: PartOfSpeech,
    hypernyms: Vec<SenseId>,
    /// Shortest hypernym path to a root, in edges.
    min_depth: usize,
    /// Longest hypernym path to a root, in edges.
    max_depth: usize,
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Subsumer {
    Sense(SenseId),
    SimulatedRoot,
}

type LemmaKey = (PartOfSpeech, String);

#[derive(Debug)]
pub struct Taxonomy {
    senses: Vec<Sense>,
    lemmas: HashMap<LemmaKey, Vec<SenseId>>,
    exceptions: HashMap<LemmaKey, Vec<String>>,
}

impl Taxonomy {
    pub fn builtin() -> Result<Self, TaxonomyError> {
        Self::from_json_str(BUILTIN)
    }

    /// A directory is read as a WordNet database; a file as a JSON sense list.
    pub fn load(path: &Path) -> Result<Self, TaxonomyError> {
        if path.is_dir() {
            return Self::from_wordnet_dir(path);
        }
        let raw = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, TaxonomyError> {
        let records: Vec<SenseRecord> = serde_json::from_str(raw)?;
        Self::from_records(records)
    }

    pub fn from_wordnet_dir(dir: &Path) -> Result<Self, TaxonomyError> {
        let db = wordnet::read_dir(dir)?;
        let mut taxonomy = Self::from_records(db.records)?;
        taxonomy.lemmas = db
            .index
            .into_iter()
            .map(|((pos, lemma), senses)| ((pos, lemma_key(&lemma)), senses))
            .collect();
        taxonomy.exceptions = db.exceptions;
        Ok(taxonomy)
    }

    pub fn from_records(records: Vec<SenseRecord>) -> Result<Self, TaxonomyError> {
        let mut ids: HashMap<String, SenseId> = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            if ids.insert(record.id.clone(), idx).is_some() {
                return Err(TaxonomyError::DuplicateSense(record.id.clone()));
            }
        }

        let mut senses = Vec::with_capacity(records.len());
        let mut lemmas: HashMap<LemmaKey, Vec<SenseId>> = HashMap::new();
        for (idx, record) in records.into_iter().enumerate() {
            let hypernyms = record
                .hypernyms
                .iter()
                .map(|h| {
                    ids.get(h).copied().ok_or_else(|| TaxonomyError::UnknownHypernym {
                        sense: record.id.clone(),
                        hypernym: h.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            for lemma in &record.lemmas {
                let entry = lemmas
                    .entry((record.pos.index_category(), lemma_key(lemma)))
                    .or_default();
                if !entry.contains(&idx) {
                    entry.push(idx);
                }
            }
            senses.push(Sense {
                id: record.id,
                pos: record.pos,
                hypernyms,
                min_depth: 0,
                max_depth: 0,
            });
        }

        let mut marks = vec![Mark::Unvisited; senses.len()];
        for idx in 0..senses.len() {
            resolve_depth(&mut senses, &mut marks, idx)?;
        }

        Ok(Self {
            senses,
            lemmas,
            exceptions: HashMap::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.senses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senses.is_empty()
    }

    /// Senses expressed by a whole phrase, across every part of speech. Words of a
    /// phrase are joined with `_`; inflected forms are reduced to their base forms.
    pub fn senses(&self, phrase: &str) -> Vec<SenseId> {
        let key = lemma_key(phrase);
        if key.is_empty() {
            return Vec::new();
        }
        let mut found = Vec::new();
        for pos in LOOKUP_ORDER {
            for form in self.base_forms(&key, pos) {
                if let Some(ids) = self.lemmas.get(&(pos, form)) {
                    for id in ids {
                        if !found.contains(id) {
                            found.push(*id);
                        }
                    }
                }
            }
        }
        found
    }

    fn is_indexed(&self, pos: PartOfSpeech, form: &str) -> bool {
        self.lemmas.contains_key(&(pos, form.to_string()))
    }

    fn base_forms(&self, form: &str, pos: PartOfSpeech) -> Vec<String> {
        let keep_indexed = |forms: Vec<String>| -> Vec<String> {
            let mut seen = HashSet::new();
            forms
                .into_iter()
                .filter(|f| self.is_indexed(pos, f) && seen.insert(f.clone()))
                .collect()
        };

        if let Some(bases) = self.exceptions.get(&(pos, form.to_string())) {
            let mut forms = vec![form.to_string()];
            forms.extend(bases.iter().cloned());
            return keep_indexed(forms);
        }

        let mut forms = apply_substitutions(&[form.to_string()], pos);
        let mut first = vec![form.to_string()];
        first.extend(forms.iter().cloned());
        let found = keep_indexed(first);
        if !found.is_empty() {
            return found;
        }
        while !forms.is_empty() {
            forms = apply_substitutions(&forms, pos);
            let found = keep_indexed(forms.clone());
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Wu-Palmer similarity: `2 * depth(lcs) / (len(a) + len(b))`, where depths count
    /// nodes from the root and each length is the path to the lowest common subsumer plus
    /// its depth. Hierarchies without a single root share a simulated one. `None` when
    /// the senses share no ancestor.
    pub fn wup_similarity(&self, a: SenseId, b: SenseId) -> Option<f64> {
        let simulate_root =
            !(self.senses[a].pos.has_single_root() && self.senses[b].pos.has_single_root());
        let from_a = self.ancestors(a);
        let from_b = self.ancestors(b);

        let mut candidates: Vec<Subsumer> = from_a
            .keys()
            .filter(|sense| from_b.contains_key(sense))
            .map(|&sense| Subsumer::Sense(sense))
            .collect();
        if simulate_root {
            candidates.push(Subsumer::SimulatedRoot);
        }
        let deepest = candidates.iter().map(|c| self.min_depth(*c)).max()?;
        let mut lowest: Vec<Subsumer> = candidates
            .into_iter()
            .filter(|c| self.min_depth(*c) == deepest)
            .collect();
        lowest.sort_by(|x, y| self.name(*x).cmp(self.name(*y)));
        let subsumer = if lowest.contains(&Subsumer::Sense(a)) {
            Subsumer::Sense(a)
        } else {
            *lowest.first()?
        };

        let depth = match subsumer {
            Subsumer::Sense(sense) => (self.senses[sense].max_depth + 1) as f64,
            Subsumer::SimulatedRoot => 1.0,
        };
        let len_a = self.distance_to(&from_a, subsumer, simulate_root)? as f64 + depth;
        let len_b = self.distance_to(&from_b, subsumer, simulate_root)? as f64 + depth;
        Some(2.0 * depth / (len_a + len_b))
    }

    fn min_depth(&self, subsumer: Subsumer) -> usize {
        match subsumer {
            Subsumer::Sense(sense) => self.senses[sense].min_depth,
            Subsumer::SimulatedRoot => 0,
        }
    }

    fn name(&self, subsumer: Subsumer) -> &str {
        match subsumer {
            Subsumer::Sense(sense) => &self.senses[sense].id,
            Subsumer::SimulatedRoot => SIMULATED_ROOT,
        }
    }

    /// Shortest path from the sense behind `from` to `subsumer` through any ancestor
    /// the two share. With a simulated root, each side reaches it one edge past its
    /// farthest ancestor.
    fn distance_to(
        &self,
        from: &HashMap<SenseId, usize>,
        subsumer: Subsumer,
        simulate_root: bool,
    ) -> Option<usize> {
        let beyond = |paths: &HashMap<SenseId, usize>| {
            paths.values().copied().max().unwrap_or(0) + 1
        };
        match subsumer {
            Subsumer::SimulatedRoot => Some(beyond(from)),
            Subsumer::Sense(sense) => {
                let to = self.ancestors(sense);
                let shared = from
                    .iter()
                    .filter_map(|(ancestor, d)| to.get(ancestor).map(|e| d + e))
                    .min();
                let via_root = simulate_root.then(|| beyond(from) + beyond(&to));
                match (shared, via_root) {
                    (Some(s), Some(r)) => Some(s.min(r)),
                    (s, r) => s.or(r),
                }
            }
        }
    }

    fn ancestors(&self, sense: SenseId) -> HashMap<SenseId, usize> {
        let mut seen = HashMap::from([(sense, 0usize)]);
        let mut queue = VecDeque::from([sense]);
        while let Some(current) = queue.pop_front() {
            let dist = seen[&current];
            for &parent in &self.senses[current].hypernyms {
                if !seen.contains_key(&parent) {
                    seen.insert(parent, dist + 1);
                    queue.push_back(parent);
                }
            }
        }
        seen
    }
}

fn apply_substitutions(forms: &[String], pos: PartOfSpeech) -> Vec<String> {
    let mut out = Vec::new();
    for form in forms {
        for (suffix, replacement) in pos.substitutions() {
            if let Some(stem) = form.strip_suffix(suffix) {
                let candidate = format!("{stem}{replacement}");
                if !out.contains(&candidate) {
                    out.push(candidate);
                }
            }
        }
    }
    out
}

fn lemma_key(text: &str) -> String {
    normalize(text).replace(' ', "_")
}

fn resolve_depth(
    senses: &mut [Sense],
    marks: &mut [Mark],
    idx: SenseId,
) -> Result<(usize, usize), TaxonomyError> {
    match marks[idx] {
        Mark::Done => return Ok((senses[idx].min_depth, senses[idx].max_depth)),
        Mark::Visiting => return Err(TaxonomyError::Cycle(senses[idx].id.clone())),
        Mark::Unvisited => {}
    }
    marks[idx] = Mark::Visiting;
    let parents = senses[idx].hypernyms.clone();
    let mut min_depth: Option<usize> = None;
    let mut max_depth = 0;
    for parent in parents {
        let (pmin, pmax) = resolve_depth(senses, marks, parent)?;
        min_depth = Some(min_depth.map_or(pmin + 1, |d| d.min(pmin + 1)));
        max_depth = max_depth.max(pmax + 1);
    }
    senses[idx].min_depth = min_depth.unwrap_or(0);
    senses[idx].max_depth = max_depth;
    marks[idx] = Mark::Done;
    Ok((senses[idx].min_depth, max_depth))
}
