//! Reader for a WordNet database directory (`data.*`, `index.*` and `*.exc` files).

use crate::taxonomy::{PartOfSpeech, SenseId, SenseRecord, TaxonomyError};
use std::collections::HashMap;
use std::path::Path;

const FILES: [(PartOfSpeech, &str); 4] = [
    (PartOfSpeech::Noun, "noun"),
    (PartOfSpeech::Verb, "verb"),
    (PartOfSpeech::Adjective, "adj"),
    (PartOfSpeech::Adverb, "adv"),
];

const HYPERNYM: &str = "@";
const INSTANCE_HYPERNYM: &str = "@i";

pub(crate) struct WordNetDb {
    pub records: Vec<SenseRecord>,
    pub index: HashMap<(PartOfSpeech, String), Vec<SenseId>>,
    pub exceptions: HashMap<(PartOfSpeech, String), Vec<String>>,
}

type Address = (PartOfSpeech, u64);

struct Synset {
    category: PartOfSpeech,
    offset: u64,
    pos: PartOfSpeech,
    words: Vec<String>,
    hypernyms: Vec<Address>,
}

pub(crate) fn read_dir(dir: &Path) -> Result<WordNetDb, TaxonomyError> {
    let mut synsets = Vec::new();
    let mut found_data = false;
    for (category, suffix) in FILES {
        let path = dir.join(format!("data.{suffix}"));
        if !path.is_file() {
            continue;
        }
        found_data = true;
        for_each_line(&path, |line| {
            synsets.push(parse_data_line(line, category)?);
            Ok(())
        })?;
    }
    if !found_data {
        return Err(TaxonomyError::NoWordNetData(dir.to_path_buf()));
    }

    let mut offsets: HashMap<(PartOfSpeech, String), Vec<u64>> = HashMap::new();
    let mut exceptions = HashMap::new();
    for (category, suffix) in FILES {
        let index_path = dir.join(format!("index.{suffix}"));
        if index_path.is_file() {
            for_each_line(&index_path, |line| {
                let (lemma, synset_offsets) = parse_index_line(line)?;
                offsets.insert((category, lemma), synset_offsets);
                Ok(())
            })?;
        }
        let exc_path = dir.join(format!("{suffix}.exc"));
        if exc_path.is_file() {
            for_each_line(&exc_path, |line| {
                let mut words = line.split_whitespace().map(str::to_lowercase);
                if let Some(inflected) = words.next() {
                    exceptions.insert((category, inflected), words.collect());
                }
                Ok(())
            })?;
        }
    }

    let position: HashMap<Address, SenseId> = synsets
        .iter()
        .enumerate()
        .map(|(idx, s)| ((s.category, s.offset), idx))
        .collect();
    let names: Vec<String> = synsets.iter().map(|s| synset_name(s, &offsets)).collect();

    let records = synsets
        .iter()
        .zip(&names)
        .map(|(synset, name)| SenseRecord {
            id: name.clone(),
            pos: synset.pos,
            lemmas: synset.words.clone(),
            hypernyms: synset
                .hypernyms
                .iter()
                .map(|target| match position.get(target) {
                    Some(&idx) => names[idx].clone(),
                    None => format!("{}@{:08}", target.0.code(), target.1),
                })
                .collect(),
        })
        .collect();

    let index = offsets
        .into_iter()
        .map(|((category, lemma), synset_offsets)| {
            let senses = synset_offsets
                .iter()
                .filter_map(|offset| position.get(&(category, *offset)).copied())
                .collect();
            ((category, lemma), senses)
        })
        .collect();

    Ok(WordNetDb {
        records,
        index,
        exceptions,
    })
}

fn for_each_line(
    path: &Path,
    mut handle: impl FnMut(&str) -> Result<(), String>,
) -> Result<(), TaxonomyError> {
    let bytes = std::fs::read(path).map_err(|source| TaxonomyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    for (lineno, line) in text.lines().enumerate() {
        // License header lines are indented.
        if line.trim().is_empty() || line.starts_with(' ') {
            continue;
        }
        handle(line).map_err(|reason| TaxonomyError::Malformed {
            path: path.to_path_buf(),
            line: lineno + 1,
            reason,
        })?;
    }
    Ok(())
}

fn field<'a>(tokens: &mut impl Iterator<Item = &'a str>, what: &str) -> Result<&'a str, String> {
    tokens.next().ok_or_else(|| format!("missing {what}"))
}

fn number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, String> {
    raw.parse().map_err(|_| format!("bad {what}: {raw}"))
}

fn part_of_speech(raw: &str) -> Result<PartOfSpeech, String> {
    PartOfSpeech::from_code(raw).ok_or_else(|| format!("unknown part of speech: {raw}"))
}

// offset lex_filenum ss_type w_cnt (word lex_id)* p_cnt (symbol offset pos st)* ... | gloss
fn parse_data_line(line: &str, category: PartOfSpeech) -> Result<Synset, String> {
    let body = line.split_once(" | ").map_or(line, |(body, _)| body);
    let mut tokens = body.split_whitespace();

    let offset = number(field(&mut tokens, "offset")?, "offset")?;
    field(&mut tokens, "lexicographer file")?;
    let pos = part_of_speech(field(&mut tokens, "synset type")?)?;
    let raw_count = field(&mut tokens, "word count")?;
    let word_count = usize::from_str_radix(raw_count, 16)
        .map_err(|_| format!("bad word count: {raw_count}"))?;
    if word_count == 0 {
        return Err("synset without words".to_string());
    }

    let mut words = Vec::with_capacity(word_count);
    for _ in 0..word_count {
        let word = field(&mut tokens, "word")?;
        field(&mut tokens, "lex id")?;
        words.push(strip_marker(word).to_string());
    }

    let pointer_count: usize = number(field(&mut tokens, "pointer count")?, "pointer count")?;
    let mut hypernyms = Vec::new();
    for _ in 0..pointer_count {
        let symbol = field(&mut tokens, "pointer symbol")?;
        let target = number(field(&mut tokens, "pointer offset")?, "pointer offset")?;
        let target_pos = part_of_speech(field(&mut tokens, "pointer pos")?)?;
        field(&mut tokens, "pointer source/target")?;
        if symbol == HYPERNYM || symbol == INSTANCE_HYPERNYM {
            hypernyms.push((target_pos.index_category(), target));
        }
    }

    Ok(Synset {
        category,
        offset,
        pos,
        words,
        hypernyms,
    })
}

// lemma pos synset_cnt p_cnt symbol* sense_cnt tagsense_cnt offset{synset_cnt}
fn parse_index_line(line: &str) -> Result<(String, Vec<u64>), String> {
    let mut tokens = line.split_whitespace();
    let lemma = field(&mut tokens, "lemma")?.to_string();
    field(&mut tokens, "pos")?;
    let synset_count: usize = number(field(&mut tokens, "synset count")?, "synset count")?;
    let pointer_count: usize = number(field(&mut tokens, "pointer count")?, "pointer count")?;
    for _ in 0..pointer_count {
        field(&mut tokens, "pointer symbol")?;
    }
    field(&mut tokens, "sense count")?;
    field(&mut tokens, "tagged sense count")?;
    let offsets = (0..synset_count)
        .map(|_| number(field(&mut tokens, "synset offset")?, "synset offset"))
        .collect::<Result<Vec<u64>, String>>()?;
    Ok((lemma, offsets))
}

/// Adjectives may carry a syntactic marker such as `(a)` or `(ip)`.
fn strip_marker(word: &str) -> &str {
    match word.find('(') {
        Some(idx) if word.ends_with(')') => &word[..idx],
        _ => word,
    }
}

// `<first lemma>.<pos>.<sense number>`, the sense number being the synset's position
// among that lemma's senses.
fn synset_name(synset: &Synset, offsets: &HashMap<(PartOfSpeech, String), Vec<u64>>) -> String {
    let lemma = synset.words[0].to_lowercase();
    let code = synset.pos.code();
    match offsets
        .get(&(synset.category, lemma.clone()))
        .and_then(|senses| senses.iter().position(|o| *o == synset.offset))
    {
        Some(idx) => format!("{lemma}.{code}.{:02}", idx + 1),
        None => format!("{lemma}.{code}.{:08}", synset.offset),
    }
}
