use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CurriculumError;

static CURRICULA_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/curricula");

/// Sentences drawn from the focus category when building a mixed drill
const FOCUS_DRILLS: usize = 3;
/// Sentences drawn from other categories to break the rhythm
const CHANGE_UP_DRILLS: usize = 2;

/// A single practice sentence
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawEntry")]
pub struct CurriculumEntry {
    level: u32,
    text: String,
    guide: Option<String>,
}

#[derive(Deserialize)]
struct RawEntry {
    level: u32,
    text: String,
    #[serde(default)]
    guide: Option<String>,
}

impl TryFrom<RawEntry> for CurriculumEntry {
    type Error = CurriculumError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let entry = Self::new(raw.level, raw.text)?;
        Ok(match raw.guide {
            Some(guide) => entry.with_guide(guide),
            None => entry,
        })
    }
}

impl CurriculumEntry {
    pub fn new(level: u32, text: impl Into<String>) -> Result<Self, CurriculumError> {
        let text = text.into();
        if level == 0 {
            return Err(CurriculumError::InvalidLevel(level));
        }
        if text.is_empty() {
            return Err(CurriculumError::EmptyText);
        }
        Ok(Self {
            level,
            text,
            guide: None,
        })
    }

    /// Attach a coaching hint shown alongside the sentence
    pub fn with_guide(mut self, guide: impl Into<String>) -> Self {
        self.guide = Some(guide.into());
        self
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn guide(&self) -> Option<&str> {
        self.guide.as_deref()
    }

    /// Length in characters, which is what the engine scores
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Ordered list of practice sentences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Curriculum {
    entries: Vec<CurriculumEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CurriculumFile {
    Entries(Vec<CurriculumEntry>),
    Named {
        #[allow(dead_code)]
        #[serde(default)]
        name: Option<String>,
        entries: Vec<CurriculumEntry>,
    },
}

impl Curriculum {
    pub fn new(entries: Vec<CurriculumEntry>) -> Self {
        Self { entries }
    }

    /// Parse either a bare array of entries or `{ "entries": [...] }`
    pub fn from_json(json: &str) -> Result<Self, CurriculumError> {
        let entries = match serde_json::from_str::<CurriculumFile>(json)? {
            CurriculumFile::Entries(entries) => entries,
            CurriculumFile::Named { entries, .. } => entries,
        };
        Ok(Self::new(entries))
    }

    /// The built-in mixed Korean/English warm-up course
    pub fn warmup() -> Result<Self, CurriculumError> {
        read_embedded("warmup")
    }

    /// Five-sentence drill centred on `focus`: a few sentences from its bank
    /// plus a couple from other banks, shuffled.
    pub fn mixed<R: Rng + ?Sized>(
        focus: DrillCategory,
        rng: &mut R,
    ) -> Result<Self, CurriculumError> {
        let bank = focus.bank()?;
        let mut selected: Vec<CurriculumEntry> = bank
            .entries
            .choose_multiple(rng, FOCUS_DRILLS.min(bank.len()))
            .cloned()
            .collect();

        let others: Vec<DrillCategory> = DrillCategory::value_variants()
            .iter()
            .copied()
            .filter(|c| *c != focus)
            .collect();

        for _ in 0..CHANGE_UP_DRILLS {
            let Some(category) = others.choose(rng) else {
                break;
            };
            if let Some(entry) = category.bank()?.entries.choose(rng) {
                selected.push(entry.clone());
            }
        }

        selected.shuffle(rng);
        Ok(Self::new(selected))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&CurriculumEntry> {
        self.entries.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurriculumEntry> {
        self.entries.iter()
    }

    /// Distinct levels in order of first appearance
    pub fn levels(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.level).unique().collect()
    }
}

impl FromIterator<CurriculumEntry> for Curriculum {
    fn from_iter<I: IntoIterator<Item = CurriculumEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Built-in drill banks
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DrillCategory {
    BasicKo,
    BasicEng,
    ShiftMix,
    SymbolCode,
    LongSentence,
}

impl DrillCategory {
    pub fn bank(&self) -> Result<Curriculum, CurriculumError> {
        read_embedded(&self.to_string())
    }
}

fn read_embedded(name: &str) -> Result<Curriculum, CurriculumError> {
    let file_name = format!("{name}.json");
    let contents = CURRICULA_DIR
        .get_file(&file_name)
        .and_then(|f| f.contents_utf8())
        .ok_or(CurriculumError::MissingBuiltin(file_name))?;
    Curriculum::from_json(contents)
}
