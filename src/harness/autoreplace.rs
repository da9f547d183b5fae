//! Batch comparison of a desktop auto-replace word list against the service.
//!
//! Each locale directory holds a `word|replacement` file. Entries whose word
//! ends in an apostrophe (`cafe'|café`) mark accented forms: the stem is sent
//! to the service and its auto-accept guess is compared with the replacement.

use super::case::split_fields;
use super::CaseRunner;
use crate::{SpellCheckResult, SpellCheckService};
use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

lazy_static! {
    static ref ACCENT_CANDIDATE: Regex = Regex::new(r"^(.+)'$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoReplaceEntry {
    /// Word to query, without the trailing apostrophe
    pub word: String,
    pub mapped: String,
}

/// Optional 1-based window over the accented candidates
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateRange {
    pub from: Option<usize>,
    pub to: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct WordList {
    /// Every well-formed `word|replacement` line scanned
    pub words: usize,
    pub candidates: Vec<AutoReplaceEntry>,
}

impl WordList {
    pub fn load(path: &Path, range: CandidateRange) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read word list: {}", path.display()))?;
        Ok(Self::parse(&content, range))
    }

    pub fn parse(content: &str, range: CandidateRange) -> Self {
        let mut list = Self::default();
        let mut idx = 0;

        for line in content.lines() {
            let items = split_fields(line, '|');
            let [word, mapped] = items.as_slice() else {
                continue;
            };
            list.words += 1;

            let Some(caps) = ACCENT_CANDIDATE.captures(word) else {
                continue;
            };
            idx += 1;
            if range.from.is_some_and(|from| idx < from) {
                continue;
            }
            if range.to.is_some_and(|to| idx > to) {
                break;
            }

            list.candidates.push(AutoReplaceEntry {
                word: caps[1].to_string(),
                mapped: mapped.to_string(),
            });
        }

        list
    }
}

/// What the service said about one accented candidate.
#[derive(Debug, Clone, Serialize)]
pub struct GuessInfo {
    pub word: String,
    pub mapped: String,
    pub result: SpellCheckResult,
    /// Index of the guess equal to the mapped form
    pub guess_idx: Option<usize>,
    /// Index of the guess echoing the queried word
    pub word_idx: Option<usize>,
    pub top_guess: String,
    /// Last guess flagged auto-accept, empty if none
    pub auto_accept_word: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GuessInfo {
    pub fn inspect(entry: &AutoReplaceEntry, result: SpellCheckResult) -> Self {
        let mut info = Self {
            word: entry.word.clone(),
            mapped: entry.mapped.clone(),
            result: SpellCheckResult::default(),
            guess_idx: None,
            word_idx: None,
            top_guess: String::new(),
            auto_accept_word: String::new(),
            error: None,
        };

        for (idx, guess) in result.guesses.iter().enumerate() {
            if guess.text == entry.mapped {
                info.guess_idx = Some(idx);
            } else if guess.text == entry.word {
                info.word_idx = Some(idx);
            }
            if guess.auto_accept {
                info.auto_accept_word = guess.text.clone();
            }
        }

        if info.guess_idx.is_some_and(|idx| idx > 1) {
            log::warn!(
                "Got matching guess that was not the top guess for {}",
                entry.word
            );
        }
        if let Some(second) = result.guesses.get(1) {
            info.top_guess = second.text.clone();
        }

        info.result = result;
        info
    }

    pub fn is_correct(&self) -> bool {
        self.auto_accept_word == self.mapped
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AutoReplaceStats {
    pub words: usize,
    pub accents: usize,
    pub accents_with_guesses: usize,
    pub accents_spelled_correctly: usize,
    pub accents_with_auto_accept: usize,
    pub accents_correct: usize,
}

impl AutoReplaceStats {
    pub fn new(list: &WordList) -> Self {
        Self {
            words: list.words,
            accents: list.candidates.len(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, info: &GuessInfo) {
        if info.result.guesses.len() > 1 {
            self.accents_with_guesses += 1;
        }
        if info.result.spelled_correctly {
            self.accents_spelled_correctly += 1;
        }
        if !info.auto_accept_word.is_empty() {
            self.accents_with_auto_accept += 1;
        }
        if info.is_correct() {
            self.accents_correct += 1;
        }
    }
}

impl<S: SpellCheckService> CaseRunner<S> {
    /// Query every candidate and hand each inspection to `on_row` in list order.
    ///
    /// A failed query counts as an empty result so one bad word never stops
    /// the batch.
    pub fn compare_autoreplace(
        &self,
        list: &WordList,
        mut on_row: impl FnMut(&GuessInfo),
    ) -> AutoReplaceStats {
        let mut stats = AutoReplaceStats::new(list);

        self.map_ordered(
            &list.candidates,
            |entry| match self.service.check_spelling(&entry.word) {
                Ok(result) => GuessInfo::inspect(entry, result),
                Err(err) => {
                    log::warn!("query for {} failed: {}", entry.word, err);
                    let mut info = GuessInfo::inspect(entry, SpellCheckResult::default());
                    info.error = Some(err.to_string());
                    info
                }
            },
            |info| {
                stats.record(&info);
                on_row(&info);
            },
        );

        stats
    }
}

/// Word-list files of every locale directory (names like `en_us`) under `dir`
pub fn locale_files(dir: &Path, file_name: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry =
            entry.with_context(|| format!("Failed to list locales in {}", dir.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().contains('_') {
            files.push(entry.path().join(file_name));
        }
    }

    Ok(files)
}
