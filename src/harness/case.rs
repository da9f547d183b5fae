use super::verdict::Verdict;
use std::fmt;

/// Expected top guess for cases where the service call itself should fail
pub const EXPECTED_EXCEPTION: &str = "<exception>";

const SET_LOCALE: &str = "setLocale";

/// One row of the responses CSV:
/// `word,spelledCorrectly,topGuess,autoReplace,autoAccept`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub word: String,
    pub expected_spelled_correctly: bool,
    pub expected_top_guess: String,
    pub expected_auto_replace: bool,
    pub expected_auto_accept: bool,
}

/// Classification of a raw line read after the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseLine {
    Comment,
    SetLocale(String),
    Case(TestCase),
    /// Anything else; skipped without being scored
    Malformed,
}

impl CaseLine {
    pub fn classify(line: &str) -> Self {
        if line.starts_with('#') {
            return CaseLine::Comment;
        }

        let fields = split_fields(line, ',');
        match fields.as_slice() {
            [SET_LOCALE, locale] => CaseLine::SetLocale(locale.to_string()),
            [_, _] => CaseLine::Malformed,
            _ => TestCase::parse(line).map_or(CaseLine::Malformed, CaseLine::Case),
        }
    }
}

impl TestCase {
    /// Parse a five-field row; any other field count is not a test case
    pub fn parse(line: &str) -> Option<Self> {
        match split_fields(line, ',').as_slice() {
            [word, spelled, top, auto_replace, auto_accept] => Some(Self {
                word: word.to_string(),
                expected_spelled_correctly: *spelled == "true",
                expected_top_guess: top.to_string(),
                expected_auto_replace: *auto_replace == "true",
                expected_auto_accept: *auto_accept == "true",
            }),
            _ => None,
        }
    }

    pub fn expects_exception(&self) -> bool {
        self.expected_top_guess == EXPECTED_EXCEPTION
    }

    pub fn expected(&self) -> Verdict {
        Verdict {
            word: self.word.clone(),
            spelled_correctly: self.expected_spelled_correctly,
            top_guess: self.expected_top_guess.clone(),
            auto_replace: self.expected_auto_replace,
            auto_accept: self.expected_auto_accept,
        }
    }

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.word,
            self.expected_spelled_correctly,
            self.expected_top_guess,
            self.expected_auto_replace,
            self.expected_auto_accept
        )
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.expected(), f)
    }
}

/// Split on `sep`, dropping trailing empty fields (`a,b,,` has two fields).
pub(crate) fn split_fields(line: &str, sep: char) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split(sep).collect();
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}
