use crate::SpellCheckResult;
use serde::Serialize;
use std::fmt;

/// Outcome the text-editing surface would derive from a spelling result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub word: String,
    pub spelled_correctly: bool,
    pub top_guess: String,
    pub auto_replace: bool,
    pub auto_accept: bool,
}

/// Pick the winning guess the same way the editor consumes service results.
///
/// 1. A guess flagged both auto-replace and auto-accept wins as an auto-replace.
/// 2. Otherwise an auto-accept (not auto-replace) guess wins as an auto-accept.
/// 3. Otherwise the second guess is offered; index 0 is usually the typed
///    word echoed back. A lone guess is offered as is.
///
/// Both scans keep going after a match, so the last qualifying guess wins.
/// "Unset" means the top guess is still empty.
pub fn normalize(word: &str, result: &SpellCheckResult) -> Verdict {
    let mut verdict = Verdict {
        word: word.to_string(),
        spelled_correctly: result.spelled_correctly,
        ..Default::default()
    };

    for guess in &result.guesses {
        if guess.auto_replace && guess.auto_accept {
            verdict.auto_replace = true;
            verdict.top_guess = guess.text.clone();
        }
    }

    if verdict.top_guess.is_empty() {
        for guess in &result.guesses {
            if !guess.auto_replace && guess.auto_accept {
                verdict.auto_accept = true;
                verdict.top_guess = guess.text.clone();
            }
        }
    }

    if verdict.top_guess.is_empty() {
        match result.guesses.as_slice() {
            [] => {}
            [only] => verdict.top_guess = only.text.clone(),
            [_, second, ..] => verdict.top_guess = second.text.clone(),
        }
    }

    verdict
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "word:\"{}\", sc:{}, top:\"{}\", ar:{}, aa:{}",
            self.word, self.spelled_correctly, self.top_guess, self.auto_replace, self.auto_accept
        )
    }
}
