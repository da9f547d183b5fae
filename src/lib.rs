pub mod cli;
pub mod config;
pub mod harness;
pub mod service;

pub use config::Config;
pub use harness::CaseRunner;
pub use service::{ServiceCallError, SpellCheckService};

use serde::{Deserialize, Serialize};

/// One candidate correction returned by the spelling service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guess {
    #[serde(rename = "str")]
    pub text: String,

    #[serde(rename = "sp", default)]
    pub spelled_correctly: bool,

    #[serde(rename = "auto-accept", default, skip_serializing_if = "is_false")]
    pub auto_accept: bool,

    #[serde(rename = "auto-replace", default, skip_serializing_if = "is_false")]
    pub auto_replace: bool,
}

impl Guess {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spelled_correctly: false,
            auto_accept: false,
            auto_replace: false,
        }
    }
}

/// Result of a single `search` call, guesses in service rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellCheckResult {
    #[serde(rename = "spelledCorrectly")]
    pub spelled_correctly: bool,

    #[serde(default)]
    pub guesses: Vec<Guess>,
}

impl SpellCheckResult {
    pub fn new(spelled_correctly: bool) -> Self {
        Self {
            spelled_correctly,
            guesses: Vec::new(),
        }
    }

    pub fn with_guesses(mut self, guesses: Vec<Guess>) -> Self {
        self.guesses = guesses;
        self
    }

    /// Guess texts joined with `", "`, as shown in batch reports
    pub fn guesses_joined(&self) -> String {
        self.guesses
            .iter()
            .map(|g| g.text.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_json_omits_unset_flags() {
        let mut guess = Guess::new("the");
        guess.spelled_correctly = true;
        let json = serde_json::to_string(&guess).unwrap();
        assert_eq!(json, r#"{"str":"the","sp":true}"#);

        guess.auto_accept = true;
        let json = serde_json::to_string(&guess).unwrap();
        assert!(json.contains(r#""auto-accept":true"#));
        assert!(!json.contains("auto-replace"));
    }

    #[test]
    fn test_guesses_joined() {
        let result = SpellCheckResult::new(false)
            .with_guesses(vec![Guess::new("cafe"), Guess::new("café")]);
        assert_eq!(result.guesses_joined(), "cafe, café");
        assert_eq!(SpellCheckResult::new(true).guesses_joined(), "");
    }
}
