use super::{
    parse_search_response, ServiceCallError, SpellCheckService, SEARCH_METHOD, SET_LOCALE_METHOD,
};
use crate::SpellCheckResult;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    CheckSpelling(String),
    SetLocale(String),
}

#[derive(Debug, Clone)]
enum Canned {
    Result(SpellCheckResult),
    Raw(String),
}

/// In-memory stand-in for the SmartKey service.
#[derive(Debug, Default)]
pub struct FakeService {
    responses: HashMap<String, Canned>,
    failing_locales: Vec<String>,
    calls: Mutex<Vec<ServiceCall>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, word: &str, result: SpellCheckResult) -> Self {
        self.responses.insert(word.to_string(), Canned::Result(result));
        self
    }

    /// Answer `word` with a raw response line, parsed like a real reply
    pub fn with_response(mut self, word: &str, line: &str) -> Self {
        self.responses
            .insert(word.to_string(), Canned::Raw(line.to_string()));
        self
    }

    pub fn with_failing_locale(mut self, locale: &str) -> Self {
        self.failing_locales.push(locale.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: ServiceCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl SpellCheckService for FakeService {
    fn check_spelling(&self, word: &str) -> Result<SpellCheckResult, ServiceCallError> {
        self.record(ServiceCall::CheckSpelling(word.to_string()));

        match self.responses.get(word) {
            Some(Canned::Result(result)) => Ok(result.clone()),
            Some(Canned::Raw(line)) => parse_search_response(line),
            None => Err(ServiceCallError::Rejected {
                method: SEARCH_METHOD.to_string(),
                error_text: Some(format!("no canned response for '{}'", word)),
            }),
        }
    }

    fn set_locale(&self, locale: &str) -> Result<(), ServiceCallError> {
        self.record(ServiceCall::SetLocale(locale.to_string()));

        if self.failing_locales.iter().any(|l| l == locale) {
            return Err(ServiceCallError::Rejected {
                method: SET_LOCALE_METHOD.to_string(),
                error_text: Some(format!("unsupported locale '{}'", locale)),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Guess;

    #[test]
    fn test_fake_records_calls() {
        let service = FakeService::new().with_result("the", SpellCheckResult::new(true));

        service.set_locale("en_us").unwrap();
        assert!(service.check_spelling("the").unwrap().spelled_correctly);
        assert!(service.check_spelling("zzz").is_err());

        assert_eq!(
            service.calls(),
            vec![
                ServiceCall::SetLocale("en_us".to_string()),
                ServiceCall::CheckSpelling("the".to_string()),
                ServiceCall::CheckSpelling("zzz".to_string()),
            ]
        );
    }

    #[test]
    fn test_fake_parses_raw_responses() {
        let service = FakeService::new()
            .with_response("teh", r#"{"returnValue":true,"spelledCorrectly":false,"guesses":[{"str":"the","sp":true}]}"#)
            .with_response("boom", "not json");

        let result = service.check_spelling("teh").unwrap();
        let mut expected = Guess::new("the");
        expected.spelled_correctly = true;
        assert_eq!(result.guesses, vec![expected]);

        assert!(matches!(
            service.check_spelling("boom"),
            Err(ServiceCallError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_fake_failing_locale() {
        let service = FakeService::new().with_failing_locale("xx_xx");
        assert!(service.set_locale("fr_fr").is_ok());
        assert!(service.set_locale("xx_xx").is_err());
    }
}
