use crate::harness::autoreplace::{AutoReplaceStats, GuessInfo};
use crate::harness::verdict::Verdict;
use crate::harness::{CaseOutcome, OutcomeKind, RunEvent, RunSummary};
use crate::SpellCheckResult;
use colored::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const AUTOREPLACE_HEADER: &str = "Input|Pre XT9|AutoAccept|spelledCorrectly|Guess IDX|Guesses";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonQuery<'a> {
    result: &'a SpellCheckResult,
    verdict: &'a Verdict,
}

#[derive(Debug, Serialize)]
struct JsonAutoReplace<'a> {
    rows: &'a [GuessInfo],
    totals: &'a AutoReplaceStats,
}

pub fn print_event(event: &RunEvent, colored_output: bool, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", format_event(event, colored_output)),
        OutputFormat::Json => print_json(event, false),
    }
}

pub fn format_event(event: &RunEvent, colored_output: bool) -> String {
    match event {
        RunEvent::LocaleChanged { locale, .. } => format!("Changing locale to {}", locale),
        RunEvent::LocaleFailed {
            line_no,
            locale,
            error,
        } => format!(
            "{} {} (line {}): {}",
            paint("Failed to change locale to", Color::Red, colored_output),
            locale,
            line_no,
            error
        ),
        RunEvent::Scored(outcome) => format_outcome(outcome, colored_output),
    }
}

fn format_outcome(outcome: &CaseOutcome, colored_output: bool) -> String {
    let expected = &outcome.expected;

    match outcome.kind {
        OutcomeKind::Matched | OutcomeKind::ExpectedFailure => format!(
            "{} {} -> {}",
            paint("correct:", Color::Green, colored_output),
            expected.word,
            expected.top_guess
        ),
        OutcomeKind::Mismatched => {
            let actual = outcome
                .actual
                .as_ref()
                .map(|a| a.to_string())
                .unwrap_or_default();
            format!(
                "{}\nExpected: {}\n  Actual: {}",
                paint(&format!("Failure line {}", outcome.line_no), Color::Red, colored_output),
                expected,
                actual
            )
        }
        OutcomeKind::Failed => format!(
            "{}\n  Error: {}",
            paint(
                &format!("exception csv line {}", outcome.line_no),
                Color::Red,
                colored_output
            ),
            outcome.error.as_deref().unwrap_or("unknown")
        ),
    }
}

pub fn format_summary(summary: &RunSummary) -> String {
    format!("Correct: {}, Incorrect: {}", summary.correct, summary.incorrect)
}

pub fn print_run_summary(summary: &RunSummary, colored_output: bool, format: &OutputFormat) {
    match format {
        OutputFormat::Text => {
            let line = format_summary(summary);
            if !colored_output {
                println!("{}", line);
            } else if summary.incorrect == 0 {
                println!("{}", line.green().bold());
            } else {
                println!("{}", line.red().bold());
            }
        }
        OutputFormat::Json => print_json(summary, false),
    }
}

/// Process exit status for a run: the incorrect count, saturated so that a
/// non-zero count never wraps to 0.
pub fn exit_status(summary: &RunSummary) -> i32 {
    summary.incorrect.min(255) as i32
}

pub fn format_autoreplace_row(info: &GuessInfo) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}",
        info.word,
        info.mapped,
        info.auto_accept_word,
        info.result.spelled_correctly,
        info.guess_idx.map(|i| i.to_string()).unwrap_or_default(),
        info.result.guesses_joined()
    )
}

pub fn format_autoreplace_totals(stats: &AutoReplaceStats) -> String {
    [
        ("Num words", stats.words),
        ("Num accents", stats.accents),
        ("Num accents with guesses", stats.accents_with_guesses),
        ("Num accents spelled correctly", stats.accents_spelled_correctly),
        ("Num accents with auto-accept", stats.accents_with_auto_accept),
        ("Num accents with correct guesses", stats.accents_correct),
    ]
    .iter()
    .map(|(label, count)| format!("{}|{}", label, count))
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn print_autoreplace_json(rows: &[GuessInfo], totals: &AutoReplaceStats) {
    print_json(&JsonAutoReplace { rows, totals }, true);
}

pub fn print_query(result: &SpellCheckResult, verdict: &Verdict, format: &OutputFormat) {
    match format {
        OutputFormat::Text => {
            print_json(result, true);
            println!("{}", verdict);
        }
        OutputFormat::Json => print_json(&JsonQuery { result, verdict }, true),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match json {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize output: {}", e),
    }
}

fn paint(text: &str, color: Color, colored_output: bool) -> String {
    if colored_output {
        text.color(color).bold().to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::autoreplace::AutoReplaceEntry;
    use crate::harness::case::TestCase;
    use crate::Guess;

    fn outcome(kind: OutcomeKind, actual: Option<Verdict>, error: Option<&str>) -> CaseOutcome {
        CaseOutcome {
            line_no: 7,
            kind,
            expected: TestCase::parse("hte,false,the,false,true").unwrap().expected(),
            actual,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_format_correct_case() {
        let line = format_event(&RunEvent::Scored(outcome(OutcomeKind::Matched, None, None)), false);
        assert_eq!(line, "correct: hte -> the");
    }

    #[test]
    fn test_format_failure_block() {
        let actual = Verdict {
            word: "hte".to_string(),
            top_guess: "hat".to_string(),
            ..Default::default()
        };
        let text = format_event(
            &RunEvent::Scored(outcome(OutcomeKind::Mismatched, Some(actual), None)),
            false,
        );
        assert_eq!(
            text,
            "Failure line 7\n\
             Expected: word:\"hte\", sc:false, top:\"the\", ar:false, aa:true\n  \
             Actual: word:\"hte\", sc:false, top:\"hat\", ar:false, aa:false"
        );
    }

    #[test]
    fn test_format_exception_line() {
        let text = format_event(
            &RunEvent::Scored(outcome(OutcomeKind::Failed, None, Some("search call failed: boom"))),
            false,
        );
        assert_eq!(text, "exception csv line 7\n  Error: search call failed: boom");
    }

    #[test]
    fn test_format_locale_change() {
        let event = RunEvent::LocaleChanged {
            line_no: 3,
            locale: "fr_fr".to_string(),
        };
        assert_eq!(format_event(&event, false), "Changing locale to fr_fr");
    }

    #[test]
    fn test_summary_and_exit_status() {
        let summary = RunSummary {
            correct: 10,
            incorrect: 2,
            line_no: 14,
        };
        assert_eq!(format_summary(&summary), "Correct: 10, Incorrect: 2");
        assert_eq!(exit_status(&summary), 2);
        assert_eq!(exit_status(&RunSummary::default()), 0);

        let many = RunSummary {
            incorrect: 256,
            ..Default::default()
        };
        assert_eq!(exit_status(&many), 255);
    }

    #[test]
    fn test_event_json() {
        let event = RunEvent::LocaleChanged {
            line_no: 3,
            locale: "fr_fr".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "locale_changed");
        assert_eq!(json["locale"], "fr_fr");

        let json = serde_json::to_value(RunEvent::Scored(outcome(OutcomeKind::Matched, None, None)))
            .unwrap();
        assert_eq!(json["event"], "scored");
        assert_eq!(json["kind"], "matched");
        assert_eq!(json["expected"]["top_guess"], "the");
        assert!(json.get("actual").is_none());
    }

    #[test]
    fn test_autoreplace_row() {
        let entry = AutoReplaceEntry {
            word: "cafe".to_string(),
            mapped: "café".to_string(),
        };
        let mut accepted = Guess::new("café");
        accepted.auto_accept = true;
        let result = SpellCheckResult::new(false)
            .with_guesses(vec![Guess::new("cafe"), accepted, Guess::new("cafes")]);

        let info = GuessInfo::inspect(&entry, result);
        assert_eq!(format_autoreplace_row(&info), "cafe|café|café|false|1|cafe, café, cafes");

        let info = GuessInfo::inspect(&entry, SpellCheckResult::new(true));
        assert_eq!(format_autoreplace_row(&info), "cafe|café||true||");
    }

    #[test]
    fn test_autoreplace_totals() {
        let stats = AutoReplaceStats {
            words: 120,
            accents: 12,
            accents_with_guesses: 10,
            accents_spelled_correctly: 1,
            accents_with_auto_accept: 8,
            accents_correct: 7,
        };
        assert_eq!(
            format_autoreplace_totals(&stats),
            "Num words|120\n\
             Num accents|12\n\
             Num accents with guesses|10\n\
             Num accents spelled correctly|1\n\
             Num accents with auto-accept|8\n\
             Num accents with correct guesses|7"
        );
    }
}
