pub mod autoreplace;
pub mod case;
pub mod verdict;

use crate::cli::output::{print_event, OutputFormat};
use crate::{Config, SpellCheckService};
use anyhow::{Context, Result};
use case::{CaseLine, TestCase};
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::Serialize;
use std::fs;
use std::path::Path;
use verdict::{normalize, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Matched,
    Mismatched,
    /// The call failed and the case expected `<exception>`
    ExpectedFailure,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub line_no: usize,
    pub kind: OutcomeKind,
    pub expected: Verdict,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Verdict>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaseOutcome {
    pub fn is_correct(&self) -> bool {
        matches!(self.kind, OutcomeKind::Matched | OutcomeKind::ExpectedFailure)
    }
}

/// Everything a run reports, in input order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    LocaleChanged {
        line_no: usize,
        locale: String,
    },
    LocaleFailed {
        line_no: usize,
        locale: String,
        error: String,
    },
    Scored(CaseOutcome),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub correct: usize,
    pub incorrect: usize,
    /// Last line number read; the header is line 1
    pub line_no: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &CaseOutcome) {
        if outcome.is_correct() {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }
}

/// Replays expected outcomes against a spelling service.
///
/// With more than one job, cases between two `setLocale` rows are scored on
/// a thread pool. A locale change is never issued until every earlier case
/// has finished, and outcomes are always reported in input order.
pub struct CaseRunner<S> {
    service: S,
    pool: Option<ThreadPool>,
}

impl<S: SpellCheckService> CaseRunner<S> {
    /// `config.jobs == 1` runs strictly sequentially; `0` uses one worker per CPU
    pub fn new(service: S, config: &Config) -> Result<Self> {
        let pool = if config.jobs == 1 {
            None
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.jobs)
                .build()
                .context("Failed to start worker pool")?;
            Some(pool)
        };

        Ok(Self { service, pool })
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Replay a responses CSV, printing each event as it is produced
    pub fn run_file(
        &self,
        csv_path: &Path,
        colored: bool,
        format: &OutputFormat,
    ) -> Result<RunSummary> {
        let content = fs::read_to_string(csv_path)
            .with_context(|| format!("Failed to read test cases: {}", csv_path.display()))?;

        Ok(self.run_lines(content.lines(), |event| {
            print_event(event, colored, format)
        }))
    }

    /// Score every line after the header.
    ///
    /// Comments and malformed lines are skipped silently. Service failures
    /// never abort the run.
    pub fn run_lines<I, L>(&self, lines: I, mut on_event: impl FnMut(&RunEvent)) -> RunSummary
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        let mut summary = RunSummary::default();
        let mut lines = lines.into_iter();

        if lines.next().is_none() {
            return summary;
        }
        summary.line_no = 1;

        let mut pending: Vec<(usize, TestCase)> = Vec::new();

        for line in lines {
            summary.line_no += 1;
            let line_no = summary.line_no;

            match CaseLine::classify(line.as_ref()) {
                CaseLine::Comment | CaseLine::Malformed => {}
                CaseLine::SetLocale(locale) => {
                    self.flush(&mut pending, &mut summary, &mut on_event);
                    on_event(&self.change_locale(line_no, locale));
                }
                CaseLine::Case(case) => {
                    pending.push((line_no, case));
                    if self.pool.is_none() {
                        self.flush(&mut pending, &mut summary, &mut on_event);
                    }
                }
            }
        }

        self.flush(&mut pending, &mut summary, &mut on_event);
        summary
    }

    /// Query one case and compare the derived verdict with its expectation
    pub fn score(&self, line_no: usize, case: &TestCase) -> CaseOutcome {
        let expected = case.expected();

        match self.service.check_spelling(&case.word) {
            Ok(result) => {
                let actual = normalize(&case.word, &result);
                let kind = if actual == expected {
                    OutcomeKind::Matched
                } else {
                    OutcomeKind::Mismatched
                };
                CaseOutcome {
                    line_no,
                    kind,
                    expected,
                    actual: Some(actual),
                    error: None,
                }
            }
            Err(err) => {
                let kind = if case.expects_exception() {
                    OutcomeKind::ExpectedFailure
                } else {
                    log::debug!("line {}: {}", line_no, err);
                    OutcomeKind::Failed
                };
                CaseOutcome {
                    line_no,
                    kind,
                    expected,
                    actual: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn change_locale(&self, line_no: usize, locale: String) -> RunEvent {
        match self.service.set_locale(&locale) {
            Ok(()) => RunEvent::LocaleChanged { line_no, locale },
            Err(err) => {
                log::error!("line {}: could not change locale to {}: {}", line_no, locale, err);
                RunEvent::LocaleFailed {
                    line_no,
                    locale,
                    error: err.to_string(),
                }
            }
        }
    }

    fn flush(
        &self,
        pending: &mut Vec<(usize, TestCase)>,
        summary: &mut RunSummary,
        on_event: &mut impl FnMut(&RunEvent),
    ) {
        self.map_ordered(
            pending.as_slice(),
            |(line_no, case)| self.score(*line_no, case),
            |outcome| {
                summary.record(&outcome);
                on_event(&RunEvent::Scored(outcome));
            },
        );
        pending.clear();
    }

    /// Apply `f` to every item, on the pool if there is one, and hand the
    /// results to `emit` in item order.
    fn map_ordered<T, R>(
        &self,
        items: &[T],
        f: impl Fn(&T) -> R + Sync + Send,
        emit: impl FnMut(R),
    ) where
        T: Sync,
        R: Send,
    {
        match &self.pool {
            Some(pool) => {
                let results: Vec<R> = pool.install(|| items.par_iter().map(&f).collect());
                results.into_iter().for_each(emit);
            }
            None => items.iter().map(f).for_each(emit),
        }
    }
}
