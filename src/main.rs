use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use smartkey_qa::cli::output::{self, OutputFormat};
use smartkey_qa::config::Overrides;
use smartkey_qa::harness::autoreplace::{locale_files, CandidateRange, WordList};
use smartkey_qa::harness::verdict::normalize;
use smartkey_qa::service::LunaSendService;
use smartkey_qa::{CaseRunner, Config, SpellCheckService};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "smartkey-qa")]
#[command(version, about = "Replay spelling expectations against the SmartKey service", long_about = None)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Command used to reach the service (method URI and payload are appended)
    #[arg(long, global = true, env = "SMARTKEY_QA_SERVICE_COMMAND")]
    service_command: Option<String>,

    /// Base URI of the spelling service
    #[arg(long, global = true)]
    service_uri: Option<String>,

    /// Seconds to wait for each service reply (0 waits forever)
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Cases scored concurrently between locale changes (0 = one per CPU)
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a responses CSV; exits with the number of incorrect cases
    Check {
        /// Test cases: word,spelledCorrectly,topGuess,autoReplace,autoAccept
        #[arg(value_name = "CSV", default_value = "responses.csv")]
        csv: PathBuf,
    },
    /// Compare accented auto-replace entries with the service's auto-accept guesses
    Autoreplace {
        /// Directory holding one sub-directory per locale
        #[arg(long, default_value = "autoreplace")]
        dir: PathBuf,

        /// Locale directory to read
        #[arg(long, default_value = "en_us")]
        locale: String,

        /// Only print the mapped forms, without querying the service
        #[arg(long)]
        raw: bool,

        /// First accented candidate to test (1-based)
        #[arg(long)]
        from: Option<usize>,

        /// Last accented candidate to test (1-based)
        #[arg(long)]
        to: Option<usize>,
    },
    /// List the auto-replace word lists found for each locale
    Locales {
        #[arg(long, default_value = "autoreplace")]
        dir: PathBuf,
    },
    /// Query one word and show the raw result and derived verdict
    Query { word: String },
    /// Switch the service to another locale
    SetLocale { locale: String },
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();

    // Handle shell completion generation
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "smartkey-qa", &mut io::stdout());
        return Ok(());
    }

    let Some(command) = cli.command else {
        anyhow::bail!("No command specified. Use --help for usage information.");
    };

    let colored = !cli.no_color && console::Term::stdout().is_term();

    // Load configuration
    let config = Config::load(Overrides {
        service_command: cli.service_command,
        service_uri: cli.service_uri,
        timeout_secs: cli.timeout,
        jobs: cli.jobs,
    })?;
    log::debug!("configuration: {:?}", config);

    let service = LunaSendService::from_config(&config);

    match command {
        Commands::Check { csv } => {
            let runner = CaseRunner::new(service, &config)?;
            let summary = runner.run_file(&csv, colored, &cli.format)?;
            output::print_run_summary(&summary, colored, &cli.format);

            // Exit with the number of incorrect cases
            let status = output::exit_status(&summary);
            if status > 0 {
                std::process::exit(status);
            }
        }
        Commands::Autoreplace {
            dir,
            locale,
            raw,
            from,
            to,
        } => {
            let path = dir.join(&locale).join(&config.autoreplace_file);
            let list = WordList::load(&path, CandidateRange { from, to })?;

            if raw {
                for entry in &list.candidates {
                    println!("{}", entry.mapped);
                }
            } else {
                let runner = CaseRunner::new(service, &config)?;
                compare_autoreplace(&runner, &list, &path, &cli.format);
            }
        }
        Commands::Locales { dir } => {
            for file in locale_files(&dir, &config.autoreplace_file)? {
                println!("{}", file.display());
            }
        }
        Commands::Query { word } => {
            let result = service.check_spelling(&word)?;
            let verdict = normalize(&word, &result);
            output::print_query(&result, &verdict, &cli.format);
        }
        Commands::SetLocale { locale } => {
            service.set_locale(&locale)?;
            println!("Changed locale to {}", locale);
        }
    }

    Ok(())
}

fn compare_autoreplace<S: SpellCheckService>(
    runner: &CaseRunner<S>,
    list: &WordList,
    path: &Path,
    format: &OutputFormat,
) {
    let pb = if console::Term::stderr().is_term() {
        let pb = ProgressBar::new(list.candidates.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.cyan} {pos}/{len} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(path.display().to_string());
        pb
    } else {
        ProgressBar::hidden()
    };

    match format {
        OutputFormat::Text => {
            println!("{}", output::AUTOREPLACE_HEADER);
            let stats = runner.compare_autoreplace(list, |info| {
                pb.suspend(|| println!("{}", output::format_autoreplace_row(info)));
                pb.inc(1);
            });
            pb.finish_and_clear();
            println!("{}", output::format_autoreplace_totals(&stats));
        }
        OutputFormat::Json => {
            let mut rows = Vec::with_capacity(list.candidates.len());
            let stats = runner.compare_autoreplace(list, |info| {
                rows.push(info.clone());
                pb.inc(1);
            });
            pb.finish_and_clear();
            output::print_autoreplace_json(&rows, &stats);
        }
    }
}
