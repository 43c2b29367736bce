//! CLI binary for cockpit-review.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, drives a `Session` around one run and prints results.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cockpit_review::config::DEFAULT_GRAPHQL_ENDPOINT;
use cockpit_review::prefs::{toggle_dark_mode, Preferences};
use cockpit_review::{
    analyze, builtin_organizations, copy_to_clipboard, default_export_name, export_pdf,
    format_analysis_result, inspect, render_terminal, AnalysisConfig, AnalysisProgressCallback,
    CopyOutcome, FallbackPolicy, FixedAnswer, GraphQlDirectory, MismatchConfirm, Organization,
    OrganizationSource, ProgressCallback, Session, Theme,
};
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while a run is in flight.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, source: &str) {
        self.bar.set_prefix("Extracting");
        self.bar.set_message(source.to_string());
    }

    fn on_text_extracted(&self, page_count: usize, char_count: usize) {
        self.bar.println(format!(
            "  {} Text extracted  {}",
            green("✓"),
            dim(&format!("{page_count} pages, {char_count} chars"))
        ));
    }

    fn on_request_start(&self, organization_id: &str) {
        self.bar.set_prefix("Analysing");
        self.bar.set_message(format!("{organization_id} standards"));
    }

    fn on_analysis_complete(&self, pattern_count: usize, used_fallback: bool) {
        self.bar.finish_and_clear();
        if used_fallback {
            eprintln!(
                "{} {} patterns  {}",
                yellow("⚠"),
                bold(&pattern_count.to_string()),
                yellow("(mock result set: the model call failed)")
            );
        } else {
            eprintln!("{} {} patterns analysed", green("✔"), bold(&pattern_count.to_string()));
        }
    }
}

// ── Mismatch confirmation using dialoguer ────────────────────────────────────

struct PromptConfirm {
    bar: Option<ProgressBar>,
}

impl MismatchConfirm for PromptConfirm {
    fn confirm(&self, pdf_company: &str, organization: &Organization) -> bool {
        let ask = || {
            Confirm::new()
                .with_prompt(format!(
                    "The PDF names '{}' but '{}' is selected. Continue?",
                    pdf_company, organization.name
                ))
                .default(false)
                .interact()
                .unwrap_or(false)
        };
        tokio::task::block_in_place(|| match self.bar {
            Some(ref bar) => bar.suspend(ask),
            None => ask(),
        })
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse a transcript for an organization from the directory service
  cockpit-review analyze flight-0412.pdf --org SPARRING001

  # Offline, with the bundled organizations
  cockpit-review --builtin analyze flight-0412.pdf --org AEROLINK001

  # Edited prompt, PDF report and clipboard copy
  cockpit-review analyze flight-0412.pdf --org FLYSAFE001 \
      --prompt-file prompt.txt --export-pdf --copy

  # JSON output, no confirmation on organization mismatch
  cockpit-review analyze flight-0412.pdf --org SPARRING001 --json --yes

  # Text and flight metadata only (no API key needed)
  cockpit-review inspect flight-0412.pdf

  # Organizations
  cockpit-review orgs list
  cockpit-review orgs set-prompt AEROLINK001 --file prompt.txt

  # Terminal theme
  cockpit-review prefs dark-mode toggle

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY              OpenAI API key
  ANTHROPIC_API_KEY           Anthropic API key
  GEMINI_API_KEY              Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER      Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL             Override model ID
  COCKPIT_REVIEW_GRAPHQL_URL  Organization directory endpoint
  PDFIUM_LIB_PATH             Path to an existing libpdfium
"#;

/// Analyse cockpit-transcript PDFs for CRM patterns with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "cockpit-review",
    version,
    about = "Analyse cockpit-transcript PDFs for Crew Resource Management patterns with an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// GraphQL endpoint of the organization directory.
    #[arg(long, global = true, env = "COCKPIT_REVIEW_GRAPHQL_URL",
          default_value = DEFAULT_GRAPHQL_ENDPOINT)]
    graphql_url: String,

    /// Use the organizations bundled with the tool instead of the directory service.
    #[arg(long, global = true, env = "COCKPIT_REVIEW_BUILTIN")]
    builtin: bool,

    /// Directory request timeout in seconds.
    #[arg(long, global = true, env = "COCKPIT_REVIEW_DIRECTORY_TIMEOUT", default_value_t = 30)]
    directory_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "COCKPIT_REVIEW_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "COCKPIT_REVIEW_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a transcript PDF for an organization.
    Analyze(AnalyzeArgs),
    /// Show the extracted text and flight metadata; no LLM call.
    Inspect(InspectArgs),
    /// List organizations or store an edited prompt.
    Orgs {
        #[command(subcommand)]
        command: OrgsCommand,
    },
    /// Show or change preferences.
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Transcript PDF file.
    input: String,

    /// Organization id (see `orgs list`).
    #[arg(long, env = "COCKPIT_REVIEW_ORG")]
    org: String,

    /// Use the prompt in this file instead of the organization's template.
    #[arg(long, env = "COCKPIT_REVIEW_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Output the structured result (AnalysisOutput) as JSON.
    #[arg(long, env = "COCKPIT_REVIEW_JSON")]
    json: bool,

    /// Write a PDF report; defaults to analysis-<transcriptId>.pdf.
    #[arg(long, num_args = 0..=1, value_name = "PATH")]
    export_pdf: Option<Option<PathBuf>>,

    /// Copy the plain-text report to the clipboard.
    #[arg(long)]
    copy: bool,

    /// Continue without asking when the PDF names another company.
    #[arg(short, long)]
    yes: bool,

    /// Show the fixed demo result set when the model call fails.
    #[arg(long, env = "COCKPIT_REVIEW_MOCK_FALLBACK")]
    mock_fallback: bool,

    /// LLM model ID (e.g. gpt-4.1-mini, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "COCKPIT_REVIEW_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "COCKPIT_REVIEW_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Retries on LLM failure (at most 10).
    #[arg(long, env = "COCKPIT_REVIEW_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// LLM call timeout in seconds.
    #[arg(long, env = "COCKPIT_REVIEW_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "COCKPIT_REVIEW_PASSWORD")]
    password: Option<String>,

    /// Path to a text file containing custom system instructions.
    #[arg(long, env = "COCKPIT_REVIEW_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Disable the spinner.
    #[arg(long, env = "COCKPIT_REVIEW_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Transcript PDF file.
    input: String,

    /// Output as JSON.
    #[arg(long)]
    json: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "COCKPIT_REVIEW_PASSWORD")]
    password: Option<String>,

    /// Print the full extracted text.
    #[arg(long)]
    text: bool,
}

#[derive(Subcommand, Debug)]
enum OrgsCommand {
    /// List the available organizations.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Store a new prompt for an organization in the directory service.
    SetPrompt {
        /// Organization id.
        id: String,
        /// File holding the new prompt.
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsCommand {
    /// Show, set or toggle dark mode for the terminal view.
    DarkMode {
        #[arg(value_enum)]
        action: Option<DarkModeAction>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DarkModeAction {
    On,
    Off,
    Toggle,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner carries the progress feedback; INFO logs would fight it.
    let spinner = match cli.command {
        Command::Analyze(ref a) => !cli.quiet && !a.no_progress && !a.json,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Analyze(ref args) => run_analyze(&cli, args, spinner).await,
        Command::Inspect(ref args) => run_inspect(args).await,
        Command::Orgs { ref command } => run_orgs(&cli, command).await,
        Command::Prefs { ref command } => run_prefs(command),
    }
}

async fn load_organizations(cli: &Cli) -> Result<Vec<Organization>> {
    if cli.builtin {
        return Ok(builtin_organizations());
    }
    let directory = GraphQlDirectory::new(&cli.graphql_url, cli.directory_timeout)?;
    directory
        .organizations()
        .await
        .with_context(|| format!("Failed to load organizations from {}", cli.graphql_url))
}

// ── analyze ──────────────────────────────────────────────────────────────────

async fn run_analyze(cli: &Cli, args: &AnalyzeArgs, spinner: bool) -> Result<()> {
    let mut session = Session::new();
    session.load(load_organizations(cli).await?);
    session.select(&args.org)?;
    if let Some(ref path) = args.prompt_file {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        session.set_prompt(prompt);
    }
    session.set_file(&args.input);

    let progress = spinner.then(CliProgressCallback::new);
    let config = build_config(args, progress.clone()).await?;

    session.begin_analysis()?;
    let organization = session
        .selected_organization()
        .cloned()
        .context("No organization selected")?;
    let prompt = session.prompt().to_string();

    let output = match analyze(&args.input, &organization, &prompt, &config).await {
        Ok(output) => output,
        Err(e) => {
            session.fail_analysis();
            if let Some(ref p) = progress {
                p.bar.finish_and_clear();
            }
            if e.is_cancelled() {
                if !cli.quiet {
                    eprintln!("{} {}", dim("ℹ"), e);
                }
                return Ok(());
            }
            return Err(anyhow::Error::new(e).context("Analysis failed"));
        }
    };
    session.finish_analysis(output.result.clone());
    let Some(result) = session.result() else {
        bail!("Analysis produced no result");
    };

    if args.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        println!("{}", render_terminal(result, terminal_theme()));
    }

    if !cli.quiet && !args.json {
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
            output.stats.total_duration_ms,
        );
    }

    if let Some(ref target) = args.export_pdf {
        let path = target
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_export_name(result)));
        let pages = export_pdf(result, &path)
            .await
            .context("PDF export failed")?;
        if !cli.quiet {
            eprintln!(
                "{} Report written  →  {}  {}",
                green("✔"),
                bold(&path.display().to_string()),
                dim(&format!("({pages} pages)"))
            );
        }
    }

    if args.copy {
        let text = format_analysis_result(result);
        match copy_to_clipboard(&text) {
            CopyOutcome::Copied => {
                if !cli.quiet {
                    eprintln!("{} Report copied to the clipboard", green("✔"));
                }
            }
            CopyOutcome::Held(guard) if io::stdin().is_terminal() => {
                // The selection lives only as long as this process holds it.
                let waited = Input::<String>::new()
                    .with_prompt(format!(
                        "{} Report copied; press Enter once it is pasted",
                        green("✔")
                    ))
                    .allow_empty(true)
                    .interact_text();
                if let Err(e) = waited {
                    eprintln!("{} {}", yellow("⚠"), e);
                }
                drop(guard);
            }
            CopyOutcome::Held(_) => {
                print_for_selection("the copy would end with this process", &text)
            }
            CopyOutcome::Fallback(reason) => print_for_selection(&reason, &text),
        }
    }

    Ok(())
}

fn print_for_selection(reason: &str, text: &str) {
    eprintln!(
        "{} Clipboard unavailable ({}); select the text below to copy it:",
        yellow("⚠"),
        reason
    );
    println!("{text}");
}

/// Map CLI args to `AnalysisConfig`.
async fn build_config(
    args: &AnalyzeArgs,
    progress: Option<Arc<CliProgressCallback>>,
) -> Result<AnalysisConfig> {
    let system_prompt = match args.system_prompt {
        Some(ref path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        ),
        None => None,
    };

    let mismatch: Arc<dyn MismatchConfirm> = if args.yes {
        Arc::new(FixedAnswer(true))
    } else {
        Arc::new(PromptConfirm {
            bar: progress.as_ref().map(|p| p.bar.clone()),
        })
    };

    let mut builder = AnalysisConfig::builder()
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .max_retries(args.max_retries)
        .api_timeout_secs(args.api_timeout)
        .mismatch_confirm(mismatch)
        .fallback(if args.mock_fallback {
            FallbackPolicy::Mock
        } else {
            FallbackPolicy::Error
        });

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb as ProgressCallback);
    }
    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref password) = args.password {
        builder = builder.password(password);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}

fn terminal_theme() -> Theme {
    if std::env::var_os("NO_COLOR").is_some() || !io::stdout().is_terminal() {
        Theme::Plain
    } else {
        Theme::from_dark_mode(Preferences::load().dark_mode)
    }
}

// ── inspect ──────────────────────────────────────────────────────────────────

async fn run_inspect(args: &InspectArgs) -> Result<()> {
    let mut builder = AnalysisConfig::builder();
    if let Some(ref password) = args.password {
        builder = builder.password(password);
    }
    let config = builder.build().context("Invalid configuration")?;
    let found = inspect(&args.input, &config)
        .await
        .context("Failed to inspect PDF")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&found).context("Failed to serialize inspection")?
        );
        return Ok(());
    }

    let t = &found.transcript;
    println!("File:         {}", args.input);
    println!("Pages:        {}", t.page_count());
    println!("Characters:   {}", t.char_count());
    println!("Lines:        {}", t.line_count());
    match found.metadata {
        Some(ref m) => {
            let fields = [
                ("Company", &m.company),
                ("Flight", &m.flight_number),
                ("Aircraft", &m.aircraft),
                ("Pilot", &m.pilot),
                ("Copilot", &m.copilot),
                ("Route", &m.route),
                ("Date", &m.date),
                ("Duration", &m.duration),
                ("Weather", &m.weather),
            ];
            for (label, value) in fields {
                if let Some(v) = value {
                    println!("{:<14}{}", format!("{label}:"), v);
                }
            }
            if !m.transcript.is_empty() {
                println!("Entries:      {}", m.transcript.len());
            }
        }
        None => println!("Metadata:     none (plain-text transcript)"),
    }
    if args.text {
        println!();
        println!("{}", t.text);
    }
    Ok(())
}

// ── orgs ─────────────────────────────────────────────────────────────────────

async fn run_orgs(cli: &Cli, command: &OrgsCommand) -> Result<()> {
    match command {
        OrgsCommand::List { json } => {
            let orgs = load_organizations(cli).await?;
            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&orgs).context("Failed to serialise organizations")?
                );
                return Ok(());
            }
            println!(
                "{}",
                bold(&format!(
                    "{:<14} {:<22} {:>6} {:>10} {:>6}  STANDARDS",
                    "ID", "NAME", "PILOTS", "AVG HOURS", "FLEET"
                ))
            );
            for org in &orgs {
                println!(
                    "{:<14} {:<22} {:>6} {:>10} {:>6}  {}",
                    org.id,
                    org.name,
                    org.pilots,
                    org.average_flight_hours,
                    org.fleet,
                    org.safety_standards().join(", ")
                );
            }
            Ok(())
        }
        OrgsCommand::SetPrompt { id, file } => {
            if cli.builtin {
                bail!("Bundled organizations are read-only; drop --builtin to use the directory service");
            }
            let prompt = tokio::fs::read_to_string(file)
                .await
                .with_context(|| format!("Failed to read prompt from {:?}", file))?;
            if prompt.trim().is_empty() {
                bail!("Prompt file {:?} is empty", file);
            }

            let directory = GraphQlDirectory::new(&cli.graphql_url, cli.directory_timeout)?;
            let mut session = Session::new();
            session.load(directory.organizations().await?);
            session.select(id)?;
            session.set_prompt(prompt.trim());
            let stored = directory
                .update_prompt(id, session.prompt())
                .await
                .context("Failed to save the prompt")?;
            session.set_prompt(stored);
            session.commit_prompt();
            if !cli.quiet {
                eprintln!("{} Prompt saved for {}", green("✔"), bold(id));
            }
            Ok(())
        }
    }
}

// ── prefs ────────────────────────────────────────────────────────────────────

fn run_prefs(command: &PrefsCommand) -> Result<()> {
    match command {
        PrefsCommand::DarkMode { action } => {
            let dark = match action {
                None => Preferences::load().dark_mode,
                Some(DarkModeAction::Toggle) => toggle_dark_mode()?,
                Some(DarkModeAction::On) | Some(DarkModeAction::Off) => {
                    let prefs = Preferences {
                        dark_mode: matches!(action, Some(DarkModeAction::On)),
                    };
                    prefs.save()?;
                    prefs.dark_mode
                }
            };
            println!("dark mode: {}", if dark { "on" } else { "off" });
            Ok(())
        }
    }
}
