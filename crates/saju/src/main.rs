use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use saju_calendar::{CalendarKind, ChartRequest, LunarCalendar};
use saju_common::{logger, AppConfig, GenerationMode, Result, SajuError};
use saju_prompt::{
    enrich_chart, select_levers, ContractValidator, PromptBuilder, PromptCatalog, ReportContract,
};
use saju_report::{JobManager, ReportPipeline, ReportRequest, ReportStore, ReportWorkflow};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    }
}

#[derive(Parser)]
#[command(name = "saju")]
#[command(about = "Saju - four pillar charts and seeded long-form reading reports", long_about = None)]
struct Cli {
    /// Settings file (toml, json or yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the four pillar chart for a birth date
    Chart(BirthArgs),

    /// Show the seeded lever selection for an order
    Levers(OrderArgs),

    /// Print the generation prompt for one section
    Prompt {
        #[command(flatten)]
        order: OrderArgs,

        /// Section id from the report contract
        #[arg(long)]
        section: u32,

        /// Report text generated so far
        #[arg(long)]
        prior: Option<PathBuf>,
    },

    /// Check a report text against the contract
    Validate {
        #[arg(long)]
        file: PathBuf,
    },

    /// Generate a report with the configured text generator and store it
    Generate {
        #[command(flatten)]
        order: OrderArgs,

        /// Dispatch all sections at once instead of one after another
        #[arg(long)]
        parallel: bool,
    },

    /// List stored reports
    List,
}

#[derive(Args)]
struct BirthArgs {
    /// Birth date, YYYY-MM-DD or YYYYMMDD
    #[arg(long)]
    date: String,

    /// The date is a lunar date
    #[arg(long)]
    lunar: bool,

    /// The lunar month is the leap month
    #[arg(long)]
    leap: bool,

    /// Birth time slot (조자, 축, 인, ... 해, 야자); omit when unknown
    #[arg(long)]
    time: Option<String>,
}

impl BirthArgs {
    fn chart_request(&self) -> ChartRequest {
        chart_request(&self.date, self.lunar, self.leap, self.time.clone())
    }
}

#[derive(Args)]
struct OrderArgs {
    /// Birth date, YYYY-MM-DD or YYYYMMDD
    #[arg(long)]
    birth_date: String,

    #[arg(long)]
    lunar: bool,

    #[arg(long)]
    leap: bool,

    #[arg(long)]
    time: Option<String>,

    /// Persona slug; the configured default when omitted
    #[arg(long)]
    persona: Option<String>,

    #[arg(long, default_value = "general")]
    question: String,

    #[arg(long, default_value = "올해 나의 흐름은 어떤가요?")]
    question_text: String,

    /// User or guest id
    #[arg(long, default_value = "guest")]
    subject: String,

    /// Name used to address the reader
    #[arg(long)]
    name: Option<String>,

    /// Purchase count or session counter
    #[arg(long, default_value_t = 1)]
    counter: u64,

    /// Order date (YYYY-MM-DD); today when omitted
    #[arg(long)]
    date: Option<String>,

    /// Free-text concern, steers the emphasis axis
    #[arg(long)]
    concern: Option<String>,
}

impl OrderArgs {
    fn report_request(&self, config: &AppConfig) -> ReportRequest {
        ReportRequest {
            birth: chart_request(&self.birth_date, self.lunar, self.leap, self.time.clone()),
            persona_id: self
                .persona
                .clone()
                .unwrap_or_else(|| config.default_persona.clone()),
            question_id: self.question.clone(),
            question_text: self.question_text.clone(),
            subject_id: self.subject.clone(),
            subject_name: self.name.clone(),
            counter: self.counter,
            date: self
                .date
                .clone()
                .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string()),
            concern_text: self.concern.clone(),
            traits: Default::default(),
        }
    }
}

fn chart_request(date: &str, lunar: bool, leap: bool, time: Option<String>) -> ChartRequest {
    ChartRequest {
        birth_date: date.to_string(),
        calendar: if lunar {
            CalendarKind::Lunar
        } else {
            CalendarKind::Solar
        },
        is_leap_month: leap,
        time_slot: time,
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn prompt_builder(config: &AppConfig) -> Result<PromptBuilder> {
    let catalog = PromptCatalog::load(config)?;
    let contract = ReportContract::load(&config.contract_path)?;
    Ok(PromptBuilder::new(Arc::new(catalog), Arc::new(contract)))
}

async fn run(command: Commands, mut config: AppConfig) -> Result<ExitCode> {
    let calendar = LunarCalendar::bundled();

    match command {
        Commands::Chart(birth) => {
            let chart = birth.chart_request().compute_saju(&calendar)?;
            let payload = enrich_chart(&chart);
            print_json(&serde_json::json!({ "chart": chart, "payload": payload }))?;
        }
        Commands::Levers(order) => {
            let request = order.report_request(&config);
            let chart = request.birth.compute_saju(&calendar)?;
            let catalog = PromptCatalog::load(&config)?;
            let levers = select_levers(&catalog, &request.builder_input(chart))?;
            print_json(&levers)?;
        }
        Commands::Prompt {
            order,
            section,
            prior,
        } => {
            let builder = prompt_builder(&config)?;
            let target = builder
                .sections()
                .iter()
                .find(|s| s.id == section)
                .ok_or_else(|| SajuError::invalid_input(format!("No section with id {}", section)))?;

            let request = order.report_request(&config);
            let chart = request.birth.compute_saju(&calendar)?;
            let input = request.builder_input(chart);
            let levers = select_levers(builder.catalog(), &input)?;
            let prior_text = match prior {
                Some(path) => tokio::fs::read_to_string(&path).await?,
                None => String::new(),
            };

            println!("{}", builder.build_section_prompt(&input, &levers, target, &prior_text)?);
        }
        Commands::Validate { file } => {
            let text = tokio::fs::read_to_string(&file).await?;
            let contract = ReportContract::load(&config.contract_path)?;
            let result = ContractValidator::new(Arc::new(contract))?.validate(&text);
            print_json(&result)?;
            if !result.ok {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Generate { order, parallel } => {
            if parallel {
                config.generation_mode = GenerationMode::Parallel;
            }

            let request = order.report_request(&config);
            let client = saju_llm::build_client(&config)?;
            let pipeline = ReportPipeline::from_config(&config, client)?;
            let workflow = ReportWorkflow::new(
                Arc::new(pipeline),
                Arc::new(JobManager::new()),
                Arc::new(ReportStore::new(config.output_dir.clone())),
            );

            let (job_id, cancel) = workflow.create_job(&request).await;
            let jobs = workflow.jobs().clone();
            let watched = job_id.clone();
            let ctrl_c = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, cancelling job {}", watched);
                    jobs.cancel_job(&watched).await;
                }
            });

            info!("Report job {} started ({:?} mode)", job_id, config.generation_mode);
            let result = workflow.execute(&job_id, &cancel, &request).await;
            ctrl_c.abort();
            let (report, path) = result?;

            print_json(&serde_json::json!({
                "report_id": report.id,
                "status": report.status,
                "path": path,
                "total_chars": report.validation.stats.total_chars,
                "repair_attempts": report.repair_attempts,
                "failed_sections": report.failed_sections,
            }))?;
            if !report.status.is_complete() {
                return Ok(ExitCode::from(3));
            }
        }
        Commands::List => {
            let store = ReportStore::new(config.output_dir.clone());
            print_json(&store.list().await?)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    load_dotenv_from_project_root();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.log_level = logger::parse_log_level(level).to_string().to_lowercase();
    }

    // Only report generation writes a log file; the other commands keep stdout for JSON
    if matches!(cli.command, Commands::Generate { .. }) {
        config.ensure_directories().context("Failed to create output directories")?;
        logger::setup_logging(&config.log_dir, &config.log_level)?;
    } else {
        logger::setup_console_logging(&config.log_level)?;
    }

    match run(cli.command, config).await {
        Ok(code) => Ok(code),
        Err(e) => {
            print_json(&serde_json::json!({
                "error": e.code(),
                "message": e.to_string(),
            }))?;
            if e.is_user_actionable() {
                Ok(ExitCode::from(2))
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
