//! Report orchestration
//!
//! chart → levers → section texts → validation → repair rounds → [`Report`]

use chrono::Utc;
use futures::future::join_all;
use saju_calendar::LunarCalendar;
use saju_common::{AppConfig, GenerationMode, Result, SajuError};
use saju_llm::{GenerateRequest, LlmClient};
use saju_prompt::{
    select_levers, ContractValidator, ExtendedSection, LeverSelection, PromptBuilder,
    PromptBuilderInput, PromptCatalog, ReportContract,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::job_manager::JobProgress;
use crate::types::{Report, ReportRequest, ReportStatus, SectionOutput};

/// Start of the placeholder that replaces a section the generator could not produce
pub const FAILED_SECTION_NOTICE: &str = "[이 섹션은 생성에 실패했습니다";

/// Generator settings and pipeline limits
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub temperature: f32,
    pub mode: GenerationMode,
    pub max_repair_attempts: u32,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.llm_model.clone(),
            temperature: config.llm_temperature,
            mode: config.generation_mode,
            max_repair_attempts: config.max_repair_attempts,
        }
    }
}

pub struct ReportPipeline {
    calendar: Arc<LunarCalendar>,
    builder: PromptBuilder,
    validator: ContractValidator,
    client: Arc<dyn LlmClient>,
    settings: PipelineSettings,
}

impl ReportPipeline {
    pub fn new(
        calendar: Arc<LunarCalendar>,
        catalog: Arc<PromptCatalog>,
        contract: Arc<ReportContract>,
        client: Arc<dyn LlmClient>,
        settings: PipelineSettings,
    ) -> Result<Self> {
        let validator = ContractValidator::new(contract.clone())?;
        let builder = PromptBuilder::new(catalog, contract);
        Ok(Self {
            calendar,
            builder,
            validator,
            client,
            settings,
        })
    }

    /// Load the contract and rule tables named in the config
    pub fn from_config(config: &AppConfig, client: Arc<dyn LlmClient>) -> Result<Self> {
        let catalog = PromptCatalog::load(config)?;
        let contract = ReportContract::load(&config.contract_path)?;
        Self::new(
            Arc::new(LunarCalendar::bundled()),
            Arc::new(catalog),
            Arc::new(contract),
            client,
            PipelineSettings::from_config(config),
        )
    }

    pub fn builder(&self) -> &PromptBuilder {
        &self.builder
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn run(&self, request: &ReportRequest, cancel: &CancellationToken) -> Result<Report> {
        self.run_tracked(request, cancel, None).await
    }

    /// Generate one report.
    ///
    /// Returns `SajuError::Cancelled` as soon as `cancel` is observed at a
    /// section boundary or repair round; calls already in flight finish but
    /// their output is dropped.
    pub async fn run_tracked(
        &self,
        request: &ReportRequest,
        cancel: &CancellationToken,
        progress: Option<&JobProgress>,
    ) -> Result<Report> {
        ensure_active(cancel, "start")?;

        let chart = request.birth.compute_saju(&self.calendar)?;
        let input = request.builder_input(chart);
        let levers = select_levers(self.builder.catalog(), &input)?;
        info!(
            "Report started - Persona: {}, Mode: {:?}, Seed: {}",
            input.persona_id, self.settings.mode, levers.seed
        );
        update(progress, 5, "Chart computed").await;

        let mut sections = match self.settings.mode {
            GenerationMode::Sequential => {
                self.generate_sequential(&input, &levers, cancel, progress).await?
            }
            GenerationMode::Parallel => {
                self.generate_parallel(&input, &levers, cancel, progress).await?
            }
        };
        let mut text = sections
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let mut validation = self.validator.validate(&text);
        let mut repair_attempts = 0;
        let mut repair_error = None;

        while !validation.ok && repair_attempts < self.settings.max_repair_attempts {
            ensure_active(cancel, "repair")?;
            repair_attempts += 1;
            warn!(
                "Report validation failed with {} errors, repair attempt {}/{}",
                validation.errors.len(),
                repair_attempts,
                self.settings.max_repair_attempts
            );
            update(progress, 85, format!("Repair attempt {}", repair_attempts)).await;

            let prompt = format!(
                "{}\n{}",
                self.builder.build_repair_prompt(&validation.errors, &text),
                self.builder.build_full_report_prompt(&input, &levers)?
            );
            let result = self.generate(prompt).await;
            ensure_active(cancel, "repair")?;

            match result {
                Ok(repaired) => {
                    text = repaired.trim().to_string();
                    sections = split_sections(self.builder.sections(), &text);
                    validation = self.validator.validate(&text);
                }
                Err(e) => {
                    warn!("Repair generation failed: {}", e);
                    repair_error = Some(e.to_string());
                    break;
                }
            }
        }

        let mut reasons = validation.errors.clone();
        if let Some(e) = repair_error {
            reasons.push(format!("Repair generation failed: {}", e));
        }
        let failed_sections: Vec<String> = sections
            .iter()
            .filter(|s| s.failed)
            .map(|s| s.marker.clone())
            .collect();
        if !failed_sections.is_empty() {
            reasons.push(format!(
                "Sections failed to generate: {}",
                failed_sections.join(", ")
            ));
        }

        let status = if reasons.is_empty() {
            info!(
                "Report complete - {} chars, {} repair rounds",
                validation.stats.total_chars, repair_attempts
            );
            ReportStatus::Complete
        } else {
            warn!("Report degraded: {}", reasons.join("; "));
            ReportStatus::Degraded { reasons }
        };

        for warning in &validation.warnings {
            debug!("Validation warning: {}", warning);
        }

        Ok(Report {
            id: Uuid::new_v4().to_string(),
            status,
            persona_id: input.persona_id.clone(),
            mode: self.settings.mode,
            text,
            sections,
            chart: input.chart,
            levers,
            validation,
            repair_attempts,
            failed_sections,
            created_at: Utc::now(),
        })
    }

    /// One section at a time; each prompt carries the text generated so far
    async fn generate_sequential(
        &self,
        input: &PromptBuilderInput,
        levers: &LeverSelection,
        cancel: &CancellationToken,
        progress: Option<&JobProgress>,
    ) -> Result<Vec<SectionOutput>> {
        let sections = self.builder.sections();
        let total = sections.len();
        let mut outputs = Vec::with_capacity(total);
        let mut prior = String::new();

        for (index, section) in sections.iter().enumerate() {
            ensure_active(cancel, &section.marker)?;
            info!(
                "Generating section {}/{}: {} {}",
                index + 1,
                total,
                section.marker,
                section.title
            );

            let prompt = self.builder.build_section_prompt(input, levers, section, &prior)?;
            let result = self.generate(prompt).await;
            ensure_active(cancel, &section.marker)?;

            let output = section_output(section, result);
            if !output.failed {
                if !prior.is_empty() {
                    prior.push_str("\n\n");
                }
                prior.push_str(&output.text);
            }
            outputs.push(output);

            update(
                progress,
                section_progress(index + 1, total),
                format!("Section {}/{} done", index + 1, total),
            )
            .await;
        }

        Ok(outputs)
    }

    /// All sections at once from the chart and levers alone
    async fn generate_parallel(
        &self,
        input: &PromptBuilderInput,
        levers: &LeverSelection,
        cancel: &CancellationToken,
        progress: Option<&JobProgress>,
    ) -> Result<Vec<SectionOutput>> {
        let sections = self.builder.sections();
        let prompts = sections
            .iter()
            .map(|section| self.builder.build_section_prompt(input, levers, section, ""))
            .collect::<Result<Vec<_>>>()?;

        ensure_active(cancel, "section dispatch")?;
        info!("Generating {} sections in parallel", sections.len());

        let calls = sections.iter().zip(prompts).map(|(section, prompt)| async move {
            if cancel.is_cancelled() {
                return Err(SajuError::cancelled(format!("{} not dispatched", section.marker)));
            }
            self.generate(prompt).await
        });
        let results = join_all(calls).await;
        ensure_active(cancel, "parallel sections")?;

        let outputs = sections
            .iter()
            .zip(results)
            .map(|(section, result)| section_output(section, result))
            .collect::<Vec<_>>();
        update(progress, section_progress(1, 1), "Sections done").await;
        Ok(outputs)
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let request = GenerateRequest::new(&self.settings.model, prompt)
            .with_temperature(self.settings.temperature);
        self.client.generate(request).await
    }
}

fn ensure_active(cancel: &CancellationToken, stage: &str) -> Result<()> {
    if cancel.is_cancelled() {
        info!("Report generation cancelled at {}", stage);
        return Err(SajuError::cancelled(format!("Report generation cancelled at {}", stage)));
    }
    Ok(())
}

async fn update(progress: Option<&JobProgress>, percent: u8, message: impl Into<String>) {
    if let Some(progress) = progress {
        progress.update(percent, message).await;
    }
}

/// Sections cover 10% - 80% of job progress
fn section_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 80;
    }
    (10 + done * 70 / total) as u8
}

/// Cut a full report back into contract sections.
///
/// Each section runs from its marker to the next marker found in the text.
/// A marker missing from the text yields an empty section; validation
/// reports it.
fn split_sections(sections: &[ExtendedSection], text: &str) -> Vec<SectionOutput> {
    let mut starts: Vec<usize> = sections
        .iter()
        .filter_map(|section| text.find(section.marker.as_str()))
        .collect();
    starts.sort_unstable();

    sections
        .iter()
        .map(|section| {
            let body = match text.find(section.marker.as_str()) {
                Some(start) => {
                    let end = starts
                        .iter()
                        .copied()
                        .find(|&next| next > start)
                        .unwrap_or(text.len());
                    text[start..end].trim()
                }
                None => "",
            };
            SectionOutput {
                marker: section.marker.clone(),
                title: section.title.clone(),
                text: body.to_string(),
                failed: body.contains(FAILED_SECTION_NOTICE),
            }
        })
        .collect()
}

fn section_output(section: &ExtendedSection, result: Result<String>) -> SectionOutput {
    match result {
        Ok(text) => {
            let text = text.trim();
            let text = if text.contains(section.marker.as_str()) {
                text.to_string()
            } else {
                format!("{}\n{}", section.marker, text)
            };
            SectionOutput {
                marker: section.marker.clone(),
                title: section.title.clone(),
                text,
                failed: false,
            }
        }
        Err(e) => {
            warn!("Section {} failed after retries: {}", section.marker, e);
            SectionOutput {
                marker: section.marker.clone(),
                title: section.title.clone(),
                text: format!("{}\n{}: {}]", section.marker, FAILED_SECTION_NOTICE, section.title),
                failed: true,
            }
        }
    }
}
