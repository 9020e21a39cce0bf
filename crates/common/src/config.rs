use crate::error::SajuError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How section prompts are dispatched to the text generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// One section at a time, every prompt carries the text generated so far
    #[default]
    Sequential,
    /// All sections at once, prompts carry no prior section text
    Parallel,
}

/// External text generator backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions API
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

/// Saju report application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Report contract document (section markers, length rules, forbidden patterns)
    pub contract_path: PathBuf,

    /// Global lever definitions
    pub variation_rules_path: PathBuf,

    /// Persona voice profiles
    pub voice_profiles_path: PathBuf,

    /// Persona used when the requested one has no voice profile
    pub default_persona: String,

    /// Directory where finished reports are stored
    pub output_dir: PathBuf,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Text generator backend
    pub llm_provider: LlmProvider,

    /// Text generator base URL
    pub llm_base_url: String,

    /// API key (OpenAI provider only)
    pub llm_api_key: Option<String>,

    /// Model name
    pub llm_model: String,

    /// Sampling temperature
    pub llm_temperature: f32,

    /// Per-request timeout in seconds
    pub llm_timeout_secs: u64,

    /// Automatic retries per generator call on transient failure
    pub generator_retries: u32,

    /// Repair prompt rounds before the report is marked degraded
    pub max_repair_attempts: u32,

    /// Section dispatch mode
    pub generation_mode: GenerationMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            contract_path: PathBuf::from("./data/report_contract.json"),
            variation_rules_path: PathBuf::from("./data/variation_rules.json"),
            voice_profiles_path: PathBuf::from("./data/voice_profiles.json"),
            default_persona: "dragon-sage".to_string(),
            output_dir: PathBuf::from("./db/reports"),
            log_dir: PathBuf::from("./db/log"),
            log_level: "info".to_string(),
            llm_provider: LlmProvider::OpenAi,
            llm_base_url: "https://api.openai.com".to_string(),
            llm_api_key: None,
            llm_model: "gpt-4o".to_string(),
            llm_temperature: 0.8,
            llm_timeout_secs: 300,
            generator_retries: 2,
            max_repair_attempts: 3,
            generation_mode: GenerationMode::Sequential,
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then an optional settings file, then `SAJU_*` env vars
    ///
    /// A `.env` file in the working directory is read first (ignored if missing).
    pub fn load(settings_file: Option<&Path>) -> Result<Self, SajuError> {
        let _ = dotenv::dotenv();

        let mut builder = config::Config::builder();
        if let Some(path) = settings_file {
            if !path.exists() {
                return Err(SajuError::config(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("SAJU").try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| SajuError::config(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Ensure output and log directories exist, create if not
    pub fn ensure_directories(&self) -> Result<(), SajuError> {
        for dir in [&self.output_dir, &self.log_dir] {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    SajuError::config(format!(
                        "Failed to create directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), SajuError> {
        if self.llm_model.trim().is_empty() {
            return Err(SajuError::config("LLM model name cannot be empty"));
        }

        if !self.llm_base_url.starts_with("http://") && !self.llm_base_url.starts_with("https://") {
            return Err(SajuError::config(
                "LLM base URL must start with http:// or https://",
            ));
        }

        if self.llm_timeout_secs == 0 {
            return Err(SajuError::config("LLM timeout cannot be 0"));
        }

        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(SajuError::config("LLM temperature must be within 0.0 - 2.0"));
        }

        if self.default_persona.trim().is_empty() {
            return Err(SajuError::config("Default persona cannot be empty"));
        }

        Ok(())
    }
}
