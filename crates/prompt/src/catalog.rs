//! Persona voice profiles and lever rule table

use saju_common::{AppConfig, Result, SajuError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::types::{LeverDefinition, VariationRules, VoiceProfile};

#[derive(Debug, Deserialize)]
struct VoiceProfileFile {
    profiles: BTreeMap<String, VoiceProfile>,
}

/// Static rule tables the prompt layer reads from
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    profiles: BTreeMap<String, VoiceProfile>,
    rules: VariationRules,
    default_persona: String,
}

impl PromptCatalog {
    /// Load voice profiles and variation rules from the configured paths
    pub fn load(config: &AppConfig) -> Result<Self> {
        let profiles = read_asset(&config.voice_profiles_path)?;
        let rules = read_asset(&config.variation_rules_path)?;
        let catalog = Self::from_json(&profiles, &rules, &config.default_persona)?;

        info!(
            "Prompt catalog loaded: {} personas, default '{}'",
            catalog.profiles.len(),
            catalog.default_persona
        );
        Ok(catalog)
    }

    pub fn from_json(profiles_json: &str, rules_json: &str, default_persona: &str) -> Result<Self> {
        let file: VoiceProfileFile = serde_json::from_str(profiles_json)
            .map_err(|e| SajuError::contract(format!("Invalid voice profiles JSON: {}", e)))?;
        let rules: VariationRules = serde_json::from_str(rules_json)
            .map_err(|e| SajuError::contract(format!("Invalid variation rules JSON: {}", e)))?;

        let catalog = Self {
            profiles: file.profiles,
            rules,
            default_persona: default_persona.to_string(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        for (slug, profile) in &self.profiles {
            if profile.opener_variants.is_empty() {
                return Err(SajuError::contract(format!(
                    "Persona '{}' has no opener variants",
                    slug
                )));
            }
        }

        let levers = &self.rules.levers;
        check_choices("metaphor_palette", &levers.metaphor_palette, 1)?;
        check_choices("emphasis_axis", &levers.emphasis_axis, 2)?;
        check_choices("sentence_rhythm", &levers.sentence_rhythm, 1)?;

        if !self.profiles.contains_key(&self.default_persona) {
            warn!(
                "Default persona '{}' has no voice profile",
                self.default_persona
            );
        }
        Ok(())
    }

    /// Voice profile for `persona_id`, falling back to the default persona.
    /// Returns the slug that was actually used.
    pub fn profile(&self, persona_id: &str) -> Result<(&str, &VoiceProfile)> {
        if let Some((slug, profile)) = self.profiles.get_key_value(persona_id) {
            return Ok((slug.as_str(), profile));
        }

        match self.profiles.get_key_value(&self.default_persona) {
            Some((slug, profile)) => {
                warn!(
                    "Unknown persona '{}', using default '{}'",
                    persona_id, self.default_persona
                );
                Ok((slug.as_str(), profile))
            }
            None => Err(SajuError::UnknownPersona(persona_id.to_string())),
        }
    }

    pub fn rules(&self) -> &VariationRules {
        &self.rules
    }

    pub fn persona_ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn default_persona(&self) -> &str {
        &self.default_persona
    }
}

fn read_asset(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| SajuError::contract(format!("Failed to read {}: {}", path.display(), e)))
}

fn check_choices(name: &str, lever: &LeverDefinition, min: usize) -> Result<()> {
    if lever.choices.len() < min {
        return Err(SajuError::contract(format!(
            "Lever '{}' needs at least {} choice(s), has {}",
            name,
            min,
            lever.choices.len()
        )));
    }
    Ok(())
}
