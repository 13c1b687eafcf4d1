use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Built-in defaults, used when neither the request nor the environment
/// supplies a value.
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";
pub const DEFAULT_NAME: &str = "MAGNATUNS";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 800;
pub const DEFAULT_TOP_P: f32 = 1.0;
pub const DEFAULT_PENALTY: f32 = 0.0;
pub const DEFAULT_MAX_CONTINUATIONS: u32 = 3;

pub fn default_persona(name: &str) -> String {
    format!(
        "Você é {name}, uma IA que fala com grandiosidade e honra. \
         Responda sempre de forma épica e inspiradora."
    )
}

/// Process-wide gateway settings, resolved once at startup from the
/// environment. Acts as the middle layer of the override precedence chain
/// (request override → environment → built-in default).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub api_key: Option<String>,
    pub model: String,
    pub name: String,
    pub persona: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub safe_mode: bool,
    pub max_continuations: u32,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            name: DEFAULT_NAME.to_string(),
            persona: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_p: DEFAULT_TOP_P,
            presence_penalty: DEFAULT_PENALTY,
            frequency_penalty: DEFAULT_PENALTY,
            safe_mode: true,
            max_continuations: DEFAULT_MAX_CONTINUATIONS,
        }
    }
}

/// Caller-supplied per-request overrides.
///
/// Numeric fields are deserialized leniently: a JSON number or a numeric
/// string is accepted, anything else is treated as absent so the resolver
/// falls back to the environment value instead of rejecting the request.
/// Locked fields (persona, name, safe_mode) are accepted but never applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatOverrides {
    pub model: Option<String>,
    #[serde(deserialize_with = "lenient_f32")]
    pub temperature: Option<f32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub max_tokens: Option<u32>,
    #[serde(deserialize_with = "lenient_f32")]
    pub top_p: Option<f32>,
    #[serde(deserialize_with = "lenient_f32")]
    pub presence_penalty: Option<f32>,
    #[serde(deserialize_with = "lenient_f32")]
    pub frequency_penalty: Option<f32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub max_continuations: Option<u32>,
    pub persona: Option<String>,
    pub name: Option<String>,
    pub safe_mode: Option<serde_json::Value>,
}

fn lenient_f32<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64().map(|f| f as f32),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_u64().and_then(|i| u32::try_from(i).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// The effective per-request configuration. Built once per request and
/// immutable afterwards; every field always carries a value.
#[derive(Debug, Clone, Serialize)]
pub struct PersonaConfig {
    pub model: String,
    pub name: String,
    pub persona: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub moderation: bool,
    pub max_continuations: u32,
}

impl PersonaConfig {
    /// Resolve the effective configuration for one request.
    ///
    /// Precedence per field: request override → environment settings →
    /// built-in default. Persona, name and moderation are locked: overrides
    /// for them are ignored so a caller can never change the identity or
    /// disable the content filter.
    pub fn resolve(settings: &GatewaySettings, overrides: &ChatOverrides) -> Self {
        if overrides.persona.is_some() || overrides.name.is_some() || overrides.safe_mode.is_some()
        {
            debug!("ignoring override for locked field (persona/name/safe_mode)");
        }

        let name = settings.name.clone();
        let persona = settings
            .persona
            .clone()
            .unwrap_or_else(|| default_persona(&name));

        // A zero token ceiling would make every call trivially truncated.
        let max_tokens = overrides
            .max_tokens
            .filter(|&v| v > 0)
            .or(Some(settings.max_tokens).filter(|&v| v > 0))
            .unwrap_or(DEFAULT_MAX_TOKENS);

        Self {
            model: overrides
                .model
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| settings.model.clone()),
            name,
            persona,
            temperature: overrides.temperature.unwrap_or(settings.temperature),
            max_tokens,
            top_p: overrides.top_p.unwrap_or(settings.top_p),
            presence_penalty: overrides
                .presence_penalty
                .unwrap_or(settings.presence_penalty),
            frequency_penalty: overrides
                .frequency_penalty
                .unwrap_or(settings.frequency_penalty),
            moderation: settings.safe_mode,
            max_continuations: overrides
                .max_continuations
                .unwrap_or(settings.max_continuations),
        }
    }
}
