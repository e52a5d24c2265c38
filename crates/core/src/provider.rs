#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

/// Variable consulted for Gemini when `GEMINI_API_KEY` is unset.
const LEGACY_GEMINI_ENV_VAR: &str = "API_KEY";

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-2.5-flash",
                env_var: "GEMINI_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-4o-mini",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Openai => "OpenAI",
            Provider::Grok => "Grok",
        }
    }

    /// Look up the credential for this provider. Blank values count as missing.
    pub fn api_key_from_env(&self) -> Option<String> {
        let mut vars = vec![self.config().env_var];
        if *self == Provider::Gemini {
            vars.push(LEGACY_GEMINI_ENV_VAR);
        }

        vars.into_iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
    }
}
