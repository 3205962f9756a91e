use crate::core::builtin_providers::{find_builtin_provider, ProviderMode};
use crate::core::session::error::SetupError;
use crate::core::session::state::SessionState;

/// What the first-run dialog collects.
#[derive(Debug, Clone, Default)]
pub struct SetupChoice {
    pub provider: String,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

impl SessionState {
    /// Validate the first-run choice and, when it passes, store it and open the
    /// setup gate. The local backend needs a model; keyed providers need a
    /// credential (typed, already stored, or bundled) and fall back to their
    /// built-in default model.
    pub fn complete_setup(&mut self, choice: SetupChoice) -> Result<(), SetupError> {
        let provider = find_builtin_provider(&choice.provider)
            .ok_or_else(|| SetupError::UnknownProvider(choice.provider.clone()))?;

        let api_key = choice
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let model = choice
            .model
            .map(|model| model.trim().to_string())
            .filter(|model| !model.is_empty());

        // A stored or bundled credential satisfies the key requirement.
        if provider.requires_key && api_key.is_none() && self.api_key(&provider.id).is_empty() {
            return Err(SetupError::MissingApiKey(provider.id));
        }

        let model = match provider.mode {
            ProviderMode::Ollama => {
                model.ok_or_else(|| SetupError::MissingModel(provider.id.clone()))?
            }
            _ => model.unwrap_or_else(|| provider.default_model.clone()),
        };

        if let Some(key) = api_key {
            self.set_api_key(provider.id.clone(), key);
        }
        self.set_provider(provider.id);
        self.set_model(model);
        self.has_completed_setup = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::state::BUNDLED_OPENROUTER_KEY;

    #[test]
    fn keyed_provider_requires_credential() {
        let mut state = SessionState::default();
        let err = state
            .complete_setup(SetupChoice {
                provider: "openai".into(),
                model: None,
                api_key: Some("   ".into()),
            })
            .expect_err("blank key must be rejected");
        assert_eq!(err, SetupError::MissingApiKey("openai".into()));
        assert!(!state.has_completed_setup);
    }

    #[test]
    fn keyed_provider_gets_default_model() {
        let mut state = SessionState::default();
        state
            .complete_setup(SetupChoice {
                provider: "openrouter".into(),
                model: None,
                api_key: Some("sk-or".into()),
            })
            .expect("valid setup");
        assert!(state.has_completed_setup);
        assert_eq!(state.provider, "openrouter");
        assert_eq!(state.model, "google/gemini-2.0-flash-exp:free");
        assert_eq!(state.api_key("openrouter"), "sk-or");
    }

    #[test]
    fn stored_key_satisfies_keyed_provider() {
        let mut state = SessionState::default();
        state.set_api_key("openai", "sk-stored");
        state
            .complete_setup(SetupChoice {
                provider: "openai".into(),
                model: None,
                api_key: None,
            })
            .expect("stored key is enough");
        assert!(state.has_completed_setup);
        assert_eq!(state.api_key("openai"), "sk-stored");
    }

    #[test]
    fn bundled_aggregator_key_decides_untyped_setup() {
        let mut state = SessionState::default();
        let result = state.complete_setup(SetupChoice {
            provider: "openrouter".into(),
            model: None,
            api_key: None,
        });
        match BUNDLED_OPENROUTER_KEY {
            Some(key) if !key.is_empty() => {
                assert_eq!(result, Ok(()));
                assert_eq!(state.api_key("openrouter"), key);
                assert!(!state.api_keys.contains_key("openrouter"));
            }
            _ => {
                assert_eq!(result, Err(SetupError::MissingApiKey("openrouter".into())));
                assert!(!state.has_completed_setup);
            }
        }
    }

    #[test]
    fn local_provider_requires_model() {
        let mut state = SessionState::default();
        assert_eq!(
            state.complete_setup(SetupChoice {
                provider: "ollama".into(),
                ..Default::default()
            }),
            Err(SetupError::MissingModel("ollama".into()))
        );

        state
            .complete_setup(SetupChoice {
                provider: "ollama".into(),
                model: Some("llama3".into()),
                api_key: None,
            })
            .expect("model supplied");
        assert_eq!(state.model, "llama3");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let mut state = SessionState::default();
        assert!(matches!(
            state.complete_setup(SetupChoice {
                provider: "nope".into(),
                ..Default::default()
            }),
            Err(SetupError::UnknownProvider(_))
        ));
    }
}
