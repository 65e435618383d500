//! The local resolver applied when no delegate is available or the delegate
//! fails. It is a pure function of its inputs and always produces a result.

use super::classify::{classify, Classification};
use super::models;
use super::ResolutionResult;
use crate::providers::{providers::ProviderIdentifier, ActiveProviders, ProviderInfo};

/// The result used when no providers are active at all.
pub(crate) fn fallback() -> ResolutionResult {
    ResolutionResult::new(
        ProviderIdentifier::OpenRouter.into(),
        Some(models::OPENROUTER_GENERAL.to_string()),
    )
}

fn chosen(provider: &ProviderInfo, model: &str) -> ResolutionResult {
    ResolutionResult::new(provider.clone(), Some(model.to_string()))
}

/// Picks a provider and model for `message`.
///
/// Local servers (LMStudio, then Ollama) are preferred for short, text-only
/// messages. Otherwise OpenRouter, then OpenAI. If none of the recognized
/// providers is active, the first active provider is chosen with no model so
/// the caller's default applies.
pub(crate) fn resolve(
    message: &str,
    has_images: bool,
    active_providers: &ActiveProviders,
) -> ResolutionResult {
    let Classification { code_like, short } = classify(message);

    let local = short && !has_images;

    if local {
        if let Some(provider) = active_providers.find(ProviderIdentifier::LMStudio) {
            let model = if code_like {
                models::LMSTUDIO_CODER
            } else {
                models::LMSTUDIO_GENERAL
            };

            return chosen(provider, model);
        }

        if let Some(provider) = active_providers.find(ProviderIdentifier::Ollama) {
            let model = if code_like {
                models::OLLAMA_CODER
            } else {
                models::OLLAMA_GENERAL
            };

            return chosen(provider, model);
        }
    }

    if let Some(provider) = active_providers.find(ProviderIdentifier::OpenRouter) {
        let model = if code_like && short && !has_images {
            models::OPENROUTER_CODER
        } else if has_images || !short {
            models::OPENROUTER_VISION
        } else {
            models::OPENROUTER_GENERAL
        };

        return chosen(provider, model);
    }

    if let Some(provider) = active_providers.find(ProviderIdentifier::OpenAI) {
        let model = if has_images || !short {
            models::OPENAI_LONG_OR_VISION
        } else {
            models::OPENAI_GENERAL
        };

        return chosen(provider, model);
    }

    match active_providers.first() {
        Some(provider) => ResolutionResult::new(provider.clone(), None),
        None => fallback(),
    }
}
