//! Automatic provider and model resolution.
//!
//! When the user selects "Automatic" mode, each outgoing message is resolved to a
//! provider and, usually, a model. Resolution happens in two steps:
//!
//! 1. Delegation: if a [`Delegate`] has been supplied, it is asked first. Any
//!    failure (an error, a panic or a malformed answer) is logged and otherwise
//!    ignored.
//! 2. Heuristic: the built-in [`heuristic::resolve`] classifies the message as
//!    code-like and/or short and picks from the recognized active providers using
//!    static per-provider model tables.
//!
//! Resolution never fails. With no active providers the result is a synthetic
//! OpenRouter provider with a general-purpose model.
//!
//! A result without a model means "use the caller's current default model".

pub(crate) mod classify;
pub(crate) mod delegate;
pub(crate) mod heuristic;
pub(crate) mod models;

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;

use crate::providers::{ActiveProviders, ProviderInfo};
use crate::utils::panics;
use delegate::Delegate;

/// The provider and model the caller currently has selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Preferred {
    pub provider: ProviderInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// The input to a single resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResolutionRequest {
    pub message: String,
    pub has_images: bool,
    pub active_providers: ActiveProviders,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred: Option<Preferred>,
}

impl ResolutionRequest {
    pub(crate) fn new<S: Into<String>>(
        message: S,
        has_images: bool,
        active_providers: ActiveProviders,
    ) -> ResolutionRequest {
        ResolutionRequest {
            message: message.into(),
            has_images,
            active_providers,
            preferred: None,
        }
    }

    pub(crate) fn with_preferred(mut self, preferred: Option<Preferred>) -> ResolutionRequest {
        self.preferred = preferred;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ResolutionResult {
    pub provider: ProviderInfo,
    #[serde(default)]
    pub model: Option<String>,
}

impl ResolutionResult {
    pub(crate) fn new(provider: ProviderInfo, model: Option<String>) -> ResolutionResult {
        ResolutionResult { provider, model }
    }
}

/// Resolves requests, consulting an optional delegate before the heuristic.
#[derive(Default)]
pub(crate) struct AutoResolver {
    delegate: Option<Box<dyn Delegate>>,
}

impl AutoResolver {
    pub(crate) fn new() -> AutoResolver {
        AutoResolver { delegate: None }
    }

    pub(crate) fn with_delegate(delegate: Box<dyn Delegate>) -> AutoResolver {
        AutoResolver {
            delegate: Some(delegate),
        }
    }

    pub(crate) fn has_delegate(&self) -> bool {
        self.delegate.is_some()
    }

    pub(crate) async fn resolve(&self, request: &ResolutionRequest) -> ResolutionResult {
        if let Some(result) = self.try_delegate(request).await {
            tracing::debug!(
                provider = %result.provider,
                model = ?result.model,
                "resolved by delegate"
            );

            return result;
        }

        let result = heuristic::resolve(
            &request.message,
            request.has_images,
            &request.active_providers,
        );

        tracing::debug!(
            provider = %result.provider,
            model = ?result.model,
            "resolved by heuristic"
        );

        result
    }

    async fn try_delegate(&self, request: &ResolutionRequest) -> Option<ResolutionResult> {
        let strategy = self.delegate.as_ref()?;

        let outcome = AssertUnwindSafe(panics::silenced(strategy.resolve(request)))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => match delegate::validate(result) {
                Ok(result) => Some(result),
                Err(err) => {
                    tracing::debug!(delegate = %strategy.describe(), "ignoring delegate: {}", err);
                    None
                }
            },
            Ok(Err(err)) => {
                tracing::debug!(delegate = %strategy.describe(), "ignoring delegate: {}", err);
                None
            }
            Err(payload) => {
                tracing::debug!(
                    delegate = %strategy.describe(),
                    "ignoring delegate, it panicked: {}",
                    panics::message(&*payload)
                );
                None
            }
        }
    }
}
