//! Per-send orchestration.
//!
//! The [`Dispatcher`] turns a user message into an [`OutgoingMessage`]. In
//! automatic mode the message is resolved exactly once, before the payload is
//! built; in fixed mode the selected provider and model are used as they are.
//! Messages may also arrive through a deep link, a URL whose `prompt` query
//! parameter carries the text.

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::chat::OutgoingMessage;
use crate::providers::{ActiveProviders, ProviderInfo};
use crate::resolver::{AutoResolver, Preferred, ResolutionRequest};

/// The query parameter of a deep link holding the message.
pub(crate) const PROMPT_PARAMETER: &str = "prompt";

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("invalid link: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("the link does not carry a \"prompt\" parameter")]
    MissingPrompt,

    #[error("refusing to send an empty message")]
    EmptyMessage,

    #[error("invalid model selection \"{0}\"")]
    InvalidSelection(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ModelSelection {
    /// Resolve the provider and model for every message.
    Automatic,
    /// Always use this provider and model.
    Fixed {
        provider: ProviderInfo,
        model: Option<String>,
    },
}

/// Parses a selection from the command line:
///
/// ```text
/// <selection> := "auto" | <provider> | <provider> "/" <model>
/// ```
///
/// Only the first slash separates the provider, so routed model names such as
/// `OpenRouter/meta-llama/llama-3.1-8b-instruct` keep their namespace.
impl FromStr for ModelSelection {
    type Err = Error;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let spec = spec.trim();

        if spec.eq_ignore_ascii_case("auto") {
            return Ok(ModelSelection::Automatic);
        }

        let (provider, model) = match spec.split_once('/') {
            Some((provider, model)) => (provider, Some(model)),
            None => (spec, None),
        };

        if provider.is_empty() {
            return Err(Error::InvalidSelection(spec.to_string()));
        }

        Ok(ModelSelection::Fixed {
            provider: ProviderInfo::new(provider),
            model: model.filter(|m| !m.is_empty()).map(str::to_string),
        })
    }
}

/// The context a message is sent in.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub active_providers: ActiveProviders,
    /// The provider and model currently selected as defaults
    pub default: Option<Preferred>,
    pub selection: ModelSelection,
}

impl Session {
    fn default_model(&self) -> Option<String> {
        self.default.as_ref().and_then(|d| d.model.clone())
    }
}

pub(crate) struct Dispatcher {
    session: Session,
    resolver: AutoResolver,
}

impl Dispatcher {
    pub(crate) fn new(session: Session, resolver: AutoResolver) -> Dispatcher {
        Dispatcher { session, resolver }
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    /// Prepares a user-initiated message.
    pub(crate) async fn send(
        &self,
        message: &str,
        images: Vec<PathBuf>,
    ) -> Result<OutgoingMessage, Error> {
        if message.trim().is_empty() && images.is_empty() {
            return Err(Error::EmptyMessage);
        }

        let (provider, model) = match &self.session.selection {
            ModelSelection::Automatic => {
                let request = ResolutionRequest::new(
                    message,
                    !images.is_empty(),
                    self.session.active_providers.clone(),
                )
                .with_preferred(self.session.default.clone());

                let result = self.resolver.resolve(&request).await;

                let model = result.model.or_else(|| self.session.default_model());

                (result.provider, model)
            }
            ModelSelection::Fixed { provider, model } => (provider.clone(), model.clone()),
        };

        tracing::info!(provider = %provider, model = ?model, "dispatching message");

        Ok(OutgoingMessage::new(message, provider, model, images))
    }

    /// Prepares a message that arrived through a deep link.
    pub(crate) async fn send_link(&self, link: &str) -> Result<OutgoingMessage, Error> {
        let prompt = prompt_from_link(link)?;

        self.send(&prompt, Vec::new()).await
    }
}

/// Extracts the message from a deep link. Both absolute URLs and bare query
/// strings such as `?prompt=hello` are accepted.
pub(crate) fn prompt_from_link(link: &str) -> Result<String, Error> {
    let base = Url::parse("http://localhost/")?;
    let url = Url::options().base_url(Some(&base)).parse(link)?;

    url.query_pairs()
        .find(|(key, _)| key == PROMPT_PARAMETER)
        .map(|(_, value)| value.into_owned())
        .filter(|prompt| !prompt.trim().is_empty())
        .ok_or(Error::MissingPrompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::extract_markers;
    use crate::resolver::delegate::{self, Delegate};
    use crate::resolver::{models, ResolutionResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl Delegate for Counting {
        fn describe(&self) -> String {
            "counting".to_string()
        }

        async fn resolve(
            &self,
            _: &ResolutionRequest,
        ) -> Result<ResolutionResult, delegate::Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(delegate::Error::Malformed("counting only"))
        }
    }

    fn session(names: &[&str], selection: ModelSelection) -> Session {
        Session {
            active_providers: names.iter().copied().collect(),
            default: Some(Preferred {
                provider: ProviderInfo::new("OpenAI"),
                model: Some("gpt-4o".to_string()),
            }),
            selection,
        }
    }

    #[tokio::test]
    async fn test_automatic_send_is_tagged() {
        let dispatcher = Dispatcher::new(
            session(&["Ollama"], ModelSelection::Automatic),
            AutoResolver::new(),
        );

        let msg = dispatcher.send("hello", Vec::new()).await.unwrap();

        assert_eq!(msg.provider.name, "Ollama");
        assert_eq!(msg.model.as_deref(), Some(models::OLLAMA_GENERAL));

        let markers = extract_markers(&msg.content);
        assert_eq!(markers.provider, Some("Ollama"));
        assert_eq!(markers.model, Some(models::OLLAMA_GENERAL));
        assert_eq!(markers.content, "hello");
    }

    #[tokio::test]
    async fn test_missing_model_uses_default() {
        let dispatcher = Dispatcher::new(
            session(&["Mistral"], ModelSelection::Automatic),
            AutoResolver::new(),
        );

        let msg = dispatcher.send("hello", Vec::new()).await.unwrap();

        assert_eq!(msg.provider.name, "Mistral");
        assert_eq!(msg.model.as_deref(), Some("gpt-4o"));
    }

    #[tokio::test]
    async fn test_images_count_as_images() {
        let dispatcher = Dispatcher::new(
            session(&["OpenRouter"], ModelSelection::Automatic),
            AutoResolver::new(),
        );

        let msg = dispatcher
            .send("what is this", vec![PathBuf::from("cat.png")])
            .await
            .unwrap();

        assert_eq!(msg.model.as_deref(), Some(models::OPENROUTER_VISION));
        assert_eq!(msg.images, vec![PathBuf::from("cat.png")]);
    }

    #[tokio::test]
    async fn test_fixed_selection_skips_resolution() {
        let calls = Arc::new(AtomicUsize::new(0));
        let selection = ModelSelection::Fixed {
            provider: ProviderInfo::new("OpenAI"),
            model: Some("gpt-4o".to_string()),
        };
        let dispatcher = Dispatcher::new(
            session(&["Ollama"], selection),
            AutoResolver::with_delegate(Box::new(Counting(calls.clone()))),
        );

        let msg = dispatcher.send("hello", Vec::new()).await.unwrap();

        assert_eq!(msg.provider.name, "OpenAI");
        assert_eq!(msg.model.as_deref(), Some("gpt-4o"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolves_once_per_send() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(
            session(&["Ollama"], ModelSelection::Automatic),
            AutoResolver::with_delegate(Box::new(Counting(calls.clone()))),
        );

        dispatcher.send("one", Vec::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        dispatcher
            .send_link("https://chat.example.com/?prompt=two")
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let dispatcher = Dispatcher::new(
            session(&["Ollama"], ModelSelection::Automatic),
            AutoResolver::new(),
        );

        let result = dispatcher.send("   ", Vec::new()).await;

        assert!(matches!(result, Err(Error::EmptyMessage)));
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(
            "auto".parse::<ModelSelection>().unwrap(),
            ModelSelection::Automatic
        );
        assert_eq!(
            "Ollama".parse::<ModelSelection>().unwrap(),
            ModelSelection::Fixed {
                provider: ProviderInfo::new("Ollama"),
                model: None,
            }
        );
        assert_eq!(
            "OpenRouter/meta-llama/llama-3.1-8b-instruct"
                .parse::<ModelSelection>()
                .unwrap(),
            ModelSelection::Fixed {
                provider: ProviderInfo::new("OpenRouter"),
                model: Some("meta-llama/llama-3.1-8b-instruct".to_string()),
            }
        );
        assert!(matches!(
            "/gpt-4o".parse::<ModelSelection>(),
            Err(Error::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_prompt_from_link() {
        assert_eq!(
            prompt_from_link("https://chat.example.com/?prompt=build%20a%20todo%20app").unwrap(),
            "build a todo app"
        );
        assert_eq!(
            prompt_from_link("?theme=dark&prompt=hi+there").unwrap(),
            "hi there"
        );
        assert!(matches!(
            prompt_from_link("https://chat.example.com/?theme=dark"),
            Err(Error::MissingPrompt)
        ));
        assert!(matches!(
            prompt_from_link("https://chat.example.com/?prompt="),
            Err(Error::MissingPrompt)
        ));
        assert!(matches!(
            prompt_from_link("http://[::1"),
            Err(Error::InvalidUrl(_))
        ));
    }
}
