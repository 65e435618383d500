//! Type definitions for outgoing chat messages
//!
//! Before a message is handed to the streaming client, the provider and model
//! chosen for it are prepended to its content as inline markers:
//!
//! ```text
//! [Model: llama3.1:8b]
//!
//! [Provider: Ollama]
//!
//! <content>
//! ```
//!
//! The model marker is omitted when no model was chosen.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;

use crate::providers::ProviderInfo;

lazy_static! {
    static ref MODEL_MARKER: Regex =
        Regex::new(r"^\[Model: (.*?)\]\n\n").expect("the model marker is a valid regex");
    static ref PROVIDER_MARKER: Regex =
        Regex::new(r"^\[Provider: (.*?)\]\n\n").expect("the provider marker is a valid regex");
}

/// A user message ready for the streaming client
#[derive(Debug, Clone, Serialize)]
pub(crate) struct OutgoingMessage {
    /// The tagged contents of the message
    pub content: String,
    /// The provider that will serve the message
    pub provider: ProviderInfo,
    /// The model, or `None` for the provider's default
    pub model: Option<String>,
    /// Attached images
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<PathBuf>,
}

impl OutgoingMessage {
    pub(crate) fn new(
        content: &str,
        provider: ProviderInfo,
        model: Option<String>,
        images: Vec<PathBuf>,
    ) -> OutgoingMessage {
        OutgoingMessage {
            content: tag(content, &provider, model.as_deref()),
            provider,
            model,
            images,
        }
    }
}

pub(crate) fn tag(content: &str, provider: &ProviderInfo, model: Option<&str>) -> String {
    let mut tagged = String::new();

    if let Some(model) = model {
        tagged.push_str(&format!("[Model: {}]\n\n", model));
    }

    tagged.push_str(&format!("[Provider: {}]\n\n", provider.name));
    tagged.push_str(content);

    tagged
}

/// The markers found at the start of a message and the remaining content
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Markers<'c> {
    pub model: Option<&'c str>,
    pub provider: Option<&'c str>,
    pub content: &'c str,
}

/// Splits a leading marker matched by `marker` from `text`.
fn split_marker<'c>(marker: &Regex, text: &'c str) -> (Option<&'c str>, &'c str) {
    match marker.captures(text) {
        Some(caps) => match (caps.get(0), caps.get(1)) {
            (Some(whole), Some(value)) => (Some(value.as_str()), &text[whole.end()..]),
            _ => (None, text),
        },
        None => (None, text),
    }
}

pub(crate) fn extract_markers(tagged: &str) -> Markers<'_> {
    let (model, rest) = split_marker(&MODEL_MARKER, tagged);
    let (provider, content) = split_marker(&PROVIDER_MARKER, rest);

    Markers {
        model,
        provider,
        content,
    }
}
