//! Concrete identities for the providers the resolver knows by name

use serde::{Serialize, Serializer};
use strum_macros;

/// The `ProviderIdentifier` names one of the providers the heuristic resolver
/// recognizes. Any other provider name is "unrecognized" and can only be
/// chosen through the first-active-provider fallback.
///
/// The `to_string` and `FromStr` forms are part of the CLI, the configuration
/// file and the delegate wire format and should remain stable. Parsing is
/// case-insensitive.
#[derive(
    Debug,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
    strum_macros::IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub(crate) enum ProviderIdentifier {
    #[strum(serialize = "LMStudio")]
    LMStudio,
    #[strum(serialize = "Ollama")]
    Ollama,
    #[strum(serialize = "OpenRouter")]
    OpenRouter,
    #[strum(serialize = "OpenAI")]
    OpenAI,
}

impl ProviderIdentifier {
    /// The canonical spelling of the provider name.
    pub(crate) fn name(self) -> &'static str {
        self.into()
    }

    /// Whether `name` refers to this provider, ignoring ASCII case.
    pub(crate) fn matches(self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }
}

impl Serialize for ProviderIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
