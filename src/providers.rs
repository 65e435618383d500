//! Provider identities and the set of providers active in a session.
//!
//! A provider is a named backend capable of serving chat completions, such as a
//! local inference server (LMStudio, Ollama) or a hosted API (OpenRouter, OpenAI).
//! For the purposes of resolution a provider is opaque beyond its name: the
//! [`ProviderInfo`] type carries only that name, and all comparisons between names
//! ignore ASCII case.
//!
//! ## Active Providers
//!
//! The providers enabled for a session are supplied from the outside (the
//! configuration file or the command line) as an ordered list, the
//! [`ActiveProviders`]. The order matters: when no recognized provider applies,
//! the first active provider is chosen. Lookups never fail; a provider that is not
//! active simply yields `None`.

pub(crate) mod providers;

use core::fmt;
use serde::{Deserialize, Serialize};

use self::providers::ProviderIdentifier;

/// A backend model provider, identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub(crate) struct ProviderInfo {
    pub name: String,
}

impl ProviderInfo {
    pub(crate) fn new<S: Into<String>>(name: S) -> ProviderInfo {
        ProviderInfo { name: name.into() }
    }

    pub(crate) fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl From<ProviderIdentifier> for ProviderInfo {
    fn from(value: ProviderIdentifier) -> Self {
        ProviderInfo::new(value.name())
    }
}

impl fmt::Display for ProviderInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Ordered sequence of the providers enabled for the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct ActiveProviders {
    providers: Vec<ProviderInfo>,
}

impl ActiveProviders {
    pub(crate) fn new() -> ActiveProviders {
        ActiveProviders {
            providers: Vec::new(),
        }
    }

    /// Adds a provider unless one with the same name (ignoring case) is
    /// already present. Returns whether the provider was added.
    pub(crate) fn add(&mut self, provider: ProviderInfo) -> bool {
        if self.find_by_name(&provider.name).is_some() {
            return false;
        }

        self.providers.push(provider);

        true
    }

    pub(crate) fn find_by_name(&self, name: &str) -> Option<&ProviderInfo> {
        self.providers.iter().find(|p| p.is_named(name))
    }

    /// Looks up a recognized provider. The entry is returned as it was
    /// supplied, preserving its original spelling.
    pub(crate) fn find(&self, id: ProviderIdentifier) -> Option<&ProviderInfo> {
        self.providers.iter().find(|p| id.matches(&p.name))
    }

    pub(crate) fn first(&self) -> Option<&ProviderInfo> {
        self.providers.first()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.providers.len()
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &ProviderInfo> {
        self.providers.iter()
    }
}

impl FromIterator<ProviderInfo> for ActiveProviders {
    fn from_iter<T: IntoIterator<Item = ProviderInfo>>(iter: T) -> Self {
        let mut active = ActiveProviders::new();

        for provider in iter {
            active.add(provider);
        }

        active
    }
}

impl<'a> FromIterator<&'a str> for ActiveProviders {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        iter.into_iter().map(ProviderInfo::new).collect()
    }
}
