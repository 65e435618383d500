use std::io::{self, IsTerminal, Read};

use crate::config::{self, Config};
use crate::die;
use crate::dispatch::{ModelSelection, Session};
use crate::providers::{ActiveProviders, ProviderInfo};
use crate::resolver::delegate::{CommandDelegate, Delegate, HttpDelegate, WithTimeout};
use crate::resolver::AutoResolver;
use crate::{warn, GlobalArgs, RequestedColorMode};

pub(crate) mod link;
pub(crate) mod list;
pub(crate) mod resolve;
pub(crate) mod send;
pub(crate) mod table;

#[derive(Clone, Copy, strum_macros::Display)]
pub(crate) enum ColorMode {
    On,
    Off,
}

impl ColorMode {
    /// Returns whether ANSI color should be used
    /// If the user has specified a preference, this is honored. This preference
    /// can be specified through the command line or the "NO_COLOR" environment
    /// variable If the user hasn't stated a preference, color is enabled if the
    /// output is a terminal.
    pub(crate) fn resolve_auto(cm: RequestedColorMode) -> ColorMode {
        match cm {
            RequestedColorMode::Auto => {
                let disable_color =
                    std::env::var_os("NO_COLOR").is_some() || !io::stdout().is_terminal();

                if disable_color {
                    ColorMode::Off
                } else {
                    ColorMode::On
                }
            }
            RequestedColorMode::On => ColorMode::On,
            RequestedColorMode::Off => ColorMode::Off,
        }
    }
}

pub(crate) fn load_config(global: &GlobalArgs) -> Config {
    match config::read_config(global.config.clone()) {
        Ok(config) => config,
        Err(err) => die!("{}", err),
    }
}

/// The providers named on the command line, or the configured ones if none were.
pub(crate) fn active_providers(config: &Config, overrides: &[String]) -> ActiveProviders {
    if overrides.is_empty() {
        config.active_providers()
    } else {
        overrides
            .iter()
            .map(|name| ProviderInfo::new(name.as_str()))
            .collect()
    }
}

pub(crate) fn session(
    config: &Config,
    provider_overrides: &[String],
    selection: Option<&str>,
) -> Session {
    let selection = match selection {
        Some(spec) => match spec.parse::<ModelSelection>() {
            Ok(selection) => selection,
            Err(err) => die!("{}", err),
        },
        None => match config.model_selection() {
            Ok(selection) => selection,
            Err(err) => die!("{}", err),
        },
    };

    Session {
        active_providers: active_providers(config, provider_overrides),
        default: config.default_selection(),
        selection,
    }
}

fn configured_delegate(delegate: &config::Delegate) -> Option<Box<dyn Delegate>> {
    if let Some(command) = &delegate.command {
        return match command.split_first() {
            Some((program, args)) => Some(Box::new(CommandDelegate::new(program, args.to_vec()))),
            None => {
                warn!("the delegate command is empty, ignoring");
                None
            }
        };
    }

    if let Some(url) = &delegate.url {
        return match HttpDelegate::new(url.as_str()) {
            Ok(delegate) => Some(Box::new(delegate)),
            Err(err) => {
                warn!("{}, ignoring", err);
                None
            }
        };
    }

    CommandDelegate::discover().map(|delegate| Box::new(delegate) as Box<dyn Delegate>)
}

/// Builds the resolver, attaching the configured or discovered delegate.
pub(crate) fn resolver(global: &GlobalArgs, config: &Config) -> AutoResolver {
    if global.no_delegate || !config.delegate.enabled {
        return AutoResolver::new();
    }

    let delegate = match configured_delegate(&config.delegate) {
        Some(delegate) => delegate,
        None => return AutoResolver::new(),
    };

    tracing::debug!(delegate = %delegate.describe(), "using resolution delegate");

    match config.delegate.timeout() {
        Some(timeout) => AutoResolver::with_delegate(Box::new(WithTimeout::new(delegate, timeout))),
        None => AutoResolver::with_delegate(delegate),
    }
}

/// Obtains the message, either from the positional argument or from standard input.
pub(crate) fn read_message(message: &Option<String>) -> String {
    let in_terminal = io::stdin().is_terminal();

    if let Some(message) = message {
        return message.clone();
    }

    if in_terminal {
        die!("no message given, pass it as an argument or through standard input");
    }

    let mut buf = String::new();

    if let Err(err) = io::stdin().read_to_string(&mut buf) {
        die!("failed to read the message from standard input: {}", err);
    }

    buf
}
