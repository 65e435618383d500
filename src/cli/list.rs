use serde::Serialize;
use strum::IntoEnumIterator;

use super::table::{self, Table};
use crate::config::Config;
use crate::providers::providers::ProviderIdentifier;
use crate::resolver::models;
use crate::{die, GlobalArgs, ListArgs, ListObject};

#[derive(Serialize)]
struct Provider {
    provider: String,
    enabled: bool,
    recognized: bool,
}

impl From<Vec<Provider>> for Table {
    fn from(value: Vec<Provider>) -> Self {
        let mut tab = Table::new();

        tab.set_header(vec!["PROVIDER", "ENABLED", "RECOGNIZED"]);

        for provider in value {
            tab.add_row(vec![
                provider.provider,
                if provider.enabled {
                    "enabled".to_string()
                } else {
                    "disabled".to_string()
                },
                if provider.recognized {
                    "yes".to_string()
                } else {
                    "no".to_string()
                },
            ]);
        }

        tab
    }
}

#[derive(Serialize)]
struct Model {
    provider: ProviderIdentifier,
    class: &'static str,
    model_id: &'static str,
}

impl From<Vec<Model>> for Table {
    fn from(value: Vec<Model>) -> Self {
        let mut tab = Table::new();

        tab.set_header(vec!["PROVIDER", "CLASS", "MODEL"]);

        for model in value {
            tab.add_row(vec![model.provider.name(), model.class, model.model_id]);
        }

        tab
    }
}

/// Recognized providers first, then any other configured provider.
fn get_providers(config: &Config) -> Vec<Provider> {
    let active = config.active_providers();

    let mut providers: Vec<Provider> = ProviderIdentifier::iter()
        .map(|id| Provider {
            provider: id.name().to_string(),
            enabled: active.find(id).is_some(),
            recognized: true,
        })
        .collect();

    for configured in &config.providers {
        if configured.name.parse::<ProviderIdentifier>().is_ok() {
            continue;
        }

        providers.push(Provider {
            provider: configured.name.clone(),
            enabled: configured.enabled,
            recognized: false,
        });
    }

    providers
}

fn get_models() -> Vec<Model> {
    use ProviderIdentifier::*;

    [
        (LMStudio, "code", models::LMSTUDIO_CODER),
        (LMStudio, "general", models::LMSTUDIO_GENERAL),
        (Ollama, "code", models::OLLAMA_CODER),
        (Ollama, "general", models::OLLAMA_GENERAL),
        (OpenRouter, "code", models::OPENROUTER_CODER),
        (OpenRouter, "long_or_vision", models::OPENROUTER_VISION),
        (OpenRouter, "general", models::OPENROUTER_GENERAL),
        (OpenAI, "long_or_vision", models::OPENAI_LONG_OR_VISION),
        (OpenAI, "general", models::OPENAI_GENERAL),
    ]
    .into_iter()
    .map(|(provider, class, model_id)| Model {
        provider,
        class,
        model_id,
    })
    .collect()
}

pub(crate) fn list_cmd(global: &GlobalArgs, args: &ListArgs) {
    let output = match &args.object {
        ListObject::Providers => {
            let config = super::load_config(global);

            table::render(get_providers(&config), args.format)
        }
        ListObject::Models => table::render(get_models(), args.format),
    };

    match output {
        Ok(output) => print!("{}", output),
        Err(err) => die!("failed to format listing: {}", err),
    }
}
