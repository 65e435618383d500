use serde::Serialize;

use super::table::{self, Table};
use crate::resolver::classify::classify;
use crate::resolver::{ResolutionRequest, ResolutionResult};
use crate::{die, GlobalArgs, ResolveArgs};

#[derive(Serialize)]
struct Resolution {
    provider: String,
    model: Option<String>,
    code_like: bool,
    short: bool,
    has_images: bool,
}

impl Resolution {
    fn new(request: &ResolutionRequest, result: ResolutionResult) -> Resolution {
        let class = classify(&request.message);

        Resolution {
            provider: result.provider.name,
            model: result.model,
            code_like: class.code_like,
            short: class.short,
            has_images: request.has_images,
        }
    }
}

impl From<Resolution> for Table {
    fn from(value: Resolution) -> Self {
        let mut tab = Table::new();

        tab.set_header(vec!["PROVIDER", "MODEL", "CODE_LIKE", "SHORT", "IMAGES"]);

        tab.add_row(vec![
            value.provider,
            value.model.unwrap_or_else(|| "default".to_string()),
            value.code_like.to_string(),
            value.short.to_string(),
            value.has_images.to_string(),
        ]);

        tab
    }
}

pub(crate) async fn resolve_cmd(global: &GlobalArgs, args: &ResolveArgs) {
    let config = super::load_config(global);
    let resolver = super::resolver(global, &config);

    let message = super::read_message(&args.message.message);

    let request = ResolutionRequest::new(
        message,
        !args.message.images.is_empty(),
        super::active_providers(&config, &args.message.providers),
    )
    .with_preferred(config.default_selection());

    tracing::debug!(delegate = resolver.has_delegate(), "resolving message");

    let result = resolver.resolve(&request).await;

    match table::render(Resolution::new(&request, result), args.format) {
        Ok(output) => print!("{}", output),
        Err(err) => die!("failed to format resolution: {}", err),
    }
}
