use super::send::print_outgoing;
use crate::dispatch::Dispatcher;
use crate::{die, GlobalArgs, LinkArgs};

pub(crate) async fn link_cmd(global: &GlobalArgs, args: &LinkArgs) {
    let config = super::load_config(global);

    let session = super::session(&config, &args.providers, None);
    let dispatcher = Dispatcher::new(session, super::resolver(global, &config));

    let active = &dispatcher.session().active_providers;

    if active.is_empty() {
        tracing::debug!("no providers are active, the fallback provider will be used");
    } else {
        tracing::debug!(providers = active.len(), "handling deep link");
    }

    match dispatcher.send_link(&args.url).await {
        Ok(msg) => print_outgoing(&msg, args.json),
        Err(err) => die!("{}", err),
    }
}
