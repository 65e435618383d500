use nu_ansi_term::AnsiGenericString;

use crate::chat::{extract_markers, OutgoingMessage};
use crate::color::{self, MaybePaint};
use crate::dispatch::Dispatcher;
use crate::{die, GlobalArgs, SendArgs};

/// Paints the markers of a tagged message, leaving the content untouched.
fn paint_tagged(msg: &OutgoingMessage) -> String {
    let markers = extract_markers(&msg.content);
    let mut out = String::new();

    if let Some(model) = markers.model {
        let open: AnsiGenericString<'_, str> = color::MARKER.maybe_paint("[Model: ");
        let model: AnsiGenericString<'_, str> = color::MODEL.maybe_paint(model);
        let close: AnsiGenericString<'_, str> = color::MARKER.maybe_paint("]");

        out.push_str(&format!("{}{}{}\n\n", open, model, close));
    }

    if let Some(provider) = markers.provider {
        let open: AnsiGenericString<'_, str> = color::MARKER.maybe_paint("[Provider: ");
        let provider: AnsiGenericString<'_, str> = color::PROVIDER.maybe_paint(provider);
        let close: AnsiGenericString<'_, str> = color::MARKER.maybe_paint("]");

        out.push_str(&format!("{}{}{}\n\n", open, provider, close));
    }

    out.push_str(markers.content);

    out
}

pub(crate) fn print_outgoing(msg: &OutgoingMessage, json: bool) {
    if json {
        match serde_json::to_string_pretty(msg) {
            Ok(output) => println!("{}", output),
            Err(err) => die!("failed to serialize message: {}", err),
        }
    } else {
        println!("{}", paint_tagged(msg));
    }
}

pub(crate) async fn send_cmd(global: &GlobalArgs, args: &SendArgs) {
    let config = super::load_config(global);

    let session = super::session(&config, &args.message.providers, args.model.as_deref());
    let dispatcher = Dispatcher::new(session, super::resolver(global, &config));

    let message = super::read_message(&args.message.message);

    match dispatcher.send(&message, args.message.images.clone()).await {
        Ok(msg) => print_outgoing(&msg, args.json),
        Err(err) => die!("{}", err),
    }
}
