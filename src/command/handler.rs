use crate::command::{hash, keys, list, pubsub, server_admin, sorted_set, string, CommandHandler, CommandSpec};

/// The built-in command surface (spec §4.6, C6): one [`CommandSpec`] per
/// command in spec §6's table, grouped by the value shape or concern they
/// operate on. Installed into every new [`crate::command::Registry`] by
/// default; an embedder overrides or augments it by installing their own
/// [`CommandHandler`] afterward (spec §6: "Extensibility").
pub struct DefaultHandler;

impl CommandHandler for DefaultHandler {
    fn describe(&self) -> Vec<CommandSpec> {
        let mut specs = Vec::new();
        specs.extend(string::specs());
        specs.extend(keys::specs());
        specs.extend(hash::specs());
        specs.extend(list::specs());
        specs.extend(sorted_set::specs());
        specs.extend(pubsub::specs());
        specs.extend(server_admin::specs());
        specs
    }
}
