//! Binary-side wiring: file config, settings merge, terminal prompts and
//! mode dispatch.

pub(crate) mod config;
pub(crate) mod prompt;
pub(crate) mod runtime;
pub(crate) mod settings;
