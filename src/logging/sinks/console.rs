use super::{fmt_layer, BoxedLayer};
use crate::logging::LoggingConfig;

/// Консольный слой. Пишет в stderr: stdout остаётся для вывода CLI.
pub fn layer_with_config(config: &LoggingConfig) -> BoxedLayer {
    fmt_layer(config.format, config.with_ansi, std::io::stderr)
}
