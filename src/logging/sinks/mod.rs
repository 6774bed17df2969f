pub mod console;
pub mod file;

use tracing_subscriber::{fmt::MakeWriter, registry::Registry, Layer};

use super::LogFormat;

/// Слой, который пишет в `Registry`; все sink'и приводятся к нему.
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// fmt-слой выбранного формата поверх произвольного writer.
pub(crate) fn fmt_layer<W>(
    format: LogFormat,
    with_ansi: bool,
    writer: W,
) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(with_ansi)
        .with_target(true)
        .with_writer(writer);

    match format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}
