use std::any::Any;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt};

#[derive(Debug, thiserror::Error)]
pub enum PerfError {
  #[error("Failed to create trace file: {0}")]
  TraceFile(#[from] std::io::Error),
  #[error("Failed to install the global subscriber: {0}")]
  Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Installs the global subscriber: formatted events filtered by `RUST_LOG` (info by default),
/// plus the tracy or chrome layers when their features are on.
///
/// The returned guards flush the profilers when dropped, keep them alive for the whole run
pub fn enable_profiling() -> Result<Vec<Box<dyn Any>>, PerfError> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let subscriber = Registry::default().with(fmt::layer().with_filter(filter));
  #[allow(unused_mut)]
  let mut guards: Vec<Box<dyn Any>> = Vec::new();

  #[cfg(feature = "tracing-tracy")]
  let subscriber = {
    use tracing_tracy::TracyLayer;
    use tracing_tracy::client::Client;

    let (tracy_layer, tracy_client) = (TracyLayer::default(), Client::start());

    guards.push(Box::new(tracy_client));
    subscriber.with(tracy_layer)
  };

  #[cfg(feature = "tracing-chrome")]
  let subscriber = {
    use chrono::prelude::*;
    use std::fs::File;
    use tracing_chrome::ChromeLayerBuilder;

    let output_file = format!(
      "target/trace-{variant}.json",
      variant = Local::now().format("%Y%m%d-%H%M%S")
    );

    eprintln!("Saving chrome trace to {output_file}");

    let (chrome_layer, chrome_guard) = ChromeLayerBuilder::new()
      .writer(File::create(output_file)?)
      .build();

    guards.push(Box::new(chrome_guard));
    subscriber.with(chrome_layer)
  };

  tracing::subscriber::set_global_default(subscriber)?;

  Ok(guards)
}
