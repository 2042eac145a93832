use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn filter(level: &str, verbose: bool) -> EnvFilter {
    let default = if verbose {
        "reversi_analyzer=debug,info".to_string()
    } else {
        format!("reversi_analyzer={level}")
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. `RUST_LOG` wins over `level`, `verbose` over `level`.
pub fn init_logging(level: &str, verbose: bool, json: bool) {
    let registry = tracing_subscriber::registry().with(filter(level, verbose));
    let fmt = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if json {
        registry.with(fmt.json()).init();
    } else {
        registry.with(fmt.compact()).init();
    }
}
