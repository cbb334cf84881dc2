use tracing::Level;
use tracing_subscriber::{
    prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

fn verbose_to_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        4..=u8::MAX => Level::TRACE,
    }
}

// Setup tracing
// Without `-v`, RUST_LOG is honored and falls back to info for the accounthist crates
pub(crate) fn setup_tracing(verbose: u8) -> Result<(), Box<dyn std::error::Error>> {
    let filter = if verbose > 0 {
        EnvFilter::try_new(format!(
            "warn,accounthist={}",
            verbose_to_level(verbose).as_str()
        ))?
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,accounthist=info"))
    };

    let layer = match std::env::var("ACCOUNTHIST_LOG_FORMAT")
        .map(|f| f.to_lowercase())
        .as_ref()
        .map(|s| s.as_str())
    {
        Ok("json") => tracing_subscriber::fmt::layer()
            .json()
            .with_filter(filter)
            .boxed(),
        Ok("pretty") => tracing_subscriber::fmt::layer()
            .pretty()
            .with_filter(filter)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init()?;

    Ok(())
}
