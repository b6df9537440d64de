//! Tracing setup
//!
//! Logs go to stderr because stdout carries the MCP protocol. `RUST_LOG`
//! overrides the default `things_mcp=info` filter and `LOG_FORMAT=json`
//! switches to structured output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let directive = format!("{}=info", crate_name);
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);
    let registry = tracing_subscriber::registry().with(filter);

    if json_requested(std::env::var("LOG_FORMAT").ok().as_deref()) {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }
    Ok(())
}

fn json_requested(format: Option<&str>) -> bool {
    format.map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false)
}
