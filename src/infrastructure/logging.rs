use std::io;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_subscriber::{filter::Directive, fmt, prelude::*, EnvFilter};

use crate::{
    config::AppConfig, filter::reconciler::DIAGNOSTICS_TARGET,
    infrastructure::directories::ResolvedPaths,
};

static INIT: OnceCell<()> = OnceCell::new();
static GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

pub fn init_tracing(config: &AppConfig, paths: &ResolvedPaths) -> Result<()> {
    INIT.get_or_try_init::<_, anyhow::Error>(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| page_filter(&config.logging.level));

        let file_appender = tracing_appender::rolling::daily(&paths.logs_dir, "botfilter.log");
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        let _ = GUARD.set(guard);

        let console_layer = fmt::layer()
            .with_writer(io::stdout)
            .with_target(true)
            .with_ansi(true);

        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()?;

        tracing::info!(
            logs = %paths.logs_dir.display(),
            diagnostics = DIAGNOSTICS_TARGET,
            "tracing initialized"
        );
        Ok(())
    })?;
    Ok(())
}

// Post diagnostics are only produced when the user turned debug logging on,
// so they stay visible even when LOG_LEVEL is quieter than info.
fn page_filter(level: &str) -> EnvFilter {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    match format!("{DIAGNOSTICS_TARGET}=info").parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_level_keeps_post_diagnostics() {
        let rendered = page_filter("warn").to_string();
        assert!(rendered.contains("warn"));
        assert!(rendered.contains("botfilter=info"));
    }

    #[test]
    fn invalid_level_falls_back_to_info() {
        let rendered = page_filter("app=loud").to_string();
        assert!(!rendered.contains("loud"));
        assert!(rendered.contains("botfilter=info"));
    }
}
