use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// `RUST_LOG` wins; otherwise `LOG_LEVEL` applies to this crate and tower_http.
pub fn init_logging(config: &AppConfig) {
    let level = &config.log_level;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("user_service={level},tower_http={level},axum=info"))
    });

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    let installed = if config.json_logs {
        builder.with_target(false).json().try_init()
    } else {
        builder.try_init()
    };
    // Tests and embedders may install their own subscriber first; keep theirs.
    if let Err(e) = installed {
        tracing::debug!(error = %e, "global subscriber already set");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_keeps_the_first_subscriber() {
        let mut config = crate::state::AppState::fake().config.as_ref().clone();
        init_logging(&config);
        config.json_logs = true;
        init_logging(&config);
    }
}
