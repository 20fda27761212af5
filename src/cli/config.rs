use crate::cli::ConfigAction;
use crate::{AppConfig, console};

pub fn handle_config(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = AppConfig::load()?;
            let window = &config.window;

            if let Some(ref verbosity) = config.verbosity {
                console().plain(&format!("verbosity = \"{}\"", verbosity));
            }

            console().newline();
            console().plain("[window]");
            console().plain(&format!("order = \"{}\"", window.order));
            console().plain(&format!("page_size = {}", window.page_size));
            console().plain(&format!("trim_threshold = {}", window.trim_threshold));
            console().plain(&format!(
                "trim_factor_top = {}  # limit {}",
                window.trim_factor_top,
                window.trim_limit(crate::window::Edge::Top)
            ));
            console().plain(&format!(
                "trim_factor_bottom = {}  # limit {}",
                window.trim_factor_bottom,
                window.trim_limit(crate::window::Edge::Bottom)
            ));
            console().plain(&format!("guard_band_size = {}", window.guard_band_size));
            console().plain(&format!("scroll_margin_up = {}", window.scroll_margin_up));
            console().plain(&format!("scroll_margin_down = {}", window.scroll_margin_down));
            console().plain(&format!("debounce_top_ms = {}", window.debounce_top_ms));
            console().plain(&format!("debounce_bottom_ms = {}", window.debounce_bottom_ms));
            console().plain(&format!("trim_throttle_ms = {}", window.trim_throttle_ms));
            console().plain(&format!(
                "exhausted_cooldown_ms = {}",
                window.exhausted_cooldown_ms
            ));
            console().plain(&format!(
                "velocity_correction_ms = {}",
                window.velocity_correction_ms
            ));
            console().plain(&format!("velocity_idle_ms = {}", window.velocity_idle_ms));
            console().plain(&format!("follow_live_edge = {}", window.follow_live_edge));

            let mock = &config.mock;
            console().newline();
            console().plain("[mock]");
            console().plain(&format!("total_messages = {}", mock.total_messages));
            console().plain(&format!("latency_ms = {}", mock.latency_ms));
            console().plain(&format!("failure_rate = {}", mock.failure_rate));
            console().plain(&format!("live_interval_ms = {}", mock.live_interval_ms));
            if let Some(seed) = mock.seed {
                console().plain(&format!("seed = {}", seed));
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = AppConfig::load()?;

            match config.update_setting(&key, &value) {
                Ok(()) => {
                    config.save()?;
                    console().success(&format!("Updated {} = {}", key, value));
                }
                Err(e) => {
                    console().error(&e.to_string());
                    console().plain(
                        "Keys: verbosity, window.<field>, mock.<field> (see `config show`)",
                    );
                }
            }
        }
        ConfigAction::Path => {
            let path = AppConfig::config_path()?;
            console().plain(&path.display().to_string());
        }
    }
    Ok(())
}
