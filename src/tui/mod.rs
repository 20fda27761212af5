//! Interactive terminal demo: a mock conversation scrolled through the
//! windowed engine.

pub mod app;
pub mod app_loop;
pub mod colors;
pub mod message_renderer;
pub mod scroll_handler;
pub mod terminal;

pub use app::{DemoApp, DemoOptions};
pub use message_renderer::{message_render_fn, render_message};
pub use scroll_handler::{DemoAction, map_event};

use anyhow::Result;

use crate::config::AppConfig;

pub async fn run_demo(config: &AppConfig, options: DemoOptions) -> Result<()> {
    let mut app = DemoApp::new(config, &options)?;

    let mut terminal = terminal::init_terminal()?;
    let size = terminal.size()?;
    app.resize(size.width, size.height);
    app.start();

    let result = app_loop::run_event_loop(terminal, &mut app).await;
    app.shutdown();

    match result {
        Ok(terminal) => terminal::restore_terminal(terminal),
        Err(e) => {
            // The terminal was consumed by the loop; put the tty back anyway.
            let _ = crossterm::terminal::disable_raw_mode();
            let _ = crossterm::execute!(
                std::io::stdout(),
                crossterm::event::DisableMouseCapture,
                crossterm::terminal::LeaveAlternateScreen
            );
            Err(e)
        }
    }
}
