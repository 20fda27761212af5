pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod message;
pub mod orchestrator;
pub mod push_bus;
pub mod session;
pub mod source;
pub mod trim;
pub mod tui;
pub mod viewport;
pub mod window;

pub use config::{AppConfig, ConfigError, WindowConfig};
pub use console::{Console, VerbosityLevel, console, init_console};
pub use engine::{
    EngineError, LoadPage, PushOutcome, ScrollToOutcome, TimelineEngine, WindowSnapshot,
};
pub use message::ChatMessage;
pub use orchestrator::{EdgeStatus, LoadOrchestrator, LoadTicket};
pub use push_bus::{PushBus, StreamId, Subscription};
pub use session::{SessionEvent, TimelineSession};
pub use source::{FetchError, LoadRequest, MockMessageSource, MockSourceConfig, PageSource};
pub use viewport::{ElementBounds, LineViewport, ViewportAdapter};
pub use window::{Direction, Edge, ItemKey, SortOrder, TimelineItem, Window};
