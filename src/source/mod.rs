use async_trait::async_trait;
use std::fmt;

use crate::window::{Direction, Edge, TimelineItem};

pub mod error;
pub mod id;
pub mod mock;

pub use error::FetchError;
pub use id::IdGenerator;
pub use mock::{MockMessageSource, MockSourceConfig};

/// "Give me `size` items strictly after/before `anchor`."
///
/// `anchor: None` asks for the page adjacent to the live end. `inclusive`
/// is set only for jump loads, where the anchor item itself is wanted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest<K> {
    pub direction: Direction,
    pub anchor: Option<K>,
    pub size: usize,
    pub inclusive: bool,
}

impl<K> LoadRequest<K> {
    pub fn forward(anchor: Option<K>, size: usize) -> Self {
        Self {
            direction: Direction::Forward,
            anchor,
            size,
            inclusive: false,
        }
    }

    pub fn backward(anchor: Option<K>, size: usize) -> Self {
        Self {
            direction: Direction::Backward,
            anchor,
            size,
            inclusive: false,
        }
    }

    pub fn jump(anchor: K, size: usize) -> Self {
        Self {
            direction: Direction::Forward,
            anchor: Some(anchor),
            size,
            inclusive: true,
        }
    }

    pub fn edge(&self) -> Edge {
        self.direction.edge()
    }
}

impl<K: fmt::Debug> LoadRequest<K> {
    pub fn anchor_label(&self) -> String {
        match &self.anchor {
            Some(anchor) => format!("{:?}", anchor),
            None => "live end".to_string(),
        }
    }
}

/// Paginated data source consumed by the engine. The transport behind it is
/// irrelevant; implementations only need to honour the request semantics.
#[async_trait]
pub trait PageSource<T: TimelineItem>: Send + Sync {
    async fn fetch_page(&self, request: &LoadRequest<T::Key>) -> Result<Vec<T>, FetchError>;

    fn source_name(&self) -> &'static str;
}
