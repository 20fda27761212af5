use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering as CmpOrdering;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{FetchError, IdGenerator, LoadRequest, PageSource};
use crate::message::ChatMessage;
use crate::window::{Direction, ItemKey, SortOrder, TimelineItem};

const AUTHORS: &[&str] = &["ana", "bo", "chen", "dara", "eli", "farid"];

const WORDS: &[&str] = &[
    "deploy", "window", "scroll", "ticket", "merge", "later", "review", "sync", "lunch",
    "ok", "thanks", "pushed", "branch", "flaky", "test", "again", "looks", "good", "ship",
    "it", "cache", "timeline", "message", "older", "newer", "trim", "edge", "load", "page",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockSourceConfig {
    #[serde(default = "default_total_messages")]
    pub total_messages: usize,
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    #[serde(default)]
    pub failure_rate: f64,
    #[serde(default = "default_live_interval_ms")]
    pub live_interval_ms: u64,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_total_messages() -> usize {
    500
}

fn default_latency_ms() -> u64 {
    150
}

fn default_live_interval_ms() -> u64 {
    4000
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            total_messages: default_total_messages(),
            latency_ms: default_latency_ms(),
            failure_rate: 0.0,
            live_interval_ms: default_live_interval_ms(),
            seed: None,
        }
    }
}

/// In-memory conversation history served page by page.
pub struct MockMessageSource {
    config: MockSourceConfig,
    order: SortOrder,
    ids: IdGenerator,
    history: Mutex<Vec<ChatMessage>>,
    rng: Mutex<StdRng>,
    fail_next: AtomicUsize,
    calls: AtomicUsize,
}

impl MockMessageSource {
    pub fn new(config: MockSourceConfig, ids: IdGenerator) -> Self {
        Self::with_order(config, ids, SortOrder::Ascending)
    }

    pub fn with_order(config: MockSourceConfig, ids: IdGenerator, order: SortOrder) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let now = Utc::now();
        let total = config.total_messages;
        let history = (0..total)
            .map(|i| {
                let mut message = random_message(&mut rng, ids.next_id());
                message.sent_at = now - ChronoDuration::minutes((total - i) as i64);
                message
            })
            .collect();

        Self {
            config,
            order,
            ids,
            history: Mutex::new(history),
            rng: Mutex::new(rng),
            fail_next: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Makes the next `count` fetches fail with a network error.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Number of `fetch_page` calls served so far, failures included.
    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lock_history().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_history().is_empty()
    }

    pub fn newest_id(&self) -> Option<i64> {
        self.lock_history().last().map(|m| m.id)
    }

    pub fn oldest_id(&self) -> Option<i64> {
        self.lock_history().first().map(|m| m.id)
    }

    pub fn message(&self, id: i64) -> Option<ChatMessage> {
        let history = self.lock_history();
        history
            .binary_search_by_key(&id, |m| m.id)
            .ok()
            .map(|index| history[index].clone())
    }

    /// Appends a new message at the live end, as if another participant had
    /// just sent it.
    pub fn append_live(&self) -> ChatMessage {
        let message = {
            let mut rng = self.lock_rng();
            random_message(&mut rng, self.ids.next_id())
        };
        self.lock_history().push(message.clone());
        message
    }

    /// Rewrites the body of an existing message and returns the new value.
    pub fn edit(&self, id: i64, body: impl Into<String>) -> Option<ChatMessage> {
        let mut history = self.lock_history();
        let index = history.binary_search_by_key(&id, |m| m.id).ok()?;
        let edited = history[index].clone().with_body(body);
        history[index] = edited.clone();
        Some(edited)
    }

    /// A random id from the stored history.
    pub fn random_id(&self) -> Option<i64> {
        let history = self.lock_history();
        if history.is_empty() {
            return None;
        }
        let index = self.lock_rng().gen_range(0..history.len());
        Some(history[index].id)
    }

    fn page(&self, request: &LoadRequest<ItemKey>) -> Vec<ChatMessage> {
        let history = self.lock_history();
        let mut ordered: Vec<&ChatMessage> = history.iter().collect();
        if self.order == SortOrder::Descending {
            ordered.reverse();
        }

        let order = self.order;
        let relation = |message: &ChatMessage| {
            request
                .anchor
                .as_ref()
                .map(|anchor| order.compare(&message.key(), anchor))
        };

        match request.direction {
            Direction::Backward => {
                let before: Vec<&ChatMessage> = ordered
                    .into_iter()
                    .filter(|m| match relation(*m) {
                        None => true,
                        Some(CmpOrdering::Less) => true,
                        Some(CmpOrdering::Equal) => request.inclusive,
                        Some(CmpOrdering::Greater) => false,
                    })
                    .collect();
                let start = before.len().saturating_sub(request.size);
                before[start..].iter().map(|m| (*m).clone()).collect()
            }
            Direction::Forward => ordered
                .into_iter()
                .filter(|m| match relation(*m) {
                    None => true,
                    Some(CmpOrdering::Greater) => true,
                    Some(CmpOrdering::Equal) => request.inclusive,
                    Some(CmpOrdering::Less) => false,
                })
                .take(request.size)
                .cloned()
                .collect(),
        }
    }

    fn should_fail(&self) -> bool {
        let pending = self.fail_next.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_next.store(pending - 1, Ordering::SeqCst);
            return true;
        }
        self.config.failure_rate > 0.0
            && self.lock_rng().gen_bool(self.config.failure_rate.clamp(0.0, 1.0))
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, Vec<ChatMessage>> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_rng(&self) -> std::sync::MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PageSource<ChatMessage> for MockMessageSource {
    async fn fetch_page(
        &self,
        request: &LoadRequest<ItemKey>,
    ) -> Result<Vec<ChatMessage>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        if self.should_fail() {
            return Err(FetchError::network("mock connection reset"));
        }

        Ok(self.page(request))
    }

    fn source_name(&self) -> &'static str {
        "mock"
    }
}

fn random_message(rng: &mut StdRng, id: i64) -> ChatMessage {
    let author = AUTHORS[rng.gen_range(0..AUTHORS.len())];
    let word_count = match rng.gen_range(0..10) {
        0..=5 => rng.gen_range(2..12),
        6..=8 => rng.gen_range(12..40),
        _ => rng.gen_range(40..90),
    };
    let body = (0..word_count)
        .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ");
    ChatMessage::new(id, author, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(total: usize) -> MockMessageSource {
        MockMessageSource::new(
            MockSourceConfig {
                total_messages: total,
                latency_ms: 0,
                seed: Some(7),
                ..Default::default()
            },
            IdGenerator::default(),
        )
    }

    fn ids(page: &[ChatMessage]) -> Vec<i64> {
        page.iter().map(|m| m.id).collect()
    }

    #[tokio::test]
    async fn test_backward_from_live_end_returns_newest_page() {
        let source = source(50);
        let page = source
            .fetch_page(&LoadRequest::backward(None, 10))
            .await
            .unwrap();
        assert_eq!(ids(&page), (41..=50).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_backward_is_strictly_before_anchor() {
        let source = source(50);
        let page = source
            .fetch_page(&LoadRequest::backward(Some(ItemKey::Number(20)), 5))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![15, 16, 17, 18, 19]);
    }

    #[tokio::test]
    async fn test_forward_is_strictly_after_anchor() {
        let source = source(50);
        let page = source
            .fetch_page(&LoadRequest::forward(Some(ItemKey::Number(0)), 10))
            .await
            .unwrap();
        assert_eq!(ids(&page), (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_forward_at_live_end_is_empty() {
        let source = source(50);
        let page = source
            .fetch_page(&LoadRequest::forward(Some(ItemKey::Number(50)), 10))
            .await
            .unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_jump_includes_anchor() {
        let source = source(50);
        let page = source
            .fetch_page(&LoadRequest::jump(ItemKey::Number(30), 3))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![30, 31, 32]);
    }

    #[tokio::test]
    async fn test_descending_backward_walks_towards_newer_ids() {
        let source = MockMessageSource::with_order(
            MockSourceConfig {
                total_messages: 20,
                latency_ms: 0,
                seed: Some(1),
                ..Default::default()
            },
            IdGenerator::default(),
            SortOrder::Descending,
        );
        let page = source
            .fetch_page(&LoadRequest::backward(Some(ItemKey::Number(10)), 3))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![13, 12, 11]);
    }

    #[tokio::test]
    async fn test_fail_next_then_recovers() {
        let source = source(10);
        source.fail_next(1);

        let first = source.fetch_page(&LoadRequest::backward(None, 5)).await;
        assert!(matches!(first, Err(FetchError::Network { .. })));

        let second = source.fetch_page(&LoadRequest::backward(None, 5)).await;
        assert_eq!(second.unwrap().len(), 5);
        assert_eq!(source.fetch_count(), 2);
    }

    #[test]
    fn test_append_live_uses_shared_id_generator() {
        let ids = IdGenerator::default();
        let source = MockMessageSource::new(
            MockSourceConfig {
                total_messages: 3,
                latency_ms: 0,
                seed: Some(3),
                ..Default::default()
            },
            ids.clone(),
        );

        let live = source.append_live();
        assert_eq!(live.id, 4);
        assert_eq!(ids.peek(), 5);
        assert_eq!(source.newest_id(), Some(4));
    }

    #[test]
    fn test_edit_replaces_body() {
        let source = source(5);
        let edited = source.edit(3, "rewritten").unwrap();
        assert!(edited.edited);
        assert_eq!(source.message(3).unwrap().body, "rewritten");
        assert!(source.edit(99, "nope").is_none());
    }
}
