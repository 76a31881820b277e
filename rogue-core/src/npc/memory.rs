//! Conversation memory for generated characters.
//!
//! Each character keeps a bounded list of exchanges with the player. When
//! the list overflows, the most recent 70% is kept verbatim and the older
//! part is folded into a single summary exchange.

use crate::completion::TextCompletion;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default maximum number of exchanges a character remembers.
pub const DEFAULT_MAX_HISTORY: usize = 10;

/// Query text of the synthetic exchange that replaces summarized history.
pub const SUMMARY_QUERY: &str = "*earlier conversation*";

/// Share of the history kept verbatim when trimming, in tenths.
const RETAIN_TENTHS: usize = 7;

/// Older exchanges are only summarized when there are more than this many.
const MIN_SUMMARIZED: usize = 2;

/// One player utterance and the character's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub query: String,
    pub response: String,
}

impl Exchange {
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
        }
    }

    /// Whether this is the synthetic summary exchange.
    pub fn is_summary(&self) -> bool {
        self.query == SUMMARY_QUERY
    }
}

/// Bounded, summarizing conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMemory {
    exchanges: Vec<Exchange>,
    max_len: usize,
}

impl ConversationMemory {
    pub fn new(max_len: usize) -> Self {
        Self {
            exchanges: Vec::new(),
            max_len,
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// The last `n` exchanges, oldest first.
    pub fn recent(&self, n: usize) -> &[Exchange] {
        let start = self.exchanges.len().saturating_sub(n);
        &self.exchanges[start..]
    }

    /// Coarse description of how far the conversation has gone.
    pub fn context_label(&self) -> &'static str {
        match self.exchanges.len() {
            0 => "first interaction",
            1..=2 => "brief conversation so far",
            _ => "ongoing conversation",
        }
    }

    /// How many exchanges survive a trim verbatim: floor(0.7 * max).
    pub fn retained_len(&self) -> usize {
        self.max_len * RETAIN_TENTHS / 10
    }

    /// Append an exchange, trimming if the history is now too long.
    ///
    /// Summarization goes through `completion`; if that call fails a local
    /// summary is used so the history is always brought back under the cap.
    pub async fn record_exchange(
        &mut self,
        query: impl Into<String>,
        response: impl Into<String>,
        completion: &dyn TextCompletion,
    ) {
        self.exchanges.push(Exchange::new(query, response));
        if self.exchanges.len() > self.max_len {
            self.trim(completion).await;
        }
    }

    async fn trim(&mut self, completion: &dyn TextCompletion) {
        let keep = self.retained_len().min(self.exchanges.len());
        let split = self.exchanges.len() - keep;
        let retained = self.exchanges.split_off(split);
        let discarded = std::mem::replace(&mut self.exchanges, retained);

        if discarded.len() <= MIN_SUMMARIZED {
            debug!(dropped = discarded.len(), "Dropped old exchanges without summary");
            return;
        }

        let summary = match completion.complete(&summary_prompt(&discarded)).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => local_summary(&discarded),
            Err(e) => {
                warn!("Conversation summary failed, using local summary: {e}");
                local_summary(&discarded)
            }
        };

        debug!(summarized = discarded.len(), kept = self.exchanges.len(), "Trimmed conversation");
        self.exchanges.insert(
            0,
            Exchange::new(SUMMARY_QUERY, format!("*summary: {summary}*")),
        );
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.exchanges.clear();
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

fn summary_prompt(discarded: &[Exchange]) -> String {
    let mut prompt = String::from(
        "Summarize the following conversation between a player and a dungeon character \
         in 2-3 sentences. Keep names, promises, and anything the character learned about \
         the player. Reply with the summary only.\n\n",
    );
    for exchange in discarded {
        prompt.push_str(&format!("Player: {}\n", exchange.query));
        prompt.push_str(&format!("Character: {}\n", exchange.response));
    }
    prompt
}

/// Summary built without a model: exchange count plus what the player asked.
fn local_summary(discarded: &[Exchange]) -> String {
    let topics: Vec<String> = discarded
        .iter()
        .filter(|e| !e.is_summary())
        .map(|e| truncate(&e.query, 40))
        .collect();

    if topics.is_empty() {
        format!("{} earlier exchanges", discarded.len())
    } else {
        format!(
            "{} earlier exchanges; the player talked about: {}",
            discarded.len(),
            topics.join("; ")
        )
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockCompletion;

    async fn fill(memory: &mut ConversationMemory, n: usize, completion: &MockCompletion) {
        for i in 0..n {
            memory
                .record_exchange(format!("question {i}"), format!("answer {i}"), completion)
                .await;
        }
    }

    #[tokio::test]
    async fn test_record_below_cap() {
        let completion = MockCompletion::failing();
        let mut memory = ConversationMemory::new(10);
        fill(&mut memory, 10, &completion).await;

        assert_eq!(memory.len(), 10);
        assert_eq!(completion.calls(), 0);
        assert_eq!(memory.exchanges()[0].query, "question 0");
    }

    #[tokio::test]
    async fn test_overflow_summarizes_old_exchanges() {
        let completion = MockCompletion::new(vec!["They discussed the weather.".to_string()]);
        let mut memory = ConversationMemory::new(10);
        fill(&mut memory, 11, &completion).await;

        // 7 kept verbatim + 1 summary
        assert_eq!(memory.len(), 8);
        assert_eq!(completion.calls(), 1);

        let first = &memory.exchanges()[0];
        assert!(first.is_summary());
        assert_eq!(first.response, "*summary: They discussed the weather.*");
        assert_eq!(memory.exchanges()[1].query, "question 4");
        assert_eq!(memory.exchanges().last().unwrap().query, "question 10");

        let prompt = completion.prompts().pop().unwrap();
        assert!(prompt.contains("Player: question 0"));
        assert!(prompt.contains("Character: answer 3"));
        assert!(!prompt.contains("question 4"));
    }

    #[tokio::test]
    async fn test_small_overflow_drops_without_summary() {
        // max 3: keep floor(2.1) = 2, the 2 older exchanges are just dropped
        let completion = MockCompletion::new(vec!["unused".to_string()]);
        let mut memory = ConversationMemory::new(3);
        fill(&mut memory, 4, &completion).await;

        assert_eq!(memory.len(), 2);
        assert_eq!(completion.calls(), 0);
        assert!(memory.exchanges().iter().all(|e| !e.is_summary()));
        assert_eq!(memory.exchanges()[0].query, "question 2");
    }

    #[tokio::test]
    async fn test_failed_summary_uses_local_summary() {
        let completion = MockCompletion::failing();
        let mut memory = ConversationMemory::new(10);
        fill(&mut memory, 11, &completion).await;

        assert_eq!(memory.len(), 8);
        let summary = &memory.exchanges()[0];
        assert!(summary.is_summary());
        assert!(summary.response.starts_with("*summary: 4 earlier exchanges"));
        assert!(summary.response.contains("question 0"));
    }

    #[tokio::test]
    async fn test_repeated_trims_stay_bounded() {
        let completion = MockCompletion::failing();
        let mut memory = ConversationMemory::new(10);
        fill(&mut memory, 50, &completion).await;

        assert!(memory.len() <= 10);
        assert_eq!(memory.exchanges().last().unwrap().query, "question 49");
        assert_eq!(memory.exchanges().iter().filter(|e| e.is_summary()).count(), 1);
    }

    #[test]
    fn test_context_label() {
        let mut memory = ConversationMemory::default();
        assert_eq!(memory.context_label(), "first interaction");

        memory.exchanges.push(Exchange::new("a", "b"));
        assert_eq!(memory.context_label(), "brief conversation so far");
        memory.exchanges.push(Exchange::new("a", "b"));
        assert_eq!(memory.context_label(), "brief conversation so far");
        memory.exchanges.push(Exchange::new("a", "b"));
        assert_eq!(memory.context_label(), "ongoing conversation");
    }

    #[test]
    fn test_recent() {
        let mut memory = ConversationMemory::default();
        for i in 0..7 {
            memory.exchanges.push(Exchange::new(format!("q{i}"), "r"));
        }
        let recent = memory.recent(5);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].query, "q2");
        assert_eq!(memory.recent(100).len(), 7);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("héllo wörld", 5), "héllo...");
        assert_eq!(truncate("short", 40), "short");
    }
}
