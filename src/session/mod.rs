// Session module
// Conversation history plus the per-user glue between the UI actions and the recommender

#[cfg(test)]
mod tests;

use std::path::Path;

use tracing::{info, warn};

use crate::config::Credentials;
use crate::recommender::{Recommendation, Recommender};

pub const WELCOME_MESSAGE: &str = "Welcome! I'm your AI-powered product recommendation bot. Ask me anything about finding the perfect product for you.";
pub const WELCOME_REPLY: &str =
    "I'm here to assist you with any product-related inquiries. Let's find what you need!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub user_text: String,
    pub assistant_text: String,
}

impl ConversationTurn {
    #[inline]
    pub fn new(user_text: impl Into<String>, assistant_text: impl Into<String>) -> Self {
        Self {
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
        }
    }

    #[inline]
    pub fn welcome() -> Self {
        Self::new(WELCOME_MESSAGE, WELCOME_REPLY)
    }
}

/// What the chat view shows: history, the input box and the product gallery
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    history: Vec<ConversationTurn>,
    pending_input: String,
    gallery: Vec<Recommendation>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            history: vec![ConversationTurn::welcome()],
            pending_input: String::new(),
            gallery: Vec::new(),
        }
    }
}

impl Conversation {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    #[inline]
    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    #[inline]
    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// Remove and return the pending input, leaving the input box empty
    #[inline]
    pub fn take_pending_input(&mut self) -> String {
        std::mem::take(&mut self.pending_input)
    }

    #[inline]
    pub fn gallery(&self) -> &[Recommendation] {
        &self.gallery
    }

    #[inline]
    pub fn set_gallery(&mut self, gallery: Vec<Recommendation>) {
        self.gallery = gallery;
    }

    #[inline]
    pub fn append(&mut self, turn: ConversationTurn) -> &ConversationTurn {
        self.history.push(turn);
        &self.history[self.history.len() - 1]
    }

    /// Back to the single welcome turn with an empty input and gallery
    #[inline]
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// One user's credentials and conversation over shared services
#[derive(Debug)]
pub struct Session {
    recommender: Recommender,
    credentials: Credentials,
    conversation: Conversation,
    top_k: usize,
}

impl Session {
    #[inline]
    pub fn new(recommender: Recommender, credentials: Credentials) -> Self {
        let top_k = recommender.default_top_k();
        Self {
            recommender,
            credentials,
            conversation: Conversation::new(),
            top_k,
        }
    }

    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    #[inline]
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.conversation.set_pending_input(text);
    }

    /// Ingest a catalog file and return the status line to display
    #[inline]
    pub async fn upload_catalog<P: AsRef<Path>>(&self, path: P) -> String {
        match self
            .recommender
            .ingest_catalog(path, &self.credentials)
            .await
        {
            Ok(report) => {
                info!(
                    "Catalog upload stored {} of {} rows in {}",
                    report.written, report.rows, report.index_name
                );
                report.status_message().to_string()
            }
            Err(e) => {
                warn!("Catalog upload failed ({}): {}", e.kind(), e);
                e.status_message().to_string()
            }
        }
    }

    /// Answer the pending input: refresh the gallery and append the new turn
    #[inline]
    pub async fn submit_query(&mut self) -> &ConversationTurn {
        let query = self.conversation.take_pending_input();

        let recommendations = self
            .recommender
            .recommend_products(&query, &self.credentials, self.top_k)
            .await;
        let reply = self
            .recommender
            .generate_contextual_message(&query, &recommendations, &self.credentials)
            .await;

        self.conversation.set_gallery(recommendations);
        self.conversation.append(ConversationTurn::new(query, reply))
    }

    #[inline]
    pub fn clear(&mut self) {
        self.conversation.clear();
    }
}
