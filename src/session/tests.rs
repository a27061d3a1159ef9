use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;

use super::*;
use crate::http::ServiceError;
use crate::recommender::test_support::{
    FaultyIndex, IndexFaults, KeywordEmbedder, ScriptedChat, credentials, recommender,
};

fn catalog_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        "product_id,product_name,description,image_url\n\
         p1,Red Shoe,A red running shoe,https://img.example.com/p1.jpg\n\
         p2,Blue Hat,A warm blue wool hat,https://img.example.com/p2.jpg"
    )
    .expect("write catalog");
    file
}

fn session_with(chat: ScriptedChat, faults: IndexFaults) -> Session {
    let recommender = recommender(
        Arc::new(KeywordEmbedder::default()),
        Arc::new(FaultyIndex::with_faults(faults)),
        Arc::new(chat),
    );
    Session::new(recommender, credentials())
}

#[test]
fn conversation_starts_with_welcome() {
    let conversation = Conversation::new();

    assert_eq!(conversation.history(), [ConversationTurn::welcome()]);
    assert_eq!(conversation.history()[0].user_text, WELCOME_MESSAGE);
    assert_eq!(conversation.history()[0].assistant_text, WELCOME_REPLY);
    assert!(conversation.pending_input().is_empty());
    assert!(conversation.gallery().is_empty());
}

#[test]
fn clear_restores_seeded_state() {
    let mut conversation = Conversation::new();
    conversation.append(ConversationTurn::new("hi", "hello"));
    conversation.append(ConversationTurn::new("hats?", "Blue Hat"));
    conversation.set_pending_input("half typed");
    conversation.set_gallery(vec![Recommendation {
        product_id: "p2".to_string(),
        product_name: "Blue Hat".to_string(),
        image_url: "https://img.example.com/p2.jpg".to_string(),
        score: 0.9,
        label: "Blue Hat (Score: 0.9)".to_string(),
    }]);

    conversation.clear();

    assert_eq!(conversation, Conversation::new());
    assert_eq!(conversation.history().len(), 1);
}

#[test]
fn append_returns_new_turn() {
    let mut conversation = Conversation::new();

    let turn = conversation.append(ConversationTurn::new("hi", "hello"));

    assert_eq!(turn, &ConversationTurn::new("hi", "hello"));
    assert_eq!(conversation.history().len(), 2);
}

#[test]
fn take_pending_input_empties_box() {
    let mut conversation = Conversation::new();
    conversation.set_pending_input("warm hat");

    assert_eq!(conversation.take_pending_input(), "warm hat");
    assert_eq!(conversation.pending_input(), "");
}

#[tokio::test]
async fn upload_reports_success() {
    let session = session_with(ScriptedChat::replying("unused"), IndexFaults::default());
    let file = catalog_file();

    let status = session.upload_catalog(file.path()).await;

    assert_eq!(
        status,
        "Product catalog processed and embeddings stored in Pinecone."
    );
}

#[tokio::test]
async fn upload_reports_each_failure() {
    let file = catalog_file();

    let create = session_with(
        ScriptedChat::replying("unused"),
        IndexFaults {
            create: true,
            ..IndexFaults::default()
        },
    );
    assert_eq!(
        create.upload_catalog(file.path()).await,
        "Failed to create Pinecone index."
    );

    let listing = session_with(
        ScriptedChat::replying("unused"),
        IndexFaults {
            list: true,
            ..IndexFaults::default()
        },
    );
    assert_eq!(
        listing.upload_catalog(file.path()).await,
        "Failed to process CSV file."
    );

    let upsert = session_with(
        ScriptedChat::replying("unused"),
        IndexFaults {
            upsert: true,
            ..IndexFaults::default()
        },
    );
    assert_eq!(
        upsert.upload_catalog(file.path()).await,
        "Failed to upsert embeddings."
    );

    let missing = session_with(ScriptedChat::replying("unused"), IndexFaults::default());
    assert_eq!(
        missing.upload_catalog("/nonexistent/catalog.csv").await,
        "Failed to process CSV file."
    );
}

#[tokio::test]
async fn submit_query_updates_view() {
    let mut session = session_with(
        ScriptedChat::replying("The Blue Hat is a cosy pick."),
        IndexFaults::default(),
    )
    .with_top_k(1);
    let file = catalog_file();
    session.upload_catalog(file.path()).await;
    session.set_input("warm hat");

    let turn = session.submit_query().await.clone();

    assert_eq!(
        turn,
        ConversationTurn::new("warm hat", "The Blue Hat is a cosy pick.")
    );
    let conversation = session.conversation();
    assert_eq!(conversation.history().len(), 2);
    assert_eq!(conversation.pending_input(), "");
    assert_eq!(conversation.gallery().len(), 1);
    assert!(conversation.gallery()[0].label.contains("Blue Hat"));
}

#[tokio::test]
async fn submit_query_survives_service_failures() {
    let mut session = session_with(
        ScriptedChat::failing(ServiceError::Transport("connection reset".to_string())),
        IndexFaults::default(),
    );
    session.set_input("warm hat");

    let turn = session.submit_query().await.clone();

    assert_eq!(turn.user_text, "warm hat");
    assert_eq!(turn.assistant_text, "Failed to generate contextual message.");
    assert!(session.conversation().gallery().is_empty());
}

#[tokio::test]
async fn clear_resets_session_view() {
    let mut session = session_with(ScriptedChat::replying("ok"), IndexFaults::default());
    session.set_input("first");
    session.submit_query().await;
    session.set_input("unsent");

    session.clear();

    assert_eq!(session.conversation(), &Conversation::new());
}
