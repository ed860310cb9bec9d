//! Database integration tests
//!
//! These tests verify the TursoClient functionality using in-memory SQLite.

use scout::db::{NewMessage, ResearchStore, TursoClient};
use scout::types::{
    AppError, ConversationStatus, MessageMetadata, ModelKind, NewResearchResult, ResearchLink,
    Source,
};

/// Test helper to create a TursoClient with in-memory database
async fn create_test_client() -> TursoClient {
    TursoClient::new_memory()
        .await
        .expect("Failed to create in-memory database")
}

fn sample_result(company: &str) -> NewResearchResult {
    NewResearchResult {
        company_name: company.to_string(),
        business_analysis: "• Core Business: Robots".to_string(),
        key_people: vec!["Jane Doe, CEO".to_string()],
        recent_developments: "• Latest News: Series C".to_string(),
        links: vec![ResearchLink {
            title: "Official Website [https://acme.example]".to_string(),
            url: "https://acme.example".to_string(),
        }],
        highlights: "• Strengths: Fast".to_string(),
        industry: Some("Robotics".to_string()),
        funding: Some("$120M".to_string()),
    }
}

// ============= Conversations =============

#[tokio::test]
async fn test_conversations_newest_first() {
    let client = create_test_client().await;

    let first = client
        .create_conversation("Acme", ConversationStatus::Active)
        .await
        .unwrap();
    let second = client
        .create_conversation("Globex", ConversationStatus::Completed)
        .await
        .unwrap();

    let listed = client.list_conversations().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
    assert_eq!(listed[0].status, ConversationStatus::Completed);
    assert!(!listed[1].is_cancelled);
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let client = create_test_client().await;
    let conversation = client
        .create_conversation("Acme", ConversationStatus::Active)
        .await
        .unwrap();

    assert!(!client.is_cancelled(&conversation.id).await.unwrap());
    client.cancel_conversation(&conversation.id).await.unwrap();
    client.cancel_conversation(&conversation.id).await.unwrap();
    assert!(client.is_cancelled(&conversation.id).await.unwrap());

    let stored = client.get_conversation(&conversation.id).await.unwrap().unwrap();
    assert!(stored.is_cancelled);
}

#[tokio::test]
async fn test_cancel_unknown_conversation() {
    let client = create_test_client().await;

    assert!(matches!(
        client.cancel_conversation("missing").await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        client.is_cancelled("missing").await,
        Err(AppError::NotFound(_))
    ));
    assert!(client.get_conversation("missing").await.unwrap().is_none());
}

// ============= Messages =============

#[tokio::test]
async fn test_messages_in_insertion_order() {
    let client = create_test_client().await;
    let conversation = client
        .create_conversation("Acme", ConversationStatus::Active)
        .await
        .unwrap();

    for content in ["first", "second", "third"] {
        client
            .add_message(NewMessage::user(&conversation.id, content, ModelKind::Claude))
            .await
            .unwrap();
    }

    let messages = client.list_messages(&conversation.id).await.unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
    assert!(messages.iter().all(|m| m.model == ModelKind::Claude));
}

#[tokio::test]
async fn test_update_message_overwrites_in_place() {
    let client = create_test_client().await;
    let conversation = client
        .create_conversation("Acme", ConversationStatus::Active)
        .await
        .unwrap();
    let reply = client
        .add_message(NewMessage::assistant(&conversation.id, "partial", ModelKind::Gpt4))
        .await
        .unwrap();

    let metadata = MessageMetadata {
        sources: vec![Source {
            title: "Acme".to_string(),
            url: "https://acme.example".to_string(),
        }],
    };
    client
        .update_message(&reply.id, "complete", Some(&metadata))
        .await
        .unwrap();

    let messages = client.list_messages(&conversation.id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "complete");
    assert_eq!(messages[0].metadata.as_ref(), Some(&metadata));

    assert!(matches!(
        client.update_message("missing", "x", None).await,
        Err(AppError::NotFound(_))
    ));
}

// ============= Research Results =============

#[tokio::test]
async fn test_result_round_trip() {
    let client = create_test_client().await;

    let created = client
        .create_research_result(sample_result("Acme Corp"))
        .await
        .unwrap();
    let listed = client.list_research_results().await.unwrap();

    assert_eq!(listed, vec![created.clone()]);
    assert_eq!(created.notes, None);
    assert!(!created.is_open);
    assert_eq!(created.confidence, None);
}

#[tokio::test]
async fn test_notes_update_twice() {
    let client = create_test_client().await;
    let created = client
        .create_research_result(sample_result("Acme Corp"))
        .await
        .unwrap();

    client
        .update_research_notes(&created.id, "Follow up in Q3")
        .await
        .unwrap();
    client
        .update_research_notes(&created.id, "Follow up in Q3")
        .await
        .unwrap();

    let listed = client.list_research_results().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].notes.as_deref(), Some("Follow up in Q3"));
}

#[tokio::test]
async fn test_toggle_and_delete() {
    let client = create_test_client().await;
    let created = client
        .create_research_result(sample_result("Acme Corp"))
        .await
        .unwrap();

    assert!(client.toggle_research_result(&created.id).await.unwrap());
    assert!(!client.toggle_research_result(&created.id).await.unwrap());

    client.delete_research_result(&created.id).await.unwrap();
    assert!(client.list_research_results().await.unwrap().is_empty());

    assert!(matches!(
        client.toggle_research_result(&created.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        client.delete_research_result(&created.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        client.update_research_notes(&created.id, "gone").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_concurrent_toggles_both_apply() {
    let client = create_test_client().await;
    let created = client
        .create_research_result(sample_result("Acme Corp"))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        client.toggle_research_result(&created.id),
        client.toggle_research_result(&created.id)
    );

    // One call opened it and the other closed it again
    assert_ne!(first.unwrap(), second.unwrap());
    let listed = client.list_research_results().await.unwrap();
    assert!(!listed[0].is_open);
}

#[tokio::test]
async fn test_summaries_limited_and_newest_first() {
    let client = create_test_client().await;
    for i in 0..12 {
        client
            .create_research_result(sample_result(&format!("Company {i}")))
            .await
            .unwrap();
    }

    let summaries = client.research_summaries(10).await.unwrap();
    assert_eq!(summaries.len(), 10);
    assert_eq!(summaries[0].company_name, "Company 11");
    assert_eq!(summaries[9].company_name, "Company 2");
    assert_eq!(summaries[0].key_people, vec!["Jane Doe, CEO".to_string()]);
    assert_eq!(summaries[0].funding.as_deref(), Some("$120M"));
}

// ============= Storage =============

#[tokio::test]
async fn test_local_file_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("scout.db");
    let path = path.to_str().unwrap();

    {
        let client = TursoClient::new_local(path).await.unwrap();
        client
            .create_research_result(sample_result("Acme Corp"))
            .await
            .unwrap();
    }

    let reopened = TursoClient::new_local(path).await.unwrap();
    let listed = reopened.list_research_results().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].company_name, "Acme Corp");
}

// ============= Migrations =============

#[tokio::test]
async fn test_migrations_backfill_legacy_rows() {
    let client = create_test_client().await;
    let conn = client.connection();
    for sql in [
        "INSERT INTO conversations (id, title, status, created_at, updated_at, is_cancelled)
         VALUES ('c1', 'Legacy', 'active', 100, NULL, NULL)",
        "INSERT INTO messages (id, conversation_id, content, role, created_at, model, metadata)
         VALUES ('m1', 'c1', 'Acme', 'user', 101, NULL, NULL)",
        r#"INSERT INTO messages (id, conversation_id, content, role, created_at, model, metadata)
         VALUES ('m2', 'c1', 'Report', 'assistant', 102, 'gpt4',
                 '{"sources":[{"title":"A","url":"https://a.example","relevance":0.9}]}')"#,
    ] {
        conn.execute(sql, ()).await.unwrap();
    }

    let report = client.run_migrations().await.unwrap();
    assert!(report.success);
    assert_eq!(
        report.message,
        "Successfully migrated 1 conversation(s), backfilled 1 message model(s) and cleaned up 1 message(s)"
    );

    let conversation = client.get_conversation("c1").await.unwrap().unwrap();
    assert_eq!(conversation.updated_at, 100);
    assert!(!conversation.is_cancelled);

    let reply = client.get_message("m2").await.unwrap().unwrap();
    assert_eq!(
        reply.metadata.unwrap().sources,
        vec![Source {
            title: "A".to_string(),
            url: "https://a.example".to_string()
        }]
    );

    let again = client.run_migrations().await.unwrap();
    assert_eq!(again.message, "No records needed migration");
}

#[tokio::test]
async fn test_migrations_on_clean_store() {
    let client = create_test_client().await;
    let conversation = client
        .create_conversation("Acme", ConversationStatus::Active)
        .await
        .unwrap();
    client
        .add_message(NewMessage::user(&conversation.id, "Acme", ModelKind::Grok))
        .await
        .unwrap();

    let report = client.run_migrations().await.unwrap();
    assert!(report.success);
    assert_eq!(report.message, "No records needed migration");
}
