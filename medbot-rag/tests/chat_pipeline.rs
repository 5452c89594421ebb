//! End-to-end question answering over an in-memory index.

mod common;

use std::sync::Arc;

use common::{DONT_KNOW, GroundedModel, UnreachableModel, service_over};
use medbot_rag::{Document, ErrorKind};

fn aspirin_corpus() -> Vec<Document> {
    vec![
        Document::new(
            "data/pharmacology.pdf",
            "Aspirin reduces fever and inflammation. It is a nonsteroidal anti-inflammatory drug.",
        )
        .with_page(4),
        Document::new(
            "data/endocrinology.pdf",
            "Diabetes mellitus is a chronic condition marked by high blood glucose.",
        )
        .with_page(1),
    ]
}

fn diabetes_corpus() -> Vec<Document> {
    vec![
        Document::new(
            "data/diabetes.pdf",
            "Diabetes mellitus is a chronic condition marked by high blood glucose. \
             Insulin therapy helps keep blood sugar within target ranges.",
        ),
        Document::new("data/diabetes-care.pdf", "Regular exercise improves insulin sensitivity."),
    ]
}

#[tokio::test]
async fn answers_from_the_matching_document() {
    let service = service_over(&aspirin_corpus(), Arc::new(GroundedModel)).await;
    let exchange = service.process("What does aspirin do?").await.unwrap();

    assert_eq!(exchange.question, "What does aspirin do?");
    let answer = exchange.answer.to_lowercase();
    assert!(answer.contains("fever") || answer.contains("inflammation"), "answer: {answer}");
    assert!(exchange.context_used.contains(&"data/pharmacology.pdf".to_string()));
}

#[tokio::test]
async fn unrelated_question_admits_missing_information() {
    let service = service_over(&diabetes_corpus(), Arc::new(GroundedModel)).await;
    let exchange = service.process("What is the boiling point of mercury?").await.unwrap();

    assert_eq!(exchange.answer, DONT_KNOW);
    assert!(!exchange.answer.to_lowercase().contains("mercury"));
}

#[tokio::test]
async fn context_sources_are_distinct_and_bounded_by_k() {
    let docs: Vec<Document> = (1..=5)
        .map(|page| {
            Document::new("data/pharmacology.pdf", format!("Aspirin dosing note number {page}."))
                .with_page(page)
        })
        .collect();
    let service = service_over(&docs, Arc::new(GroundedModel)).await;
    let exchange = service.process("aspirin dosing").await.unwrap();

    assert_eq!(exchange.context_used, vec!["data/pharmacology.pdf".to_string()]);
}

#[tokio::test]
async fn empty_index_still_answers() {
    let service = service_over(&[], Arc::new(GroundedModel)).await;
    let exchange = service.process("What does aspirin do?").await.unwrap();
    assert_eq!(exchange.answer, DONT_KNOW);
    assert!(exchange.context_used.is_empty());
}

#[tokio::test]
async fn synthesis_failure_propagates_from_process() {
    let service = service_over(&aspirin_corpus(), Arc::new(UnreachableModel)).await;
    let err = service.process("What does aspirin do?").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Synthesis);
}

#[tokio::test]
async fn health_check_reports_false_when_model_unreachable() {
    let service = service_over(&aspirin_corpus(), Arc::new(UnreachableModel)).await;
    assert!(!service.health_check().await);
}

#[tokio::test]
async fn health_check_reports_true_when_model_answers() {
    let service = service_over(&aspirin_corpus(), Arc::new(GroundedModel)).await;
    assert!(service.health_check().await);
}
