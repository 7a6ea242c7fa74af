//! Basic example of streaming records into an Azure AI Search index.
//!
//! This example demonstrates:
//! 1. Declaring a field schema
//! 2. Building the sink and a writer
//! 3. Writing a small stream of records (batches flush automatically)
//! 4. Closing the writer to flush the trailing partial batch
//!
//! # Setup
//!
//! You need an Azure AI Search service with an index whose fields match the
//! schema below (`id`, `content`, `vector` with 8 dimensions for this demo;
//! a real index would use the embedding model's dimensionality, e.g. 1536).
//!
//! # Running
//!
//! ```bash
//! export AZURE_SEARCH_SERVICE="your-service-name"
//! export AZURE_SEARCH_ADMIN_KEY="your-admin-key"
//! cargo run --example basic_upload
//! ```

use azure_search_sink::{
    AzureSearchSink, FieldKind, IndexSchema, Record, STABLE_API_VERSION,
};
use serde_json::json;

const VECTOR_DIMENSIONS: u32 = 8;

/// Mock embedding (a fixed-length profile of the text). In production this
/// comes from an embedding model upstream of the sink.
fn mock_embedding(text: &str) -> Vec<f32> {
    let bytes = text.as_bytes();
    (0..VECTOR_DIMENSIONS as usize)
        .map(|i| bytes.get(i).copied().unwrap_or_default() as f32 / 255.0)
        .collect()
}

fn make_record(id: &str, content: &str) -> Record {
    let mut record = Record::new();
    record.insert("id".to_string(), json!(id));
    record.insert("content".to_string(), json!(content));
    record.insert("vector".to_string(), json!(mock_embedding(content)));
    record
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let service = std::env::var("AZURE_SEARCH_SERVICE")?;
    let admin_key = AzureSearchSink::admin_key_from_env()?;

    let schema = IndexSchema::builder()
        .field("id", FieldKind::String)
        .field_with_default("content", FieldKind::String, json!(""))
        .vector_field("vector", VECTOR_DIMENSIONS)
        .build()?;

    let sink = AzureSearchSink::new(
        service,
        "demo-index",
        STABLE_API_VERSION,
        admin_key,
        schema,
    )?
    .with_batch_size(2);

    let documents = [
        ("doc-1", "Rust is a systems programming language."),
        ("doc-2", "Vector indexes answer similarity queries."),
        ("doc-3", "Dataflow sinks push records downstream."),
    ];

    let mut writer = sink.build()?;
    for (id, content) in documents {
        // Every second write crosses the batch limit and uploads.
        if let Some(result) = writer.write(&make_record(id, content)).await? {
            println!(
                "batch uploaded: {} succeeded, {} failed",
                result.succeeded, result.failed
            );
        }
    }

    // Flush the trailing partial batch.
    if let Some(result) = writer.close().await? {
        println!(
            "final batch uploaded: {} succeeded, {} failed",
            result.succeeded, result.failed
        );
        for failure in &result.failures {
            eprintln!(
                "rejected document {}: {} ({})",
                failure.key, failure.message, failure.status_code
            );
        }
    }

    Ok(())
}
