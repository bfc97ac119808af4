//! `ragchat peek` - Print records stored in a collection.

use ragchat_core::error::StoreError;
use ragchat_core::store::{Collection, StoredRecord, VectorStore};
use std::path::Path;

pub async fn run(config_path: Option<&Path>, collection: &str, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let store = ragchat_store::build_from_config(&config.store);

    let (handle, total, records) = fetch(store.as_ref(), collection, limit).await?;

    println!("Collection '{}': {total} record(s), showing {}", handle.name, records.len());
    println!("{}", serde_json::to_string_pretty(&records)?);

    Ok(())
}

/// Read-only: a missing collection is an error, never created.
async fn fetch(
    store: &dyn VectorStore,
    collection: &str,
    limit: usize,
) -> Result<(Collection, usize, Vec<StoredRecord>), StoreError> {
    let handle = store.get_collection(collection).await?;
    let total = store.count(&handle).await?;
    let records = store.list(&handle, None, limit).await?;
    Ok((handle, total, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchat_store::ChromaStore;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn missing_collection_is_reported_not_created() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collections/typo"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/collections"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = ChromaStore::new(server.uri());
        let err = fetch(&store, "typo", 10).await.unwrap_err();
        assert!(matches!(err, StoreError::CollectionNotFound(_)));
    }

    #[tokio::test]
    async fn existing_collection_is_listed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collections/admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "c0ffee", "name": "admin" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/collections/c0ffee/count"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(1)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/collections/c0ffee/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ids": ["document_0"],
                "metadatas": [{ "type": "document", "text": "Be a pirate." }],
            })))
            .mount(&server)
            .await;

        let store = ChromaStore::new(server.uri());
        let (handle, total, records) = fetch(&store, "admin", 10).await.unwrap();
        assert_eq!(handle.id, "c0ffee");
        assert_eq!(total, 1);
        assert_eq!(records[0].id, "document_0");
    }
}
