//! The request router.
//!
//! [`ItemRouter::handle`] resolves a [`RouteRequest`] against the route table,
//! runs the matching repository call and always answers with a
//! [`RouteResponse`]. Failures never escape: they become an error response
//! whose body is the failure message encoded as a JSON string.

use std::sync::Arc;

use serde::Serialize;

use itemrouter_core::item::{IdStrategy, Item};
use itemrouter_core::request::{ErrorStatusPolicy, Route, RouteError, RouteRequest, RouteResponse};
use itemrouter_core::storage::{
    GetItemOutput, ItemRepository, RepositoryError, ScanOutput, WriteAck,
};

use crate::config::Config;

/// Routes item requests to a single repository.
///
/// Cheap to clone; clones share the repository handle.
#[derive(Clone)]
pub struct ItemRouter {
    repository: Arc<dyn ItemRepository>,
    id_strategy: IdStrategy,
    error_status_policy: ErrorStatusPolicy,
}

impl ItemRouter {
    pub fn new(repository: Arc<dyn ItemRepository>) -> Self {
        Self {
            repository,
            id_strategy: IdStrategy::default(),
            error_status_policy: ErrorStatusPolicy::default(),
        }
    }

    pub fn from_config(repository: Arc<dyn ItemRepository>, config: &Config) -> Self {
        Self::new(repository)
            .with_id_strategy(config.id_strategy)
            .with_error_status_policy(config.error_status_policy)
    }

    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    pub fn with_error_status_policy(mut self, error_status_policy: ErrorStatusPolicy) -> Self {
        self.error_status_policy = error_status_policy;
        self
    }

    /// Handles one request. Never fails; errors are turned into responses.
    pub async fn handle(&self, request: RouteRequest) -> RouteResponse {
        let routing_key = request.routing_key();

        match self.dispatch(&request).await {
            Ok(body) => {
                tracing::info!(route = %routing_key, status = 200, "Handled request");
                RouteResponse::new(200, body)
            }
            Err(error) => {
                let status = self.error_status_policy.status_code(&error);
                tracing::warn!(route = %routing_key, status, error = %error, "Request failed");
                RouteResponse::error(status, &error.to_string())
            }
        }
    }

    /// Runs the matched action and returns the encoded success body.
    async fn dispatch(&self, request: &RouteRequest) -> Result<String, RouteError> {
        let route = Route::resolve(request)?;
        tracing::debug!(route = route.as_str(), "Resolved route");

        match route {
            Route::DeleteItem => {
                let id = request.item_id()?;
                self.repository.delete_item(id).await?;
                tracing::debug!(item_id = %id, "Deleted item");
                encode(&WriteAck::deleted(id))
            }
            Route::GetItem => {
                let id = request.item_id()?;
                let item = self.repository.get_item(id).await?;
                tracing::debug!(item_id = %id, found = item.is_some(), "Fetched item");
                encode(&GetItemOutput::from(item))
            }
            Route::ListItems => {
                let items = self.repository.scan_items().await?;
                tracing::debug!(count = items.len(), "Scanned items");
                encode(&ScanOutput::from(items))
            }
            Route::PutItem => {
                let body = request.body.as_deref().ok_or(RouteError::MissingBody)?;
                let item = Item::from_body(body, self.id_strategy)?;
                self.repository.put_item(&item).await?;
                tracing::debug!(item_id = %item.id, "Put item");
                encode(&WriteAck::put(&item.id))
            }
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, RouteError> {
    serde_json::to_string(value)
        .map_err(|e| RouteError::Repository(RepositoryError::Serialization(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use itemrouter_core::request::{APPLICATION_JSON, CONTENT_TYPE, ITEM_TEMPLATE};
    use itemrouter_core::storage::Result as RepositoryResult;
    use serde_json::{json, Value};

    use crate::storage::InMemoryRepository;

    /// Repository whose every call fails the same way.
    struct FailingRepository(RepositoryError);

    #[async_trait]
    impl ItemRepository for FailingRepository {
        async fn get_item(&self, _id: &str) -> RepositoryResult<Option<Item>> {
            Err(self.0.clone())
        }

        async fn put_item(&self, _item: &Item) -> RepositoryResult<()> {
            Err(self.0.clone())
        }

        async fn delete_item(&self, _id: &str) -> RepositoryResult<()> {
            Err(self.0.clone())
        }

        async fn scan_items(&self) -> RepositoryResult<Vec<Item>> {
            Err(self.0.clone())
        }
    }

    fn router_with(repo: &InMemoryRepository) -> ItemRouter {
        ItemRouter::new(Arc::new(repo.clone()))
    }

    fn failing_router(error: RepositoryError) -> ItemRouter {
        ItemRouter::new(Arc::new(FailingRepository(error)))
    }

    fn post(body: &str) -> RouteRequest {
        RouteRequest::new("POST", "/items").with_body(body)
    }

    fn get(id: &str) -> RouteRequest {
        RouteRequest::new("GET", ITEM_TEMPLATE).with_path_parameter("id", id)
    }

    fn delete(id: &str) -> RouteRequest {
        RouteRequest::new("DELETE", ITEM_TEMPLATE).with_path_parameter("id", id)
    }

    fn body_json(response: &RouteResponse) -> Value {
        serde_json::from_str(&response.body).unwrap()
    }

    #[tokio::test]
    async fn test_post_item_with_id() {
        let repo = InMemoryRepository::new();
        let router = router_with(&repo);

        let response = router.handle(post(r#"{"id":"42","name":"widget"}"#)).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"success":true,"message":"Put item 42"}"#);

        let stored = repo.get_item("42").await.unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&stored).unwrap(),
            json!({"id": "42", "name": "widget"})
        );
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let router = router_with(&InMemoryRepository::new());
        let written = json!({"id": "42", "name": "widget", "price": 9.5, "tags": ["a"]});

        let put = router
            .handle(RouteRequest::new("PUT", "/items").with_body(written.to_string()))
            .await;
        assert_eq!(put.status_code, 200);

        let response = router.handle(get("42")).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(body_json(&response), json!({ "Item": written }));
    }

    #[tokio::test]
    async fn test_put_replaces_existing_item() {
        let router = router_with(&InMemoryRepository::new());

        router.handle(post(r#"{"id":"42","name":"widget"}"#)).await;
        router.handle(post(r#"{"id":"42","color":"red"}"#)).await;

        let response = router.handle(get("42")).await;
        assert_eq!(body_json(&response), json!({"Item": {"id": "42", "color": "red"}}));
    }

    #[tokio::test]
    async fn test_post_without_id_uses_timestamp_by_default() {
        let repo = InMemoryRepository::new();
        let router = router_with(&repo);

        let response = router.handle(post(r#"{"name":"widget"}"#)).await;

        assert_eq!(response.status_code, 200);
        let message = body_json(&response)["message"].as_str().unwrap().to_string();
        let id = message.strip_prefix("Put item ").unwrap();
        assert!(id.parse::<i64>().is_ok());
        assert_eq!(
            serde_json::to_value(repo.get_item(id).await.unwrap().unwrap()).unwrap(),
            json!({"id": id, "name": "widget"})
        );
    }

    #[tokio::test]
    async fn test_post_without_id_uses_uuid_strategy() {
        let repo = InMemoryRepository::new();
        let router = router_with(&repo).with_id_strategy(IdStrategy::Uuid);

        let response = router.handle(post(r#"{"name":"widget"}"#)).await;

        let message = body_json(&response)["message"].as_str().unwrap().to_string();
        let id = message.strip_prefix("Put item ").unwrap();
        assert_eq!(id.len(), 36);
        assert_eq!(repo.scan_items().await.unwrap()[0].id, id);
    }

    #[tokio::test]
    async fn test_delete_twice_succeeds() {
        let repo = InMemoryRepository::with_items([Item::new("42")]);
        let router = router_with(&repo);

        let first = router.handle(delete("42")).await;
        let second = router.handle(delete("42")).await;

        for response in [&first, &second] {
            assert_eq!(response.status_code, 200);
            assert_eq!(
                body_json(response),
                json!({"success": true, "message": "Deleted item 42"})
            );
        }
        assert!(repo.get_item("42").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_missing_item_is_empty_object() {
        let router = router_with(&InMemoryRepository::new());

        let response = router.handle(get("missing")).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "{}");
    }

    #[tokio::test]
    async fn test_list_items() {
        let repo = InMemoryRepository::with_items([Item::new("1"), Item::new("2")]);
        let router = router_with(&repo);

        let response = router.handle(RouteRequest::new("GET", "/items")).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(
            body_json(&response),
            json!({"Items": [{"id": "1"}, {"id": "2"}], "Count": 2, "ScannedCount": 2})
        );
    }

    #[tokio::test]
    async fn test_unsupported_route() {
        let router = router_with(&InMemoryRepository::new());

        let response = router.handle(RouteRequest::new("PATCH", "/items/{id}")).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, r#""Unsupported route: \"PATCH /items/{id}\"""#);
        assert_eq!(
            body_json(&response),
            json!("Unsupported route: \"PATCH /items/{id}\"")
        );
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let repo = InMemoryRepository::new();
        let router = router_with(&repo);

        let response = router.handle(post("{bad json")).await;

        assert_eq!(response.status_code, 400);
        let message = body_json(&response);
        assert!(message.as_str().unwrap().contains("line 1"));
        assert!(repo.scan_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_body() {
        let router = router_with(&InMemoryRepository::new());

        let response = router.handle(RouteRequest::new("POST", "/items")).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(body_json(&response), json!("Missing request body"));
    }

    #[tokio::test]
    async fn test_non_object_body() {
        let router = router_with(&InMemoryRepository::new());

        let response = router.handle(post(r#""just a string""#)).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(body_json(&response), json!("Item body must be a JSON object"));
    }

    #[tokio::test]
    async fn test_missing_path_parameter() {
        let router = router_with(&InMemoryRepository::new());

        let response = router.handle(RouteRequest::new("GET", ITEM_TEMPLATE)).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(body_json(&response), json!("Missing path parameter: id"));
    }

    #[tokio::test]
    async fn test_backend_failure_is_400_by_default() {
        for error in [
            RepositoryError::ConnectionFailed("unreachable".to_string()),
            RepositoryError::QueryFailed("Table not found".to_string()),
            RepositoryError::InvalidData("Missing or invalid field: id".to_string()),
        ] {
            let message = error.to_string();
            let router = failing_router(error);

            let response = router.handle(get("42")).await;

            assert_eq!(response.status_code, 400);
            assert_eq!(body_json(&response), json!(message));
        }
    }

    #[tokio::test]
    async fn test_default_config_backend_failure_is_400() {
        let router = ItemRouter::from_config(
            Arc::new(FailingRepository(RepositoryError::ConnectionFailed(
                "unreachable".to_string(),
            ))),
            &Config::from_lookup(|_| None),
        );

        let response = router.handle(RouteRequest::new("GET", "/items")).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(body_json(&response), json!("Connection failed: unreachable"));
    }

    #[tokio::test]
    async fn test_backend_failure_is_classified() {
        let router =
            failing_router(RepositoryError::ConnectionFailed("dispatch failure".to_string()))
                .with_error_status_policy(ErrorStatusPolicy::Classified);

        let response = router.handle(get("42")).await;

        assert_eq!(response.status_code, 503);
        assert_eq!(body_json(&response), json!("Connection failed: dispatch failure"));
    }

    #[tokio::test]
    async fn test_backend_query_failure_is_bad_gateway() {
        let router = failing_router(RepositoryError::QueryFailed("Table not found".to_string()))
            .with_error_status_policy(ErrorStatusPolicy::Classified);

        let response = router.handle(RouteRequest::new("GET", "/items")).await;

        assert_eq!(response.status_code, 502);
        assert_eq!(body_json(&response), json!("Query failed: Table not found"));
    }

    #[tokio::test]
    async fn test_legacy_policy_maps_backend_failure_to_400() {
        let router =
            failing_router(RepositoryError::ConnectionFailed("dispatch failure".to_string()))
                .with_error_status_policy(ErrorStatusPolicy::Legacy);

        let response = router.handle(delete("42")).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(body_json(&response), json!("Connection failed: dispatch failure"));
    }

    #[tokio::test]
    async fn test_unsupported_route_skips_backend() {
        let router = failing_router(RepositoryError::ConnectionFailed("down".to_string()));

        let response = router.handle(RouteRequest::new("DELETE", "/items")).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(body_json(&response), json!("Unsupported route: \"DELETE /items\""));
    }

    #[tokio::test]
    async fn test_every_response_is_json() {
        let router = router_with(&InMemoryRepository::new());
        let requests = vec![
            post(r#"{"id":"1"}"#),
            post("{bad json"),
            get("1"),
            get("2"),
            delete("1"),
            RouteRequest::new("GET", "/items"),
            RouteRequest::new("OPTIONS", "/"),
        ];

        for request in requests {
            let response = router.handle(request).await;

            assert_eq!(
                response.headers.get(CONTENT_TYPE).map(String::as_str),
                Some(APPLICATION_JSON)
            );
            assert!(serde_json::from_str::<Value>(&response.body).is_ok());
        }
    }

    #[tokio::test]
    async fn test_from_config_applies_policies() {
        let config = Config::from_lookup(|key| match key {
            "ID_STRATEGY" => Some("uuid".to_string()),
            "ERROR_STATUS_POLICY" => Some("classified".to_string()),
            _ => None,
        });
        let router = ItemRouter::from_config(
            Arc::new(FailingRepository(RepositoryError::QueryFailed("x".to_string()))),
            &config,
        );

        assert_eq!(router.id_strategy, IdStrategy::Uuid);
        assert_eq!(router.error_status_policy, ErrorStatusPolicy::Classified);
    }
}
