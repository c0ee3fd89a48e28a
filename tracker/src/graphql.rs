use crate::client::TrackerClient;
use crate::errors::TrackerError;
use crate::metrics_defs::TRACKER_REQUEST_DURATION;
use crate::types::{Board, ColumnValues, Record};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shared::histogram;
use std::time::{Duration, Instant};
use url::Url;

const CREATE_ITEM: &str = "mutation ($boardId: ID!, $itemName: String!) {
  create_item(board_id: $boardId, item_name: $itemName) { id name }
}";

const CHANGE_COLUMN_VALUES: &str = "mutation ($boardId: ID!, $itemId: ID!, $columnValues: JSON!) {
  change_multiple_column_values(board_id: $boardId, item_id: $itemId, column_values: $columnValues) { id }
}";

const LIST_COLUMNS: &str = "query ($id: [ID!]!) {
  boards(ids: $id) { id name columns { id title type } }
}";

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
struct GraphqlEnvelope {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
    error_message: Option<String>,
}

impl GraphqlEnvelope {
    fn error_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| e.message.clone())
            .chain(self.error_message.clone())
            .collect()
    }
}

/// A successful GraphQL reply: the decoded `data` plus what is needed for diagnostics.
struct Reply<T> {
    status: u16,
    data: T,
    raw: String,
}

#[derive(Deserialize)]
struct CreateItemData {
    create_item: Option<CreatedItem>,
}

#[derive(Deserialize)]
struct CreatedItem {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct BoardsData {
    #[serde(default)]
    boards: Vec<Board>,
}

/// [`TrackerClient`] speaking the tracking service's GraphQL API.
#[derive(Clone)]
pub struct GraphqlClient {
    client: reqwest::Client,
    api_url: Url,
    api_key: String,
    timeout: Duration,
}

impl GraphqlClient {
    pub fn new(api_url: Url, api_key: String, timeout: Duration) -> Result<Self, TrackerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::Transport(e.to_string()))?;

        Ok(GraphqlClient {
            client,
            api_url,
            api_key,
            timeout,
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &str,
        variables: Value,
    ) -> Result<Reply<T>, TrackerError> {
        let started = Instant::now();
        let result = self.send(query, variables).await;

        let outcome = if result.is_ok() { "success" } else { "failure" };
        histogram!(TRACKER_REQUEST_DURATION, "operation" => operation, "outcome" => outcome)
            .record(started.elapsed().as_secs_f64());
        tracing::debug!(
            operation,
            outcome,
            duration_ms = started.elapsed().as_millis() as u64,
            "Tracker call finished"
        );

        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<Reply<T>, TrackerError> {
        let response = self
            .client
            .post(self.api_url.clone())
            .header(AUTHORIZATION, self.api_key.as_str())
            .json(&GraphqlRequest { query, variables })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let raw = response.text().await.map_err(|e| self.transport_error(e))?;
        let envelope = serde_json::from_str::<GraphqlEnvelope>(&raw);

        if !status.is_success() {
            let errors = envelope
                .map(|e| e.error_messages())
                .unwrap_or_default();
            return Err(TrackerError::Status {
                status: status.as_u16(),
                errors,
                raw,
            });
        }

        let envelope = envelope.map_err(|e| TrackerError::InvalidResponse {
            status: status.as_u16(),
            message: e.to_string(),
            raw: raw.clone(),
        })?;

        let errors = envelope.error_messages();
        if !errors.is_empty() {
            return Err(TrackerError::Application {
                status: status.as_u16(),
                errors,
                raw,
            });
        }

        let data = serde_json::from_value(envelope.data.unwrap_or(Value::Null)).map_err(|e| {
            TrackerError::InvalidResponse {
                status: status.as_u16(),
                message: e.to_string(),
                raw: raw.clone(),
            }
        })?;

        Ok(Reply {
            status: status.as_u16(),
            data,
            raw,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> TrackerError {
        if e.is_timeout() {
            TrackerError::Timeout(self.timeout)
        } else {
            TrackerError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl TrackerClient for GraphqlClient {
    async fn create_record(&self, board_id: &str, name: &str) -> Result<Record, TrackerError> {
        let reply: Reply<Option<CreateItemData>> = self
            .execute(
                "create_item",
                CREATE_ITEM,
                json!({"boardId": board_id, "itemName": name}),
            )
            .await?;

        let item = reply.data.and_then(|d| d.create_item);
        match item {
            Some(CreatedItem {
                id: Some(id),
                name: created_name,
            }) if !id.is_empty() => Ok(Record {
                id,
                name: created_name
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| name.to_string()),
            }),
            _ => Err(TrackerError::MissingRecordId {
                status: reply.status,
                raw: reply.raw,
            }),
        }
    }

    async fn update_fields(
        &self,
        board_id: &str,
        record_id: &str,
        values: &ColumnValues,
    ) -> Result<(), TrackerError> {
        // The service takes column values as a JSON-encoded string.
        let column_values = serde_json::to_string(values)?;
        let _: Reply<Value> = self
            .execute(
                "change_multiple_column_values",
                CHANGE_COLUMN_VALUES,
                json!({
                    "boardId": board_id,
                    "itemId": record_id,
                    "columnValues": column_values,
                }),
            )
            .await?;
        Ok(())
    }

    async fn list_columns(&self, board_id: &str) -> Result<Board, TrackerError> {
        let reply: Reply<Option<BoardsData>> = self
            .execute("boards", LIST_COLUMNS, json!({"id": [board_id]}))
            .await?;

        reply
            .data
            .and_then(|d| d.boards.into_iter().next())
            .ok_or_else(|| TrackerError::BoardNotFound(board_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnValue;
    use http_body_util::{BodyExt, Full};
    use hyper::body::{Bytes, Incoming};
    use hyper::service::service_fn;
    use hyper::{Request, Response, StatusCode};
    use hyper_util::rt::{TokioExecutor, TokioIo};
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Canned = (StatusCode, String);
    type Responder = Arc<dyn Fn(&Value, Option<&str>) -> Canned + Send + Sync>;

    /// Spawns a GraphQL stand-in that answers every request with `responder`.
    /// Returns its URL and the request bodies it received.
    async fn start_test_server(
        responder: Responder,
        delay: Duration,
    ) -> (Url, Arc<Mutex<Vec<Value>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);
                let responder = responder.clone();
                let received = received_clone.clone();

                tokio::spawn(async move {
                    let handler = move |req: Request<Incoming>| {
                        let responder = responder.clone();
                        let received = received.clone();
                        async move {
                            let auth = req
                                .headers()
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .map(String::from);
                            let body = req.into_body().collect().await.unwrap().to_bytes();
                            let body: Value = serde_json::from_slice(&body).unwrap();
                            received.lock().unwrap().push(body.clone());

                            tokio::time::sleep(delay).await;
                            let (status, text) = responder(&body, auth.as_deref());
                            let mut response = Response::new(Full::new(Bytes::from(text)));
                            *response.status_mut() = status;
                            Ok::<_, Infallible>(response)
                        }
                    };
                    let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service_fn(handler))
                        .await;
                });
            }
        });

        let url = Url::parse(&format!("http://127.0.0.1:{port}/v2")).unwrap();
        (url, received)
    }

    fn test_client(url: Url, timeout: Duration) -> GraphqlClient {
        GraphqlClient::new(url, "test-key".to_string(), timeout).unwrap()
    }

    #[tokio::test]
    async fn test_create_record_success() {
        let responder: Responder = Arc::new(|_body, auth| {
            if auth != Some("test-key") {
                return (StatusCode::UNAUTHORIZED, "{}".into());
            }
            (
                StatusCode::OK,
                r#"{"data":{"create_item":{"id":"1001","name":"Jane Doe"}}}"#.into(),
            )
        });
        let (url, received) = start_test_server(responder, Duration::ZERO).await;
        let client = test_client(url, Duration::from_secs(5));

        let record = client.create_record("42", "Jane Doe").await.unwrap();

        assert_eq!(
            record,
            Record {
                id: "1001".into(),
                name: "Jane Doe".into()
            }
        );
        let received = received.lock().unwrap();
        assert_eq!(received[0]["variables"]["boardId"], "42");
        assert_eq!(received[0]["variables"]["itemName"], "Jane Doe");
        assert!(received[0]["query"].as_str().unwrap().contains("create_item"));
    }

    #[tokio::test]
    async fn test_create_record_graphql_errors() {
        let responder: Responder = Arc::new(|_, _| {
            (
                StatusCode::OK,
                r#"{"errors":[{"message":"Board not found"}]}"#.into(),
            )
        });
        let (url, _) = start_test_server(responder, Duration::ZERO).await;
        let client = test_client(url, Duration::from_secs(5));

        let err = client.create_record("42", "Jane").await.unwrap_err();

        match err {
            TrackerError::Application { status, errors, .. } => {
                assert_eq!(status, 200);
                assert_eq!(errors, vec!["Board not found"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_record_non_success_status() {
        let responder: Responder =
            Arc::new(|_, _| (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded".into()));
        let (url, _) = start_test_server(responder, Duration::ZERO).await;
        let client = test_client(url, Duration::from_secs(5));

        let err = client.create_record("42", "Jane").await.unwrap_err();

        assert!(matches!(
            err,
            TrackerError::Status { status: 500, ref raw, .. } if raw == "upstream exploded"
        ));
    }

    #[tokio::test]
    async fn test_create_record_without_id() {
        let responder: Responder = Arc::new(|_, _| {
            (
                StatusCode::OK,
                r#"{"data":{"create_item":null}}"#.into(),
            )
        });
        let (url, _) = start_test_server(responder, Duration::ZERO).await;
        let client = test_client(url, Duration::from_secs(5));

        let err = client.create_record("42", "Jane").await.unwrap_err();

        assert!(matches!(err, TrackerError::MissingRecordId { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_update_fields_sends_json_encoded_values() {
        let responder: Responder = Arc::new(|_, _| {
            (
                StatusCode::OK,
                r#"{"data":{"change_multiple_column_values":{"id":"1001"}}}"#.into(),
            )
        });
        let (url, received) = start_test_server(responder, Duration::ZERO).await;
        let client = test_client(url, Duration::from_secs(5));

        let values = ColumnValues::from([
            ("text_a".to_string(), ColumnValue::Text("Phoenix".into())),
            (
                "color_b".to_string(),
                ColumnValue::Label {
                    label: "Arizona".into(),
                },
            ),
        ]);
        client.update_fields("42", "1001", &values).await.unwrap();

        let received = received.lock().unwrap();
        let encoded = received[0]["variables"]["columnValues"].as_str().unwrap();
        assert_eq!(
            encoded,
            r#"{"text_a":"Phoenix","color_b":{"label":"Arizona"}}"#
        );
        assert_eq!(received[0]["variables"]["itemId"], "1001");
    }

    #[tokio::test]
    async fn test_list_columns() {
        let responder: Responder = Arc::new(|_, _| {
            (
                StatusCode::OK,
                r#"{"data":{"boards":[{"id":"42","name":"Calls","columns":[
                    {"id":"name","title":"Name","type":"name"},
                    {"id":"date4","title":"Received","type":"date"}
                ]}]}}"#
                    .into(),
            )
        });
        let (url, received) = start_test_server(responder, Duration::ZERO).await;
        let client = test_client(url, Duration::from_secs(5));

        let board = client.list_columns("42").await.unwrap();

        assert_eq!(board.name, "Calls");
        assert_eq!(board.columns.len(), 2);
        assert_eq!(board.columns[1].id, "date4");
        assert_eq!(received.lock().unwrap()[0]["variables"]["id"][0], "42");
    }

    #[tokio::test]
    async fn test_list_columns_unknown_board() {
        let responder: Responder =
            Arc::new(|_, _| (StatusCode::OK, r#"{"data":{"boards":[]}}"#.into()));
        let (url, _) = start_test_server(responder, Duration::ZERO).await;
        let client = test_client(url, Duration::from_secs(5));

        let err = client.list_columns("42").await.unwrap_err();

        assert!(matches!(err, TrackerError::BoardNotFound(ref id) if id == "42"));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let responder: Responder = Arc::new(|_, _| (StatusCode::OK, "{}".into()));
        let (url, _) = start_test_server(responder, Duration::from_secs(2)).await;
        let client = test_client(url, Duration::from_millis(200));

        let err = client.create_record("42", "Jane").await.unwrap_err();

        assert!(matches!(err, TrackerError::Timeout(_)));
    }
}
