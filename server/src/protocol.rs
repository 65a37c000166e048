//! Line protocol
//!
//! One JSON object per line in, one per line out. The body is the
//! `RetrieveRequest`/`RetrieveResponse` pair; each response also carries the
//! status class and echoes the request `id` when one was sent.
//! `{"ping": true}` is a liveness check and never touches the retriever.

use ragctx_retrieval::{RetrieveRequest, RetrieveResponse, Retriever};
use serde::Serialize;
use serde_json::Value;

/// Liveness reply
pub const HEALTH_MESSAGE: &str = "ragctx retrieval is running";

/// Payload of a response line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireBody {
    Retrieve(RetrieveResponse),
    Health { message: String },
}

/// A response line
#[derive(Debug, Clone, Serialize)]
pub struct WireResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub status: u16,
    #[serde(flatten)]
    pub body: WireBody,
}

impl WireResponse {
    pub fn failure(id: Option<Value>, status: u16, error: impl Into<String>) -> Self {
        Self {
            id,
            status,
            body: WireBody::Retrieve(RetrieveResponse::Failure {
                error: error.into(),
            }),
        }
    }

    fn health(id: Option<Value>) -> Self {
        Self {
            id,
            status: 200,
            body: WireBody::Health {
                message: HEALTH_MESSAGE.to_string(),
            },
        }
    }
}

/// Answer one request line
pub fn handle_line(retriever: &Retriever, line: &str) -> WireResponse {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Unparseable request line: {}", e);
            return WireResponse::failure(None, 400, format!("invalid JSON request: {}", e));
        }
    };

    let id = value.get("id").cloned();
    if !value.is_object() {
        return WireResponse::failure(id, 400, "request must be a JSON object");
    }
    if value.get("ping").and_then(Value::as_bool) == Some(true) {
        return WireResponse::health(id);
    }

    let request: RetrieveRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => return WireResponse::failure(id, 400, format!("invalid request: {}", e)),
    };

    let outcome = retriever.handle(&request);
    WireResponse {
        id,
        status: outcome.status,
        body: WireBody::Retrieve(outcome.body),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ragctx_retrieval::{
        HashingBackend, IndexSnapshot, Metric, Passage, PassageIndex, SearchConfig,
        ServiceContext, TextEncoder,
    };
    use serde_json::json;
    use std::sync::Arc;

    pub(crate) fn test_retriever() -> Retriever {
        let encoder = TextEncoder::new(Arc::new(HashingBackend::new(64, 512).unwrap()));
        let passages = vec![
            Passage::new("ETF是指數股票型基金"),
            Passage::new("債券基金投資公債"),
            Passage::new("ETF可以盤中交易"),
            Passage::new("房貸利率分為固定與機動利率"),
        ];
        let snapshot = IndexSnapshot::embed(&encoder, Metric::Cosine, passages).unwrap();
        let index = PassageIndex::from_snapshot(snapshot, &SearchConfig::default()).unwrap();
        Retriever::new(Arc::new(ServiceContext::new(encoder, index, 2).unwrap()))
    }

    #[test]
    fn test_success_line() {
        let retriever = test_retriever();
        let response = handle_line(&retriever, r#"{"id": 7, "question": "ETF是什麼？"}"#);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["id"], json!(7));
        assert_eq!(value["status"], json!(200));
        assert_eq!(value["question"], json!("ETF是什麼？"));
        assert_eq!(value["context"].as_array().unwrap().len(), 2);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_missing_question_line() {
        let retriever = test_retriever();
        let response = handle_line(&retriever, r#"{"k": 3}"#);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": 400, "error": "missing question field"})
        );
    }

    #[test]
    fn test_invalid_lines() {
        let retriever = test_retriever();

        let response = handle_line(&retriever, "not json");
        assert_eq!(response.status, 400);
        assert!(response.id.is_none());

        let response = handle_line(&retriever, "[1, 2]");
        assert_eq!(response.status, 400);

        let response = handle_line(&retriever, r#"{"id": "a", "question": "q", "k": 1.5}"#);
        assert_eq!(response.status, 400);
        assert_eq!(response.id, Some(json!("a")));
    }

    #[test]
    fn test_explicit_k() {
        let retriever = test_retriever();
        let response = handle_line(&retriever, r#"{"question": "ETF", "k": 10}"#);
        match response.body {
            WireBody::Retrieve(RetrieveResponse::Success { context, .. }) => {
                assert_eq!(context.len(), 4)
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_ping_line() {
        let retriever = test_retriever();
        let response = handle_line(&retriever, r#"{"id": "hc", "ping": true}"#);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"id": "hc", "status": 200, "message": HEALTH_MESSAGE})
        );

        // A question alongside `ping: false` is an ordinary request
        let response = handle_line(&retriever, r#"{"ping": false, "question": "ETF"}"#);
        assert!(matches!(
            response.body,
            WireBody::Retrieve(RetrieveResponse::Success { .. })
        ));
    }
}
