use std::sync::Arc;

use etsy_core::error::codes;
use etsy_core::{Credentials, DispatchError};
use serde_json::{Map, Value};

use crate::envelope::{FailureInfo, Outcome, ResultEnvelope};
use crate::registry::OperationRegistry;
use crate::transport::{Transport, TransportError};

pub const AUTHORIZATION_REQUIRED_MESSAGE: &str = "This operation requires OAuth authentication. \
Set ETSY_ACCESS_TOKEN (or pass --access-token) to an OAuth 2.0 access token with the needed scopes.";

/// Routes a named operation to exactly one API call. Holds no mutable state,
/// so one instance serves any number of concurrent calls.
pub struct Dispatcher {
    credentials: Credentials,
    transport: Arc<dyn Transport>,
    registry: OperationRegistry,
}

impl Dispatcher {
    pub fn new(
        credentials: Credentials,
        transport: Arc<dyn Transport>,
        registry: OperationRegistry,
    ) -> Self {
        Self {
            credentials,
            transport,
            registry,
        }
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Unknown names, malformed arguments and unissuable requests come back as
    /// `Err`. Everything the marketplace (or the network) says, and a missing
    /// token for a write, comes back as an envelope.
    pub async fn dispatch(
        &self,
        name: &str,
        args: &Map<String, Value>,
    ) -> Result<ResultEnvelope, DispatchError> {
        let op = self
            .registry
            .get(name)
            .ok_or_else(|| DispatchError::UnknownOperation(name.to_string()))?;

        if op.requires_auth() && !self.credentials.has_access_token() {
            tracing::warn!(
                tool = name,
                code = codes::AUTHORIZATION_REQUIRED,
                "write operation without access token"
            );
            return Ok(ResultEnvelope::failure(&FailureInfo::message(
                AUTHORIZATION_REQUIRED_MESSAGE,
            )));
        }

        let request = (op.planner)(args, &self.credentials)?;
        tracing::debug!(
            tool = name,
            method = %request.method,
            path = %request.path,
            "dispatching"
        );

        let outcome = match self.transport.execute(&request).await {
            Ok(body) => Outcome::Success(body),
            Err(err) if err.is_recoverable() => {
                tracing::warn!(tool = name, error = %err, "Etsy request failed");
                Outcome::Failure(failure_info(err))
            }
            Err(err) => {
                return Err(DispatchError::Transport {
                    operation: name.to_string(),
                    message: err.to_string(),
                });
            }
        };
        Ok(ResultEnvelope::from_outcome(outcome))
    }
}

fn failure_info(err: TransportError) -> FailureInfo {
    match err {
        TransportError::Status { status, body } if !body.is_null() => {
            FailureInfo::with_status(body, status)
        }
        TransportError::Status { status, .. } => FailureInfo::with_status(
            Value::String(format!("Request failed with status code {status}")),
            status,
        ),
        other => FailureInfo::message(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{RecordingTransport, as_args, sample_args};
    use crate::tools;

    fn credentials(token: Option<&str>) -> Credentials {
        Credentials::new("app-key", Some("42".to_string()), token.map(str::to_string)).unwrap()
    }

    fn dispatcher(token: Option<&str>, transport: Arc<RecordingTransport>) -> Dispatcher {
        Dispatcher::new(credentials(token), transport, OperationRegistry::etsy())
    }

    fn parsed(envelope: &ResultEnvelope) -> Value {
        serde_json::from_str(envelope.text_body()).unwrap()
    }

    #[tokio::test]
    async fn unknown_operation_is_an_error_without_http() {
        let transport = Arc::new(RecordingTransport::ok(json!({})));
        let dispatcher = dispatcher(Some("tok"), transport.clone());

        for name in ["", "etsy_do_magic", "ETSY_SEARCH_LISTINGS"] {
            let err = dispatcher.dispatch(name, &Map::new()).await.unwrap_err();
            assert!(matches!(err, DispatchError::UnknownOperation(_)));
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn every_write_without_token_is_gated() {
        let transport = Arc::new(RecordingTransport::ok(json!({})));
        let dispatcher = dispatcher(None, transport.clone());

        let writes: Vec<_> = dispatcher
            .registry()
            .iter()
            .filter(|op| op.requires_auth())
            .map(|op| op.name)
            .collect();
        assert_eq!(writes.len(), 9);

        for name in writes {
            let envelope = dispatcher.dispatch(name, &sample_args(name)).await.unwrap();
            let body = parsed(&envelope);
            let message = body["error"].as_str().unwrap();
            assert!(message.contains("OAuth"), "{name}");
            assert!(message.contains("ETSY_ACCESS_TOKEN"), "{name}");
            assert!(body.get("status").is_none());
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn auth_gate_runs_before_argument_validation() {
        let transport = Arc::new(RecordingTransport::ok(json!({})));
        let dispatcher = dispatcher(None, transport.clone());

        let envelope = dispatcher
            .dispatch(tools::DELETE_LISTING, &as_args(json!({ "bogus": 1 })))
            .await
            .unwrap();
        assert!(parsed(&envelope)["error"].as_str().unwrap().contains("OAuth"));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn every_read_makes_exactly_one_call_with_or_without_token() {
        for token in [None, Some("tok")] {
            let transport = Arc::new(RecordingTransport::ok(json!({ "ok": true })));
            let dispatcher = dispatcher(token, transport.clone());
            let reads: Vec<_> = dispatcher
                .registry()
                .iter()
                .filter(|op| !op.requires_auth())
                .map(|op| op.name)
                .collect();

            for (i, name) in reads.iter().enumerate() {
                dispatcher.dispatch(name, &sample_args(name)).await.unwrap();
                assert_eq!(transport.call_count(), i + 1, "{name}");
            }
        }
    }

    #[tokio::test]
    async fn writes_with_token_reach_the_transport() {
        let transport = Arc::new(RecordingTransport::ok(json!({ "listing_id": 1 })));
        let dispatcher = dispatcher(Some("tok"), transport.clone());

        let envelope = dispatcher
            .dispatch(tools::CREATE_LISTING, &sample_args(tools::CREATE_LISTING))
            .await
            .unwrap();
        assert_eq!(parsed(&envelope), json!({ "listing_id": 1 }));
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "/shops/42/listings");
    }

    #[tokio::test]
    async fn repeated_reads_are_byte_identical() {
        let transport = Arc::new(RecordingTransport::ok(json!({
            "count": 2,
            "results": [{ "listing_id": 1 }, { "listing_id": 2 }]
        })));
        let dispatcher = dispatcher(None, transport.clone());
        let args = as_args(json!({ "keywords": "candles" }));

        let first = dispatcher.dispatch(tools::SEARCH_LISTINGS, &args).await.unwrap();
        let second = dispatcher.dispatch(tools::SEARCH_LISTINGS, &args).await.unwrap();
        assert_eq!(first.text_body(), second.text_body());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn search_without_paging_sends_defaults() {
        let transport = Arc::new(RecordingTransport::ok(json!({ "count": 0, "results": [] })));
        let dispatcher = dispatcher(None, transport.clone());

        dispatcher
            .dispatch(tools::SEARCH_LISTINGS, &as_args(json!({ "keywords": "mug" })))
            .await
            .unwrap();
        let query = &transport.calls()[0].query;
        assert!(query.contains(&("limit".to_string(), "25".to_string())));
        assert!(query.contains(&("offset".to_string(), "0".to_string())));
    }

    #[tokio::test]
    async fn null_paging_and_state_behave_like_omitted() {
        let transport = Arc::new(RecordingTransport::ok(json!({ "count": 0, "results": [] })));
        let dispatcher = dispatcher(None, transport.clone());

        dispatcher
            .dispatch(
                tools::SEARCH_LISTINGS,
                &as_args(json!({ "keywords": "mug", "limit": null, "offset": null })),
            )
            .await
            .unwrap();
        dispatcher
            .dispatch(
                tools::GET_SHOP_LISTINGS,
                &as_args(json!({ "state": null, "limit": null })),
            )
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(
            calls[0].query,
            vec![
                ("keywords".to_string(), "mug".to_string()),
                ("limit".to_string(), "25".to_string()),
                ("offset".to_string(), "0".to_string()),
            ]
        );
        assert_eq!(calls[1].path, "/shops/42/listings");
        assert!(calls[1]
            .query
            .contains(&("state".to_string(), "active".to_string())));
        assert!(calls[1]
            .query
            .contains(&("limit".to_string(), "25".to_string())));
    }

    #[tokio::test]
    async fn update_with_only_price_sends_only_price() {
        let transport = Arc::new(RecordingTransport::ok(json!({ "listing_id": 5 })));
        let dispatcher = dispatcher(Some("tok"), transport.clone());

        dispatcher
            .dispatch(
                tools::UPDATE_LISTING,
                &as_args(json!({ "listing_id": 5, "price": 12.5 })),
            )
            .await
            .unwrap();
        assert_eq!(transport.calls()[0].body, Some(json!({ "price": 12.5 })));
    }

    #[tokio::test]
    async fn successful_search_envelope_round_trips() {
        let stub = json!({ "count": 1, "results": [{ "listing_id": 1 }] });
        let transport = Arc::new(RecordingTransport::ok(stub.clone()));
        let dispatcher = dispatcher(None, transport.clone());

        let envelope = dispatcher
            .dispatch(
                tools::SEARCH_LISTINGS,
                &as_args(json!({
                    "keywords": "handmade jewelry",
                    "limit": 10,
                    "sort_on": "price",
                    "sort_order": "asc"
                })),
            )
            .await
            .unwrap();
        assert_eq!(parsed(&envelope), stub);
        assert_eq!(
            envelope.text_body(),
            serde_json::to_string_pretty(&stub).unwrap()
        );
    }

    #[tokio::test]
    async fn http_404_surfaces_body_and_status() {
        let transport = Arc::new(RecordingTransport::err(TransportError::Status {
            status: 404,
            body: json!({ "error": "Listing with id 999 not found" }),
        }));
        let dispatcher = dispatcher(None, transport.clone());

        let envelope = dispatcher
            .dispatch(tools::GET_LISTING, &as_args(json!({ "listing_id": 999 })))
            .await
            .unwrap();
        assert_eq!(
            parsed(&envelope),
            json!({ "error": { "error": "Listing with id 999 not found" }, "status": 404 })
        );
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_error_body_falls_back_to_message() {
        let transport = Arc::new(RecordingTransport::err(TransportError::Status {
            status: 503,
            body: Value::Null,
        }));
        let dispatcher = dispatcher(None, transport);

        let envelope = dispatcher
            .dispatch(tools::GET_SHOP, &Map::new())
            .await
            .unwrap();
        assert_eq!(
            parsed(&envelope),
            json!({ "error": "Request failed with status code 503", "status": 503 })
        );
    }

    #[tokio::test]
    async fn network_failure_has_no_status() {
        let transport = Arc::new(RecordingTransport::err(TransportError::Network(
            "connection refused".to_string(),
        )));
        let dispatcher = dispatcher(None, transport);

        let envelope = dispatcher
            .dispatch(tools::GET_TRENDING_LISTINGS, &Map::new())
            .await
            .unwrap();
        let body = parsed(&envelope);
        assert!(body["error"].as_str().unwrap().contains("connection refused"));
        assert!(body.get("status").is_none());
    }

    #[tokio::test]
    async fn unrecoverable_transport_errors_are_rethrown() {
        let transport = Arc::new(RecordingTransport::err(TransportError::InvalidRequest(
            "bad url".to_string(),
        )));
        let dispatcher = dispatcher(None, transport);

        let err = dispatcher
            .dispatch(tools::GET_SHOP, &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Transport { .. }));
    }

    #[tokio::test]
    async fn invalid_arguments_skip_the_transport() {
        let transport = Arc::new(RecordingTransport::ok(json!({})));
        let dispatcher = dispatcher(None, transport.clone());

        let err = dispatcher
            .dispatch(tools::GET_LISTING, &as_args(json!({ "listing_id": "abc" })))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidArguments { .. }));
        assert_eq!(transport.call_count(), 0);
    }
}
