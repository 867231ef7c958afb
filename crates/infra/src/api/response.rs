//! Uniform access to heterogeneous control-plane responses
//!
//! Every generated resource endpoint returns its own payload shape, but the
//! settlement loops only ever need three things: the status code, the raw
//! body, and (for reads) the decoded payload's lifecycle state. [`RawResponse`]
//! carries the first two in buffered form so an attempt's outcome can be
//! inspected after the transport response is gone; the [`LifecycleState`]
//! capability trait covers the third without the engine knowing any concrete
//! schema.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::errors::InfraError;
use strato_domain::StratoError;

use super::errors::OperationError;

/// One attempt's buffered response: status plus raw body.
///
/// Produced by the caller's remote-call closure, consumed by the classifier
/// and poll loops, and handed back to the caller once an operation settles.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl RawResponse {
    /// Build a response from an already-buffered body.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    /// Buffer a transport response.
    ///
    /// # Errors
    ///
    /// Returns a domain error if the body cannot be read off the wire.
    pub async fn from_reqwest(response: reqwest::Response) -> Result<Self, StratoError> {
        let status = response.status();
        let body = response.bytes().await.map_err(|err| StratoError::from(InfraError::from(err)))?;
        Ok(Self { status, body: body.to_vec() })
    }

    /// Status code of this attempt.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Raw body bytes of this attempt.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decode the success-path payload.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Shape`] when the body does not decode as
    /// `T`; a structurally wrong response can never be productively retried.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, OperationError> {
        serde_json::from_slice(&self.body)
            .map_err(|err| OperationError::Shape(format!("payload did not decode: {err}")))
    }
}

/// Capability trait for payloads that expose a lifecycle state.
///
/// Resource kinds differ in where they keep the state: some carry a flat
/// `state` field, others nest it under `status.state`. Each payload type
/// encodes its own shape in this one accessor, so the poll loop stays
/// agnostic. `None` means the field is absent, which the loop treats as a
/// fatal shape mismatch.
pub trait LifecycleState {
    /// The observed lifecycle state, when the payload carries one.
    fn lifecycle_state(&self) -> Option<&str>;
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Volume {
        id: String,
        state: Option<String>,
    }

    impl LifecycleState for Volume {
        fn lifecycle_state(&self) -> Option<&str> {
            self.state.as_deref()
        }
    }

    #[derive(Debug, Deserialize)]
    struct Cluster {
        id: String,
        status: Option<ClusterStatus>,
    }

    #[derive(Debug, Deserialize)]
    struct ClusterStatus {
        state: Option<String>,
    }

    impl LifecycleState for Cluster {
        fn lifecycle_state(&self) -> Option<&str> {
            self.status.as_ref().and_then(|status| status.state.as_deref())
        }
    }

    #[test]
    fn decodes_success_payload() {
        let response = RawResponse::new(
            StatusCode::OK,
            br#"{"id": "vol-1", "state": "AVAILABLE"}"#.to_vec(),
        );

        let volume: Volume = response.json().unwrap();
        assert_eq!(volume.id, "vol-1");
        assert_eq!(volume.lifecycle_state(), Some("AVAILABLE"));
    }

    #[test]
    fn decode_failure_is_a_shape_error() {
        let response = RawResponse::new(StatusCode::OK, b"not json".to_vec());

        let result: Result<Volume, _> = response.json();
        assert!(matches!(result, Err(OperationError::Shape(_))));
    }

    #[test]
    fn nested_status_state_is_reachable_through_the_trait() {
        let response = RawResponse::new(
            StatusCode::OK,
            br#"{"id": "clu-1", "status": {"state": "DEPLOYING"}}"#.to_vec(),
        );

        let cluster: Cluster = response.json().unwrap();
        assert_eq!(cluster.id, "clu-1");
        assert_eq!(cluster.lifecycle_state(), Some("DEPLOYING"));
    }

    #[test]
    fn absent_state_field_reads_as_none() {
        let response = RawResponse::new(StatusCode::OK, br#"{"id": "clu-2"}"#.to_vec());

        let cluster: Cluster = response.json().unwrap();
        assert_eq!(cluster.lifecycle_state(), None);
    }

    #[tokio::test]
    async fn buffers_a_transport_response() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(202).set_body_string("pending"))
            .mount(&server)
            .await;

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let transport = client.get(server.uri()).send().await.unwrap();
        let response = RawResponse::from_reqwest(transport).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.body(), b"pending");
    }
}
