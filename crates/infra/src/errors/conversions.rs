//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use strato_domain::StratoError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub StratoError);

impl From<InfraError> for StratoError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<StratoError> for InfraError {
    fn from(value: StratoError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoStratoError {
    fn into_strato(self) -> StratoError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → StratoError */
/* -------------------------------------------------------------------------- */

impl IntoStratoError for HttpError {
    fn into_strato(self) -> StratoError {
        if self.is_timeout() {
            return StratoError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return StratoError::Network("HTTP connection failure".into());
        }

        if self.is_body() || self.is_decode() {
            return StratoError::Network("HTTP response body could not be read".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => StratoError::Auth(message),
                404 => StratoError::NotFound(message),
                429 => StratoError::Network(message),
                400..=499 => StratoError::InvalidInput(message),
                500..=599 => StratoError::Network(message),
                _ => StratoError::Network(message),
            };
        }

        StratoError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_strato())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn http_status_401_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: StratoError = InfraError::from(error).into();
        match mapped {
            StratoError::Auth(msg) => assert!(msg.contains("401")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn http_status_404_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::NOT_FOUND))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: StratoError = InfraError::from(error).into();
        match mapped {
            StratoError::NotFound(msg) => assert!(msg.contains("404")),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn connection_failure_maps_to_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so the request fails with ECONNREFUSED

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{}", addr)).send().await.unwrap_err();

        let mapped: StratoError = InfraError::from(error).into();
        match mapped {
            StratoError::Network(msg) => assert!(msg.to_lowercase().contains("http")),
            other => panic!("expected network error, got {:?}", other),
        }
    }
}
