//! Shared helpers for wiremock-backed settlement tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use wiremock::{Request, Respond, ResponseTemplate};

static TRACING: Once = Once::new();

/// Route engine tracing to the test output when `RUST_LOG` asks for it.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Responder that replays a fixed response sequence, sticking on the last
/// entry once the script runs out.
pub struct StatusScript {
    responses: Vec<ResponseTemplate>,
    hits: Arc<AtomicUsize>,
}

impl StatusScript {
    pub fn new(responses: Vec<ResponseTemplate>) -> Self {
        assert!(!responses.is_empty(), "a status script needs at least one response");
        Self { responses, hits: Arc::new(AtomicUsize::new(0)) }
    }

    /// Shared counter of how many requests this script has answered.
    pub fn hits(&self) -> Arc<AtomicUsize> {
        self.hits.clone()
    }
}

impl Respond for StatusScript {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let index = self.hits.fetch_add(1, Ordering::SeqCst).min(self.responses.len() - 1);
        self.responses[index].clone()
    }
}

/// A grouped error-envelope body as the control plane emits it.
pub fn envelope_body(kind: &str, details: &str) -> String {
    format!(
        r#"{{"Errors":[{{"Type":"{kind}","Details":"{details}"}}],"ResponseContext":{{"RequestId":"req-test"}}}}"#
    )
}
