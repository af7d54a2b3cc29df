use super::mocks::MockLlmClient;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use science_helper::{server, tutor::Tutor};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

const BOUNDARY: &str = "science-helper-test-boundary";
pub const TEST_UPLOAD_LIMIT: usize = 1024 * 1024;

/// Router wired to a mock model, plus the static dir it serves from.
pub struct TestApp {
    pub router: Router,
    pub tutor: Arc<Tutor>,
    pub llm: MockLlmClient,
    pub static_dir: TempDir,
}

pub fn create_test_app(llm: MockLlmClient) -> TestApp {
    create_test_app_with_limit(llm, TEST_UPLOAD_LIMIT)
}

pub fn create_test_app_with_limit(llm: MockLlmClient, max_upload_bytes: usize) -> TestApp {
    let static_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let tutor = Arc::new(Tutor::with_client(Arc::new(llm.clone())));
    let router = server::router(tutor.clone(), static_dir.path(), max_upload_bytes);

    TestApp {
        router,
        tutor,
        llm,
        static_dir,
    }
}

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Smallest valid PNG header, enough for upload tests.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
