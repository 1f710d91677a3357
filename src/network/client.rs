//! HTTP client wrapper - talks to the MemoryMate backend and classifies responses

use std::future::Future;
use std::time::Instant;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::constants::{
    APPROVE_PATH, DEFAULT_PEOPLE_PATH, DENY_PATH, GET_FRAMES_PATH, GET_IMAGE_PATH, LOGIN_PATH,
    REQUEST_TIMEOUT, STREAM_PATH,
};
use crate::error::ClientError;
use crate::models::{
    ApprovalForm, ApproveBody, Credential, DenyBody, ErrorBody, FetchOutcome, FramesResponse,
    ImageResponse, LoginResponse, Person, RawPerson, StreamResponse,
};
use crate::poller::{ApprovalResolver, ArtifactSource, PollTarget};

const LOGIN_FAILED: &str = "Login failed. Please try again.";

/// Backend client. Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    people_path: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        ApiClient {
            http: create_client(),
            base_url: config.base_url.clone(),
            people_path: config.people_path.clone(),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        ApiClient {
            http: create_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            people_path: DEFAULT_PEOPLE_PATH.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// GET a JSON body. `Ok(None)` means 204 No Content.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ClientError> {
        let url = self.url(path);
        let start = Instant::now();
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        tracing::debug!(%url, status = status.as_u16(), time_ms = start.elapsed().as_millis() as u64, "GET");

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(resp).await);
        }
        let body = resp.text().await?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ClientError::Malformed(e.to_string()))
    }

    /// POST a JSON body and return the raw successful response
    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ClientError> {
        let url = self.url(path);
        let start = Instant::now();
        let resp = self.http.post(&url).json(body).send().await?;
        let status = resp.status();
        tracing::debug!(%url, status = status.as_u16(), time_ms = start.elapsed().as_millis() as u64, "POST");

        if !status.is_success() {
            return Err(status_error(resp).await);
        }
        Ok(resp)
    }

    /// Pending approval image
    pub async fn get_image(&self) -> FetchOutcome {
        match self.get_json::<ImageResponse>(GET_IMAGE_PATH).await {
            Ok(Some(ImageResponse {
                image_url: Some(url),
            })) if !url.is_empty() => FetchOutcome::Success(url),
            Ok(_) => FetchOutcome::Empty,
            Err(e) => FetchOutcome::Failure(e.to_string()),
        }
    }

    /// Newest captured frame
    pub async fn get_frames(&self) -> FetchOutcome {
        match self.get_json::<FramesResponse>(GET_FRAMES_PATH).await {
            Ok(Some(resp)) => match resp.frames.into_iter().last() {
                Some(frame) if !frame.is_empty() => FetchOutcome::Success(frame),
                _ => FetchOutcome::Empty,
            },
            Ok(None) => FetchOutcome::Empty,
            Err(e) => FetchOutcome::Failure(e.to_string()),
        }
    }

    /// Latest processed frame, with a timestamp so image caches refetch it
    pub async fn get_stream(&self) -> FetchOutcome {
        match self.get_json::<StreamResponse>(STREAM_PATH).await {
            Ok(Some(StreamResponse {
                image_path: Some(path),
            })) if !path.is_empty() => {
                let locator = if path.starts_with("http://") || path.starts_with("https://") {
                    path
                } else {
                    self.url(&path)
                };
                FetchOutcome::Success(cache_bust(&locator, chrono::Utc::now().timestamp_millis()))
            }
            Ok(_) => FetchOutcome::Empty,
            Err(e) => FetchOutcome::Failure(e.to_string()),
        }
    }

    pub async fn login(&self, credential: &Credential) -> Result<LoginResponse, ClientError> {
        tracing::info!(email = %credential.email, "Logging in");
        let resp = match self.post_json(LOGIN_PATH, credential).await {
            Ok(resp) => resp,
            Err(ClientError::Status { status, message }) if message.is_empty() => {
                return Err(ClientError::Status {
                    status,
                    message: LOGIN_FAILED.to_string(),
                });
            }
            Err(e) => return Err(e),
        };
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Malformed(e.to_string()))
    }

    /// Known people, normalized for display
    pub async fn fetch_people(&self) -> Result<Vec<Person>, ClientError> {
        let value = self
            .get_json::<serde_json::Value>(&self.people_path)
            .await?
            .unwrap_or(serde_json::Value::Array(Vec::new()));

        let serde_json::Value::Array(items) = value else {
            return Err(ClientError::Malformed("Invalid data format".to_string()));
        };

        let people = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let raw: RawPerson = serde_json::from_value(item).unwrap_or_default();
                Person::from_raw(raw, index)
            })
            .collect();
        Ok(people)
    }

    pub async fn approve(&self, form: &ApprovalForm, image_url: &str) -> Result<(), ClientError> {
        let body = ApproveBody {
            name: form.name.trim(),
            description: form.description.trim(),
            relation: form
                .relation
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty()),
            image_url,
        };
        self.post_json(APPROVE_PATH, &body).await?;
        Ok(())
    }

    pub async fn deny(&self) -> Result<(), ClientError> {
        self.post_json(DENY_PATH, &DenyBody::default()).await?;
        Ok(())
    }
}

impl ArtifactSource for ApiClient {
    fn fetch(&self, target: PollTarget) -> impl Future<Output = FetchOutcome> + Send {
        async move {
            match target {
                PollTarget::Image => self.get_image().await,
                PollTarget::Frames => self.get_frames().await,
                PollTarget::Stream => self.get_stream().await,
            }
        }
    }
}

impl ApprovalResolver for ApiClient {
    fn approve(
        &self,
        form: &ApprovalForm,
        image_url: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send {
        ApiClient::approve(self, form, image_url)
    }

    fn deny(&self) -> impl Future<Output = Result<(), ClientError>> + Send {
        ApiClient::deny(self)
    }
}

/// Turn a non-2xx response into an error, keeping the server's `message`
async fn status_error(resp: reqwest::Response) -> ClientError {
    let status = resp.status().as_u16();
    let message = resp
        .text()
        .await
        .ok()
        .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
        .and_then(|b| b.message)
        .unwrap_or_default();
    ClientError::Status { status, message }
}

pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Append a `t=<millis>` query parameter
pub fn cache_bust(locator: &str, millis: i64) -> String {
    let sep = if locator.contains('?') { '&' } else { '?' };
    format!("{}{}t={}", locator, sep, millis)
}

/// Create an HTTP client with default configuration
pub fn create_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// A recorded request: request line and body
    #[derive(Clone, Debug)]
    pub struct Recorded {
        pub line: String,
        pub body: String,
    }

    /// Serve the given `(status, body)` responses in order, one per connection.
    /// Returns the base URL and the requests seen so far.
    pub async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<Mutex<Vec<Recorded>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let recorded = read_request(&mut stream).await;
                log.lock().unwrap().push(recorded);

                let response = if status == 204 {
                    "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n".to_string()
                } else {
                    format!(
                        "HTTP/1.1 {} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    )
                };
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{}", addr), seen)
    }

    async fn read_request(stream: &mut TcpStream) -> Recorded {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break buf.len();
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|l| {
                let (k, v) = l.split_once(':')?;
                k.eq_ignore_ascii_case("content-length")
                    .then(|| v.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);

        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        Recorded {
            line: head.lines().next().unwrap_or_default().to_string(),
            body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
        }
    }
}
