//! Delegates let a deployment override resolution without changing the
//! built-in heuristic.
//!
//! A delegate receives the same [`ResolutionRequest`] the heuristic would and
//! returns a [`ResolutionResult`]. Two implementations are provided:
//!
//! - [`CommandDelegate`]: runs an executable, writing the request as JSON to its
//!   standard input and reading the result as JSON from its standard output. An
//!   executable named [`DELEGATE_PROGRAM`] on `PATH` is discovered automatically.
//! - [`HttpDelegate`]: posts the request as JSON to a URL and reads the result
//!   from the response body.
//!
//! Every failure is reported as an [`Error`], which the resolver downgrades to
//! the heuristic.

use async_trait::async_trait;
use reqwest::{Client, IntoUrl, StatusCode, Url};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{ResolutionRequest, ResolutionResult};

/// The well-known name of a delegate executable.
pub(crate) const DELEGATE_PROGRAM: &str = "switchboard-resolver";

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("failed to start delegate \"{0}\": {1}")]
    SpawnFailed(String, #[source] std::io::Error),

    #[error("failed to communicate with the delegate: {0}")]
    Io(#[from] std::io::Error),

    #[error("delegate exited with {0}: {1}")]
    ExitFailure(ExitStatus, String),

    #[error("invalid delegate url: {0}")]
    InvalidUrl(#[source] reqwest::Error),

    #[error("a request to the delegate failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("the delegate responded with status {0}")]
    BadStatus(StatusCode),

    #[error("could not encode or decode delegate message: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("the delegate returned a malformed result: {0}")]
    Malformed(&'static str),

    #[error("the delegate did not respond within {0:?}")]
    TimedOut(Duration),
}

/// A strategy capable of resolving a request in place of the heuristic.
#[async_trait]
pub(crate) trait Delegate: Send + Sync {
    /// A short human-readable description used in logs.
    fn describe(&self) -> String;

    async fn resolve(&self, request: &ResolutionRequest) -> Result<ResolutionResult, Error>;
}

/// Checks that a delegate's answer is usable. An empty model is treated as
/// absent.
pub(crate) fn validate(result: ResolutionResult) -> Result<ResolutionResult, Error> {
    if result.provider.name.trim().is_empty() {
        return Err(Error::Malformed("provider name is empty"));
    }

    let model = result.model.filter(|m| !m.trim().is_empty());

    Ok(ResolutionResult::new(result.provider, model))
}

pub(crate) struct CommandDelegate {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandDelegate {
    pub(crate) fn new<P: AsRef<Path>>(program: P, args: Vec<String>) -> CommandDelegate {
        CommandDelegate {
            program: program.as_ref().to_path_buf(),
            args,
        }
    }

    /// Looks for an executable [`DELEGATE_PROGRAM`] on `PATH`.
    pub(crate) fn discover() -> Option<CommandDelegate> {
        CommandDelegate::discover_in(std::env::var_os("PATH"))
    }

    fn discover_in<P: AsRef<OsStr>>(paths: Option<P>) -> Option<CommandDelegate> {
        let cwd = std::env::current_dir().ok()?;

        which::which_in(DELEGATE_PROGRAM, paths, cwd)
            .ok()
            .map(|program| CommandDelegate::new(program, Vec::new()))
    }
}

#[async_trait]
impl Delegate for CommandDelegate {
    fn describe(&self) -> String {
        format!("command {}", self.program.display())
    }

    async fn resolve(&self, request: &ResolutionRequest) -> Result<ResolutionResult, Error> {
        let payload = serde_json::to_vec(request)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::SpawnFailed(self.program.display().to_string(), e))?;

        let stdin = child.stdin.take();

        // The request is written while the output is drained, a delegate may
        // answer before reading all of its input
        let write = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&payload).await?;
                // Closing stdin signals the end of the request
                stdin.shutdown().await?;
            }

            Ok::<(), std::io::Error>(())
        };

        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

            return Err(Error::ExitFailure(output.status, stderr));
        }

        // A delegate which exits successfully without reading its input
        // closes the pipe early, its answer still counts
        if let Err(err) = written {
            if err.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(Error::Io(err));
            }
        }

        let result: ResolutionResult = serde_json::from_slice(&output.stdout)?;

        Ok(result)
    }
}

pub(crate) struct HttpDelegate {
    client: Client,
    endpoint: Url,
}

impl HttpDelegate {
    pub(crate) fn new<U: IntoUrl>(endpoint: U) -> Result<HttpDelegate, Error> {
        let endpoint = endpoint.into_url().map_err(Error::InvalidUrl)?;

        Ok(HttpDelegate {
            client: Client::new(),
            endpoint,
        })
    }
}

#[async_trait]
impl Delegate for HttpDelegate {
    fn describe(&self) -> String {
        format!("endpoint {}", self.endpoint)
    }

    async fn resolve(&self, request: &ResolutionRequest) -> Result<ResolutionResult, Error> {
        let res = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = res.status();

        if !status.is_success() {
            return Err(Error::BadStatus(status));
        }

        let body = res.bytes().await?;

        let result: ResolutionResult = serde_json::from_slice(&body)?;

        Ok(result)
    }
}

/// Bounds the time a delegate may take. The resolver itself imposes no
/// timeout; callers that want one wrap their delegate in this.
pub(crate) struct WithTimeout<D> {
    inner: D,
    timeout: Duration,
}

impl<D: Delegate> WithTimeout<D> {
    pub(crate) fn new(inner: D, timeout: Duration) -> WithTimeout<D> {
        WithTimeout { inner, timeout }
    }
}

#[async_trait]
impl<D: Delegate> Delegate for WithTimeout<D> {
    fn describe(&self) -> String {
        format!("{} (timeout {:?})", self.inner.describe(), self.timeout)
    }

    async fn resolve(&self, request: &ResolutionRequest) -> Result<ResolutionResult, Error> {
        match tokio::time::timeout(self.timeout, self.inner.resolve(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::TimedOut(self.timeout)),
        }
    }
}

#[async_trait]
impl Delegate for Box<dyn Delegate> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    async fn resolve(&self, request: &ResolutionRequest) -> Result<ResolutionResult, Error> {
        (**self).resolve(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderInfo;
    use crate::resolver::{heuristic, AutoResolver};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn request() -> ResolutionRequest {
        ResolutionRequest::new("hello", false, ["Ollama"].into_iter().collect())
    }

    #[test]
    fn test_validate_rejects_empty_provider() {
        let result = ResolutionResult::new(ProviderInfo::new("  "), Some("x".to_string()));

        assert!(matches!(validate(result), Err(Error::Malformed(_))));
    }

    #[test]
    fn test_validate_drops_empty_model() {
        let result = ResolutionResult::new(ProviderInfo::new("OpenAI"), Some(String::new()));

        let result = validate(result).unwrap();

        assert_eq!(result.provider.name, "OpenAI");
        assert_eq!(result.model, None);
    }

    #[test]
    fn test_http_delegate_rejects_invalid_url() {
        assert!(matches!(
            HttpDelegate::new("not a url"),
            Err(Error::InvalidUrl(_))
        ));
    }

    async fn serve_once(status: &'static str, body: &'static str) -> (Url, JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            let body_start = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before the headers ended");
                buf.extend_from_slice(&chunk[..n]);

                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let headers = String::from_utf8_lossy(&buf[..body_start]).to_ascii_lowercase();
            let length: usize = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .map(|value| value.trim().parse().unwrap())
                .unwrap_or(0);

            while buf.len() < body_start + length {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before the body ended");
                buf.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );

            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();

            buf[body_start..].to_vec()
        });

        (Url::parse(&format!("http://{}/resolve", addr)).unwrap(), handle)
    }

    fn local_delegate(endpoint: Url) -> HttpDelegate {
        HttpDelegate {
            client: Client::builder().no_proxy().build().unwrap(),
            endpoint,
        }
    }

    #[tokio::test]
    async fn test_http_delegate_reads_result() {
        let (endpoint, server) =
            serve_once("200 OK", r#"{"provider":{"name":"OpenAI"},"model":"gpt-4o"}"#).await;

        let result = local_delegate(endpoint).resolve(&request()).await.unwrap();

        assert_eq!(result.provider.name, "OpenAI");
        assert_eq!(result.model.as_deref(), Some("gpt-4o"));

        let received: serde_json::Value = serde_json::from_slice(&server.await.unwrap()).unwrap();
        assert_eq!(received["message"], "hello");
        assert_eq!(received["activeProviders"][0]["name"], "Ollama");
    }

    #[tokio::test]
    async fn test_http_delegate_error_status() {
        let (endpoint, server) = serve_once("500 Internal Server Error", "{}").await;

        let result = local_delegate(endpoint).resolve(&request()).await;

        assert!(matches!(
            result,
            Err(Error::BadStatus(status)) if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_http_delegate_garbage_body() {
        let (endpoint, server) = serve_once("200 OK", "not json").await;

        let result = local_delegate(endpoint).resolve(&request()).await;

        assert!(matches!(result, Err(Error::Serialization(_))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_http_delegate_error_status_falls_back() {
        let (endpoint, server) = serve_once("500 Internal Server Error", "{}").await;
        let resolver = AutoResolver::with_delegate(Box::new(local_delegate(endpoint)));

        let request = ResolutionRequest::new(
            "fn main() {}",
            false,
            ["Ollama", "OpenRouter"].into_iter().collect(),
        );

        let result = resolver.resolve(&request).await;

        assert_eq!(
            result,
            heuristic::resolve(
                &request.message,
                request.has_images,
                &request.active_providers
            )
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_spawn() {
        let delegate = CommandDelegate::new("/nonexistent/switchboard-resolver", Vec::new());

        let result = delegate.resolve(&request()).await;

        assert!(matches!(result, Err(Error::SpawnFailed(_, _))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_delegate_reads_result() {
        let script = r#"cat > /dev/null; echo '{"provider":{"name":"Ollama"},"model":"mistral:7b"}'"#;
        let delegate = CommandDelegate::new("sh", vec!["-c".to_string(), script.to_string()]);

        let result = delegate.resolve(&request()).await.unwrap();

        assert_eq!(result.provider.name, "Ollama");
        assert_eq!(result.model.as_deref(), Some("mistral:7b"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_delegate_receives_request() {
        // Echo the request's first provider back as the answer
        let script = r#"sed -e 's/.*"activeProviders":\[{"name":"\([A-Za-z]*\)"}.*/{"provider":{"name":"\1"}}/'"#;
        let delegate = CommandDelegate::new("sh", vec!["-c".to_string(), script.to_string()]);

        let result = delegate.resolve(&request()).await.unwrap();

        assert_eq!(result.provider.name, "Ollama");
        assert_eq!(result.model, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_delegate_exit_failure() {
        let script = "cat > /dev/null; echo broken >&2; exit 3";
        let delegate = CommandDelegate::new("sh", vec!["-c".to_string(), script.to_string()]);

        let result = delegate.resolve(&request()).await;

        match result {
            Err(Error::ExitFailure(status, stderr)) => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.provider)),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_delegate_garbage_output() {
        let script = "cat > /dev/null; echo not json";
        let delegate = CommandDelegate::new("sh", vec!["-c".to_string(), script.to_string()]);

        let result = delegate.resolve(&request()).await;

        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_wrapper() {
        let script = "cat > /dev/null; sleep 5";
        let delegate = CommandDelegate::new("sh", vec!["-c".to_string(), script.to_string()]);
        let delegate = WithTimeout::new(delegate, Duration::from_millis(50));

        let result = delegate.resolve(&request()).await;

        assert!(matches!(result, Err(Error::TimedOut(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_delegate_answers_before_reading() {
        // Fills the output pipe before draining a request larger than the input pipe
        let script = r#"head -c 200000 /dev/zero | tr '\0' ' '; cat > /dev/null; echo '{"provider":{"name":"Ollama"}}'"#;
        let delegate = CommandDelegate::new("sh", vec!["-c".to_string(), script.to_string()]);

        let request = ResolutionRequest::new(
            "x".repeat(200_000),
            false,
            ["Ollama"].into_iter().collect(),
        );

        let result = delegate.resolve(&request).await.unwrap();

        assert_eq!(result.provider.name, "Ollama");
    }

    #[cfg(unix)]
    #[test]
    fn test_discovery_skips_non_executable() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let shadow = tempfile::tempdir().unwrap();
        let real = tempfile::tempdir().unwrap();

        let shadowing = shadow.path().join(DELEGATE_PROGRAM);
        fs::write(&shadowing, "not a program").unwrap();
        fs::set_permissions(&shadowing, fs::Permissions::from_mode(0o644)).unwrap();

        let program = real.path().join(DELEGATE_PROGRAM);
        fs::write(&program, "#!/bin/sh\necho '{\"provider\":{\"name\":\"Ollama\"}}'\n").unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

        let paths = std::env::join_paths([shadow.path(), real.path()]).unwrap();

        let delegate = CommandDelegate::discover_in(Some(paths)).unwrap();

        assert_eq!(delegate.program, program);
        assert!(delegate.args.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_discovery_without_program() {
        let empty = tempfile::tempdir().unwrap();

        assert!(CommandDelegate::discover_in(Some(empty.path())).is_none());
    }
}
