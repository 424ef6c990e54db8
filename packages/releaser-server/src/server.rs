use crate::response::Body;
use crate::routes::{self, AppState};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::{body::Incoming, service::Service, Request, Response};
use hyper_util::rt::TokioIo;
use releaser_core::ReleaseService;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Largest request body accepted (100 KiB); bigger bodies get a 413.
pub const MAX_BODY_BYTES: usize = 100 * 1024;

/// HTTP front end for the release service.
pub struct ReleaseServer {
    state: Arc<AppState>,
}

/// A server running in the background.
pub struct ServerHandle {
    pub addr: SocketAddr,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn stop(self) {
        self.task.abort();
    }

    /// Wait for the accept loop; it only ends when aborted.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

impl ReleaseServer {
    pub fn new(service: ReleaseService, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            state: Arc::new(AppState::new(service, public_dir)),
        }
    }

    /// Bind `addr` and serve connections on a background task.
    pub async fn bind(self, addr: SocketAddr) -> Result<ServerHandle, BoxError> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "update server listening");

        let task = tokio::spawn(accept_loop(listener, self.state));
        Ok(ServerHandle { addr, task })
    }

    pub async fn start(self, addr: SocketAddr) -> Result<(), BoxError> {
        self.bind(addr).await?.join().await;
        Ok(())
    }
}

async fn accept_loop(listener: TcpListener, state: Arc<AppState>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::warn!(error = %err, "failed to accept connection");
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let service = UpdateService {
            state: state.clone(),
        };

        tokio::spawn(async move {
            if let Err(err) = hyper::server::conn::http1::Builder::new()
                .serve_connection(io, service)
                .await
            {
                tracing::debug!(%peer, error = ?err, "error serving connection");
            }
        });
    }
}

#[derive(Clone)]
struct UpdateService {
    state: Arc<AppState>,
}

impl Service<Request<Incoming>> for UpdateService {
    type Response = Response<Body>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let state = self.state.clone();

        Box::pin(async move {
            let started = Instant::now();
            let method = req.method().clone();
            let path = req.uri().path().to_string();

            let (parts, body) = req.into_parts();
            let response = match read_body(body, MAX_BODY_BYTES).await? {
                Some(body) => routes::handle(&state, Request::from_parts(parts, body)).await,
                None => routes::payload_too_large(),
            };

            tracing::info!(
                %method,
                %path,
                status = response.status().as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "request"
            );
            Ok(response)
        })
    }
}

/// Buffer `body`, or return `None` once it grows past `limit` bytes.
async fn read_body<B>(body: B, limit: usize) -> Result<Option<Bytes>, BoxError>
where
    B: hyper::body::Body,
    B::Error: Into<BoxError>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(Some(collected.to_bytes())),
        Err(err) if err.is::<LengthLimitError>() => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let body = Full::new(Bytes::from_static(br#"{"version":"1.0.0"}"#));
        let bytes = read_body(body, MAX_BODY_BYTES).await.unwrap().unwrap();
        assert_eq!(&bytes[..], br#"{"version":"1.0.0"}"#);

        let exact = Full::new(Bytes::from(vec![b' '; MAX_BODY_BYTES]));
        assert!(read_body(exact, MAX_BODY_BYTES).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_read_body_over_limit() {
        let body = Full::new(Bytes::from(vec![b' '; MAX_BODY_BYTES + 1]));
        assert!(read_body(body, MAX_BODY_BYTES).await.unwrap().is_none());
    }
}
