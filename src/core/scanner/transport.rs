// src/core/scanner/transport.rs

// Construction of the outbound clients and classification of their errors into
// probe failures.

use crate::config::ScanConfig;
use crate::core::models::ProbeFailure;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use std::error::Error as StdError;
use std::io;
use tracing::{debug, warn};

/// Builds the HTTP client shared by every HTTP-based probe.
///
/// No cookie store is enabled, so nothing learned from one target is replayed
/// against another. Redirects are followed with reqwest's default policy.
pub fn build_http_client(config: &ScanConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(config.http_timeout)
        .build()
}

/// Builds the resolver from the system configuration, falling back to the
/// library defaults when `/etc/resolv.conf` (or its equivalent) is unusable.
pub fn build_resolver(config: &ScanConfig) -> TokioAsyncResolver {
    let (resolver_config, mut opts) = match hickory_resolver::system_conf::read_system_conf() {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "System resolver configuration unavailable, using defaults.");
            (ResolverConfig::default(), ResolverOpts::default())
        }
    };
    opts.timeout = config.dns_timeout;
    opts.attempts = 1;
    TokioAsyncResolver::tokio(resolver_config, opts)
}

/// Maps a socket error onto the probe failure taxonomy.
pub fn classify_io_error(err: &io::Error) -> ProbeFailure {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => ProbeFailure::ConnectionRefused,
        io::ErrorKind::TimedOut => ProbeFailure::Timeout,
        _ => ProbeFailure::ConnectionError,
    }
}

/// Maps a transport-level HTTP error onto the probe failure taxonomy.
pub fn classify_http_error(err: &reqwest::Error) -> ProbeFailure {
    if err.is_timeout() {
        return ProbeFailure::Timeout;
    }
    // The refused/other distinction lives on the io::Error at the bottom of the chain.
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return classify_io_error(io_err);
        }
        source = cause.source();
    }
    ProbeFailure::ConnectionError
}

/// Issues a GET and classifies transport failures. Any HTTP status is returned
/// as a response; interpreting it is up to the probe.
pub async fn get(client: &reqwest::Client, url: &str) -> Result<reqwest::Response, ProbeFailure> {
    match client.get(url).send().await {
        Ok(response) => {
            debug!(url, status = %response.status(), "Received HTTP response.");
            Ok(response)
        }
        Err(e) => {
            let failure = classify_http_error(&e);
            debug!(url, error = %e, ?failure, "HTTP request failed.");
            Err(failure)
        }
    }
}

/// Upper bound on the bytes kept from one response body.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Reads the response body as text, keeping at most [`MAX_BODY_BYTES`].
///
/// The body is streamed chunk by chunk and the connection is released as soon
/// as the cap is reached. Invalid UTF-8 is replaced rather than rejected.
pub async fn read_body(mut response: reqwest::Response) -> Result<String, ProbeFailure> {
    let mut body = Vec::new();
    loop {
        let chunk = response.chunk().await.map_err(|e| {
            debug!(error = %e, "Failed to read response body.");
            classify_http_error(&e)
        })?;
        let Some(chunk) = chunk else {
            break;
        };
        let room = MAX_BODY_BYTES - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            debug!(limit = MAX_BODY_BYTES, "Response body truncated.");
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Turns a name into its fully qualified form so the resolver never appends
/// the host's search domains to it.
pub fn fully_qualified(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn io_errors_are_classified() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        let timed_out = io::Error::from(io::ErrorKind::TimedOut);
        let other = io::Error::from(io::ErrorKind::AddrNotAvailable);
        assert_eq!(classify_io_error(&refused), ProbeFailure::ConnectionRefused);
        assert_eq!(classify_io_error(&timed_out), ProbeFailure::Timeout);
        assert_eq!(classify_io_error(&other), ProbeFailure::ConnectionError);
    }

    #[tokio::test]
    async fn closed_local_port_is_refused_or_connection_error() {
        // Bind then drop to obtain a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = build_http_client(&ScanConfig::default()).unwrap();
        let failure = get(&client, &format!("http://{addr}/")).await.unwrap_err();
        assert!(
            matches!(failure, ProbeFailure::ConnectionRefused | ProbeFailure::ConnectionError),
            "unexpected {failure:?}"
        );
    }

    #[tokio::test]
    async fn oversized_body_is_cut_at_the_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a".repeat(MAX_BODY_BYTES + 4096)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/small"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let client = build_http_client(&ScanConfig::default()).unwrap();
        let big = get(&client, &format!("{}/big", server.uri())).await.unwrap();
        assert_eq!(read_body(big).await.unwrap().len(), MAX_BODY_BYTES);

        let small = get(&client, &format!("{}/small", server.uri())).await.unwrap();
        assert_eq!(read_body(small).await.unwrap(), "<html>ok</html>");
    }

    #[test]
    fn names_are_made_fully_qualified_once() {
        assert_eq!(fully_qualified("www.example.com"), "www.example.com.");
        assert_eq!(fully_qualified("example.com."), "example.com.");
    }
}
