use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Request};
use tracing::debug;

use crate::config::ProbeConfig;

/// Performs the single GET request described by `config`.
///
/// Succeeds only when the exchange completes and the status is 2xx. The outcome depends on
/// the status line alone; the body is discarded unread.
#[tracing::instrument(level = "debug", skip(config), fields(target = %config.target()))]
pub fn execute(config: &ProbeConfig) -> Result<()> {
    let client = build_client(config)?;
    let request = build_request(&client, config)?;

    let response = client.execute(request)?;
    let status = response.status();
    debug!("Received {}", status);
    // Dropping releases the connection without waiting on a slow or endless body.
    drop(response);

    if !status.is_success() {
        bail!("HTTP status code: {}", status.as_u16());
    }
    Ok(())
}

pub fn build_client(config: &ProbeConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout())
        .danger_accept_invalid_certs(config.skip_tls_verify())
        .build()
        .context("Failed to build HTTP client")
}

pub fn build_request(client: &Client, config: &ProbeConfig) -> Result<Request> {
    let request = client
        .get(config.target().clone())
        .headers(config.headers().as_header_map().clone())
        .build()?;
    debug!(
        "GET {} with {} custom header(s)",
        request.url(),
        config.headers().len()
    );
    Ok(request)
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use mockito::{mock, Matcher};

    use super::*;
    use crate::config::{resolve, Invocation};

    fn config(args: &[&str]) -> ProbeConfig {
        let argv = std::iter::once("loopback_probe").chain(args.iter().copied());
        match resolve(argv).unwrap() {
            Invocation::Probe(config) => config,
            Invocation::Version => panic!("expected a probe invocation"),
        }
    }

    #[test]
    fn request_carries_repeated_headers_in_order() {
        let config = config(&["-H", "X-Test: 1", "-H", "X-Test: 2", "-H", "Accept: text/plain"]);
        let client = build_client(&config).unwrap();
        let request = build_request(&client, &config).unwrap();

        let values: Vec<_> = request
            .headers()
            .get_all("x-test")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["1", "2"]);
        assert_eq!(request.headers()["accept"], "text/plain");
        assert_eq!(request.method(), reqwest::Method::GET);
        assert!(request.body().is_none());
    }

    #[test]
    fn request_targets_resolved_url() {
        let config = config(&["http://127.0.0.1:9000/ready?full=1"]);
        let client = build_client(&config).unwrap();
        let request = build_request(&client, &config).unwrap();

        assert_eq!(request.url().as_str(), "http://127.0.0.1:9000/ready?full=1");
    }

    #[test]
    fn succeeds_on_2xx() {
        let _m = mock("GET", "/probe/ok").with_status(204).create();
        let url = format!("{}/probe/ok", mockito::server_url());

        assert!(execute(&config(&[url.as_str()])).is_ok());
    }

    #[test]
    fn fails_on_non_2xx_with_status_code() {
        let _m = mock("GET", "/probe/unavailable")
            .with_status(503)
            .with_body("maintenance")
            .create();
        let url = format!("{}/probe/unavailable", mockito::server_url());

        let err = execute(&config(&[url.as_str()])).unwrap_err();
        assert_eq!(err.to_string(), "HTTP status code: 503");
    }

    #[test]
    fn sends_custom_headers() {
        let m = mock("GET", "/probe/headers")
            .match_header("x-probe", "yes")
            .match_header("authorization", Matcher::Regex("^Bearer ".into()))
            .with_status(200)
            .expect(1)
            .create();
        let url = format!("{}/probe/headers", mockito::server_url());

        execute(&config(&[
            "-H",
            "X-Probe: yes",
            "-H",
            "Authorization: Bearer token",
            url.as_str(),
        ]))
        .unwrap();
        m.assert();
    }

    #[test]
    fn connection_refused_is_a_transport_error() {
        // Port 1 is privileged and never bound by the test harness.
        let err = execute(&config(&["-t", "5s", "http://127.0.0.1:1/ping"])).unwrap_err();

        assert!(err.downcast_ref::<reqwest::Error>().is_some());
    }

    /// Serves one connection: reads the request, writes `reply`, then keeps the socket open
    /// without sending anything else until the test ends.
    fn stalling_server(reply: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(reply);
            let _ = stream.flush();
            thread::sleep(Duration::from_secs(30));
        });
        format!("http://{}/ping", addr)
    }

    fn execute_within(args: Vec<String>, limit: Duration) -> Result<()> {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let _ = tx.send(execute(&config(&args)));
        });
        rx.recv_timeout(limit).expect("execute did not return in time")
    }

    #[test]
    fn unfinished_body_does_not_block_success() {
        let url = stalling_server(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n",
        );

        let outcome = execute_within(vec![url], Duration::from_secs(5));
        assert!(outcome.is_ok(), "{:?}", outcome);
    }

    #[test]
    fn silent_server_hits_timeout() {
        let url = stalling_server(b"");

        let err = execute_within(
            vec!["-t".into(), "200ms".into(), url],
            Duration::from_secs(5),
        )
        .unwrap_err();
        let err = err.downcast_ref::<reqwest::Error>().unwrap();
        assert!(err.is_timeout(), "{:?}", err);
    }

    #[test]
    fn https_client_builds_with_and_without_verification() {
        for flag in ["-s=true", "-s=false"] {
            let config = config(&[flag, "https://127.0.0.1:8443/ready"]);
            let client = build_client(&config).unwrap();
            let request = build_request(&client, &config).unwrap();

            assert_eq!(request.url().scheme(), "https");
        }
        assert!(config(&["-s=true"]).skip_tls_verify());
        assert!(!config(&["-s=false"]).skip_tls_verify());
    }

    #[test]
    fn https_against_plain_listener_is_a_transport_error() {
        let _m = mock("GET", "/probe/tls").with_status(200).create();
        let url = mockito::server_url().replacen("http://", "https://", 1) + "/probe/tls";

        for flag in ["-s=true", "-s=false"] {
            let err = execute(&config(&[flag, "-t", "5s", url.as_str()])).unwrap_err();
            assert!(err.downcast_ref::<reqwest::Error>().is_some());
        }
    }

    #[test]
    fn zero_timeout_is_unbounded() {
        assert_eq!(config(&[]).timeout(), None);
        assert_eq!(
            config(&["-t", "2s"]).timeout(),
            Some(Duration::from_secs(2))
        );
    }
}
