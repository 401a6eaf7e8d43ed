// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Accept-and-log endpoint for lines forwarded by the container log relay.
//!
//! The relay's forwarder posts one `text/plain` request per captured line to
//! `/log`; this service reads the body, records it, and answers with a small
//! JSON acknowledgement. Delivery is best-effort on the relay side, so the
//! collector never needs to coordinate with it beyond accepting posts.

use std::io;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Incoming};
use hyper::service::service_fn;
use hyper::{http, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

pub const LOG_ENDPOINT_PATH: &str = "/log";
pub const DEFAULT_PORT: u16 = 8080;

type ResponseBody = Full<Bytes>;

/// Does two things:
/// 1. Logs the given message. A success status code (within 200-299) will
///    cause a debug log to be written, otherwise error will be written.
/// 2. Returns the given message in the body of a JSON response with the
///    given status code.
fn log_and_create_http_response(
    message: &str,
    status: StatusCode,
) -> http::Result<Response<ResponseBody>> {
    if status.is_success() {
        debug!("{message}");
    } else {
        error!("{message}");
    }
    let body = json!({ "message": message }).to_string();
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::from(body)))
}

/// Handle one collector request.
///
/// `POST /log` reads the full body (one forwarded line) and records it; any
/// other method on the path is rejected with method-not-allowed.
pub async fn collector_handler<B>(req: Request<B>) -> http::Result<Response<ResponseBody>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    match (req.method(), req.uri().path()) {
        (&Method::POST, LOG_ENDPOINT_PATH) => {
            let body = match req.into_body().collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    return log_and_create_http_response(
                        &format!("Error reading forwarded log line: {e}"),
                        StatusCode::BAD_REQUEST,
                    );
                }
            };
            let line = String::from_utf8_lossy(&body);
            info!("received log: {:?}", line);
            log_and_create_http_response("ok", StatusCode::OK)
        }
        (_, LOG_ENDPOINT_PATH) => {
            log_and_create_http_response("only POST allowed", StatusCode::METHOD_NOT_ALLOWED)
        }
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::new())),
    }
}

/// Serve the collector on the given listener until the process exits.
///
/// One task per connection on a `JoinSet`; transient accept errors are
/// skipped, anything else tears the server down.
pub async fn run_collector(listener: TcpListener) -> Result<(), io::Error> {
    let server = hyper::server::conn::http1::Builder::new();
    let mut joinset = tokio::task::JoinSet::new();

    loop {
        let conn = tokio::select! {
            con_res = listener.accept() => match con_res {
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::ConnectionAborted
                            | io::ErrorKind::ConnectionReset
                            | io::ErrorKind::ConnectionRefused
                    ) =>
                {
                    continue;
                }
                Err(e) => {
                    error!("Collector server error: {e}");
                    return Err(e);
                }
                Ok((conn, _)) => conn,
            },
            finished = async {
                match joinset.join_next().await {
                    Some(finished) => finished,
                    None => std::future::pending().await,
                }
            } => match finished {
                Err(e) if e.is_panic() => {
                    // Don't kill the server on panic - log and continue
                    error!("Connection handler panicked: {e:?}");
                    continue;
                }
                Ok(()) | Err(_) => continue,
            },
        };
        let conn = TokioIo::new(conn);
        let server = server.clone();
        let service = service_fn(|req: Request<Incoming>| collector_handler(req));
        joinset.spawn(async move {
            if let Err(e) = server.serve_connection(conn, service).await {
                error!("Connection error: {e}");
            }
        });
    }
}
