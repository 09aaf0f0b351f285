//! In-process backend used by the integration tests
//!
//! A hyper HTTP/1 server on 127.0.0.1:0 serving the authentication endpoints
//! plus a few endpoints exercising gateway behavior. Mounted under `/api`.

#![allow(dead_code)]

use armeria_core::config::ArmeriaConfig;
use armeria_core::prelude::*;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const EMAIL: &str = "ana@example.com";
pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "tok-ana";
/// Token whose `/auth/me` answer is delayed
pub const SLOW_TOKEN: &str = "tok-slow";

struct Backend {
    valid_tokens: Mutex<HashSet<String>>,
    profile: Mutex<Value>,
}

pub struct TestServer {
    pub addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let backend = Arc::new(Backend {
            valid_tokens: Mutex::new([TOKEN.to_string(), SLOW_TOKEN.to_string()].into()),
            profile: Mutex::new(json!({
                "id": 7,
                "nombres": "Ana",
                "apellidos": "Pérez",
                "email": EMAIL,
                "telefono": "0991112233",
                "roles": [{"rol": {"codigo": "vendor", "nombre": "Vendedor"}}, "ADMIN"]
            })),
        });

        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else { break };
                let io = TokioIo::new(stream);
                let backend = backend.clone();

                tokio::spawn(async move {
                    if let Err(err) = http1::Builder::new()
                        .serve_connection(
                            io,
                            service_fn(move |req| {
                                let backend = backend.clone();
                                async move { handle(req, backend).await }
                            }),
                        )
                        .await
                    {
                        eprintln!("Error serving connection: {:?}", err);
                    }
                });
            }
        });

        Self { addr, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Config pointing at this server
    pub fn config(&self) -> ArmeriaConfig {
        let mut config = ArmeriaConfig::default();
        config.api.base_url = self.base_url();
        config.api.timeout_secs = 5;
        config
    }

    pub fn gateway(&self, tokens: Arc<TokenStore>) -> Gateway {
        Gateway::new(self.base_url(), tokens).unwrap()
    }

    /// Access layer against this server with an in-memory credential
    pub async fn layer(&self, tokens: Arc<TokenStore>) -> AccessLayer {
        AccessLayer::with_config(self.config()).with_token_store(tokens).build().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn json_response(status: StatusCode, body: Value) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn raw_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder().status(status).body(Full::new(Bytes::from_static(body.as_bytes()))).unwrap()
}

fn bearer(req: &Request<hyper::body::Incoming>) -> Option<String> {
    req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn header(req: &Request<hyper::body::Incoming>, name: &str) -> Value {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| Value::String(v.to_string()))
        .unwrap_or(Value::Null)
}

async fn handle(
    req: Request<hyper::body::Incoming>,
    backend: Arc<Backend>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().trim_start_matches("/api").to_string();
    let token = bearer(&req);
    let authorized =
        token.as_ref().is_some_and(|t| backend.valid_tokens.lock().unwrap().contains(t));
    let unauthorized = || json_response(StatusCode::UNAUTHORIZED, json!({"message": "Token inválido"}));

    let response = match (method, path.as_str()) {
        (Method::POST, "/auth/login") => {
            let body = req.into_body().collect().await.unwrap().to_bytes();
            let creds: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            if creds["email"] == EMAIL && creds["password"] == PASSWORD {
                let profile = backend.profile.lock().unwrap().clone();
                json_response(
                    StatusCode::OK,
                    json!({"token": TOKEN, "usuario": {"id": profile["id"], "email": EMAIL}}),
                )
            } else {
                unauthorized()
            }
        }
        (Method::GET, "/auth/me") if authorized => {
            if token.as_deref() == Some(SLOW_TOKEN) {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            json_response(StatusCode::OK, backend.profile.lock().unwrap().clone())
        }
        (Method::POST, "/auth/logout") if authorized => {
            if let Some(token) = &token {
                backend.valid_tokens.lock().unwrap().remove(token);
            }
            raw_response(StatusCode::NO_CONTENT, "")
        }
        (Method::PUT, "/users/7") if authorized => {
            let body = req.into_body().collect().await.unwrap().to_bytes();
            let update: Value = serde_json::from_slice(&body).unwrap_or(json!({}));
            if update["email"] == "taken@example.com" {
                json_response(StatusCode::CONFLICT, json!({"message": "Email already in use"}))
            } else {
                let mut profile = backend.profile.lock().unwrap();
                if let (Some(target), Some(fields)) = (profile.as_object_mut(), update.as_object()) {
                    for (key, value) in fields {
                        target.insert(key.clone(), value.clone());
                    }
                }
                json_response(StatusCode::OK, profile.clone())
            }
        }
        (_, "/auth/me" | "/auth/logout" | "/users/7" | "/expired") => unauthorized(),
        (Method::GET, "/empty") => raw_response(StatusCode::OK, ""),
        (Method::DELETE, "/no-content") => raw_response(StatusCode::NO_CONTENT, ""),
        (Method::GET, "/conflict") => {
            json_response(StatusCode::CONFLICT, json!({"message": "Duplicado", "field": "ruc"}))
        }
        (Method::GET, "/broken") => raw_response(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>"),
        (_, "/echo-headers") => json_response(
            StatusCode::OK,
            json!({
                "authorization": header(&req, "authorization"),
                "active_role": header(&req, "x-active-role"),
                "content_type": header(&req, "content-type"),
            }),
        ),
        _ => json_response(StatusCode::NOT_FOUND, json!({})),
    };

    Ok(response)
}
