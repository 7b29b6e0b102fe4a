//! Shared utilities for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::{ready, Ready};
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::http::{header, Request, Response};
use rcgen::{BasicConstraints, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair};

use serverd::config::{EnvLookup, ServerConfig, TlsConfig};
use serverd::lifecycle::Timing;
use tempfile::TempDir;

pub const CERT_VAR: &str = "SERVERD_TEST_CERT";
pub const KEY_VAR: &str = "SERVERD_TEST_KEY";
pub const CA_VAR: &str = "SERVERD_TEST_CA";

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|addr| addr.port())
        .expect("no free port")
}

/// Loopback config on fresh ports with TLS switched off.
pub fn loopback_config() -> ServerConfig {
    ServerConfig {
        address: "127.0.0.1".into(),
        http_port: free_port(),
        grpc_port: free_port(),
        grpc_web_port: free_port(),
        health_check_port: free_port(),
        tls: TlsConfig {
            enabled: false,
            ..TlsConfig::default()
        },
        ..ServerConfig::default()
    }
}

/// Short delays so a full stop sequence finishes quickly.
pub fn fast_timing() -> Timing {
    Timing {
        shutdown_duration: Duration::from_secs(2),
        probe_wait: Duration::from_millis(50),
        launch_grace: Duration::from_millis(200),
    }
}

pub fn no_env() -> Arc<dyn EnvLookup> {
    Arc::new(HashMap::<String, String>::new())
}

/// Poll until something accepts connections on `addr`.
pub async fn wait_for_port(addr: SocketAddr) {
    for _ in 0..100 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("nothing listening on {addr}");
}

/// Self-signed certificate for `localhost` written to a temp dir.
pub struct TlsMaterial {
    dir: TempDir,
    pub cert_pem: String,
    pub env: HashMap<String, String>,
}

impl TlsMaterial {
    pub fn generate() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let rcgen::CertifiedKey { cert, key_pair } =
            rcgen::generate_simple_self_signed(vec!["localhost".into()]).unwrap();

        let cert_path = dir.path().join("server.crt");
        let key_path = dir.path().join("server.key");
        std::fs::write(&cert_path, cert.pem()).unwrap();
        std::fs::write(&key_path, key_pair.serialize_pem()).unwrap();

        let env = HashMap::from([
            (CERT_VAR.to_string(), cert_path.display().to_string()),
            (KEY_VAR.to_string(), key_path.display().to_string()),
        ]);

        Self {
            dir,
            cert_pem: cert.pem(),
            env,
        }
    }

    pub fn tls_config() -> TlsConfig {
        TlsConfig {
            enabled: true,
            cert_key: CERT_VAR.into(),
            key_key: KEY_VAR.into(),
            ca_key: CA_VAR.into(),
        }
    }

    /// Require client certificates signed by a fresh CA. Returns that CA.
    pub fn require_client_certs(&mut self) -> ClientCa {
        let ca = ClientCa::generate();
        let ca_path = self.dir.path().join("client-ca.crt");
        std::fs::write(&ca_path, &ca.ca_pem).unwrap();
        self.env
            .insert(CA_VAR.to_string(), ca_path.display().to_string());
        ca
    }

    pub fn lookup(&self) -> Arc<dyn EnvLookup> {
        Arc::new(self.env.clone())
    }
}

/// A CA plus one client certificate it signed.
pub struct ClientCa {
    pub ca_pem: String,
    /// Client certificate followed by its PKCS#8 key.
    pub identity_pem: String,
}

impl ClientCa {
    fn generate() -> Self {
        let ca_key = KeyPair::generate().unwrap();
        let mut ca_params = CertificateParams::default();
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "serverd test client CA");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let ca_cert = ca_params.self_signed(&ca_key).unwrap();

        let client_key = KeyPair::generate().unwrap();
        let mut client_params = CertificateParams::new(vec!["client.serverd.test".to_string()]).unwrap();
        client_params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ClientAuth];
        let client_cert = client_params
            .signed_by(&client_key, &ca_cert, &ca_key)
            .unwrap();

        Self {
            ca_pem: ca_cert.pem(),
            identity_pem: format!("{}{}", client_cert.pem(), client_key.serialize_pem()),
        }
    }
}

/// RPC service answering every call with an empty OK status.
#[derive(Clone)]
pub struct Ping;

impl Ping {
    pub const CALL_PATH: &'static str = "/serverd.test.Ping/Call";
}

impl tonic::server::NamedService for Ping {
    const NAME: &'static str = "serverd.test.Ping";
}

impl tower::Service<Request<tonic::body::Body>> for Ping {
    type Response = Response<tonic::body::Body>;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _request: Request<tonic::body::Body>) -> Self::Future {
        let response = Response::builder()
            .header(header::CONTENT_TYPE, "application/grpc")
            .header("grpc-status", "0")
            .body(tonic::body::Body::empty())
            .unwrap();
        ready(Ok(response))
    }
}
