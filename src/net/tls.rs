//! TLS configuration and certificate loading.
//!
//! # Responsibilities
//! - Resolve certificate, key and CA paths through environment indirection
//! - Load the certificate chain and private key (PEM)
//! - Enable mandatory client certificate verification when a CA is configured
//! - Harden the resulting context: TLS 1.2 minimum, fixed key exchange
//!   preference, no session tickets and no session cache
//!
//! # Design Decisions
//! - Pure function of the config and the lookup: nothing is cached, calling
//!   it once per listener yields independent, identical contexts
//! - The built context is immutable and shared by `Arc`
//! - The client CA pool starts empty instead of from the system pool, so
//!   only the configured CA can vouch for client certificates

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::crypto::{aws_lc_rs, CryptoProvider};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::{NoServerSessionStorage, VerifierBuilderError, WebPkiClientVerifier};
use rustls::version::{TLS12, TLS13};
use rustls::{RootCertStore, ServerConfig, SupportedProtocolVersion};
use thiserror::Error;

use crate::config::{EnvLookup, TlsConfig};

/// TLS 1.2 is the minimum.
static PROTOCOL_VERSIONS: &[&SupportedProtocolVersion] = &[&TLS13, &TLS12];

/// Errors from building a TLS context.
#[derive(Debug, Error)]
pub enum TlsError {
    /// Certificate or key indirection resolved to nothing.
    #[error("Cert/Key path not found")]
    CertOrKeyNotFound,

    #[error("failed to load {path}: {source}")]
    CertLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificate found in {0}")]
    NoCertificate(PathBuf),

    #[error("no private key found in {0}")]
    NoPrivateKey(PathBuf),

    #[error("invalid certificate/key pair: {0}")]
    KeyPair(#[source] rustls::Error),

    #[error("failed to read CA certificate {path}: {source}")]
    CaRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CA file held no parsable certificate.
    #[error("Certification Failed: no valid certificate in {0}")]
    CaAppend(PathBuf),

    #[error("unsupported protocol configuration: {0}")]
    Protocol(#[source] rustls::Error),

    #[error("failed to build client verifier: {0}")]
    Verifier(#[source] VerifierBuilderError),
}

impl TlsError {
    /// True for failures loading the certificate/key pair itself.
    pub fn is_cert_load(&self) -> bool {
        matches!(
            self,
            TlsError::CertLoad { .. }
                | TlsError::NoCertificate(_)
                | TlsError::NoPrivateKey(_)
                | TlsError::KeyPair(_)
        )
    }
}

/// An immutable server TLS context.
#[derive(Debug, Clone)]
pub struct TlsContext {
    config: Arc<ServerConfig>,
    client_auth: bool,
}

impl TlsContext {
    pub fn server_config(&self) -> Arc<ServerConfig> {
        Arc::clone(&self.config)
    }

    /// Whether clients must present a certificate signed by the configured CA.
    pub fn requires_client_auth(&self) -> bool {
        self.client_auth
    }
}

/// Build a TLS context from indirection keys resolved through `env`.
pub fn build(cfg: &TlsConfig, env: &dyn EnvLookup) -> Result<TlsContext, TlsError> {
    let (cert_path, key_path) = match (env.resolve(&cfg.cert_key), env.resolve(&cfg.key_key)) {
        (Some(cert), Some(key)) => (PathBuf::from(cert), PathBuf::from(key)),
        _ => return Err(TlsError::CertOrKeyNotFound),
    };

    let chain = load_certs(&cert_path)?;
    let key = load_private_key(&key_path)?;

    let provider = crypto_provider();
    let builder = ServerConfig::builder_with_provider(Arc::clone(&provider))
        .with_protocol_versions(PROTOCOL_VERSIONS)
        .map_err(TlsError::Protocol)?;

    let client_roots = env
        .resolve(&cfg.ca_key)
        .map(|ca| load_client_roots(Path::new(&ca)))
        .transpose()?;
    let client_auth = client_roots.is_some();

    let builder = match client_roots {
        Some(roots) => {
            let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
                .build()
                .map_err(TlsError::Verifier)?;
            builder.with_client_cert_verifier(verifier)
        }
        None => builder.with_no_client_auth(),
    };

    let mut config = builder
        .with_single_cert(chain, key)
        .map_err(TlsError::KeyPair)?;
    config.session_storage = Arc::new(NoServerSessionStorage {});
    config.send_tls13_tickets = 0;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    tracing::debug!(
        certificate = %cert_path.display(),
        client_auth,
        "TLS context built"
    );

    Ok(TlsContext {
        config: Arc::new(config),
        client_auth,
    })
}

/// Load a client CA bundle into a fresh root store.
///
/// Fails with [`TlsError::CaAppend`] unless at least one certificate was added.
pub fn load_client_roots(path: &Path) -> Result<RootCertStore, TlsError> {
    let pem = fs::read(path).map_err(|source| TlsError::CaRead {
        path: path.to_path_buf(),
        source,
    })?;

    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut pem.as_slice())
        .filter_map(Result::ok)
        .collect();

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs);
    if added == 0 {
        return Err(TlsError::CaAppend(path.to_path_buf()));
    }
    if ignored > 0 {
        tracing::warn!(path = %path.display(), ignored, "Skipped unparsable CA certificates");
    }
    Ok(roots)
}

/// Key exchange groups in preference order: P-384, P-256, X25519.
fn crypto_provider() -> Arc<CryptoProvider> {
    use aws_lc_rs::kx_group::{SECP256R1, SECP384R1, X25519};

    Arc::new(CryptoProvider {
        kx_groups: vec![SECP384R1, SECP256R1, X25519],
        ..aws_lc_rs::default_provider()
    })
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let to_err = |source| TlsError::CertLoad {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::open(path).map_err(to_err)?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_err)?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificate(path.to_path_buf()));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let to_err = |source| TlsError::CertLoad {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::open(path).map_err(to_err)?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(to_err)?
        .ok_or_else(|| TlsError::NoPrivateKey(path.to_path_buf()))
}
