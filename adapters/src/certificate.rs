//! Certificate provider
//!
//! Adapters ask for TLS certificates, keys and signing keys by logical name
//! (`jpmorgan_crt`, `jpmorgan_key`, ...). Where the bytes come from (vault,
//! blob storage, files, test fixtures) is up to the provider.

use crate::{Error, Result};
use dashmap::DashMap;
use rustls_pemfile::Item;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::debug;

/// Source of named PEM blobs
pub trait CertificateProvider: Send + Sync {
    /// Raw bytes of the named blob
    fn get(&self, name: &str) -> Result<Vec<u8>>;
}

/// Concurrent in-memory store, filled at startup or by tests
#[derive(Debug, Default)]
pub struct InMemoryCertificateStore {
    blobs: DashMap<String, Vec<u8>>,
}

impl InMemoryCertificateStore {
    /// Create empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or replace a blob
    pub fn insert(&self, name: impl Into<String>, pem: impl Into<Vec<u8>>) {
        self.blobs.insert(name.into(), pem.into());
    }

    /// Builder-style insert
    pub fn with(self, name: impl Into<String>, pem: impl Into<Vec<u8>>) -> Self {
        self.insert(name, pem);
        self
    }
}

impl CertificateProvider for InMemoryCertificateStore {
    fn get(&self, name: &str) -> Result<Vec<u8>> {
        self.blobs
            .get(name)
            .map(|blob| blob.value().clone())
            .ok_or_else(|| Error::Certificate {
                name: name.to_string(),
                reason: "not found".to_string(),
            })
    }
}

/// Reads `<dir>/<name>` or `<dir>/<name>.pem`
#[derive(Debug, Clone)]
pub struct FileCertificateProvider {
    dir: PathBuf,
}

impl FileCertificateProvider {
    /// Create provider over a directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CertificateProvider for FileCertificateProvider {
    fn get(&self, name: &str) -> Result<Vec<u8>> {
        let candidates = [self.dir.join(name), self.dir.join(format!("{}.pem", name))];

        for path in &candidates {
            if path.is_file() {
                debug!(path = %path.display(), "Loading certificate");
                return std::fs::read(path).map_err(|e| Error::Certificate {
                    name: name.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        Err(Error::Certificate {
            name: name.to_string(),
            reason: format!("no file in {}", self.dir.display()),
        })
    }
}

/// Kind of PEM section expected under a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PemKind {
    /// X.509 certificate
    Certificate,
    /// PKCS#1, PKCS#8 or SEC1 private key
    PrivateKey,
}

/// Fetch a blob and check it holds at least one section of the expected kind
pub fn load_pem(provider: &dyn CertificateProvider, name: &str, kind: PemKind) -> Result<Vec<u8>> {
    let pem = provider.get(name)?;
    let mut reader = BufReader::new(pem.as_slice());

    let items = rustls_pemfile::read_all(&mut reader).map_err(|e| Error::Certificate {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    let found = items.iter().any(|item| match kind {
        PemKind::Certificate => matches!(item, Item::X509Certificate(_)),
        PemKind::PrivateKey => matches!(
            item,
            Item::RSAKey(_) | Item::PKCS8Key(_) | Item::ECKey(_)
        ),
    });

    if !found {
        return Err(Error::Certificate {
            name: name.to_string(),
            reason: format!("no {:?} section in PEM", kind),
        });
    }

    Ok(pem)
}
