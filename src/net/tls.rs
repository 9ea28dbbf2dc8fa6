//! TLS certificate loading.

use std::io;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

/// Load a rustls config from PEM certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> io::Result<RustlsConfig> {
    for (kind, path) in [("Certificate", cert_path), ("Private key", key_path)] {
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} file not found: {}", kind, path.display()),
            ));
        }
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_files() {
        let err = load_tls_config(Path::new("/nope/cert.pem"), Path::new("/nope/key.pem"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("Certificate"));
    }
}
