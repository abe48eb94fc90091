//! Internal transport plumbing: TLS streams to the mail server.
//!
//! The secure variant of the retrieval protocol is the only one spoken;
//! every connection is TLS from the first byte, optionally routed through a
//! SOCKS5 proxy.

use crate::error::{Error, Result};
use crate::proxy::Socks5Proxy;
use rustls::ClientConfig;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_socks::tcp::Socks5Stream;
use tracing::{debug, instrument};
use webpki_roots::TLS_SERVER_ROOTS;

/// A TLS stream over TCP, used for IMAP communication.
pub(crate) type TlsStream = tokio_rustls::client::TlsStream<TcpStream>;

/// Opens a TLS connection to `target_addr`, verifying the certificate
/// against `host`.
///
/// If a proxy is provided, the underlying TCP connection is routed through
/// SOCKS5.
#[instrument(
    name = "connection::connect_tls",
    skip_all,
    fields(
        host = %host,
        target_addr = %target_addr,
        proxy_enabled = proxy.is_some()
    )
)]
pub(crate) async fn connect_tls(
    host: &str,
    target_addr: &str,
    proxy: Option<&Socks5Proxy>,
) -> Result<TlsStream> {
    let server_name =
        rustls::ServerName::try_from(host).map_err(|source| Error::InvalidDnsName {
            host: host.to_string(),
            source,
        })?;

    let tcp_stream = match proxy {
        Some(proxy) => connect_via_socks5(target_addr, proxy).await?,
        None => connect_direct(target_addr).await?,
    };

    debug!("Performing TLS handshake");

    tls_connector()
        .connect(server_name, tcp_stream)
        .await
        .map_err(|source| Error::TlsConnect {
            target: target_addr.to_string(),
            source,
        })
}

/// Builds a TLS connector trusting the bundled webpki roots.
fn tls_connector() -> TlsConnector {
    let mut root_cert_store = rustls::RootCertStore::empty();
    root_cert_store.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|ta| {
        rustls::OwnedTrustAnchor::from_subject_spki_name_constraints(
            ta.subject,
            ta.spki,
            ta.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(root_cert_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

#[instrument(name = "connection::direct", skip_all, fields(target = %target_addr))]
async fn connect_direct(target_addr: &str) -> Result<TcpStream> {
    TcpStream::connect(target_addr)
        .await
        .map_err(|source| Error::TcpConnect {
            target: target_addr.to_string(),
            source,
        })
}

#[instrument(
    name = "connection::socks5",
    skip_all,
    fields(proxy = %proxy, target = %target_addr)
)]
async fn connect_via_socks5(target_addr: &str, proxy: &Socks5Proxy) -> Result<TcpStream> {
    let proxy_addr = (proxy.host.as_str(), proxy.port);

    let stream = match &proxy.auth {
        Some(auth) => {
            Socks5Stream::connect_with_password(
                proxy_addr,
                target_addr,
                &auth.username,
                &auth.password,
            )
            .await
        }
        None => Socks5Stream::connect(proxy_addr, target_addr).await,
    };

    stream
        .map(Socks5Stream::into_inner)
        .map_err(|source| Error::Socks5Connect {
            proxy_host: proxy.host.clone(),
            target: target_addr.to_string(),
            source,
        })
}
