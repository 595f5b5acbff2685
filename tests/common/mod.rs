/*
 * Copyright (c) 2019-2021, Yiming Jing
 * Copyright (c) 2017-2019, The MesaLink Authors
 * All rights reserved.
 */

#![allow(dead_code)]

use foreign_types::ForeignType;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslConnector, SslContext};
use openssl::ssl::{SslMethod, SslVerifyMode};
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509NameBuilder, X509};
use sslglue::libssl::x509::subject_alt_dns_names;
use std::net::{TcpListener, TcpStream};
use std::thread;

const CONST_SERVER_ADDR: &str = "127.0.0.1";

/// A self-signed certificate and its private key.
pub struct Identity {
    pub cert: X509,
    pub key: PKey<Private>,
}

/// Mints a certificate whose subject CN is the first name and whose subject
/// alternative names are all `dns_names` followed by `ips`. Without any name
/// the certificate carries no subject alternative name extension at all.
pub fn identity_with_ips(dns_names: &[&str], ips: &[&str]) -> Identity {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    let common_name = dns_names.first().copied().unwrap_or("sslglue test");
    name.append_entry_by_nid(Nid::COMMONNAME, common_name).unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(30).unwrap())
        .unwrap();
    if !dns_names.is_empty() || !ips.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for dns_name in dns_names {
            let _ = san.dns(dns_name);
        }
        for ip in ips {
            let _ = san.ip(ip);
        }
        let san = san.build(&builder.x509v3_context(None, None)).unwrap();
        builder.append_extension(san).unwrap();
    }
    builder.sign(&key, MessageDigest::sha256()).unwrap();

    Identity {
        cert: builder.build(),
        key,
    }
}

pub fn identity(dns_names: &[&str]) -> Identity {
    identity_with_ips(dns_names, &[])
}

/// A server-side acceptor builder serving `id`. Callers register callbacks
/// on `builder.as_ptr()` before building.
pub fn acceptor_builder(id: &Identity) -> SslAcceptorBuilder {
    let mut builder = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    builder.set_certificate(&id.cert).unwrap();
    builder.set_private_key(&id.key).unwrap();
    builder.check_private_key().unwrap();
    builder
}

/// A plain server context serving `id`, used as a domain context.
pub fn server_context(id: &Identity) -> SslContext {
    let mut builder = SslContext::builder(SslMethod::tls_server()).unwrap();
    builder.set_certificate(&id.cert).unwrap();
    builder.set_private_key(&id.key).unwrap();
    builder.check_private_key().unwrap();
    builder.build()
}

/// What a loopback handshake produced.
pub struct HandshakeOutcome {
    /// The DNS names of the certificate the client received, or the client's
    /// handshake error.
    pub client: Result<Vec<String>, String>,
    pub server_ok: bool,
}

/// Runs one handshake over a loopback TCP connection. The client does not
/// verify the server and sends `servername` as SNI if given.
pub fn handshake(acceptor: SslAcceptor, servername: Option<&str>) -> HandshakeOutcome {
    let listener = TcpListener::bind((CONST_SERVER_ADDR, 0)).expect("Bind error");
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (sock, _) = listener.accept().expect("Accept error");
        acceptor.accept(sock).is_ok()
    });

    let sock = TcpStream::connect(addr).expect("Connect error");
    let mut connector = SslConnector::builder(SslMethod::tls()).unwrap();
    connector.set_verify(SslVerifyMode::NONE);
    let connector = connector.build();
    let mut config = connector.configure().unwrap();
    config.set_verify_hostname(false);
    config.set_use_server_name_indication(servername.is_some());
    let client = match config.connect(servername.unwrap_or("localhost"), sock) {
        Ok(stream) => {
            let cert = stream
                .ssl()
                .peer_certificate()
                .expect("no peer certificate");
            let names = unsafe { subject_alt_dns_names(cert.as_ptr()) }
                .expect("malformed peer certificate")
                .unwrap_or_default();
            Ok(names)
        }
        Err(e) => Err(e.to_string()),
    };

    let server_ok = server.join().expect("server thread panicked");
    HandshakeOutcome { client, server_ok }
}
