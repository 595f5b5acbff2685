/*
 * Copyright (c) 2019-2021, Yiming Jing
 * Copyright (c) 2017-2019, The MesaLink Authors
 * All rights reserved.
 */

//! # Synopsis
//! A server that hosts several domains keeps one `SSL_CTX` per domain
//! certificate. The `DomainRouter` is installed as the servername callback
//! of the default context and, for every ClientHello, moves the session over
//! to the domain context whose certificate covers the requested host.
//!
//! # Routing
//! * no server name requested: not acknowledged, the default context stays
//! * the current certificate covers the name: accepted as is
//! * otherwise the first added domain context whose certificate covers the
//!   name is switched in with `SSL_set_SSL_CTX`
//! * no match: not acknowledged, the default context stays

use super::err::{Error, ErrorStack};
use super::ssl::{ServerNameCallback, SniError, SslSession};
use super::x509::{check_host, HostCheckFlags};
use crate::error_san::*;
use openssl_sys as ffi;

/// An `SSL_CTX` serving one or more domains. Holds its own reference.
pub struct DomainContext {
    ctx: *mut ffi::SSL_CTX,
}

unsafe impl Send for DomainContext {}
unsafe impl Sync for DomainContext {}

impl DomainContext {
    /// # Safety
    /// `ctx_ptr` must be a valid `SSL_CTX`, normally with a certificate and
    /// private key loaded.
    pub unsafe fn from_ptr(ctx_ptr: *mut ffi::SSL_CTX) -> Result<DomainContext, Error> {
        let ctx_ptr = sanitize_foreign_ptr(ctx_ptr)?;
        if ffi::SSL_CTX_up_ref(ctx_ptr) != 1 {
            return Err(Error::Ssl(ErrorStack::get()));
        }
        Ok(DomainContext { ctx: ctx_ptr })
    }

    pub fn as_ptr(&self) -> *mut ffi::SSL_CTX {
        self.ctx
    }

    fn covers(&self, host: &str, flags: HostCheckFlags) -> bool {
        unsafe { certificate_covers(self.ctx, host, flags) }
    }
}

impl Drop for DomainContext {
    fn drop(&mut self) {
        unsafe { ffi::SSL_CTX_free(self.ctx) };
    }
}

unsafe fn certificate_covers(
    ctx_ptr: *mut ffi::SSL_CTX,
    host: &str,
    flags: HostCheckFlags,
) -> bool {
    if ctx_ptr.is_null() {
        return false;
    }
    check_host(ffi::SSL_CTX_get0_certificate(ctx_ptr), host, flags)
}

/// Selects a domain context from the SNI server name.
#[derive(Default)]
pub struct DomainRouter {
    domains: Vec<DomainContext>,
    host_flags: HostCheckFlags,
}

impl DomainRouter {
    pub fn new() -> DomainRouter {
        DomainRouter::default()
    }

    /// Flags passed to `X509_check_host` when matching a certificate.
    pub fn with_host_flags(mut self, flags: HostCheckFlags) -> DomainRouter {
        self.host_flags = flags;
        self
    }

    /// Adds a domain context. Contexts are tried in the order they were
    /// added.
    ///
    /// # Safety
    /// `ctx_ptr` must be a valid `SSL_CTX`.
    pub unsafe fn add_domain_ctx(&mut self, ctx_ptr: *mut ffi::SSL_CTX) -> Result<(), Error> {
        let domain = DomainContext::from_ptr(ctx_ptr)?;
        log::debug!("domain SSL_CTX {:p} added", domain.as_ptr());
        self.domains.push(domain);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Routes one session. This is the body of the installed callback.
    pub fn route(&self, session: &mut SslSession<'_>) -> Result<(), SniError> {
        let host = match session.servername() {
            Some(host) => host.to_owned(),
            None => {
                log::debug!("no server name requested");
                return Err(SniError::NoAck);
            }
        };

        if unsafe { certificate_covers(session.ssl_ctx(), &host, self.host_flags) } {
            log::debug!("current certificate covers {}", host);
            return Ok(());
        }

        let domain = match self.domains.iter().find(|d| d.covers(&host, self.host_flags)) {
            Some(domain) => domain,
            None => {
                log::info!("no certificate covers {}", host);
                return Err(SniError::NoAck);
            }
        };

        match unsafe { session.set_ssl_ctx(domain.as_ptr()) } {
            Ok(()) => {
                log::debug!("switched to SSL_CTX {:p} for {}", domain.as_ptr(), host);
                Ok(())
            }
            Err(e) => {
                log::warn!("cannot switch SSL_CTX for {}: {}", host, e);
                Err(SniError::NoAck)
            }
        }
    }

    /// Installs the router as the servername callback of the default
    /// context `ctx_ptr`. The router lives as long as the returned guard.
    ///
    /// # Safety
    /// `ctx_ptr` must be a valid `SSL_CTX`.
    pub unsafe fn install(self, ctx_ptr: *mut ffi::SSL_CTX) -> Result<ServerNameCallback, Error> {
        ServerNameCallback::register(ctx_ptr, move |session| self.route(session))
    }
}
