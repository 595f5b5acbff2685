/*
 * Copyright (c) 2019-2021, Yiming Jing
 * Copyright (c) 2017-2019, The MesaLink Authors
 * All rights reserved.
 */

//! # Synopsis
//! This sub-module registers servername (SNI) callbacks on an OpenSSL
//! `SSL_CTX`.
//!
//! # Usage
//! C callers and other foreign function interfaces use
//! `sslCtxSetTlsExtServernameCallback`, which stores the user argument on
//! the context and then installs the callback, exactly like the two OpenSSL
//! macros `SSL_CTX_set_tlsext_servername_arg` and
//! `SSL_CTX_set_tlsext_servername_callback` would.
//!
//! Rust callers use `ServerNameCallback::register` with a closure. The
//! closure is boxed, the box becomes the callback argument, and a
//! monomorphised trampoline turns the raw `SSL *` into an `SslSession`. The
//! returned guard keeps the context alive and the closure allocated; dropping
//! it unregisters the callback.

use super::err::{Error, ErrorStack, InnerResult};
use super::{SSL_TLSEXT_ERR_ALERT_FATAL, SSL_TLSEXT_ERR_ALERT_WARNING};
use super::{SSL_TLSEXT_ERR_NOACK, SSL_TLSEXT_ERR_OK};
use crate::error_san::*;
use crate::{OpaquePointerGuard, MAGIC, MAGIC_SIZE};
use libc::{c_int, c_void};
use openssl_sys as ffi;
use std::ffi::CStr;
use std::marker::PhantomData;
use std::ptr;

/// TLS alert sent when the requested server name is not served.
pub const SSL_AD_UNRECOGNIZED_NAME: c_int = ffi::SSL_AD_UNRECOGNIZED_NAME;

/// TLS alert sent when a Rust callback fails or panics.
pub const SSL_AD_INTERNAL_ERROR: c_int = 80;

/// The C signature OpenSSL expects from a servername callback.
pub type RawServernameCallback =
    unsafe extern "C" fn(ssl: *mut ffi::SSL, al: *mut c_int, arg: *mut c_void) -> c_int;

/// `sslCtxSetTlsExtServernameCallback` - sets arg as the servername callback
/// argument of ctx and then cb as its servername callback. OpenSSL calls cb
/// with arg during every handshake on an SSL created from ctx.
///
/// ```c
/// #include <sslglue/glue.h>
///
/// void sslCtxSetTlsExtServernameCallback(SSL_CTX *ctx,
///         int (*cb)(SSL *ssl, int *al, void *arg), void *arg);
/// ```
///
/// # Safety
/// This API is Rust-unsafe because it dereferences a pointer provided by users
/// and stores another one. arg must stay valid as long as ctx may call cb.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn sslCtxSetTlsExtServernameCallback(
    ctx_ptr: *mut ffi::SSL_CTX,
    callback: Option<RawServernameCallback>,
    arg: *mut c_void,
) {
    let _ = ffi::SSL_CTX_set_tlsext_servername_arg(ctx_ptr, arg);
    let _ = ffi::SSL_CTX_set_tlsext_servername_callback__fixed_rust(ctx_ptr, callback);
}

/// Why a servername callback did not accept the ClientHello.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SniError {
    /// Continue the handshake without acknowledging the server name.
    NoAck,
    /// Send the given alert as a warning and continue.
    AlertWarning(c_int),
    /// Abort the handshake with the given alert.
    AlertFatal(c_int),
}

/// The `SSL` object a servername callback is invoked for.
pub struct SslSession<'a> {
    ssl: *mut ffi::SSL,
    _ssl: PhantomData<&'a mut ffi::SSL>,
}

impl<'a> SslSession<'a> {
    /// # Safety
    /// `ssl_ptr` must be a valid `SSL` for the whole lifetime `'a`.
    pub unsafe fn from_ptr(ssl_ptr: *mut ffi::SSL) -> SslSession<'a> {
        SslSession {
            ssl: ssl_ptr,
            _ssl: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *mut ffi::SSL {
        self.ssl
    }

    /// The host name the client sent, if any and if it is valid UTF-8.
    pub fn servername(&self) -> Option<&str> {
        unsafe {
            let name_ptr = ffi::SSL_get_servername(self.ssl, ffi::TLSEXT_NAMETYPE_host_name);
            if name_ptr.is_null() {
                return None;
            }
            CStr::from_ptr(name_ptr).to_str().ok()
        }
    }

    /// The `SSL_CTX` currently in use. Borrowed.
    pub fn ssl_ctx(&self) -> *mut ffi::SSL_CTX {
        unsafe { ffi::SSL_get_SSL_CTX(self.ssl) }
    }

    /// Switches the session over to another context, e.g. one holding the
    /// certificate for the requested host.
    ///
    /// # Safety
    /// `ctx_ptr` must be a valid `SSL_CTX`. OpenSSL takes its own reference.
    pub unsafe fn set_ssl_ctx(&mut self, ctx_ptr: *mut ffi::SSL_CTX) -> Result<(), Error> {
        let ctx_ptr = sanitize_foreign_ptr(ctx_ptr)?;
        if ffi::SSL_set_SSL_CTX(self.ssl, ctx_ptr).is_null() {
            return Err(Error::Ssl(ErrorStack::get()));
        }
        Ok(())
    }
}

// `magic` must stay the first field: the trampoline reads it before it
// knows the pointer is one of ours.
#[repr(C)]
struct ServerNameState<F> {
    magic: [u8; MAGIC_SIZE],
    callback: F,
}

impl<F> OpaquePointerGuard for ServerNameState<F> {
    fn check_magic(&self) -> bool {
        self.magic == *MAGIC
    }
}

unsafe fn drop_state<F>(state: *mut c_void) {
    drop(Box::from_raw(state as *mut ServerNameState<F>));
}

/// A Rust closure registered as the servername callback of an `SSL_CTX`.
///
/// The guard holds a reference on the context. A context has a single
/// servername callback; registering another one replaces it, and dropping
/// any guard clears whichever callback is installed.
pub struct ServerNameCallback {
    ctx: *mut ffi::SSL_CTX,
    state: *mut c_void,
    drop_state: unsafe fn(*mut c_void),
}

unsafe impl Send for ServerNameCallback {}
unsafe impl Sync for ServerNameCallback {}

impl ServerNameCallback {
    /// Installs `callback` as the servername callback of `ctx_ptr`.
    ///
    /// # Safety
    /// `ctx_ptr` must be a valid `SSL_CTX`.
    pub unsafe fn register<F>(
        ctx_ptr: *mut ffi::SSL_CTX,
        callback: F,
    ) -> Result<ServerNameCallback, Error>
    where
        F: Fn(&mut SslSession<'_>) -> Result<(), SniError> + Send + Sync + 'static,
    {
        let ctx_ptr = sanitize_foreign_ptr(ctx_ptr)?;
        if ffi::SSL_CTX_up_ref(ctx_ptr) != 1 {
            return Err(Error::Ssl(ErrorStack::get()));
        }
        let state = Box::new(ServerNameState {
            magic: *MAGIC,
            callback,
        });
        let state = Box::into_raw(state) as *mut c_void;
        sslCtxSetTlsExtServernameCallback(ctx_ptr, Some(raw_servername::<F>), state);
        log::debug!("servername callback registered on SSL_CTX {:p}", ctx_ptr);
        Ok(ServerNameCallback {
            ctx: ctx_ptr,
            state,
            drop_state: drop_state::<F>,
        })
    }

    pub fn ssl_ctx(&self) -> *mut ffi::SSL_CTX {
        self.ctx
    }
}

impl Drop for ServerNameCallback {
    fn drop(&mut self) {
        unsafe {
            sslCtxSetTlsExtServernameCallback(self.ctx, None, ptr::null_mut());
            ffi::SSL_CTX_free(self.ctx);
            (self.drop_state)(self.state);
        }
        log::debug!("servername callback removed from SSL_CTX {:p}", self.ctx);
    }
}

unsafe extern "C" fn raw_servername<F>(
    ssl_ptr: *mut ffi::SSL,
    al: *mut c_int,
    arg: *mut c_void,
) -> c_int
where
    F: Fn(&mut SslSession<'_>) -> Result<(), SniError> + Send + Sync + 'static,
{
    check_inner_result!(inner_raw_servername::<F>(ssl_ptr, al, arg), {
        if !al.is_null() {
            *al = SSL_AD_INTERNAL_ERROR;
        }
        SSL_TLSEXT_ERR_ALERT_FATAL
    })
}

unsafe fn inner_raw_servername<F>(
    ssl_ptr: *mut ffi::SSL,
    al: *mut c_int,
    arg: *mut c_void,
) -> InnerResult<c_int>
where
    F: Fn(&mut SslSession<'_>) -> Result<(), SniError> + Send + Sync + 'static,
{
    let state = sanitize_ptr_for_ref(arg as *const ServerNameState<F>)?;
    let mut session = SslSession::from_ptr(sanitize_foreign_ptr(ssl_ptr)?);
    let (ret, alert) = match (state.callback)(&mut session) {
        Ok(()) => (SSL_TLSEXT_ERR_OK, None),
        Err(SniError::NoAck) => (SSL_TLSEXT_ERR_NOACK, None),
        Err(SniError::AlertWarning(alert)) => (SSL_TLSEXT_ERR_ALERT_WARNING, Some(alert)),
        Err(SniError::AlertFatal(alert)) => (SSL_TLSEXT_ERR_ALERT_FATAL, Some(alert)),
    };
    if let Some(alert) = alert {
        if !al.is_null() {
            *al = alert;
        }
    }
    Ok(ret)
}
