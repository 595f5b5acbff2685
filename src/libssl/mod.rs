/*
 * Copyright (c) 2019-2021, Yiming Jing
 * Copyright (c) 2017-2019, The MesaLink Authors
 * All rights reserved.
 */

/// Error type of the Rust helpers and access to OpenSSL's error queue.
#[macro_use]
pub mod err;

/// SNI callback registration.
/// Please also refer to the header file at sslglue/glue.h
pub mod ssl;

/// STACK_OF(GENERAL_NAME) accessors.
/// Please also refer to the header file at sslglue/glue.h
pub mod safestack;

/// Subject alternative names and host name checks.
pub mod x509;

/// Selection of a per-domain `SSL_CTX` from the SNI server name.
pub mod sni;

use libc::c_int;
use openssl_sys as ffi;

/// Return values of a servername callback, as defined by OpenSSL.
pub const SSL_TLSEXT_ERR_OK: c_int = ffi::SSL_TLSEXT_ERR_OK;
pub const SSL_TLSEXT_ERR_ALERT_WARNING: c_int = ffi::SSL_TLSEXT_ERR_ALERT_WARNING;
pub const SSL_TLSEXT_ERR_ALERT_FATAL: c_int = ffi::SSL_TLSEXT_ERR_ALERT_FATAL;
pub const SSL_TLSEXT_ERR_NOACK: c_int = ffi::SSL_TLSEXT_ERR_NOACK;
