/*
 * Copyright (c) 2019-2021, Yiming Jing
 * Copyright (c) 2017-2019, The MesaLink Authors
 * All rights reserved.
 */

//! # sslglue - macro-free C glue for OpenSSL
//!
//! Parts of the OpenSSL API are only reachable through C preprocessor
//! macros: the `sk_GENERAL_NAME_*` family is generated by `DEFINE_STACK_OF`
//! and `SSL_CTX_set_tlsext_servername_callback` expands to a
//! `SSL_CTX_callback_ctrl` call. A foreign function interface that can only
//! bind real symbols cannot call them. sslglue exports those operations as
//! plain C functions, each one forwarding straight into OpenSSL:
//!
//! * `sslCtxSetTlsExtServernameCallback` - register an SNI callback and its
//!   argument on an `SSL_CTX`
//! * `skGeneralNamePopFree` - free a `STACK_OF(GENERAL_NAME)` and its
//!   elements
//! * `skGeneralNameValue` / `skGeneralNameNum` - indexed access into such a
//!   stack
//!
//! On the Rust side the same operations are available with ownership made
//! explicit: closures as SNI callbacks, an owning `GeneralNames` stack, and
//! a `DomainRouter` which switches a handshake over to the `SSL_CTX` whose
//! certificate matches the requested server name.
//!
//! OpenSSL 1.1.0 or newer is required.

#![deny(trivial_numeric_casts, unused_qualifications)]
#![deny(anonymous_parameters, unused_import_braces, unused_results, warnings)]

use libc::c_int;
use openssl_sys as ffi;

#[doc(hidden)]
pub(self) const MAGIC_SIZE: usize = 4;

use lazy_static::lazy_static;
lazy_static! {
    #[doc(hidden)]
    pub(self) static ref MAGIC: [u8; MAGIC_SIZE] = {
        ffi::init();
        let mut number = [0u8; MAGIC_SIZE];
        if unsafe { ffi::RAND_bytes(number.as_mut_ptr(), MAGIC_SIZE as c_int) } == 1 {
            number
        } else {
            panic!("RAND_bytes error");
        }
    };
}

#[doc(hidden)]
pub(crate) trait OpaquePointerGuard {
    fn check_magic(&self) -> bool;
}

#[macro_use]
mod macros;

#[macro_use]
mod error_san;

/// The ssl module is the counterpart of the OpenSSL ssl library.
pub mod libssl;

#[cfg(feature = "error_strings")]
fn init_logger() {
    let _ = env_logger::try_init();
}

#[cfg(not(feature = "error_strings"))]
fn init_logger() {}

/// `sslglue_init_logger` turns on debugging output of the Rust helpers. The
/// output is filtered with the `RUST_LOG` environment variable. Calling it
/// more than once is harmless.
///
/// ```c
/// #include <sslglue/glue.h>
///
/// void sslglue_init_logger(void);
/// ```
#[no_mangle]
pub extern "C" fn sslglue_init_logger() {
    init_logger();
}
