/*
 * Copyright (c) 2019-2021, Yiming Jing
 * Copyright (c) 2017-2019, The MesaLink Authors
 * All rights reserved.
 */

use libc::{c_char, c_ulong, size_t};
use openssl_sys as ffi;
use std::ffi::CStr;
use std::fmt;
use thiserror::Error as ThisError;

#[derive(ThisError, Clone, Debug)]
pub enum Error {
    #[error("NULL pointer")]
    NullPointer,
    #[error("Malformed objects")]
    MalformedObject,
    #[error("Paniked at FFI boundary")]
    Panic,
    #[error("OpenSSL error: {0}")]
    Ssl(#[from] ErrorStack),
}

#[doc(hidden)]
pub(crate) type InnerResult<T> = Result<T, Error>;

/// One entry of OpenSSL's per-thread error queue.
#[derive(Clone, Debug, PartialEq)]
pub struct SslErrorEntry {
    pub code: c_ulong,
    pub reason: String,
}

/// The errors OpenSSL recorded on the current thread, oldest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErrorStack(Vec<SslErrorEntry>);

impl ErrorStack {
    /// Drains the current thread's OpenSSL error queue.
    pub fn get() -> ErrorStack {
        let mut entries = Vec::new();
        loop {
            let code = unsafe { ffi::ERR_get_error() };
            if code == 0 {
                break;
            }
            entries.push(SslErrorEntry {
                code,
                reason: error_string(code),
            });
        }
        ErrorStack(entries)
    }

    pub fn errors(&self) -> &[SslErrorEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ErrorStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no OpenSSL error recorded");
        }
        for (i, entry) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(&entry.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorStack {}

// Exported by libcrypto but not bound by openssl-sys.
extern "C" {
    fn ERR_error_string_n(e: c_ulong, buf: *mut c_char, len: size_t);
}

fn error_string(code: c_ulong) -> String {
    let mut buf: [c_char; 256] = [0; 256];
    unsafe {
        ERR_error_string_n(code, buf.as_mut_ptr(), buf.len());
        CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned()
    }
}

/// Empties the current thread's OpenSSL error queue.
pub fn clear_error() {
    unsafe { ffi::ERR_clear_error() }
}
