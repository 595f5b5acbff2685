/*
 * Copyright (c) 2019-2021, Yiming Jing
 * Copyright (c) 2017-2019, The MesaLink Authors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except
 * in compliance with the License. You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use super::err::Error;
use super::safestack::{GeneralNames, GENERAL_NAMES};
use bitflags::bitflags;
use libc::c_uint;
use openssl_sys as ffi;
use std::{ptr, str};

bitflags! {
    /// The `X509_CHECK_FLAG_*` flags of `X509_check_host`.
    #[derive(Default)]
    pub struct HostCheckFlags: c_uint {
        const ALWAYS_CHECK_SUBJECT = 0x01;
        const NO_WILDCARDS = 0x02;
        const NO_PARTIAL_WILDCARDS = 0x04;
        const MULTI_LABEL_WILDCARDS = 0x08;
        const SINGLE_LABEL_SUBDOMAINS = 0x10;
        const NEVER_CHECK_SUBJECT = 0x20;
    }
}

/// `X509_get_ext_d2i(x, NID_subject_alt_name)` - the subject alternative
/// names of a certificate, or `None` if it has no such extension.
///
/// # Safety
/// `x509_ptr` must be a valid `X509`.
pub unsafe fn subject_alt_names(x509_ptr: *const ffi::X509) -> Option<GeneralNames> {
    if x509_ptr.is_null() {
        return None;
    }
    let names = ffi::X509_get_ext_d2i(
        x509_ptr as *mut ffi::X509,
        ffi::NID_subject_alt_name,
        ptr::null_mut(),
        ptr::null_mut(),
    );
    GeneralNames::from_ptr(names as *mut GENERAL_NAMES)
}

/// The DNS entries of the subject alternative names, in certificate order.
///
/// Returns `Ok(None)` if the certificate has no subject alternative name
/// extension. A DNS entry with an embedded NUL or non UTF-8 bytes makes the
/// whole certificate malformed.
///
/// # Safety
/// `x509_ptr` must be a valid `X509`.
pub unsafe fn subject_alt_dns_names(
    x509_ptr: *const ffi::X509,
) -> Result<Option<Vec<String>>, Error> {
    let names = match subject_alt_names(x509_ptr) {
        Some(names) => names,
        None => return Ok(None),
    };
    let mut dns_names = Vec::new();
    for name in names.iter() {
        if let Some(raw) = name.dns_name() {
            if raw.contains(&0) {
                return Err(Error::MalformedObject);
            }
            let dns_name = str::from_utf8(raw).map_err(|_| Error::MalformedObject)?;
            dns_names.push(dns_name.to_owned());
        }
    }
    Ok(Some(dns_names))
}

/// `X509_check_host` - whether the certificate is valid for `host`.
///
/// # Safety
/// `x509_ptr` must be a valid `X509`.
pub unsafe fn check_host(
    x509_ptr: *const ffi::X509,
    host: &str,
    flags: HostCheckFlags,
) -> bool {
    if x509_ptr.is_null() || host.is_empty() {
        return false;
    }
    ffi::X509_check_host(
        x509_ptr as *mut ffi::X509,
        host.as_ptr() as *const _,
        host.len(),
        flags.bits(),
        ptr::null_mut(),
    ) == 1
}
