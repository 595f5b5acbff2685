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

use libc::{c_int, c_void};
use openssl_sys as ffi;
use std::marker::PhantomData;
use std::{mem, slice};

// ---------------------------------------
// STACK for GENERAL_NAME
// ---------------------------------------

/// An OpenSSL STACK_OF(GENERAL_NAME) object, a.k.a. `GENERAL_NAMES`
#[allow(non_camel_case_types)]
pub type GENERAL_NAMES = ffi::stack_st_GENERAL_NAME;

// OPENSSL_sk_pop_free takes a `void (*)(void *)` element destructor.
unsafe extern "C" fn free_general_name(name: *mut c_void) {
    ffi::GENERAL_NAME_free(name as *mut ffi::GENERAL_NAME);
}

/// `skGeneralNamePopFree` - frees every element of sk with
/// `GENERAL_NAME_free` and then frees sk itself. If sk is NULL nothing is
/// done. After this call sk is no longer valid.
///
/// ```c
/// #include <sslglue/glue.h>
///
/// void skGeneralNamePopFree(GENERAL_NAMES *sk);
/// ```
///
/// # Safety
/// This API is Rust-unsafe because it frees a pointer provided by users.
/// sk must be NULL or an owned stack which is not used afterwards.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn skGeneralNamePopFree(stack_ptr: *mut GENERAL_NAMES) {
    ffi::OPENSSL_sk_pop_free(stack_ptr as *mut ffi::OPENSSL_STACK, Some(free_general_name));
}

/// `skGeneralNameValue` - returns element idx in sk, where idx starts at
/// zero. If idx is out of range then NULL is returned. The element is still
/// owned by sk.
///
/// ```c
/// #include <sslglue/glue.h>
///
/// GENERAL_NAME *skGeneralNameValue(const GENERAL_NAMES *sk, int idx);
/// ```
///
/// # Safety
/// This API is Rust-unsafe because it dereferences a pointer provided by users
/// Use with caution!
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn skGeneralNameValue(
    stack_ptr: *const GENERAL_NAMES,
    index: c_int,
) -> *mut ffi::GENERAL_NAME {
    ffi::OPENSSL_sk_value(stack_ptr as *const ffi::OPENSSL_STACK, index) as *mut ffi::GENERAL_NAME
}

/// `skGeneralNameNum` - returns the number of elements in sk or -1 if sk is
/// NULL.
///
/// ```c
/// #include <sslglue/glue.h>
///
/// int skGeneralNameNum(const GENERAL_NAMES *sk);
/// ```
///
/// # Safety
/// This API is Rust-unsafe because it dereferences a pointer provided by users
/// Use with caution!
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn skGeneralNameNum(stack_ptr: *const GENERAL_NAMES) -> c_int {
    ffi::OPENSSL_sk_num(stack_ptr as *const ffi::OPENSSL_STACK)
}

/// An owned STACK_OF(GENERAL_NAME). Dropping it frees the stack and all of
/// its elements exactly once.
pub struct GeneralNames {
    stack: *mut GENERAL_NAMES,
}

unsafe impl Send for GeneralNames {}
unsafe impl Sync for GeneralNames {}

impl GeneralNames {
    /// Takes ownership of a stack, e.g. the one returned by
    /// `X509_get_ext_d2i`. Returns `None` for NULL.
    ///
    /// # Safety
    /// `stack_ptr` must be NULL or an owned, valid stack of GENERAL_NAME
    /// which nobody else frees.
    pub unsafe fn from_ptr(stack_ptr: *mut GENERAL_NAMES) -> Option<GeneralNames> {
        if stack_ptr.is_null() {
            None
        } else {
            Some(GeneralNames { stack: stack_ptr })
        }
    }

    pub fn as_ptr(&self) -> *const GENERAL_NAMES {
        self.stack
    }

    /// Gives the stack back to C. The caller becomes responsible for
    /// `skGeneralNamePopFree`.
    pub fn into_ptr(self) -> *mut GENERAL_NAMES {
        let stack = self.stack;
        mem::forget(self);
        stack
    }

    pub fn len(&self) -> usize {
        let num = unsafe { skGeneralNameNum(self.stack) };
        num.max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows element `index`; `None` if it is out of range.
    pub fn get(&self, index: usize) -> Option<GeneralNameRef<'_>> {
        let index = c_int::try_from(index).ok()?;
        let name_ptr = unsafe { skGeneralNameValue(self.stack, index) };
        if name_ptr.is_null() {
            None
        } else {
            Some(GeneralNameRef {
                name: name_ptr,
                _stack: PhantomData,
            })
        }
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            names: self,
            index: 0,
        }
    }
}

impl Drop for GeneralNames {
    fn drop(&mut self) {
        unsafe { skGeneralNamePopFree(self.stack) };
    }
}

impl<'a> IntoIterator for &'a GeneralNames {
    type Item = GeneralNameRef<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

pub struct Iter<'a> {
    names: &'a GeneralNames,
    index: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = GeneralNameRef<'a>;

    fn next(&mut self) -> Option<GeneralNameRef<'a>> {
        let name = self.names.get(self.index)?;
        self.index += 1;
        Some(name)
    }
}

/// The kind of a subject alternative name entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneralNameKind {
    Email,
    Dns,
    DirName,
    Uri,
    IpAddress,
    Other(c_int),
}

impl From<c_int> for GeneralNameKind {
    fn from(type_: c_int) -> GeneralNameKind {
        match type_ {
            ffi::GEN_EMAIL => GeneralNameKind::Email,
            ffi::GEN_DNS => GeneralNameKind::Dns,
            ffi::GEN_DIRNAME => GeneralNameKind::DirName,
            ffi::GEN_URI => GeneralNameKind::Uri,
            ffi::GEN_IPADD => GeneralNameKind::IpAddress,
            other => GeneralNameKind::Other(other),
        }
    }
}

/// A GENERAL_NAME borrowed from a `GeneralNames` stack.
#[derive(Clone, Copy)]
pub struct GeneralNameRef<'a> {
    name: *mut ffi::GENERAL_NAME,
    _stack: PhantomData<&'a GeneralNames>,
}

impl<'a> GeneralNameRef<'a> {
    pub fn as_ptr(&self) -> *const ffi::GENERAL_NAME {
        self.name
    }

    pub fn kind(&self) -> GeneralNameKind {
        GeneralNameKind::from(unsafe { (*self.name).type_ })
    }

    /// The raw IA5String of a DNS entry. It is not checked for embedded NULs.
    pub fn dns_name(&self) -> Option<&'a [u8]> {
        match self.kind() {
            GeneralNameKind::Dns => Some(self.string_value()),
            _ => None,
        }
    }

    /// The 4 or 16 address bytes of an IP address entry.
    pub fn ip_address(&self) -> Option<&'a [u8]> {
        match self.kind() {
            GeneralNameKind::IpAddress => Some(self.string_value()),
            _ => None,
        }
    }

    // Only valid for the kinds whose union member is an ASN1_STRING.
    fn string_value(&self) -> &'a [u8] {
        unsafe {
            let value = (*self.name).d as *const ffi::ASN1_STRING;
            let data = ffi::ASN1_STRING_get0_data(value);
            let len = ffi::ASN1_STRING_length(value);
            if data.is_null() || len <= 0 {
                return &[];
            }
            slice::from_raw_parts(data, len as usize)
        }
    }
}
