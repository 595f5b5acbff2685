/*
 * Copyright (c) 2019-2021, Yiming Jing
 * Copyright (c) 2017-2019, The MesaLink Authors
 * All rights reserved.
 */

use crate::libssl::err::{Error, InnerResult};
use crate::OpaquePointerGuard;

/// Turns a pointer to a Rust-owned object that made a round trip through C
/// back into a reference, provided it still carries this process's magic.
pub(crate) fn sanitize_ptr_for_ref<'a, T>(ptr: *const T) -> InnerResult<&'a T>
where
    T: OpaquePointerGuard,
{
    if ptr.is_null() {
        return Err(Error::NullPointer);
    }
    let obj_ref: &T = unsafe { &*ptr };
    if obj_ref.check_magic() {
        Ok(obj_ref)
    } else {
        Err(Error::MalformedObject)
    }
}

/// OpenSSL handles are not Rust-owned and have no magic; only null can be
/// rejected.
pub(crate) fn sanitize_foreign_ptr<T>(ptr: *mut T) -> InnerResult<*mut T> {
    if ptr.is_null() {
        Err(Error::NullPointer)
    } else {
        Ok(ptr)
    }
}
