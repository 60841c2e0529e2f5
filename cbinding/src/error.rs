// Licensed under the Apache-2.0 license

//! Status codes returned across the C ABI

use wsaes_session::ProtocolError;

/// Call completed
pub const WSAES_SUCCESS: i32 = 0;

/// Invalid argument, length or mode, or a failure with no OS error number
pub const WSAES_FAIL: i32 = -1;

/// Map a session error onto the C status convention: the `errno` of the
/// failing channel operation when there is one, `-1` otherwise.
pub fn status_code(err: &ProtocolError) -> i32 {
    match err {
        ProtocolError::TransportFailure(transport) => transport.errno().unwrap_or(WSAES_FAIL),
        _ => WSAES_FAIL,
    }
}
