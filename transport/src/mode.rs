// Licensed under the Apache-2.0 license

//! Accelerator mode register values

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Operation selector sent to the accelerator before any data transfer.
///
/// The discriminants are the values carried by the control request.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
pub enum Mode {
    Reset = 0,
    Encrypt = 1,
    Decrypt = 2,
    SetIv = 3,
    SetKey = 4,
}

impl Mode {
    /// Modes that move cipher data rather than register contents
    pub fn is_data_mode(self) -> bool {
        matches!(self, Mode::Encrypt | Mode::Decrypt)
    }
}
