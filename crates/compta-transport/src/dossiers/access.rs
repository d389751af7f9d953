//! Capabilities handed to the core by the boundary layer.
//!
//! The admin secret comparison and the "are you sure?" prompt belong to whoever drives the
//! core. The core only demands proof that they happened.

/// Checks the shared admin secret and hands out capabilities.
#[derive(Clone)]
pub struct AdminGate {
    secret: String,
}

impl AdminGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn authorize(&self, candidate: &str) -> Result<AdminCapability, AccessDenied> {
        if !self.secret.is_empty() && candidate == self.secret {
            Ok(AdminCapability { _sealed: () })
        } else {
            Err(AccessDenied)
        }
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate").finish_non_exhaustive()
    }
}

/// Proof that the admin secret was presented. Only [`AdminGate::authorize`] creates one.
#[derive(Debug)]
pub struct AdminCapability {
    _sealed: (),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("admin secret rejected")]
pub struct AccessDenied;

/// Answer to the confirmation prompt shown before a destructive operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Refused,
}

impl Confirmation {
    pub const fn from_flag(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Refused
        }
    }
}
