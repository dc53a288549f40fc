//! Passcode generation

use rand::Rng;
use subtle::ConstantTimeEq;

/// Number of digits in every generated passcode.
pub const PASSCODE_DIGITS: usize = 6;

const PASSCODE_SPACE: u32 = 1_000_000;

/// A short, human-typed numeric secret.
///
/// The `Debug` implementation never prints the digits, so a passcode can sit
/// inside structured log fields without leaking.
#[derive(Clone, PartialEq, Eq)]
pub struct Passcode(String);

impl Passcode {
    /// Generate a fresh passcode, uniformly distributed over all
    /// [`PASSCODE_DIGITS`]-digit values (zero-padded).
    pub fn generate() -> Self {
        let code = rand::thread_rng().gen_range(0..PASSCODE_SPACE);
        Self(format!("{code:0>width$}", width = PASSCODE_DIGITS))
    }

    /// The digits, for handing to whoever delivers the passcode.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Compares in constant time, so timing never reveals a correct prefix.
    pub(crate) fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl std::fmt::Debug for Passcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Passcode").field(&"******").finish()
    }
}

#[cfg(test)]
impl From<&str> for Passcode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}
