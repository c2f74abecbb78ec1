//! Password-related utilities.

use lazy_static::lazy_static;
use libreauth::pass::{Algorithm, HashBuilder, Hasher};

pub(crate) const PWD_ALGORITHM: Algorithm = Algorithm::Argon2;
pub(crate) const PWD_SCHEME_VERSION: usize = 1;
// any non-empty password is accepted; the upper bound keeps Argon2 input sane
pub(crate) const PWD_MIN_LEN: usize = 1;
pub(crate) const PWD_MAX_LEN: usize = 1024;

// If the Hasher changes, make sure to increment PWD_SCHEME_VERSION
lazy_static! {
    pub(crate) static ref HASHER: Hasher = {
        HashBuilder::new()
            .algorithm(PWD_ALGORITHM)
            .version(PWD_SCHEME_VERSION)
            .min_len(PWD_MIN_LEN)
            .max_len(PWD_MAX_LEN)
            .finalize()
            .expect("password hasher config is invalid")
    };
}

/// Check `password` against a stored PHC hash.
///
/// The length bounds are read back from the hash itself, so a hash made by `HASHER` accepts the
/// same passwords it was built with. A hash that can't be parsed never matches.
pub(crate) fn verify(phc: &str, password: &str) -> bool {
    match HashBuilder::from_phc(phc) {
        Ok(checker) => checker.is_valid(password),
        Err(e) => {
            tracing::warn!("Stored password hash is unreadable: {:?}", e);
            false
        }
    }
}
