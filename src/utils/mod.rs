//! Miscellaneous utils
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::path::Path;

use crate::constants::BLOB_SUFFIX_LENGTH;

pub(crate) mod pass;

/// Name a blob after the upload time, keeping the extension of the original file.
///
/// The name is `<unix millis>-<random suffix><.ext>`. The suffix keeps two uploads in the same
/// millisecond apart. Extensions that aren't plain alphanumerics are dropped.
pub(crate) fn blob_name(file_name: &str, uploaded_at: DateTime<Utc>) -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(BLOB_SUFFIX_LENGTH)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    format!("{}-{}{}", uploaded_at.timestamp_millis(), suffix, extension)
}

/// Render a number in scientific notation, with as many digits as it takes to round-trip and an
/// explicit exponent sign, e.g. `1.23e-3` or `5e+0`.
pub(crate) fn to_exponential(value: f64) -> String {
    if value.is_nan() {
        return "NaN".into();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if value == 0.0 {
        // covers -0.0 as well
        return "0e+0".into();
    }

    let formatted = format!("{:e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted,
    }
}
