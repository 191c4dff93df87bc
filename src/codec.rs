//! Versioned-qualifier codec.
//!
//! Qualifier-versioned cells are stored under
//! `[qualifier][0x00][i64 big-endian version]`. Inverting policies store
//! `i64::MAX - version` instead, which makes the newest version sort first
//! under the store's byte-lexicographic qualifier order, so a plain limited
//! scan returns the latest versions without server-side comparison.

use std::mem::size_of;

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::model::VersioningModel;

/// Separator between the base qualifier (or salt) and what follows it.
pub const DELIMITER: &[u8] = &[0];

const VERSION_WIDTH: usize = size_of::<i64>();

/// Errors raised while encoding or decoding versions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// `i64::MAX - version` is undefined for negative input.
    #[error(
        "overflow computing version number: {model:?} subtracts from i64::MAX for ordering, \
         but {value} is negative"
    )]
    Overflow { value: i64, model: VersioningModel },
    /// The stored qualifier cannot hold the delimiter and a version suffix.
    #[error("malformed stored qualifier ({len} bytes) for versioning model {model:?}")]
    Malformed { len: usize, model: VersioningModel },
}

/// A stored qualifier split into its logical parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedQualifier {
    /// Qualifier without the version suffix.
    pub qualifier: Bytes,
    /// Logical version, `None` for unversioned policies.
    pub version: Option<i64>,
}

/// Number the store actually carries for `version` under `model`: the
/// version itself, or its inversion.
pub fn version_indicator(version: i64, model: VersioningModel) -> Result<i64, CodecError> {
    if !model.is_inverting() {
        return Ok(version);
    }
    if version < 0 {
        return Err(CodecError::Overflow {
            value: version,
            model,
        });
    }
    Ok(i64::MAX - version)
}

/// Append `version` to `original` as laid out for qualifier-embedded
/// versioning.
pub fn append_version_to_qual(
    original: &[u8],
    version: i64,
    model: VersioningModel,
) -> Result<Bytes, CodecError> {
    let indicator = version_indicator(version, model)?;
    Ok(join_indicator(original, indicator))
}

fn join_indicator(original: &[u8], indicator: i64) -> Bytes {
    let mut out = BytesMut::with_capacity(original.len() + DELIMITER.len() + VERSION_WIDTH);
    out.extend_from_slice(original);
    out.extend_from_slice(DELIMITER);
    out.put_i64(indicator);
    out.freeze()
}

/// Split a stored qualifier (and, for timestamp versioning, the cell
/// timestamp) back into the logical qualifier and version.
///
/// Stored input is trusted: any raw indicator that decodes cleanly is
/// accepted even if this codec could not have produced it.
pub fn parse_qualifier_separate_version(
    stored: &Bytes,
    stored_ts: i64,
    model: VersioningModel,
) -> Result<ParsedQualifier, CodecError> {
    let (qualifier, raw) = if model.is_qualifier_based() {
        let split = stored.len() as isize - VERSION_WIDTH as isize;
        if split < DELIMITER.len() as isize {
            return Err(CodecError::Malformed {
                len: stored.len(),
                model,
            });
        }
        let split = split as usize;
        let mut suffix = [0u8; VERSION_WIDTH];
        suffix.copy_from_slice(&stored[split..]);
        let base_len = split - DELIMITER.len();
        (stored.slice(..base_len), Some(i64::from_be_bytes(suffix)))
    } else if model.is_timestamp_based() {
        (stored.clone(), Some(stored_ts))
    } else {
        (stored.clone(), None)
    };

    let version = match raw {
        Some(raw) if model.is_inverting() => {
            if raw < 0 {
                return Err(CodecError::Overflow { value: raw, model });
            }
            Some(i64::MAX - raw)
        }
        other => other,
    };

    Ok(ParsedQualifier { qualifier, version })
}

/// Whether `stored` has the shape `base ‖ 0x00 ‖ 8 bytes`.
pub(crate) fn is_versioned_form_of(stored: &[u8], base: &[u8]) -> bool {
    stored.len() == base.len() + DELIMITER.len() + VERSION_WIDTH
        && stored.starts_with(base)
        && &stored[base.len()..base.len() + DELIMITER.len()] == DELIMITER
}

/// Inclusive physical qualifier bounds covering logical versions
/// `lower..=upper` of `base`. Both versions must be non-negative, since
/// big-endian order only matches numeric order for them.
pub(crate) fn qualifier_bounds(
    base: &[u8],
    lower: i64,
    upper: i64,
    model: VersioningModel,
) -> Result<(Bytes, Bytes), CodecError> {
    let lo = append_version_to_qual(base, lower, model)?;
    let hi = append_version_to_qual(base, upper, model)?;
    if model.is_inverting() {
        Ok((hi, lo))
    } else {
        Ok((lo, hi))
    }
}

/// Inclusive physical bounds covering every version suffix of `base`.
pub(crate) fn qualifier_span(base: &[u8]) -> (Bytes, Bytes) {
    let mut lo = BytesMut::with_capacity(base.len() + DELIMITER.len() + VERSION_WIDTH);
    lo.extend_from_slice(base);
    lo.extend_from_slice(DELIMITER);
    let mut hi = lo.clone();
    lo.put_bytes(0x00, VERSION_WIDTH);
    hi.put_bytes(0xff, VERSION_WIDTH);
    (lo.freeze(), hi.freeze())
}

/// Inclusive timestamp bounds covering logical versions `lower..=upper`
/// under a timestamp-embedded policy.
pub(crate) fn timestamp_bounds(
    lower: i64,
    upper: i64,
    model: VersioningModel,
) -> Result<(i64, i64), CodecError> {
    let lo = version_indicator(lower, model)?;
    let hi = version_indicator(upper, model)?;
    Ok((lo.min(hi), lo.max(hi)))
}
