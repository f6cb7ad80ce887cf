//! Deterministic content hashing for minted task names.
//!
//! Every node the planner emits is named `<operation>-<token>` where the
//! token is a 128-bit digest of the operation's logical inputs. Identical
//! logical operations therefore mint identical names -- duplicate planning
//! calls collapse onto the same graph nodes -- while distinct inputs are
//! collision-free for any practical graph size.

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// 128-bit hex token of `value`'s canonical serialized form.
///
/// Map keys are serialized in sorted order, so logically equal inputs hash
/// equally regardless of construction order.
///
/// # Errors
///
/// If `value` cannot be serialized (non-finite floats, non-string map keys).
pub fn tokenize<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let bytes = serde_json::to_vec(value).context("tokenize: unserializable input")?;
    let digest = Sha256::digest(&bytes);
    Ok(digest[..16].iter().map(|b| format!("{b:02x}")).collect())
}
