//! Content hash functions used by providers
//!
//! Hashing is a pluggable concern: each provider picks the algorithm that
//! matches what its remote side reports, so local and remote hashes compare
//! directly.

use serde::{Deserialize, Serialize};

/// Supported content hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
	/// MD5, the hash Google Drive reports as `md5Checksum`
	Md5,
	/// BLAKE3, used for filesystem-backed remotes
	Blake3,
}

impl ChecksumAlgorithm {
	/// Hash `data` and return the lowercase hex digest
	pub fn digest(self, data: &[u8]) -> String {
		match self {
			ChecksumAlgorithm::Md5 => md5_hex(data),
			ChecksumAlgorithm::Blake3 => blake3_hex(data),
		}
	}
}

/// Lowercase hex MD5 digest
pub fn md5_hex(data: &[u8]) -> String {
	format!("{:x}", md5::compute(data))
}

/// Lowercase hex BLAKE3 digest
pub fn blake3_hex(data: &[u8]) -> String {
	hex::encode(blake3::hash(data).as_bytes())
}


// vim: ts=4
