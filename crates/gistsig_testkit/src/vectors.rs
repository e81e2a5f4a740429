//! Key encoding test vectors.
//!
//! Each vector is an encoded key together with the signature length of the
//! index that wrote it. Valid vectors must survive decode and re-encode
//! byte for byte; invalid ones must be rejected with the recorded message.

use gistsig_codec::{Decode, Encode, KeyLayout};
use gistsig_core::GistKey;
use serde::{Deserialize, Serialize};

/// A key encoding test vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Signature length of the index, in bytes.
    pub siglen: usize,
    /// Encoded key (hex).
    pub input_hex: String,
    /// Expected re-encoding (hex).
    pub expected_hex: String,
    /// Expected error message (if decoding should fail).
    pub expected_error: Option<String>,
}

impl TestVector {
    fn valid(id: &str, description: &str, siglen: usize, hex: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            siglen,
            input_hex: hex.into(),
            expected_hex: hex.into(),
            expected_error: None,
        }
    }

    fn invalid(id: &str, description: &str, siglen: usize, hex: &str, error: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            siglen,
            input_hex: hex.into(),
            expected_hex: String::new(),
            expected_error: Some(error.into()),
        }
    }

    /// Decodes the input and checks the outcome against the vector.
    pub fn check(&self) -> Result<(), String> {
        let input = hex_decode(&self.input_hex).ok_or_else(|| format!("{}: bad hex", self.id))?;
        let decoded = GistKey::decode(&input, &KeyLayout::new(self.siglen));
        match (&self.expected_error, decoded) {
            (None, Ok(key)) => {
                let encoded = key.encode().map_err(|e| format!("{}: {e}", self.id))?;
                if hex_encode(&encoded) == self.expected_hex {
                    Ok(())
                } else {
                    Err(format!(
                        "{}: re-encoded as {}, expected {}",
                        self.id,
                        hex_encode(&encoded),
                        self.expected_hex
                    ))
                }
            }
            (Some(expected), Err(err)) if err.to_string() == *expected => Ok(()),
            (Some(expected), Err(err)) => Err(format!("{}: got \"{err}\", expected \"{expected}\"", self.id)),
            (Some(expected), Ok(key)) => Err(format!("{}: decoded {key:?}, expected \"{expected}\"", self.id)),
            (None, Err(err)) => Err(format!("{}: {err}", self.id)),
        }
    }
}

/// Encodes bytes as lowercase hexadecimal.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decodes hexadecimal, ignoring whitespace. Returns `None` on malformed input.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.replace([' ', '\n', '\r'], "");
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}

/// Well-formed keys of every form.
pub fn key_vectors() -> Vec<TestVector> {
    vec![
        TestVector::valid(
            "hstore_bitmap",
            "hstore a=>1, b=>NULL at siglen 4: bits 3, 23 and 25",
            4,
            "0c0000000200000008008002",
        ),
        TestVector::valid("empty_bitmap", "signature with no bits set", 4, "0c0000000200000000000000"),
        TestVector::valid(
            "tsvector_array",
            "tsvector 'cat dog' as sorted lexeme hashes",
            124,
            "100000000100000011d669de92848537",
        ),
        TestVector::valid("empty_array", "tsvector with no lexemes", 124, "0800000001000000"),
        TestVector::valid("all_true", "saturated signature without bounds", 16, "0800000006000000"),
        TestVector::valid(
            "ltree_leaf",
            "ltree leaf top.sci",
            8,
            "1a0000000800000012000000020000000300746f700300736369",
        ),
        TestVector::valid(
            "ltree_single_bound",
            "ltree internal key whose bounds coincide",
            4,
            "1e000000120000000804000012000000020000000300746f700300736369",
        ),
        TestVector::valid(
            "ltree_all_true_bounds",
            "saturated ltree internal key over [a, b.c]",
            4,
            "21000000060000000b000000010000000100610e00000002000000010062010063",
        ),
    ]
}

/// Keys a decoder must reject.
pub fn malformed_vectors() -> Vec<TestVector> {
    vec![
        TestVector::invalid(
            "unknown_flag",
            "flag bit outside the known set",
            4,
            "0800000020000000",
            "invalid key flags: 0x00000020",
        ),
        TestVector::invalid(
            "noright_without_bounds",
            "NORIGHT on a key that stores no bounds",
            4,
            "0800000016000000",
            "invalid key flags: 0x00000016",
        ),
        TestVector::invalid(
            "array_descending",
            "array hashes out of order",
            4,
            "10000000010000000500000003000000",
            "invalid key structure: array hashes are not strictly increasing",
        ),
        TestVector::invalid(
            "size_mismatch",
            "header longer than the value",
            4,
            "0c00000002000000",
            "size mismatch: header says 12 bytes, got 8",
        ),
        TestVector::invalid(
            "short_bitmap",
            "bitmap shorter than siglen",
            4,
            "0a000000020000000000",
            "unexpected end of input",
        ),
    ]
}

/// Generate all test vectors as JSON.
pub fn all_vectors_json() -> String {
    let vectors = AllTestVectors {
        keys: key_vectors(),
        malformed: malformed_vectors(),
    };

    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

#[derive(Debug, Serialize, Deserialize)]
struct AllTestVectors {
    keys: Vec<TestVector>,
    malformed: Vec<TestVector>,
}
