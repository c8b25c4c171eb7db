// JSON helpers shared by hashing, signing and the on-disk store
use crate::error::{LedgerError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Compact JSON with the field order fixed by the type definition.
///
/// Map-valued fields come out key-sorted since `serde_json::Map` is a
/// `BTreeMap` without the `preserve_order` feature.
pub fn to_canonical_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    serde_json::to_string(data)
        .map_err(|e| LedgerError::Serialization(format!("Serialization failed: {e}")))
}

pub fn to_pretty_json<T: Serialize + ?Sized>(data: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(data)
        .map_err(|e| LedgerError::Serialization(format!("Serialization failed: {e}")))
}

pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| LedgerError::Serialization(format!("Deserialization failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        id: u64,
        ratio: f64,
        values: Vec<i32>,
    }

    #[test]
    fn test_canonical_json_is_stable() {
        let data = TestData {
            id: 42,
            ratio: 1750723200.123456,
            values: vec![1, 2, 3],
        };
        let first = to_canonical_json(&data).unwrap();
        let second = to_canonical_json(&data).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, r#"{"id":42,"ratio":1750723200.123456,"values":[1,2,3]}"#);
    }

    #[test]
    fn test_float_survives_round_trip() {
        let data = TestData {
            id: 1,
            ratio: 1760433123.4567891,
            values: vec![],
        };
        let bytes = to_pretty_json(&data).unwrap();
        let back: TestData = from_json(&bytes).unwrap();
        assert_eq!(data.ratio.to_bits(), back.ratio.to_bits());
    }

    #[test]
    fn test_from_json_invalid_data() {
        let result: Result<TestData> = from_json(b"{not json");
        assert!(result.is_err());
    }
}
