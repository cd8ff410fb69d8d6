use serde_pickle::{DeOptions, Value};
use std::path::Path;
use tracing::debug;

use super::error::FetcherError;

/// A pickled label, passed through untouched.
///
/// `value` is a best effort decode. Pickles the decoder cannot handle (numpy arrays
/// sharing memoized globals, for one) come through as `Value::None`, and `raw` always
/// holds the file so consumers with a richer unpickler can decode it themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub raw: Box<[u8]>,
    pub value: Value,
    decoded: bool,
}

impl Label {
    /// Only a failure to read the file is an error.
    pub fn load(path: &Path) -> Result<Label, FetcherError> {
        let raw = std::fs::read(path)?;
        let label = Self::from_bytes(raw);
        if !label.is_decoded() {
            debug!("Label {} kept as raw bytes only", path.display());
        }
        Ok(label)
    }

    pub fn from_bytes(raw: Vec<u8>) -> Label {
        // Python 2 strings stay as bytes, unknown classes decode to None
        let options = DeOptions::new().replace_unresolved_globals();
        let value = match serde_pickle::value_from_slice(&raw, options) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Label pickle not decodable: {}", e);
                None
            }
        };
        Label {
            raw: raw.into_boxed_slice(),
            decoded: value.is_some(),
            value: value.unwrap_or(Value::None),
        }
    }

    /// False when `value` is a placeholder for an undecodable pickle.
    pub fn is_decoded(&self) -> bool {
        self.decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_pickle::{HashableValue, SerOptions};
    use std::collections::BTreeMap;

    #[test]
    fn decodes_nested_label() {
        let mut dict = BTreeMap::new();
        dict.insert(
            HashableValue::String("points".to_string()),
            Value::List(vec![Value::F64(0.5), Value::F64(-1.0)]),
        );
        dict.insert(HashableValue::String("id".to_string()), Value::I64(42));
        let value = Value::Dict(dict);
        let bytes = serde_pickle::value_to_vec(&value, SerOptions::new()).unwrap();

        let label = Label::from_bytes(bytes.clone());
        assert!(label.is_decoded());
        assert_eq!(label.value, value);
        assert_eq!(&*label.raw, bytes.as_slice());
    }

    #[test]
    fn truncated_pickle_keeps_raw_bytes() {
        // PROTO 2, EMPTY_DICT, then the stream ends before STOP
        let label = Label::from_bytes(b"\x80\x02}".to_vec());
        assert!(!label.is_decoded());
        assert_eq!(label.value, Value::None);
        assert_eq!(&*label.raw, b"\x80\x02}");
    }

    // Protocol 2 pickle of `[ndarray, ndarray]`: the second array reuses the
    // memoized `_reconstruct`, `ndarray` and `dtype` globals of the first
    const TWO_ARRAYS: &[u8] = b"\x80\x02\x5d\x71\x00\x28\x63\x6e\x75\x6d\x70\x79\x2e\x63\x6f\x72\x65\x2e\x6d\x75\x6c\x74\x69\x61\
          \x72\x72\x61\x79\x0a\x5f\x72\x65\x63\x6f\x6e\x73\x74\x72\x75\x63\x74\x0a\x71\x01\x63\x6e\x75\x6d\
          \x70\x79\x0a\x6e\x64\x61\x72\x72\x61\x79\x0a\x71\x02\x4b\x00\x85\x71\x03\x63\x5f\x63\x6f\x64\x65\
          \x63\x73\x0a\x65\x6e\x63\x6f\x64\x65\x0a\x71\x04\x58\x01\x00\x00\x00\x62\x71\x05\x58\x06\x00\x00\
          \x00\x6c\x61\x74\x69\x6e\x31\x71\x06\x86\x71\x07\x52\x71\x08\x87\x71\x09\x52\x71\x0a\x28\x4b\x01\
          \x4b\x01\x4b\x02\x86\x71\x0b\x63\x6e\x75\x6d\x70\x79\x0a\x64\x74\x79\x70\x65\x0a\x71\x0c\x58\x02\
          \x00\x00\x00\x66\x34\x71\x0d\x89\x88\x87\x71\x0e\x52\x71\x0f\x28\x4b\x03\x58\x01\x00\x00\x00\x3c\
          \x71\x10\x4e\x4e\x4e\x4a\xff\xff\xff\xff\x4a\xff\xff\xff\xff\x4b\x00\x74\x71\x11\x62\x89\x68\x04\
          \x58\x08\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x71\x12\x68\x06\x86\x71\x13\x52\x71\x14\x74\
          \x71\x15\x62\x68\x01\x68\x02\x68\x03\x68\x08\x87\x71\x16\x52\x71\x17\x28\x4b\x01\x68\x0b\x68\x0c\
          \x68\x0d\x89\x88\x87\x71\x18\x52\x71\x19\x68\x11\x62\x89\x68\x04\x58\x08\x00\x00\x00\x00\x00\x00\
          \x00\x00\x00\x00\x00\x71\x1a\x68\x06\x86\x71\x1b\x52\x71\x1c\x74\x71\x1d\x62\x65\x2e";

    #[test]
    fn label_with_two_numpy_arrays_loads() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chair_00.dat");
        std::fs::write(&path, TWO_ARRAYS).unwrap();

        let label = Label::load(&path).unwrap();
        assert_eq!(&*label.raw, TWO_ARRAYS);
        if !label.is_decoded() {
            assert_eq!(label.value, Value::None);
        }
    }

    #[test]
    fn missing_label_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Label::load(&dir.path().join("absent.dat")).unwrap_err();
        assert!(matches!(err, FetcherError::IoError(_)));
    }
}
