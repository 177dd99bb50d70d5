use std::collections::HashMap;

use convo_storage::s3::{GENERATION_METADATA_KEY, generation_from_metadata};
use convo_storage::{Generation, StorageError};

fn meta(value: &str) -> HashMap<String, String> {
    HashMap::from([(GENERATION_METADATA_KEY.to_string(), value.to_string())])
}

#[test]
fn missing_metadata_is_first_generation() {
    assert_eq!(generation_from_metadata("k", None).unwrap(), Generation::new(1));
    let empty = HashMap::new();
    assert_eq!(generation_from_metadata("k", Some(&empty)).unwrap(), Generation::new(1));
}

#[test]
fn metadata_generation_is_parsed() {
    assert_eq!(generation_from_metadata("k", Some(&meta("42"))).unwrap(), Generation::new(42));
    assert_eq!(generation_from_metadata("k", Some(&meta(" 7 "))).unwrap(), Generation::new(7));
}

#[test]
fn garbage_generation_is_rejected() {
    for raw in ["abc", "0", "-3", ""] {
        assert!(matches!(
            generation_from_metadata("k", Some(&meta(raw))),
            Err(StorageError::InvalidGeneration { .. })
        ));
    }
}
