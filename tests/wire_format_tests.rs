//! Byte-exact checks of the wire format.
//!
//! Scalars are written inside a top-level array so that no field name sits
//! between the tag and the payload; `payload_of` strips the array's tag and
//! length prefix.

use dson::{
    from_slice, DsonBinaryReader, DsonBinaryWriter, DsonReader, DsonType, DsonValue, DsonWriter,
    Error, ExtDateTime, ObjectLitePtr, ObjectPtr, Timestamp, WireType,
};

fn payload_of<F>(write: F) -> Vec<u8>
where
    F: FnOnce(&mut DsonBinaryWriter<Vec<u8>>),
{
    let mut writer = DsonBinaryWriter::new(Vec::new());
    writer.write_start_array(None).unwrap();
    write(&mut writer);
    writer.write_end_array().unwrap();
    let bytes = writer.into_inner().unwrap();
    assert_eq!(bytes[0], 0xF0);
    assert_eq!(
        u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize,
        bytes.len() - 5
    );
    bytes[5..].to_vec()
}

#[test]
fn test_int32_wire_types() {
    let varint = payload_of(|w| w.write_int32(None, -1, WireType::Varint).unwrap());
    let mut expected = vec![0x08];
    expected.extend_from_slice(&[0xFF; 9]);
    expected.push(0x01);
    assert_eq!(varint, expected);

    let uint = payload_of(|w| w.write_int32(None, 300, WireType::Uint).unwrap());
    assert_eq!(uint, [0x09, 0xAC, 0x02]);

    let sint = payload_of(|w| w.write_int32(None, -2, WireType::Sint).unwrap());
    assert_eq!(sint, [0x0A, 0x03]);

    let fixed = payload_of(|w| w.write_int32(None, 1, WireType::Fixed).unwrap());
    assert_eq!(fixed, [0x0B, 0x01, 0x00, 0x00, 0x00]);
}

#[test]
fn test_int64_wire_types() {
    let fixed = payload_of(|w| w.write_int64(None, -1, WireType::Fixed).unwrap());
    assert_eq!(fixed, [0x13, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);

    let sint = payload_of(|w| w.write_int64(None, i64::MIN, WireType::Sint).unwrap());
    assert_eq!(sint[0], 0x12);
    assert_eq!(sint.len(), 11);
}

#[test]
fn test_float_and_double_trimming() {
    assert_eq!(
        payload_of(|w| w.write_float(None, 0.1).unwrap()),
        [0x18, 0xCD, 0xCC, 0xCC, 0x3D]
    );
    assert_eq!(
        payload_of(|w| w.write_double(None, 2.5).unwrap()),
        [0x26, 0x04, 0x40]
    );
    assert_eq!(
        payload_of(|w| w.write_double(None, 0.0).unwrap()),
        [0x26, 0x00, 0x00]
    );
}

#[test]
fn test_small_scalars() {
    assert_eq!(payload_of(|w| w.write_bool(None, false).unwrap()), [0x28]);
    assert_eq!(payload_of(|w| w.write_bool(None, true).unwrap()), [0x29]);
    assert_eq!(payload_of(|w| w.write_null(None).unwrap()), [0x38]);
    assert_eq!(
        payload_of(|w| w.write_string(None, "hi").unwrap()),
        [0x30, 0x02, b'h', b'i']
    );
    assert_eq!(
        payload_of(|w| w.write_binary(None, &[1, 2]).unwrap()),
        [0x40, 0x02, 0x01, 0x02]
    );
}

#[test]
fn test_pointer_optional_parts() {
    let plain = ObjectPtr::new("p");
    assert_eq!(
        payload_of(|w| w.write_pointer(None, &plain).unwrap()),
        [0x58, 0x01, b'p']
    );

    let full = ObjectPtr::new("p").with_namespace("n").with_policy(9);
    assert_eq!(
        payload_of(|w| w.write_pointer(None, &full).unwrap()),
        [0x5D, 0x01, b'p', 0x01, b'n', 0x09]
    );

    let lite = ObjectLitePtr::new(300);
    assert_eq!(
        payload_of(|w| w.write_lite_pointer(None, &lite).unwrap()),
        [0x60, 0xAC, 0x02]
    );
}

#[test]
fn test_datetime_layout() {
    let dt = ExtDateTime::new(10, 5, -3600, ExtDateTime::MASK_DATE | ExtDateTime::MASK_TIME);
    assert_eq!(
        payload_of(|w| w.write_datetime(None, &dt).unwrap()),
        [0x6B, 0x0A, 0x05, 0x9F, 0x38]
    );

    let ts = Timestamp::new(1, 2);
    assert_eq!(
        payload_of(|w| w.write_timestamp(None, &ts).unwrap()),
        [0x70, 0x01, 0x02]
    );
}

#[test]
fn test_named_field_follows_tag() {
    let mut writer = DsonBinaryWriter::new(Vec::new());
    writer.write_start_object(None).unwrap();
    writer.write_start_object(Some("o")).unwrap();
    writer.write_end_object().unwrap();
    writer.write_end_object().unwrap();
    assert_eq!(
        writer.into_inner().unwrap(),
        [0xF8, 0x07, 0, 0, 0, 0xF8, 0x01, b'o', 0, 0, 0, 0]
    );
}

#[test]
fn test_unknown_ordinal() {
    match from_slice::<String>(&[0x48]) {
        Err(Error::InvalidFormat { position, .. }) => assert_eq!(position, 0),
        other => panic!("Expected InvalidFormat, got {:?}", other),
    }
}

#[test]
fn test_end_of_object_tag_in_stream() {
    match from_slice::<String>(&[0xF0, 0x01, 0, 0, 0, 0x00]) {
        Err(Error::InvalidFormat { position, .. }) => assert_eq!(position, 5),
        other => panic!("Expected InvalidFormat, got {:?}", other),
    }
}

#[test]
fn test_truncated_input() {
    assert!(matches!(
        from_slice::<String>(&[0xF0, 0x02, 0, 0, 0, 0x08, 0xFF]),
        Err(Error::UnexpectedEof { .. })
    ));
    assert!(matches!(
        from_slice::<String>(&[0xF8, 0x10, 0, 0, 0]),
        Err(Error::UnexpectedEof { .. })
    ));
    assert!(matches!(
        from_slice::<String>(&[0xF8, 0x01]),
        Err(Error::UnexpectedEof { .. })
    ));
}

#[test]
fn test_child_longer_than_parent() {
    let bytes = [0xF0, 0x05, 0, 0, 0, 0xF0, 0x01, 0, 0, 0, 0x38];
    assert!(matches!(
        from_slice::<String>(&bytes),
        Err(Error::InvalidFormat { .. })
    ));
}

#[test]
fn test_value_as_bytes_requires_container() {
    let bytes = [0xF0, 0x01, 0, 0, 0, 0x38];
    let mut reader = DsonBinaryReader::new(&bytes);
    reader.read_start_array(None).unwrap();
    assert!(matches!(
        reader.read_value_as_bytes(None),
        Err(Error::InvalidTopLevelType(DsonType::Null))
    ));
}

#[test]
fn test_empty_stream_has_no_values() {
    let values: Vec<DsonValue> = from_slice(&[]).unwrap();
    assert!(values.is_empty());

    let mut reader = DsonBinaryReader::new(&[]);
    assert_eq!(reader.read_type().unwrap(), DsonType::EndOfObject);
    assert_eq!(reader.read_type().ok(), None);
}
