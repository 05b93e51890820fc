use dson::{
    dson, from_slice, from_slice_with_options, read_value, to_vec, to_vec_with_options,
    BinarySource, ContextPool, DsonArray, DsonBinaryReader, DsonBinaryWriter,
    DsonLiteBinaryReader, DsonLiteBinaryWriter, DsonObject, DsonOptions, DsonReader, DsonState,
    DsonTreeReader, DsonTreeWriter, DsonType, DsonValue, DsonWriter, Error, ExtDateTime,
    FieldNumber, ObjectLitePtr, ObjectPtr, Reader, Timestamp, WireType,
};
use std::sync::Arc;

fn scenario_a_bytes() -> Vec<u8> {
    let mut writer = DsonBinaryWriter::new(Vec::new());
    writer.write_start_object(None).unwrap();
    writer.write_int32(Some("x"), -1, WireType::Sint).unwrap();
    writer.write_double(Some("y"), 2.5).unwrap();
    writer.write_start_array(Some("z")).unwrap();
    writer.write_string(None, "a").unwrap();
    writer.write_null(None).unwrap();
    writer.write_end_array().unwrap();
    writer.write_end_object().unwrap();
    writer.into_inner().unwrap()
}

#[test]
fn test_buffered_out_of_order_fields() {
    let bytes = scenario_a_bytes();

    let mut reader = DsonTreeReader::from_bytes(&bytes, DsonOptions::default()).unwrap();
    reader.read_start_object(None).unwrap();
    assert_eq!(reader.read_double(Some("y")).unwrap(), 2.5);
    assert_eq!(reader.read_int32(Some("x")).unwrap(), -1);

    reader.read_start_array(Some("z")).unwrap();
    assert_eq!(reader.read_string(None).unwrap(), "a");
    reader.read_null(None).unwrap();
    assert_eq!(reader.read_type().unwrap(), DsonType::EndOfObject);
    reader.read_end_array().unwrap();

    assert_eq!(reader.read_type().unwrap(), DsonType::EndOfObject);
    reader.read_end_object().unwrap();
    assert_eq!(reader.read_type().unwrap(), DsonType::EndOfObject);
    assert_eq!(reader.state(), DsonState::EndOfFile);
}

#[test]
fn test_sequential_in_order_fields() {
    let bytes = scenario_a_bytes();

    let mut reader = DsonBinaryReader::new(&bytes);
    reader.read_start_object(None).unwrap();
    assert_eq!(reader.read_int32(Some("x")).unwrap(), -1);
    assert_eq!(reader.read_double(Some("y")).unwrap(), 2.5);
    assert_eq!(reader.read_type().unwrap(), DsonType::Array);
    assert_eq!(reader.read_name().unwrap(), "z");
    assert_eq!(reader.current_name().map(String::as_str), Some("z"));
    reader.read_start_array(None).unwrap();
    assert_eq!(reader.depth(), 2);
    reader.skip_to_end_of_object().unwrap();
    reader.read_end_array().unwrap();
    assert_eq!(reader.read_type().unwrap(), DsonType::EndOfObject);
    reader.read_end_object().unwrap();
}

#[test]
fn test_sequential_reader_rejects_out_of_order_name() {
    let bytes = scenario_a_bytes();

    let mut reader = DsonBinaryReader::new(&bytes);
    reader.read_start_object(None).unwrap();
    assert!(matches!(
        reader.read_double(Some("y")),
        Err(Error::NameMismatch { .. })
    ));
}

#[test]
fn test_float_drops_two_zero_bytes() {
    let mut writer = DsonBinaryWriter::new(Vec::new());
    writer.write_start_array(None).unwrap();
    writer.write_float(None, 1.0).unwrap();
    writer.write_end_array().unwrap();
    let bytes = writer.into_inner().unwrap();
    assert_eq!(bytes, [0xF0, 0x03, 0, 0, 0, 0x1A, 0x80, 0x3F]);

    let mut reader = DsonBinaryReader::new(&bytes);
    reader.read_start_array(None).unwrap();
    let value = reader.read_float(None).unwrap();
    assert_eq!(value.to_bits(), 1.0f32.to_bits());
}

#[test]
fn test_oversized_header_rejected_at_close() {
    let mut sink = Vec::new();
    {
        let mut writer = DsonBinaryWriter::new(&mut sink);
        writer.write_start_object(None).unwrap();
        writer.write_start_header().unwrap();
        writer
            .write_binary(Some("blob"), &vec![0xAB; 65_536])
            .unwrap();
        match writer.write_end_header() {
            Err(Error::OversizedHeader { size }) => assert!(size > 65_535),
            other => panic!("Expected OversizedHeader, got {:?}", other),
        }
    }
    assert!(sink.is_empty());
}

#[test]
fn test_header_at_exact_limit() {
    let mut writer = DsonBinaryWriter::new(Vec::new());
    writer.write_start_header().unwrap();
    // tag + "b" + three-byte length + payload = 65535
    writer.write_binary(Some("b"), &vec![0; 65_529]).unwrap();
    writer.write_end_header().unwrap();
    let bytes = writer.into_inner().unwrap();
    assert_eq!(&bytes[..3], &[0xE8, 0xFF, 0xFF]);
    assert_eq!(bytes.len(), 3 + 65_535);
}

#[test]
fn test_declared_length_shorter_than_body() {
    let bytes = [
        0xF0, 0x0A, 0, 0, 0, 0x30, 0x04, b'a', b'b', b'c', b'd', 0x30, 0x04, b'a', b'b', b'c',
        b'd',
    ];

    let mut reader = DsonBinaryReader::new(&bytes);
    reader.read_start_array(None).unwrap();
    assert_eq!(reader.read_string(None).unwrap(), "abcd");
    assert_eq!(reader.read_string(None).unwrap(), "abcd");
    assert_eq!(reader.read_type().unwrap(), DsonType::EndOfObject);
    match reader.read_end_array() {
        Err(Error::TrailingData { declared, consumed }) => {
            assert_eq!(declared, 10);
            assert_eq!(consumed, 12);
        }
        other => panic!("Expected TrailingData, got {:?}", other),
    }

    assert!(matches!(
        from_slice::<String>(&bytes),
        Err(Error::TrailingData { .. })
    ));
}

#[test]
fn test_reader_type_mismatch() {
    let bytes = to_vec(&[dson!({ "x": "text" })]).unwrap();
    let mut reader = DsonBinaryReader::new(&bytes);
    reader.read_start_object(None).unwrap();
    match reader.read_int32(Some("x")) {
        Err(Error::TypeMismatch { expected, found }) => {
            assert_eq!(expected, DsonType::Int32);
            assert_eq!(found, DsonType::String);
        }
        other => panic!("Expected TypeMismatch, got {:?}", other),
    }
}

#[test]
fn test_reader_state_errors() {
    let bytes = to_vec(&[dson!({ "x": 1 })]).unwrap();
    let mut reader = DsonBinaryReader::new(&bytes);
    assert!(matches!(reader.read_name(), Err(Error::State { .. })));
    assert!(matches!(reader.read_end_object(), Err(Error::Custom(_))));
    reader.read_start_object(None).unwrap();
    assert!(matches!(reader.read_end_object(), Err(Error::State { .. })));
    assert!(matches!(reader.read_end_array(), Err(Error::TypeMismatch { .. })));
}

#[test]
fn test_writer_state_errors() {
    let mut writer = DsonBinaryWriter::new(Vec::new());
    assert!(matches!(
        writer.write_string(None, "loose"),
        Err(Error::InvalidTopLevelType(DsonType::String))
    ));

    writer.write_start_object(None).unwrap();
    assert!(matches!(
        writer.write_int32(None, 1, WireType::Varint),
        Err(Error::State { .. })
    ));
    assert!(matches!(writer.write_end_array(), Err(Error::TypeMismatch { .. })));

    writer.write_name("a").unwrap();
    assert!(matches!(writer.write_name("b"), Err(Error::State { .. })));
    assert!(matches!(
        writer.write_int32(Some("b"), 1, WireType::Varint),
        Err(Error::NameMismatch { .. })
    ));
    assert!(matches!(writer.write_end_object(), Err(Error::State { .. })));
    writer.write_int32(Some("a"), 1, WireType::Varint).unwrap();
    writer.write_end_object().unwrap();
}

#[test]
fn test_header_inside_header_rejected() {
    let mut writer = DsonBinaryWriter::new(Vec::new());
    writer.write_start_header().unwrap();
    assert!(matches!(
        writer.write_start_header(),
        Err(Error::InvalidFormat { .. })
    ));

    // HEADER { HEADER { } }
    let bytes = [0xE8, 0x03, 0x00, 0xE8, 0x00, 0x00];
    assert!(matches!(
        from_slice::<String>(&bytes),
        Err(Error::InvalidFormat { .. })
    ));
}

#[test]
fn test_recursion_limit_on_encode() {
    let options = DsonOptions::new().with_recursion_limit(2);
    let mut writer = DsonBinaryWriter::with_options(Vec::new(), options.clone());
    writer.write_start_array(None).unwrap();
    writer.write_start_array(None).unwrap();
    assert!(matches!(
        writer.write_start_array(None),
        Err(Error::RecursionLimit { limit: 2 })
    ));

    let deep = dson!([[[]]]);
    assert!(matches!(
        to_vec_with_options(&[deep], options),
        Err(Error::RecursionLimit { .. })
    ));
}

#[test]
fn test_recursion_limit_on_decode() {
    let bytes = [0xF0, 0x0A, 0, 0, 0, 0xF0, 0x05, 0, 0, 0, 0xF0, 0, 0, 0, 0];
    let strict = DsonOptions::new().with_recursion_limit(2);
    assert!(matches!(
        from_slice_with_options::<String>(&bytes, strict),
        Err(Error::RecursionLimit { limit: 2 })
    ));

    let relaxed = DsonOptions::new().with_recursion_limit(3);
    let values: Vec<DsonValue> = from_slice_with_options(&bytes, relaxed).unwrap();
    assert_eq!(values, vec![dson!([[[]]])]);
}

#[test]
fn test_close_is_idempotent() {
    let bytes = to_vec(&[dson!({})]).unwrap();
    let mut reader = DsonBinaryReader::new(&bytes);
    reader.close();
    reader.close();
    assert_eq!(reader.state(), DsonState::EndOfFile);
    assert!(matches!(reader.read_type(), Err(Error::Closed)));

    let mut writer = DsonBinaryWriter::new(Vec::new());
    writer.write_start_object(None).unwrap();
    writer.close().unwrap();
    writer.close().unwrap();
    assert!(matches!(writer.write_start_object(None), Err(Error::Closed)));
    assert!(writer.into_inner().unwrap().is_empty());
}

#[test]
fn test_frames_return_to_pool() {
    let pool = Arc::new(ContextPool::<String>::new(8));
    let bytes = to_vec(&[dson!({ "a": [1, { "b": 2 }] })]).unwrap();

    let mut reader: DsonBinaryReader<'_> = Reader::with_source(
        BinarySource::new(&bytes),
        DsonOptions::default(),
        Arc::clone(&pool),
    );
    let value = read_value(&mut reader).unwrap();
    assert!(value.is_object());
    assert_eq!(pool.idle(), 3);

    reader.close();
    assert_eq!(pool.idle(), 4);
}

#[test]
fn test_lite_field_numbers() {
    let id = FieldNumber::new(1, 0).unwrap();
    let name = FieldNumber::new(2, 0).unwrap();
    let link = FieldNumber::new(3, 1).unwrap();
    let ptr = ObjectLitePtr::new(99).with_type(2);

    let mut writer = DsonLiteBinaryWriter::new(Vec::new());
    writer.write_start_object(None).unwrap();
    writer.write_int64(Some(&id), 1 << 40, WireType::Uint).unwrap();
    writer.write_string(Some(&name), "lite").unwrap();
    writer.write_lite_pointer(Some(&link), &ptr).unwrap();
    writer.write_end_object().unwrap();
    let bytes = writer.into_inner().unwrap();
    assert_eq!(bytes[5], 0x11);
    assert_eq!(bytes[6], 0x08);

    let mut reader = DsonLiteBinaryReader::new(&bytes);
    reader.read_start_object(None).unwrap();
    assert_eq!(reader.read_int64(Some(&id)).unwrap(), 1 << 40);
    assert_eq!(reader.read_string(Some(&name)).unwrap(), "lite");
    assert_eq!(reader.read_type().unwrap(), DsonType::LitePointer);
    assert_eq!(reader.read_name().unwrap(), link);
    assert_eq!(reader.read_lite_pointer(None).unwrap(), ptr);
}

#[test]
fn test_back_to_wait_start() {
    let bytes = to_vec(&[dson!({ "inner": { "v": 1 } })]).unwrap();
    let mut reader = DsonBinaryReader::new(&bytes);
    reader.read_start_object(None).unwrap();
    reader.read_start_object(Some("inner")).unwrap();
    reader.back_to_wait_start().unwrap();
    assert_eq!(reader.state(), DsonState::WaitStartObject);

    assert!(matches!(
        reader.read_start_array(None),
        Err(Error::TypeMismatch { .. })
    ));
    reader.read_start_object(None).unwrap();
    assert_eq!(reader.read_int32(Some("v")).unwrap(), 1);
}

#[test]
fn test_attachment_follows_frame() {
    let bytes = to_vec(&[dson!({ "x": 1 })]).unwrap();
    let mut reader = DsonBinaryReader::new(&bytes);
    reader.read_start_object(None).unwrap();
    assert!(reader.attach(Box::new(42u32)).is_none());
    assert_eq!(
        reader.attachment().and_then(|a| a.downcast_ref::<u32>()),
        Some(&42)
    );

    reader.skip_to_end_of_object().unwrap();
    reader.read_end_object().unwrap();
    assert!(reader.attachment().is_none());
}

#[test]
fn test_raw_bytes_passthrough() {
    let source = to_vec(&[dson!({ "keep": { "deep": [1, 2] }, "other": 5 })]).unwrap();
    let mut reader = DsonBinaryReader::new(&source);
    reader.read_start_object(None).unwrap();
    let raw = reader.read_value_as_bytes(Some("keep")).unwrap();
    assert_eq!(reader.read_int32(Some("other")).unwrap(), 5);

    let mut writer = DsonBinaryWriter::new(Vec::new());
    writer.write_start_object(None).unwrap();
    writer
        .write_value_bytes(Some("copy"), DsonType::Object, &raw)
        .unwrap();
    writer.write_end_object().unwrap();
    let out = writer.into_inner().unwrap();

    let values: Vec<DsonValue> = from_slice(&out).unwrap();
    assert_eq!(
        values[0].as_object().and_then(|o| o.get("copy")),
        Some(&dson!({ "deep": [1, 2] }))
    );
}

#[test]
fn test_peek_and_skip() {
    let bytes = to_vec(&[dson!({ "big": [1, 2, 3], "small": true })]).unwrap();
    let mut reader = DsonBinaryReader::new(&bytes);
    reader.read_start_object(None).unwrap();
    assert_eq!(reader.peek_type().unwrap(), DsonType::Array);
    assert_eq!(reader.read_type().unwrap(), DsonType::Array);
    reader.skip_name().unwrap();
    reader.skip_value().unwrap();
    assert!(reader.read_bool(Some("small")).unwrap());
}

#[test]
fn test_buffer_next_top_level_values() {
    let bytes = to_vec(&[dson!({ "a": 1, "b": 2 }), dson!([3])]).unwrap();
    let mut binary = DsonBinaryReader::new(&bytes);

    let mut first = DsonTreeReader::buffer_next(&mut binary, DsonOptions::default())
        .unwrap()
        .unwrap();
    first.read_start_object(None).unwrap();
    assert_eq!(first.read_int32(Some("b")).unwrap(), 2);
    assert_eq!(first.read_int32(Some("a")).unwrap(), 1);

    let mut second = DsonTreeReader::buffer_next(&mut binary, DsonOptions::default())
        .unwrap()
        .unwrap();
    second.read_start_array(None).unwrap();
    assert_eq!(second.read_int32(None).unwrap(), 3);

    assert!(DsonTreeReader::buffer_next(&mut binary, DsonOptions::default())
        .unwrap()
        .is_none());
}

#[test]
fn test_extended_scalars_round_trip() {
    let mut object = DsonObject::new();
    object.insert(
        "ptr".to_string(),
        DsonValue::from(
            ObjectPtr::new("user:1")
                .with_namespace("accounts")
                .with_type(3)
                .with_policy(1),
        ),
    );
    object.insert(
        "when".to_string(),
        DsonValue::from(ExtDateTime::new(1_700_003_600, 500, 3600, ExtDateTime::MASK_ALL)),
    );
    object.insert(
        "at".to_string(),
        DsonValue::from(Timestamp::new(-5, 999_999_999)),
    );
    object.insert("blob".to_string(), DsonValue::Binary(vec![0, 1, 255]));
    object.insert("big".to_string(), DsonValue::Int64(i64::MIN));
    object.insert("ratio".to_string(), DsonValue::Float(-0.3));
    let value = DsonValue::Object(object);

    let bytes = to_vec(&[value.clone()]).unwrap();
    let values: Vec<DsonValue> = from_slice(&bytes).unwrap();
    assert_eq!(values, vec![value]);
}

#[test]
fn test_tree_writer_matches_binary_writer() {
    let value = dson!({ "name": "Alice", "scores": [1, 2.5, null] });

    let mut tree = DsonTreeWriter::new();
    dson::write_value(&mut tree, None, &value).unwrap();
    let built = tree.into_values();
    assert_eq!(built, vec![value.clone()]);

    assert_eq!(to_vec(&built).unwrap(), to_vec(&[value]).unwrap());
}

#[test]
fn test_object_header_round_trip() {
    let mut object = DsonObject::new();
    object
        .header
        .insert("clsName".to_string(), DsonValue::from("Point"))
        .unwrap();
    object.insert("x".to_string(), DsonValue::Int32(1));
    let value = DsonValue::Object(object);

    let bytes = to_vec(&[value.clone()]).unwrap();
    // OBJECT, length, HEADER tag directly after the prefix
    assert_eq!(bytes[5], 0xE8);

    let mut reader = DsonBinaryReader::new(&bytes);
    reader.read_start_object(None).unwrap();
    assert_eq!(reader.read_type().unwrap(), DsonType::Header);
    reader.read_start_header().unwrap();
    assert_eq!(reader.read_string(Some("clsName")).unwrap(), "Point");
    assert_eq!(reader.read_type().unwrap(), DsonType::EndOfObject);
    reader.read_end_header().unwrap();
    assert_eq!(reader.read_int32(Some("x")).unwrap(), 1);
}

#[test]
fn test_serde_json_bridge() {
    let value = dson!({ "a": 1, "b": [true, null], "c": "text" });
    let json = serde_json::to_value(&value).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "a": 1, "b": [true, null], "c": "text" })
    );

    let parsed: DsonValue = serde_json::from_str(r#"{"n": 5000000000, "f": 1.5, "s": 3}"#).unwrap();
    let object = parsed.as_object().unwrap();
    assert_eq!(object.get("n"), Some(&DsonValue::Int64(5_000_000_000)));
    assert_eq!(object.get("f"), Some(&DsonValue::Double(1.5)));
    assert_eq!(object.get("s"), Some(&DsonValue::Int32(3)));
}

fn typed_object_bytes() -> Vec<u8> {
    let mut object = DsonObject::new();
    object
        .header
        .insert("clsName".to_string(), DsonValue::from("Point"))
        .unwrap();
    object.insert("x".to_string(), DsonValue::Int32(1));
    object.insert("y".to_string(), DsonValue::Int32(2));
    to_vec(&[dson!({ "shape": (DsonValue::Object(object)) })]).unwrap()
}

// Reads the type name from the header, hands the container back, then
// materializes it from the body.
fn read_typed_shape<R: DsonReader<String>>(reader: &mut R) -> (String, i32, i32) {
    reader.read_start_object(None).unwrap();
    reader.read_start_object(Some("shape")).unwrap();
    assert_eq!(reader.read_type().unwrap(), DsonType::Header);
    reader.read_start_header().unwrap();
    let class = reader.read_string(Some("clsName")).unwrap();
    assert_eq!(reader.read_type().unwrap(), DsonType::EndOfObject);
    reader.read_end_header().unwrap();

    reader.back_to_wait_start().unwrap();
    assert_eq!(reader.state(), DsonState::WaitStartObject);
    reader.read_start_object(None).unwrap();
    let x = reader.read_int32(Some("x")).unwrap();
    let y = reader.read_int32(Some("y")).unwrap();
    assert_eq!(reader.read_type().unwrap(), DsonType::EndOfObject);
    reader.read_end_object().unwrap();
    assert_eq!(reader.read_type().unwrap(), DsonType::EndOfObject);
    reader.read_end_object().unwrap();
    (class, x, y)
}

#[test]
fn test_back_to_wait_start_after_header() {
    let bytes = typed_object_bytes();
    let expected = ("Point".to_string(), 1, 2);

    let mut binary = DsonBinaryReader::new(&bytes);
    assert_eq!(read_typed_shape(&mut binary), expected);

    let mut buffered = DsonTreeReader::from_bytes(&bytes, DsonOptions::default()).unwrap();
    assert_eq!(read_typed_shape(&mut buffered), expected);
}

#[test]
fn test_back_to_wait_start_needs_type_state() {
    let bytes = typed_object_bytes();
    let mut reader = DsonBinaryReader::new(&bytes);
    reader.read_start_object(None).unwrap();
    assert_eq!(reader.read_type().unwrap(), DsonType::Object);
    assert!(matches!(reader.back_to_wait_start(), Err(Error::State { .. })));
}

#[test]
fn test_second_header_rejected() {
    let mut writer = DsonBinaryWriter::new(Vec::new());
    writer.write_start_object(None).unwrap();
    writer.write_start_header().unwrap();
    writer.write_string(Some("clsName"), "Point").unwrap();
    writer.write_end_header().unwrap();
    assert!(matches!(
        writer.write_start_header(),
        Err(Error::InvalidFormat { .. })
    ));

    let mut writer = DsonTreeWriter::new();
    writer.write_start_array(None).unwrap();
    writer.write_null(None).unwrap();
    assert!(matches!(
        writer.write_start_header(),
        Err(Error::InvalidFormat { .. })
    ));
}

#[test]
fn test_passthrough_keeps_wire_types() {
    let mut writer = DsonBinaryWriter::new(Vec::new());
    writer.write_start_object(None).unwrap();
    writer.write_start_array(Some("values")).unwrap();
    writer.write_int32(None, -3, WireType::Sint).unwrap();
    writer.write_int32(None, 7, WireType::Fixed).unwrap();
    writer.write_end_array().unwrap();
    writer.write_end_object().unwrap();
    let bytes = writer.into_inner().unwrap();

    let mut sequential = DsonBinaryReader::new(&bytes);
    sequential.read_start_object(None).unwrap();
    let expected = sequential.read_value_as_bytes(Some("values")).unwrap();

    let mut buffered = DsonTreeReader::from_bytes(&bytes, DsonOptions::default()).unwrap();
    buffered.read_start_object(None).unwrap();
    assert_eq!(buffered.read_value_as_bytes(Some("values")).unwrap(), expected);

    let mut source = DsonBinaryReader::new(&bytes);
    let mut next = DsonTreeReader::buffer_next(&mut source, DsonOptions::default())
        .unwrap()
        .unwrap();
    next.read_start_object(None).unwrap();
    assert_eq!(next.read_value_as_bytes(Some("values")).unwrap(), expected);
    assert!(DsonTreeReader::buffer_next(&mut source, DsonOptions::default())
        .unwrap()
        .is_none());
}

#[test]
fn test_passthrough_honors_recursion_limit() {
    let mut deep = DsonValue::Array(DsonArray::new());
    for _ in 0..99 {
        deep = DsonValue::Array(DsonArray::with_values(vec![deep]));
    }
    let options = DsonOptions::default().with_recursion_limit(200);
    let root = DsonValue::Array(DsonArray::with_values(vec![deep]));
    let bytes = to_vec_with_options(&[root.clone()], options.clone()).unwrap();

    let mut sequential = DsonBinaryReader::with_options(&bytes, options.clone());
    sequential.read_start_array(None).unwrap();
    let expected = sequential.read_value_as_bytes(None).unwrap();

    let mut buffered = DsonTreeReader::from_bytes(&bytes, options.clone()).unwrap();
    buffered.read_start_array(None).unwrap();
    assert_eq!(buffered.read_value_as_bytes(None).unwrap(), expected);

    let mut replayed = DsonTreeReader::with_options(vec![root.clone()], options);
    replayed.read_start_array(None).unwrap();
    assert_eq!(replayed.read_value_as_bytes(None).unwrap(), expected);

    let mut limited = DsonTreeReader::new(vec![root]);
    limited.read_start_array(None).unwrap();
    assert!(matches!(
        limited.read_value_as_bytes(None),
        Err(Error::RecursionLimit { limit: 64 })
    ));
}
