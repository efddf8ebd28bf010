use bplist00::{Dictionary, Value};

fn document(body: &[&[u8]], trailer_tail: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"bplist00");
    for chunk in body {
        bytes.extend_from_slice(chunk);
    }
    bytes.extend_from_slice(trailer_tail);
    bytes
}

fn trailer(offset_size: u8, ref_size: u8, num_objects: u64, top_object: u64, offset_table_offset: u64) -> Vec<u8> {
    let mut bytes = vec![0u8; 6];
    bytes.push(offset_size);
    bytes.push(ref_size);
    bytes.extend_from_slice(&num_objects.to_be_bytes());
    bytes.extend_from_slice(&top_object.to_be_bytes());
    bytes.extend_from_slice(&offset_table_offset.to_be_bytes());
    bytes
}

#[test]
fn test_parse_top_level_false() {
    // object 0: false
    let object = &[0b0000_1000u8][..];
    let mut bytes = document(&[object], &[]);
    let offset_table_offset = bytes.len();
    bytes.push(8);
    bytes.extend_from_slice(&trailer(1, 1, 1, 0, offset_table_offset as u64));
    assert_eq!(bplist00::parse(&bytes).unwrap(), Value::Boolean(false));
}

#[test]
fn test_parse_top_level_integer() {
    // object 0: UInt16(1000)
    let object: Vec<u8> = {
        let mut v = vec![0b0001_0001u8];
        v.extend_from_slice(&1000u16.to_be_bytes());
        v
    };
    let mut bytes = document(&[&object], &[]);
    let offset_table_offset = bytes.len();
    bytes.push(8);
    bytes.extend_from_slice(&trailer(1, 1, 1, 0, offset_table_offset as u64));
    assert_eq!(bplist00::parse(&bytes).unwrap(), Value::Integer(1000));
}

#[test]
fn test_parse_top_level_ascii_string() {
    // object 0: AsciiString("hi")
    let object: &[u8] = &[0b0101_0010, b'h', b'i'];
    let mut bytes = document(&[object], &[]);
    let offset_table_offset = bytes.len();
    bytes.push(8);
    bytes.extend_from_slice(&trailer(1, 1, 1, 0, offset_table_offset as u64));
    assert_eq!(bplist00::parse(&bytes).unwrap(), Value::String("hi".into()));
}

#[test]
fn test_parse_array_of_mixed_scalars() {
    // object 0: array referencing objects 1 and 2
    // object 1: true
    // object 2: UInt8(5)
    let object0: &[u8] = &[0b1010_0010, 0x01, 0x02];
    let object1: &[u8] = &[0b0000_1001];
    let object2: &[u8] = &[0b0001_0000, 0x05];
    let mut bytes = document(&[object0, object1, object2], &[]);
    let offset_table_offset = bytes.len();
    bytes.push(8); // offset of object 0
    bytes.push(11); // offset of object 1
    bytes.push(12); // offset of object 2
    bytes.extend_from_slice(&trailer(1, 1, 3, 0, offset_table_offset as u64));

    let value = bplist00::parse(&bytes).unwrap();
    assert_eq!(value, Value::Array(vec![Value::Boolean(true), Value::Integer(5)]));
}

#[test]
fn test_parse_dictionary_ref_slot_layout() {
    // object 0: dict { object 1 (key) -> object 2 (value) }
    // object 1: ascii string "k"
    // object 2: UInt8(7)
    let object0: &[u8] = &[0b1101_0001, 0x01, 0x02];
    let object1: &[u8] = &[0b0101_0001, b'k'];
    let object2: &[u8] = &[0b0001_0000, 0x07];
    let mut bytes = document(&[object0, object1, object2], &[]);
    let offset_table_offset = bytes.len();
    bytes.push(8);
    bytes.push(11);
    bytes.push(13);
    bytes.extend_from_slice(&trailer(1, 1, 3, 0, offset_table_offset as u64));

    let value = bplist00::parse(&bytes).unwrap();
    let mut expected = Dictionary::new();
    expected.insert(Value::String("k".into()), Value::Integer(7));
    assert_eq!(value, Value::Dictionary(expected));
}

#[test]
fn test_parse_rejects_offset_table_overlapping_trailer() {
    let object: &[u8] = &[0b0000_1000];
    let mut bytes = document(&[object], &[]);
    let bogus_offset_table_offset = bytes.len() + 1000;
    bytes.push(8);
    bytes.extend_from_slice(&trailer(1, 1, 1, 0, bogus_offset_table_offset as u64));
    assert!(bplist00::parse(&bytes).is_err());
}

#[test]
fn test_parse_rejects_truncated_input() {
    assert_eq!(bplist00::parse(&[0x01, 0x02]).unwrap_err(), bplist00::Error::Truncated);
}
