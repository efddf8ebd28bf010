// A maliciously crafted document cannot make the parser recurse into itself:
// an array whose only element refers back to the array's own object index.

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
fn test_self_referential_array_is_rejected() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"bplist00");
    // object 0: one-element array referencing object 0 itself.
    bytes.push(0b1010_0001);
    bytes.push(0x00);
    let offset_table_offset = bytes.len();
    bytes.push(8);
    bytes.extend_from_slice(&trailer(1, 1, 1, 0, offset_table_offset as u64));

    assert_eq!(
        bplist00::parse(&bytes).unwrap_err(),
        bplist00::Error::DepthExceeded,
    );
}

#[test]
fn test_mutually_referential_dictionary_is_rejected() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"bplist00");
    // object 0: dict { object 0 (itself, as key) -> object 1 }
    // object 1: true
    bytes.push(0b1101_0001);
    bytes.push(0x00);
    bytes.push(0x01);
    bytes.push(0b0000_1001);
    let offset_table_offset = bytes.len();
    bytes.push(8);
    bytes.push(11);
    bytes.extend_from_slice(&trailer(1, 1, 2, 0, offset_table_offset as u64));

    assert_eq!(
        bplist00::parse(&bytes).unwrap_err(),
        bplist00::Error::DepthExceeded,
    );
}
