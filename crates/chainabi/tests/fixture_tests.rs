//! Struct and list encoding against a known fixture
//!
//! Covers `test(int256 a, Info[] b, string c)` where
//! `Info = (string name, int256 count, Item[] items)` and
//! `Item = (int256 a, int256 b, int256 c)`.

use chainabi::abi::{create_input_object, decode, encode, ListType, Value};
use chainabi::{AbiCodec, AbiError, CodecConfig, ContractAbi, JsonWrapper, I256};

const ABI: &str = r#"[{"type":"function","name":"test","stateMutability":"nonpayable",
  "inputs":[
    {"name":"a","type":"int256","internalType":"int256"},
    {"name":"b","type":"tuple[]","internalType":"struct Proxy.Info[]","components":[
      {"name":"name","type":"string","internalType":"string"},
      {"name":"count","type":"int256","internalType":"int256"},
      {"name":"items","type":"tuple[]","internalType":"struct Proxy.Item[]","components":[
        {"name":"a","type":"int256","internalType":"int256"},
        {"name":"b","type":"int256","internalType":"int256"},
        {"name":"c","type":"int256","internalType":"int256"}]}]},
    {"name":"c","type":"string","internalType":"string"}],
  "outputs":[{"name":"","type":"int256","internalType":"int256"}]}]"#;

const INFO_LIST: &str = r#"[["Hello world!",100,[[1,2,3]]],["Hello world2",200,[[5,6,7]]]]"#;

const ENCODED: &[&str] = &[
    "0000000000000000000000000000000000000000000000000000000000000064",
    "0000000000000000000000000000000000000000000000000000000000000060",
    "0000000000000000000000000000000000000000000000000000000000000300",
    "0000000000000000000000000000000000000000000000000000000000000002",
    "0000000000000000000000000000000000000000000000000000000000000040",
    "0000000000000000000000000000000000000000000000000000000000000160",
    "0000000000000000000000000000000000000000000000000000000000000060",
    "0000000000000000000000000000000000000000000000000000000000000064",
    "00000000000000000000000000000000000000000000000000000000000000a0",
    "000000000000000000000000000000000000000000000000000000000000000c",
    "48656c6c6f20776f726c64210000000000000000000000000000000000000000",
    "0000000000000000000000000000000000000000000000000000000000000001",
    "0000000000000000000000000000000000000000000000000000000000000001",
    "0000000000000000000000000000000000000000000000000000000000000002",
    "0000000000000000000000000000000000000000000000000000000000000003",
    "0000000000000000000000000000000000000000000000000000000000000060",
    "00000000000000000000000000000000000000000000000000000000000000c8",
    "00000000000000000000000000000000000000000000000000000000000000a0",
    "000000000000000000000000000000000000000000000000000000000000000c",
    "48656c6c6f20776f726c64320000000000000000000000000000000000000000",
    "0000000000000000000000000000000000000000000000000000000000000001",
    "0000000000000000000000000000000000000000000000000000000000000005",
    "0000000000000000000000000000000000000000000000000000000000000006",
    "0000000000000000000000000000000000000000000000000000000000000007",
    "000000000000000000000000000000000000000000000000000000000000000c",
    "48656c6c6f20776f726c64210000000000000000000000000000000000000000",
];

fn expected() -> Vec<u8> {
    hex::decode(ENCODED.concat()).unwrap()
}

fn abi() -> ContractAbi {
    ContractAbi::from_json(ABI).unwrap()
}

// ==================== Encoding ====================

#[test]
fn test_encode_matches_fixture() {
    let abi = abi();
    let function = abi.function("test").unwrap();
    assert_eq!(
        function.signature(),
        "test(int256,(string,int256,(int256,int256,int256)[])[],string)"
    );

    let data = AbiCodec::new()
        .encode_method(&abi, "test", &["100", INFO_LIST, "Hello world!"])
        .unwrap();
    assert_eq!(&data[..4], function.selector().as_bytes());
    assert_eq!(hex::encode(&data[4..]), hex::encode(expected()));
}

#[test]
fn test_struct_params_by_field_name() {
    let by_name = r#"[
        {"name":"Hello world!","count":100,"items":[{"a":1,"b":2,"c":3}]},
        {"name":"Hello world2","count":"200","items":[{"a":"5","b":"0x6","c":7}]}
    ]"#;
    let data = AbiCodec::new()
        .encode_method(&abi(), "test", &["100", by_name, "Hello world!"])
        .unwrap();
    assert_eq!(&data[4..], &expected()[..]);
}

#[test]
fn test_encode_from_typed_values() {
    let abi = abi();
    let template = create_input_object(abi.function("test").unwrap());
    let mut args = template.clone();
    let top = args.as_struct_mut().unwrap();

    top.field_mut("a").unwrap().set_value(Value::Int(I256::from_i128(100))).unwrap();
    top.field_mut("c")
        .unwrap()
        .set_value(Value::String("Hello world!".to_string()))
        .unwrap();

    let infos = top.field_mut("b").unwrap().as_list_mut().unwrap();
    for (name, count, item) in [("Hello world!", 100, [1, 2, 3]), ("Hello world2", 200, [5, 6, 7])] {
        let mut info = infos.new_element();
        let fields = info.as_struct_mut().unwrap();
        fields.field_mut("name").unwrap().set_value(Value::String(name.to_string())).unwrap();
        fields.field_mut("count").unwrap().set_value(Value::Int(I256::from_i128(count))).unwrap();

        let items = fields.field_mut("items").unwrap().as_list_mut().unwrap();
        let mut entry = items.new_element();
        for (index, v) in item.into_iter().enumerate() {
            entry
                .as_struct_mut()
                .unwrap()
                .get_mut(index)
                .unwrap()
                .set_value(Value::Int(I256::from_i128(v)))
                .unwrap();
        }
        items.push(entry).unwrap();
        infos.push(info).unwrap();
    }

    assert_eq!(encode(&args).unwrap(), expected());
    // The template itself is left untouched
    assert!(!template.is_populated());
}

#[test]
fn test_struct_array_with_missing_field() {
    let result = AbiCodec::new().encode_method(&abi(), "test", &["100", r#"[["Hello", 1]]"#, "x"]);
    assert!(matches!(result, Err(AbiError::ArityMismatch { expected: 3, got: 2 })));
}

#[test]
fn test_struct_object_with_extra_key() {
    let info = r#"[{"name":"Hello","count":1,"items":[],"extra":true}]"#;
    let result = AbiCodec::new().encode_method(&abi(), "test", &["100", info, "x"]);
    assert!(matches!(result, Err(AbiError::ArityMismatch { expected: 3, got: 4 })));

    let info = r#"[{"name":"Hello","count":1,"items":[]}]"#;
    assert!(AbiCodec::new().encode_method(&abi(), "test", &["100", info, "x"]).is_ok());
}

// ==================== Decoding ====================

#[test]
fn test_decode_fixture() {
    let abi = abi();
    let template = create_input_object(abi.function("test").unwrap());
    let decoded = decode(&template, &expected()).unwrap();

    let top = decoded.as_struct().unwrap();
    assert_eq!(top.field("a").unwrap().value(), Some(&Value::Int(I256::from_i128(100))));

    let infos = top.field("b").unwrap().as_list().unwrap();
    assert_eq!(infos.list_type(), ListType::Dynamic);
    assert_eq!(infos.len(), 2);
    let second = infos.items()[1].as_struct().unwrap();
    assert_eq!(second.name(), "Info");
    assert_eq!(
        second.field("name").unwrap().value(),
        Some(&Value::String("Hello world2".to_string()))
    );
    let item = second.field("items").unwrap().as_list().unwrap().items()[0]
        .as_struct()
        .unwrap();
    assert_eq!(item.field("c").unwrap().value(), Some(&Value::Int(I256::from_i128(7))));
}

#[test]
fn test_decode_fixture_to_strings() {
    let abi = abi();
    let template = create_input_object(abi.function("test").unwrap());
    let strings = JsonWrapper::new(&CodecConfig::default())
        .decode(&template, &expected())
        .unwrap();
    assert_eq!(
        strings,
        vec![
            "100",
            r#"[ [ "Hello world!", 100, [ [ 1, 2, 3 ] ] ], [ "Hello world2", 200, [ [ 5, 6, 7 ] ] ] ]"#,
            "Hello world!",
        ]
    );
}

#[test]
fn test_decode_method_input_round_trip() {
    let codec = AbiCodec::new();
    let abi = abi();
    let data = codec
        .encode_method(&abi, "test", &["100", INFO_LIST, "Hello world!"])
        .unwrap();
    let strings = codec.decode_method_input(&abi, "test", &data).unwrap();

    // Rendered parameters are accepted again as input
    let again = codec.encode_method(&abi, "test", &strings).unwrap();
    assert_eq!(data, again);
}

#[test]
fn test_truncated_fixture_fails() {
    let abi = abi();
    let template = create_input_object(abi.function("test").unwrap());
    let data = expected();
    for len in [0, 31, 64, 200, data.len() - 32] {
        let result = decode(&template, &data[..len]);
        assert!(
            matches!(
                result,
                Err(AbiError::TruncatedInput { .. }) | Err(AbiError::InvalidOffset(_))
            ),
            "decoded {} bytes: {:?}",
            len,
            result
        );
    }
}
