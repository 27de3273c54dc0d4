//! Structure-aware fuzz target for JSON envelopes.
//!
//! Builds near-valid envelope documents, mixing canonical and legacy field
//! names, string and integer encodings, and broken base64, so the decoder's
//! alias and validation paths see more than random bytes do.

#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use gatekit_core::{Encoding, EnvelopeRequest, RoutingTable};
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Arbitrary)]
enum EncodingValue {
    Binary,
    Json,
    LowerJson,
    Number(i64),
    Text(String),
    Missing,
}

#[derive(Debug, Clone, Arbitrary)]
enum PayloadValue {
    Base64(Vec<u8>),
    Raw(String),
    Number(i64),
    Missing,
}

#[derive(Debug, Clone)]
struct FuzzInput {
    legacy_names: bool,
    command: i64,
    requester_id: Option<String>,
    encoding: EncodingValue,
    payload: PayloadValue,
    extra: Vec<(String, String)>,
}

impl<'a> Arbitrary<'a> for FuzzInput {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let command = if u.arbitrary()? {
            i64::from(u.int_in_range(0..=4000u32)?)
        } else {
            u.arbitrary()?
        };
        Ok(Self {
            legacy_names: u.arbitrary()?,
            command,
            requester_id: u.arbitrary()?,
            encoding: u.arbitrary()?,
            payload: u.arbitrary()?,
            extra: u.arbitrary_iter()?.take(4).collect::<Result<_, _>>()?,
        })
    }
}

impl FuzzInput {
    fn to_json(&self) -> Value {
        let (head, cmd, uid, body) = if self.legacy_names {
            ("head", "cmd", "uid", "body")
        } else {
            ("header", "command", "requester_id", "payload")
        };

        let mut header = Map::new();
        header.insert(cmd.to_string(), json!(self.command));
        if let Some(id) = &self.requester_id {
            header.insert(uid.to_string(), json!(id));
        }
        let encoding = match &self.encoding {
            EncodingValue::Binary => Some(json!("BINARY")),
            EncodingValue::Json => Some(json!("JSON")),
            EncodingValue::LowerJson => Some(json!("json")),
            EncodingValue::Number(n) => Some(json!(n)),
            EncodingValue::Text(s) => Some(json!(s)),
            EncodingValue::Missing => None,
        };
        if let Some(encoding) = encoding {
            header.insert("encoding".to_string(), encoding);
        }

        let mut root = Map::new();
        root.insert(head.to_string(), Value::Object(header));
        let payload = match &self.payload {
            PayloadValue::Base64(bytes) => {
                use base64::Engine;
                Some(json!(base64::engine::general_purpose::STANDARD.encode(bytes)))
            }
            PayloadValue::Raw(s) => Some(json!(s)),
            PayloadValue::Number(n) => Some(json!(n)),
            PayloadValue::Missing => None,
        };
        if let Some(payload) = payload {
            root.insert(body.to_string(), payload);
        }
        for (key, value) in &self.extra {
            root.entry(key.clone()).or_insert_with(|| json!(value));
        }
        Value::Object(root)
    }
}

fuzz_target!(|input: FuzzInput| {
    let document = input.to_json();
    let Ok(bytes) = serde_json::to_vec(&document) else {
        return;
    };

    let Ok(request) = EnvelopeRequest::decode_json(&bytes) else {
        return;
    };

    if let EncodingValue::Json | EncodingValue::LowerJson = input.encoding {
        assert_eq!(request.encoding(), Encoding::Json);
    }
    if let PayloadValue::Base64(raw) = &input.payload {
        assert_eq!(&request.payload[..], &raw[..]);
    }

    let routes = RoutingTable::builder()
        .route(1000..2000, "http://127.0.0.1:50052", "backend/Handle")
        .build()
        .expect("single route table");
    let routed = routes.resolve(request.command()).is_ok();
    assert_eq!(routed, (1000..2000).contains(&request.command()));

    let binary = request.encode_binary();
    let decoded = EnvelopeRequest::decode_binary(&binary).expect("binary form decodes");
    assert_eq!(request, decoded);
});
