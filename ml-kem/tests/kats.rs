//! Known-answer tests in the `key = value` line format, one blank-line separated record per case.
//!
//! The `ml_kem_*.kat` files cover FIPS 203 key generation, encapsulation, and decapsulation.  The
//! `kyber_*.kat` files cover the Kyber round-3 variant, whose shared secret is 64 bytes of the
//! SHAKE256 key-derivation stream.  Binary fields are lowercase hex; `testPassed` is `True` or
//! `False`; `reason` is free text.

use ml_kem::{B32, Kem, MlKem512Params, MlKem768Params, MlKem1024Params, ParameterSet, kyber};
use serde_json::{Map, Value};

use std::{fs::read_to_string, path::PathBuf};

/// One record of a line-oriented KAT file, with its fields in file order
#[derive(Debug, PartialEq)]
struct Record(Vec<(String, String)>);

impl Record {
    fn field(&self, key: &str) -> &str {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing field {key}"))
    }

    fn bytes(&self, key: &str) -> Vec<u8> {
        hex::decode(self.field(key)).unwrap()
    }

    fn seed(&self, key: &str) -> B32 {
        B32::try_from(self.bytes(key).as_slice()).unwrap()
    }
}

fn read(path: &str) -> String {
    let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push(path);
    read_to_string(p.as_path()).unwrap()
}

fn parse_kat(text: &str) -> Vec<Record> {
    text.split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .map(|block| {
            let fields = block
                .lines()
                .map(|line| {
                    let (key, value) = line.split_once(" = ").unwrap();
                    (key.to_string(), value.trim().to_string())
                })
                .collect();
            Record(fields)
        })
        .collect()
}

fn write_kat(records: &[Record]) -> String {
    records
        .iter()
        .map(|r| {
            r.0.iter()
                .map(|(k, v)| format!("{k} = {v}\n"))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn ml_kem_kat<P: ParameterSet>(name: &str) {
    let records = parse_kat(&read(&format!("tests/kats/{name}")));
    assert!(!records.is_empty());

    for r in records {
        let (dk, ek) = Kem::<P>::generate_deterministic(&r.seed("d"), &r.seed("z"));
        assert_eq!(ek.as_bytes().as_ref(), r.bytes("pk"));
        assert_eq!(dk.to_bytes().as_ref(), r.bytes("sk"));

        let (ct, k_send) = ek.encapsulate_deterministic(&r.seed("m"));
        assert_eq!(ct.as_ref(), r.bytes("ct"));
        assert_eq!(k_send.as_slice(), r.bytes("ss"));

        let k_recv = dk.decapsulate(&ct);
        assert_eq!(k_recv, k_send);
    }
}

fn kyber_kat<P: ParameterSet>(name: &str) {
    let records = parse_kat(&read(&format!("tests/kats/{name}")));
    assert!(!records.is_empty());

    for r in records {
        let (dk, ek) = kyber::Kyber::<P>::generate_deterministic(&r.seed("d"), &r.seed("z"));
        assert_eq!(ek.as_bytes().as_ref(), r.bytes("pk"));
        assert_eq!(dk.to_bytes().as_ref(), r.bytes("sk"));

        let (ct, mut kdf_send) = ek.encapsulate_deterministic(&r.seed("m"));
        assert_eq!(ct.as_ref(), r.bytes("ct"));

        let mut ss = [0u8; 64];
        kdf_send.squeeze(&mut ss);
        assert_eq!(ss.as_slice(), r.bytes("ss"));

        let mut ss_recv = [0u8; 64];
        dk.decapsulate(&ct).squeeze(&mut ss_recv);
        assert_eq!(ss_recv, ss);
    }
}

#[test]
fn ml_kem_512() {
    ml_kem_kat::<MlKem512Params>("ml_kem_512.kat");
}

#[test]
fn ml_kem_768() {
    ml_kem_kat::<MlKem768Params>("ml_kem_768.kat");
}

#[test]
fn ml_kem_1024() {
    ml_kem_kat::<MlKem1024Params>("ml_kem_1024.kat");
}

#[test]
fn kyber_512() {
    kyber_kat::<MlKem512Params>("kyber_512.kat");
}

#[test]
fn kyber_768() {
    kyber_kat::<MlKem768Params>("kyber_768.kat");
}

#[test]
fn kyber_1024() {
    kyber_kat::<MlKem1024Params>("kyber_1024.kat");
}

// Convert one ACVP test case into a KAT record.  The test case identifier has no counterpart in
// the line format and is dropped.
fn acvp_to_kat(tc: &Map<String, Value>) -> Record {
    let fields = tc
        .iter()
        .filter(|(k, _)| k.as_str() != "tcId")
        .map(|(k, v)| {
            let value = match (k.as_str(), v) {
                ("testPassed", Value::Bool(passed)) => {
                    String::from(if *passed { "True" } else { "False" })
                }
                ("reason", Value::String(reason)) => reason.clone(),
                (_, Value::String(hex)) => hex.to_lowercase(),
                _ => panic!("unexpected field {k}"),
            };
            (k.clone(), value)
        })
        .collect();
    Record(fields)
}

fn kat_to_acvp(r: &Record, id: usize) -> Map<String, Value> {
    let mut tc = Map::new();
    tc.insert("tcId".to_string(), Value::from(id));
    for (k, v) in &r.0 {
        let value = match k.as_str() {
            "testPassed" => Value::Bool(v == "True"),
            "reason" => Value::String(v.clone()),
            _ => Value::String(hex::encode_upper(hex::decode(v).unwrap())),
        };
        tc.insert(k.clone(), value);
    }
    tc
}

fn acvp_round_trip(path: &str) {
    let tv: Value = serde_json::from_str(&read(path)).unwrap();
    let groups = tv["testGroups"].as_array().unwrap();
    assert!(!groups.is_empty());

    for tg in groups {
        let tests: Vec<&Map<String, Value>> = tg["tests"]
            .as_array()
            .unwrap()
            .iter()
            .map(|tc| tc.as_object().unwrap())
            .collect();

        // JSON to KAT text and back to records
        let records: Vec<Record> = tests.iter().map(|tc| acvp_to_kat(tc)).collect();
        let text = write_kat(&records);
        let parsed = parse_kat(&text);
        assert_eq!(parsed, records);

        // Records back to JSON
        for (tc, r) in tests.iter().zip(parsed.iter()) {
            let id = usize::try_from(tc["tcId"].as_u64().unwrap()).unwrap();
            assert_eq!(&&kat_to_acvp(r, id), tc);
        }
    }
}

#[test]
fn acvp_kat_round_trip() {
    acvp_round_trip("tests/key-gen.json");
    acvp_round_trip("tests/encapsulation.json");
    acvp_round_trip("tests/decapsulation.json");
    acvp_round_trip("tests/encapsulation-key-check.json");
    acvp_round_trip("tests/decapsulation-key-check.json");
}

#[test]
fn kat_format_round_trip() {
    let text = read("tests/kats/ml_kem_512.kat");
    assert_eq!(write_kat(&parse_kat(&text)), text);
}
