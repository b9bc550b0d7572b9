//! Registry selection order and tolerance to faulty SELECT exchanges

mod common;

use chipscan::registry::{APEX_AID, SPARK2_AID, SPARK2_LEGACY_AID};
use chipscan::{DeviceFamily, DeviceRegistry, TagIdentifier};
use chipscan_apdu_core::{CardExecutor, CardTransportFactory, TransportError};
use common::{Card, CardReader, NOT_FOUND, OK, Reply};

fn executor(card: &std::sync::Arc<Card>) -> CardExecutor<common::CardSession> {
    let reader = CardReader::new(card.clone());
    CardExecutor::new(reader.open(reader.name).unwrap())
}

fn select_hex(aid: &[u8]) -> String {
    format!("00A4040C{:02X}{}", aid.len(), hex::encode_upper(aid))
}

#[test]
fn test_selects_in_registry_order_and_stops_at_match() {
    let card = Card::scripted([Reply::Data(vec![], NOT_FOUND), Reply::Data(vec![], OK)]);
    let registry = DeviceRegistry::default();
    let identifier = TagIdentifier::new(&registry);

    let entry = identifier.select_device(&mut executor(&card)).unwrap();

    assert_eq!(entry.family(), DeviceFamily::Spark2);
    assert_eq!(entry.aid().as_ref(), SPARK2_LEGACY_AID);
    assert_eq!(
        card.commands(),
        [select_hex(SPARK2_AID), select_hex(SPARK2_LEGACY_AID)]
    );
}

#[test]
fn test_additional_frame_status_is_a_match() {
    let card = Card::scripted([Reply::Data(vec![], [0x90, 0xAF])]);
    let registry = DeviceRegistry::default();

    let entry = TagIdentifier::new(&registry).select_device(&mut executor(&card));

    assert_eq!(entry.map(|e| e.family()), Some(DeviceFamily::Spark2));
}

#[test]
fn test_faulty_select_does_not_stop_identification() {
    let card = Card::scripted([
        Reply::Fault(TransportError::Transmission),
        Reply::Data(vec![], NOT_FOUND),
        Reply::Data(vec![], OK),
        Reply::Data(vec![0x5E, 0xED], OK),
    ]);
    let registry = DeviceRegistry::default();
    let identifier = TagIdentifier::new(&registry);
    let mut executor = executor(&card);

    let identified = identifier.identify(&mut executor).unwrap().unwrap();

    assert_eq!(identified.family, DeviceFamily::Apex);
    assert_eq!(identified.pcd_challenge, "5EED");
    assert_eq!(
        card.commands(),
        [
            select_hex(SPARK2_AID),
            select_hex(SPARK2_LEGACY_AID),
            select_hex(APEX_AID),
            "00A9A30000".to_string(),
        ]
    );
}

#[test]
fn test_no_match_sends_no_authentication() {
    let card = Card::scripted([
        Reply::Data(vec![], NOT_FOUND),
        Reply::Fault(TransportError::Transmission),
        Reply::Data(vec![], [0x6D, 0x00]),
    ]);
    let registry = DeviceRegistry::default();

    let identified = TagIdentifier::new(&registry)
        .identify(&mut executor(&card))
        .unwrap();

    assert_eq!(identified, None);
    assert_eq!(card.commands().len(), 3);
}

#[test]
fn test_truncated_select_reply_counts_as_no_match() {
    let card = Card::scripted([
        Reply::Raw(vec![0x90]),
        Reply::Data(vec![], [0x90, 0x00]),
    ]);
    let registry = DeviceRegistry::default();

    let entry = TagIdentifier::new(&registry).select_device(&mut executor(&card));

    assert_eq!(entry.map(|e| e.aid().as_ref()), Some(SPARK2_LEGACY_AID));
}

#[test]
fn test_native_additional_frame_is_not_a_select_match() {
    let card = Card::scripted([
        Reply::Data(vec![], [0x91, 0xAF]),
        Reply::Data(vec![], NOT_FOUND),
        Reply::Data(vec![], NOT_FOUND),
    ]);
    let registry = DeviceRegistry::default();

    assert!(TagIdentifier::new(&registry).select_device(&mut executor(&card)).is_none());
}
