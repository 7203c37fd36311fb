//! Codec Tests
//!
//! Tests for frame encoding, floor bitmaps and inbound dispatch.

use std::io::Cursor;
use std::time::Duration;

use elip_bridge::protocol::{
    decode_floor_bitmap, decode_frame, encode_floor_bitmap, encode_message,
    encode_registration_response, manual_registration_bitmap, read_frame, write_message,
    Attribution, DoorOpening, Floor, FloorPermissions, InboundMessage,
    ManualRegistrationRequest, OutboundMessage, RegistrationResponse, FLOOR_BITMAP_SIZE,
    HEADER_SIZE, PROTOCOL_VERSION,
};
use elip_bridge::{Config, ElipError};

// =============================================================================
// Helper Functions
// =============================================================================

fn floor(number: u32, opening: DoorOpening) -> Floor {
    Floor::new(number, opening).unwrap()
}

fn sample_request() -> ManualRegistrationRequest {
    ManualRegistrationRequest::new(
        3,
        vec![floor(1, DoorOpening::Front), floor(210, DoorOpening::Both)],
        Attribution::General,
        0,
    )
    .unwrap()
}

fn response_frame(sequence: u8, car: &[u8; 3], bank: u8) -> Vec<u8> {
    let mut frame = vec![0x06, PROTOCOL_VERSION, 0x00, 0x00, 0x90, sequence];
    frame.extend_from_slice(car);
    frame.push(bank);
    frame
}

// =============================================================================
// Outbound Encoding Tests
// =============================================================================

#[test]
fn test_health_check_frame() {
    let encoded = encode_message(&OutboundMessage::HealthCheck);
    assert_eq!(
        &encoded[..],
        &[0x04, 0x41, 0x00, 0x00, 0x11, 0x00, 0x00, 0x00]
    );
}

#[test]
fn test_manual_registration_layout() {
    let encoded = encode_message(&sample_request().into());

    assert_eq!(encoded.len(), 80);
    assert_eq!(&encoded[..5], &[0x4C, 0x41, 0x00, 0x00, 0x20]);
    assert_eq!(&encoded[5..9], b"0003");
    assert_eq!(encoded[73], b'0'); // GENERAL
    assert_eq!(encoded[74], 0); // sequence
    assert!(encoded[75..].iter().all(|&b| b == 0));
}

#[test]
fn test_length_byte_matches_frame_size() {
    let messages = vec![
        OutboundMessage::HealthCheck,
        sample_request().into(),
        ManualRegistrationRequest::new(255, Vec::new(), Attribution::Vip, 255)
            .unwrap()
            .into(),
    ];

    for message in messages {
        let encoded = encode_message(&message);
        assert_eq!(usize::from(encoded[0]), encoded.len() - HEADER_SIZE);
        assert_eq!(encoded[1], PROTOCOL_VERSION);
    }
}

#[test]
fn test_card_reader_number_zero_padded() {
    let request = ManualRegistrationRequest::new(42, Vec::new(), Attribution::Handicapped, 17).unwrap();
    let encoded = encode_message(&request.into());

    assert_eq!(&encoded[5..9], b"0042");
    assert_eq!(encoded[73], b'1');
    assert_eq!(encoded[74], 17);
}

#[test]
fn test_vip_attribution_code() {
    assert_eq!(Attribution::General.code(), 0x30);
    assert_eq!(Attribution::Handicapped.code(), 0x31);
    assert_eq!(Attribution::Vip.code(), 0x32);
}

#[test]
fn test_write_message_to_stream() {
    let mut buffer = Vec::new();
    write_message(&mut buffer, &OutboundMessage::HealthCheck).unwrap();
    assert_eq!(buffer, encode_message(&OutboundMessage::HealthCheck).to_vec());
}

// =============================================================================
// Floor Bitmap Tests
// =============================================================================

#[test]
fn test_floor_one_front_sets_lowest_bits() {
    let bitmap = encode_floor_bitmap(vec![floor(1, DoorOpening::Front)]);

    assert_eq!(bitmap[0] & 0b11, 0b01);
    assert_eq!(bitmap[0], 0b01);
    assert!(bitmap[1..].iter().all(|&b| b == 0));
}

#[test]
fn test_floor_210_both_slot() {
    let bitmap = encode_floor_bitmap(vec![floor(210, DoorOpening::Both)]);

    assert_eq!((bitmap[52] >> 2) & 0b11, 0b11);
    assert_eq!(bitmap[52], 0b11 << 2);
    assert_eq!(bitmap.iter().filter(|&&b| b != 0).count(), 1);
}

#[test]
fn test_four_floors_share_one_byte() {
    let bitmap = encode_floor_bitmap(vec![
        floor(5, DoorOpening::Front),
        floor(6, DoorOpening::Rear),
        floor(7, DoorOpening::None),
        floor(8, DoorOpening::Both),
    ]);

    assert_eq!(bitmap[1], 0b11_00_10_01);
}

#[test]
fn test_floor_255_uses_last_byte() {
    let bitmap = encode_floor_bitmap(vec![floor(255, DoorOpening::Rear)]);
    assert_eq!(bitmap[FLOOR_BITMAP_SIZE - 1], 0b10 << 4);
}

#[test]
fn test_bitmap_independent_of_input_order() {
    let forward = ManualRegistrationRequest::new(
        1,
        vec![floor(3, DoorOpening::Rear), floor(99, DoorOpening::Front), floor(200, DoorOpening::Both)],
        Attribution::General,
        1,
    )
    .unwrap();
    let reversed = ManualRegistrationRequest::new(
        1,
        vec![floor(200, DoorOpening::Both), floor(99, DoorOpening::Front), floor(3, DoorOpening::Rear)],
        Attribution::General,
        1,
    )
    .unwrap();

    assert_eq!(encode_message(&forward.into()), encode_message(&reversed.into()));
}

#[test]
fn test_bitmap_recovers_floors_from_frame() {
    let encoded = encode_message(&sample_request().into());
    let bitmap = manual_registration_bitmap(&encoded).unwrap();

    assert_eq!(
        decode_floor_bitmap(bitmap),
        vec![floor(1, DoorOpening::Front), floor(210, DoorOpening::Both)]
    );
}

#[test]
fn test_floor_permissions_iterate_ascending() {
    let permissions = FloorPermissions::try_from(vec![
        floor(40, DoorOpening::Rear),
        floor(2, DoorOpening::Front),
    ])
    .unwrap();

    let numbers: Vec<u8> = permissions.iter().map(|f| f.number()).collect();
    assert_eq!(numbers, vec![2, 40]);
    assert_eq!(permissions.get(40), Some(DoorOpening::Rear));
    assert_eq!(permissions.get(41), None);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_card_reader_number_out_of_range() {
    let result = ManualRegistrationRequest::new(256, Vec::new(), Attribution::General, 0);
    assert!(matches!(result, Err(ElipError::Validation(_))));
}

#[test]
fn test_sequence_number_out_of_range() {
    let result = ManualRegistrationRequest::new(0, Vec::new(), Attribution::General, 256);
    assert!(matches!(result, Err(ElipError::Validation(_))));
}

#[test]
fn test_floor_number_out_of_range() {
    assert!(matches!(Floor::new(0, DoorOpening::Front), Err(ElipError::Validation(_))));
    assert!(matches!(Floor::new(256, DoorOpening::Front), Err(ElipError::Validation(_))));
    assert!(Floor::new(255, DoorOpening::Front).is_ok());
}

#[test]
fn test_duplicate_floor_rejected() {
    let result = ManualRegistrationRequest::new(
        3,
        vec![floor(7, DoorOpening::Front), floor(7, DoorOpening::Rear)],
        Attribution::General,
        0,
    );
    assert!(matches!(result, Err(ElipError::Validation(_))));
}

#[test]
fn test_boundary_values_accepted() {
    let request = ManualRegistrationRequest::new(0, Vec::new(), Attribution::General, 255).unwrap();
    assert_eq!(request.card_reader_number(), 0);
    assert_eq!(request.sequence_number(), 255);
}

// =============================================================================
// Inbound Decoding Tests
// =============================================================================

#[test]
fn test_decode_registration_response() {
    let decoded = decode_frame(&response_frame(7, b"012", b'3')).unwrap();

    assert_eq!(
        decoded,
        Some(InboundMessage::RegistrationResponse(RegistrationResponse {
            sequence_number: 7,
            assigned_car_number: 12,
            assigned_bank_number: 3,
        }))
    );
}

#[test]
fn test_decode_is_repeatable() {
    let frame = response_frame(200, b"999", b'9');
    let first = decode_frame(&frame).unwrap();
    let second = decode_frame(&frame).unwrap();

    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn test_wrong_version_is_dropped() {
    let mut frame = response_frame(1, b"001", b'1');
    frame[1] = 0x42;
    assert_eq!(decode_frame(&frame).unwrap(), None);
}

#[test]
fn test_unknown_command_is_dropped() {
    let mut frame = response_frame(1, b"001", b'1');
    frame[4] = 0xFF;
    assert_eq!(decode_frame(&frame).unwrap(), None);
}

#[test]
fn test_outbound_only_command_is_dropped() {
    let frame = encode_message(&OutboundMessage::HealthCheck);
    assert_eq!(decode_frame(&frame).unwrap(), None);
}

#[test]
fn test_non_decimal_car_number_is_malformed() {
    let result = decode_frame(&response_frame(1, b"0a2", b'1'));
    assert!(matches!(result, Err(ElipError::MalformedFrame(_))));
}

#[test]
fn test_non_decimal_bank_number_is_malformed() {
    let result = decode_frame(&response_frame(1, b"002", b'x'));
    assert!(matches!(result, Err(ElipError::MalformedFrame(_))));
}

#[test]
fn test_truncated_frame_is_malformed() {
    let frame = response_frame(1, b"002", b'1');
    let result = decode_frame(&frame[..7]);
    assert!(matches!(result, Err(ElipError::MalformedFrame(_))));

    let result = decode_frame(&frame[..2]);
    assert!(matches!(result, Err(ElipError::MalformedFrame(_))));
}

#[test]
fn test_unexpected_length_is_malformed() {
    let mut frame = response_frame(1, b"002", b'1');
    frame[0] = 0x07;
    frame.push(0x00);

    let result = decode_frame(&frame);
    assert!(matches!(result, Err(ElipError::MalformedFrame(_))));
}

#[test]
fn test_encode_response_matches_decoder() {
    let response = RegistrationResponse {
        sequence_number: 5,
        assigned_car_number: 7,
        assigned_bank_number: 2,
    };
    let encoded = encode_registration_response(&response).unwrap();

    assert_eq!(&encoded[..], response_frame(5, b"007", b'2').as_slice());
}

#[test]
fn test_encode_response_rejects_wide_bank_number() {
    let response = RegistrationResponse {
        sequence_number: 5,
        assigned_car_number: 7,
        assigned_bank_number: 10,
    };
    assert!(matches!(
        encode_registration_response(&response),
        Err(ElipError::Validation(_))
    ));
}

#[test]
fn test_read_frames_from_stream() {
    let mut stream = response_frame(1, b"001", b'1');
    stream.extend_from_slice(&response_frame(2, b"002", b'2'));
    let mut cursor = Cursor::new(stream);

    let first = read_frame(&mut cursor).unwrap();
    let second = read_frame(&mut cursor).unwrap();

    assert_eq!(first, response_frame(1, b"001", b'1'));
    assert_eq!(second, response_frame(2, b"002", b'2'));
    assert!(matches!(read_frame(&mut cursor), Err(ElipError::Io(_))));
}

// =============================================================================
// Display Tests
// =============================================================================

#[test]
fn test_message_display() {
    assert_eq!(
        sample_request().to_string(),
        "ManualRegistration(card_reader=3, floors=[1:FRONT, 210:BOTH], attribution=GENERAL, seq=0)"
    );
    assert_eq!(OutboundMessage::HealthCheck.to_string(), "HealthCheck");
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_health_check_cycle() {
    let config = Config::builder()
        .health_check_period(Duration::from_secs(1))
        .idle_interval(Duration::from_millis(100))
        .build();
    assert_eq!(config.health_check_cycle(), 10);

    assert_eq!(Config::default().health_check_cycle(), 600);

    let config = Config::builder()
        .health_check_period(Duration::from_millis(150))
        .idle_interval(Duration::from_millis(100))
        .build();
    assert_eq!(config.health_check_cycle(), 2);

    let config = Config::builder().health_check_period(Duration::ZERO).build();
    assert_eq!(config.health_check_cycle(), 1);
}

#[test]
fn test_config_validation() {
    assert!(Config::default().validate().is_ok());

    let config = Config::builder().idle_interval(Duration::ZERO).build();
    assert!(matches!(config.validate(), Err(ElipError::Config(_))));

    let config = Config::builder().host("  ").build();
    assert!(matches!(config.validate(), Err(ElipError::Config(_))));

    let config = Config::builder().frame_read_timeout(Duration::ZERO).build();
    assert!(matches!(config.validate(), Err(ElipError::Config(_))));
}
