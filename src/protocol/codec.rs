//! Protocol codec
//!
//! Encoding and decoding functions for the E-LIP wire protocol.
//!
//! ## Wire Format
//!
//! ### Frame Format
//! ```text
//! ┌─────────┬─────────┬──────────────┬─────────┬──────────────────────┐
//! │ Len (1) │ Ver (1) │ Reserved (2) │ Cmd (1) │  Payload (Len - 1)   │
//! └─────────┴─────────┴──────────────┴─────────┴──────────────────────┘
//! ```
//! `Len` counts every byte after the 4-byte header, command byte included.
//!
//! ### Payload by Command Type
//! - HEALTH_CHECK (0x11):          3 reserved bytes
//! - MANUAL_REGISTRATION (0x20):   card reader "%04d" (4) + floor bitmap (64)
//!                                 + attribution (1) + sequence (1) + reserved (5)
//! - REGISTRATION_RESPONSE (0x90): sequence (1) + car "%03d" (3) + bank digit (1)

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{ElipError, Result};
use super::command::{CommandCode, ManualRegistrationRequest, OutboundMessage};
use super::floor::FLOOR_BITMAP_SIZE;
use super::response::{InboundMessage, RegistrationResponse};

/// Header size: length (1) + version (1) + reserved (2)
pub const HEADER_SIZE: usize = 4;

/// Protocol version byte ('A')
pub const PROTOCOL_VERSION: u8 = 0x41;

/// Declared data length of a health check frame
pub const DATA_LENGTH_HEALTH_CHECK: u8 = 0x04;

/// Declared data length of a manual registration frame
pub const DATA_LENGTH_MANUAL_REGISTRATION: u8 = 0x4C;

/// Declared data length of a registration response frame
pub const DATA_LENGTH_REGISTRATION_RESPONSE: u8 = 0x06;

const OFFSET_DATA_LENGTH: usize = 0;
const OFFSET_VERSION: usize = 1;
const OFFSET_COMMAND: usize = HEADER_SIZE;

const CARD_READER_DIGITS: usize = 4;
const CAR_NUMBER_DIGITS: usize = 3;
const MANUAL_REGISTRATION_RESERVED: usize = 5;
const HEALTH_CHECK_RESERVED: usize = 3;

/// Highest car number a 3-digit field can carry
pub const ASSIGNED_CAR_NUMBER_MAX: u16 = 999;

/// Highest bank number a single-digit field can carry
pub const ASSIGNED_BANK_NUMBER_MAX: u8 = 9;

// =============================================================================
// Outbound Encoding
// =============================================================================

/// Encode an outbound message to a complete frame
pub fn encode_message(message: &OutboundMessage) -> Bytes {
    match message {
        OutboundMessage::HealthCheck => {
            let mut frame = frame_with_header(DATA_LENGTH_HEALTH_CHECK, CommandCode::HealthCheck);
            frame.put_bytes(0, HEALTH_CHECK_RESERVED);
            frame.freeze()
        }
        OutboundMessage::ManualRegistration(request) => encode_manual_registration(request),
    }
}

fn encode_manual_registration(request: &ManualRegistrationRequest) -> Bytes {
    let mut frame = frame_with_header(
        DATA_LENGTH_MANUAL_REGISTRATION,
        CommandCode::ManualRegistration,
    );

    let card_reader = format!(
        "{:0width$}",
        request.card_reader_number(),
        width = CARD_READER_DIGITS
    );
    frame.put_slice(card_reader.as_bytes());
    frame.put_slice(&request.floors().to_bitmap());
    frame.put_u8(request.attribution().code());
    frame.put_u8(request.sequence_number());
    frame.put_bytes(0, MANUAL_REGISTRATION_RESERVED);

    frame.freeze()
}

/// Encode a registration response frame
///
/// The bridge never sends these; used to fabricate controller traffic.
pub fn encode_registration_response(response: &RegistrationResponse) -> Result<Bytes> {
    if response.assigned_car_number > ASSIGNED_CAR_NUMBER_MAX {
        return Err(ElipError::Validation(format!(
            "assigned car number {} exceeds {}",
            response.assigned_car_number, ASSIGNED_CAR_NUMBER_MAX
        )));
    }
    if response.assigned_bank_number > ASSIGNED_BANK_NUMBER_MAX {
        return Err(ElipError::Validation(format!(
            "assigned bank number {} exceeds {}",
            response.assigned_bank_number, ASSIGNED_BANK_NUMBER_MAX
        )));
    }

    let mut frame = frame_with_header(
        DATA_LENGTH_REGISTRATION_RESPONSE,
        CommandCode::RegistrationResponse,
    );
    frame.put_u8(response.sequence_number);
    frame.put_slice(
        format!(
            "{:0width$}",
            response.assigned_car_number,
            width = CAR_NUMBER_DIGITS
        )
        .as_bytes(),
    );
    frame.put_u8(b'0' + response.assigned_bank_number);

    Ok(frame.freeze())
}

/// Start a frame: header plus command byte
fn frame_with_header(data_length: u8, command: CommandCode) -> BytesMut {
    let mut frame = BytesMut::with_capacity(HEADER_SIZE + usize::from(data_length));
    frame.put_u8(data_length);
    frame.put_u8(PROTOCOL_VERSION);
    frame.put_bytes(0, 2);
    frame.put_u8(command as u8);
    frame
}

// =============================================================================
// Inbound Decoding
// =============================================================================

/// Decode a complete inbound frame
///
/// Returns `Ok(None)` for frames that are well formed but not for us (wrong
/// protocol version, unknown or outbound-only command). Returns
/// `MalformedFrame` when the bytes cannot be decoded.
pub fn decode_frame(bytes: &[u8]) -> Result<Option<InboundMessage>> {
    if bytes.len() < HEADER_SIZE {
        return Err(ElipError::MalformedFrame(format!(
            "incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let version = bytes[OFFSET_VERSION];
    if version != PROTOCOL_VERSION {
        tracing::warn!("Received unknown protocol version: 0x{:02x}", version);
        return Ok(None);
    }

    let data_length = usize::from(bytes[OFFSET_DATA_LENGTH]);
    if data_length == 0 {
        return Err(ElipError::MalformedFrame(
            "declared data length is zero, no command byte".to_string(),
        ));
    }

    let total_len = HEADER_SIZE + data_length;
    if bytes.len() < total_len {
        return Err(ElipError::MalformedFrame(format!(
            "incomplete frame: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    let frame = &bytes[..total_len];
    let command = frame[OFFSET_COMMAND];

    match CommandCode::try_from(command) {
        Ok(CommandCode::RegistrationResponse) => {
            decode_registration_response(frame).map(|r| Some(InboundMessage::RegistrationResponse(r)))
        }
        _ => {
            tracing::warn!("Received unexpected command field: 0x{:02x}", command);
            Ok(None)
        }
    }
}

fn decode_registration_response(frame: &[u8]) -> Result<RegistrationResponse> {
    let data_length = frame[OFFSET_DATA_LENGTH];
    if data_length != DATA_LENGTH_REGISTRATION_RESPONSE {
        return Err(ElipError::MalformedFrame(format!(
            "registration response: declared length {}, expected {}",
            data_length, DATA_LENGTH_REGISTRATION_RESPONSE
        )));
    }

    let payload = &frame[OFFSET_COMMAND + 1..];
    let sequence_number = payload[0];
    let assigned_car_number =
        parse_ascii_decimal(&payload[1..1 + CAR_NUMBER_DIGITS], "assigned car number")?;
    let assigned_bank_number =
        parse_ascii_decimal(&payload[1 + CAR_NUMBER_DIGITS..], "assigned bank number")? as u8;

    Ok(RegistrationResponse {
        sequence_number,
        assigned_car_number,
        assigned_bank_number,
    })
}

/// Parse a fixed-width field of ASCII digits
fn parse_ascii_decimal(field: &[u8], name: &str) -> Result<u16> {
    if field.is_empty() {
        return Err(ElipError::MalformedFrame(format!("{}: empty field", name)));
    }

    field.iter().try_fold(0u16, |acc, &byte| {
        if !byte.is_ascii_digit() {
            return Err(ElipError::MalformedFrame(format!(
                "{}: non-decimal byte 0x{:02x}",
                name, byte
            )));
        }
        Ok(acc * 10 + u16::from(byte - b'0'))
    })
}

/// Declared data length of a frame header
pub fn data_length(header: &[u8; HEADER_SIZE]) -> usize {
    usize::from(header[OFFSET_DATA_LENGTH])
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write an outbound message to a stream
pub fn write_message<W: Write>(writer: &mut W, message: &OutboundMessage) -> Result<()> {
    let bytes = encode_message(message);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete raw frame from a stream
///
/// Blocks until the header and the declared data length have been read.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;
    read_frame_body(reader, &header)
}

/// Read the data part of a frame whose header was already consumed
///
/// Returns the full frame, header included.
pub fn read_frame_body<R: Read>(reader: &mut R, header: &[u8; HEADER_SIZE]) -> Result<Vec<u8>> {
    let data_len = data_length(header);

    let mut frame = Vec::with_capacity(HEADER_SIZE + data_len);
    frame.extend_from_slice(header);
    frame.resize(HEADER_SIZE + data_len, 0);

    if data_len > 0 {
        reader.read_exact(&mut frame[HEADER_SIZE..])?;
    }

    Ok(frame)
}

/// Floor bitmap bytes of an encoded manual registration frame
pub fn manual_registration_bitmap(frame: &[u8]) -> Option<&[u8; FLOOR_BITMAP_SIZE]> {
    let start = OFFSET_COMMAND + 1 + CARD_READER_DIGITS;
    frame
        .get(start..start + FLOOR_BITMAP_SIZE)
        .and_then(|slice| slice.try_into().ok())
}
