//! Command definitions
//!
//! Represents messages sent to the controller.

use std::fmt;

use crate::error::{ElipError, Result};
use super::floor::{Floor, FloorPermissions};

/// Command codes carried in byte 4 of every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandCode {
    HealthCheck = 0x11,
    ManualRegistration = 0x20,
    RegistrationResponse = 0x90,
}

impl TryFrom<u8> for CommandCode {
    type Error = u8;

    fn try_from(byte: u8) -> std::result::Result<Self, u8> {
        match byte {
            0x11 => Ok(CommandCode::HealthCheck),
            0x20 => Ok(CommandCode::ManualRegistration),
            0x90 => Ok(CommandCode::RegistrationResponse),
            other => Err(other),
        }
    }
}

/// Access category of a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Attribution {
    General = b'0',
    Handicapped = b'1',
    Vip = b'2',
}

impl Attribution {
    /// ASCII code written on the wire
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Attribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attribution::General => "GENERAL",
            Attribution::Handicapped => "HANDICAPPED",
            Attribution::Vip => "VIP",
        };
        f.write_str(name)
    }
}

/// Highest card reader number representable on the wire
pub const CARD_READER_NUMBER_MAX: u32 = 255;

/// Highest sequence number representable on the wire
pub const SEQUENCE_NUMBER_MAX: u32 = 255;

/// Manual registration request: grants a card reader access to floors
///
/// Validated at construction; an instance always encodes successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualRegistrationRequest {
    card_reader_number: u8,
    floors: FloorPermissions,
    attribution: Attribution,
    sequence_number: u8,
}

impl ManualRegistrationRequest {
    /// Build a request from a list of floor grants
    ///
    /// Fails if the card reader or sequence number exceeds 255 or if two
    /// grants name the same floor.
    pub fn new<I>(
        card_reader_number: u32,
        floors: I,
        attribution: Attribution,
        sequence_number: u32,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = Floor>,
    {
        let card_reader_number = u8::try_from(card_reader_number).map_err(|_| {
            ElipError::Validation(format!(
                "card reader number {} out of range 0..={}",
                card_reader_number, CARD_READER_NUMBER_MAX
            ))
        })?;

        let sequence_number = u8::try_from(sequence_number).map_err(|_| {
            ElipError::Validation(format!(
                "sequence number {} out of range 0..={}",
                sequence_number, SEQUENCE_NUMBER_MAX
            ))
        })?;

        let floors = FloorPermissions::try_from(floors.into_iter().collect::<Vec<_>>())?;

        Ok(Self {
            card_reader_number,
            floors,
            attribution,
            sequence_number,
        })
    }

    pub fn card_reader_number(&self) -> u8 {
        self.card_reader_number
    }

    pub fn floors(&self) -> &FloorPermissions {
        &self.floors
    }

    pub fn attribution(&self) -> Attribution {
        self.attribution
    }

    pub fn sequence_number(&self) -> u8 {
        self.sequence_number
    }
}

impl fmt::Display for ManualRegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ManualRegistration(card_reader={}, floors={}, attribution={}, seq={})",
            self.card_reader_number, self.floors, self.attribution, self.sequence_number
        )
    }
}

/// A message sent to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Keepalive, no payload
    HealthCheck,

    /// Grant floor access for a card reader
    ManualRegistration(ManualRegistrationRequest),
}

impl OutboundMessage {
    /// Get the command code
    pub fn command_code(&self) -> CommandCode {
        match self {
            OutboundMessage::HealthCheck => CommandCode::HealthCheck,
            OutboundMessage::ManualRegistration(_) => CommandCode::ManualRegistration,
        }
    }
}

impl From<ManualRegistrationRequest> for OutboundMessage {
    fn from(request: ManualRegistrationRequest) -> Self {
        OutboundMessage::ManualRegistration(request)
    }
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboundMessage::HealthCheck => f.write_str("HealthCheck"),
            OutboundMessage::ManualRegistration(request) => write!(f, "{}", request),
        }
    }
}
