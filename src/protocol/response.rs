//! Response definitions
//!
//! Represents messages received from the controller.

use std::fmt;

/// Controller answer to a manual registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationResponse {
    /// Sequence number echoed from the request
    pub sequence_number: u8,

    /// Elevator car assigned to the passenger (0..=999)
    pub assigned_car_number: u16,

    /// Elevator bank the car belongs to (0..=9)
    pub assigned_bank_number: u8,
}

impl fmt::Display for RegistrationResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RegistrationResponse(seq={}, car={}, bank={})",
            self.sequence_number, self.assigned_car_number, self.assigned_bank_number
        )
    }
}

/// A message received from the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    RegistrationResponse(RegistrationResponse),
}

impl fmt::Display for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InboundMessage::RegistrationResponse(response) => write!(f, "{}", response),
        }
    }
}
