//! Protocol Module
//!
//! Defines the E-LIP wire protocol spoken with the controller.
//!
//! ## Frame Format
//! ```text
//! ┌─────────┬─────────┬──────────────┬─────────┬──────────────────────┐
//! │ Len (1) │ Ver (1) │ Reserved (2) │ Cmd (1) │       Payload        │
//! └─────────┴─────────┴──────────────┴─────────┴──────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x11: HEALTH_CHECK          (outbound)
//! - 0x20: MANUAL_REGISTRATION   (outbound)
//! - 0x90: REGISTRATION_RESPONSE (inbound)
//!
//! Any other inbound command, or a version byte other than 'A', is logged and
//! dropped.

mod command;
mod response;
mod floor;
mod codec;

pub use command::{
    Attribution, CommandCode, ManualRegistrationRequest, OutboundMessage,
    CARD_READER_NUMBER_MAX, SEQUENCE_NUMBER_MAX,
};
pub use response::{InboundMessage, RegistrationResponse};
pub use floor::{
    decode_floor_bitmap, encode_floor_bitmap, DoorOpening, Floor, FloorPermissions,
    FLOOR_BITMAP_SIZE, FLOOR_NUMBER_MAX, FLOOR_NUMBER_MIN,
};
pub use codec::{
    data_length, decode_frame, encode_message, encode_registration_response,
    manual_registration_bitmap, read_frame, read_frame_body, write_message,
    ASSIGNED_BANK_NUMBER_MAX, ASSIGNED_CAR_NUMBER_MAX,
    DATA_LENGTH_HEALTH_CHECK, DATA_LENGTH_MANUAL_REGISTRATION,
    DATA_LENGTH_REGISTRATION_RESPONSE, HEADER_SIZE, PROTOCOL_VERSION,
};
