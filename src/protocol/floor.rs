//! Floor permissions
//!
//! Per-floor door-opening grants and their packed 2-bit bitmap form.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ElipError, Result};

/// Size of the packed floor-permission bitmap in bytes
pub const FLOOR_BITMAP_SIZE: usize = 64;

/// Lowest addressable floor number
pub const FLOOR_NUMBER_MIN: u32 = 1;

/// Highest addressable floor number
pub const FLOOR_NUMBER_MAX: u32 = 255;

/// Which elevator doors may open at a floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DoorOpening {
    None = 0b00,
    Front = 0b01,
    Rear = 0b10,
    Both = 0b11,
}

impl DoorOpening {
    /// Map the low two bits of `bits` to a door opening
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => DoorOpening::None,
            0b01 => DoorOpening::Front,
            0b10 => DoorOpening::Rear,
            _ => DoorOpening::Both,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for DoorOpening {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DoorOpening::None => "NONE",
            DoorOpening::Front => "FRONT",
            DoorOpening::Rear => "REAR",
            DoorOpening::Both => "BOTH",
        };
        f.write_str(name)
    }
}

/// A floor grant: floor number plus the doors that may open there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Floor {
    number: u8,
    door_opening: DoorOpening,
}

impl Floor {
    /// Create a floor grant, rejecting numbers outside 1..=255
    pub fn new(number: u32, door_opening: DoorOpening) -> Result<Self> {
        if !(FLOOR_NUMBER_MIN..=FLOOR_NUMBER_MAX).contains(&number) {
            return Err(ElipError::Validation(format!(
                "floor number {} out of range {}..={}",
                number, FLOOR_NUMBER_MIN, FLOOR_NUMBER_MAX
            )));
        }

        Ok(Self {
            number: number as u8,
            door_opening,
        })
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn door_opening(&self) -> DoorOpening {
        self.door_opening
    }
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.number, self.door_opening)
    }
}

/// Accessible floors, keyed by floor number
///
/// Keys are unique by construction: inserting the same floor number twice is
/// a validation failure, never a silent overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FloorPermissions {
    floors: BTreeMap<u8, DoorOpening>,
}

impl FloorPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a floor grant
    pub fn insert(&mut self, floor: Floor) -> Result<()> {
        if self.floors.contains_key(&floor.number) {
            return Err(ElipError::Validation(format!(
                "duplicate floor number {}",
                floor.number
            )));
        }
        self.floors.insert(floor.number, floor.door_opening);
        Ok(())
    }

    /// Door opening granted for a floor, if any
    pub fn get(&self, number: u8) -> Option<DoorOpening> {
        self.floors.get(&number).copied()
    }

    pub fn len(&self) -> usize {
        self.floors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.floors.is_empty()
    }

    /// Floors in ascending floor-number order
    pub fn iter(&self) -> impl Iterator<Item = Floor> + '_ {
        self.floors.iter().map(|(&number, &door_opening)| Floor {
            number,
            door_opening,
        })
    }

    /// Pack into the 64-byte wire bitmap
    pub fn to_bitmap(&self) -> [u8; FLOOR_BITMAP_SIZE] {
        encode_floor_bitmap(self.iter())
    }
}

impl TryFrom<Vec<Floor>> for FloorPermissions {
    type Error = ElipError;

    fn try_from(floors: Vec<Floor>) -> Result<Self> {
        let mut permissions = FloorPermissions::new();
        for floor in floors {
            permissions.insert(floor)?;
        }
        Ok(permissions)
    }
}

impl fmt::Display for FloorPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, floor) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", floor)?;
        }
        f.write_str("]")
    }
}

// =============================================================================
// Bitmap Packing
// =============================================================================

/// Byte index and bit shift of a floor's 2-bit slot
///
/// Four floors per byte, lowest floor in the least significant pair.
/// Floor 242 lands in byte 60 at shift 2.
fn bitmap_slot(number: u8) -> (usize, u32) {
    let slot = usize::from(number) - 1;
    (slot * 2 / 8, ((slot % 4) * 2) as u32)
}

/// Pack floor grants into the 64-byte permission bitmap
///
/// Floors are OR-ed into place in ascending order, so the result does not
/// depend on the iteration order of the input.
pub fn encode_floor_bitmap<I>(floors: I) -> [u8; FLOOR_BITMAP_SIZE]
where
    I: IntoIterator<Item = Floor>,
{
    let mut sorted: Vec<Floor> = floors.into_iter().collect();
    sorted.sort_by_key(|floor| floor.number);

    let mut bitmap = [0u8; FLOOR_BITMAP_SIZE];
    for floor in sorted {
        let (index, shift) = bitmap_slot(floor.number);
        bitmap[index] |= floor.door_opening.bits() << shift;
    }
    bitmap
}

/// Unpack a permission bitmap into its granted floors
///
/// Floors whose slot is NONE are omitted, as is the spare slot after
/// floor 255. Result is in ascending floor order.
pub fn decode_floor_bitmap(bitmap: &[u8; FLOOR_BITMAP_SIZE]) -> Vec<Floor> {
    (FLOOR_NUMBER_MIN..=FLOOR_NUMBER_MAX)
        .filter_map(|number| {
            let number = number as u8;
            let (index, shift) = bitmap_slot(number);
            let door_opening = DoorOpening::from_bits(bitmap[index] >> shift);
            (door_opening != DoorOpening::None).then_some(Floor {
                number,
                door_opening,
            })
        })
        .collect()
}
