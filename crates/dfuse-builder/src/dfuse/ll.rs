//! Low-level representation of the DfuSe file structures
//!
//! Field order and widths match the file on disk.
use crate::{LLEncoder, Result, dfuse::err::Error};

pub(crate) const PREFIX_SIGNATURE: [u8; 5] = *b"DfuSe";
pub(crate) const PREFIX_VERSION: u8 = 0x01;
pub(crate) const TARGET_SIGNATURE: [u8; 6] = *b"Target";
pub(crate) const SUFFIX_SIGNATURE: [u8; 3] = *b"UFD";

/// Target name field length
pub const TARGET_NAME_LEN: usize = 255;

fn to_u32(len: usize, err: fn(usize) -> Error) -> Result<u32> {
    u32::try_from(len).map_err(|_| err(len).into())
}

#[derive(Debug, bincode::Encode)]
#[cfg_attr(test, derive(bincode::Decode))]
pub struct Prefix {
    signature: [u8; 5],
    version: u8,
    /// Prefix and targets size
    pub size: u32,
    pub targets: u8,
}

impl Prefix {
    pub fn try_new(targets_len: usize, targets: u8) -> Result<Self> {
        let size = targets_len
            .checked_add(Self::SIZE)
            .ok_or(Error::ImageTooLarge(targets_len))?;

        Ok(Self {
            signature: PREFIX_SIGNATURE,
            version: PREFIX_VERSION,
            size: to_u32(size, Error::ImageTooLarge)?,
            targets,
        })
    }
}

impl LLEncoder for Prefix {
    const SIZE: usize = 11;
}

#[derive(Debug, bincode::Encode)]
#[cfg_attr(test, derive(bincode::Decode))]
pub(crate) struct TargetHeader {
    signature: [u8; 6],
    pub alt_setting: u8,
    /// 1 if a name was given
    pub named: u32,
    pub name: [u8; TARGET_NAME_LEN],
    /// Size of the elements following the header
    pub size: u32,
    pub elements: u32,
}

impl TargetHeader {
    pub fn try_new(
        alt_setting: u8,
        name: &str,
        elements_len: usize,
        elements: u32,
    ) -> Result<Self> {
        Ok(Self {
            signature: TARGET_SIGNATURE,
            alt_setting,
            named: u32::from(!name.is_empty()),
            name: name_field(name),
            size: to_u32(elements_len, Error::PayloadTooLarge)?,
            elements,
        })
    }
}

impl LLEncoder for TargetHeader {
    const SIZE: usize = 274;
}

/// Non-ASCII characters are dropped, anything past 255 bytes is truncated.
pub(crate) fn name_field(name: &str) -> [u8; TARGET_NAME_LEN] {
    let mut field = [0u8; TARGET_NAME_LEN];
    name.bytes()
        .filter(u8::is_ascii)
        .zip(field.iter_mut())
        .for_each(|(b, f)| *f = b);
    field
}

#[derive(Debug, bincode::Encode)]
#[cfg_attr(test, derive(bincode::Decode))]
pub(crate) struct ElementHeader {
    pub address: u32,
    pub size: u32,
}

impl ElementHeader {
    pub fn try_new(address: u32, data_len: usize) -> Result<Self> {
        Ok(Self {
            address,
            size: to_u32(data_len, Error::PayloadTooLarge)?,
        })
    }
}

impl LLEncoder for ElementHeader {
    const SIZE: usize = 8;
}

#[derive(Debug, bincode::Encode)]
#[cfg_attr(test, derive(bincode::Decode))]
pub(crate) struct SuffixHeader {
    pub device: u16,
    pub product: u16,
    pub vendor: u16,
    pub dfu_version: u16,
    signature: [u8; 3],
    length: u8,
}

impl SuffixHeader {
    pub fn new(device: u16, product: u16, vendor: u16, dfu_version: u16) -> Self {
        Self {
            device,
            product,
            vendor,
            dfu_version,
            signature: SUFFIX_SIGNATURE,
            length: Suffix::SIZE as u8,
        }
    }
}

impl LLEncoder for SuffixHeader {
    const SIZE: usize = 12;
}

#[derive(Debug, bincode::Encode)]
#[cfg_attr(test, derive(bincode::Decode))]
pub(crate) struct Suffix {
    pub header: SuffixHeader,
    /// Complemented CRC32 of everything before this field
    pub crc: u32,
}

impl LLEncoder for Suffix {
    const SIZE: usize = 16;
}
