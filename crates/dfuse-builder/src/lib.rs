use bincode::{Encode, config::Config};

use crate::err::Error;

pub mod checksum;
pub mod dfuse;
pub mod err;

pub type Result<T> = core::result::Result<T, Error>;

pub use dfuse::hl::{DfuImage, Element, Suffix, Target};

/// STMicroelectronics
pub const DEFAULT_VENDOR: u16 = 0x0483;
/// STM32 in DFU mode
pub const DEFAULT_PRODUCT: u16 = 0xDF11;
pub const DEFAULT_DEVICE: u16 = 0x0000;
/// DfuSe extension of DFU 1.1
pub const DEFAULT_DFU_VERSION: u16 = 0x011A;
/// Flash right after a 12K bootloader
pub const DEFAULT_ADDRESS: u32 = 0x08003000;
pub const DEFAULT_ALT_SETTING: u8 = 0;
pub const DEFAULT_NAME: &str = "ST...";

pub(crate) fn config() -> impl Config {
    bincode::config::standard()
        .with_little_endian()
        .with_fixed_int_encoding()
}

pub trait LLEncoder: Encode + Sized {
    /// Encoded size in bytes
    const SIZE: usize;

    fn serialize(&self) -> Result<Vec<u8>> {
        bincode::encode_to_vec(self, config()).map_err(|e| e.into())
    }
}

pub trait HLEncoder<T: LLEncoder>: Sized {
    fn as_ll(&self) -> Result<T>;
    fn to_bytes(&self) -> Result<Vec<u8>>;
}

/// Everything describing the image besides the payload itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Flash load address
    pub address: u32,
    /// DFU alternate setting
    pub alt_setting: u8,
    /// Target name, stored as at most 255 ASCII bytes
    pub name: String,
    pub vendor: u16,
    pub product: u16,
    /// bcdDevice
    pub device: u16,
    /// bcdDFU
    pub dfu_version: u16,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            alt_setting: DEFAULT_ALT_SETTING,
            name: DEFAULT_NAME.to_string(),
            vendor: DEFAULT_VENDOR,
            product: DEFAULT_PRODUCT,
            device: DEFAULT_DEVICE,
            dfu_version: DEFAULT_DFU_VERSION,
        }
    }
}

/// Wrap `payload` into a single-target DfuSe image
pub fn encode(payload: &[u8], metadata: &Metadata) -> Result<Vec<u8>> {
    DfuImage::from_metadata(payload, metadata).to_bytes()
}
