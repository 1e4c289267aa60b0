//! High-level representation of a DfuSe image
//!
//! Intended for end use. Only a single target holding a single element is supported.
use std::{borrow::Cow, fmt::Display};

use derive_ctor::ctor;
use getset::{CopyGetters, Getters};

use crate::{
    HLEncoder, LLEncoder, Metadata, Result,
    checksum::dfu_crc,
    dfuse::ll,
};

/// Contiguous chunk of memory to be flashed
#[derive(Debug, Getters, CopyGetters, ctor)]
pub struct Element<'a> {
    /// Load address
    #[getset(get_copy = "pub")]
    address: u32,

    /// Raw bytes, stored verbatim
    #[getset(get = "pub")]
    data: Cow<'a, [u8]>,
}

impl HLEncoder<ll::ElementHeader> for Element<'_> {
    fn as_ll(&self) -> Result<ll::ElementHeader> {
        ll::ElementHeader::try_new(self.address, self.data.len())
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.size());
        bytes.extend(self.as_ll()?.serialize()?);
        bytes.extend_from_slice(&self.data);
        Ok(bytes)
    }
}

impl Display for Element<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Address: {:#010X}", self.address)?;
        write!(f, "Data: {} bytes", self.data.len())
    }
}

impl Element<'_> {
    /// Encoded size including the element header
    #[must_use]
    pub fn size(&self) -> usize {
        ll::ElementHeader::SIZE + self.data.len()
    }
}

/// Named memory region selected by a DFU alternate setting
#[derive(Debug, Getters, CopyGetters, ctor)]
pub struct Target<'a> {
    /// DFU alternate setting
    #[getset(get_copy = "pub")]
    alt_setting: u8,

    /// Name as given, see [`Target::stored_name`]
    #[getset(get = "pub")]
    name: String,

    #[getset(get = "pub")]
    element: Element<'a>,
}

impl HLEncoder<ll::TargetHeader> for Target<'_> {
    fn as_ll(&self) -> Result<ll::TargetHeader> {
        ll::TargetHeader::try_new(self.alt_setting, &self.name, self.element.size(), 1)
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.size());
        bytes.extend(self.as_ll()?.serialize()?);
        bytes.extend(self.element.to_bytes()?);
        Ok(bytes)
    }
}

impl Display for Target<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Alt setting: {}", self.alt_setting)?;
        if self.is_named() {
            writeln!(f, "Name: {}", self.stored_name())?;
        } else {
            writeln!(f, "Name: (none)")?;
        }
        writeln!(f, "Element:")?;
        for line in format!("{}", self.element).lines() {
            writeln!(f, "\t{line}")?;
        }

        Ok(())
    }
}

impl Target<'_> {
    /// Whether a name was given at all, even if nothing of it survives encoding
    #[must_use]
    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }

    /// Name as it ends up in the file: ASCII only, at most 255 bytes
    #[must_use]
    pub fn stored_name(&self) -> String {
        let field = ll::name_field(&self.name);
        let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
        String::from_utf8_lossy(&field[..end]).into_owned()
    }

    /// Encoded size including the target header
    #[must_use]
    pub fn size(&self) -> usize {
        ll::TargetHeader::SIZE + self.element.size()
    }
}

/// Device identification appended after the targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters, ctor)]
pub struct Suffix {
    /// bcdDevice
    #[getset(get_copy = "pub")]
    device: u16,

    /// USB product ID
    #[getset(get_copy = "pub")]
    product: u16,

    /// USB vendor ID
    #[getset(get_copy = "pub")]
    vendor: u16,

    /// bcdDFU
    #[getset(get_copy = "pub")]
    dfu_version: u16,
}

impl Display for Suffix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Device version: {:#06X}", self.device)?;
        writeln!(f, "Product ID: {:#06X}", self.product)?;
        writeln!(f, "Vendor ID: {:#06X}", self.vendor)?;
        write!(f, "DFU version: {:#06X}", self.dfu_version)
    }
}

impl Suffix {
    pub(crate) fn header(&self) -> ll::SuffixHeader {
        ll::SuffixHeader::new(self.device, self.product, self.vendor, self.dfu_version)
    }

    /// Build the suffix for `body`, checksumming the body and the suffix itself
    pub fn seal(&self, body: &[u8]) -> Result<Vec<u8>> {
        let header = self.header();
        let crc = dfu_crc(&[body, &header.serialize()?]);
        ll::Suffix { header, crc }.serialize()
    }
}

/// Complete DfuSe file
#[derive(Debug, Getters, ctor)]
pub struct DfuImage<'a> {
    #[getset(get = "pub")]
    target: Target<'a>,

    #[getset(get = "pub")]
    suffix: Suffix,
}

impl HLEncoder<ll::Prefix> for DfuImage<'_> {
    fn as_ll(&self) -> Result<ll::Prefix> {
        ll::Prefix::try_new(self.target.size(), 1)
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut image = self.body()?;
        let suffix = self.suffix.seal(&image)?;
        image.extend(suffix);
        Ok(image)
    }
}

impl Display for DfuImage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Size: {} bytes", self.size())?;
        writeln!(f, "Target:")?;
        for line in format!("{}", self.target).lines() {
            writeln!(f, "\t{line}")?;
        }
        writeln!(f, "Suffix:")?;
        for line in format!("{}", self.suffix).lines() {
            writeln!(f, "\t{line}")?;
        }

        Ok(())
    }
}

impl<'a> DfuImage<'a> {
    /// Single target image borrowing `payload`
    #[must_use]
    pub fn from_metadata(payload: &'a [u8], metadata: &Metadata) -> Self {
        Self {
            target: Target::new(
                metadata.alt_setting,
                metadata.name.clone(),
                Element::new(metadata.address, Cow::Borrowed(payload)),
            ),
            suffix: Suffix::new(
                metadata.device,
                metadata.product,
                metadata.vendor,
                metadata.dfu_version,
            ),
        }
    }
}

impl DfuImage<'_> {
    /// Prefix followed by the target, everything the suffix checksum covers besides itself
    pub fn body(&self) -> Result<Vec<u8>> {
        let mut body = Vec::with_capacity(self.size());
        body.extend(self.as_ll()?.serialize()?);
        body.extend(self.target.to_bytes()?);
        Ok(body)
    }

    /// Total encoded size
    #[must_use]
    pub fn size(&self) -> usize {
        ll::Prefix::SIZE + self.target.size() + ll::Suffix::SIZE
    }
}
