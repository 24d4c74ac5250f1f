//! Asset type definitions

use bios_core::{BiosError, Result};
use serde::{Deserialize, Serialize};

/// A known BIOS file, as published by a core plugin's metadata.
///
/// Validated once on construction; every later lookup can trust the name
/// is a flat file name and the digest is hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DescriptorRecord", into = "DescriptorRecord")]
pub struct AssetDescriptor {
    name: String,
    description: String,
    expected_digest: String,
    optional: bool,
    size: Option<u64>,
}

impl AssetDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expected_digest: impl Into<String>,
        optional: bool,
        size: Option<u64>,
    ) -> Result<Self> {
        let name = name.into();
        let expected_digest = expected_digest.into().trim().to_string();
        validate_name(&name)?;

        if expected_digest.is_empty() {
            return Err(BiosError::InvalidDescriptor(format!(
                "{}: MD5 is empty",
                name
            )));
        }
        if !expected_digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BiosError::InvalidDescriptor(format!(
                "{}: MD5 '{}' is not hex",
                name, expected_digest
            )));
        }

        let description = description.into();
        let description = if description.trim().is_empty() {
            name.clone()
        } else {
            description
        };

        Ok(Self {
            name,
            description,
            expected_digest,
            optional,
            size,
        })
    }

    /// Canonical file name inside the managed store
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Reference digest as supplied by the registry (case preserved)
    pub fn expected_digest(&self) -> &str {
        &self.expected_digest
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Advisory size in bytes; never enforced
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Case-insensitive digest comparison
    pub fn digest_matches(&self, digest: &str) -> bool {
        self.expected_digest.eq_ignore_ascii_case(digest.trim())
    }
}

/// Reject anything that would escape the flat store layout
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(BiosError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Wire shape of a descriptor in plugin metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DescriptorRecord {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "MD5")]
    md5: String,
    #[serde(rename = "Optional", default)]
    optional: bool,
    #[serde(rename = "Size", default, skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
}

impl TryFrom<DescriptorRecord> for AssetDescriptor {
    type Error = BiosError;

    fn try_from(record: DescriptorRecord) -> Result<Self> {
        AssetDescriptor::new(
            record.name,
            record.description,
            record.md5,
            record.optional,
            record.size,
        )
    }
}

impl From<AssetDescriptor> for DescriptorRecord {
    fn from(d: AssetDescriptor) -> Self {
        Self {
            name: d.name,
            description: d.description,
            md5: d.expected_digest,
            optional: d.optional,
            size: d.size,
        }
    }
}

/// Identity of the core plugin a catalog file belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `<core>.bios.toml` / `<core>.bios.json` file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreCatalogFile {
    pub core: CoreInfo,
    #[serde(default)]
    pub bios: Vec<AssetDescriptor>,
}
