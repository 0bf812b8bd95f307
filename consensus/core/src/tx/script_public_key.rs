use borsh::{BorshDeserialize, BorshSerialize};
use coinsec_utils::hex::ToHex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::str::FromStr;

/// Size of the underlying script vector of a script.
pub const SCRIPT_VECTOR_SIZE: usize = 36;

/// Used as the underlying type for script public key data, optimized for the common p2pk script size (34).
pub type ScriptVec = SmallVec<[u8; SCRIPT_VECTOR_SIZE]>;

/// Represents the ScriptPublicKey Version
pub type ScriptPublicKeyVersion = u16;

/// Alias the `smallvec!` macro to ease maintenance
pub use smallvec::smallvec as scriptvec;

/// A versioned locking script
#[derive(Default, PartialEq, Eq, Clone, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScriptPublicKey {
    pub version: ScriptPublicKeyVersion,
    script: ScriptVec, // Kept private to preserve read-only semantics
}

impl std::fmt::Debug for ScriptPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptPublicKey").field("version", &self.version).field("script", &self.script.to_hex()).finish()
    }
}

impl std::fmt::Display for ScriptPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}{}", self.version, self.script.to_hex())
    }
}

impl ScriptPublicKey {
    pub fn new(version: ScriptPublicKeyVersion, script: ScriptVec) -> Self {
        Self { version, script }
    }

    pub fn from_vec(version: ScriptPublicKeyVersion, script: Vec<u8>) -> Self {
        Self { version, script: ScriptVec::from_vec(script) }
    }

    pub fn version(&self) -> ScriptPublicKeyVersion {
        self.version
    }

    pub fn script(&self) -> &[u8] {
        &self.script
    }
}

/// Parses the `Display` form: big-endian version (4 hex chars) followed by the script
impl FromStr for ScriptPublicKey {
    type Err = hex::FromHexError;

    fn from_str(hex_str: &str) -> Result<Self, Self::Err> {
        if hex_str.len() < 4 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let bytes = hex::decode(hex_str)?;
        let version = u16::from_be_bytes([bytes[0], bytes[1]]);
        Ok(Self { version, script: SmallVec::from_slice(&bytes[2..]) })
    }
}

impl BorshSerialize for ScriptPublicKey {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        borsh::BorshSerialize::serialize(&self.version, writer)?;
        borsh::BorshSerialize::serialize(&self.script.to_vec(), writer)
    }
}

impl BorshDeserialize for ScriptPublicKey {
    fn deserialize(buf: &mut &[u8]) -> std::io::Result<Self> {
        let version: ScriptPublicKeyVersion = BorshDeserialize::deserialize(buf)?;
        let script: Vec<u8> = BorshDeserialize::deserialize(buf)?;
        Ok(Self::from_vec(version, script))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse() {
        let spk = ScriptPublicKey::new(1, scriptvec![0xaa, 0xbb]);
        assert_eq!(spk.to_string(), "0001aabb");
        assert_eq!("0001aabb".parse::<ScriptPublicKey>().unwrap(), spk);
        assert!("01".parse::<ScriptPublicKey>().is_err());
    }

    #[test]
    fn borsh_preserves_version_and_script() {
        let spk = ScriptPublicKey::from_vec(3, vec![1, 2, 3, 4]);
        let bytes = spk.try_to_vec().unwrap();
        let decoded = ScriptPublicKey::try_from_slice(&bytes).unwrap();
        assert_eq!(decoded.version(), 3);
        assert_eq!(decoded.script(), &[1, 2, 3, 4]);
    }
}
