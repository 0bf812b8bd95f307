pub mod task;

pub mod hex {
    /// Small ToHex trait used by consensus types for debugging output
    pub trait ToHex {
        fn to_hex(&self) -> String;
    }

    impl ToHex for Vec<u8> {
        fn to_hex(&self) -> String {
            hex::encode(self)
        }
    }

    impl ToHex for [u8] {
        fn to_hex(&self) -> String {
            hex::encode(self)
        }
    }
}

pub use serde_bytes;

#[cfg(test)]
mod tests {
    use super::hex::ToHex;

    #[test]
    fn to_hex_encodes_lowercase() {
        assert_eq!(vec![0xde, 0xad, 0xbe, 0xef].to_hex(), "deadbeef");
        assert_eq!([0x01u8, 0x0a][..].to_hex(), "010a");
    }
}
