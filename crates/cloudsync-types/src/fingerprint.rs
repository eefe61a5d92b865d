use std::fmt;
use std::io::{self, BufReader, Read};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Size of the read buffer used when streaming content through the digest.
const CHUNK_SIZE: usize = 64 * 1024;

/// Content fingerprint used for change detection.
///
/// A `Fingerprint` is the MD5 digest of a file's full byte content, the same
/// 128-bit value object stores report as an object's ETag. Identical content
/// always produces the same `Fingerprint`, regardless of file name, mtime or
/// permissions. It is not a security guarantee.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Fingerprint an in-memory byte slice.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(md5::compute(data).0)
    }

    /// Stream a reader to completion through the digest.
    ///
    /// Fails if any read fails; a partial digest is never returned.
    pub fn compute<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let mut context = md5::Context::new();
        io::copy(&mut BufReader::with_capacity(CHUNK_SIZE, reader), &mut context)?;
        Ok(Self(context.compute().0))
    }

    /// Lowercase hex representation (32 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string. Case-insensitive.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s.trim()).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 16 {
            return Err(TypeError::InvalidLength {
                expected: 16,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that yields some bytes and then fails.
    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(io::ErrorKind::Other, "disk gone"));
            }
            self.served = true;
            buf[0] = b'x';
            Ok(1)
        }
    }

    #[test]
    fn known_md5_vectors() {
        assert_eq!(
            Fingerprint::from_bytes(b"").to_hex(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            Fingerprint::from_bytes(b"hello").to_hex(),
            "5d41402abc4b2a76b9719d911017c592"
        );
    }

    #[test]
    fn streaming_matches_one_shot() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let streamed = Fingerprint::compute(&mut Cursor::new(&data)).unwrap();
        assert_eq!(streamed, Fingerprint::from_bytes(&data));
    }

    #[test]
    fn single_byte_change_is_detected() {
        let a = Fingerprint::from_bytes(b"content-a");
        let b = Fingerprint::from_bytes(b"content-b");
        assert_ne!(a, b);
    }

    /// Reader that is interrupted before every successful read.
    struct InterruptingReader<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl Read for InterruptingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            let n = self.data.len().min(buf.len()).min(3);
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let data = b"interrupted stream";
        let mut reader = InterruptingReader {
            data,
            interrupt: false,
        };
        let fp = Fingerprint::compute(&mut reader).unwrap();
        assert_eq!(fp, Fingerprint::from_bytes(data));
    }

    #[test]
    fn read_failure_is_propagated() {
        let err = Fingerprint::compute(&mut FailingReader { served: false }).unwrap_err();
        assert_eq!(err.to_string(), "disk gone");
    }

    #[test]
    fn hex_parsing_is_case_insensitive() {
        let fp = Fingerprint::from_bytes(b"case");
        let upper = fp.to_hex().to_uppercase();
        assert_eq!(Fingerprint::from_hex(&upper).unwrap(), fp);
    }

    #[test]
    fn hex_of_wrong_length_is_rejected() {
        let err = Fingerprint::from_hex("abcd").unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 16, actual: 2 });
        assert!(matches!(
            Fingerprint::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn serde_uses_hex_string() {
        let fp = Fingerprint::from_bytes(b"serde test");
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", fp.to_hex()));
        let parsed: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, fp);
    }

    proptest::proptest! {
        #[test]
        fn identical_bytes_identical_fingerprint(
            data in proptest::collection::vec(proptest::num::u8::ANY, 0..4096)
        ) {
            let a = Fingerprint::compute(&mut Cursor::new(&data)).unwrap();
            let b = Fingerprint::from_bytes(&data);
            proptest::prop_assert_eq!(a, b);
        }
    }
}
