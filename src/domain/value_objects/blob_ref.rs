use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::errors::DomainError;

/// Reference to a blob.
///
/// A `Ref` is an opaque identifier, compared by value. The empty string is
/// the unset reference, which is what `null` decodes to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ref(String);

impl Ref {
    /// Wrap an existing identifier (for example a name read back from a
    /// remote path). Fresh references come from `RefGenerator`.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_set(&self) -> bool {
        !self.0.is_empty()
    }

    /// Decode a raw JSON payload.
    ///
    /// An empty payload or `null` yields the unset reference. Anything that
    /// is not a quoted JSON string is a `DomainError::InvalidRefFormat`.
    pub fn decode_json(data: &[u8]) -> Result<Self, DomainError> {
        let trimmed = data.trim_ascii();
        if trimmed.is_empty() || trimmed == b"null" {
            return Ok(Self::default());
        }

        let quoted = trimmed.len() >= 2
            && trimmed[0] == b'"'
            && trimmed[trimmed.len() - 1] == b'"';
        if !quoted {
            return Err(DomainError::InvalidRefFormat(
                String::from_utf8_lossy(data).into_owned(),
            ));
        }

        serde_json::from_slice::<String>(trimmed)
            .map(Self)
            .map_err(|_| DomainError::InvalidRefFormat(String::from_utf8_lossy(data).into_owned()))
    }

    /// Encode as a JSON string literal.
    pub fn encode_json(&self) -> String {
        serde_json::Value::String(self.0.clone()).to_string()
    }
}

impl std::fmt::Display for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Ref {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

struct RefVisitor;

impl<'de> Visitor<'de> for RefVisitor {
    type Value = Ref;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a JSON string or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Ref, E> {
        Ok(Ref(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Ref, E> {
        Ok(Ref(v))
    }

    fn visit_none<E: de::Error>(self) -> Result<Ref, E> {
        Ok(Ref::default())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Ref, E> {
        Ok(Ref::default())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Ref, D::Error> {
        deserializer.deserialize_string(RefVisitor)
    }
}

impl<'de> Deserialize<'de> for Ref {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_option(RefVisitor)
    }
}

/// A `Ref` plus the exact byte length of the referenced content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SizedRef {
    #[serde(rename = "ref")]
    reference: Ref,
    size: u32,
}

impl SizedRef {
    pub fn new(reference: Ref, size: u32) -> Self {
        Self { reference, size }
    }

    /// Finalize the size once the content length is known.
    pub fn with_size(self, size: u32) -> Self {
        Self {
            reference: self.reference,
            size,
        }
    }

    pub fn reference(&self) -> &Ref {
        &self.reference
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

impl std::fmt::Display for SizedRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}; {} bytes]", self.reference, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_json_round_trip() {
        let reference = Ref::from_id("550e8400-e29b-41d4-a716-446655440000.png");
        let json = serde_json::to_string(&reference).unwrap();
        assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000.png\"");

        let decoded: Ref = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, reference);
    }

    #[test]
    fn test_ref_deserialize_null_is_unset() {
        let decoded: Ref = serde_json::from_str("null").unwrap();
        assert!(!decoded.is_set());
        assert_eq!(decoded, Ref::default());
    }

    #[test]
    fn test_ref_deserialize_non_string_fails() {
        assert!(serde_json::from_str::<Ref>("42").is_err());
        assert!(serde_json::from_str::<Ref>("{\"id\":\"x\"}").is_err());
    }

    #[test]
    fn test_ref_inside_struct_with_missing_and_null_fields() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default)]
            blob: Ref,
        }

        let missing: Holder = serde_json::from_str("{}").unwrap();
        assert!(!missing.blob.is_set());

        let null: Holder = serde_json::from_str("{\"blob\":null}").unwrap();
        assert!(!null.blob.is_set());

        let set: Holder = serde_json::from_str("{\"blob\":\"abc.bin\"}").unwrap();
        assert_eq!(set.blob.as_str(), "abc.bin");
    }

    #[test]
    fn test_decode_json_empty_and_null_are_unset() {
        assert_eq!(Ref::decode_json(b"").unwrap(), Ref::default());
        assert_eq!(Ref::decode_json(b"null").unwrap(), Ref::default());
        assert_eq!(Ref::decode_json(b"  null ").unwrap(), Ref::default());
    }

    #[test]
    fn test_decode_json_rejects_unquoted_payloads() {
        let payloads: [&[u8]; 6] = [b"abc", b"\"abc", b"abc\"", b"\"", b"123", b"[\"a\"]"];
        for payload in payloads {
            let err = Ref::decode_json(payload).unwrap_err();
            match err {
                DomainError::InvalidRefFormat(p) => {
                    assert_eq!(p, String::from_utf8_lossy(payload))
                }
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn test_decode_json_unescapes_string() {
        let decoded = Ref::decode_json(br#""a\"b.bin""#).unwrap();
        assert_eq!(decoded.as_str(), "a\"b.bin");
        assert_eq!(Ref::decode_json(decoded.encode_json().as_bytes()).unwrap(), decoded);
    }

    #[test]
    fn test_sized_ref_display_and_equality() {
        let sized = SizedRef::new(Ref::from_id("abc.txt"), 12);
        assert_eq!(sized.to_string(), "[abc.txt; 12 bytes]");
        assert_eq!(sized, SizedRef::new(Ref::from_id("abc.txt"), 12));
        assert_ne!(sized, SizedRef::new(Ref::from_id("abc.txt"), 13));
        assert_ne!(sized, SizedRef::new(Ref::from_id("abd.txt"), 12));
    }

    #[test]
    fn test_sized_ref_with_size_keeps_reference() {
        let sized = SizedRef::new(Ref::from_id("x.bin"), 0).with_size(99);
        assert_eq!(sized.reference().as_str(), "x.bin");
        assert_eq!(sized.size(), 99);
    }
}
