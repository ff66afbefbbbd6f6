//! # Envelope Decoding
//!
//! Decodes the signed JSON envelope in a single pass:
//!
//! ```text
//! {"alexandria-media": {...fields...}, "signature": "<address signature>"}
//! ```
//!
//! The top-level object is read into an ordered entry list (duplicates kept),
//! which gives both the raw key set for the root-key rule and the record body
//! for typed decoding without parsing the bytes twice.

use super::entities::{MediaDraft, PublisherDraft, RecordKind};
use super::errors::ProtocolError;
use super::value_objects::SIGNATURE_KEY;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Top-level entries of a document, in order, duplicates included.
struct RawEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object envelope")
            }

            fn visit_map<A>(self, mut map: A) -> Result<RawEntries, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(2));
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// A decoded envelope: one root record plus its asserted signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    kind: RecordKind,
    body: Value,
    signature: String,
    keys: Vec<String>,
}

impl Envelope {
    /// Decode an envelope rooted at either announcement kind.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Self::decode_inner(bytes, None)
    }

    /// Decode an envelope that must be rooted at `kind`.
    ///
    /// Any top-level key other than `kind.root_key()` and `signature` fails
    /// with [`ProtocolError::UnexpectedRootKey`].
    pub fn decode_expecting(bytes: &[u8], kind: RecordKind) -> Result<Self, ProtocolError> {
        Self::decode_inner(bytes, Some(kind))
    }

    fn decode_inner(bytes: &[u8], expected: Option<RecordKind>) -> Result<Self, ProtocolError> {
        let RawEntries(entries) = serde_json::from_slice(bytes)
            .map_err(|e| ProtocolError::malformed(e.to_string()))?;

        let mut root: Option<(RecordKind, Value)> = None;
        let mut signature: Option<String> = None;
        let mut keys = Vec::with_capacity(entries.len());

        for (key, value) in entries {
            keys.push(key.clone());

            if key == SIGNATURE_KEY {
                let Value::String(asserted) = value else {
                    return Err(ProtocolError::malformed("signature must be a string"));
                };
                if let Some(existing) = &signature {
                    if *existing != asserted {
                        return Err(ProtocolError::SignatureFieldMismatch);
                    }
                } else {
                    signature = Some(asserted);
                }
                continue;
            }

            let kind = match (RecordKind::from_root_key(&key), expected) {
                (Some(kind), None) => kind,
                (Some(kind), Some(want)) if kind == want => kind,
                _ => return Err(ProtocolError::UnexpectedRootKey { key }),
            };

            if let Some((existing, _)) = &root {
                return Err(if *existing != kind {
                    ProtocolError::UnexpectedRootKey { key }
                } else {
                    ProtocolError::malformed(format!("duplicate root key {key}"))
                });
            }
            root = Some((kind, value));
        }

        let (kind, body) = root.ok_or_else(|| ProtocolError::malformed("missing root key"))?;
        let signature = signature.ok_or_else(|| ProtocolError::malformed("missing signature"))?;

        Ok(Self {
            kind,
            body,
            signature,
            keys,
        })
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Signature asserted by the outer envelope.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Top-level keys in document order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Decode the body as a media record.
    pub fn into_media(self) -> Result<MediaDraft, ProtocolError> {
        if self.kind != RecordKind::Media {
            return Err(ProtocolError::UnexpectedRootKey {
                key: self.kind.root_key().to_string(),
            });
        }

        let body: MediaBody = serde_json::from_value(self.body)
            .map_err(|e| ProtocolError::malformed(format!("alexandria-media: {e}")))?;
        check_inner_signature(body.signature.as_deref(), &self.signature)?;

        Ok(MediaDraft {
            torrent_hash: body.torrent,
            publisher_address: body.publisher,
            timestamp: body.timestamp,
            record_type: body.record_type,
            title: body.info.title,
            description: body.info.description,
            year: body.info.year,
            size: body.info.size,
            extra_info: body.info.extra_info.filter(|v| !v.is_null()),
            payment: body.payment.filter(|v| !v.is_null()),
            extras: body.extras.and_then(extras_text),
            signature: self.signature,
        })
    }

    /// Decode the body as a publisher record.
    pub fn into_publisher(self) -> Result<PublisherDraft, ProtocolError> {
        if self.kind != RecordKind::Publisher {
            return Err(ProtocolError::UnexpectedRootKey {
                key: self.kind.root_key().to_string(),
            });
        }

        let body: PublisherBody = serde_json::from_value(self.body)
            .map_err(|e| ProtocolError::malformed(format!("alexandria-publisher: {e}")))?;
        check_inner_signature(body.signature.as_deref(), &self.signature)?;

        Ok(PublisherDraft {
            name: body.name,
            address: body.address,
            timestamp: body.timestamp,
            email_hash: body.emailmd5.filter(|s| !s.is_empty()),
            alternate_contact: body.bitmessage.filter(|s| !s.is_empty()),
            signature: self.signature,
        })
    }
}

fn check_inner_signature(inner: Option<&str>, outer: &str) -> Result<(), ProtocolError> {
    match inner {
        Some(asserted) if asserted != outer => Err(ProtocolError::SignatureFieldMismatch),
        _ => Ok(()),
    }
}

/// `extras` is free text; structured values are kept as their JSON text.
fn extras_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

// =============================================================================
// Wire bodies
// =============================================================================
//
// Missing scalars decode to zero values so the schema validator can name the
// offending field.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MediaBody {
    torrent: String,
    publisher: String,
    timestamp: i64,
    #[serde(rename = "type")]
    record_type: String,
    info: MediaInfo,
    payment: Option<Value>,
    extras: Option<Value>,
    signature: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MediaInfo {
    title: String,
    description: String,
    year: i64,
    size: Option<i64>,
    #[serde(rename = "extra-info")]
    extra_info: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PublisherBody {
    name: String,
    address: String,
    timestamp: i64,
    emailmd5: Option<String>,
    bitmessage: Option<String>,
    signature: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEDIA: &str = r#"{"alexandria-media":{"torrent":"abc123","publisher":"FAddr1","timestamp":12345,"type":"song","info":{"title":"T","description":"D","year":2020},"payment":{"currency":"FLO","type":"flat","amount":1}},"signature":"SIGVALUE"}"#;

    #[test]
    fn test_decode_media_envelope() {
        let envelope = Envelope::decode(MEDIA.as_bytes()).unwrap();
        assert_eq!(envelope.kind(), RecordKind::Media);
        assert_eq!(envelope.signature(), "SIGVALUE");
        assert_eq!(envelope.keys(), ["alexandria-media", "signature"]);

        let draft = envelope.into_media().unwrap();
        assert_eq!(draft.torrent_hash, "abc123");
        assert_eq!(draft.publisher_address, "FAddr1");
        assert_eq!(draft.timestamp, 12345);
        assert_eq!(draft.record_type, "song");
        assert_eq!(draft.year, 2020);
        assert_eq!(draft.signature, "SIGVALUE");
        assert!(draft.payment.is_some());
        assert!(draft.size.is_none());
    }

    #[test]
    fn test_not_json_is_malformed() {
        let result = Envelope::decode(b"this string isn't even JSON!");
        assert!(matches!(
            result,
            Err(ProtocolError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_non_object_is_malformed() {
        let result = Envelope::decode(b"[1, 2, 3]");
        assert!(matches!(
            result,
            Err(ProtocolError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_extra_top_level_key_rejected() {
        let doc = r#"{"alexandria-media":{},"signature":"S","bogus":1}"#;
        assert_eq!(
            Envelope::decode(doc.as_bytes()),
            Err(ProtocolError::UnexpectedRootKey {
                key: "bogus".into()
            })
        );
    }

    #[test]
    fn test_wrong_root_for_expected_kind() {
        let doc = r#"{"alexandria-publisher":{},"signature":"S"}"#;
        assert_eq!(
            Envelope::decode_expecting(doc.as_bytes(), RecordKind::Media),
            Err(ProtocolError::UnexpectedRootKey {
                key: "alexandria-publisher".into()
            })
        );
    }

    #[test]
    fn test_both_roots_rejected() {
        let doc = r#"{"alexandria-media":{},"alexandria-publisher":{},"signature":"S"}"#;
        assert!(matches!(
            Envelope::decode(doc.as_bytes()),
            Err(ProtocolError::UnexpectedRootKey { .. })
        ));
    }

    #[test]
    fn test_conflicting_signatures_rejected() {
        let doc = r#"{"alexandria-media":{},"signature":"A","signature":"B"}"#;
        assert_eq!(
            Envelope::decode(doc.as_bytes()),
            Err(ProtocolError::SignatureFieldMismatch)
        );
    }

    #[test]
    fn test_inner_signature_must_match_outer() {
        let doc = r#"{"alexandria-publisher":{"name":"Joey","address":"FAddr1","timestamp":1,"signature":"X"},"signature":"Y"}"#;
        let envelope = Envelope::decode(doc.as_bytes()).unwrap();
        assert_eq!(
            envelope.into_publisher(),
            Err(ProtocolError::SignatureFieldMismatch)
        );
    }

    #[test]
    fn test_missing_or_non_string_signature() {
        let missing = r#"{"alexandria-media":{}}"#;
        assert!(matches!(
            Envelope::decode(missing.as_bytes()),
            Err(ProtocolError::MalformedDocument { .. })
        ));

        let numeric = r#"{"alexandria-media":{},"signature":5}"#;
        assert!(matches!(
            Envelope::decode(numeric.as_bytes()),
            Err(ProtocolError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_missing_root_is_malformed() {
        let doc = r#"{"signature":"S"}"#;
        assert!(matches!(
            Envelope::decode(doc.as_bytes()),
            Err(ProtocolError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_missing_fields_decode_to_zero_values() {
        let doc = r#"{"alexandria-media":{"torrent":"abc"},"signature":"S"}"#;
        let draft = Envelope::decode(doc.as_bytes())
            .unwrap()
            .into_media()
            .unwrap();
        assert_eq!(draft.year, 0);
        assert_eq!(draft.title, "");
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        let doc = r#"{"alexandria-media":{"timestamp":"soon"},"signature":"S"}"#;
        let result = Envelope::decode(doc.as_bytes()).unwrap().into_media();
        assert!(matches!(
            result,
            Err(ProtocolError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_extra_info_and_structured_extras() {
        let doc = r#"{"alexandria-media":{"info":{"extra-info":{"artist":"A"}},"extras":{"k":1}},"signature":"S"}"#;
        let draft = Envelope::decode(doc.as_bytes())
            .unwrap()
            .into_media()
            .unwrap();
        assert_eq!(draft.extra_info_json().as_deref(), Some(r#"{"artist":"A"}"#));
        assert_eq!(draft.extras.as_deref(), Some(r#"{"k":1}"#));
    }

    #[test]
    fn test_publisher_optional_contacts() {
        let doc = r#"{"alexandria-publisher":{"name":"Joey","address":"FAddr1","timestamp":12345,"emailmd5":"d41d8cd9","bitmessage":""},"signature":"S"} "#;
        let draft = Envelope::decode(doc.as_bytes())
            .unwrap()
            .into_publisher()
            .unwrap();
        assert_eq!(draft.email_hash.as_deref(), Some("d41d8cd9"));
        assert_eq!(draft.alternate_contact, None);
    }
}
