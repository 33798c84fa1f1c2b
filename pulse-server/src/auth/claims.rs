//! Access and refresh claim strings
//!
//! `[subjectId] SEP [credentialRecordId] SEP [reserved] SEP [expiryEpochMillis]`,
//! each field encoded with the [`ClaimCodec`]. Without a signing key the
//! reserved field is `encode(0)` and ignored on decode. With a key it carries
//! the first 8 bytes of an HMAC-SHA256 over the purpose and the other three
//! fields, so an access claim cannot stand in for a refresh claim.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::codec::{ClaimCodec, ClaimError};

type HmacSha256 = Hmac<Sha256>;

pub const CLAIM_FIELD_COUNT: usize = 4;

/// What a claim string is good for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimPurpose {
    Access,
    Refresh,
}

impl ClaimPurpose {
    fn label(self) -> &'static [u8] {
        match self {
            ClaimPurpose::Access => b"access",
            ClaimPurpose::Refresh => b"refresh",
        }
    }
}

/// Decoded positional fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claims {
    pub subject_id: i64,
    pub credential_record_id: i64,
    pub expires_at: i64,
}

/// Keyed HMAC for the reserved field
#[derive(Clone)]
pub struct ClaimSigner {
    keyed: HmacSha256,
}

impl std::fmt::Debug for ClaimSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimSigner").finish_non_exhaustive()
    }
}

impl ClaimSigner {
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, hmac::digest::InvalidLength> {
        Ok(Self {
            keyed: HmacSha256::new_from_slice(key.as_ref())?,
        })
    }

    fn mac(&self, purpose: ClaimPurpose, fields: [&str; 3], separator: char) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(purpose.label());
        for field in fields {
            let mut buf = [0u8; 4];
            mac.update(separator.encode_utf8(&mut buf).as_bytes());
            mac.update(field.as_bytes());
        }
        mac
    }

    fn tag(&self, purpose: ClaimPurpose, fields: [&str; 3], separator: char) -> u64 {
        let digest = self.mac(purpose, fields, separator).finalize().into_bytes();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head)
    }

    fn verify(&self, purpose: ClaimPurpose, fields: [&str; 3], separator: char, tag: u64) -> bool {
        self.mac(purpose, fields, separator)
            .verify_truncated_left(&tag.to_be_bytes())
            .is_ok()
    }
}

/// Codec plus optional signer: everything needed to mint and read claim strings
#[derive(Debug, Clone)]
pub struct CredentialFormat {
    codec: ClaimCodec,
    signer: Option<ClaimSigner>,
}

impl CredentialFormat {
    pub fn new(codec: ClaimCodec, signer: Option<ClaimSigner>) -> Self {
        Self { codec, signer }
    }

    pub fn codec(&self) -> &ClaimCodec {
        &self.codec
    }

    pub fn encode(&self, purpose: ClaimPurpose, claims: &Claims) -> Result<String, ClaimError> {
        let subject = self.codec.encode(non_negative(claims.subject_id, "subject id")?);
        let record = self
            .codec
            .encode(non_negative(claims.credential_record_id, "credential record id")?);
        let expiry = self.codec.encode(non_negative(claims.expires_at, "expiry")?);

        let reserved = match &self.signer {
            Some(signer) => {
                let tag = signer.tag(purpose, [&subject, &record, &expiry], self.codec.separator());
                self.codec.encode(tag)
            }
            None => self.codec.encode(0),
        };

        Ok(self.codec.join(&[subject, record, reserved, expiry]))
    }

    /// Structural split and field decode. No clock and no I/O.
    pub fn decode(&self, purpose: ClaimPurpose, token: &str) -> Result<Claims, ClaimError> {
        let fields = self.codec.split(token, CLAIM_FIELD_COUNT)?;
        let (subject, record, reserved, expiry) = (fields[0], fields[1], fields[2], fields[3]);

        let subject_id = to_i64(self.codec.decode(subject)?, "subject id")?;
        let credential_record_id = to_i64(self.codec.decode(record)?, "credential record id")?;
        let expires_at = to_i64(self.codec.decode(expiry)?, "expiry")?;

        if let Some(signer) = &self.signer {
            let tag = self.codec.decode(reserved)?;
            if !signer.verify(purpose, [subject, record, expiry], self.codec.separator(), tag) {
                return Err(ClaimError::MalformedClaim("integrity tag mismatch".to_string()));
            }
        }

        Ok(Claims {
            subject_id,
            credential_record_id,
            expires_at,
        })
    }
}

fn non_negative(value: i64, what: &str) -> Result<u64, ClaimError> {
    u64::try_from(value).map_err(|_| ClaimError::MalformedClaim(format!("{what} is negative")))
}

fn to_i64(value: u64, what: &str) -> Result<i64, ClaimError> {
    i64::try_from(value).map_err(|_| ClaimError::MalformedClaim(format!("{what} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::codec::{Alphabet, BASE36};

    fn codec() -> ClaimCodec {
        ClaimCodec::new(Alphabet::new(BASE36).unwrap(), '.').unwrap()
    }

    fn claims() -> Claims {
        Claims {
            subject_id: 42,
            credential_record_id: 7,
            expires_at: 1_700_000_003_600_000,
        }
    }

    #[test]
    fn unsigned_format_has_zero_reserved_field() {
        let format = CredentialFormat::new(codec(), None);
        let token = format.encode(ClaimPurpose::Access, &claims()).unwrap();
        let fields: Vec<&str> = token.split('.').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], "16");
        assert_eq!(fields[1], "7");
        assert_eq!(fields[2], "0");
        assert_eq!(format.decode(ClaimPurpose::Access, &token).unwrap(), claims());
    }

    #[test]
    fn unsigned_format_ignores_reserved_field() {
        let format = CredentialFormat::new(codec(), None);
        let c = codec();
        let expiry = c.encode(99);
        let token = c.join(&["16", "7", "zzzz", expiry.as_str()]);
        let decoded = format.decode(ClaimPurpose::Access, &token).unwrap();
        assert_eq!(decoded.subject_id, 42);
        assert_eq!(decoded.expires_at, 99);
    }

    #[test]
    fn signed_format_round_trips_and_rejects_tampering() {
        let format = CredentialFormat::new(codec(), Some(ClaimSigner::new("secret").unwrap()));
        let token = format.encode(ClaimPurpose::Access, &claims()).unwrap();
        assert_eq!(format.decode(ClaimPurpose::Access, &token).unwrap(), claims());

        // Bump the subject id, keep the tag
        let fields: Vec<&str> = token.split('.').collect();
        let forged = codec().join(&["17", fields[1], fields[2], fields[3]]);
        assert!(matches!(
            format.decode(ClaimPurpose::Access, &forged),
            Err(ClaimError::MalformedClaim(_))
        ));
    }

    #[test]
    fn signed_purposes_are_not_interchangeable() {
        let format = CredentialFormat::new(codec(), Some(ClaimSigner::new("secret").unwrap()));
        let refresh = format.encode(ClaimPurpose::Refresh, &claims()).unwrap();
        assert!(format.decode(ClaimPurpose::Refresh, &refresh).is_ok());
        assert!(format.decode(ClaimPurpose::Access, &refresh).is_err());
    }

    #[test]
    fn other_key_rejects() {
        let minted = CredentialFormat::new(codec(), Some(ClaimSigner::new("one").unwrap()));
        let checker = CredentialFormat::new(codec(), Some(ClaimSigner::new("two").unwrap()));
        let token = minted.encode(ClaimPurpose::Access, &claims()).unwrap();
        assert!(checker.decode(ClaimPurpose::Access, &token).is_err());
    }

    #[test]
    fn decode_rejects_bad_structure() {
        let format = CredentialFormat::new(codec(), None);
        assert!(matches!(
            format.decode(ClaimPurpose::Access, "16.7.0"),
            Err(ClaimError::MalformedToken { found: 3, .. })
        ));
        assert!(matches!(
            format.decode(ClaimPurpose::Access, "16.7.0.A!"),
            Err(ClaimError::MalformedClaim(_))
        ));
        // u64 above i64::MAX
        let huge = codec().encode(u64::MAX);
        let token = codec().join(&[huge.as_str(), "7", "0", "1"]);
        assert!(matches!(
            format.decode(ClaimPurpose::Access, &token),
            Err(ClaimError::MalformedClaim(_))
        ));
    }

    #[test]
    fn encode_rejects_negative_fields() {
        let format = CredentialFormat::new(codec(), None);
        let bad = Claims {
            subject_id: -1,
            ..claims()
        };
        assert!(format.encode(ClaimPurpose::Access, &bad).is_err());
    }
}
