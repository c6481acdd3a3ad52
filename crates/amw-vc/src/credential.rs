//! # Verifiable Credential Schema
//!
//! The envelope is rigid: unknown top-level or proof fields are rejected.
//! `credentialSubject` is the only extensible object; besides its `id` it
//! carries arbitrary application attributes such as `birthDate`.
//!
//! ## Tuple-shaped arrays
//!
//! - `@context` starts with exactly [`REQUIRED_CONTEXTS`], in order. Any
//!   further entries must be absolute URLs.
//! - `type` starts with `"VerifiableCredential"` followed by at least one
//!   more type.
//!
//! Both are validated newtypes, so a value that deserialized is a value that
//! satisfies the schema.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use amw_core::{CredentialId, Did, Timestamp};

use crate::error::VcError;

pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const DATA_INTEGRITY_V1_CONTEXT: &str = "https://w3id.org/security/data-integrity/v1";
pub const EDDSA_2022_CONTEXT: &str = "https://w3id.org/security/suites/eddsa-2022/v1";

/// Mandatory leading `@context` entries.
pub const REQUIRED_CONTEXTS: [&str; 3] = [
    CREDENTIALS_V1_CONTEXT,
    DATA_INTEGRITY_V1_CONTEXT,
    EDDSA_2022_CONTEXT,
];

pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";
pub const RESIDENT_CREDENTIAL_TYPE: &str = "ResidentCredential";

/// Issuer of the sample resident credential.
pub const SAMPLE_ISSUER: &str = "did:amatelus:local-government-sample";

/// Subject attribute holding the holder's date of birth (`YYYY-MM-DD`).
pub const BIRTH_DATE_ATTRIBUTE: &str = "birthDate";

const SAMPLE_JWS: &str = "samplejws";

// ---------------------------------------------------------------------------
// @context
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CredentialContext(Vec<String>);

impl CredentialContext {
    /// Validate a full `@context` array.
    pub fn new(entries: Vec<String>) -> Result<Self, String> {
        if entries.len() < REQUIRED_CONTEXTS.len() {
            return Err(format!(
                "@context must start with {} fixed entries, got {}",
                REQUIRED_CONTEXTS.len(),
                entries.len()
            ));
        }
        for (i, (got, want)) in entries.iter().zip(REQUIRED_CONTEXTS).enumerate() {
            if got != want {
                return Err(format!("@context[{i}] must be {want:?}, got {got:?}"));
            }
        }
        for extra in &entries[REQUIRED_CONTEXTS.len()..] {
            url::Url::parse(extra).map_err(|e| format!("@context entry {extra:?} is not a URL: {e}"))?;
        }
        Ok(Self(entries))
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }
}

impl Default for CredentialContext {
    fn default() -> Self {
        Self(REQUIRED_CONTEXTS.iter().map(|s| s.to_string()).collect())
    }
}

impl TryFrom<Vec<String>> for CredentialContext {
    type Error = String;

    fn try_from(entries: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<CredentialContext> for Vec<String> {
    fn from(ctx: CredentialContext) -> Self {
        ctx.0
    }
}

// ---------------------------------------------------------------------------
// type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CredentialTypes(Vec<String>);

impl CredentialTypes {
    pub fn new(types: Vec<String>) -> Result<Self, String> {
        match types.first().map(String::as_str) {
            Some(VERIFIABLE_CREDENTIAL_TYPE) if types.len() >= 2 => Ok(Self(types)),
            Some(VERIFIABLE_CREDENTIAL_TYPE) => {
                Err("type must name at least one type after \"VerifiableCredential\"".to_string())
            }
            _ => Err("type must start with \"VerifiableCredential\"".to_string()),
        }
    }

    /// `["VerifiableCredential", <specific>]`.
    pub fn with_specific(specific: &str) -> Self {
        Self(vec![VERIFIABLE_CREDENTIAL_TYPE.to_string(), specific.to_string()])
    }

    pub fn contains(&self, credential_type: &str) -> bool {
        self.0.iter().any(|t| t == credential_type)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<Vec<String>> for CredentialTypes {
    type Error = String;

    fn try_from(types: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(types)
    }
}

impl From<CredentialTypes> for Vec<String> {
    fn from(types: CredentialTypes) -> Self {
        types.0
    }
}

// ---------------------------------------------------------------------------
// Date-time strings
// ---------------------------------------------------------------------------

/// An RFC 3339 date-time kept verbatim.
///
/// The text is not normalized: a credential issued elsewhere as
/// `2024-01-01T00:00:00.000Z` must re-serialize to the same bytes, or the
/// transport hash computed by the sender would not match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateTimeString(String);

impl DateTimeString {
    pub fn new(value: impl Into<String>) -> Result<Self, String> {
        let value = value.into();
        chrono::DateTime::parse_from_rfc3339(&value)
            .map_err(|e| format!("{value:?} is not an RFC 3339 date-time: {e}"))?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Timestamp> for DateTimeString {
    fn from(ts: Timestamp) -> Self {
        Self(ts.to_iso8601())
    }
}

impl TryFrom<String> for DateTimeString {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DateTimeString> for String {
    fn from(dt: DateTimeString) -> Self {
        dt.0
    }
}

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

/// The holder the credential is about, plus free-form claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialSubject {
    pub id: Did,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl CredentialSubject {
    pub fn new(id: Did) -> Self {
        Self {
            id,
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// String-valued attribute.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// Proof
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofKind {
    DataIntegrityProof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cryptosuite {
    #[serde(rename = "eddsa-rdfc-2022")]
    EddsaRdfc2022,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationMethodRef {
    #[serde(rename = "#key-1")]
    Key1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    AssertionMethod,
}

/// Issuer proof attached to the credential.
///
/// Opaque to the wallet beyond its shape: `jws` is carried, not verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DataIntegrityProof {
    #[serde(rename = "type")]
    pub proof_type: ProofKind,
    pub cryptosuite: Cryptosuite,
    pub created: DateTimeString,
    pub verification_method: VerificationMethodRef,
    pub proof_purpose: ProofPurpose,
    pub jws: String,
}

impl DataIntegrityProof {
    pub fn new(created: DateTimeString, jws: impl Into<String>) -> Self {
        Self {
            proof_type: ProofKind::DataIntegrityProof,
            cryptosuite: Cryptosuite::EddsaRdfc2022,
            created,
            verification_method: VerificationMethodRef::Key1,
            proof_purpose: ProofPurpose::AssertionMethod,
            jws: jws.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: CredentialContext,
    pub id: CredentialId,
    #[serde(rename = "type")]
    pub credential_type: CredentialTypes,
    pub issuer: Did,
    pub issuance_date: DateTimeString,
    pub credential_subject: CredentialSubject,
    pub proof: DataIntegrityProof,
}

impl VerifiableCredential {
    /// A resident-registration credential for `holder`, as issued by the
    /// sample local government.
    pub fn sample_resident(holder: &Did, issued_at: Timestamp) -> Result<Self, VcError> {
        let mut subject = CredentialSubject::new(holder.clone());
        for (name, value) in [
            ("name", "サンプル 太郎"),
            (BIRTH_DATE_ATTRIBUTE, "1990-05-15"),
            ("address", "東京都渋谷区1-1-1"),
            ("nationality", "JP"),
            ("residenceStatus", "resident"),
        ] {
            subject
                .attributes
                .insert(name.to_string(), Value::String(value.to_string()));
        }

        Ok(Self {
            context: CredentialContext::default(),
            id: CredentialId::new_urn(),
            credential_type: CredentialTypes::with_specific(RESIDENT_CREDENTIAL_TYPE),
            issuer: Did::new(SAMPLE_ISSUER)?,
            issuance_date: issued_at.into(),
            credential_subject: subject,
            proof: DataIntegrityProof::new(issued_at.into(), SAMPLE_JWS),
        })
    }

    /// Replace or add one subject attribute.
    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.credential_subject
            .attributes
            .insert(name.to_string(), value.into());
        self
    }

    pub fn is_resident_credential(&self) -> bool {
        self.credential_type.contains(RESIDENT_CREDENTIAL_TYPE)
    }

    /// The subject's `birthDate`.
    ///
    /// # Errors
    ///
    /// [`VcError::MissingAttribute`] if absent, [`VcError::InvalidAttribute`]
    /// if not a `YYYY-MM-DD` string.
    pub fn birth_date(&self) -> Result<NaiveDate, VcError> {
        let raw = self
            .credential_subject
            .attribute(BIRTH_DATE_ATTRIBUTE)
            .ok_or_else(|| VcError::MissingAttribute(BIRTH_DATE_ATTRIBUTE.to_string()))?;
        let text = raw.as_str().ok_or_else(|| VcError::InvalidAttribute {
            name: BIRTH_DATE_ATTRIBUTE.to_string(),
            reason: "not a string".to_string(),
        })?;
        NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| VcError::InvalidAttribute {
            name: BIRTH_DATE_ATTRIBUTE.to_string(),
            reason: e.to_string(),
        })
    }

    /// Eligible as input to the age proof.
    pub fn has_birth_date(&self) -> bool {
        self.birth_date().is_ok()
    }
}

// ---------------------------------------------------------------------------
// Stored record
// ---------------------------------------------------------------------------

/// A credential as kept in the wallet: a display title plus the credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoredCredential {
    pub title: String,
    pub data: VerifiableCredential,
}

impl StoredCredential {
    pub const SAMPLE_TITLE: &'static str = "サンプル住民票VC";
    pub const RECEIVED_TITLE: &'static str = "受信VC";

    pub fn new(title: impl Into<String>, data: VerifiableCredential) -> Self {
        Self {
            title: title.into(),
            data,
        }
    }

    pub fn received(data: VerifiableCredential) -> Self {
        Self::new(Self::RECEIVED_TITLE, data)
    }

    pub fn id(&self) -> &CredentialId {
        &self.data.id
    }
}
