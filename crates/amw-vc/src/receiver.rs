//! # Chunked Transport Receiver
//!
//! ```text
//! AwaitingManifest ──manifest──▶ CollectingParts ──all parts──▶ Reconstructed
//!                                   ▲        │
//!                                   │        └──bad hash / bad credential──▶ Failed
//!                                   └───────────────re-scan a part──────────────┘
//! ```
//!
//! - Parts may arrive in any order and any number of times. A re-scanned
//!   index overwrites the stored chunk (last write wins).
//! - A new manifest starts a new transfer from any state.
//! - `Failed` keeps the part set. Re-scanning a part into a failed transfer
//!   overwrites that index and retries reconstruction, so a single
//!   mis-scanned code can be fixed without starting over.
//! - Malformed input never changes state.
//! - A manifest announcing more than the receiver's part cap is malformed
//!   input; see [`CredentialReceiver::with_max_parts`].
//!
//! One receiver holds one transfer. Concurrent transfers need independent
//! receivers.

use std::collections::BTreeMap;

use crate::codec::decode;
use crate::credential::VerifiableCredential;
use crate::error::TransportError;
use crate::transport::{Manifest, Part};

/// Externally visible state tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    AwaitingManifest,
    CollectingParts,
    Reconstructed,
    Failed,
}

/// Result of accepting one part.
#[derive(Debug, Clone, PartialEq)]
pub enum PartOutcome {
    /// Stored; `held` distinct indices of `total` so far.
    Progress { held: usize, total: usize },
    /// The last missing part arrived and the credential checked out.
    Complete(Box<VerifiableCredential>),
}

#[derive(Debug, Clone)]
struct Transfer {
    manifest: Manifest,
    parts: BTreeMap<usize, String>,
}

impl Transfer {
    fn new(manifest: Manifest) -> Self {
        Self {
            manifest,
            parts: BTreeMap::new(),
        }
    }

    fn held(&self) -> usize {
        self.parts.len()
    }

    fn total(&self) -> usize {
        self.manifest.total_parts
    }

    fn missing(&self) -> Vec<usize> {
        (0..self.total())
            .filter(|i| !self.parts.contains_key(i))
            .collect()
    }

    fn reconstruct(&self) -> Result<VerifiableCredential, TransportError> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(TransportError::MissingParts(missing));
        }
        let text: String = self.parts.values().map(String::as_str).collect();
        if !self.manifest.matches(&text) {
            return Err(TransportError::HashMismatch);
        }
        decode(&text).map_err(TransportError::InvalidCredential)
    }
}

#[derive(Debug, Clone, Default)]
enum Stage {
    #[default]
    AwaitingManifest,
    Collecting(Transfer),
    Failed(Transfer),
    Reconstructed {
        manifest: Manifest,
        credential: Box<VerifiableCredential>,
    },
}

/// Reassembles one credential from scanned manifest and part payloads.
#[derive(Debug, Clone)]
pub struct CredentialReceiver {
    stage: Stage,
    max_parts: usize,
}

impl Default for CredentialReceiver {
    fn default() -> Self {
        Self::with_max_parts(Manifest::DEFAULT_MAX_PARTS)
    }
}

impl CredentialReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A receiver that rejects manifests announcing more than `max_parts`.
    pub fn with_max_parts(max_parts: usize) -> Self {
        Self {
            stage: Stage::AwaitingManifest,
            max_parts,
        }
    }

    pub fn max_parts(&self) -> usize {
        self.max_parts
    }

    pub fn state(&self) -> ReceiverState {
        match self.stage {
            Stage::AwaitingManifest => ReceiverState::AwaitingManifest,
            Stage::Collecting(_) => ReceiverState::CollectingParts,
            Stage::Failed(_) => ReceiverState::Failed,
            Stage::Reconstructed { .. } => ReceiverState::Reconstructed,
        }
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        match &self.stage {
            Stage::AwaitingManifest => None,
            Stage::Collecting(t) | Stage::Failed(t) => Some(&t.manifest),
            Stage::Reconstructed { manifest, .. } => Some(manifest),
        }
    }

    /// `(held, total)`, or `None` before a manifest.
    pub fn progress(&self) -> Option<(usize, usize)> {
        match &self.stage {
            Stage::AwaitingManifest => None,
            Stage::Collecting(t) | Stage::Failed(t) => Some((t.held(), t.total())),
            Stage::Reconstructed { manifest, .. } => {
                Some((manifest.total_parts, manifest.total_parts))
            }
        }
    }

    /// Indices still to scan, ascending. Empty outside `CollectingParts`.
    pub fn missing_parts(&self) -> Vec<usize> {
        match &self.stage {
            Stage::Collecting(t) => t.missing(),
            _ => Vec::new(),
        }
    }

    /// The reconstructed credential, once available.
    pub fn credential(&self) -> Option<&VerifiableCredential> {
        match &self.stage {
            Stage::Reconstructed { credential, .. } => Some(credential.as_ref()),
            _ => None,
        }
    }

    /// Start a transfer from a scanned manifest. Any previous transfer,
    /// finished or not, is discarded.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidMetadata`], including a `totalParts` above
    /// [`max_parts`](Self::max_parts); the receiver is unchanged.
    pub fn on_manifest(&mut self, raw: &str) -> Result<Manifest, TransportError> {
        let manifest = Manifest::parse_with_limit(raw, self.max_parts)?;
        tracing::info!(
            total_parts = manifest.total_parts,
            hash = %manifest.hash,
            "accepted transfer manifest"
        );
        self.stage = Stage::Collecting(Transfer::new(manifest.clone()));
        Ok(manifest)
    }

    /// Accept a scanned part.
    ///
    /// When the part completes the set, reconstruction runs immediately.
    /// A reconstruction failure moves the receiver to `Failed` and is
    /// returned as the error.
    pub fn on_part(&mut self, raw: &str) -> Result<PartOutcome, TransportError> {
        let total = match &self.stage {
            Stage::AwaitingManifest => return Err(TransportError::MetadataNotReceived),
            Stage::Reconstructed { .. } => return Err(TransportError::AlreadyReconstructed),
            Stage::Collecting(t) | Stage::Failed(t) => t.total(),
        };

        let part = Part::parse(raw)?;
        if part.index >= total {
            return Err(TransportError::IndexOutOfRange {
                index: part.index as u64,
                total_parts: total,
            });
        }

        // Every branch below writes the stage back.
        let Some(mut transfer) = self.take_transfer() else {
            return Err(TransportError::MetadataNotReceived);
        };
        let replaced = transfer.parts.insert(part.index, part.chunk).is_some();
        let (held, total) = (transfer.held(), transfer.total());
        tracing::debug!(index = part.index, held, total, replaced, "stored part");

        if held < total {
            self.stage = Stage::Collecting(transfer);
            return Ok(PartOutcome::Progress { held, total });
        }

        match transfer.reconstruct() {
            Ok(credential) => {
                tracing::info!(credential = %credential.id, total, "reconstructed credential");
                let credential = Box::new(credential);
                self.stage = Stage::Reconstructed {
                    manifest: transfer.manifest,
                    credential: credential.clone(),
                };
                Ok(PartOutcome::Complete(credential))
            }
            Err(err) => {
                tracing::warn!(error = %err, total, "reconstruction failed");
                self.stage = Stage::Failed(transfer);
                Err(err)
            }
        }
    }

    /// Attempt reconstruction with whatever is held now.
    ///
    /// With parts still missing this reports every missing index and leaves
    /// the transfer collecting. Other failures move it to `Failed`.
    pub fn try_reconstruct(&mut self) -> Result<VerifiableCredential, TransportError> {
        match &self.stage {
            Stage::AwaitingManifest => return Err(TransportError::MetadataNotReceived),
            Stage::Reconstructed { credential, .. } => return Ok(credential.as_ref().clone()),
            Stage::Collecting(_) | Stage::Failed(_) => {}
        }
        let was_failed = matches!(self.stage, Stage::Failed(_));
        let Some(transfer) = self.take_transfer() else {
            return Err(TransportError::MetadataNotReceived);
        };
        match transfer.reconstruct() {
            Ok(credential) => {
                self.stage = Stage::Reconstructed {
                    manifest: transfer.manifest,
                    credential: Box::new(credential.clone()),
                };
                Ok(credential)
            }
            Err(err @ TransportError::MissingParts(_)) => {
                self.stage = if was_failed {
                    Stage::Failed(transfer)
                } else {
                    Stage::Collecting(transfer)
                };
                Err(err)
            }
            Err(err) => {
                tracing::warn!(error = %err, "reconstruction failed");
                self.stage = Stage::Failed(transfer);
                Err(err)
            }
        }
    }

    /// Move the in-flight transfer out, leaving `AwaitingManifest`. The
    /// caller must store a new stage.
    fn take_transfer(&mut self) -> Option<Transfer> {
        match std::mem::take(&mut self.stage) {
            Stage::Collecting(t) | Stage::Failed(t) => Some(t),
            other => {
                self.stage = other;
                None
            }
        }
    }

    /// Drop any transfer and wait for a new manifest.
    pub fn reset(&mut self) {
        self.stage = Stage::AwaitingManifest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::transport::{split, TransferPlan};
    use amw_core::{Did, Timestamp};

    fn sample() -> VerifiableCredential {
        let holder = Did::new("did:amatelus:receiver-holder").unwrap();
        let ts = Timestamp::parse("2024-06-01T00:00:00Z").unwrap();
        VerifiableCredential::sample_resident(&holder, ts).unwrap()
    }

    fn plan(parts: usize) -> (VerifiableCredential, TransferPlan) {
        let vc = sample()
            .with_attribute("name", "Sample Taro")
            .with_attribute("address", "1-1-1 Shibuya, Tokyo");
        let len = encode(&vc).unwrap().len();
        let plan = split(&vc, len.div_ceil(parts)).unwrap();
        assert_eq!(plan.parts.len(), parts);
        (vc, plan)
    }

    fn started(plan: &TransferPlan) -> CredentialReceiver {
        let mut rx = CredentialReceiver::new();
        rx.on_manifest(&plan.manifest.to_payload()).unwrap();
        rx
    }

    #[test]
    fn manifest_starts_collection_with_zero_progress() {
        let (_, plan) = plan(4);
        let rx = started(&plan);
        assert_eq!(rx.state(), ReceiverState::CollectingParts);
        assert_eq!(rx.progress(), Some((0, 4)));
        assert_eq!(rx.missing_parts(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn out_of_order_parts_reconstruct() {
        let (vc, plan) = plan(4);
        let mut rx = started(&plan);
        let mut last = None;
        for i in [2usize, 0, 3, 1] {
            last = Some(rx.on_part(&plan.parts[i].to_payload()).unwrap());
        }
        match last {
            Some(PartOutcome::Complete(got)) => assert_eq!(*got, vc),
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(rx.state(), ReceiverState::Reconstructed);
        assert_eq!(rx.credential(), Some(&vc));
        assert_eq!(rx.progress(), Some((4, 4)));
        assert!(rx.missing_parts().is_empty());
    }

    #[test]
    fn duplicate_part_does_not_advance_progress() {
        let (_, plan) = plan(3);
        let mut rx = started(&plan);
        let first = plan.parts[1].to_payload();
        assert_eq!(
            rx.on_part(&first).unwrap(),
            PartOutcome::Progress { held: 1, total: 3 }
        );
        assert_eq!(
            rx.on_part(&first).unwrap(),
            PartOutcome::Progress { held: 1, total: 3 }
        );
        assert_eq!(rx.missing_parts(), vec![0, 2]);
    }

    #[test]
    fn part_before_manifest_is_rejected() {
        let (_, plan) = plan(2);
        let mut rx = CredentialReceiver::new();
        let err = rx.on_part(&plan.parts[0].to_payload()).unwrap_err();
        assert_eq!(err.to_string(), "metadata not yet received");
        assert_eq!(rx.state(), ReceiverState::AwaitingManifest);
        assert!(rx.missing_parts().is_empty());
        assert_eq!(rx.progress(), None);
    }

    #[test]
    fn invalid_manifest_leaves_state_untouched() {
        let (_, plan) = plan(2);
        let mut rx = started(&plan);
        rx.on_part(&plan.parts[0].to_payload()).unwrap();
        let err = rx.on_manifest("{\"totalParts\":0}").unwrap_err();
        assert_eq!(err.to_string(), "invalid metadata");
        assert_eq!(rx.progress(), Some((1, 2)));
    }

    #[test]
    fn out_of_range_and_malformed_parts_are_rejected() {
        let (_, plan) = plan(4);
        let mut rx = started(&plan);
        let err = rx.on_part(r#"[4,"x"]"#).unwrap_err();
        assert_eq!(err.to_string(), "index out of range: valid 0..3");
        let err = rx.on_part("not a part").unwrap_err();
        assert_eq!(err.to_string(), "invalid part format");
        assert_eq!(rx.progress(), Some((0, 4)));
    }

    #[test]
    fn withheld_part_is_reported() {
        let (_, plan) = plan(4);
        let mut rx = started(&plan);
        for i in [0usize, 1, 3] {
            rx.on_part(&plan.parts[i].to_payload()).unwrap();
        }
        assert_eq!(rx.missing_parts(), vec![2]);
        let err = rx.try_reconstruct().unwrap_err();
        assert!(matches!(&err, TransportError::MissingParts(m) if m == &vec![2]));
        assert_eq!(err.to_string(), "missing parts: 2");
        assert_eq!(rx.state(), ReceiverState::CollectingParts);
    }

    #[test]
    fn tampered_part_fails_integrity_then_rescan_recovers() {
        let (vc, plan) = plan(3);
        let mut rx = started(&plan);
        rx.on_part(&plan.parts[0].to_payload()).unwrap();
        rx.on_part(&plan.parts[1].to_payload()).unwrap();

        let mut tampered = plan.parts[2].clone();
        tampered.chunk.insert(0, 'X');
        let err = rx.on_part(&tampered.to_payload()).unwrap_err();
        assert_eq!(err.to_string(), "integrity check failed: hash mismatch");
        assert_eq!(rx.state(), ReceiverState::Failed);
        assert_eq!(rx.progress(), Some((3, 3)));

        match rx.on_part(&plan.parts[2].to_payload()).unwrap() {
            PartOutcome::Complete(got) => assert_eq!(*got, vc),
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn matching_hash_but_invalid_credential_is_reported() {
        let text = r#"{"not":"a credential"}"#;
        let manifest = Manifest {
            total_parts: 1,
            hash: amw_core::sha3_256_str_hex(text),
        };
        let mut rx = CredentialReceiver::new();
        rx.on_manifest(&manifest.to_payload()).unwrap();
        let err = rx
            .on_part(&Part { index: 0, chunk: text.to_string() }.to_payload())
            .unwrap_err();
        assert_eq!(err.to_string(), "reconstructed credential invalid");
        assert!(matches!(err, TransportError::InvalidCredential(_)));
        assert_eq!(rx.state(), ReceiverState::Failed);
    }

    #[test]
    fn oversized_manifest_is_rejected_without_allocating() {
        let (_, plan) = plan(2);
        let mut rx = started(&plan);
        rx.on_part(&plan.parts[0].to_payload()).unwrap();

        let err = rx
            .on_manifest(r#"{"totalParts":18446744073709551615,"hash":"00"}"#)
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidMetadata));
        assert_eq!(rx.progress(), Some((1, 2)));
        assert_eq!(rx.missing_parts(), vec![1]);
    }

    #[test]
    fn part_cap_is_configurable() {
        let mut rx = CredentialReceiver::with_max_parts(3);
        assert_eq!(rx.max_parts(), 3);
        assert!(rx.on_manifest(r#"{"totalParts":4,"hash":"00"}"#).is_err());
        assert_eq!(rx.state(), ReceiverState::AwaitingManifest);
        rx.on_manifest(r#"{"totalParts":3,"hash":"00"}"#).unwrap();
        assert_eq!(rx.missing_parts(), vec![0, 1, 2]);
        assert_eq!(CredentialReceiver::new().max_parts(), Manifest::DEFAULT_MAX_PARTS);
    }

    #[test]
    fn rejected_parts_keep_failed_transfer_intact() {
        let (vc, plan) = plan(2);
        let mut rx = started(&plan);
        rx.on_part(&plan.parts[0].to_payload()).unwrap();
        let mut tampered = plan.parts[1].clone();
        tampered.chunk.push('X');
        rx.on_part(&tampered.to_payload()).unwrap_err();
        assert_eq!(rx.state(), ReceiverState::Failed);

        assert!(rx.on_part(r#"[9,"x"]"#).is_err());
        assert!(rx.on_part("garbage").is_err());
        assert!(matches!(rx.try_reconstruct(), Err(TransportError::HashMismatch)));
        assert_eq!(rx.state(), ReceiverState::Failed);
        assert_eq!(rx.progress(), Some((2, 2)));

        rx.on_part(&plan.parts[1].to_payload()).unwrap();
        assert_eq!(rx.credential(), Some(&vc));
    }

    #[test]
    fn new_manifest_resets_parts() {
        let (_, plan) = plan(4);
        let mut rx = started(&plan);
        rx.on_part(&plan.parts[0].to_payload()).unwrap();
        rx.on_manifest(&plan.manifest.to_payload()).unwrap();
        assert_eq!(rx.progress(), Some((0, 4)));
    }

    #[test]
    fn parts_after_reconstruction_are_rejected_until_reset() {
        let (_, plan) = plan(1);
        let mut rx = started(&plan);
        rx.on_part(&plan.parts[0].to_payload()).unwrap();
        assert!(matches!(
            rx.on_part(&plan.parts[0].to_payload()),
            Err(TransportError::AlreadyReconstructed)
        ));
        rx.reset();
        assert_eq!(rx.state(), ReceiverState::AwaitingManifest);
        assert!(rx.credential().is_none());
    }
}
