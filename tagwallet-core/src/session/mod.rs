// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tag Session State Machine
//!
//! Drives a connected tag from first contact to a state where patched
//! records can be written:
//!
//! ```text
//! Disconnected -> VersionChecked -> Read -> Ready
//!        \               \            \
//!         +---------------+------------+--> Failed
//! ```
//!
//! Any failed transition or write leaves the session in `Failed`.

mod error;
pub mod write_plan;

use tracing::{info, warn};

pub use error::SessionError;
pub use write_plan::{
    app_data_plan, apply_plan, full_write_plan, FixedPage, APP_DATA_PAGES, DATA_PAGES, FIXED_PAGES,
};

use crate::crypto::KeySet;
use crate::protocol::{
    AuthOutcome, CancellationToken, PageClient, PageWrite, ProtocolConfig, TagTransport,
    VersionInfo,
};
use crate::record::{decrypt, layout, patch, PatchOptions, TagRecord};

/// Classification of the connected tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagClassification {
    /// Static lock bytes are set; the tag can no longer be personalized.
    pub locked: bool,
    /// The image carries the capability container and format marker.
    pub signed_record: bool,
}

impl TagClassification {
    pub fn of(record: &TagRecord) -> Self {
        TagClassification {
            locked: record.is_locked(),
            signed_record: record.is_signed_record(),
        }
    }
}

/// State of a tag session.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// No command sent yet
    Disconnected,
    /// GET_VERSION confirmed an NTAG215
    VersionChecked { version: VersionInfo },
    /// Full memory read
    Read {
        version: VersionInfo,
        record: TagRecord,
    },
    /// Classified and ready for writes
    Ready {
        version: VersionInfo,
        record: TagRecord,
        classification: TagClassification,
    },
    /// Session failed
    Failed { error: SessionError },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "Disconnected",
            SessionState::VersionChecked { .. } => "VersionChecked",
            SessionState::Read { .. } => "Read",
            SessionState::Ready { .. } => "Ready",
            SessionState::Failed { .. } => "Failed",
        }
    }
}

/// Result of [`TagSession::write_app_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppDataOutcome {
    /// Authentication succeeded and the pages were written.
    Written { pages: usize },
    /// The tag did not answer with the expected PACK; nothing was written.
    NothingToUnlock,
}

/// A session with one connected tag.
pub struct TagSession<T: TagTransport> {
    /// Page client owning the transport
    client: PageClient<T>,
    /// Read batching and range
    config: ProtocolConfig,
    /// Current state
    state: SessionState,
}

impl<T: TagTransport> TagSession<T> {
    pub fn new(transport: T, config: ProtocolConfig) -> Self {
        Self::with_cancellation(transport, config, CancellationToken::new())
    }

    /// Creates a session whose commands stop once `cancel` is cancelled.
    pub fn with_cancellation(
        transport: T,
        config: ProtocolConfig,
        cancel: CancellationToken,
    ) -> Self {
        TagSession {
            client: PageClient::with_cancellation(transport, cancel),
            config,
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// A handle that can cancel this session from elsewhere.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.client.cancellation_token().clone()
    }

    /// The record read from the tag, once available.
    pub fn record(&self) -> Option<&TagRecord> {
        match &self.state {
            SessionState::Read { record, .. } | SessionState::Ready { record, .. } => Some(record),
            _ => None,
        }
    }

    pub fn classification(&self) -> Option<TagClassification> {
        match &self.state {
            SessionState::Ready { classification, .. } => Some(*classification),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SessionState::Ready { .. })
    }

    pub fn into_transport(self) -> T {
        self.client.into_inner()
    }

    /// Stops the session; no further commands are issued.
    pub fn invalidate(&mut self) {
        self.client.cancellation_token().cancel();
        info!(state = self.state.name(), "Tag session invalidated");
    }

    fn fail(&mut self, error: SessionError) -> SessionError {
        warn!(state = self.state.name(), error = %error, "Tag session failed");
        self.state = SessionState::Failed {
            error: error.clone(),
        };
        error
    }

    fn invalid_state(&self, expected: &str) -> SessionError {
        SessionError::InvalidState(format!(
            "expected {}, session is {}",
            expected,
            self.state.name()
        ))
    }

    /// Disconnected -> VersionChecked.
    pub fn check_version(&mut self) -> Result<VersionInfo, SessionError> {
        if !matches!(self.state, SessionState::Disconnected) {
            return Err(self.invalid_state("Disconnected"));
        }
        let version = match self.client.get_version() {
            Ok(version) => version,
            Err(e) => return Err(self.fail(e.into())),
        };
        if !version.is_ntag215() {
            return Err(self.fail(SessionError::InvalidTagType {
                product_type: version.product_type,
                storage_size: version.storage_size,
            }));
        }
        info!(
            major = version.major_version,
            minor = version.minor_version,
            "NTAG215 detected"
        );
        self.state = SessionState::VersionChecked { version };
        Ok(version)
    }

    /// VersionChecked -> Read: dumps pages `0..=last_page`.
    pub fn read(&mut self) -> Result<(), SessionError> {
        let version = match self.state {
            SessionState::VersionChecked { version } => version,
            _ => return Err(self.invalid_state("VersionChecked")),
        };
        let bytes = match self.client.fast_read(
            0,
            self.config.last_page,
            self.config.fast_read_batch_size,
        ) {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(e.into())),
        };
        let record = match TagRecord::new(bytes) {
            Ok(record) => record,
            Err(e) => return Err(self.fail(e.into())),
        };
        info!(uid = %record.uid(), len = record.len(), "Tag memory read");
        self.state = SessionState::Read { version, record };
        Ok(())
    }

    /// Read -> Ready. No commands are sent.
    pub fn classify(&mut self) -> Result<TagClassification, SessionError> {
        let previous = std::mem::replace(&mut self.state, SessionState::Disconnected);
        let (version, record) = match previous {
            SessionState::Read { version, record } => (version, record),
            other => {
                self.state = other;
                return Err(self.invalid_state("Read"));
            }
        };
        let classification = TagClassification::of(&record);
        info!(
            locked = classification.locked,
            signed_record = classification.signed_record,
            "Tag classified"
        );
        self.state = SessionState::Ready {
            version,
            record,
            classification,
        };
        Ok(classification)
    }

    /// Runs every transition up to `Ready`.
    pub fn establish(&mut self) -> Result<TagClassification, SessionError> {
        self.check_version()?;
        self.read()?;
        self.classify()
    }

    fn ready_record(&self) -> Result<(VersionInfo, TagRecord, TagClassification), SessionError> {
        match &self.state {
            SessionState::Ready {
                version,
                record,
                classification,
            } => Ok((*version, record.clone(), *classification)),
            _ => Err(self.invalid_state("Ready")),
        }
    }

    /// Replaces the snapshot with the image the tag holds after `plan`.
    fn apply_written(
        &mut self,
        version: VersionInfo,
        tag: &TagRecord,
        plan: &[PageWrite],
    ) -> Result<(), SessionError> {
        let record = apply_plan(tag, plan)?;
        let classification = TagClassification::of(&record);
        self.state = SessionState::Ready {
            version,
            record,
            classification,
        };
        Ok(())
    }

    /// Patches `source` to the connected tag's UID and writes the full plan.
    ///
    /// Refuses a locked tag before anything is sent. Returns the record
    /// that was written; the session snapshot then shows the tag as locked.
    pub fn write_patched(
        &mut self,
        source: &TagRecord,
        keys: &KeySet,
    ) -> Result<TagRecord, SessionError> {
        let (version, tag, classification) = self.ready_record()?;
        if classification.locked {
            return Err(SessionError::TagLocked);
        }

        let patched = patch(
            source,
            tag.uid().as_bytes(),
            &keys.static_key,
            &keys.data_key,
            &PatchOptions::default(),
        )?;
        let plan = full_write_plan(&patched)?;
        info!(uid = %patched.uid(), pages = plan.len(), "Writing patched record");

        if let Err(e) = self.client.write_batch(&plan) {
            return Err(self.fail(e.into()));
        }
        self.apply_written(version, &tag, &plan)?;
        info!(uid = %patched.uid(), "Patched record written");
        Ok(patched)
    }

    /// Rewrites only the application data of an already personalized tag.
    ///
    /// `source` must carry the same identifier block as the tag. Its payload
    /// is re-signed under the tag's write counter and salt, since the pages
    /// holding the tag HMAC, identifier block and salt are not rewritten.
    /// When the tag does not answer PWD_AUTH with the expected PACK, nothing
    /// is written.
    pub fn write_app_data(
        &mut self,
        source: &TagRecord,
        keys: &KeySet,
    ) -> Result<AppDataOutcome, SessionError> {
        let (version, tag, _) = self.ready_record()?;
        let expected = &tag.as_bytes()[layout::IDENTIFIER_BLOCK];
        let found = &source.as_bytes()[layout::IDENTIFIER_BLOCK];
        if found != expected {
            return Err(SessionError::CharacterMismatch {
                expected: hex::encode(expected),
                found: hex::encode(found),
            });
        }

        let mut plain = decrypt(source, &keys.data_key).into_bytes();
        plain[layout::WRITE_COUNTER].copy_from_slice(&tag.write_counter_bytes());
        let plain = TagRecord::new(plain)?;

        let uid = tag.uid();
        let options = PatchOptions::default()
            .skip_decrypt()
            .with_salt(tag.salt().to_vec());
        let patched = patch(
            &plain,
            uid.as_bytes(),
            &keys.static_key,
            &keys.data_key,
            &options,
        )?;
        let plan = app_data_plan(&patched)?;

        match self.client.authenticate(uid.password()) {
            Ok(AuthOutcome::Unlocked { .. }) => {}
            Ok(AuthOutcome::NotUnlocked { response }) => {
                warn!(
                    uid = %uid,
                    response = %hex::encode(&response),
                    "Tag did not unlock, skipping application data write"
                );
                return Ok(AppDataOutcome::NothingToUnlock);
            }
            Err(e) => return Err(self.fail(e.into())),
        }

        if let Err(e) = self.client.write_batch(&plan) {
            return Err(self.fail(e.into()));
        }
        self.apply_written(version, &tag, &plan)?;
        info!(uid = %uid, pages = plan.len(), "Application data written");
        Ok(AppDataOutcome::Written { pages: plan.len() })
    }
}

// INLINE_TEST_REQUIRED: Tests private fail and invalid_state transitions
#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MockTagTransport;

    #[test]
    fn test_read_requires_version_check() {
        let mut session = TagSession::new(MockTagTransport::new(), ProtocolConfig::default());
        assert!(matches!(session.read(), Err(SessionError::InvalidState(_))));
        assert!(matches!(session.state(), SessionState::Disconnected));
    }

    #[test]
    fn test_wrong_tag_type_fails_session() {
        let mut mock = MockTagTransport::new();
        mock.push_response(vec![0x00, 0x04, 0x04, 0x02, 0x01, 0x00, 0x0F, 0x03]);
        let mut session = TagSession::new(mock, ProtocolConfig::default());
        assert!(matches!(
            session.check_version(),
            Err(SessionError::InvalidTagType {
                storage_size: 0x0F,
                ..
            })
        ));
        assert_eq!(session.state().name(), "Failed");
    }
}
