//! Cosmetic passphrase gates.
//!
//! Neither gate is a security boundary. Both compare a typed string against one shared
//! secret held locally, and both flags can be set by anyone with access to the profile
//! storage. They exist to stage the experience, and are kept that way on purpose:
//! swap the [`PassphraseVerifier`] if a deployment needs something real.

use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Pacing;
use crate::error::StoreError;
use crate::session::BrowserSession;
use crate::terminal::{self, SequenceOutcome};

pub const VISUAL_ACCESS_KEY: &str = "station_visual_access";
pub const VISUAL_ACCESS_COOKIE: &str = "visual_access";
pub const ADMIN_SESSION_KEY: &str = "station_auth";

const FLAG_VALUE: &str = "true";
const ADMIN_GRANTED: &str = "granted";
const COOKIE_PATH: &str = "/";
const COOKIE_DAYS: i64 = 7;

pub const UNLOCK_DENIED: &str = "ACCESS_DENIED: INVALID_CREDENTIALS";

pub trait PassphraseVerifier: Send + Sync {
    fn verify(&self, candidate: &str) -> bool;
}

/// One shared secret compared by plain equality.
pub struct SharedSecret {
    secret: String,
}

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }
}

impl PassphraseVerifier for SharedSecret {
    fn verify(&self, candidate: &str) -> bool {
        candidate.as_bytes().ct_eq(self.secret.as_bytes()).into()
    }
}

/// Where the visual-access flag lives, in the order `check` consults them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagBackend {
    LocalStorage,
    Cookie,
}

/// One logical "has visual access" flag persisted in two backends.
/// Either backend alone is enough for the flag to read as set.
pub struct AccessFlag<'a> {
    session: &'a BrowserSession,
}

impl<'a> AccessFlag<'a> {
    pub const ORDER: [FlagBackend; 2] = [FlagBackend::LocalStorage, FlagBackend::Cookie];

    pub fn new(session: &'a BrowserSession) -> Self {
        Self { session }
    }

    pub async fn set(&self, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.session.local().set(VISUAL_ACCESS_KEY, FLAG_VALUE).await?;
        self.session
            .cookies()
            .set(
                VISUAL_ACCESS_COOKIE,
                FLAG_VALUE,
                COOKIE_PATH,
                Duration::days(COOKIE_DAYS),
                now,
            )
            .await?;
        Ok(())
    }

    /// First backend holding the flag, if any.
    pub async fn find(&self, now: DateTime<Utc>) -> Result<Option<FlagBackend>, StoreError> {
        for backend in Self::ORDER {
            if self.is_set_in(backend, now).await? {
                return Ok(Some(backend));
            }
        }
        Ok(None)
    }

    async fn is_set_in(&self, backend: FlagBackend, now: DateTime<Utc>) -> Result<bool, StoreError> {
        match backend {
            FlagBackend::LocalStorage => {
                Ok(self.session.local().get(VISUAL_ACCESS_KEY).await?.as_deref() == Some(FLAG_VALUE))
            }
            FlagBackend::Cookie => {
                let wanted = format!("{VISUAL_ACCESS_COOKIE}={FLAG_VALUE}");
                let cookies = self.session.cookies().document_cookie(now).await?;
                Ok(cookies.split(';').any(|item| item.trim().starts_with(&wanted)))
            }
        }
    }
}

/// Gated gallery view state, decided once on mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Checking,
    Authorized,
    Denied,
}

/// Passphrase gate in front of the gallery.
pub struct AccessGate {
    verifier: Box<dyn PassphraseVerifier>,
}

impl AccessGate {
    pub fn new(verifier: Box<dyn PassphraseVerifier>) -> Self {
        Self { verifier }
    }

    pub fn with_passphrase(passphrase: &str) -> Self {
        Self::new(Box::new(SharedSecret::new(passphrase)))
    }

    pub fn authenticate(&self, candidate: &str) -> bool {
        self.verifier.verify(candidate)
    }

    pub async fn grant(&self, session: &BrowserSession, now: DateTime<Utc>) -> Result<(), StoreError> {
        AccessFlag::new(session).set(now).await?;
        info!("visual access granted");
        Ok(())
    }

    pub async fn check(&self, session: &BrowserSession, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let found = AccessFlag::new(session).find(now).await?;
        debug!(backend = ?found, "visual access check");
        Ok(found.is_some())
    }

    /// The password modal: pause for effect, then grant on a match.
    pub async fn unlock(
        &self,
        session: &BrowserSession,
        candidate: &str,
        pacing: &Pacing,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        tokio::time::sleep(pacing.unlock_delay).await;
        if self.authenticate(candidate) {
            self.grant(session, now).await?;
            Ok(true)
        } else {
            warn!("visual access passphrase rejected");
            Ok(false)
        }
    }

    /// `Checking` resolves to `Authorized` or `Denied` exactly once.
    pub async fn mount(&self, session: &BrowserSession, now: DateTime<Utc>) -> Result<GateStatus, StoreError> {
        debug!(status = ?GateStatus::Checking, "gallery mounting");
        let status = if self.check(session, now).await? {
            GateStatus::Authorized
        } else {
            GateStatus::Denied
        };
        Ok(status)
    }
}

/// Session-scoped gate in front of the admin console.
pub struct AdminGate {
    verifier: Box<dyn PassphraseVerifier>,
}

impl AdminGate {
    pub fn new(verifier: Box<dyn PassphraseVerifier>) -> Self {
        Self { verifier }
    }

    pub fn with_passphrase(passphrase: &str) -> Self {
        Self::new(Box::new(SharedSecret::new(passphrase)))
    }

    pub async fn is_granted(&self, session: &BrowserSession) -> Result<bool, StoreError> {
        Ok(session.session_storage().get(ADMIN_SESSION_KEY).await?.as_deref() == Some(ADMIN_GRANTED))
    }

    /// Play the verification sequence and record the grant in session storage on a match.
    /// Returns `Granted`, `Denied`, or `Cancelled` if the token fires mid-sequence.
    pub async fn login(
        &self,
        session: &BrowserSession,
        candidate: &str,
        pacing: &Pacing,
        cancel: &CancellationToken,
        emit: impl FnMut(&str),
    ) -> Result<SequenceOutcome, StoreError> {
        let accepted = self.verifier.verify(candidate);
        let outcome = terminal::run_admin_verification(accepted, pacing, cancel, emit).await;
        match outcome {
            SequenceOutcome::Granted => {
                session.session_storage().set(ADMIN_SESSION_KEY, ADMIN_GRANTED).await?;
                info!("admin session granted");
            }
            SequenceOutcome::Denied => warn!("admin passphrase rejected"),
            SequenceOutcome::Cancelled => debug!("admin login cancelled"),
        }
        Ok(outcome)
    }

    pub async fn logout(&self, session: &BrowserSession) -> Result<(), StoreError> {
        session.session_storage().remove(ADMIN_SESSION_KEY).await?;
        info!("admin session closed");
        Ok(())
    }
}
