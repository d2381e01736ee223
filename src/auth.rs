//! Sign-in wizard in front of an external identity provider.
//!
//! The provider does the real work (sending the SMS code, checking it,
//! federated sign-in). This module only walks the user through
//! phone entry, code entry and the signed-in state, and checks input
//! before the provider sees it. The signed-in user is remembered in the
//! session slot so a restart skips straight to the signed-in state.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::sync::LazyLock;

use crate::clock::Clock;
use crate::storage::{SESSION_SLOT, Store, load_slot, save_slot};

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+[1-9]\d{6,14}$").unwrap());

const CODE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Please enter a valid phone number with country code (e.g., +1234567890)")]
    InvalidPhoneNumber,

    #[error("Please enter a valid 6-digit code")]
    InvalidCode,

    #[error("Please wait {0} seconds before requesting a new code")]
    ResendCooldown(i64),

    #[error("No code request found. Please request a new code.")]
    NoPendingRequest,

    #[error("This sign-in method is not available")]
    Unsupported,

    #[error("{0}")]
    Provider(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedSession {
    #[serde(flatten)]
    session: Session,
    last_login: DateTime<Utc>,
}

pub trait IdentityProvider {
    fn request_code(&mut self, phone_number: &str) -> Result<(), AuthError>;

    fn verify_code(&mut self, code: &str) -> Result<Session, AuthError>;

    fn sign_in_federated(&mut self) -> Result<Session, AuthError> {
        Err(AuthError::Unsupported)
    }

    fn sign_out(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStep {
    PhoneEntry,
    CodeEntry { phone_number: String },
    Authenticated(Session),
}

pub fn is_valid_phone_number(phone_number: &str) -> bool {
    PHONE_RE.is_match(phone_number)
}

fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

pub struct AuthFlow<P: IdentityProvider> {
    provider: P,
    store: Rc<dyn Store>,
    clock: Rc<dyn Clock>,
    cooldown: Duration,
    step: AuthStep,
    resend_at: Option<DateTime<FixedOffset>>,
    last_login: Option<DateTime<Utc>>,
}

impl<P: IdentityProvider> AuthFlow<P> {
    /// Starts signed in if a saved session is found, otherwise at phone entry.
    pub fn new(provider: P, store: Rc<dyn Store>, clock: Rc<dyn Clock>, cooldown: Duration) -> Self {
        let saved = match load_slot::<SavedSession>(store.as_ref(), SESSION_SLOT) {
            Ok(saved) => saved,
            Err(e) => {
                log::warn!("Ignoring unreadable saved session: {}", e);
                None
            }
        };
        let (step, last_login) = match saved {
            Some(saved) => {
                log::info!("Restored session for {}", saved.session.uid);
                (AuthStep::Authenticated(saved.session), Some(saved.last_login))
            }
            None => (AuthStep::PhoneEntry, None),
        };

        Self {
            provider,
            store,
            clock,
            cooldown,
            step,
            resend_at: None,
            last_login,
        }
    }

    pub fn step(&self) -> &AuthStep {
        &self.step
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.step {
            AuthStep::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.last_login
    }

    /// Seconds until a new code may be requested, 0 when allowed now.
    pub fn resend_available_in(&self) -> i64 {
        let Some(resend_at) = self.resend_at else {
            return 0;
        };
        let remaining = resend_at - self.clock.now();
        if remaining <= Duration::zero() {
            0
        } else {
            // Round partial seconds up so "0" only shows once it is allowed.
            (remaining.num_milliseconds() + 999) / 1000
        }
    }

    pub fn request_code(&mut self, phone_number: &str) -> Result<(), AuthError> {
        let phone_number = phone_number.trim();
        if !is_valid_phone_number(phone_number) {
            return Err(AuthError::InvalidPhoneNumber);
        }

        if let Err(e) = self.provider.request_code(phone_number) {
            log::warn!("Code request failed: {}", e);
            return Err(e);
        }
        self.step = AuthStep::CodeEntry {
            phone_number: phone_number.to_string(),
        };
        self.resend_at = Some(self.clock.now() + self.cooldown);
        Ok(())
    }

    pub fn resend_code(&mut self) -> Result<(), AuthError> {
        let AuthStep::CodeEntry { phone_number } = &self.step else {
            return Err(AuthError::NoPendingRequest);
        };
        let remaining = self.resend_available_in();
        if remaining > 0 {
            return Err(AuthError::ResendCooldown(remaining));
        }
        let phone_number = phone_number.clone();
        self.request_code(&phone_number)
    }

    pub fn verify_code(&mut self, code: &str) -> Result<&Session, AuthError> {
        if !matches!(self.step, AuthStep::CodeEntry { .. }) {
            return Err(AuthError::NoPendingRequest);
        }
        let code = code.trim();
        if !is_valid_code(code) {
            return Err(AuthError::InvalidCode);
        }

        let session = self.provider.verify_code(code)?;
        self.sign_in(session)
    }

    pub fn sign_in_federated(&mut self) -> Result<&Session, AuthError> {
        let session = self.provider.sign_in_federated()?;
        self.sign_in(session)
    }

    /// A failed write only costs a sign-in on the next start, so it is
    /// logged rather than returned.
    fn sign_in(&mut self, session: Session) -> Result<&Session, AuthError> {
        log::info!("Signed in as {}", session.uid);
        let saved = SavedSession {
            session,
            last_login: self.clock.now().with_timezone(&Utc),
        };
        if let Err(e) = save_slot(self.store.as_ref(), SESSION_SLOT, &saved) {
            log::error!("Failed to save session: {}", e);
        }
        self.last_login = Some(saved.last_login);
        self.resend_at = None;
        self.step = AuthStep::Authenticated(saved.session);
        self.session().ok_or(AuthError::NoPendingRequest)
    }

    /// Leaves code entry to fix the phone number. The resend cooldown stays.
    pub fn back_to_phone(&mut self) {
        if matches!(self.step, AuthStep::CodeEntry { .. }) {
            self.step = AuthStep::PhoneEntry;
        }
    }

    pub fn sign_out(&mut self) {
        self.provider.sign_out();
        if let Err(e) = self.store.remove(SESSION_SLOT) {
            log::error!("Failed to forget session: {}", e);
        }
        self.step = AuthStep::PhoneEntry;
        self.resend_at = None;
        self.last_login = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::day_key::DayKey;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[derive(Default)]
    struct FakeProvider {
        requests: Vec<String>,
        fail_next_request: bool,
        signed_out: bool,
    }

    impl IdentityProvider for FakeProvider {
        fn request_code(&mut self, phone_number: &str) -> Result<(), AuthError> {
            if std::mem::take(&mut self.fail_next_request) {
                return Err(AuthError::Provider("Too many requests. Please try again later.".into()));
            }
            self.requests.push(phone_number.to_string());
            Ok(())
        }

        fn verify_code(&mut self, code: &str) -> Result<Session, AuthError> {
            if code != "123456" {
                return Err(AuthError::Provider("Invalid code".into()));
            }
            Ok(Session {
                uid: "user-1".into(),
                phone_number: self.requests.last().cloned(),
                email: None,
                display_name: None,
            })
        }

        fn sign_out(&mut self) {
            self.signed_out = true;
        }
    }

    fn flow() -> (AuthFlow<FakeProvider>, Rc<FixedClock>) {
        let (flow, _, clock) = flow_with_store();
        (flow, clock)
    }

    fn flow_with_store() -> (AuthFlow<FakeProvider>, Rc<MemoryStore>, Rc<FixedClock>) {
        let store = Rc::new(MemoryStore::new());
        let clock = Rc::new(FixedClock::at_day(DayKey::parse("2024-03-05").unwrap()));
        let flow = AuthFlow::new(FakeProvider::default(), store.clone(), clock.clone(), Duration::seconds(60));
        (flow, store, clock)
    }

    #[test]
    fn phone_number_format() {
        assert!(is_valid_phone_number("+14155552671"));
        assert!(!is_valid_phone_number("14155552671"));
        assert!(!is_valid_phone_number("+0123456789"));
        assert!(!is_valid_phone_number("+12345"));
    }

    #[test]
    fn walks_through_all_steps() {
        let (mut flow, _) = flow();
        assert_eq!(flow.request_code("bad"), Err(AuthError::InvalidPhoneNumber));
        assert_eq!(flow.step(), &AuthStep::PhoneEntry);
        assert!(flow.provider().requests.is_empty());

        flow.request_code(" +14155552671 ").unwrap();
        assert!(matches!(flow.step(), AuthStep::CodeEntry { phone_number } if phone_number == "+14155552671"));

        assert_eq!(flow.verify_code("12345").unwrap_err(), AuthError::InvalidCode);
        assert!(matches!(flow.verify_code("654321"), Err(AuthError::Provider(_))));
        assert!(matches!(flow.step(), AuthStep::CodeEntry { .. }));

        let session = flow.verify_code("123456").unwrap();
        assert_eq!(session.phone_number.as_deref(), Some("+14155552671"));
        assert!(flow.session().is_some());

        flow.sign_out();
        assert_eq!(flow.step(), &AuthStep::PhoneEntry);
        assert!(flow.provider().signed_out);
    }

    #[test]
    fn provider_failure_keeps_step() {
        let (mut flow, _) = flow();
        flow.provider.fail_next_request = true;
        assert!(matches!(flow.request_code("+14155552671"), Err(AuthError::Provider(_))));
        assert_eq!(flow.step(), &AuthStep::PhoneEntry);
        assert_eq!(flow.resend_available_in(), 0);
    }

    #[test]
    fn resend_waits_for_cooldown() {
        let (mut flow, clock) = flow();
        assert_eq!(flow.resend_code(), Err(AuthError::NoPendingRequest));
        flow.request_code("+14155552671").unwrap();

        clock.advance(Duration::milliseconds(40_500));
        assert_eq!(flow.resend_code(), Err(AuthError::ResendCooldown(20)));

        clock.advance(Duration::seconds(20));
        flow.resend_code().unwrap();
        assert_eq!(flow.provider().requests.len(), 2);
        assert_eq!(flow.resend_available_in(), 60);
    }

    #[test]
    fn verify_requires_a_pending_request() {
        let (mut flow, _) = flow();
        assert_eq!(flow.verify_code("123456").unwrap_err(), AuthError::NoPendingRequest);
        assert_eq!(flow.sign_in_federated().unwrap_err(), AuthError::Unsupported);
    }

    #[test]
    fn session_is_remembered_until_sign_out() {
        let (mut flow, store, clock) = flow_with_store();
        flow.request_code("+14155552671").unwrap();
        flow.verify_code("123456").unwrap();

        let saved = store.load(SESSION_SLOT).unwrap().unwrap();
        assert_eq!(saved["uid"], "user-1");
        assert_eq!(saved["phoneNumber"], "+14155552671");
        assert!(saved.get("email").is_none());
        assert_eq!(saved["lastLogin"], "2024-03-05T12:00:00Z");

        let mut restored = AuthFlow::new(FakeProvider::default(), store.clone(), clock.clone(), Duration::seconds(60));
        assert_eq!(restored.session().map(|s| s.uid.as_str()), Some("user-1"));
        assert_eq!(restored.last_login(), Some(clock.now().with_timezone(&Utc)));

        restored.sign_out();
        assert!(store.load(SESSION_SLOT).unwrap().is_none());
        let fresh = AuthFlow::new(FakeProvider::default(), store, clock, Duration::seconds(60));
        assert_eq!(fresh.step(), &AuthStep::PhoneEntry);
        assert_eq!(fresh.last_login(), None);
    }

    #[test]
    fn unreadable_saved_session_starts_at_phone_entry() {
        let store = Rc::new(MemoryStore::new());
        store.save(SESSION_SLOT, &json!({"phoneNumber": "+14155552671"})).unwrap();
        let clock = Rc::new(FixedClock::at_day(DayKey::parse("2024-03-05").unwrap()));
        let flow = AuthFlow::new(FakeProvider::default(), store, clock, Duration::seconds(60));
        assert_eq!(flow.step(), &AuthStep::PhoneEntry);
    }
}
