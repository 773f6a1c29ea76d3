//! User accounts.
//!
//! Validation lives here so both storage backends see only well-formed users.

use chrono::{DateTime, Utc};

use lifetip_core::{DomainError, DomainResult, LocationId, UserId, text};

pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 72;
pub const NICKNAME_MIN_CHARS: usize = 2;
pub const NICKNAME_MAX_CHARS: usize = 20;
const EMAIL_MAX_CHARS: usize = 254;

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A registered community member.
///
/// # Invariants
/// - `email` is trimmed, lowercased, and unique across users.
/// - `password_hash` is a PHC string, never the plaintext.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub location_id: Option<LocationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl core::fmt::Debug for User {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("nickname", &self.nickname)
            .field("location_id", &self.location_id)
            .finish_non_exhaustive()
    }
}

impl User {
    /// Build a new user from a validated signup and an already-computed hash.
    pub fn register(signup: Signup, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            email: signup.email,
            password_hash,
            nickname: signup.nickname,
            location_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a profile update. Returns whether anything changed.
    pub fn apply(&mut self, update: ProfileUpdate, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        if let Some(nickname) = update.nickname {
            if nickname != self.nickname {
                self.nickname = nickname;
                changed = true;
            }
        }
        if let Some(location_id) = update.location_id {
            if location_id != self.location_id {
                self.location_id = location_id;
                changed = true;
            }
        }
        if changed {
            self.updated_at = now;
        }
        changed
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inputs
// ─────────────────────────────────────────────────────────────────────────────

/// Validated signup request. The password is still plaintext here.
#[derive(Clone, PartialEq, Eq)]
pub struct Signup {
    pub email: String,
    pub password: String,
    pub nickname: String,
}

impl core::fmt::Debug for Signup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Signup")
            .field("email", &self.email)
            .field("nickname", &self.nickname)
            .finish_non_exhaustive()
    }
}

impl Signup {
    pub fn new(email: &str, password: &str, nickname: &str) -> DomainResult<Self> {
        Ok(Self {
            email: normalize_email(email)?,
            password: check_password(password)?.to_string(),
            nickname: text::bounded("nickname", nickname, NICKNAME_MIN_CHARS, NICKNAME_MAX_CHARS)?,
        })
    }
}

/// Partial profile update. `location_id: Some(None)` clears the location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub nickname: Option<String>,
    pub location_id: Option<Option<LocationId>>,
}

impl ProfileUpdate {
    pub fn new(nickname: Option<&str>, location_id: Option<Option<LocationId>>) -> DomainResult<Self> {
        let nickname = nickname
            .map(|n| text::bounded("nickname", n, NICKNAME_MIN_CHARS, NICKNAME_MAX_CHARS))
            .transpose()?;
        Ok(Self {
            nickname,
            location_id,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.nickname.is_none() && self.location_id.is_none()
    }
}

/// Trim and lowercase an email, rejecting anything without a `local@domain` shape.
pub fn normalize_email(raw: &str) -> DomainResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(DomainError::validation("email", "must not be empty"));
    }
    if email.chars().count() > EMAIL_MAX_CHARS {
        return Err(DomainError::validation(
            "email",
            format!("must be at most {EMAIL_MAX_CHARS} characters"),
        ));
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace) =>
        {
            Ok(email)
        }
        _ => Err(DomainError::validation("email", "is not a valid address")),
    }
}

fn check_password(raw: &str) -> DomainResult<&str> {
    let len = raw.chars().count();
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&len) {
        return Err(DomainError::validation(
            "password",
            format!("must be {PASSWORD_MIN_CHARS} to {PASSWORD_MAX_CHARS} characters"),
        ));
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn signup_normalizes_email_and_nickname() {
        let signup = Signup::new("  Alice@Example.COM ", "password123", "  앨리스 ").unwrap();
        assert_eq!(signup.email, "alice@example.com");
        assert_eq!(signup.nickname, "앨리스");
    }

    #[test]
    fn signup_rejects_bad_email() {
        for bad in ["", "no-at-sign", "@domain", "local@", "a@b@c", "a b@c.kr"] {
            let err = Signup::new(bad, "password123", "nick").unwrap_err();
            assert!(
                matches!(err, DomainError::Validation { field: "email", .. }),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn signup_rejects_short_password() {
        let err = Signup::new("a@b.kr", "short", "nick").unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "password", .. }));
    }

    #[test]
    fn debug_never_prints_secrets() {
        let signup = Signup::new("a@b.kr", "hunter2hunter2", "nick").unwrap();
        assert!(!format!("{signup:?}").contains("hunter2"));

        let user = User::register(signup, "$argon2id$secret".to_string(), now());
        assert!(!format!("{user:?}").contains("argon2"));
    }

    #[test]
    fn apply_only_bumps_updated_at_on_change() {
        let created = now();
        let signup = Signup::new("a@b.kr", "password123", "nick").unwrap();
        let mut user = User::register(signup, "h".to_string(), created);

        let later = created + chrono::Duration::seconds(5);
        let same = ProfileUpdate::new(Some("nick"), None).unwrap();
        assert!(!user.apply(same, later));
        assert_eq!(user.updated_at, created);

        let location = LocationId::new();
        let update = ProfileUpdate::new(Some("newnick"), Some(Some(location))).unwrap();
        assert!(user.apply(update, later));
        assert_eq!(user.nickname, "newnick");
        assert_eq!(user.location_id, Some(location));
        assert_eq!(user.updated_at, later);

        let clear = ProfileUpdate::new(None, Some(None)).unwrap();
        assert!(user.apply(clear, later));
        assert_eq!(user.location_id, None);
    }
}
