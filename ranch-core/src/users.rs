//! Username/password credential store

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::error::RanchError;
use crate::models::User;
use crate::storage::RecordFile;

/// Hex encoded SHA-256 digest of the password
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Registers and authenticates users against a users record file
#[derive(Debug, Clone)]
pub struct Credentials<'a> {
    file: &'a RecordFile<User>,
}

impl<'a> Credentials<'a> {
    pub fn new(file: &'a RecordFile<User>) -> Self {
        Self { file }
    }

    /// Adds a new user. Rejections are reported as [`RanchError`].
    pub fn register(&self, username: &str, password: &str, confirm: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(RanchError::EmptyUsername.into());
        }

        let mut users = self.file.load_all()?;
        if users.iter().any(|u| u.username == username) {
            return Err(RanchError::UsernameTaken(username.to_string()).into());
        }
        if password != confirm {
            return Err(RanchError::PasswordMismatch.into());
        }

        let user = User {
            username: username.to_string(),
            password_hash: hash_password(password),
        };
        users.push(user.clone());
        self.file.save_all(&users)?;
        log::info!("registered user '{}'", user.username);

        Ok(user)
    }

    /// Checks a username/password pair, returning the username on success
    pub fn login(&self, username: &str, password: &str) -> Result<String> {
        let username = username.trim();
        let hashed = hash_password(password);
        let users = self.file.load_all()?;

        let found = users
            .iter()
            .any(|u| u.username == username && u.password_hash == hashed);
        if found {
            log::info!("user '{}' logged in", username);
            Ok(username.to_string())
        } else {
            log::warn!("failed login for '{}'", username);
            Err(RanchError::InvalidCredentials.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hash_password_is_sha256_hex() {
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    fn rejection<T: std::fmt::Debug>(result: Result<T>) -> RanchError {
        result
            .unwrap_err()
            .downcast::<RanchError>()
            .expect("expected a ranch error")
    }

    #[test]
    fn test_register_then_login() -> Result<()> {
        let dir = TempDir::new()?;
        let file = RecordFile::new(dir.path().join("users.yaml"));
        let creds = Credentials::new(&file);

        let user = creds.register(" alice ", "secret", "secret")?;
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "secret");

        assert_eq!(creds.login("alice", "secret")?, "alice");
        assert_eq!(rejection(creds.login("alice", "wrong")), RanchError::InvalidCredentials);
        assert_eq!(rejection(creds.login("bob", "secret")), RanchError::InvalidCredentials);

        Ok(())
    }

    #[test]
    fn test_register_rejections() -> Result<()> {
        let dir = TempDir::new()?;
        let file = RecordFile::new(dir.path().join("users.json"));
        let creds = Credentials::new(&file);

        assert_eq!(rejection(creds.register("  ", "a", "a")), RanchError::EmptyUsername);
        assert_eq!(rejection(creds.register("bob", "a", "b")), RanchError::PasswordMismatch);
        assert!(file.load_all()?.is_empty());

        creds.register("bob", "a", "a")?;
        assert_eq!(
            rejection(creds.register("bob", "c", "c")),
            RanchError::UsernameTaken("bob".into())
        );
        assert_eq!(file.load_all()?.len(), 1);

        Ok(())
    }
}
