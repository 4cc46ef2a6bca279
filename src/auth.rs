use crate::error::AuthError;
use crate::models::{User, UserWithPassword};
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const CREDENTIAL_SCHEME: &str = "sha256";

/// Session and roster for the local accounts.
#[derive(Debug, Default, Clone)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub users: Vec<UserWithPassword>,
}

impl AuthState {
    pub fn new(users: Vec<UserWithPassword>) -> AuthState {
        AuthState {
            user: None,
            is_authenticated: false,
            users,
        }
    }

    pub fn email_taken(&self, email: &str) -> bool {
        self.users.iter().any(|u| u.user.email == email)
    }

    pub fn signup(&mut self, username: &str, email: &str, password: &str) -> Result<User, AuthError> {
        if self.email_taken(email) {
            return Err(AuthError::EmailTaken(email.to_string()));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            profile_image: placeholder_profile_image(),
        };
        self.users.push(UserWithPassword {
            user: user.clone(),
            password: hash_password(password),
        });
        self.install(user.clone());
        tracing::info!(user_id = %user.id, "signed up");
        Ok(user)
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .users
            .iter()
            .find(|u| u.user.email == email && verify_password(&u.password, password))
            .map(|u| u.user.clone())
            .ok_or(AuthError::InvalidCredentials)?;
        self.install(user.clone());
        tracing::info!(user_id = %user.id, "logged in");
        Ok(user)
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::info!(user_id = %user.id, "logged out");
        }
        self.is_authenticated = false;
    }

    /// Installs a session read back from storage, or clears it.
    pub fn restore(&mut self, session: Option<User>) {
        match session {
            Some(user) => self.install(user),
            None => {
                self.user = None;
                self.is_authenticated = false;
            }
        }
    }

    fn install(&mut self, user: User) {
        self.user = Some(user);
        self.is_authenticated = true;
    }
}

fn placeholder_profile_image() -> String {
    let id = rand::thread_rng().gen_range(0..1000);
    format!("https://picsum.photos/id/{id}/200/200")
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Encodes a password as `sha256$<salt>$<hex digest>`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{CREDENTIAL_SCHEME}${salt}${}", digest(&salt, password))
}

pub fn verify_password(stored: &str, password: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(CREDENTIAL_SCHEME), Some(salt), Some(hex)) => digest(salt, password) == hex,
        _ => false,
    }
}
