//! Password hashing and session token generation.

use anyhow::{anyhow, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::Rng;
use rand_distr::Alphanumeric;

/// A stored session token. Presented back via the `session_token` cookie or
/// the `Authorization` header.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct AuthTokenValue(pub String);

impl AuthTokenValue {
    pub fn generate() -> AuthTokenValue {
        let rng = rand::rng();
        let random_string: String = rng
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();
        AuthTokenValue(random_string)
    }
}

/// Argon2 password hashing with a per-user salt.
#[derive(Clone, Copy, Debug, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Default argon2 parameters, or deliberately cheap ones when the
    /// `test-fast-hasher` feature is on so test suites don't burn CPU.
    fn argon2() -> Argon2<'static> {
        #[cfg(feature = "test-fast-hasher")]
        {
            let params = argon2::Params::new(8, 1, 1, None)
                .expect("test hasher params are statically valid");
            Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
        }
        #[cfg(not(feature = "test-fast-hasher"))]
        {
            Argon2::default()
        }
    }

    pub fn generate_b64_salt(&self) -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash<T: AsRef<str>>(&self, plain: &str, b64_salt: T) -> Result<String> {
        use argon2::password_hash::PasswordHasher as _;
        let salt = SaltString::from_b64(b64_salt.as_ref()).map_err(|err| anyhow!("{}", err))?;
        let hash = Self::argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash)
    }

    pub fn verify(&self, plain: &str, target_hash: &str) -> Result<bool> {
        let password_hash = PasswordHash::new(target_hash).map_err(|err| anyhow!("{}", err))?;
        Ok(Self::argon2()
            .verify_password(plain.as_bytes(), &password_hash)
            .is_ok())
    }
}
