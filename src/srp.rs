// Secure Remote Password math for the Cognito `USER_SRP_AUTH` flow.
//
// Cognito uses the 3072-bit group from RFC 5054 with SHA-256, hex-string
// padding rules for every hashed integer and an HKDF-derived key to sign
// the password claim. The password itself never leaves the machine.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const N_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74",
    "020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F1437",
    "4FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A163BF05",
    "98DA48361C55D39A69163FA8FD24CF5F83655D23DCA3AD961C62F356208552BB",
    "9ED529077096966D670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B",
    "E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF695581718",
    "3995497CEA956AE515D2261898FA051015728E5A8AAAC42DAD33170D04507A33",
    "A85521ABDF1CBA64ECFB850458DBEF0A8AEA71575D060C7DB3970F85A6E1E4C7",
    "ABF5AE8CDB0933D71E8C94E04A25619DCEE3D2261AD2EE6BF12FFA06D98A0864",
    "D87602733EC86A64521F2B18177B200CBBE117577A615D6C770988C0BAD946E2",
    "08E24FA074E5AB3143DB5BFCE0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF",
);
const GENERATOR: u32 = 2;
const DERIVED_KEY_INFO: &[u8] = b"Caldera Derived Key";
const DERIVED_KEY_LEN: usize = 16;

/// Parameters of the `PASSWORD_VERIFIER` challenge.
#[derive(Debug, Clone)]
pub struct PasswordVerifier<'a> {
    pub user_id_for_srp: &'a str,
    pub salt_hex: &'a str,
    pub srp_b_hex: &'a str,
    pub secret_block: &'a str,
}

/// One login attempt: the ephemeral key pair plus the group constants.
pub struct SrpSession {
    pool_name: String,
    n: BigUint,
    g: BigUint,
    k: BigUint,
    a: BigUint,
    big_a: BigUint,
}

impl SrpSession {
    /// Start a handshake with a fresh random private value.
    pub fn new(user_pool_id: &str) -> Result<Self> {
        let mut bytes = [0u8; 128];
        loop {
            rand::thread_rng().fill_bytes(&mut bytes);
            let session = Self::with_private_key(user_pool_id, BigUint::from_bytes_be(&bytes))?;
            if session.big_a != BigUint::default() {
                return Ok(session);
            }
        }
    }

    /// Start a handshake with a fixed private value.
    pub fn with_private_key(user_pool_id: &str, a: BigUint) -> Result<Self> {
        let pool_name = user_pool_id
            .split_once('_')
            .map(|(_, name)| name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "user pool id `{user_pool_id}` is not of the form <region>_<name>"
                ))
            })?
            .to_string();

        let n = group_prime();
        let g = BigUint::from(GENERATOR);
        let k = hash_hex(&format!("{}{}", pad_hex(&n), pad_hex(&g)))?;
        let big_a = g.modpow(&a, &n);

        Ok(SrpSession {
            pool_name,
            n,
            g,
            k,
            a,
            big_a,
        })
    }

    /// `SRP_A` auth parameter.
    pub fn public_key_hex(&self) -> String {
        self.big_a.to_str_radix(16)
    }

    /// Signature for `PASSWORD_CLAIM_SIGNATURE`, base64 encoded.
    pub fn password_claim(
        &self,
        challenge: &PasswordVerifier<'_>,
        password: &str,
        timestamp: &str,
    ) -> Result<String> {
        let key = self.authentication_key(challenge, password)?;
        let secret_block = STANDARD
            .decode(challenge.secret_block)
            .map_err(|e| Error::UnexpectedResponse(format!("SECRET_BLOCK is not base64: {e}")))?;

        let mut mac = hmac(&key)?;
        mac.update(self.pool_name.as_bytes());
        mac.update(challenge.user_id_for_srp.as_bytes());
        mac.update(&secret_block);
        mac.update(timestamp.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// HKDF-derived key shared with the server.
    fn authentication_key(
        &self,
        challenge: &PasswordVerifier<'_>,
        password: &str,
    ) -> Result<[u8; DERIVED_KEY_LEN]> {
        let (secret, u) = self.premaster_secret(challenge, password)?;
        let ikm = hex::decode(pad_hex(&secret)).map_err(hex_error)?;
        let salt = hex::decode(pad_hex(&u)).map_err(hex_error)?;
        derive_key(&ikm, &salt, DERIVED_KEY_INFO)
    }

    /// `S = (B - k * g^x) ^ (a + u * x) mod N`, returned with `u`.
    fn premaster_secret(
        &self,
        challenge: &PasswordVerifier<'_>,
        password: &str,
    ) -> Result<(BigUint, BigUint)> {
        let big_b = parse_hex("SRP_B", challenge.srp_b_hex)?;
        if &big_b % &self.n == BigUint::default() {
            return Err(Error::Auth("identity provider sent an invalid SRP_B".into()));
        }
        let u = hash_hex(&format!("{}{}", pad_hex(&self.big_a), pad_hex(&big_b)))?;
        if u == BigUint::default() {
            return Err(Error::Auth("SRP scrambling parameter is zero".into()));
        }

        let x = self.private_exponent(challenge, password)?;
        let g_x = self.g.modpow(&x, &self.n);
        let k_g_x = (&self.k * g_x) % &self.n;
        let base = ((&big_b % &self.n) + &self.n - k_g_x) % &self.n;
        let exponent = &self.a + &u * &x;
        Ok((base.modpow(&exponent, &self.n), u))
    }

    /// `x = H(salt | H(pool_name | user_id | ":" | password))`.
    fn private_exponent(&self, challenge: &PasswordVerifier<'_>, password: &str) -> Result<BigUint> {
        let salt = parse_hex("SALT", challenge.salt_hex)?;
        let identity = Sha256::digest(
            format!("{}{}:{}", self.pool_name, challenge.user_id_for_srp, password).as_bytes(),
        );
        hash_hex(&format!("{}{}", pad_hex(&salt), hex::encode(identity)))
    }
}

/// `TIMESTAMP` challenge response, e.g. `Tue Mar 4 05:06:07 UTC 2025`.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%a %b %-d %H:%M:%S UTC %Y").to_string()
}

fn group_prime() -> BigUint {
    BigUint::parse_bytes(N_HEX.as_bytes(), 16).unwrap_or_default()
}

/// Even-length hex with a leading `00` when the high bit is set, so the
/// value reads as positive.
fn pad_hex(n: &BigUint) -> String {
    let mut hex = n.to_str_radix(16);
    if hex.len() % 2 == 1 {
        hex.insert(0, '0');
    }
    if hex.starts_with(|c: char| matches!(c, '8'..='9' | 'a'..='f')) {
        hex.insert_str(0, "00");
    }
    hex
}

/// SHA-256 of the bytes a hex string encodes, as an integer.
fn hash_hex(hex_str: &str) -> Result<BigUint> {
    let bytes = hex::decode(hex_str).map_err(hex_error)?;
    Ok(BigUint::from_bytes_be(&Sha256::digest(bytes)))
}

fn parse_hex(name: &str, value: &str) -> Result<BigUint> {
    BigUint::parse_bytes(value.trim().as_bytes(), 16)
        .ok_or_else(|| Error::UnexpectedResponse(format!("{name} is not a hex number")))
}

/// HKDF-SHA256 (RFC 5869) output truncated to the 16 bytes Cognito uses.
fn derive_key(ikm: &[u8], salt: &[u8], info: &[u8]) -> Result<[u8; DERIVED_KEY_LEN]> {
    let mut key = [0u8; DERIVED_KEY_LEN];
    Hkdf::<Sha256>::new(Some(salt), ikm)
        .expand(info, &mut key)
        .map_err(|e| Error::Auth(format!("key derivation failed: {e}")))?;
    Ok(key)
}

fn hmac(key: &[u8]) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(key).map_err(|e| Error::Auth(format!("HMAC key rejected: {e}")))
}

fn hex_error(e: hex::FromHexError) -> Error {
    Error::UnexpectedResponse(format!("invalid hex value: {e}"))
}
