//! Random credential generation

use rand::rngs::OsRng;
use rand::RngCore;
use seedvault_core::{CharacterPolicy, Error, Result, SecretValue};
use zeroize::Zeroizing;

/// Produces new credential values
pub trait CredentialGenerator: Send + Sync {
    /// Generate exactly `length` characters, each drawn from `policy`
    fn generate(&self, length: usize, policy: &CharacterPolicy) -> Result<SecretValue>;
}

/// Generator backed by the operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRngGenerator;

impl CredentialGenerator for OsRngGenerator {
    fn generate(&self, length: usize, policy: &CharacterPolicy) -> Result<SecretValue> {
        generate_from(&mut OsRng, length, &policy.alphabet())
    }
}

/// Draw `length` characters uniformly from `alphabet` using `rng`.
///
/// Bytes that would bias the result towards the start of the alphabet are
/// rejected rather than folded with a modulo.
pub fn generate_from<R: RngCore + ?Sized>(
    rng: &mut R,
    length: usize,
    alphabet: &[u8],
) -> Result<SecretValue> {
    if alphabet.is_empty() || alphabet.len() > 256 {
        return Err(Error::generation(format!(
            "alphabet must have between 1 and 256 characters, got {}",
            alphabet.len()
        )));
    }
    if length == 0 {
        return Err(Error::invalid_request("length", "must be at least 1"));
    }
    let size = alphabet.len();
    let accept_below = 256 - (256 % size);

    let mut out = Zeroizing::new(String::with_capacity(length));
    let mut buf = Zeroizing::new([0u8; 64]);
    while out.len() < length {
        rng.try_fill_bytes(&mut buf[..])
            .map_err(|e| Error::generation(format!("random source unavailable: {e}")))?;
        for &byte in buf.iter() {
            let byte = usize::from(byte);
            if byte < accept_below {
                out.push(char::from(alphabet[byte % size]));
                if out.len() == length {
                    break;
                }
            }
        }
    }

    Ok(SecretValue::new(std::mem::take(&mut *out)))
}
