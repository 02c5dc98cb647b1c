//! Traditional PKWARE encryption.
//!
//! The cipher keeps three 32-bit keys seeded from the password. Each
//! plaintext byte is XORed with a keystream byte derived from the third key,
//! then fed back into all three keys, so every byte depends on the whole
//! stream before it.
//!
//! This scheme is cryptographically weak. It is provided for compatibility
//! with archives that use it.

use zeroize::Zeroize;

use super::{Cryptor, Decryptor};
use crate::checksum::crc32_step;

/// Length of the encryption header preceding every encrypted entry.
pub const ENCRYPTION_HEADER_LEN: usize = 12;

const INITIAL_KEYS: [u32; 3] = [0x1234_5678, 0x2345_6789, 0x3456_7890];

/// Linear congruential multiplier of the second key.
const KEY1_MULTIPLIER: u32 = 134_775_813;

struct Keys([u32; 3]);

impl Keys {
    fn new(password: &[u8]) -> Self {
        let mut keys = Self(INITIAL_KEYS);
        for &byte in password {
            keys.update(byte);
        }
        keys
    }

    fn update(&mut self, plain: u8) {
        let [k0, k1, k2] = &mut self.0;
        *k0 = crc32_step(*k0, plain);
        *k1 = k1
            .wrapping_add(*k0 & 0xFF)
            .wrapping_mul(KEY1_MULTIPLIER)
            .wrapping_add(1);
        *k2 = crc32_step(*k2, (*k1 >> 24) as u8);
    }

    fn keystream_byte(&self) -> u8 {
        let temp = (self.0[2] | 2) & 0xFFFF;
        (temp.wrapping_mul(temp ^ 1) >> 8) as u8
    }

    fn encrypt(&mut self, plain: u8) -> u8 {
        let cipher = plain ^ self.keystream_byte();
        self.update(plain);
        cipher
    }

    fn decrypt(&mut self, cipher: u8) -> u8 {
        let plain = cipher ^ self.keystream_byte();
        self.update(plain);
        plain
    }
}

impl Drop for Keys {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Encrypts entry data with the traditional PKWARE cipher.
///
/// # Example
///
/// ```rust
/// use zipspan::crypto::{Cryptor, Decryptor, ZipCryptor, ZipDecryptor};
///
/// let mut cryptor = ZipCryptor::new(b"secret");
/// let header = cryptor.encryption_header([7u8; 11], 0x5A);
/// let mut data = *b"payload";
/// cryptor.encrypt_buffer(&mut data);
///
/// let mut decryptor = ZipDecryptor::new(b"secret");
/// assert!(decryptor.verify_header(&header, 0x5A));
/// decryptor.decrypt_buffer(&mut data);
/// assert_eq!(&data, b"payload");
/// ```
pub struct ZipCryptor {
    keys: Keys,
}

impl ZipCryptor {
    /// Creates a cryptor keyed with `password`.
    pub fn new(password: &[u8]) -> Self {
        Self {
            keys: Keys::new(password),
        }
    }

    /// Produces the encrypted 12-byte header that precedes the entry data.
    ///
    /// `random` should come from a secure random source. `check` is the byte
    /// readers use to verify the password: the high byte of the entry's
    /// CRC-32, or of its modification time when a data descriptor follows.
    pub fn encryption_header(&mut self, random: [u8; 11], check: u8) -> [u8; ENCRYPTION_HEADER_LEN] {
        let mut header = [0u8; ENCRYPTION_HEADER_LEN];
        header[..11].copy_from_slice(&random);
        header[11] = check;
        self.encrypt_buffer(&mut header);
        header
    }
}

impl Cryptor for ZipCryptor {
    fn encrypt_buffer(&mut self, buf: &mut [u8]) {
        for byte in buf {
            *byte = self.keys.encrypt(*byte);
        }
    }
}

impl std::fmt::Debug for ZipCryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipCryptor").finish_non_exhaustive()
    }
}

/// Decrypts entry data encrypted with the traditional PKWARE cipher.
pub struct ZipDecryptor {
    keys: Keys,
}

impl ZipDecryptor {
    /// Creates a decryptor keyed with `password`.
    pub fn new(password: &[u8]) -> Self {
        Self {
            keys: Keys::new(password),
        }
    }

    /// Decrypts the 12-byte encryption header and compares its last byte
    /// with `check`.
    ///
    /// Returns `false` for a wrong password in all but about 1 of 256 cases;
    /// a `true` result still needs confirming with the entry's CRC-32.
    pub fn verify_header(&mut self, header: &[u8; ENCRYPTION_HEADER_LEN], check: u8) -> bool {
        let mut plain = *header;
        self.decrypt_buffer(&mut plain);
        plain[ENCRYPTION_HEADER_LEN - 1] == check
    }
}

impl Decryptor for ZipDecryptor {
    fn decrypt_buffer(&mut self, buf: &mut [u8]) {
        for byte in buf {
            *byte = self.keys.decrypt(*byte);
        }
    }
}

impl std::fmt::Debug for ZipDecryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipDecryptor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &[u8] = b"The quick brown fox jumps over the lazy dog";

    #[test]
    fn test_roundtrip() {
        let mut data = PLAIN.to_vec();
        ZipCryptor::new(b"password").encrypt_buffer(&mut data);
        assert_ne!(data, PLAIN);

        ZipDecryptor::new(b"password").decrypt_buffer(&mut data);
        assert_eq!(data, PLAIN);
    }

    #[test]
    fn test_state_carries_between_calls() {
        let mut whole = PLAIN.to_vec();
        ZipCryptor::new(b"pw").encrypt_buffer(&mut whole);

        let mut pieces = PLAIN.to_vec();
        let mut cryptor = ZipCryptor::new(b"pw");
        let (head, tail) = pieces.split_at_mut(10);
        cryptor.encrypt_buffer(head);
        cryptor.encrypt_buffer(tail);

        assert_eq!(whole, pieces);
    }

    #[test]
    fn test_wrong_password_garbles() {
        let mut data = PLAIN.to_vec();
        ZipCryptor::new(b"right").encrypt_buffer(&mut data);
        ZipDecryptor::new(b"wrong").decrypt_buffer(&mut data);
        assert_ne!(data, PLAIN);
    }

    #[test]
    fn test_header_then_data() {
        let mut cryptor = ZipCryptor::new(b"secret");
        let header = cryptor.encryption_header([0x11; 11], 0xC3);
        let mut data = PLAIN.to_vec();
        cryptor.encrypt_buffer(&mut data);

        let mut decryptor = ZipDecryptor::new(b"secret");
        assert!(decryptor.verify_header(&header, 0xC3));
        decryptor.decrypt_buffer(&mut data);
        assert_eq!(data, PLAIN);
    }

    #[test]
    fn test_initial_keys() {
        let keys = Keys::new(b"");
        assert_eq!(keys.0, INITIAL_KEYS);
    }
}
