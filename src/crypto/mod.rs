//! Encryption capabilities consumed by item streams.
//!
//! An [`ItemStream`](crate::item::ItemStream) encrypts on write through a
//! [`Cryptor`] and decrypts on read through a [`Decryptor`]. Both transform a
//! buffer in place and may carry state from one call to the next, as stream
//! ciphers do, so buffers must be passed in stream order and never replayed.
//!
//! With the `zipcrypto` feature, this module also provides the traditional
//! PKWARE cipher ([`ZipCryptor`], [`ZipDecryptor`]).

#[cfg(feature = "zipcrypto")]
mod zipcrypto;

#[cfg(feature = "zipcrypto")]
pub use zipcrypto::{ENCRYPTION_HEADER_LEN, ZipCryptor, ZipDecryptor};

/// Encrypts entry data in place.
pub trait Cryptor {
    /// Encrypts `buf` in place, continuing from the state left by the
    /// previous call.
    fn encrypt_buffer(&mut self, buf: &mut [u8]);
}

/// Decrypts entry data in place.
pub trait Decryptor {
    /// Decrypts `buf` in place, continuing from the state left by the
    /// previous call.
    fn decrypt_buffer(&mut self, buf: &mut [u8]);
}

impl<T: Cryptor + ?Sized> Cryptor for &mut T {
    fn encrypt_buffer(&mut self, buf: &mut [u8]) {
        (**self).encrypt_buffer(buf);
    }
}

impl<T: Cryptor + ?Sized> Cryptor for Box<T> {
    fn encrypt_buffer(&mut self, buf: &mut [u8]) {
        (**self).encrypt_buffer(buf);
    }
}

impl<T: Decryptor + ?Sized> Decryptor for &mut T {
    fn decrypt_buffer(&mut self, buf: &mut [u8]) {
        (**self).decrypt_buffer(buf);
    }
}

impl<T: Decryptor + ?Sized> Decryptor for Box<T> {
    fn decrypt_buffer(&mut self, buf: &mut [u8]) {
        (**self).decrypt_buffer(buf);
    }
}
