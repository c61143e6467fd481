//! Cookie value signing
//!
//! Signatures are HMAC-SHA256 over `name=value`, encoded as unpadded URL-safe
//! base64 so they fit in a cookie without escaping. Binding the cookie name
//! into the signed text stops a valid identifier for one session name from
//! being replayed under another.
//!
//! The first key signs. Every key verifies, so keys can be rotated by
//! prepending a new one and retiring the old one after the cookie lifetime.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies cookie values with an ordered list of keys
#[derive(Clone)]
pub struct CookieSigner {
	keys: Vec<Vec<u8>>,
}

impl CookieSigner {
	/// Build a signer from keys in priority order
	///
	/// Returns `None` when there is no usable primary key, meaning cookies
	/// are to be sent unsigned. Empty keys after the first are ignored.
	///
	/// # Examples
	///
	/// ```
	/// use session_redis_core::CookieSigner;
	///
	/// assert!(CookieSigner::new(["keyxxx"]).is_some());
	/// assert!(CookieSigner::new(Vec::<String>::new()).is_none());
	/// assert!(CookieSigner::new([""]).is_none());
	/// ```
	pub fn new<I, K>(keys: I) -> Option<Self>
	where
		I: IntoIterator<Item = K>,
		K: AsRef<[u8]>,
	{
		let mut keys = keys.into_iter().map(|k| k.as_ref().to_vec()).peekable();
		if keys.peek().is_none_or(|primary| primary.is_empty()) {
			return None;
		}

		Some(Self {
			keys: keys.filter(|k| !k.is_empty()).collect(),
		})
	}

	/// Number of keys accepted for verification
	pub fn key_count(&self) -> usize {
		self.keys.len()
	}

	/// Sign `data` with the primary key
	///
	/// # Examples
	///
	/// ```
	/// use session_redis_core::CookieSigner;
	///
	/// let signer = CookieSigner::new(["keyxxx"]).unwrap();
	/// let signature = signer.sign("Sess=abc");
	/// assert!(signer.verify("Sess=abc", &signature));
	/// assert!(!signer.verify("Other=abc", &signature));
	/// ```
	pub fn sign(&self, data: &str) -> String {
		let mut mac = Self::mac(&self.keys[0]);
		mac.update(data.as_bytes());
		URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
	}

	/// Check `signature` against every key
	pub fn verify(&self, data: &str, signature: &str) -> bool {
		self.index(data, signature).is_some()
	}

	/// Position of the key that produced `signature`, if any
	///
	/// Comparison is constant-time per key.
	pub fn index(&self, data: &str, signature: &str) -> Option<usize> {
		let provided = URL_SAFE_NO_PAD.decode(signature).ok()?;

		self.keys.iter().position(|key| {
			let mut mac = Self::mac(key);
			mac.update(data.as_bytes());
			mac.verify_slice(&provided).is_ok()
		})
	}

	fn mac(key: &[u8]) -> HmacSha256 {
		HmacSha256::new_from_slice(key).expect("HMAC accepts any key length")
	}
}

impl fmt::Debug for CookieSigner {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CookieSigner")
			.field("keys", &format_args!("[{} redacted]", self.keys.len()))
			.finish()
	}
}
