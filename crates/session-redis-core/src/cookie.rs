//! Cookie transport
//!
//! The store engine never touches HTTP headers itself. It asks a
//! [`CookieTransport`] for the identifier cookie of a session name and tells
//! it to set or expire that cookie. [`CookieJar`] is the stock transport over
//! `http` request and response headers.
//!
//! Signed cookies travel with a companion `<name>.sig` cookie holding the
//! signature of `name=value`.

use crate::signer::CookieSigner;
use cookie::Cookie;
use cookie::time::Duration;
use http::HeaderMap;
use http::header::{COOKIE, InvalidHeaderValue, SET_COOKIE};
use std::collections::HashMap;

pub use cookie::SameSite;

/// Suffix of the companion cookie carrying a signature
pub const SIGNATURE_SUFFIX: &str = ".sig";

/// Attributes of an outgoing cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
	/// Path attribute
	pub path: String,
	/// Domain attribute
	pub domain: Option<String>,
	/// HTTPS-only cookie
	pub secure: bool,
	/// HttpOnly flag
	pub http_only: bool,
	/// SameSite attribute
	pub same_site: Option<SameSite>,
	/// Emit a companion signature cookie
	pub signed: bool,
	/// Max-Age in seconds
	pub max_age: Option<u64>,
}

impl Default for CookieOptions {
	fn default() -> Self {
		Self {
			path: "/".to_string(),
			domain: None,
			secure: false,
			http_only: true,
			same_site: None,
			signed: false,
			max_age: None,
		}
	}
}

/// Reads and writes session identifier cookies
pub trait CookieTransport {
	/// Value of the request cookie `name`
	///
	/// With `verify_signature`, a cookie whose companion signature is missing
	/// or wrong is reported as absent.
	fn get(&self, name: &str, verify_signature: bool) -> Option<String>;

	/// Queue a cookie on the response
	fn set(&mut self, name: &str, value: &str, options: &CookieOptions);

	/// Queue an expired cookie that makes the client drop `name`
	fn remove(&mut self, name: &str, options: &CookieOptions);
}

/// Cookie transport over request and response headers
///
/// # Examples
///
/// ```
/// use http::HeaderMap;
/// use http::header::COOKIE;
/// use session_redis_core::{CookieJar, CookieOptions, CookieTransport};
///
/// let mut request = HeaderMap::new();
/// request.insert(COOKIE, "Sess=abc; theme=dark".parse().unwrap());
///
/// let mut jar = CookieJar::from_headers(&request);
/// assert_eq!(jar.get("Sess", false), Some("abc".to_string()));
///
/// jar.set("Sess", "def", &CookieOptions::default());
/// assert_eq!(jar.set_cookie_headers(), vec!["Sess=def; HttpOnly; Path=/"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
	incoming: HashMap<String, String>,
	outgoing: Vec<Cookie<'static>>,
	signer: Option<CookieSigner>,
}

impl CookieJar {
	/// Create a jar with no request cookies
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a jar from the `Cookie` headers of a request
	///
	/// Malformed pairs are skipped; the first occurrence of a name wins.
	pub fn from_headers(headers: &HeaderMap) -> Self {
		let mut jar = Self::new();
		for value in headers.get_all(COOKIE) {
			let Ok(header) = value.to_str() else {
				continue;
			};
			for cookie in Cookie::split_parse(header).flatten() {
				jar.incoming
					.entry(cookie.name().to_string())
					.or_insert_with(|| cookie.value().to_string());
			}
		}
		jar
	}

	/// Sign and verify cookies with the given signer
	pub fn with_signer(mut self, signer: CookieSigner) -> Self {
		self.signer = Some(signer);
		self
	}

	/// Add a request cookie
	pub fn insert_request_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.incoming.insert(name.into(), value.into());
	}

	/// Cookies queued for the response
	pub fn outgoing(&self) -> &[Cookie<'static>] {
		&self.outgoing
	}

	/// Queued cookies rendered as `Set-Cookie` header values
	pub fn set_cookie_headers(&self) -> Vec<String> {
		self.outgoing.iter().map(|c| c.to_string()).collect()
	}

	/// Append the queued cookies to response headers
	pub fn write_headers(&self, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
		for cookie in &self.outgoing {
			headers.append(SET_COOKIE, cookie.to_string().parse()?);
		}
		Ok(())
	}

	/// Replace any queued cookie of the same name
	fn queue(&mut self, cookie: Cookie<'static>) {
		self.outgoing.retain(|c| c.name() != cookie.name());
		self.outgoing.push(cookie);
	}
}

impl CookieTransport for CookieJar {
	fn get(&self, name: &str, verify_signature: bool) -> Option<String> {
		let value = self.incoming.get(name)?;
		if !verify_signature {
			return Some(value.clone());
		}

		let Some(signer) = &self.signer else {
			tracing::debug!(
				cookie = name,
				"signed cookie requested but no signing keys are set"
			);
			return None;
		};
		let signature = self.incoming.get(&signature_name(name))?;
		match signer.index(&format!("{}={}", name, value), signature) {
			Some(index) => {
				if index > 0 {
					tracing::debug!(
						cookie = name,
						key_index = index,
						"cookie signed with a rotated key"
					);
				}
				Some(value.clone())
			}
			None => {
				tracing::debug!(cookie = name, "cookie signature mismatch");
				None
			}
		}
	}

	fn set(&mut self, name: &str, value: &str, options: &CookieOptions) {
		self.queue(build_cookie(name, value, options));

		if !options.signed {
			return;
		}
		match &self.signer {
			Some(signer) => {
				let signature = signer.sign(&format!("{}={}", name, value));
				self.queue(build_cookie(&signature_name(name), &signature, options));
			}
			None => {
				tracing::warn!(
					cookie = name,
					"signed cookie requested but no signing keys are set; sent unsigned"
				);
			}
		}
	}

	fn remove(&mut self, name: &str, options: &CookieOptions) {
		let mut cookie = build_cookie(name, "", options);
		cookie.make_removal();
		self.queue(cookie);

		if options.signed {
			let mut signature = build_cookie(&signature_name(name), "", options);
			signature.make_removal();
			self.queue(signature);
		}
	}
}

fn signature_name(name: &str) -> String {
	format!("{}{}", name, SIGNATURE_SUFFIX)
}

fn build_cookie(name: &str, value: &str, options: &CookieOptions) -> Cookie<'static> {
	let mut builder = Cookie::build((name.to_string(), value.to_string()))
		.path(options.path.clone())
		.http_only(options.http_only)
		.secure(options.secure);

	if let Some(domain) = &options.domain {
		builder = builder.domain(domain.clone());
	}
	if let Some(same_site) = options.same_site {
		builder = builder.same_site(same_site);
	}
	if let Some(max_age) = options.max_age {
		let seconds = i64::try_from(max_age).unwrap_or(i64::MAX);
		builder = builder.max_age(Duration::seconds(seconds));
	}

	builder.build()
}
