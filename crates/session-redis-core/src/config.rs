//! Store configuration
//!
//! [`StoreOptions`] can be built in code, read from `SESSION_REDIS_*`
//! environment variables, or parsed from TOML.
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `SESSION_REDIS_ADDR` | backend `host:port` |
//! | `SESSION_REDIS_PASSWORD` | backend password |
//! | `SESSION_REDIS_DB` | database index |
//! | `SESSION_REDIS_EXPIRATION_SECS` | session lifetime |
//! | `SESSION_REDIS_KEYS` | comma-separated signing keys, first signs |
//! | `SESSION_REDIS_KEY_PREFIX` | prefix for backend keys |
//! | `SESSION_REDIS_TIMEOUT_SECS` | per-call backend timeout |
//! | `SESSION_REDIS_COOKIE_PATH` | cookie `Path` |
//! | `SESSION_REDIS_COOKIE_DOMAIN` | cookie `Domain` |
//! | `SESSION_REDIS_COOKIE_SECURE` | cookie `Secure` flag |

use crate::cookie::{CookieOptions, SameSite};
use crate::signer::CookieSigner;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Backend address used when none is configured
pub const DEFAULT_ADDR: &str = "127.0.0.1:6379";

/// Session lifetime used when none, or an unusable one, is configured
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest accepted session lifetime, ten years
pub const MAX_EXPIRATION: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Upper bound on a single backend call
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Prefix of the environment variables read by [`StoreOptions::from_env`]
pub const ENV_PREFIX: &str = "SESSION_REDIS_";

/// Configuration errors
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
	/// A value could not be parsed
	#[error("Invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },

	/// The TOML document is malformed
	#[error("Invalid TOML configuration: {0}")]
	Toml(#[from] toml::de::Error),

	/// The backend address cannot form a connection URL
	#[error("Invalid backend address: {0}")]
	InvalidAddress(String),
}

impl ConfigError {
	fn invalid(key: &str, message: impl fmt::Display) -> Self {
		Self::InvalidValue {
			key: key.to_string(),
			message: message.to_string(),
		}
	}
}

/// Store configuration
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use session_redis_core::StoreOptions;
///
/// let options = StoreOptions::new()
/// 	.with_addr("cache.internal:6379")
/// 	.with_db(2)
/// 	.with_keys(["keyxxx"])
/// 	.with_expiration(Duration::from_secs(3600));
///
/// assert!(options.is_signed());
/// assert_eq!(options.expiration(), Duration::from_secs(3600));
/// assert_eq!(options.redis_url().unwrap(), "redis://cache.internal:6379/2");
/// ```
#[non_exhaustive]
#[derive(Clone)]
pub struct StoreOptions {
	/// Backend `host:port`
	pub addr: String,
	/// Backend password
	pub password: Option<String>,
	/// Database index
	pub db: i64,
	/// Signing keys, first signs and all verify
	pub keys: Vec<String>,
	/// Prefix prepended to every backend key
	pub key_prefix: String,
	/// Upper bound on a single backend call
	pub operation_timeout: Duration,
	/// Cookie `Path`
	pub cookie_path: String,
	/// Cookie `Domain`
	pub cookie_domain: Option<String>,
	/// Cookie `Secure` flag
	pub cookie_secure: bool,
	/// Cookie `HttpOnly` flag
	pub cookie_http_only: bool,
	/// Cookie `SameSite` attribute
	pub cookie_same_site: Option<SameSite>,
	expiration: Duration,
}

impl Default for StoreOptions {
	fn default() -> Self {
		Self {
			addr: DEFAULT_ADDR.to_string(),
			password: None,
			db: 0,
			keys: Vec::new(),
			key_prefix: String::new(),
			operation_timeout: DEFAULT_OPERATION_TIMEOUT,
			cookie_path: "/".to_string(),
			cookie_domain: None,
			cookie_secure: false,
			cookie_http_only: true,
			cookie_same_site: None,
			expiration: DEFAULT_EXPIRATION,
		}
	}
}

impl StoreOptions {
	/// Defaults: local backend, database 0, 24 hour sessions, unsigned cookies
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the backend address
	pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
		self.addr = addr.into();
		self
	}

	/// Set the backend password
	pub fn with_password(mut self, password: impl Into<String>) -> Self {
		self.password = Some(password.into());
		self
	}

	/// Set the database index
	pub fn with_db(mut self, db: i64) -> Self {
		self.db = db;
		self
	}

	/// Set the session lifetime
	///
	/// Anything under one second falls back to [`DEFAULT_EXPIRATION`];
	/// anything over [`MAX_EXPIRATION`] is capped to it.
	pub fn with_expiration(mut self, expiration: Duration) -> Self {
		self.expiration = clamp_expiration(expiration);
		self
	}

	/// Set the signing keys
	pub fn with_keys<I, K>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = K>,
		K: Into<String>,
	{
		self.keys = keys.into_iter().map(Into::into).collect();
		self
	}

	/// Set the backend key prefix
	pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.key_prefix = prefix.into();
		self
	}

	/// Set the per-call backend timeout
	///
	/// A zero timeout would fail every call, so it falls back to
	/// [`DEFAULT_OPERATION_TIMEOUT`].
	pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
		if timeout.is_zero() {
			tracing::warn!(
				fallback = ?DEFAULT_OPERATION_TIMEOUT,
				"zero backend timeout, using default"
			);
			self.operation_timeout = DEFAULT_OPERATION_TIMEOUT;
		} else {
			self.operation_timeout = timeout;
		}
		self
	}

	/// Set the cookie path
	pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
		self.cookie_path = path.into();
		self
	}

	/// Set the cookie domain
	pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
		self.cookie_domain = Some(domain.into());
		self
	}

	/// Set the cookie `Secure` flag
	pub fn with_cookie_secure(mut self, secure: bool) -> Self {
		self.cookie_secure = secure;
		self
	}

	/// Set the cookie `HttpOnly` flag
	pub fn with_cookie_http_only(mut self, http_only: bool) -> Self {
		self.cookie_http_only = http_only;
		self
	}

	/// Set the cookie `SameSite` attribute
	pub fn with_cookie_same_site(mut self, same_site: SameSite) -> Self {
		self.cookie_same_site = Some(same_site);
		self
	}

	/// Session lifetime, used as both record TTL and cookie `Max-Age`
	pub fn expiration(&self) -> Duration {
		self.expiration
	}

	/// Signer for the configured keys
	///
	/// `None` when no key is set or the first key is empty.
	pub fn signer(&self) -> Option<CookieSigner> {
		CookieSigner::new(&self.keys)
	}

	/// Whether identifier cookies are signed
	pub fn is_signed(&self) -> bool {
		self.keys.first().is_some_and(|k| !k.is_empty())
	}

	/// Attributes for an identifier cookie
	pub fn cookie_options(&self, signed: bool) -> CookieOptions {
		CookieOptions {
			path: self.cookie_path.clone(),
			domain: self.cookie_domain.clone(),
			secure: self.cookie_secure,
			http_only: self.cookie_http_only,
			same_site: self.cookie_same_site,
			signed,
			max_age: Some(self.expiration.as_secs()),
		}
	}

	/// Connection URL for the configured backend
	pub fn redis_url(&self) -> Result<String, ConfigError> {
		let mut url = Url::parse(&format!("redis://{}/{}", self.addr, self.db))
			.map_err(|e| ConfigError::InvalidAddress(format!("{}: {}", self.addr, e)))?;
		if url.host_str().is_none_or(str::is_empty) {
			return Err(ConfigError::InvalidAddress(self.addr.clone()));
		}

		if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
			url.set_password(Some(password))
				.map_err(|_| ConfigError::InvalidAddress(self.addr.clone()))?;
		}

		Ok(url.into())
	}

	/// Read options from the process environment
	///
	/// Unset variables keep their defaults.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Read options through a variable lookup function
	///
	/// `lookup` receives full variable names such as `SESSION_REDIS_ADDR`.
	///
	/// # Examples
	///
	/// ```
	/// use std::collections::HashMap;
	/// use session_redis_core::StoreOptions;
	///
	/// let vars = HashMap::from([
	/// 	("SESSION_REDIS_DB", "3"),
	/// 	("SESSION_REDIS_KEYS", "new-key, old-key"),
	/// ]);
	/// let options = StoreOptions::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
	///
	/// assert_eq!(options.db, 3);
	/// assert_eq!(options.keys, vec!["new-key", "old-key"]);
	/// ```
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &str| {
			let key = format!("{}{}", ENV_PREFIX, name);
			lookup(&key).map(|value| (key, value))
		};
		let mut options = Self::default();

		if let Some((_, addr)) = get("ADDR") {
			options.addr = addr;
		}
		if let Some((_, password)) = get("PASSWORD") {
			options.password = Some(password).filter(|p| !p.is_empty());
		}
		if let Some((key, db)) = get("DB") {
			options.db = db.trim().parse().map_err(|e| ConfigError::invalid(&key, e))?;
		}
		if let Some((key, secs)) = get("EXPIRATION_SECS") {
			let secs: u64 = secs.trim().parse().map_err(|e| ConfigError::invalid(&key, e))?;
			options = options.with_expiration(Duration::from_secs(secs));
		}
		if let Some((_, keys)) = get("KEYS") {
			options.keys = keys
				.split(',')
				.map(|k| k.trim().to_string())
				.filter(|k| !k.is_empty())
				.collect();
		}
		if let Some((_, prefix)) = get("KEY_PREFIX") {
			options.key_prefix = prefix;
		}
		if let Some((key, secs)) = get("TIMEOUT_SECS") {
			options.operation_timeout = parse_timeout(&key, secs.trim().parse().ok())?;
		}
		if let Some((_, path)) = get("COOKIE_PATH") {
			options.cookie_path = path;
		}
		if let Some((_, domain)) = get("COOKIE_DOMAIN") {
			options.cookie_domain = Some(domain).filter(|d| !d.is_empty());
		}
		if let Some((key, secure)) = get("COOKIE_SECURE") {
			options.cookie_secure = parse_bool(&key, &secure)?;
		}

		Ok(options)
	}

	/// Parse options from a TOML document
	///
	/// ```toml
	/// addr = "127.0.0.1:6379"
	/// db = 0
	/// expiration_secs = 86400
	/// keys = ["keyxxx"]
	///
	/// [cookie]
	/// path = "/"
	/// same_site = "lax"
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		let file: FileOptions = toml::from_str(source)?;
		let mut options = Self::default();

		if let Some(addr) = file.addr {
			options.addr = addr;
		}
		options.password = file.password.filter(|p| !p.is_empty());
		if let Some(db) = file.db {
			options.db = db;
		}
		if let Some(secs) = file.expiration_secs {
			options = options.with_expiration(Duration::from_secs(secs));
		}
		if let Some(keys) = file.keys {
			options.keys = keys;
		}
		if let Some(prefix) = file.key_prefix {
			options.key_prefix = prefix;
		}
		if file.timeout_secs.is_some() {
			options.operation_timeout = parse_timeout("timeout_secs", file.timeout_secs)?;
		}

		let cookie = file.cookie.unwrap_or_default();
		if let Some(path) = cookie.path {
			options.cookie_path = path;
		}
		options.cookie_domain = cookie.domain;
		if let Some(secure) = cookie.secure {
			options.cookie_secure = secure;
		}
		if let Some(http_only) = cookie.http_only {
			options.cookie_http_only = http_only;
		}
		if let Some(same_site) = cookie.same_site {
			options.cookie_same_site = Some(parse_same_site("cookie.same_site", &same_site)?);
		}

		Ok(options)
	}
}

impl fmt::Debug for StoreOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StoreOptions")
			.field("addr", &self.addr)
			.field("password", &self.password.as_ref().map(|_| "<redacted>"))
			.field("db", &self.db)
			.field("expiration", &self.expiration)
			.field("keys", &format_args!("[{} redacted]", self.keys.len()))
			.field("key_prefix", &self.key_prefix)
			.field("operation_timeout", &self.operation_timeout)
			.field("cookie_path", &self.cookie_path)
			.field("cookie_domain", &self.cookie_domain)
			.field("cookie_secure", &self.cookie_secure)
			.field("cookie_http_only", &self.cookie_http_only)
			.field("cookie_same_site", &self.cookie_same_site)
			.finish()
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileOptions {
	addr: Option<String>,
	password: Option<String>,
	db: Option<i64>,
	expiration_secs: Option<u64>,
	keys: Option<Vec<String>>,
	key_prefix: Option<String>,
	timeout_secs: Option<u64>,
	cookie: Option<FileCookieOptions>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileCookieOptions {
	path: Option<String>,
	domain: Option<String>,
	secure: Option<bool>,
	http_only: Option<bool>,
	same_site: Option<String>,
}

fn clamp_expiration(expiration: Duration) -> Duration {
	if expiration < Duration::from_secs(1) {
		tracing::warn!(
			requested = ?expiration,
			fallback = ?DEFAULT_EXPIRATION,
			"session expiration below one second, using default"
		);
		return DEFAULT_EXPIRATION;
	}
	if expiration > MAX_EXPIRATION {
		tracing::warn!(
			requested = ?expiration,
			limit = ?MAX_EXPIRATION,
			"session expiration too long, capping"
		);
		return MAX_EXPIRATION;
	}
	expiration
}

fn parse_timeout(key: &str, secs: Option<u64>) -> Result<Duration, ConfigError> {
	match secs {
		Some(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
		_ => Err(ConfigError::invalid(key, "expected a positive number of seconds")),
	}
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		other => Err(ConfigError::invalid(key, format!("not a boolean: {}", other))),
	}
}

fn parse_same_site(key: &str, value: &str) -> Result<SameSite, ConfigError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"strict" => Ok(SameSite::Strict),
		"lax" => Ok(SameSite::Lax),
		"none" => Ok(SameSite::None),
		other => Err(ConfigError::invalid(key, format!("unknown SameSite: {}", other))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;
	use std::collections::HashMap;

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key| vars.get(key).cloned()
	}

	#[rstest]
	fn test_defaults() {
		let options = StoreOptions::default();

		assert_eq!(options.addr, "127.0.0.1:6379");
		assert_eq!(options.db, 0);
		assert_eq!(options.expiration(), Duration::from_secs(86_400));
		assert!(!options.is_signed());
		assert!(options.signer().is_none());
	}

	#[rstest]
	#[case::zero(Duration::ZERO)]
	#[case::sub_second(Duration::from_millis(999))]
	fn test_short_expiration_falls_back_to_default(#[case] requested: Duration) {
		let options = StoreOptions::new().with_expiration(requested);

		assert_eq!(options.expiration(), DEFAULT_EXPIRATION);
	}

	#[rstest]
	#[case::just_over(MAX_EXPIRATION + Duration::from_secs(1))]
	#[case::huge(Duration::MAX)]
	fn test_long_expiration_is_capped(#[case] requested: Duration) {
		let options = StoreOptions::new().with_expiration(requested);

		assert_eq!(options.expiration(), MAX_EXPIRATION);
		assert_eq!(options.cookie_options(false).max_age, Some(MAX_EXPIRATION.as_secs()));
	}

	#[rstest]
	fn test_env_expiration_is_capped() {
		let vars = [("SESSION_REDIS_EXPIRATION_SECS", "18446744073709551615")];

		let options = StoreOptions::from_lookup(lookup(&vars)).unwrap();

		assert_eq!(options.expiration(), MAX_EXPIRATION);
	}

	#[rstest]
	#[case::zero(Duration::ZERO, DEFAULT_OPERATION_TIMEOUT)]
	#[case::positive(Duration::from_millis(250), Duration::from_millis(250))]
	fn test_operation_timeout_rejects_zero(
		#[case] requested: Duration,
		#[case] expected: Duration,
	) {
		let options = StoreOptions::new().with_operation_timeout(requested);

		assert_eq!(options.operation_timeout, expected);
	}

	#[rstest]
	fn test_cookie_options_follow_expiration() {
		// Arrange
		let options = StoreOptions::new()
			.with_expiration(Duration::from_secs(600))
			.with_cookie_domain("example.com")
			.with_cookie_same_site(SameSite::Lax);

		// Act
		let cookie = options.cookie_options(true);

		// Assert
		assert_eq!(cookie.path, "/");
		assert_eq!(cookie.domain.as_deref(), Some("example.com"));
		assert!(cookie.http_only);
		assert!(cookie.signed);
		assert_eq!(cookie.same_site, Some(SameSite::Lax));
		assert_eq!(cookie.max_age, Some(600));
	}

	#[rstest]
	#[case::empty_list(vec![], false)]
	#[case::empty_primary(vec!["", "b"], false)]
	#[case::primary(vec!["a"], true)]
	fn test_is_signed(#[case] keys: Vec<&str>, #[case] expected: bool) {
		let options = StoreOptions::new().with_keys(keys);

		assert_eq!(options.is_signed(), expected);
		assert_eq!(options.signer().is_some(), expected);
	}

	#[rstest]
	#[case::plain(None, 0, "redis://127.0.0.1:6379/0")]
	#[case::password(Some("s3cret"), 4, "redis://:s3cret@127.0.0.1:6379/4")]
	#[case::empty_password(Some(""), 0, "redis://127.0.0.1:6379/0")]
	fn test_redis_url(#[case] password: Option<&str>, #[case] db: i64, #[case] expected: &str) {
		let mut options = StoreOptions::new().with_db(db);
		options.password = password.map(str::to_string);

		assert_eq!(options.redis_url().unwrap(), expected);
	}

	#[rstest]
	fn test_redis_url_rejects_bad_address() {
		let options = StoreOptions::new().with_addr("bad host:port");

		assert!(matches!(
			options.redis_url(),
			Err(ConfigError::InvalidAddress(_))
		));
	}

	#[rstest]
	fn test_from_lookup_reads_every_variable() {
		// Arrange
		let vars = lookup(&[
			("SESSION_REDIS_ADDR", "10.0.0.5:6380"),
			("SESSION_REDIS_PASSWORD", "pw"),
			("SESSION_REDIS_DB", "7"),
			("SESSION_REDIS_EXPIRATION_SECS", "1800"),
			("SESSION_REDIS_KEYS", "k1, k2,,"),
			("SESSION_REDIS_KEY_PREFIX", "sess:"),
			("SESSION_REDIS_TIMEOUT_SECS", "2"),
			("SESSION_REDIS_COOKIE_PATH", "/app"),
			("SESSION_REDIS_COOKIE_DOMAIN", "example.com"),
			("SESSION_REDIS_COOKIE_SECURE", "true"),
		]);

		// Act
		let options = StoreOptions::from_lookup(vars).unwrap();

		// Assert
		assert_eq!(options.addr, "10.0.0.5:6380");
		assert_eq!(options.password.as_deref(), Some("pw"));
		assert_eq!(options.db, 7);
		assert_eq!(options.expiration(), Duration::from_secs(1800));
		assert_eq!(options.keys, vec!["k1", "k2"]);
		assert_eq!(options.key_prefix, "sess:");
		assert_eq!(options.operation_timeout, Duration::from_secs(2));
		assert_eq!(options.cookie_path, "/app");
		assert_eq!(options.cookie_domain.as_deref(), Some("example.com"));
		assert!(options.cookie_secure);
	}

	#[rstest]
	fn test_from_lookup_empty_keeps_defaults() {
		let options = StoreOptions::from_lookup(|_| None).unwrap();

		assert_eq!(options.addr, DEFAULT_ADDR);
		assert_eq!(options.expiration(), DEFAULT_EXPIRATION);
	}

	#[rstest]
	#[case::db("SESSION_REDIS_DB", "zero")]
	#[case::expiration("SESSION_REDIS_EXPIRATION_SECS", "-1")]
	#[case::timeout("SESSION_REDIS_TIMEOUT_SECS", "0")]
	#[case::secure("SESSION_REDIS_COOKIE_SECURE", "maybe")]
	fn test_from_lookup_rejects_bad_values(#[case] name: &str, #[case] value: &str) {
		let result = StoreOptions::from_lookup(lookup(&[(name, value)]));

		match result {
			Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, name),
			other => panic!("expected InvalidValue, got {:?}", other),
		}
	}

	#[rstest]
	fn test_from_toml_str() {
		// Arrange
		let source = r#"
			addr = "redis.internal:6379"
			db = 1
			expiration_secs = 0
			keys = ["keyxxx"]
			key_prefix = "app:"

			[cookie]
			secure = true
			same_site = "strict"
		"#;

		// Act
		let options = StoreOptions::from_toml_str(source).unwrap();

		// Assert
		assert_eq!(options.addr, "redis.internal:6379");
		assert_eq!(options.db, 1);
		assert_eq!(options.expiration(), DEFAULT_EXPIRATION);
		assert!(options.is_signed());
		assert_eq!(options.key_prefix, "app:");
		assert!(options.cookie_secure);
		assert_eq!(options.cookie_same_site, Some(SameSite::Strict));
	}

	#[rstest]
	#[case::unknown_field("colour = \"blue\"")]
	#[case::wrong_type("db = \"one\"")]
	fn test_from_toml_str_rejects_bad_documents(#[case] source: &str) {
		assert!(matches!(
			StoreOptions::from_toml_str(source),
			Err(ConfigError::Toml(_))
		));
	}

	#[rstest]
	fn test_from_toml_str_rejects_unknown_same_site() {
		let result = StoreOptions::from_toml_str("[cookie]\nsame_site = \"sometimes\"");

		assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
	}

	#[rstest]
	fn test_debug_redacts_secrets() {
		let options = StoreOptions::new()
			.with_password("hunter2")
			.with_keys(["keyxxx"]);

		let rendered = format!("{:?}", options);

		assert!(!rendered.contains("hunter2"));
		assert!(!rendered.contains("keyxxx"));
	}
}
