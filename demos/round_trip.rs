//! Two requests sharing one session
//!
//! The first request stores a profile, the second one reads it back using
//! only the cookies set by the first.
//!
//! Runs against an in-memory backend. Built with `--features redis-backend`
//! and with `SESSION_REDIS_ADDR` set, it talks to that Redis server instead.
//!
//! ```sh
//! RUST_LOG=session_redis_core=debug cargo run --example round_trip
//! ```

use http::HeaderMap;
use http::header::{COOKIE, SET_COOKIE};
use serde::{Deserialize, Serialize};
use session_redis::prelude::*;

const SESSION_NAME: &str = "Sess";

#[derive(Debug, Serialize, Deserialize)]
struct Profile {
	user_id: String,
	name: String,
	age: i64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive("session_redis_core=info".parse()?),
		)
		.init();

	let options = StoreOptions::from_env()?.with_keys(["keyxxx"]);

	#[cfg(feature = "redis-backend")]
	if std::env::var("SESSION_REDIS_ADDR").is_ok() {
		return run(SessionStore::connect(options)?).await;
	}

	run(SessionStore::new(InMemoryBackend::new(), options)).await
}

async fn run<B: SessionBackend>(store: SessionStore<B>) -> Result<(), Box<dyn std::error::Error>> {
	// First request: no cookie yet
	let mut response = store.cookie_jar(&HeaderMap::new());
	let mut session = store.load(SESSION_NAME, &response).await?;
	if session.get::<Profile>("profile").is_none() {
		session.insert(
			"profile",
			Profile {
				user_id: "x".to_string(),
				name: "y".to_string(),
				age: 18,
			},
		)?;
	}
	let outcome = store.save(&mut session, &mut response).await?;
	tracing::info!(?outcome, id = %session.id(), "first request done");

	let mut response_headers = HeaderMap::new();
	response.write_headers(&mut response_headers)?;
	for value in response_headers.get_all(SET_COOKIE) {
		println!("Set-Cookie: {}", value.to_str()?);
	}

	// Second request: send the cookies back
	let cookies: Vec<String> = response
		.outgoing()
		.iter()
		.map(|c| format!("{}={}", c.name(), c.value()))
		.collect();
	let mut request_headers = HeaderMap::new();
	request_headers.insert(COOKIE, cookies.join("; ").parse()?);

	let mut response = store.cookie_jar(&request_headers);
	let mut session = store.load(SESSION_NAME, &response).await?;
	match session.get::<Profile>("profile") {
		Some(profile) => {
			println!("{}", profile.user_id);
			println!("{}", profile.name);
			println!("{}", profile.age);
		}
		None => println!("session not found"),
	}

	// Unchanged, so nothing is written and no cookie is set
	let outcome = store.save(&mut session, &mut response).await?;
	tracing::info!(?outcome, "second request done");

	Ok(())
}
