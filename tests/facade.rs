//! Facade re-exports drive a full request cycle

use http::HeaderMap;
use http::header::{COOKIE, SET_COOKIE};
use serde_json::json;
use session_redis::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn test_prelude_round_trip_through_headers() {
	// Arrange
	let store = SessionStore::new(
		InMemoryBackend::new(),
		StoreOptions::new()
			.with_keys(["keyxxx"])
			.with_expiration(Duration::from_secs(3600)),
	);
	let mut response = store.cookie_jar(&HeaderMap::new());
	let mut session = store.load("Sess", &response).await.unwrap();
	session.insert_value("cart", json!({"items": [1, 2, 3], "total": 59.99}));
	store.save(&mut session, &mut response).await.unwrap();

	let mut response_headers = HeaderMap::new();
	response.write_headers(&mut response_headers).unwrap();

	// Act
	let mut request_headers = HeaderMap::new();
	for value in response_headers.get_all(SET_COOKIE) {
		let pair = value.to_str().unwrap().split(';').next().unwrap().to_string();
		request_headers.append(COOKIE, pair.parse().unwrap());
	}
	let loaded = store
		.load("Sess", &store.cookie_jar(&request_headers))
		.await
		.unwrap();

	// Assert
	assert_eq!(response_headers.get_all(SET_COOKIE).iter().count(), 2);
	assert!(!loaded.is_fresh());
	assert_eq!(
		loaded.get_value("cart"),
		Some(&json!({"items": [1, 2, 3], "total": 59.99}))
	);
}

#[tokio::test]
async fn test_store_is_shared_across_tasks() {
	// Arrange
	let store = SessionStore::new(InMemoryBackend::new(), StoreOptions::default());
	let mut jar = CookieJar::new();
	let mut session = store.load("Sess", &jar).await.unwrap();
	session.insert("count", 1).unwrap();
	store.save(&mut session, &mut jar).await.unwrap();
	let id = session.id().to_string();

	// Act
	let worker = store.clone();
	let loaded = tokio::spawn(async move {
		let mut request = CookieJar::new();
		request.insert_request_cookie("Sess", id);
		worker.load("Sess", &request).await.unwrap()
	})
	.await
	.unwrap();

	// Assert
	assert_eq!(loaded.get::<i64>("count"), Some(1));
}
