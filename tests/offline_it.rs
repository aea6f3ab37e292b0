#![cfg(feature = "reqwest")]

mod common;

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use common::*;
use resilient_api::{
	client::SyncReport,
	error::AuthError,
	mirror::PENDING_QUEUE_KEY,
	request::{Method, MultipartPart, RequestKey, RequestOptions},
	response::{ApiOutcome, DataSource, PENDING_MESSAGE},
	store::KeyValueStore,
};

#[tokio::test]
async fn reads_fall_back_to_the_last_snapshot() -> Result<()> {
	let server = MockServer::start_async().await;
	let Harness { client, .. } = signed_in_harness(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/resorts");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"success":true,"data":[{"name":"Laax"}]}"#);
		})
		.await;

	client.get::<serde_json::Value>("/resorts").await?;
	client.cache.clear();
	client.http_client.set_offline(true);

	let outcome = client.get::<serde_json::Value>("/resorts").await?;

	assert!(outcome.is_offline());
	assert_eq!(outcome.into_data(), Some(serde_json::json!([{ "name": "Laax" }])));

	mock.assert_calls_async(1).await;

	Ok(())
}

#[tokio::test]
async fn reads_without_snapshot_surface_the_network_error() {
	let server = MockServer::start_async().await;
	let Harness { client, .. } = signed_in_harness(&server).await;

	client.http_client.set_offline(true);

	let err = client
		.get::<serde_json::Value>("/resorts")
		.await
		.expect_err("Offline reads without a snapshot should fail.");

	assert!(err.is_network());
	assert_eq!(client.mirror.queued_len().await, 0);
}

#[tokio::test]
async fn offline_mutations_are_queued_in_order() -> Result<()> {
	let server = MockServer::start_async().await;
	let Harness { client, offline_store, .. } = signed_in_harness(&server).await;

	client.http_client.set_offline(true);

	let first = client
		.post::<serde_json::Value, _>("/trips", &serde_json::json!({ "name": "Verbier" }))
		.await?;
	let second = client
		.post_multipart::<serde_json::Value>(
			"/challenges/3/proof",
			vec![
				MultipartPart::text("note", "summit"),
				MultipartPart::file("photo", "proof.jpg", "image/jpeg", vec![0xFF, 0xD8]),
			],
			RequestOptions::no_cache(),
		)
		.await?;
	let ApiOutcome::Pending { request_id: first_id, message } = first else {
		panic!("Offline JSON mutations should be reported as pending.");
	};
	let ApiOutcome::Pending { request_id: second_id, .. } = second else {
		panic!("Offline multipart uploads should be reported as pending.");
	};

	assert_eq!(message, PENDING_MESSAGE);
	assert_ne!(first_id, second_id);

	let queued = client.mirror.list_queued().await;

	assert_eq!(queued.len(), 2);
	assert_eq!(queued[0].id, first_id);
	assert_eq!(queued[0].key(), RequestKey::new(Method::Post, "/trips"));
	assert_eq!(queued[1].id, second_id);
	assert!(queued[1].body.as_ref().is_some_and(|body| body.is_multipart()));
	assert!(offline_store.get(PENDING_QUEUE_KEY).await?.is_some());

	Ok(())
}

#[tokio::test]
async fn sync_replays_queue_and_drops_rejected_entries() -> Result<()> {
	let server = MockServer::start_async().await;
	let Harness { client, offline_store, .. } = signed_in_harness(&server).await;
	let trips = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/trips");
			then.status(200).header("content-type", "application/json").body("[]");
		})
		.await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/trips")
				.json_body(serde_json::json!({ "name": "Verbier" }));
			then.status(201)
				.header("content-type", "application/json")
				.body(r#"{"success":true,"data":{"id":9}}"#);
		})
		.await;
	let join = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/trips/7/join");
			then.status(409)
				.header("content-type", "application/json")
				.body(r#"{"success":false,"message":"Trip is full"}"#);
		})
		.await;

	client.get::<serde_json::Value>("/trips").await?;
	client.http_client.set_offline(true);
	client
		.post_with::<serde_json::Value, _>(
			"/trips",
			&serde_json::json!({ "name": "Verbier" }),
			RequestOptions::no_cache().invalidate("/trips"),
		)
		.await?;
	client.post::<serde_json::Value, _>("/trips/7/join", &serde_json::json!({})).await?;

	assert_eq!(client.mirror.queued_len().await, 2);

	// An app restart keeps the queue.
	let Harness { client, .. } = build_harness_with_store(&server, offline_store);

	client.sign_in(ACCESS, REFRESH).await?;

	let report = client.sync().await;

	assert_eq!(report.succeeded, 1);
	assert_eq!(report.failed, 1);
	assert_eq!(report.errors.len(), 1);
	assert_eq!(report.errors[0].path, "/trips/7/join");
	assert_eq!(report.errors[0].method, Method::Post);
	assert_eq!(report.errors[0].message, "Trip is full");
	assert_eq!(
		report.summary().as_deref(),
		Some("1 offline action(s) synced, 1 could not be sent.")
	);
	assert_eq!(client.mirror.queued_len().await, 0);

	create.assert_calls_async(1).await;
	join.assert_calls_async(1).await;
	trips.assert_calls_async(1).await;

	Ok(())
}

#[tokio::test]
async fn replayed_mutations_invalidate_cached_reads() -> Result<()> {
	let server = MockServer::start_async().await;
	let Harness { client, .. } = signed_in_harness(&server).await;
	let trips = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/trips");
			then.status(200).header("content-type", "application/json").body("[]");
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/trips/9");
			then.status(204);
		})
		.await;

	client.get::<serde_json::Value>("/trips").await?;
	client.http_client.set_offline(true);

	let outcome = client
		.execute(Method::Delete, "/trips/9", None, RequestOptions::no_cache().invalidate("/trips"))
		.await?;

	assert!(outcome.is_pending());
	assert!(client.cache.get(RequestKey::new(Method::Get, "/trips").as_str()).is_some());

	client.http_client.set_offline(false);

	let report = client.sync().await;

	assert_eq!(report.succeeded, 1);
	assert!(client.cache.is_empty());

	let refreshed = client.get::<serde_json::Value>("/trips").await?;

	assert_eq!(refreshed.source(), Some(DataSource::Network));

	trips.assert_calls_async(2).await;

	Ok(())
}

#[tokio::test]
async fn sync_keeps_entries_while_still_offline() -> Result<()> {
	let server = MockServer::start_async().await;
	let Harness { client, .. } = signed_in_harness(&server).await;

	client.http_client.set_offline(true);
	client.post::<serde_json::Value, _>("/trips", &serde_json::json!({ "name": "Laax" })).await?;

	let report = client.sync().await;

	assert!(report.is_empty());
	assert_eq!(report.summary(), None);
	assert_eq!(client.mirror.queued_len().await, 1);

	Ok(())
}

#[tokio::test]
async fn empty_queue_sync_issues_no_requests() {
	let server = MockServer::start_async().await;
	let Harness { client, .. } = signed_in_harness(&server).await;
	let any = server
		.mock_async(|_, then| {
			then.status(200);
		})
		.await;
	let report = client.sync().await;

	assert_eq!(report, SyncReport::default());

	any.assert_calls_async(0).await;
}

#[tokio::test]
async fn concurrent_syncs_replay_each_entry_once() -> Result<()> {
	let server = MockServer::start_async().await;
	let Harness { client, .. } = signed_in_harness(&server).await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/trips");
			then.status(201).header("content-type", "application/json").body("{}");
		})
		.await;

	client.http_client.set_offline(true);

	for name in ["Laax", "Verbier", "Zermatt"] {
		client.post::<serde_json::Value, _>("/trips", &serde_json::json!({ "name": name })).await?;
	}

	client.http_client.set_offline(false);

	let (left, right) = tokio::join!(client.sync(), client.sync());

	assert_eq!(left.succeeded + right.succeeded, 3);
	assert_eq!(client.mirror.queued_len().await, 0);

	create.assert_calls_async(3).await;

	Ok(())
}

#[tokio::test]
async fn sync_pauses_while_the_credential_store_is_unavailable() -> Result<()> {
	let server = MockServer::start_async().await;
	let Harness { client, credential_store, .. } = signed_in_harness(&server).await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/trips");
			then.status(201).header("content-type", "application/json").body("{}");
		})
		.await;

	client.http_client.set_offline(true);
	client.post::<serde_json::Value, _>("/trips", &serde_json::json!({ "name": "Laax" })).await?;
	client.http_client.set_offline(false);
	credential_store.set_failing(true);

	let report = client.sync().await;

	assert!(report.is_empty());
	assert_eq!(client.mirror.queued_len().await, 1);

	create.assert_calls_async(0).await;
	credential_store.set_failing(false);

	let report = client.sync().await;

	assert_eq!(report.succeeded, 1);
	assert_eq!(client.mirror.queued_len().await, 0);

	create.assert_calls_async(1).await;

	Ok(())
}

#[tokio::test]
async fn unreachable_entry_holds_back_everything_queued_after_it() -> Result<()> {
	let server = MockServer::start_async().await;
	let Harness { client, .. } = signed_in_harness(&server).await;
	let first = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/first");
			then.status(201).header("content-type", "application/json").body("{}");
		})
		.await;
	let second = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/second");
			then.status(201).header("content-type", "application/json").body("{}");
		})
		.await;

	client.http_client.set_offline(true);
	client.post::<serde_json::Value, _>("/first", &serde_json::json!({})).await?;
	client.post::<serde_json::Value, _>("/second", &serde_json::json!({})).await?;
	client.http_client.set_offline(false);
	client.http_client.set_unreachable_path(Some("/api/first"));

	let report = client.sync().await;
	let queued = client.mirror.list_queued().await;

	assert!(report.is_empty());
	assert_eq!(queued.iter().map(|r| r.path.as_str()).collect::<Vec<_>>(), ["/first", "/second"]);

	first.assert_calls_async(0).await;
	second.assert_calls_async(0).await;
	client.http_client.set_unreachable_path(None);

	let report = client.sync().await;

	assert_eq!(report.succeeded, 2);
	assert_eq!(client.mirror.queued_len().await, 0);

	first.assert_calls_async(1).await;
	second.assert_calls_async(1).await;

	Ok(())
}

#[tokio::test]
async fn expired_session_during_replay_drops_the_entry() -> Result<()> {
	let server = MockServer::start_async().await;
	let Harness { client, .. } = signed_in_harness(&server).await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/trips");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"success":false,"message":"jwt expired"}"#);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"success":false,"message":"jwt expired"}"#);
		})
		.await;

	client.http_client.set_offline(true);
	client.post::<serde_json::Value, _>("/trips", &serde_json::json!({ "name": "Laax" })).await?;
	client.http_client.set_offline(false);

	let report = client.sync().await;

	assert_eq!(report.succeeded, 0);
	assert_eq!(report.failed, 1);
	assert_eq!(report.errors[0].auth, Some(AuthError::JwtExpired));
	assert_eq!(report.errors[0].auth.map(|auth| auth.code()), Some("JWT_EXPIRED"));
	assert_eq!(client.mirror.queued_len().await, 0);

	let credentials =
		client.credentials.load().await.expect("Credential store should be readable.");

	assert!(credentials.access_token.is_none());
	assert!(credentials.refresh_token.is_none());

	create.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	Ok(())
}
