#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use oauth2_login::{
	_preludet::*,
	flows::{AuthResult, CallbackParams, FailureKind},
	provider::{ProviderConfig, ProviderId},
	store::{AttemptMetadata, generate_state_token},
};

const CLIENT_ID: &str = "client-cb";
const CLIENT_SECRET: &str = "secret-cb";

fn build_config(server: &MockServer) -> ProviderConfig {
	let provider_id = ProviderId::new("mock-http")
		.expect("Provider identifier should be valid for callback test.");

	ProviderConfig::builder(provider_id)
		.authorization_endpoint(
			Url::parse(&server.url("/authorize"))
				.expect("Mock authorization endpoint should parse successfully."),
		)
		.token_endpoint(
			Url::parse(&server.url("/token"))
				.expect("Mock token endpoint should parse successfully."),
		)
		.user_info_endpoint(
			Url::parse(&server.url("/user"))
				.expect("Mock user-info endpoint should parse successfully."),
		)
		.client_id(CLIENT_ID)
		.client_secret(CLIENT_SECRET)
		.redirect_uri(
			Url::parse("https://app.example.com/callback")
				.expect("Redirect URI should parse successfully."),
		)
		.map_required_claim("name", "Name")
		.build()
		.expect("Provider configuration should build successfully.")
}

fn failure_kind(result: AuthResult) -> FailureKind {
	result.failure().expect("Callback should have failed.").kind
}

#[tokio::test]
async fn provider_errors_short_circuit_before_any_exchange() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let (flow, store) = build_reqwest_test_flow(config);
	let request =
		flow.begin_login(AttemptMetadata::new()).await.expect("begin_login should succeed.");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let params = CallbackParams::from_query_pairs([
		("state", request.state.clone()),
		("error", "access_denied".to_owned()),
		("error_description", "The user cancelled the request.".to_owned()),
	]);
	let failure =
		flow.handle_callback(params).await.failure().expect("Callback should have failed.");

	assert_eq!(failure.kind, FailureKind::ProviderDenied);
	assert_eq!(
		failure.detail.as_deref(),
		Some("access_denied: The user cancelled the request."),
	);
	assert_eq!(token_mock.hits_async().await, 0, "No token exchange may be attempted.");
	assert_eq!(store.len(), 1, "A denied callback never touches the state store.");
}

#[tokio::test]
async fn unknown_states_are_rejected() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let (flow, _store) = build_reqwest_test_flow(config);
	let params = CallbackParams::from_query_pairs([
		("code", "valid-code".to_owned()),
		("state", generate_state_token()),
	]);

	assert_eq!(failure_kind(flow.handle_callback(params).await), FailureKind::InvalidOrReplayedState);
}

#[tokio::test]
async fn missing_states_are_rejected() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let (flow, _store) = build_reqwest_test_flow(config);
	let params = CallbackParams::from_query_pairs([("code", "valid-code")]);

	assert_eq!(failure_kind(flow.handle_callback(params).await), FailureKind::InvalidOrReplayedState);
}

#[tokio::test]
async fn replayed_callbacks_fail_after_the_first_succeeds() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let (flow, _store) = build_reqwest_test_flow(config);
	let request =
		flow.begin_login(AttemptMetadata::new()).await.expect("begin_login should succeed.");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-once\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/user");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"name\":\"John Smith\"}");
		})
		.await;

	let params = CallbackParams::from_query_pairs([
		("code", "valid-code".to_owned()),
		("state", request.state.clone()),
	]);

	assert!(
		flow.handle_callback(params.clone()).await.is_success(),
		"The first callback must succeed.",
	);
	assert_eq!(
		failure_kind(flow.handle_callback(params).await),
		FailureKind::InvalidOrReplayedState,
		"Replaying the consumed state token must fail.",
	);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_callbacks_replaying_one_state_have_a_single_winner() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let (flow, _store) = build_reqwest_test_flow(config);
	let request =
		flow.begin_login(AttemptMetadata::new()).await.expect("begin_login should succeed.");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-race\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/user");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"name\":\"John Smith\"}");
		})
		.await;

	let params = CallbackParams::from_query_pairs([
		("code", "valid-code".to_owned()),
		("state", request.state.clone()),
	]);
	let (first, second) =
		tokio::join!(flow.handle_callback(params.clone()), flow.handle_callback(params));
	let results = [first, second];

	assert_eq!(
		results.iter().filter(|result| result.is_success()).count(),
		1,
		"Exactly one concurrent callback may win the state token.",
	);

	let failure = results
		.into_iter()
		.find_map(AuthResult::failure)
		.expect("The losing callback must report a failure.");

	assert_eq!(failure.kind, FailureKind::InvalidOrReplayedState);
}

#[tokio::test]
async fn missing_codes_fail_without_reaching_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let (flow, _store) = build_reqwest_test_flow(config);
	let request =
		flow.begin_login(AttemptMetadata::new()).await.expect("begin_login should succeed.");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let params = CallbackParams::from_query_pairs([("state", request.state.clone())]);
	let failure =
		flow.handle_callback(params).await.failure().expect("Callback should have failed.");

	assert_eq!(failure.kind, FailureKind::TokenExchangeFailed);
	assert_eq!(failure.detail.as_deref(), Some("Callback did not include an authorization code."));
	assert_eq!(token_mock.hits_async().await, 0);
}

#[tokio::test]
async fn token_responses_missing_the_access_token_are_malformed() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let (flow, _store) = build_reqwest_test_flow(config);
	let request =
		flow.begin_login(AttemptMetadata::new()).await.expect("begin_login should succeed.");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;
	let params = CallbackParams::from_query_pairs([
		("code", "valid-code".to_owned()),
		("state", request.state.clone()),
	]);

	assert_eq!(
		failure_kind(flow.handle_callback(params).await),
		FailureKind::MalformedTokenResponse,
	);

	token_mock.assert_async().await;
}

#[tokio::test]
async fn token_endpoint_errors_surface_the_oauth_detail() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let (flow, _store) = build_reqwest_test_flow(config);
	let request =
		flow.begin_login(AttemptMetadata::new()).await.expect("begin_login should succeed.");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"already used\"}");
		})
		.await;

	let params = CallbackParams::from_query_pairs([
		("code", "stale-code".to_owned()),
		("state", request.state.clone()),
	]);
	let failure =
		flow.handle_callback(params).await.failure().expect("Callback should have failed.");

	assert_eq!(failure.kind, FailureKind::TokenExchangeFailed);
	assert!(
		failure.detail.as_deref().is_some_and(|detail| detail.contains("invalid_grant")),
		"The provider's OAuth error must reach the host: {:?}",
		failure.detail,
	);
	assert!(failure.tokens.is_none());
}

#[tokio::test]
async fn profile_failures_hand_back_the_issued_tokens_for_retry() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let (flow, _store) = build_reqwest_test_flow(config);
	let request =
		flow.begin_login(AttemptMetadata::new()).await.expect("begin_login should succeed.");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-retry\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;

	let user_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/user");
			then.status(500).body("upstream exploded");
		})
		.await;
	let params = CallbackParams::from_query_pairs([
		("code", "valid-code".to_owned()),
		("state", request.state.clone()),
	]);
	let failure =
		flow.handle_callback(params).await.failure().expect("Callback should have failed.");

	assert_eq!(failure.kind, FailureKind::ProfileFetchFailed);

	let tokens = failure.tokens.expect("Profile-stage failures must return the issued tokens.");

	assert_eq!(tokens.access_token.expose(), "access-retry");

	// The host's safe retry point: fetch the profile again with the same token.
	user_mock.delete_async().await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/user").header("authorization", "Bearer access-retry");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"name\":\"John Smith\"}");
		})
		.await;

	let claims = flow
		.fetch_profile(tokens.access_token.expose())
		.await
		.expect("Retrying the profile fetch should succeed.");

	assert_eq!(claims.get("Name"), Some("John Smith"));
}

#[tokio::test]
async fn invalid_profile_bodies_map_to_parse_errors() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let (flow, _store) = build_reqwest_test_flow(config);
	let request =
		flow.begin_login(AttemptMetadata::new()).await.expect("begin_login should succeed.");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-bad-json\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/user");
			then.status(200).header("content-type", "text/html").body("<html>not json</html>");
		})
		.await;

	let params = CallbackParams::from_query_pairs([
		("code", "valid-code".to_owned()),
		("state", request.state.clone()),
	]);

	assert_eq!(failure_kind(flow.handle_callback(params).await), FailureKind::ProfileParseError);
}

#[tokio::test]
async fn missing_required_claims_map_to_parse_errors() {
	let server = MockServer::start_async().await;
	let config = build_config(&server);
	let (flow, _store) = build_reqwest_test_flow(config);
	let request =
		flow.begin_login(AttemptMetadata::new()).await.expect("begin_login should succeed.");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-no-name\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/user");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"email\":\"john@john-smith.local\"}");
		})
		.await;

	let params = CallbackParams::from_query_pairs([
		("code", "valid-code".to_owned()),
		("state", request.state.clone()),
	]);
	let failure =
		flow.handle_callback(params).await.failure().expect("Callback should have failed.");

	assert_eq!(failure.kind, FailureKind::ProfileParseError);
	assert!(
		failure.detail.as_deref().is_some_and(|detail| detail.contains("Name")),
		"The missing claim must be named in the detail: {:?}",
		failure.detail,
	);
}
