//! Configuration loading tests.
//!
//! A single test keeps the credential-absence and credential-presence cases
//! sequential; the environment is process-global.

use assistant_service::config::AssistantConfig;

#[test]
fn credentials_are_required_at_startup() {
    std::env::set_var("ENVIRONMENT", "test");
    std::env::remove_var("OPENAI_API_KEY");
    std::env::set_var("ASSISTANT_ID", "asst-test");

    assert!(
        AssistantConfig::load().is_err(),
        "missing API credential must be a configuration error"
    );

    std::env::set_var("OPENAI_API_KEY", "test-api-key");
    std::env::remove_var("ASSISTANT_ID");

    assert!(
        AssistantConfig::load().is_err(),
        "missing assistant id must be a configuration error"
    );

    std::env::set_var("ASSISTANT_ID", "asst-test");

    let config = AssistantConfig::load().expect("both credentials set");
    assert_eq!(config.api.assistant_id, "asst-test");
    assert_eq!(config.run.poll_interval_ms, 1000);
    assert_eq!(config.run.timeout_secs, 120);
    assert_eq!(config.quota.max_sessions, None);
}
