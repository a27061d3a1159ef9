use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn complete_from_lookup() {
    let partial = PartialCredentials::from_lookup(lookup_from(&[
        (OPENAI_API_KEY_VAR, "sk-test"),
        (PINECONE_API_KEY_VAR, "pc-test"),
        (PINECONE_REGION_VAR, "us-west-2"),
        (SYSTEM_PROMPT_VAR, "Keep it short."),
    ]));

    let credentials = partial.complete().expect("all credentials present");

    assert_eq!(credentials.openai_api_key(), "sk-test");
    assert_eq!(credentials.pinecone_api_key(), "pc-test");
    assert_eq!(credentials.pinecone_region(), "us-west-2");
    assert_eq!(credentials.system_prompt(), "Keep it short.");
}

#[test]
fn region_falls_back_to_environment_var() {
    let partial = PartialCredentials::from_lookup(lookup_from(&[
        (OPENAI_API_KEY_VAR, "sk-test"),
        (PINECONE_API_KEY_VAR, "pc-test"),
        (PINECONE_ENVIRONMENT_VAR, "eu-west-1"),
    ]));

    let credentials = partial.complete().expect("all credentials present");

    assert_eq!(credentials.pinecone_region(), "eu-west-1");
    assert_eq!(credentials.system_prompt(), "");
}

#[test]
fn blank_values_count_as_missing() {
    let partial = PartialCredentials::from_lookup(lookup_from(&[
        (OPENAI_API_KEY_VAR, "   "),
        (PINECONE_API_KEY_VAR, "pc-test"),
        (PINECONE_REGION_VAR, "us-east-1"),
    ]));

    assert_eq!(
        partial.complete(),
        Err(CredentialsError::Missing(OPENAI_API_KEY_VAR))
    );
}

#[test]
fn missing_region_is_reported() {
    let partial = PartialCredentials::from_lookup(lookup_from(&[
        (OPENAI_API_KEY_VAR, "sk-test"),
        (PINECONE_API_KEY_VAR, "pc-test"),
    ]));

    assert_eq!(
        partial.complete(),
        Err(CredentialsError::Missing(PINECONE_REGION_VAR))
    );
}

#[test]
fn debug_output_redacts_keys() {
    let credentials = Credentials::new("sk-secret", "pc-secret", "us-east-1");
    let rendered = format!("{credentials:?}");

    assert!(!rendered.contains("sk-secret"));
    assert!(!rendered.contains("pc-secret"));
    assert!(rendered.contains("us-east-1"));

    let partial = PartialCredentials {
        openai_api_key: Some("sk-secret".to_string()),
        ..PartialCredentials::default()
    };
    assert!(!format!("{partial:?}").contains("sk-secret"));
}

#[test]
fn blank_system_prompt_is_dropped() {
    let credentials =
        Credentials::new("sk", "pc", "us-east-1").with_system_prompt(Some("  ".to_string()));

    assert_eq!(credentials.system_prompt(), "");
}
