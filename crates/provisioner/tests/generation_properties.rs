use proptest::prelude::*;
use seedvault_core::{CharacterPolicy, Namespace, SecretName, SecretOrigin, SecretRequest, SymbolSet};
use seedvault_provisioner::{CredentialGenerator, OsRngGenerator, SecretProvisioner};
use seedvault_store::MemorySecretStore;
use std::sync::Arc;

fn policy_strategy() -> impl Strategy<Value = CharacterPolicy> {
    prop_oneof![
        Just(CharacterPolicy::AlphanumericOnly),
        Just(CharacterPolicy::with_default_symbols()),
        "[!#%&*+=?@^~-]{1,6}".prop_map(|symbols| CharacterPolicy::AlphanumericPlusSymbols {
            symbols: SymbolSet::new(symbols).unwrap(),
        }),
    ]
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,30}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_generated_values_respect_length_and_policy(
        length in 1usize..=256,
        policy in policy_strategy(),
    ) {
        let value = OsRngGenerator.generate(length, &policy).unwrap();

        prop_assert_eq!(value.char_count(), length);
        prop_assert!(value.expose().chars().all(|c| policy.allows(c)));
    }

    #[test]
    fn test_resolution_is_idempotent(
        name in name_strategy(),
        length in 1usize..=64,
        policy in policy_strategy(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let store = Arc::new(MemorySecretStore::new());
            let namespace = Namespace::new("prod").unwrap();
            let request = SecretRequest::new(SecretName::new(name.clone()).unwrap(), length, policy.clone()).unwrap();

            let first = SecretProvisioner::new(namespace.clone(), store.clone())
                .resolve(&request)
                .await
                .unwrap();
            let second = SecretProvisioner::new(namespace, store.clone())
                .resolve(&request)
                .await
                .unwrap();

            assert_eq!(first.storage_key.as_str(), format!("{name}-prod"));
            assert_eq!(first.origin, SecretOrigin::Created);
            assert_eq!(second.origin, SecretOrigin::Existing);
            assert_eq!(first.value, second.value);
            assert_eq!(first.value.char_count(), length);
            assert!(first.value.expose().chars().all(|c| policy.allows(c)));
            assert_eq!(store.len(), 1);
        });
    }
}

#[test]
fn test_symbol_characters_eventually_appear() {
    // With 500 draws over an alphabet of 82, missing every symbol is
    // vanishingly unlikely
    let policy = CharacterPolicy::with_default_symbols();
    let value = OsRngGenerator.generate(500, &policy).unwrap();
    assert!(value.expose().chars().any(|c| !c.is_ascii_alphanumeric()));
}
