use pdw_core::errors::ErrorKind;
use pdw_core::traits::IOwnershipRegistry;
use pdw_registry::ChainRegistryClient;

#[test]
fn unreachable_registry_surfaces_unavailable_not_a_panic() {
    let client = ChainRegistryClient::new("http://127.0.0.1:1");
    let err = client.get_memory("m1").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unavailable);
}

#[test]
fn builders_never_touch_the_network() {
    let client = ChainRegistryClient::new("http://127.0.0.1:1");
    let tx = client.build_delete_memory("m1").unwrap();
    assert!(!tx.0.is_empty());
}
