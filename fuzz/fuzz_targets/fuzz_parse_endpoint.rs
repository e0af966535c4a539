#![no_main]

use ldap_connect::config::Endpoint;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(url) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(endpoint) = Endpoint::parse(url) {
        assert!(!endpoint.host.is_empty());
        assert_ne!(endpoint.port, 0);
        let _ = endpoint.to_string();
    }

    if let Ok(endpoints) = Endpoint::parse_list(url) {
        assert!(!endpoints.is_empty());
        assert!(endpoints.len() <= url.split_whitespace().count());
    }
});
