//! Panicking API factories are reported through their error only
//!
//! Kept in its own test binary: it installs a process-wide panic hook.

use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};

use sigex_core::registry::ApiType;
use sigex_core::SigexError;

static HOOK_CALLS: AtomicUsize = AtomicUsize::new(0);

#[test]
fn test_panicking_factory_is_silent_and_hook_is_restored() {
    panic::set_hook(Box::new(|_| {
        HOOK_CALLS.fetch_add(1, Ordering::SeqCst);
    }));

    let api_type = ApiType {
        name: "acme",
        qualified_name: "acme::AcmeApi",
        factory: || panic!("no config file"),
    };
    let err = api_type.instantiate().unwrap_err();
    assert!(matches!(
        err,
        SigexError::Instantiation { ref api, ref message }
            if api == "acme::AcmeApi" && message == "no config file"
    ));
    assert_eq!(HOOK_CALLS.load(Ordering::SeqCst), 0);

    // the caller's hook is back in place afterwards
    let caught = panic::catch_unwind(|| panic!("after instantiation"));
    assert!(caught.is_err());
    assert_eq!(HOOK_CALLS.load(Ordering::SeqCst), 1);

    drop(panic::take_hook());
}
