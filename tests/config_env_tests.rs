//! Environment overrides read from the real process environment
//!
//! Kept in its own test binary with a single test: the variable is process
//! global and must not leak into other tests.

use dein::{Callable, ClassWithoutConstructor, DeinConfig, DeinError, Registry};
use pretty_assertions::assert_eq;

fn plain_class() -> Callable {
    Callable::constructor(|_| Ok::<_, DeinError>(())).with_source("class Plain { run() {} }")
}

#[test]
fn load_reads_the_process_environment() {
    std::env::remove_var(DeinConfig::ENV_CLASS_WITHOUT_CONSTRUCTOR);
    assert_eq!(DeinConfig::load().unwrap(), DeinConfig::default());

    std::env::set_var(DeinConfig::ENV_CLASS_WITHOUT_CONSTRUCTOR, "zero-dependencies");
    let config = DeinConfig::load().unwrap();
    assert_eq!(
        config.class_without_constructor,
        ClassWithoutConstructor::ZeroDependencies
    );

    let registry = Registry::with_config(config).register("plain", plain_class()).unwrap();
    assert!(registry.required("plain").unwrap().is_empty());

    // env wins over the YAML document
    let overridden = DeinConfig::from_yaml_str("class_without_constructor: reject")
        .unwrap()
        .with_env()
        .unwrap();
    assert_eq!(
        overridden.class_without_constructor,
        ClassWithoutConstructor::ZeroDependencies
    );

    std::env::set_var(DeinConfig::ENV_CLASS_WITHOUT_CONSTRUCTOR, "sometimes");
    assert!(matches!(DeinConfig::load(), Err(DeinError::Config { .. })));

    std::env::remove_var(DeinConfig::ENV_CLASS_WITHOUT_CONSTRUCTOR);
}
