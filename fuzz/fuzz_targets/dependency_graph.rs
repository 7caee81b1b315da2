#![no_main]

use libfuzzer_sys::fuzz_target;
use roster_di::{Container, DiError, Implementation, RegisterOptions};
use std::sync::Arc;

// Each node takes three bytes: flags, dependency count, first dependency.
// Dependency indices may point past the registered nodes to produce
// unregistered names.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let count = (data[0] % 8) as usize + 1;
    let container = Container::new();

    for (i, node) in data[1..].chunks(3).take(count).enumerate() {
        let flags = node[0];
        let deps_len = node.get(1).copied().unwrap_or(0) % 4;
        let first = node.get(2).copied().unwrap_or(0) as usize;
        let deps: Vec<String> = (0..deps_len as usize)
            .map(|k| format!("n{}", (first + k) % (count + 2)))
            .collect();

        let implementation = if flags & 0b10 != 0 {
            Implementation::value(i)
        } else {
            Implementation::constructor(move |deps| Ok(deps.len()))
        };
        let options = RegisterOptions::new().singleton(flags & 0b01 != 0).depends_on(deps);
        container.register(format!("n{}", i), implementation, options).unwrap();
    }

    let valid = container.validate().is_valid();
    for i in 0..count + 2 {
        let name = format!("n{}", i);
        match container.resolve(&name) {
            Ok(first) => {
                let descriptor = container.descriptor(&name).unwrap();
                if descriptor.lifetime.is_singleton() {
                    let second = container.resolve(&name).unwrap();
                    assert!(Arc::ptr_eq(&first, &second));
                }
            }
            Err(DiError::NotRegistered(_)) | Err(DiError::Circular(_)) => {
                assert!(!valid || !container.has(&name));
            }
            Err(other) => panic!("unexpected error for {}: {}", name, other),
        }
    }
});
