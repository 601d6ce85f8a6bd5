//! Static per-language capability table.
//!
//! Replaces the per-language `switch` branches the reconciler and the scheduler
//! would otherwise need: each language is looked up once to learn its worker
//! image, whether it exposes a direct-HTTP entry point, and whether functions
//! of that language share one worker per project instead of one per function.

/// Default image used for a language that has no entry in the static table.
/// Mirrors the original image-naming fallback: `registry/runtime-<lang>:latest`.
const UNKNOWN_IMAGE_TEMPLATE: &str = "runtime-{lang}:latest";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capability {
    pub image: &'static str,
    pub supports_direct_http: bool,
    pub is_shared_worker: bool,
    pub port: u16,
}

const DIRECT_HTTP_PORT: u16 = 8080;

/// Static language -> capability table.
///
/// Compiled languages (`go`, `rust`) get one worker per function. Interpreted
/// languages are shared per `(project, language)` unless noted otherwise.
const TABLE: &[(&str, Capability)] = &[
    (
        "go",
        Capability {
            image: "litefunctions/runtime-go:latest",
            supports_direct_http: true,
            is_shared_worker: false,
            port: DIRECT_HTTP_PORT,
        },
    ),
    (
        "rust",
        Capability {
            image: "litefunctions/runtime-rust:latest",
            supports_direct_http: true,
            is_shared_worker: false,
            port: DIRECT_HTTP_PORT,
        },
    ),
    (
        "python",
        Capability {
            image: "litefunctions/runtime-python:latest",
            supports_direct_http: true,
            is_shared_worker: true,
            port: DIRECT_HTTP_PORT,
        },
    ),
    (
        "js",
        Capability {
            image: "litefunctions/runtime-js:latest",
            supports_direct_http: false,
            is_shared_worker: true,
            port: DIRECT_HTTP_PORT,
        },
    ),
    (
        "lua",
        Capability {
            image: "litefunctions/runtime-lua:latest",
            supports_direct_http: false,
            is_shared_worker: true,
            port: DIRECT_HTTP_PORT,
        },
    ),
];

/// Looks up the capability entry for `language`, falling back to a templated
/// registry image for unknown languages (treated as compiled/non-shared/broker-only).
pub fn capability_for(language: &str) -> Capability {
    for (lang, cap) in TABLE {
        if *lang == language {
            return *cap;
        }
    }
    Capability {
        // leaked once per unknown language; the set of languages seen by a process is small and finite
        image: Box::leak(
            UNKNOWN_IMAGE_TEMPLATE
                .replace("{lang}", language)
                .into_boxed_str(),
        ),
        supports_direct_http: false,
        is_shared_worker: false,
        port: DIRECT_HTTP_PORT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiled_languages_are_not_shared() {
        assert!(!capability_for("go").is_shared_worker);
        assert!(!capability_for("rust").is_shared_worker);
    }

    #[test]
    fn dynamic_languages_are_shared() {
        assert!(capability_for("python").is_shared_worker);
        assert!(capability_for("js").is_shared_worker);
        assert!(capability_for("lua").is_shared_worker);
    }

    #[test]
    fn only_some_dynamic_languages_support_direct_http() {
        assert!(capability_for("python").supports_direct_http);
        assert!(!capability_for("js").supports_direct_http);
        assert!(!capability_for("lua").supports_direct_http);
    }

    #[test]
    fn unknown_language_falls_back() {
        let cap = capability_for("cobol");
        assert!(!cap.is_shared_worker);
        assert!(!cap.supports_direct_http);
        assert_eq!(cap.image, "runtime-cobol:latest");
    }
}
