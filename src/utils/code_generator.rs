//! Short code generation.
//!
//! Codes are 6 characters over the 62-symbol alphanumeric alphabet, giving
//! about 5.7 * 10^10 possible codes. They double as unguessable tokens for
//! unlisted links, so they come from the thread-local CSPRNG (`rand::rng()`,
//! ChaCha12 reseeded from the OS) and never from a counter or a hash.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of a generated short code.
pub const CODE_LENGTH: usize = 6;

/// Root path segments served by fixed routes. A code equal to one of these
/// would be shadowed by the route and never redirect.
pub const RESERVED_CODES: &[&str] = &["health"];

/// Returns true if `code` collides with a fixed route.
pub fn is_reserved(code: &str) -> bool {
    RESERVED_CODES.contains(&code)
}

/// Generates a random short code of [`CODE_LENGTH`] alphanumeric characters.
///
/// Never returns one of [`RESERVED_CODES`].
pub fn generate_code() -> String {
    first_unreserved(random_code)
}

fn random_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_LENGTH)
        .map(char::from)
        .collect()
}

fn first_unreserved(mut draw: impl FnMut() -> String) -> String {
    loop {
        let code = draw();
        if !is_reserved(&code) {
            return code;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_code_has_correct_length() {
        assert_eq!(generate_code().len(), CODE_LENGTH);
    }

    #[test]
    fn test_generate_code_alphanumeric_only() {
        for _ in 0..100 {
            let code = generate_code();
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()), "{code}");
        }
    }

    #[test]
    fn test_reserved_route_segments() {
        assert!(is_reserved("health"));
        assert!(!is_reserved("Health"));
        assert!(!is_reserved("aB3xY9"));
    }

    #[test]
    fn test_reserved_draw_is_redrawn() {
        let mut draws = vec!["aB3xY9", "health", "health"];
        let mut calls = 0;

        let code = first_unreserved(|| {
            calls += 1;
            draws.pop().unwrap_or_default().to_string()
        });

        assert_eq!(code, "aB3xY9");
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_reserved_codes_fit_the_code_shape() {
        // Only segments a generator could actually produce need reserving.
        for code in RESERVED_CODES {
            assert_eq!(code.len(), CODE_LENGTH, "{code}");
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()), "{code}");
        }
    }

    #[test]
    fn test_generate_code_produces_distinct_codes() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_code()).collect();
        // 1000 draws from ~5.7e10 codes: a collision here means the RNG is broken.
        assert_eq!(codes.len(), 1000);
    }
}
