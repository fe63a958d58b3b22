//! Short recipe links.
//!
//! Every recipe gets an 8 character token derived once from its identity and
//! content. The token is stored on the recipe row and resolved by the
//! `/s/{token}/` redirect.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
pub const SHORT_TOKEN_LENGTH: usize = 8;

/// Derive the short token for a recipe from its database id, name and text.
pub fn short_token(id: i64, name: &str, text: &str) -> String {
    let digest = Sha256::digest(format!("{id}-{name}-{text}").as_bytes());
    let mut token = hex::encode(digest);
    token.truncate(SHORT_TOKEN_LENGTH);
    token
}

pub fn short_url(base_url: &str, token: &str) -> String {
    format!("{}/s/{}/", base_url.trim_end_matches('/'), token)
}

/// Canonical page of a recipe in the web client.
pub fn recipe_page_url(base_url: &str, recipe_id: i64) -> String {
    format!("{}/recipes/{}/", base_url.trim_end_matches('/'), recipe_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_token_is_sha256_prefix() {
        // sha256("1-Soup-Hot") = c721073e91ac...
        assert_eq!(short_token(1, "Soup", "Hot"), "c721073e");
        // sha256("42-Borscht-Beetroot soup") = ea8b2368...
        assert_eq!(short_token(42, "Borscht", "Beetroot soup"), "ea8b2368");
    }

    #[test]
    fn test_short_token_length_and_charset() {
        let token = short_token(7, "Пельмени", "Лепить и варить");
        assert_eq!(token.len(), SHORT_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_short_token_depends_on_id() {
        assert_ne!(short_token(1, "Soup", "Hot"), short_token(2, "Soup", "Hot"));
    }

    #[test]
    fn test_urls() {
        assert_eq!(
            short_url("https://foodgram.example/", "c721073e"),
            "https://foodgram.example/s/c721073e/"
        );
        assert_eq!(
            recipe_page_url("https://foodgram.example", 12),
            "https://foodgram.example/recipes/12/"
        );
    }
}
