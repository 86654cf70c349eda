//! Random fixture data

use rand::distributions::{Alphanumeric, Distribution, Uniform};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Character class for generated strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrType {
    Alpha,
    Alphanumeric,
    Numeric,
    Latin1,
    Utf8,
    Html,
}

impl StrType {
    pub const ALL: [StrType; 6] = [
        StrType::Alpha,
        StrType::Alphanumeric,
        StrType::Numeric,
        StrType::Latin1,
        StrType::Utf8,
        StrType::Html,
    ];
}

const ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const HTML_TAGS: &[&str] = &["b", "i", "u", "em", "strong"];

/// Generate a random string of `len` characters using the thread RNG
pub fn gen_string(kind: StrType, len: usize) -> String {
    gen_string_with(&mut rand::thread_rng(), kind, len)
}

/// Generate a random string from an explicit RNG.
///
/// For `Html` the length applies to the text between the tags.
pub fn gen_string_with<R: Rng + ?Sized>(rng: &mut R, kind: StrType, len: usize) -> String {
    match kind {
        StrType::Alpha => (0..len)
            .map(|_| ALPHA[rng.gen_range(0..ALPHA.len())] as char)
            .collect(),
        StrType::Alphanumeric => (0..len).map(|_| Alphanumeric.sample(rng) as char).collect(),
        StrType::Numeric => (0..len)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect(),
        StrType::Latin1 => {
            let range = Uniform::new_inclusive(0xC0u32, 0xFFu32);
            (0..len)
                .map(|_| loop {
                    let code = range.sample(rng);
                    // multiplication and division signs are not letters
                    if code != 0xD7 && code != 0xF7 {
                        break char::from_u32(code).unwrap_or('a');
                    }
                })
                .collect()
        }
        StrType::Utf8 => {
            let range = Uniform::new_inclusive(0x4E00u32, 0x9FA5u32);
            (0..len)
                .map(|_| char::from_u32(range.sample(rng)).unwrap_or('a'))
                .collect()
        }
        StrType::Html => {
            let tag = HTML_TAGS.choose(rng).copied().unwrap_or("b");
            let text = gen_string_with(rng, StrType::Alpha, len);
            format!("<{tag}>{text}</{tag}>")
        }
    }
}

/// Shorthand for an alphabetic string
pub fn gen_alpha(len: usize) -> String {
    gen_string(StrType::Alpha, len)
}

/// A syntactically valid, random e-mail address
pub fn gen_email() -> String {
    format!(
        "{}@{}.example.com",
        gen_alpha(8).to_lowercase(),
        gen_alpha(6).to_lowercase()
    )
}

/// Names the server is expected to accept
pub fn valid_names() -> Vec<String> {
    StrType::ALL
        .iter()
        .map(|kind| gen_string(*kind, rand::thread_rng().gen_range(4..=30)))
        .collect()
}

/// Names the server is expected to reject
pub fn invalid_names() -> Vec<String> {
    vec![String::new(), " ".to_string(), "\t".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_case::test_case;

    #[test_case(StrType::Alpha ; "alpha")]
    #[test_case(StrType::Alphanumeric ; "alphanumeric")]
    #[test_case(StrType::Numeric ; "numeric")]
    #[test_case(StrType::Latin1 ; "latin1")]
    #[test_case(StrType::Utf8 ; "utf8")]
    fn test_length_in_chars(kind: StrType) {
        let value = gen_string(kind, 12);
        assert_eq!(value.chars().count(), 12);
    }

    #[test]
    fn test_character_classes() {
        assert!(gen_string(StrType::Alpha, 50).chars().all(|c| c.is_ascii_alphabetic()));
        assert!(gen_string(StrType::Numeric, 50).chars().all(|c| c.is_ascii_digit()));
        assert!(gen_string(StrType::Alphanumeric, 50)
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));
        assert!(gen_string(StrType::Latin1, 50).chars().all(|c| c.is_alphabetic()));
    }

    #[test]
    fn test_html_is_wrapped() {
        let value = gen_string(StrType::Html, 6);
        assert!(value.starts_with('<'));
        assert!(value.ends_with('>'));
        assert!(value.contains("</"));
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let a = gen_string_with(&mut StdRng::seed_from_u64(7), StrType::Alphanumeric, 16);
        let b = gen_string_with(&mut StdRng::seed_from_u64(7), StrType::Alphanumeric, 16);
        assert_eq!(a, b);
    }

    #[test]
    fn test_email_shape() {
        let email = gen_email();
        let (local, domain) = email.split_once('@').unwrap();
        assert!(!local.is_empty());
        assert!(domain.ends_with(".example.com"));
    }

    #[test]
    fn test_invalid_names_are_blank() {
        assert!(invalid_names().iter().all(|n| n.trim().is_empty()));
    }
}
