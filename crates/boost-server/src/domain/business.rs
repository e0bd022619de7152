use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub address: Option<String>,
    pub google_review_url: String,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the NFC review page needs to render, without billing references.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicBusiness {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub address: Option<String>,
    pub google_review_url: String,
}

impl From<Business> for PublicBusiness {
    fn from(b: Business) -> Self {
        Self {
            id: b.id,
            name: b.name,
            slug: b.slug,
            logo_url: b.logo_url,
            address: b.address,
            google_review_url: b.google_review_url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub user_id: Option<Uuid>,
    pub business_name: Option<String>,
    pub address: Option<String>,
    pub google_review_url: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub success: bool,
    pub business_id: Uuid,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusinessRequest {
    pub name: String,
    pub slug: Option<String>,
    pub logo_url: Option<String>,
    pub google_review_url: String,
    pub address: Option<String>,
}

/// Lowercases `name` and collapses every run of characters outside `[a-z0-9]`
/// into a single hyphen, trimming hyphens at both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Disambiguates a taken slug with the current time in base 36.
pub fn slug_with_suffix(slug: &str, now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    format!("{}-{}", slug, to_base36(millis))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".into();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_slugify_strips_non_ascii() {
        assert_eq!(slugify("Café Rot"), "caf-rot");
    }

    #[test]
    fn test_slugify_trims_and_collapses_hyphens() {
        assert_eq!(slugify("  --Pizza & Pasta!! "), "pizza-pasta");
        assert_eq!(slugify("Bäckerei Müller 24"), "b-ckerei-m-ller-24");
        assert_eq!(slugify("ABC"), "abc");
    }

    #[test]
    fn test_slugify_output_alphabet() {
        for name in ["Zur goldenen Gans", "Döner 🥙 Haus", "a--b", "-x-"] {
            let slug = slugify(name);
            assert!(!slug.starts_with('-') && !slug.ends_with('-'), "{slug}");
            assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            assert!(!slug.contains("--"), "{slug}");
        }
    }

    #[test]
    fn test_slugify_empty_for_symbols_only() {
        assert_eq!(slugify("☕☕"), "");
    }

    #[test]
    fn test_slug_suffix_is_base36_millis() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        assert_eq!(slug_with_suffix("caf-rot", now), "caf-rot-loyw3v28");
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
