//! URL slugs for new courses.

use crate::error::Result;
use coursecraft_db::CourseTx;

const MAX_SLUG_CHARS: usize = 80;
const FALLBACK_SLUG: &str = "untitled-course";

/// Lowercase ASCII words joined by single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_CHARS {
            break;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// A slug for `title` no existing course uses, suffixed `-2`, `-3`, ... on
/// collision.
pub async fn unique_slug(tx: &mut CourseTx, title: Option<&str>) -> Result<String> {
    let base = slugify(title.unwrap_or(""));
    if !tx.slug_exists(&base).await? {
        return Ok(base);
    }

    let mut n = 2u32;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !tx.slug_exists(&candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursecraft_db::{CourseDb, CourseDetails};
    use coursecraft_ids::{CourseId, InstructorId};

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Rust for Web Developers!"), "rust-for-web-developers");
        assert_eq!(slugify("  --C++ & Go--  "), "c-go");
        assert_eq!(slugify("Über Kurs"), "ber-kurs");
        assert_eq!(slugify("¿?"), FALLBACK_SLUG);
    }

    #[test]
    fn slugify_is_bounded() {
        let long = "word ".repeat(100);
        assert!(slugify(&long).len() <= MAX_SLUG_CHARS + 4);
    }

    #[tokio::test]
    async fn collisions_get_numeric_suffixes() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();
        let actor = InstructorId::parse("inst").unwrap();

        for expected in ["intro-to-sql", "intro-to-sql-2", "intro-to-sql-3"] {
            let slug = unique_slug(&mut tx, Some("Intro to SQL")).await.unwrap();
            assert_eq!(slug, expected);
            tx.insert_course(&CourseId::new(), &actor, &slug, &CourseDetails::default())
                .await
                .unwrap();
        }
    }
}
