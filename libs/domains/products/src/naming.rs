//! Default names for new products: a localized label plus a letter suffix,
//! `Product A`, `Product B`, ..., `Product Z`, `Product AA`, ...

/// Locales with a translated label, by language subtag.
const LABELS: &[(&str, &str)] = &[
    ("en", "Product"),
    ("fr", "Produit"),
    ("de", "Produkt"),
    ("es", "Producto"),
    ("it", "Prodotto"),
    ("pt", "Produto"),
];

const FALLBACK_LABEL: &str = "Product";

fn lookup(locale: &str) -> Option<&'static str> {
    let normalized = locale.trim().to_ascii_lowercase().replace('_', "-");
    let language = normalized.split('-').next().unwrap_or_default();

    LABELS
        .iter()
        .find(|(tag, _)| *tag == normalized || *tag == language)
        .map(|(_, label)| *label)
}

/// The label for `locale`, falling back to `default_locale`, then English.
///
/// Region tags (`fr-CA`, `pt_BR`) resolve to their language.
pub fn base_label(locale: &str, default_locale: &str) -> &'static str {
    lookup(locale)
        .or_else(|| lookup(default_locale))
        .unwrap_or(FALLBACK_LABEL)
}

/// Bijective base-26 letters: 0 → `A`, 25 → `Z`, 26 → `AA`, 27 → `AB`.
pub fn suffix(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// The `index`th candidate name for `base`.
pub fn candidate(base: &str, index: usize) -> String {
    format!("{} {}", base, suffix(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(base_label("en", "en"), "Product");
        assert_eq!(base_label("fr", "en"), "Produit");
        assert_eq!(base_label("de", "en"), "Produkt");
    }

    #[test]
    fn test_region_tag_falls_back_to_language() {
        assert_eq!(base_label("fr-CA", "en"), "Produit");
        assert_eq!(base_label("pt_BR", "en"), "Produto");
        assert_eq!(base_label("ES", "en"), "Producto");
    }

    #[test]
    fn test_unknown_locale_uses_default() {
        assert_eq!(base_label("xx", "it"), "Prodotto");
        assert_eq!(base_label("xx", "yy"), "Product");
        assert_eq!(base_label("", "de"), "Produkt");
    }

    #[test]
    fn test_suffix_is_bijective_base26() {
        assert_eq!(suffix(0), "A");
        assert_eq!(suffix(25), "Z");
        assert_eq!(suffix(26), "AA");
        assert_eq!(suffix(27), "AB");
        assert_eq!(suffix(51), "AZ");
        assert_eq!(suffix(52), "BA");
        assert_eq!(suffix(701), "ZZ");
        assert_eq!(suffix(702), "AAA");
    }

    #[test]
    fn test_candidate() {
        assert_eq!(candidate("Product", 0), "Product A");
        assert_eq!(candidate("Produit", 26), "Produit AA");
    }
}
