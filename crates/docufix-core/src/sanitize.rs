use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Decompose to NFD and drop the combining marks, so "Técnico" becomes
/// "Tecnico" before the allow-list pass.
pub fn remove_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Canonical form of one path component: lowercase ASCII letters and digits
/// only. Never returns an empty string; a name that sanitizes away entirely
/// becomes the filler "a".
pub fn sanitize_component(name: &str) -> String {
    let s: String = remove_diacritics(name)
        .chars()
        .filter_map(|c| {
            let c = c.to_ascii_lowercase();
            c.is_ascii_alphanumeric().then_some(c)
        })
        .collect();
    if s.is_empty() {
        "a".to_string()
    } else {
        s
    }
}

/// True when a basename has diacritics the sanitizer would strip.
pub fn has_diacritics(name: &str) -> bool {
    remove_diacritics(name) != name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics_and_symbols() {
        assert_eq!(sanitize_component("Informe Técnico Final"), "informetecnicofinal");
        assert_eq!(sanitize_component("Año: 2023 (v2)!"), "ano2023v2");
        assert_eq!(sanitize_component("ñÑçÇãÃõÕ"), "nnccaaoo");
    }

    #[test]
    fn never_empty() {
        assert_eq!(sanitize_component(""), "a");
        assert_eq!(sanitize_component("¡¡¡...!!!"), "a");
        assert_eq!(sanitize_component("   "), "a");
    }

    #[test]
    fn idempotent() {
        for raw in ["Proyecto Alpha 2023", "ün nömbre", "", "---", "already_clean123"] {
            let once = sanitize_component(raw);
            assert_eq!(sanitize_component(&once), once);
        }
    }

    #[test]
    fn detects_diacritics() {
        assert!(has_diacritics("Técnico"));
        assert!(!has_diacritics("Tecnico"));
    }
}
