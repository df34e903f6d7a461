//! Free-text normalization shared by product matching and link validation.

/// Lowercases, strips diacritics and collapses every non-alphanumeric run
/// into a single space. `"Sauté de Bœuf!"` becomes `"saute de boeuf"`.
pub fn normalize_label(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_space = false;
    for ch in value.chars() {
        for folded in fold_char(ch).chars() {
            let lower = folded.to_ascii_lowercase();
            if lower.is_ascii_alphanumeric() {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push(lower);
            } else {
                pending_space = true;
            }
        }
    }
    out
}

/// Folds the accented characters seen in French ingredient and recipe
/// labels to their ASCII base letters. Anything else passes through and is
/// treated as a separator by `normalize_label` if non-alphanumeric.
fn fold_char(ch: char) -> &'static str {
    match ch {
        'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' => "a",
        'À' | 'Â' | 'Ä' | 'Á' | 'Ã' | 'Å' => "A",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'É' | 'È' | 'Ê' | 'Ë' => "E",
        'î' | 'ï' | 'í' | 'ì' => "i",
        'Î' | 'Ï' | 'Í' | 'Ì' => "I",
        'ô' | 'ö' | 'ó' | 'ò' | 'õ' => "o",
        'Ô' | 'Ö' | 'Ó' | 'Ò' | 'Õ' => "O",
        'ù' | 'û' | 'ü' | 'ú' => "u",
        'Ù' | 'Û' | 'Ü' | 'Ú' => "U",
        'ç' => "c",
        'Ç' => "C",
        'ñ' => "n",
        'Ñ' => "N",
        'œ' => "oe",
        'Œ' => "OE",
        'æ' => "ae",
        'Æ' => "AE",
        _ => {
            // Single-char passthrough without allocating.
            return char_as_str(ch);
        }
    }
}

fn char_as_str(ch: char) -> &'static str {
    // Only ASCII needs zero-alloc passthrough; other unmatched characters
    // are rare and act as separators, so map them to a space.
    const ASCII: &str = "\
\x00\x01\x02\x03\x04\x05\x06\x07\x08\x09\x0a\x0b\x0c\x0d\x0e\x0f\
\x10\x11\x12\x13\x14\x15\x16\x17\x18\x19\x1a\x1b\x1c\x1d\x1e\x1f\
 !\"#$%&'()*+,-./0123456789:;<=>?\
@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_\
`abcdefghijklmnopqrstuvwxyz{|}~\x7f";
    if ch.is_ascii() {
        let idx = ch as usize;
        &ASCII[idx..=idx]
    } else {
        " "
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_accents_and_ligatures() {
        assert_eq!(normalize_label("Sauté de Bœuf"), "saute de boeuf");
        assert_eq!(normalize_label("Pâtes à l'œuf"), "pates a l oeuf");
    }

    #[test]
    fn collapses_separators() {
        assert_eq!(normalize_label("  Thon -- en  boîte!! "), "thon en boite");
        assert_eq!(normalize_label(""), "");
        assert_eq!(normalize_label("---"), "");
    }
}
