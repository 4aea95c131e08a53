//! Raw model label → canonical class remapping.
//!
//! Each modality carries a prioritized rule list. Stages run in order and the
//! first one that matches wins:
//! 1. exact alias (lower-cased, trimmed)
//! 2. bidirectional containment against the canonical class names
//! 3. substring alias
//! 4. numeric grade index into the class list
//! 5. passthrough of the raw label

/// Label remapping rules for one modality vocabulary.
#[derive(Debug)]
pub struct LabelRules {
    /// Canonical class names. Position doubles as the grade index.
    pub classes: &'static [&'static str],
    /// Lower-case alias → canonical class, matched on the whole label.
    pub exact: &'static [(&'static str, &'static str)],
    /// Match when a canonical name contains the label or the label contains it.
    pub canonical_containment: bool,
    /// Substring alias → canonical class, first hit wins.
    pub contains: &'static [(&'static str, &'static str)],
    /// Accept a bare integer as an index into `classes`.
    pub numeric_index: bool,
}

impl LabelRules {
    pub fn normalize(&self, raw: &str) -> String {
        let label = raw.trim().to_lowercase();

        if let Some((_, canonical)) = self.exact.iter().find(|(alias, _)| *alias == label) {
            return canonical.to_string();
        }

        if self.canonical_containment && !label.is_empty() {
            if let Some(canonical) = self.classes.iter().find(|c| {
                let c = c.to_lowercase();
                label.contains(&c) || c.contains(&label)
            }) {
                return canonical.to_string();
            }
        }

        if let Some((_, canonical)) = self.contains.iter().find(|(key, _)| label.contains(key)) {
            return canonical.to_string();
        }

        if self.numeric_index {
            if let Ok(idx) = label.parse::<usize>() {
                if let Some(canonical) = self.classes.get(idx) {
                    return canonical.to_string();
                }
            }
        }

        raw.to_string()
    }

    /// Position of a canonical class in the vocabulary.
    pub fn index_of(&self, canonical: &str) -> Option<usize> {
        self.classes.iter().position(|c| *c == canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static RULES: LabelRules = LabelRules {
        classes: &["alpha class", "beta", "gamma"],
        exact: &[("a", "alpha class")],
        canonical_containment: true,
        contains: &[("bet", "beta"), ("gam", "gamma")],
        numeric_index: true,
    };

    #[test]
    fn exact_alias_first() {
        assert_eq!(RULES.normalize(" A "), "alpha class");
    }

    #[test]
    fn canonical_containment_both_ways() {
        assert_eq!(RULES.normalize("Alpha Class (confirmed)"), "alpha class");
        assert_eq!(RULES.normalize("alpha"), "alpha class");
    }

    #[test]
    fn empty_label_skips_containment() {
        // "" is contained in every class name; it must not match the first class.
        assert_eq!(RULES.normalize(""), "");
    }

    #[test]
    fn substring_alias() {
        assert_eq!(RULES.normalize("label_gamma_ray"), "gamma");
    }

    #[test]
    fn numeric_index_and_out_of_range() {
        assert_eq!(RULES.normalize("1"), "beta");
        assert_eq!(RULES.normalize("7"), "7");
    }

    #[test]
    fn passthrough_keeps_original_case() {
        assert_eq!(RULES.normalize("Zeta"), "Zeta");
    }

    #[test]
    fn index_of_canonical() {
        assert_eq!(RULES.index_of("gamma"), Some(2));
        assert_eq!(RULES.index_of("delta"), None);
    }
}
