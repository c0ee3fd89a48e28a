/// Outcome of normalizing an optional free-text input.
///
/// Keeps "not provided" apart from "provided but unusable" so the latter can be logged
/// while both are simply left out of the record.
#[derive(Clone, Debug, PartialEq)]
pub enum Normalized<T> {
    /// No input, or only whitespace.
    Unset,
    /// Input was present but could not be turned into a confident value.
    Rejected,
    Valid(T),
}

impl<T> Normalized<T> {
    pub fn from_input(raw: Option<&str>, normalize: impl FnOnce(&str) -> Option<T>) -> Self {
        match raw {
            Some(raw) if !raw.trim().is_empty() => match normalize(raw) {
                Some(value) => Normalized::Valid(value),
                None => Normalized::Rejected,
            },
            _ => Normalized::Unset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digits(raw: &str) -> Option<String> {
        let d: String = raw.chars().filter(char::is_ascii_digit).collect();
        (!d.is_empty()).then_some(d)
    }

    #[test]
    fn test_unset_rejected_valid() {
        assert_eq!(Normalized::from_input(None, digits), Normalized::Unset);
        assert_eq!(Normalized::from_input(Some("   "), digits), Normalized::Unset);
        assert_eq!(Normalized::from_input(Some("abc"), digits), Normalized::Rejected);
        assert_eq!(
            Normalized::from_input(Some("a1b2"), digits),
            Normalized::Valid("12".to_string())
        );
    }
}
