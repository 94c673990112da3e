/// Field rules shared by the registration forms
///
/// Person names are stored as camelCase identifiers (`alan`, `vanRossum`),
/// and emails are compared case-insensitively, so both are checked and
/// normalized before they reach the database.

/// A field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// `^[a-z][a-zA-Z]*$`
pub fn is_camel_case(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => chars.all(|c| c.is_ascii_alphabetic()),
        _ => false,
    }
}

/// Checks a first or last name
pub fn check_name(field: &'static str, value: &str) -> Result<(), FieldError> {
    if is_camel_case(value) {
        Ok(())
    } else {
        Err(FieldError::new(
            field,
            "Must be camelCase: start with a lowercase letter and use letters only",
        ))
    }
}

/// Checks both names of a person, collecting every failure
pub fn check_person_names(first_name: &str, last_name: &str) -> Vec<FieldError> {
    [
        check_name("first_name", first_name),
        check_name("last_name", last_name),
    ]
    .into_iter()
    .filter_map(Result::err)
    .collect()
}

/// Trimmed, lowercased email
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case() {
        for ok in ["alan", "vanRossum", "a", "deLaCruz"] {
            assert!(is_camel_case(ok), "{}", ok);
        }
        for bad in ["", "Alan", "van rossum", "o'brien", "anne-marie", "alan2", "élodie"] {
            assert!(!is_camel_case(bad), "{}", bad);
        }
    }

    #[test]
    fn test_check_person_names_collects_both() {
        let errors = check_person_names("Alan", "turing");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "first_name");

        assert_eq!(check_person_names("Alan", "Turing").len(), 2);
        assert!(check_person_names("alan", "turing").is_empty());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Dev@Example.COM "), "dev@example.com");
    }
}
