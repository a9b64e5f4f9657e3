//! Validated value types shared across the EDW workspace.
//!
//! These wrappers exist so that "a name must not be blank" and "a probability
//! sits between 0 and 1" are enforced once, at construction, rather than
//! re-checked in every service that touches the value.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when creating a [`Probability`].
#[derive(Debug, thiserror::Error)]
pub enum ProbabilityError {
    /// The value was NaN or infinite
    #[error("Probability must be a finite number")]
    NotFinite,
    /// The value fell outside the closed interval `[0.0, 1.0]`
    #[error("Probability {0} is outside 0.0..=1.0")]
    OutOfRange(f64),
}

/// A probability constrained to the closed interval `[0.0, 1.0]`.
///
/// Used for clinician-entered differential-diagnosis likelihoods. Values
/// arriving from the store or from the AI assistant are kept as plain floats;
/// this type guards the human input boundary only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probability(f64);

impl Probability {
    /// Creates a new `Probability` from a float.
    ///
    /// # Errors
    ///
    /// Returns `ProbabilityError::NotFinite` for NaN/infinite inputs and
    /// `ProbabilityError::OutOfRange` for finite values outside `[0.0, 1.0]`.
    pub fn new(value: f64) -> Result<Self, ProbabilityError> {
        if !value.is_finite() {
            return Err(ProbabilityError::NotFinite);
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ProbabilityError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Returns the inner float value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Probability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for Probability {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Probability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = f64::deserialize(deserializer)?;
        Probability::new(v).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_and_accepts() {
        let text = NonEmptyText::new("  Chest pain  ").expect("should accept non-empty input");
        assert_eq!(text.as_str(), "Chest pain");
    }

    #[test]
    fn non_empty_text_rejects_whitespace_only() {
        let err = NonEmptyText::new("   ").expect_err("whitespace-only input should be rejected");
        assert!(matches!(err, TextError::Empty));
    }

    #[test]
    fn probability_accepts_bounds() {
        assert_eq!(Probability::new(0.0).unwrap().value(), 0.0);
        assert_eq!(Probability::new(1.0).unwrap().value(), 1.0);
        assert_eq!(Probability::new(0.35).unwrap().value(), 0.35);
    }

    #[test]
    fn probability_rejects_out_of_range_and_nan() {
        assert!(matches!(
            Probability::new(1.2),
            Err(ProbabilityError::OutOfRange(_))
        ));
        assert!(matches!(
            Probability::new(-0.1),
            Err(ProbabilityError::OutOfRange(_))
        ));
        assert!(matches!(
            Probability::new(f64::NAN),
            Err(ProbabilityError::NotFinite)
        ));
    }
}
