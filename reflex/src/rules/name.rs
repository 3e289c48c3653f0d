//! Name pattern conditions.
//!
//! A [`NameConditions`] block is a conjunction: a member name matches only
//! when every declared condition holds.

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use regex::Regex;

/// Custom predicate over a member name.
pub type NamePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A single name condition.
#[derive(Clone)]
pub enum NameRule {
    Equals { other: String, ignore_case: bool },
    StartsWith { prefix: String, start_index: usize, ignore_case: bool },
    EndsWith { suffix: String, ignore_case: bool },
    Contains { other: String, ignore_case: bool },
    Matches(Regex),
    /// A pattern that failed to compile; reported when the rule set is validated.
    InvalidRegex { pattern: String, message: String },
    Length(usize),
    LengthRange(RangeInclusive<usize>),
    Synthetic,
    OnlySymbols,
    OnlyLetters,
    OnlyNumbers,
    OnlyLettersNumbers,
    OnlyLowercase,
    OnlyUppercase,
    Custom(NamePredicate),
}

impl NameRule {
    fn matches(&self, name: &str) -> bool {
        match self {
            NameRule::Equals { other, ignore_case } => {
                if *ignore_case {
                    name.to_lowercase() == other.to_lowercase()
                } else {
                    name == other
                }
            }
            NameRule::StartsWith { prefix, start_index, ignore_case } => {
                // Offset counts characters; one past the end is allowed.
                let Some(offset) = name
                    .char_indices()
                    .map(|(i, _)| i)
                    .chain(std::iter::once(name.len()))
                    .nth(*start_index)
                else {
                    return false;
                };
                let tail = &name[offset..];
                if *ignore_case {
                    tail.to_lowercase().starts_with(&prefix.to_lowercase())
                } else {
                    tail.starts_with(prefix.as_str())
                }
            }
            NameRule::EndsWith { suffix, ignore_case } => {
                if *ignore_case {
                    name.to_lowercase().ends_with(&suffix.to_lowercase())
                } else {
                    name.ends_with(suffix.as_str())
                }
            }
            NameRule::Contains { other, ignore_case } => {
                if *ignore_case {
                    name.to_lowercase().contains(&other.to_lowercase())
                } else {
                    name.contains(other.as_str())
                }
            }
            NameRule::Matches(regex) => regex.is_match(name),
            NameRule::InvalidRegex { .. } => false,
            NameRule::Length(len) => name.chars().count() == *len,
            NameRule::LengthRange(range) => range.contains(&name.chars().count()),
            // Compiler-generated names carry a `$` (lambdas, accessors, outer refs).
            NameRule::Synthetic => name.contains('$'),
            NameRule::OnlySymbols => {
                !name.is_empty() && name.chars().all(|c| !c.is_alphanumeric() && !c.is_whitespace())
            }
            NameRule::OnlyLetters => !name.is_empty() && name.chars().all(char::is_alphabetic),
            NameRule::OnlyNumbers => !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()),
            NameRule::OnlyLettersNumbers => {
                !name.is_empty() && name.chars().all(char::is_alphanumeric)
            }
            NameRule::OnlyLowercase => {
                !name.is_empty() && name.chars().all(|c| c.is_lowercase() || !c.is_alphabetic())
                    && name.chars().any(char::is_alphabetic)
            }
            NameRule::OnlyUppercase => {
                !name.is_empty() && name.chars().all(|c| c.is_uppercase() || !c.is_alphabetic())
                    && name.chars().any(char::is_alphabetic)
            }
            NameRule::Custom(predicate) => predicate(name),
        }
    }
}

impl fmt::Debug for NameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameRule::Equals { other, ignore_case } => {
                write!(f, "equals({:?}, ignore_case={})", other, ignore_case)
            }
            NameRule::StartsWith { prefix, start_index, ignore_case } => {
                write!(
                    f,
                    "startsWith({:?}, from={}, ignore_case={})",
                    prefix, start_index, ignore_case
                )
            }
            NameRule::EndsWith { suffix, ignore_case } => {
                write!(f, "endsWith({:?}, ignore_case={})", suffix, ignore_case)
            }
            NameRule::Contains { other, ignore_case } => {
                write!(f, "contains({:?}, ignore_case={})", other, ignore_case)
            }
            NameRule::Matches(regex) => write!(f, "matches(/{}/)", regex.as_str()),
            NameRule::InvalidRegex { pattern, .. } => write!(f, "matches(/{}/ <invalid>)", pattern),
            NameRule::Length(len) => write!(f, "length({})", len),
            NameRule::LengthRange(range) => {
                write!(f, "length({}..={})", range.start(), range.end())
            }
            NameRule::Synthetic => write!(f, "synthetic"),
            NameRule::OnlySymbols => write!(f, "onlySymbols"),
            NameRule::OnlyLetters => write!(f, "onlyLetters"),
            NameRule::OnlyNumbers => write!(f, "onlyNumbers"),
            NameRule::OnlyLettersNumbers => write!(f, "onlyLettersNumbers"),
            NameRule::OnlyLowercase => write!(f, "onlyLowercase"),
            NameRule::OnlyUppercase => write!(f, "onlyUppercase"),
            NameRule::Custom(_) => write!(f, "custom(..)"),
        }
    }
}

/// A conjunction of name conditions.
#[derive(Debug, Clone, Default)]
pub struct NameConditions {
    rules: Vec<NameRule>,
}

impl NameConditions {
    /// Create an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name equals `other`.
    pub fn equals(&mut self, other: impl Into<String>, ignore_case: bool) -> &mut Self {
        self.rules.push(NameRule::Equals { other: other.into(), ignore_case });
        self
    }

    /// Name, from `start_index` (in bytes), starts with `prefix`.
    pub fn starts_with(
        &mut self,
        prefix: impl Into<String>,
        start_index: usize,
        ignore_case: bool,
    ) -> &mut Self {
        self.rules.push(NameRule::StartsWith { prefix: prefix.into(), start_index, ignore_case });
        self
    }

    /// Name ends with `suffix`.
    pub fn ends_with(&mut self, suffix: impl Into<String>, ignore_case: bool) -> &mut Self {
        self.rules.push(NameRule::EndsWith { suffix: suffix.into(), ignore_case });
        self
    }

    /// Name contains `other`.
    pub fn contains(&mut self, other: impl Into<String>, ignore_case: bool) -> &mut Self {
        self.rules.push(NameRule::Contains { other: other.into(), ignore_case });
        self
    }

    /// Name matches a regular expression.
    ///
    /// An invalid pattern is kept and surfaces as a configuration error when
    /// the rule set is resolved.
    pub fn matches(&mut self, pattern: &str) -> &mut Self {
        let rule = match Regex::new(pattern) {
            Ok(regex) => NameRule::Matches(regex),
            Err(err) => NameRule::InvalidRegex {
                pattern: pattern.to_string(),
                message: err.to_string(),
            },
        };
        self.rules.push(rule);
        self
    }

    /// Name is exactly `len` characters long.
    pub fn length(&mut self, len: usize) -> &mut Self {
        self.rules.push(NameRule::Length(len));
        self
    }

    /// Name length lies within `range`.
    pub fn length_range(&mut self, range: RangeInclusive<usize>) -> &mut Self {
        self.rules.push(NameRule::LengthRange(range));
        self
    }

    /// Name is compiler generated.
    pub fn is_synthetic(&mut self) -> &mut Self {
        self.rules.push(NameRule::Synthetic);
        self
    }

    pub fn is_only_symbols(&mut self) -> &mut Self {
        self.rules.push(NameRule::OnlySymbols);
        self
    }

    pub fn is_only_letters(&mut self) -> &mut Self {
        self.rules.push(NameRule::OnlyLetters);
        self
    }

    pub fn is_only_numbers(&mut self) -> &mut Self {
        self.rules.push(NameRule::OnlyNumbers);
        self
    }

    pub fn is_only_letters_numbers(&mut self) -> &mut Self {
        self.rules.push(NameRule::OnlyLettersNumbers);
        self
    }

    pub fn is_only_lowercase(&mut self) -> &mut Self {
        self.rules.push(NameRule::OnlyLowercase);
        self
    }

    pub fn is_only_uppercase(&mut self) -> &mut Self {
        self.rules.push(NameRule::OnlyUppercase);
        self
    }

    /// Arbitrary predicate over the name.
    pub fn custom<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.rules.push(NameRule::Custom(Arc::new(predicate)));
        self
    }

    /// Whether no condition has been declared.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The declared conditions, in declaration order.
    pub fn rules(&self) -> &[NameRule] {
        &self.rules
    }

    /// First regex that failed to compile, as `(pattern, message)`.
    pub fn invalid_regex(&self) -> Option<(&str, &str)> {
        self.rules.iter().find_map(|rule| match rule {
            NameRule::InvalidRegex { pattern, message } => {
                Some((pattern.as_str(), message.as_str()))
            }
            _ => None,
        })
    }

    /// Check a name against every condition.
    pub fn is_match(&self, name: &str) -> bool {
        self.rules.iter().all(|rule| rule.matches(name))
    }
}

impl fmt::Display for NameConditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                write!(f, " && ")?;
            }
            write!(f, "{:?}", rule)?;
        }
        Ok(())
    }
}
