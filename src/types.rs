use std::{fmt, str::FromStr, sync::{Arc, LazyLock}};

use regex::Regex;

/// Stable key for a census polygon ("radio censal").
/// Keep the original code text (with leading zeros) but avoid repeated owned Strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RadioId(Arc<str>);

impl RadioId {
    pub fn new(id: &str) -> Self { Self(Arc::from(id.trim())) }

    #[inline] pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for RadioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for RadioId {
    fn from(id: &str) -> Self { Self::new(id) }
}

/// Label of the terminal age bracket in census tables.
pub const TERMINAL_LABEL: &str = "100 Y MÁS";

/// Label used when the age is missing or cannot be parsed.
pub const UNKNOWN_LABEL: &str = "Desconocido";

/// Lower bound of the terminal bracket.
const TERMINAL_AGE: u32 = 100;

/// Five-year age bracket, following the census labelling convention ("20 A 24").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeBracket {
    /// Five-year span starting at the given age (multiple of 5, below 100).
    Span(u8),
    /// Everyone aged 100 or more.
    Terminal,
    /// Missing or non-numeric age.
    Unknown,
    /// A label that does not follow the census convention.
    Other(Arc<str>),
}

static SPAN_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3})\s*A\s*(\d{1,3})$").expect("valid age span pattern")
});

static OPEN_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3})\s*Y\s*M[ÁA]S$").expect("valid open age pattern")
});

impl AgeBracket {
    /// Bracket containing a raw age value.
    /// Ages are floored to the five-year span; 100 and above collapse onto the terminal bracket.
    pub fn from_age(age: f64) -> Self {
        if !age.is_finite() || age < 0.0 { return Self::Unknown }

        let age = age.floor() as u32;
        if age >= TERMINAL_AGE { Self::Terminal } else { Self::Span((age - age % 5) as u8) }
    }

    /// Bracket for a raw, possibly non-numeric, age field.
    pub fn from_raw(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse::<f64>().ok())
            .map_or(Self::Unknown, Self::from_age)
    }

    /// Parse a census label, canonicalizing every bracket above 100 onto the terminal one.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        let upper = label.to_uppercase();

        if upper == UNKNOWN_LABEL.to_uppercase() { return Self::Unknown }

        if let Some(caps) = SPAN_LABEL.captures(&upper) {
            let (Ok(lo), Ok(hi)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
                return Self::Other(Arc::from(label));
            };
            if lo >= TERMINAL_AGE { return Self::Terminal }
            if lo % 5 == 0 && hi == lo + 4 { return Self::Span(lo as u8) }
        } else if let Some(caps) = OPEN_LABEL.captures(&upper) {
            if caps[1].parse::<u32>().is_ok_and(|lo| lo >= TERMINAL_AGE) { return Self::Terminal }
        }

        Self::Other(Arc::from(label))
    }

    /// Census label of the bracket.
    pub fn label(&self) -> String {
        match self {
            Self::Span(lo) => format!("{:02} A {:02}", lo, lo + 4),
            Self::Terminal => TERMINAL_LABEL.to_string(),
            Self::Unknown => UNKNOWN_LABEL.to_string(),
            Self::Other(label) => label.to_string(),
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.label()) }
}

impl FromStr for AgeBracket {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Ok(Self::from_label(s)) }
}

/// Canonical gender categories of the mobility layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Gender {
    Men,
    Women,
    Other,
}

impl Gender {
    /// Normalize a raw gender code ("M"/"F"); anything else maps to `Other`.
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some("M") => Self::Men,
            Some("F") => Self::Women,
            _ => Self::Other,
        }
    }
}

/// Round a fractional head count to an integer, half away from zero.
#[inline]
pub fn round_count(value: f64) -> i64 { value.round() as i64 }
