//! The two fixed choice lists offered by the settings selector.
//!
//! Display strings are the exact text sent to the model, so a submitted
//! choice is matched against them verbatim.

use std::fmt;

use serde::{Serialize, Serializer};

/// The unselected value shown at the top of both dropdowns.
pub const PLACEHOLDER: &str = "-- Select --";

/// Which selector a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Module,
    Experience,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Module => "module",
            Field::Experience => "experience",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted value that is neither unset nor one of the offered choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChoice {
    pub field: Field,
    pub value: String,
}

/// True when a raw selector value means "nothing chosen".
pub fn is_unset(raw: Option<&str>) -> bool {
    match raw.map(str::trim) {
        None | Some("") => true,
        Some(v) => v == PLACEHOLDER,
    }
}

// ── Module ───────────────────────────────────────────────────────────────────

/// Topic the mentor specialises in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    Python,
    Sql,
    PowerBi,
    Eda,
    MachineLearning,
    DeepLearning,
    GenerativeAi,
    AgenticAi,
}

impl Module {
    pub const ALL: [Module; 8] = [
        Module::Python,
        Module::Sql,
        Module::PowerBi,
        Module::Eda,
        Module::MachineLearning,
        Module::DeepLearning,
        Module::GenerativeAi,
        Module::AgenticAi,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Module::Python => "Python",
            Module::Sql => "SQL",
            Module::PowerBi => "Power BI",
            Module::Eda => "EDA",
            Module::MachineLearning => "Machine Learning (ML)",
            Module::DeepLearning => "Deep Learning (DL)",
            Module::GenerativeAi => "Generative AI (Gen AI)",
            Module::AgenticAi => "Agentic AI",
        }
    }

    /// Parse a selector value. `Ok(None)` means the field was left unset.
    pub fn parse_choice(raw: Option<&str>) -> Result<Option<Module>, UnknownChoice> {
        parse_choice(raw, Field::Module, &Self::ALL, |m| m.label())
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Module {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.label())
    }
}

// ── Experience ───────────────────────────────────────────────────────────────

/// Years of experience the mentor persona claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Experience {
    One,
    Two,
    Three,
    Four,
    Five,
    Seven,
    Nine,
    Eleven,
    Fourteen,
    Fifteen,
}

impl Experience {
    pub const ALL: [Experience; 10] = [
        Experience::One,
        Experience::Two,
        Experience::Three,
        Experience::Four,
        Experience::Five,
        Experience::Seven,
        Experience::Nine,
        Experience::Eleven,
        Experience::Fourteen,
        Experience::Fifteen,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Experience::One => "1",
            Experience::Two => "2",
            Experience::Three => "3",
            Experience::Four => "4",
            Experience::Five => "5",
            Experience::Seven => "7",
            Experience::Nine => "9",
            Experience::Eleven => "11",
            Experience::Fourteen => "14",
            Experience::Fifteen => "15",
        }
    }

    pub fn years(self) -> u8 {
        match self {
            Experience::One => 1,
            Experience::Two => 2,
            Experience::Three => 3,
            Experience::Four => 4,
            Experience::Five => 5,
            Experience::Seven => 7,
            Experience::Nine => 9,
            Experience::Eleven => 11,
            Experience::Fourteen => 14,
            Experience::Fifteen => 15,
        }
    }

    /// Parse a selector value. `Ok(None)` means the field was left unset.
    pub fn parse_choice(raw: Option<&str>) -> Result<Option<Experience>, UnknownChoice> {
        parse_choice(raw, Field::Experience, &Self::ALL, |e| e.label())
    }
}

impl fmt::Display for Experience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Experience {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.label())
    }
}

fn parse_choice<T: Copy>(
    raw: Option<&str>,
    field: Field,
    all: &[T],
    label: impl Fn(T) -> &'static str,
) -> Result<Option<T>, UnknownChoice> {
    if is_unset(raw) {
        return Ok(None);
    }
    let value = raw.map(str::trim).unwrap_or_default();
    all.iter()
        .copied()
        .find(|c| label(*c) == value)
        .map(Some)
        .ok_or_else(|| UnknownChoice { field, value: value.to_string() })
}
