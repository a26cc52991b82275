// src/models/department.rs

//! Departments and the languages their service pages are counted in.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A government department as known to the portal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Department {
    /// Portal-assigned taxonomy id (UUID)
    pub id: String,

    /// Display name used in exports
    pub name: String,
}

impl Department {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Portal languages, declared in canonical reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    He,
    Ar,
    En,
    Es,
    Fr,
    Ru,
}

impl Language {
    /// All languages in canonical order.
    pub const ALL: [Language; 6] = [
        Language::He,
        Language::Ar,
        Language::En,
        Language::Es,
        Language::Fr,
        Language::Ru,
    ];

    /// Path segment the portal uses for this language.
    pub fn code(self) -> &'static str {
        match self {
            Language::He => "he",
            Language::Ar => "ar",
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::Ru => "ru",
        }
    }

    /// Label used as the export column header.
    pub fn label(self) -> &'static str {
        match self {
            Language::He => "עברית",
            Language::Ar => "ערבית",
            Language::En => "אנגלית",
            Language::Es => "ספרדית",
            Language::Fr => "צרפתית",
            Language::Ru => "רוסית",
        }
    }

    /// English name for log output.
    pub fn english_name(self) -> &'static str {
        match self {
            Language::He => "Hebrew",
            Language::Ar => "Arabic",
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::Ru => "Russian",
        }
    }

    /// Position in canonical order.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The seven departments tracked by default.
pub fn default_departments() -> Vec<Department> {
    [
        ("c0d8ba69-e309-4fe5-801f-855971774a90", "רשות המסים בישראל"),
        ("104cb0f4-d65a-4692-b590-94af928c19c0", "משרד הבריאות"),
        ("95b283ad-fc02-40e6-ac6f-8986acac6b86", "רשות האוכלוסין וההגירה"),
        ("48eaee91-0c97-4ef3-b364-50ae52e3b56f", "משרד התחבורה והבטיחות בדרכים"),
        ("85d16bf0-1c3e-486a-97cd-2b07d89e6934", "משרד העבודה"),
        ("8b4e2a06-8ce1-4703-8895-c35be965ef1f", "רשות התאגידים"),
        ("ba3bf87e-6a99-4e24-ae89-2815a450881e", "משרד הכלכלה והתעשייה"),
    ]
    .into_iter()
    .map(|(id, name)| Department::new(id, name))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let codes: Vec<_> = Language::ALL.iter().map(|l| l.code()).collect();
        assert_eq!(codes, ["he", "ar", "en", "es", "fr", "ru"]);
        for (i, lang) in Language::ALL.iter().enumerate() {
            assert_eq!(lang.index(), i);
        }
    }

    #[test]
    fn test_default_departments() {
        let departments = default_departments();
        assert_eq!(departments.len(), 7);
        assert_eq!(departments[1].name, "משרד הבריאות");
    }
}
