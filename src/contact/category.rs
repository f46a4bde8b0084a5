use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Personal,
    Work,
    Family,
    Friend,
    Emergency,
    /// Sentinel selecting the free-text `custom_type` field.
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Personal,
        Self::Work,
        Self::Family,
        Self::Friend,
        Self::Emergency,
        Self::Other,
    ];

    pub fn parse(val: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == val)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "Personal",
            Self::Work => "Work",
            Self::Family => "Family",
            Self::Friend => "Friend",
            Self::Emergency => "Emergency",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_exact_choices_only() {
        assert_eq!(Category::parse("Work"), Some(Category::Work));
        assert_eq!(Category::parse("Other"), Some(Category::Other));
        assert_eq!(Category::parse("work"), None);
        assert_eq!(Category::parse(""), None);
    }

    #[test]
    fn display_matches_parse() {
        for category in Category::ALL {
            assert_eq!(Category::parse(&category.to_string()), Some(category));
        }
    }
}
