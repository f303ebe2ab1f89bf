use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Field types a layout entry may declare. The editing dialog must stay within this set;
/// the session only passes it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Text,
    Textarea,
    Richtext,
    Container,
    Dropdown,
    Checkbox,
    Number,
    Image,
}

impl EntryKind {
    pub const ALL: [EntryKind; 8] = [
        EntryKind::Text,
        EntryKind::Textarea,
        EntryKind::Richtext,
        EntryKind::Container,
        EntryKind::Dropdown,
        EntryKind::Checkbox,
        EntryKind::Number,
        EntryKind::Image,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Text => "text",
            EntryKind::Textarea => "textarea",
            EntryKind::Richtext => "richtext",
            EntryKind::Container => "container",
            EntryKind::Dropdown => "dropdown",
            EntryKind::Checkbox => "checkbox",
            EntryKind::Number => "number",
            EntryKind::Image => "image",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        EntryKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| format!("unknown entry kind '{raw}'"))
    }
}
