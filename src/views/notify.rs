use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Default,
    Destructive,
}

/// A transient toast shown after an action completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    pub fn success(description: &str) -> Self {
        Self {
            title: "Success".to_string(),
            description: description.to_string(),
            variant: Variant::Default,
        }
    }

    pub fn error(description: &str) -> Self {
        Self {
            title: "Error".to_string(),
            description: description.to_string(),
            variant: Variant::Destructive,
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == Variant::Destructive
    }
}

/// A blocking message the user must dismiss before continuing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub message: String,
}

impl Alert {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
