//! Rendered cards: the structured messages proposals and search results are
//! displayed as.

/// Visual weight of a card action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStyle {
    Success,
    Danger,
}

/// A clickable action attached to a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardAction {
    /// Identifier delivered back when the action is triggered.
    pub id: String,
    pub label: String,
    pub style: ActionStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A titled message with ordered fields and optional actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Card {
    /// Plain text shown above the card.
    pub content: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<CardField>,
    pub actions: Vec<CardAction>,
    /// Rendered in the platform's error colour.
    pub is_error: bool,
}

impl Card {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// An error card with the given message as its description.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            description: Some(message.into()),
            is_error: true,
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(CardField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }

    pub fn inline_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(CardField {
            name: name.into(),
            value: value.into(),
            inline: true,
        });
        self
    }

    pub fn action(mut self, id: impl Into<String>, label: impl Into<String>, style: ActionStyle) -> Self {
        self.actions.push(CardAction {
            id: id.into(),
            label: label.into(),
            style,
        });
        self
    }

    /// Value of the first field with this name.
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}
