use serde::{Deserialize, Serialize};

/// State report for one peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Update {
    /// Anchor identifier, normally the owning door.
    pub door_id: String,
    /// Peripheral the report is about.
    pub id: String,
    pub is_active: bool,
}

impl Update {
    pub fn new(door_id: impl Into<String>, id: impl Into<String>, is_active: bool) -> Self {
        Self {
            door_id: door_id.into(),
            id: id.into(),
            is_active,
        }
    }
}

/// Messages the controller pushes to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Inbound {
    Update(Update),
}

impl From<Update> for Inbound {
    fn from(update: Update) -> Self {
        Inbound::Update(update)
    }
}
