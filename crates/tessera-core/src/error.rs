pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No registered chart or component type found for \"{type_name}\"")]
    UnregisteredType { type_name: String },

    #[error("Unrecognized layer kind \"{kind}\" for {type_name}")]
    UnknownLayerKind { kind: String, type_name: String },

    #[error("Item \"{item_id}\" has no type")]
    MissingType { item_id: String },

    #[error("Malformed layout description: {message}")]
    MalformedLayout { message: String },

    #[error("Invalid option \"{key}\" for item \"{item_id}\": {message}")]
    InvalidOption {
        item_id: String,
        key: String,
        message: String,
    },

    #[error("configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_option(
        item_id: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidOption {
            item_id: item_id.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedLayout {
            message: message.into(),
        }
    }
}
