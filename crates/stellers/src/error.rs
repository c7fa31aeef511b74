#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("link references a missing endpoint: {source_id} -> {target_id}")]
    MissingEndpoint {
        source_id: String,
        target_id: String,
    },

    #[error("node id appears more than once in the snapshot: {id}")]
    DuplicateNode { id: String },

    #[error("unknown node id: {id}")]
    UnknownNode { id: String },

    #[error("invalid force config value for `{field}`: {value}")]
    InvalidConfig { field: &'static str, value: f64 },

    #[error(transparent)]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
