use thiserror::Error;

/// Failure to build one object or area from its records. Loaders catch these
/// per object or per area and skip the offender.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{0} without an appearance")]
    MissingAppearance(&'static str),
    #[error("missing resource {name}.{ext}")]
    MissingResource { name: String, ext: &'static str },
    #[error("reading {name}.{ext}: {source}")]
    Io {
        name: String,
        ext: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {name}.{ext}: {source}")]
    Malformed {
        name: String,
        ext: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to load model {0}")]
    Model(String),
    #[error("object type {0} cannot be created")]
    UnsupportedType(i32),
}
