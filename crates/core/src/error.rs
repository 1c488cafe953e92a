use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("Validation: {0}")]
  Validation(String),

  #[error("Config parse error in {path}: {source}")]
  ConfigParse {
    path: String,
    #[source]
    source: toml::de::Error,
  },

  #[error("Config serialize error: {0}")]
  ConfigSerialize(#[from] toml::ser::Error),

  #[error("IO: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
