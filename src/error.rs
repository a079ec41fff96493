use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CartError {
    #[error("CSV error: {0}")]
    #[diagnostic(code(biomarker_cart::csv))]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(biomarker_cart::io))]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    #[diagnostic(code(biomarker_cart::json))]
    JsonError(#[from] serde_json::Error),

    #[error("Catalog parse error: {0}")]
    #[diagnostic(
        code(biomarker_cart::catalog::parse),
        help("catalog files list packages as [[packages]] tables")
    )]
    CatalogParseError(#[from] toml::de::Error),

    #[error("Invalid catalog: {0}")]
    #[diagnostic(code(biomarker_cart::catalog::invalid))]
    CatalogError(String),

    #[error("Config error: {0}")]
    #[diagnostic(code(biomarker_cart::config))]
    ConfigError(String),

    #[error("Unknown package: {0}")]
    #[diagnostic(
        code(biomarker_cart::unknown_sku),
        help("run `biomarker-cart catalog` to list the available packages")
    )]
    UnknownSku(String),

    #[error("Cart is empty")]
    #[diagnostic(code(biomarker_cart::empty_cart))]
    EmptyCart,

    #[error("Internal error: {0}")]
    #[diagnostic(code(biomarker_cart::internal))]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for CartError {
    fn from(err: rocksdb::Error) -> Self {
        CartError::InternalError(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, CartError>;
