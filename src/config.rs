pub use self::parser::{
    Config, DatabaseConfig, DbType, DedupFailurePolicy, DictionaryConfig, LoggingConfig,
};
pub use self::validator::ConfigError;

mod parser;
mod validator;
