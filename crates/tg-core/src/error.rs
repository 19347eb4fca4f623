use thiserror::Error;

pub type TgResult<T> = Result<T, TgError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TgError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}
