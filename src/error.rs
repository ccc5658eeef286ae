use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelValidatorError {
    #[error("Error de configuración: {0}")]
    Config(String),

    #[error("{0}")]
    Core(#[from] label_validator_common::Error),

    #[error("Archivo no encontrado: {0}")]
    FileNotFound(String),

    #[error("Valor no disponible en este nivel: {0}")]
    UnknownValue(String),

    #[error("Error de entrada: {0}")]
    Prompt(String),

    #[error("Error de JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LabelValidatorError>;

impl From<dialoguer::Error> for LabelValidatorError {
    fn from(e: dialoguer::Error) -> Self {
        LabelValidatorError::Prompt(e.to_string())
    }
}
