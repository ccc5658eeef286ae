//! エラー型のテスト

use label_validator::error::LabelValidatorError;

#[test]
fn test_core_error_passes_message_through() {
    let error: LabelValidatorError = label_validator_common::Error::NothingToExport.into();
    assert_eq!(error.to_string(), "No hay datos para exportar");
}

#[test]
fn test_invalid_format_message() {
    let error: LabelValidatorError =
        label_validator_common::Error::InvalidFormat("zip".into()).into();
    assert!(error.to_string().contains("verifica el formato"));
}

#[test]
fn test_file_not_found() {
    let error = LabelValidatorError::FileNotFound("/tmp/x.xlsx".into());
    assert_eq!(error.to_string(), "Archivo no encontrado: /tmp/x.xlsx");
}

#[test]
fn test_from_io() {
    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
    let error: LabelValidatorError = io_error.into();
    assert!(matches!(error, LabelValidatorError::Io(_)));
    assert!(error.to_string().contains("access denied"));
}

#[test]
fn test_from_json() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: LabelValidatorError = json_error.into();
    assert!(matches!(error, LabelValidatorError::JsonParse(_)));
}

#[test]
fn test_error_debug() {
    let error = LabelValidatorError::Config("sin directorio".into());
    let debug = format!("{:?}", error);
    assert!(debug.contains("Config"));
    assert!(debug.contains("sin directorio"));
}
