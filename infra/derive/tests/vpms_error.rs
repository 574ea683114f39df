use std::borrow::Cow;
use vpms_derive::vpms_error;

#[vpms_error]
pub enum SpotError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Spot occupied{}: {message}", format_context(.context))]
    Occupied { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal spot error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read_spot() -> Result<(), std::io::Error> {
    Err(std::io::Error::new(std::io::ErrorKind::NotFound, "spot file"))
}

#[test]
fn vpms_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/vpms_error_pass.rs");
}

#[test]
fn source_errors_convert_with_question_mark() {
    fn load() -> Result<(), SpotError> {
        read_spot()?;
        Ok(())
    }

    let err = load().unwrap_err();
    assert!(matches!(err, SpotError::Io { context: None, .. }));
    assert_eq!(err.to_string(), "IO error: spot file");
}

#[test]
fn context_is_rendered_in_display() {
    let err = read_spot().context("loading 4-12").unwrap_err();
    assert_eq!(err.to_string(), "IO error (loading 4-12): spot file");

    let err: Result<(), SpotError> =
        Err(SpotError::Occupied { message: "4-12".into(), context: None });
    let err = err.context("reserving").unwrap_err();
    assert_eq!(err.to_string(), "Spot occupied (reserving): 4-12");
}

#[test]
fn strings_become_internal_errors() {
    let err: SpotError = "unexpected state".into();
    assert!(matches!(err, SpotError::Internal { .. }));

    let err: SpotError = format!("spot {}", 7).into();
    assert_eq!(err.to_string(), "Internal spot error: spot 7");
}
