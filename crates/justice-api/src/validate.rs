use justice_types::api::FieldError;

use crate::error::ApiError;

/// Collects every failing field check so the client sees all problems at once.
#[derive(Default)]
pub(crate) struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub fn min_chars(&mut self, param: &str, value: &str, min: usize, msg: &str) -> &mut Self {
        self.check(value.trim().chars().count() >= min, param, msg)
    }

    pub fn chars_between(&mut self, param: &str, value: &str, min: usize, max: usize, msg: &str) -> &mut Self {
        let len = value.trim().chars().count();
        self.check(len >= min && len <= max, param, msg)
    }

    pub fn required(&mut self, param: &str, value: &str, msg: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), param, msg)
    }

    pub fn check(&mut self, ok: bool, param: &str, msg: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError {
                param: param.to_string(),
                msg: msg.to_string(),
            });
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

/// Trimmed text, or `None` when the client sent nothing but whitespace.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_all_failures() {
        let err = Checks::default()
            .min_chars("title", "  abc  ", 5, "too short")
            .required("location", "   ", "required")
            .min_chars("description", "long enough text", 10, "too short")
            .finish()
            .unwrap_err();

        match err {
            ApiError::Validation(errors) => {
                let params: Vec<_> = errors.iter().map(|e| e.param.as_str()).collect();
                assert_eq!(params, vec!["title", "location"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert!(Checks::default().chars_between("name", "zoë", 3, 32, "bad").finish().is_ok());
        assert!(Checks::default().chars_between("name", "zo", 3, 32, "bad").finish().is_err());
    }

    #[test]
    fn non_blank_trims_and_drops_empty() {
        assert_eq!(non_blank(Some("  x ".into())), Some("x".into()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }
}
