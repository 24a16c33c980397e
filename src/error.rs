pub type FigpipeResult<T> = Result<T, FigpipeError>;

#[derive(thiserror::Error, Debug)]
pub enum FigpipeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("image error: {0}")]
    Image(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FigpipeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }
}

impl From<image::ImageError> for FigpipeError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            FigpipeError::config("x")
                .to_string()
                .contains("config error:")
        );
        assert!(
            FigpipeError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(FigpipeError::image("x").to_string().contains("image error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = FigpipeError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
