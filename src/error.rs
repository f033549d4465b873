use std::path::PathBuf;

/// Errors surfaced by loading and rendering.
///
/// Annotation gaps and layout non-convergence are not errors; they are
/// absorbed where they occur.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cannot load {path:?}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("malformed XGMML in {path:?}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    #[error("cannot write frame {path:?}: {source}")]
    RenderWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
