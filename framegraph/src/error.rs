use crate::date::AbsoluteDate;
use crate::provider::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Frame '{0}' does not exist in this graph")]
    UnknownFrame(String),

    #[error("Parent frame '{parent}' of frame '{name}' is not defined")]
    MissingParent { name: String, parent: String },

    #[error("A frame named '{0}' already exists")]
    DuplicateFrame(String),

    #[error("Unknown catalog frame '{key}', known frames: {known}")]
    UnknownCatalogFrame { key: String, known: String },

    #[error("No model registered for catalog frame '{0}'")]
    MissingModel(String),

    #[error("Frame '{name}' would be deeper than the maximum tree depth {max_depth}")]
    TreeTooDeep { name: String, max_depth: usize },

    #[error("Both frames '{f1}' and '{f2}' are descendants of frame '{frame}'")]
    BothControlFramesInSubtree {
        f1: String,
        f2: String,
        frame: String,
    },

    #[error("Neither frame '{f1}' nor frame '{f2}' is a descendant of frame '{frame}'")]
    NoControlFrameInSubtree {
        f1: String,
        f2: String,
        frame: String,
    },

    #[error("Root frame '{0}' has no transform from a parent to update")]
    RootHasNoParent(String),

    #[error("Frame '{frame}' cannot be computed at {date}: {source}")]
    ModelData {
        frame: String,
        date: AbsoluteDate,
        #[source]
        source: ModelError,
    },

    #[error("Frame '{0}' depends on a date but none was given")]
    DateRequired(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type FrameResult<T> = Result<T, FrameError>;
