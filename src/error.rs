use thiserror::Error;

/// Errors produced by the map compilation pipeline.
#[derive(Debug, Error)]
pub enum MapError {
    /// The task token does not match the threshold grammar.
    #[error("invalid task specification {0:?}")]
    InvalidTaskSpec(String),

    /// A color string is neither hex nor RGB.
    #[error("color formatting {0:?} is neither Hex nor RGB")]
    InvalidColorFormat(String),

    /// The palette could not be resolved through any tier.
    #[error("palette resolution failed")]
    PaletteResolution(#[from] PaletteError),

    /// A crop rectangle inverted (x1 <= x0 or y1 <= y0).
    #[error("invalid layout bounds: x1 > x0 and y1 > y0 are required (got x0={x0}, y0={y0}, x1={x1}, y1={y1})")]
    InvalidLayoutBounds { x0: f64, y0: f64, x1: f64, y1: f64 },

    /// A region token is not one of the known continents or "world".
    #[error("unknown region token {0:?}")]
    UnknownRegionToken(String),

    /// The base template misses a structural marker the compositor
    /// splices against.
    #[error("malformed base template: {0}")]
    MalformedTemplate(&'static str),
}

/// Why a palette resolution tier failed. The last tier's cause is
/// attached to the fatal error when no fallback family can rescue it.
#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("palette {name:?} does not have {wanted} colors")]
    InsufficientColors { name: String, wanted: usize },

    #[error("the same-type default for {name:?} ({kind}) does not support {wanted} colors either")]
    DefaultExhausted {
        name: String,
        kind: &'static str,
        wanted: usize,
    },

    #[error("color sequence {input:?} is not a valid palette")]
    InvalidSequence {
        input: String,
        #[source]
        source: Box<MapError>,
    },

    #[error("color sequence {input:?} only has {got} colors, {wanted} needed")]
    SequenceTooShort {
        input: String,
        got: usize,
        wanted: usize,
    },

    #[error("no last-resort palette supports {wanted} colors")]
    NoLastResort { wanted: usize },
}

pub type Result<T> = std::result::Result<T, MapError>;
