use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("Invalid rank: {0}")]
    InvalidRank(char),

    #[error("Invalid suit: {0}")]
    InvalidSuit(char),

    #[error("Invalid card notation: {0}")]
    InvalidCardNotation(String),

    #[error("Invalid board notation: {0}")]
    InvalidBoardNotation(String),

    #[error("Invalid combo notation: {0}")]
    InvalidComboNotation(String),

    #[error("Spot not found or not ready: {0}")]
    SpotNotFound(String),

    #[error("No solved spots available")]
    NoReadySpots,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Solver result not available for spot: {0}")]
    ResultUnavailable(String),

    #[error("No valid combos in range after removing dead cards")]
    EmptyExpansion,

    #[error("Could not navigate to a playable node from the tree root")]
    RootUnreachable,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TrainerResult<T> = Result<T, TrainerError>;
