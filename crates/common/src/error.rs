/// Saju report pipeline error types
#[derive(Debug, thiserror::Error)]
pub enum SajuError {
    /// Malformed or impossible date
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Leap month claim that the lunar table does not support
    #[error("Invalid leap month: {0}")]
    InvalidLeapMonth(String),

    /// The month has a leap variant and the caller has to say which one
    #[error("Leap month confirmation required: lunar {year}-{month:02} has a leap variant")]
    LeapMonthConfirmationRequired { year: i32, month: u32 },

    /// Unrecognized birth time slot token
    #[error("Invalid time slot token: {0}")]
    InvalidTimeSlotToken(String),

    /// Date outside the bundled lunisolar table
    #[error("Calendar out of range: {0}")]
    CalendarOutOfRange(String),

    /// Chart could not be derived for the requested date
    #[error("Pillar lookup failure: {0}")]
    PillarLookupFailure(String),

    /// Persona slug missing from the voice profile table
    #[error("Unknown persona: {0}")]
    UnknownPersona(String),

    /// Report contract or rule table is malformed
    #[error("Contract error: {0}")]
    Contract(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Text generator error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Generator refused the request (4xx other than auth and rate limiting)
    #[error("Generator rejected request: {0}")]
    GeneratorRejected(String),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Job cancelled before completion
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SajuError {
    /// Create invalid date error
    pub fn invalid_date<S: Into<String>>(msg: S) -> Self {
        Self::InvalidDate(msg.into())
    }

    /// Create invalid leap month error
    pub fn invalid_leap_month<S: Into<String>>(msg: S) -> Self {
        Self::InvalidLeapMonth(msg.into())
    }

    /// Create invalid time slot error
    pub fn invalid_time_slot<S: Into<String>>(token: S) -> Self {
        Self::InvalidTimeSlotToken(token.into())
    }

    /// Create calendar range error
    pub fn out_of_range<S: Into<String>>(msg: S) -> Self {
        Self::CalendarOutOfRange(msg.into())
    }

    /// Create pillar lookup error
    pub fn pillar_lookup<S: Into<String>>(msg: S) -> Self {
        Self::PillarLookupFailure(msg.into())
    }

    /// Create contract error
    pub fn contract<S: Into<String>>(msg: S) -> Self {
        Self::Contract(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create LLM error
    pub fn llm<S: Into<String>>(msg: S) -> Self {
        Self::Llm(msg.into())
    }

    /// Create generator rejection error
    pub fn generator_rejected<S: Into<String>>(msg: S) -> Self {
        Self::GeneratorRejected(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create cancellation error
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Create internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

impl SajuError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDate(_) => "INVALID_DATE",
            Self::InvalidLeapMonth(_) => "INVALID_LEAP_MONTH",
            Self::LeapMonthConfirmationRequired { .. } => "LEAP_MONTH_CONFIRM_REQUIRED",
            Self::InvalidTimeSlotToken(_) => "INVALID_TIME_SLOT",
            Self::CalendarOutOfRange(_) => "CALENDAR_OUT_OF_RANGE",
            Self::PillarLookupFailure(_) => "PILLAR_LOOKUP_FAILURE",
            Self::UnknownPersona(_) => "UNKNOWN_PERSONA",
            Self::Contract(_) => "CONTRACT_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Llm(_) => "LLM_ERROR",
            Self::GeneratorRejected(_) => "GENERATOR_REJECTED",
            Self::Network(_) => "NETWORK_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Cancelled(_) => "CANCELLED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Errors the user can fix by correcting the birth input.
    /// Never retried automatically.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            Self::InvalidDate(_)
                | Self::InvalidLeapMonth(_)
                | Self::LeapMonthConfirmationRequired { .. }
                | Self::InvalidTimeSlotToken(_)
                | Self::InvalidInput(_)
        )
    }

    /// Failures of the external generator that are worth retrying with the same request
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Llm(_) | Self::Network(_))
    }
}
