//! Error classification with localized user-facing messaging.
//!
//! Raw gateway and builder errors never reach the UI layer; they pass through
//! [`FormattedError::from_error`], which classifies them into the fixed
//! [`ErrorKind`] taxonomy and attaches the localized message, suggestion and
//! retry guidance. The user-facing strings are an interface contract and must
//! not be rephrased.

use serde::Serialize;

use crate::client::ClientError;

/// Flat error taxonomy surfaced to the collaborator layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    SearchFailed,
    FetchFailed,
    InvalidFilter,
    NetworkError,
    TimeoutError,
    NotFound,
    ServerError,
    ValidationError,
    UnknownError,
}

impl ErrorKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SearchFailed => "SEARCH_FAILED",
            ErrorKind::FetchFailed => "FETCH_FAILED",
            ErrorKind::InvalidFilter => "INVALID_FILTER",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::TimeoutError => "TIMEOUT_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ServerError => "SERVER_ERROR",
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Fixed localized user-facing message.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::SearchFailed => "la ricerca non può essere completata.",
            ErrorKind::FetchFailed => "il recupero è fallito.",
            ErrorKind::InvalidFilter => "il filtro fornito non è valido.",
            ErrorKind::NetworkError => "si è verificato un errore di rete.",
            ErrorKind::TimeoutError => "la richiesta è scaduta.",
            ErrorKind::NotFound => "l'elemento richiesto non è stato trovato.",
            ErrorKind::ServerError => "si è verificato un errore del server.",
            ErrorKind::ValidationError => "si è verificato un errore di convalida.",
            ErrorKind::UnknownError => "si è verificato un errore imprevisto.",
        }
    }

    /// Fixed localized actionable suggestion.
    pub fn suggestion(&self) -> &'static str {
        match self {
            ErrorKind::NetworkError => "Controlla la tua connessione internet e riprova",
            ErrorKind::TimeoutError => {
                "La richiesta sta impiegando troppo tempo. Riprova tra qualche istante"
            }
            ErrorKind::NotFound => "La risorsa richiesta non esiste",
            ErrorKind::ServerError => "Il server sta riscontrando problemi. Riprova più tardi",
            ErrorKind::ValidationError => "Verifica i parametri di ricerca e riprova",
            ErrorKind::InvalidFilter => "Alcuni filtri non sono validi. Modifica la ricerca",
            ErrorKind::SearchFailed => "Prova a modificare i criteri di ricerca",
            ErrorKind::FetchFailed => "Impossibile caricare i dati. Riprova",
            ErrorKind::UnknownError => {
                "Riprova o contatti il supporto al numero 666-111-000"
            }
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classified, retry-annotated error ready for the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,

    /// Localized user-facing message, fixed per kind.
    pub message: String,

    /// Technical details from the underlying error, for logs and debugging.
    pub details: Option<String>,

    pub status_code: Option<u16>,

    /// Whether re-issuing the same request is expected to plausibly succeed.
    pub is_retryable: bool,
}

impl FormattedError {
    /// Build a formatted error of a known kind.
    pub fn new(kind: ErrorKind, details: Option<String>, status_code: Option<u16>) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
            details,
            status_code,
            is_retryable: is_retryable(kind, status_code),
        }
    }

    /// Classify a gateway or builder error.
    pub fn from_error(error: &ClientError) -> Self {
        let status_code = error.status_code();
        let kind = classify_error(error, status_code);
        Self::new(kind, Some(error.to_string()), status_code)
    }

    /// The fixed localized suggestion for this error's kind.
    pub fn suggestion(&self) -> &'static str {
        self.kind.suggestion()
    }
}

const NETWORK_PATTERNS: [&str; 3] = ["Failed to fetch", "Network request failed", "NetworkError"];
const TIMEOUT_PATTERNS: [&str; 3] = ["timeout", "timed out", "aborted"];
const VALIDATION_PATTERNS: [&str; 3] = ["deve essere", "dev'essere", "Contenuto mancante"];

/// Classify an error into the taxonomy.
///
/// Precedence is part of the contract: network patterns, then timeout/abort,
/// then validation, then HTTP status (404, other 4xx, 5xx), then
/// search-shaped and fetch-shaped messages, then unknown. The typed variant
/// is consulted first for each of the first three steps; the message
/// patterns remain for errors that arrive stringly.
pub fn classify_error(error: &ClientError, status_code: Option<u16>) -> ErrorKind {
    let message = error.to_string();

    if matches!(error, ClientError::Network(_)) || matches_any(&message, &NETWORK_PATTERNS) {
        return ErrorKind::NetworkError;
    }

    if matches!(error, ClientError::Timeout(_) | ClientError::Aborted)
        || matches_any(&message, &TIMEOUT_PATTERNS)
    {
        return ErrorKind::TimeoutError;
    }

    if matches!(error, ClientError::Validation(_)) || matches_any(&message, &VALIDATION_PATTERNS) {
        return ErrorKind::ValidationError;
    }

    if let Some(status) = status_code {
        if status == 404 {
            return ErrorKind::NotFound;
        }
        if (400..500).contains(&status) {
            return ErrorKind::InvalidFilter;
        }
        if (500..600).contains(&status) {
            return ErrorKind::ServerError;
        }
    }

    if message.contains("search") || message.contains("ricerca") {
        return ErrorKind::SearchFailed;
    }

    if message.contains("fetch") || message.contains("load") {
        return ErrorKind::FetchFailed;
    }

    ErrorKind::UnknownError
}

fn matches_any(message: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|pattern| message.contains(pattern))
}

/// Network failures and timeouts are always worth retrying; server-side
/// trouble (5xx) and throttling (429) usually clear up on their own.
fn is_retryable(kind: ErrorKind, status_code: Option<u16>) -> bool {
    if matches!(kind, ErrorKind::NetworkError | ErrorKind::TimeoutError) {
        return true;
    }
    match status_code {
        Some(status) if (500..600).contains(&status) => true,
        Some(429) => true,
        _ => false,
    }
}

/// Build and classify an error from an HTTP response's parts.
pub fn format_http_error(status: u16, status_text: &str, body_text: &str) -> FormattedError {
    let details = if body_text.is_empty() {
        status_text.to_string()
    } else {
        body_text.to_string()
    };
    let error = ClientError::Http {
        status,
        status_text: status_text.to_string(),
        details,
    };
    FormattedError::from_error(&error)
}

/// Record a formatted error under a caller-supplied context tag.
///
/// Side effect only; never fails and returns nothing.
pub fn log_error(error: &FormattedError, context: &str) {
    tracing::error!(
        context,
        kind = error.kind.as_str(),
        message = %error.message,
        details = error.details.as_deref().unwrap_or(""),
        status_code = error.status_code,
        is_retryable = error.is_retryable,
        "artifact error"
    );
}
