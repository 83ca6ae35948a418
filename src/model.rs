use crate::orchestrator::PageSource;
use crate::submit::predict::PredictionPanel;
use crate::submit::upload::UploadOutcome;
use crate::table::RowStore;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Typed client settings derived from the command line.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Per-request bound. `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
    pub locale: Locale,
    pub upload_field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    /// Pagination info line: `{start}-{end} of {total}`.
    pub fn page_info(self, start: usize, end: usize, total: usize) -> String {
        match self {
            Locale::En => format!("Showing {start}-{end} of {total} records"),
            Locale::Ru => format!("Показано {start}-{end} из {total} записей"),
        }
    }

    pub fn busy_label(self) -> &'static str {
        match self {
            Locale::En => "Processing…",
            Locale::Ru => "Обработка...",
        }
    }

    pub fn upload_label(self) -> &'static str {
        match self {
            Locale::En => "Upload",
            Locale::Ru => "Загрузить",
        }
    }

    pub fn predict_label(self) -> &'static str {
        match self {
            Locale::En => "Predict",
            Locale::Ru => "Предсказать",
        }
    }

    pub fn message(self, msg: Message) -> &'static str {
        use Message::*;
        match (self, msg) {
            (Locale::En, NoFileSelected) => "Please select a CSV file.",
            (Locale::Ru, NoFileSelected) => "Пожалуйста, выберите CSV файл.",
            (Locale::En, InvalidFileType) => "Invalid file type. Please upload a .csv file.",
            (Locale::Ru, InvalidFileType) => {
                "Неверный тип файла. Пожалуйста, загрузите файл .csv."
            }
            (Locale::En, FormUnavailable) => "The upload form is unavailable.",
            (Locale::Ru, FormUnavailable) => "Форма загрузки недоступна.",
            (Locale::En, UnexpectedResponse) => "Unexpected response from server.",
            (Locale::Ru, UnexpectedResponse) => "Неожиданный ответ от сервера.",
            (Locale::En, UploadFailed) => "An error occurred while processing the file.",
            (Locale::Ru, UploadFailed) => "Произошла ошибка при обработке файла.",
            (Locale::En, PredictFailed) => {
                "An error occurred while processing the request. Please try again."
            }
            (Locale::Ru, PredictFailed) => {
                "Произошла ошибка при обработке запроса. Пожалуйста, попробуйте еще раз."
            }
            (Locale::En, FilePlaceholder) => "Choose a CSV file",
            (Locale::Ru, FilePlaceholder) => "Выберите CSV файл",
        }
    }
}

/// Fixed user-facing strings, worded per [`Locale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    NoFileSelected,
    InvalidFileType,
    FormUnavailable,
    UnexpectedResponse,
    UploadFailed,
    PredictFailed,
    FilePlaceholder,
}

/// Severity class predicted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Map a raw class label. Anything outside {0,1,2} is reported as `Low`.
    pub fn from_prediction(prediction: i64) -> Self {
        match prediction {
            1 => Severity::Medium,
            2 => Severity::High,
            _ => Severity::Low,
        }
    }

    pub fn color_hex(self) -> &'static str {
        match self {
            Severity::Low => "#10b981",
            Severity::Medium => "#f59e0b",
            Severity::High => "#ef4444",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Severity::Low => (0x10, 0xb9, 0x81),
            Severity::Medium => (0xf5, 0x9e, 0x0b),
            Severity::High => (0xef, 0x44, 0x44),
        }
    }

    pub fn label(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, Severity::Low) => "Low",
            (Locale::En, Severity::Medium) => "Medium",
            (Locale::En, Severity::High) => "High",
            (Locale::Ru, Severity::Low) => "Низкий",
            (Locale::Ru, Severity::Medium) => "Средний",
            (Locale::Ru, Severity::High) => "Высокий",
        }
    }

    pub fn headline(self, locale: Locale) -> String {
        match locale {
            Locale::En => format!("{} stress level", self.label(locale)),
            Locale::Ru => format!("{} уровень стресса", self.label(locale)),
        }
    }

    pub fn description(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, Severity::Low) => "Stress level is within the normal range.",
            (Locale::En, Severity::Medium) => {
                "Moderate stress level. Pay attention to the factors that affect stress."
            }
            (Locale::En, Severity::High) => {
                "High stress level. Seek support and take steps to reduce stress."
            }
            (Locale::Ru, Severity::Low) => "Уровень стресса находится в пределах нормы.",
            (Locale::Ru, Severity::Medium) => {
                "Умеренный уровень стресса. Рекомендуется обратить внимание на факторы, влияющие на стресс."
            }
            (Locale::Ru, Severity::High) => {
                "Высокий уровень стресса. Рекомендуется обратиться за поддержкой и принять меры по снижению стресса."
            }
        }
    }
}

/// Which form a submission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormKind {
    Upload,
    Manual,
}

impl FormKind {
    /// Value of the hidden `form_type` field the server dispatches on.
    pub fn form_type(self) -> &'static str {
        match self {
            FormKind::Upload => "upload",
            FormKind::Manual => "manual",
        }
    }
}

/// Events emitted by the controller and consumed by presentation layers.
#[derive(Debug, Clone)]
pub(crate) enum AppEvent {
    UploadSettled(UploadOutcome),
    PredictSettled(PredictionPanel),
    /// A results page finished loading. `None` means the page carried no results table.
    PageLoaded {
        source: PageSource,
        store: Option<RowStore>,
    },
    Info(String),
}
