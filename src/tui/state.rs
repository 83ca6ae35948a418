use crate::file_input::FileControl;
use crate::model::{AppEvent, Locale};
use crate::orchestrator::{PageSource, UiCommand};
use crate::submit::predict::ManualForm;
use crate::submit::upload::{UploadForm, UploadOutcome};
use crate::table::ResultsTable;
use crossterm::event::{KeyCode, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Results,
    Upload,
    Predict,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Results, Tab::Upload, Tab::Predict];

    pub fn index(self) -> usize {
        match self {
            Tab::Results => 0,
            Tab::Upload => 1,
            Tab::Predict => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Text input currently capturing keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Editing {
    Path,
    Field(usize),
}

/// What the UI loop should do after a key press.
#[derive(Debug)]
pub(crate) enum KeyAction {
    None,
    Send(UiCommand),
    Quit,
}

pub(crate) struct UiState {
    pub tab: Tab,
    pub show_help: bool,
    pub locale: Locale,
    pub info: String,

    pub results_source: Option<PageSource>,
    /// `None` until a page with a results table is loaded.
    pub table: Option<ResultsTable>,
    /// Column cursor for header activation.
    pub header_selected: usize,

    pub upload: UploadForm,
    pub manual: ManualForm,
    pub field_selected: usize,

    pub editing: Option<Editing>,
    pub input: String,
}

impl UiState {
    pub fn new(locale: Locale, upload_field: &str) -> Self {
        Self {
            tab: Tab::Results,
            show_help: false,
            locale,
            info: String::new(),
            results_source: None,
            table: None,
            header_selected: 0,
            upload: UploadForm::new(Some(FileControl::default()), upload_field, locale),
            manual: ManualForm::with_default_fields(locale),
            field_selected: 0,
            editing: None,
            input: String::new(),
        }
    }

    /// Apply a controller event. Every settle event re-enables its control.
    pub fn apply_event(&mut self, ev: AppEvent) {
        match ev {
            AppEvent::UploadSettled(outcome) => {
                self.upload.submit.settle();
                self.upload.apply(&outcome);
                match &outcome {
                    UploadOutcome::Navigate { target } => {
                        self.info = format!("Redirecting to {target}…");
                    }
                    UploadOutcome::Error(banner) => {
                        self.tab = Tab::Upload;
                        if banner.focus_file_control {
                            self.start_editing(Editing::Path);
                        }
                    }
                }
            }
            AppEvent::PredictSettled(panel) => {
                self.manual.submit.settle();
                self.manual.show(panel);
                self.tab = Tab::Predict;
            }
            AppEvent::PageLoaded { source, store } => {
                self.info = match &store {
                    Some(s) => format!("Loaded {} rows from {}", s.len(), source.describe()),
                    None => format!("No results table in {}", source.describe()),
                };
                self.table = store.map(|s| ResultsTable::new(s, self.locale));
                self.header_selected = self
                    .table
                    .as_ref()
                    .and_then(|t| t.store().sortable_column)
                    .unwrap_or(0);
                self.results_source = Some(source);
                self.tab = Tab::Results;
            }
            AppEvent::Info(msg) => self.info = msg,
        }
    }

    fn start_editing(&mut self, editing: Editing) {
        self.input = match &editing {
            Editing::Path => self
                .upload
                .file
                .as_ref()
                .and_then(|f| f.selected())
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            Editing::Field(i) => self
                .manual
                .fields
                .get(*i)
                .map(|(_, v)| v.clone())
                .unwrap_or_default(),
        };
        self.editing = Some(editing);
    }

    fn commit_input(&mut self) {
        let value = std::mem::take(&mut self.input);
        match self.editing.take() {
            Some(Editing::Path) => {
                if value.trim().is_empty() {
                    self.upload.clear_file();
                } else {
                    self.upload.select_file(value.trim());
                }
            }
            Some(Editing::Field(i)) => {
                if let Some(name) = self.manual.fields.get(i).map(|(n, _)| n.clone()) {
                    self.manual.set(&name, value);
                }
            }
            None => {}
        }
    }

    fn submit_upload(&mut self) -> KeyAction {
        if !self.upload.submit.is_enabled() {
            return KeyAction::None;
        }
        if let Err(e) = self.upload.preflight() {
            self.upload.reject(&e);
            if self
                .upload
                .banner
                .as_ref()
                .is_some_and(|b| b.focus_file_control)
            {
                self.start_editing(Editing::Path);
            }
            return KeyAction::None;
        }
        self.upload.submit.begin();
        KeyAction::Send(UiCommand::SubmitUpload(self.upload.clone()))
    }

    fn submit_manual(&mut self) -> KeyAction {
        if !self.manual.submit.begin() {
            return KeyAction::None;
        }
        KeyAction::Send(UiCommand::SubmitManual(self.manual.payload()))
    }

    pub fn handle_key(&mut self, modifiers: KeyModifiers, code: KeyCode) -> KeyAction {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        if self.editing.is_some() {
            match code {
                KeyCode::Enter => self.commit_input(),
                KeyCode::Esc => {
                    self.editing = None;
                    self.input.clear();
                }
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            }
            return KeyAction::None;
        }

        if self.show_help {
            self.show_help = false;
            return KeyAction::None;
        }

        match code {
            KeyCode::Char('q') => return KeyAction::Quit,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab => self.tab = self.tab.next(),
            KeyCode::BackTab => self.tab = self.tab.prev(),
            _ => match self.tab {
                Tab::Results => return self.handle_results_key(code),
                Tab::Upload => return self.handle_upload_key(code),
                Tab::Predict => return self.handle_predict_key(code),
            },
        }
        KeyAction::None
    }

    fn handle_results_key(&mut self, code: KeyCode) -> KeyAction {
        if let KeyCode::Char('r') = code {
            return match self.results_source.as_ref() {
                Some(src) => KeyAction::Send(UiCommand::Load(src.clone())),
                None => KeyAction::None,
            };
        }
        let Some(table) = self.table.as_mut() else {
            return KeyAction::None;
        };
        let columns = table.store().columns.len();
        match code {
            KeyCode::Left | KeyCode::Char('h') => table.previous(),
            KeyCode::Right | KeyCode::Char('l') => table.next(),
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                table.activate_button(index);
            }
            KeyCode::Char('[') => self.header_selected = self.header_selected.saturating_sub(1),
            KeyCode::Char(']') => {
                self.header_selected = (self.header_selected + 1).min(columns.saturating_sub(1))
            }
            KeyCode::Enter => table.activate_header(self.header_selected),
            KeyCode::Char('s') => {
                if let Some(col) = table.store().sortable_column {
                    table.activate_header(col);
                }
            }
            _ => {}
        }
        KeyAction::None
    }

    fn handle_upload_key(&mut self, code: KeyCode) -> KeyAction {
        match code {
            KeyCode::Char('o') | KeyCode::Char('e') => self.start_editing(Editing::Path),
            KeyCode::Char('x') => self.upload.clear_file(),
            KeyCode::Enter | KeyCode::Char('u') => return self.submit_upload(),
            _ => {}
        }
        KeyAction::None
    }

    fn handle_predict_key(&mut self, code: KeyCode) -> KeyAction {
        let count = self.manual.fields.len();
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.field_selected = self.field_selected.saturating_sub(1)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.field_selected + 1 < count {
                    self.field_selected += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                if count > 0 {
                    self.start_editing(Editing::Field(self.field_selected));
                }
            }
            KeyCode::Char('p') => return self.submit_manual(),
            _ => {}
        }
        KeyAction::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submit::predict::PredictionPanel;
    use crate::submit::upload::ErrorBanner;
    use crate::table::RowStore;

    fn key(state: &mut UiState, code: KeyCode) -> KeyAction {
        state.handle_key(KeyModifiers::NONE, code)
    }

    fn type_text(state: &mut UiState, text: &str) {
        for c in text.chars() {
            key(state, KeyCode::Char(c));
        }
    }

    #[test]
    fn upload_without_file_focuses_picker_and_sends_nothing() {
        let mut s = UiState::new(Locale::En, "csv_file");
        s.tab = Tab::Upload;
        assert!(matches!(key(&mut s, KeyCode::Char('u')), KeyAction::None));
        assert_eq!(s.upload.banner.as_ref().unwrap().message, "Please select a CSV file.");
        assert_eq!(s.editing, Some(Editing::Path));
        assert!(s.upload.submit.is_enabled());
    }

    #[test]
    fn picking_a_file_clears_banner_and_submit_goes_in_flight() {
        let mut s = UiState::new(Locale::En, "csv_file");
        s.tab = Tab::Upload;
        key(&mut s, KeyCode::Char('u'));
        type_text(&mut s, "data.csv");
        key(&mut s, KeyCode::Enter);
        assert!(s.upload.banner.is_none());

        let action = key(&mut s, KeyCode::Char('u'));
        assert!(matches!(action, KeyAction::Send(UiCommand::SubmitUpload(_))));
        assert!(!s.upload.submit.is_enabled());
        assert_eq!(s.upload.submit.label(), "Processing…");
        // Disabled control swallows the second submit.
        assert!(matches!(key(&mut s, KeyCode::Char('u')), KeyAction::None));

        s.apply_event(AppEvent::UploadSettled(UploadOutcome::Error(ErrorBanner {
            message: "Missing column".into(),
            focus_file_control: false,
        })));
        assert!(s.upload.submit.is_enabled());
        assert_eq!(s.upload.submit.label(), "Upload");
        assert_eq!(s.upload.banner.as_ref().unwrap().message, "Missing column");
    }

    #[test]
    fn manual_predict_cycle() {
        let mut s = UiState::new(Locale::En, "csv_file");
        s.tab = Tab::Predict;
        key(&mut s, KeyCode::Enter);
        type_text(&mut s, "14");
        key(&mut s, KeyCode::Enter);
        assert_eq!(s.manual.fields[0], ("anxiety_level".to_string(), "14".to_string()));

        match key(&mut s, KeyCode::Char('p')) {
            KeyAction::Send(UiCommand::SubmitManual(p)) => {
                assert_eq!(p.get_text("anxiety_level"), Some("14"))
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!s.manual.submit.is_enabled());

        s.tab = Tab::Results;
        s.apply_event(AppEvent::PredictSettled(PredictionPanel::Error {
            message: "try again".into(),
        }));
        assert!(s.manual.submit.is_enabled());
        assert_eq!(s.tab, Tab::Predict);
        assert!(s.manual.panel.is_some());
    }

    #[test]
    fn results_keys_drive_the_table() {
        let mut s = UiState::new(Locale::En, "csv_file");
        s.apply_event(AppEvent::PageLoaded {
            source: PageSource::Local("results.html".into()),
            store: Some(crate::table::store_with_levels(&vec![0; 50])),
        });
        assert_eq!(s.header_selected, 2);
        key(&mut s, KeyCode::Right);
        assert_eq!(s.table.as_ref().unwrap().current_page(), 2);
        key(&mut s, KeyCode::Char('4'));
        assert_eq!(s.table.as_ref().unwrap().current_page(), 4);
        key(&mut s, KeyCode::Char('s'));
        assert_eq!(s.table.as_ref().unwrap().current_page(), 1);

        key(&mut s, KeyCode::Char('['));
        key(&mut s, KeyCode::Enter);
        assert_eq!(
            s.table.as_ref().unwrap().sort_state(),
            crate::table::SortState::Ascending
        );

        match key(&mut s, KeyCode::Char('r')) {
            KeyAction::Send(UiCommand::Load(source)) => {
                assert_eq!(source, PageSource::Local("results.html".into()))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reload_after_redirect_fetches_from_server() {
        let mut s = UiState::new(Locale::En, "csv_file");
        s.apply_event(AppEvent::PageLoaded {
            source: PageSource::Remote("/results/42".into()),
            store: Some(crate::table::store_with_levels(&[1, 2])),
        });
        assert_eq!(s.info, "Loaded 2 rows from /results/42");
        match key(&mut s, KeyCode::Char('r')) {
            KeyAction::Send(UiCommand::Load(source)) => {
                assert_eq!(source, PageSource::Remote("/results/42".into()))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn page_without_table_is_silent() {
        let mut s = UiState::new(Locale::En, "csv_file");
        s.apply_event(AppEvent::PageLoaded {
            source: PageSource::Remote("/".into()),
            store: None,
        });
        assert!(s.table.is_none());
        key(&mut s, KeyCode::Right);
        s.apply_event(AppEvent::PageLoaded {
            source: PageSource::Remote("/r".into()),
            store: Some(RowStore::default()),
        });
        assert!(!s.table.as_ref().unwrap().chrome().visible);
    }
}
