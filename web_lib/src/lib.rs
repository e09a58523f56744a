use statebench::{
    Kind, Session, determinize,
    loader::{self, Context, jff, json},
    presets, simulate, validate,
};

use wasm_bindgen::prelude::{JsError, wasm_bindgen};

/// Where the current document survives page reloads.
pub const STORAGE_KEY: &str = "automatonSpec:v1";

#[wasm_bindgen]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
#[derive(Clone, Copy)]
pub enum LogLevel {
    Info = "info",
    Warning = "warning",
    Error = "error",
    Help = "help",
}

#[wasm_bindgen(getter_with_clone)]
#[derive(Clone)]
pub struct ImportLog {
    pub level: LogLevel,
    pub message: String,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

#[wasm_bindgen(getter_with_clone)]
pub struct ImportResult {
    pub log: Vec<ImportLog>,
    pub ansi_log: String,
    /// Set when the document was rejected; the workspace is then unchanged.
    pub error: Option<String>,
}

fn storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// A [`Session`] bound to the browser's local storage.
#[wasm_bindgen]
pub struct Workspace {
    session: Session,
}

impl Workspace {
    fn persist(&self) {
        if let Some(storage) = storage()
            && let Ok(text) = json::to_json(self.session.current())
        {
            _ = storage.set_item(STORAGE_KEY, &text);
        }
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Workspace {
    /// Restores the stored document, falling back to the default one when
    /// nothing usable is stored.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Workspace {
        let stored = storage()
            .and_then(|storage| storage.get_item(STORAGE_KEY).ok().flatten())
            .and_then(|text| json::from_json(&text).ok());
        Workspace {
            session: stored.map(Session::new).unwrap_or_default(),
        }
    }

    pub fn document(&self) -> Result<String, JsError> {
        Ok(json::to_json_pretty(self.session.current())?)
    }

    pub fn set_document(&mut self, document: &str) -> Result<(), JsError> {
        self.session.try_replace(json::from_json(document))?;
        self.persist();
        Ok(())
    }

    /// Switches the kind, keeping states and alphabet but not transitions.
    pub fn set_type(&mut self, kind: &str) -> Result<(), JsError> {
        let kind: Kind = kind.parse().map_err(|err: String| JsError::new(&err))?;
        self.session.update(|spec| spec.retyped(kind));
        self.persist();
        Ok(())
    }

    pub fn load_preset(&mut self, name: &str) -> Result<(), JsError> {
        let spec = presets::by_name(name)
            .ok_or_else(|| JsError::new(&format!("no preset named {name:?}")))?;
        self.session.replace(spec);
        self.persist();
        Ok(())
    }

    pub fn preset_names() -> Vec<String> {
        presets::all()
            .into_iter()
            .map(|(name, _)| name.to_owned())
            .collect()
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.session.undo();
        if moved {
            self.persist();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.session.redo();
        if moved {
            self.persist();
        }
        moved
    }

    #[wasm_bindgen(getter)]
    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    #[wasm_bindgen(getter)]
    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.persist();
    }

    /// Runs the current document on `input`; the result is the JSON form of
    /// the verdict and every visited configuration.
    pub fn simulate(&self, input: &str) -> Result<String, JsError> {
        let run = simulate(self.session.current(), input)?;
        Ok(serde_json::to_string(&run)?)
    }

    /// Subset construction of the current NFA, with its trace.
    pub fn determinize(&self) -> Result<String, JsError> {
        let result = determinize(self.session.current())?;
        Ok(serde_json::to_string(&result)?)
    }

    /// Replaces the current NFA with its determinized DFA.
    pub fn adopt_determinized(&mut self) -> Result<(), JsError> {
        let dfa = determinize(self.session.current())?.dfa;
        self.session.replace(dfa);
        self.persist();
        Ok(())
    }

    pub fn validate(&self) -> Vec<String> {
        validate(self.session.current())
    }

    pub fn export_jff(&self) -> Result<String, JsError> {
        Ok(jff::export(self.session.current())?)
    }

    pub fn import_jff(&mut self, src: &str) -> ImportResult {
        let mut ctx = Context::new(src);
        let result = jff::load(&mut ctx);

        use std::fmt::Write;
        let ansi_log = ctx.logs_display().fold(String::new(), |mut s, e| {
            _ = write!(&mut s, "{e}");
            s
        });
        let log = ctx
            .into_logs()
            .into_entries()
            .map(|e| ImportLog {
                level: match e.level {
                    loader::log::LogLevel::Info => LogLevel::Info,
                    loader::log::LogLevel::Warning => LogLevel::Warning,
                    loader::log::LogLevel::Error => LogLevel::Error,
                    loader::log::LogLevel::Help => LogLevel::Help,
                },
                message: e.describe(),
                start: e.span.map(|span| utf16_offset(src, span.0)),
                end: e.span.map(|span| utf16_offset(src, span.1)),
            })
            .collect();

        let error = match self.session.try_replace(result) {
            Ok(()) => {
                self.persist();
                None
            }
            Err(err) => Some(err.to_string()),
        };
        ImportResult {
            log,
            ansi_log,
            error,
        }
    }
}

/// Editors index text in UTF-16 code units.
fn utf16_offset(src: &str, utf8: usize) -> usize {
    src.get(..utf8)
        .unwrap_or(src)
        .chars()
        .map(char::len_utf16)
        .sum()
}
