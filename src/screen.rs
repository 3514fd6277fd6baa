use std::sync::mpsc;
use std::sync::Arc;

use crate::dictionary::{DictionaryImporter, DictionaryKind, DumpRequester};
use crate::i18n;
use crate::prefs::PrefStore;
use crate::slider::{DurationSliderProxy, ScaleSliderProxy, SliderValueProxy};

pub const PREF_DEBUG_MODE: &str = "debug_mode";
pub const PREF_FORCE_NON_DISTINCT_MULTITOUCH: &str = "force_non_distinct_multitouch";
pub const PREF_USABILITY_STUDY_MODE: &str = "usability_study_mode";
pub const PREF_SHOW_INPUT_STATS: &str = "show_input_stats";
pub const PREF_KEY_PREVIEW_SHOW_UP_DURATION: &str = "key_preview_show_up_duration";
pub const PREF_KEY_PREVIEW_DISMISS_DURATION: &str = "key_preview_dismiss_duration";
pub const PREF_KEY_PREVIEW_SHOW_UP_START_SCALE: &str = "key_preview_show_up_start_scale";
pub const PREF_KEY_PREVIEW_DISMISS_END_SCALE: &str = "key_preview_dismiss_end_scale";
pub const PREF_IMPORT_EXTERNAL_DICTIONARY: &str = "import_external_dictionary";
pub const PREF_DUMP_CONTACTS_DICT: &str = "dump_contacts_dict";
pub const PREF_DUMP_USER_DICT: &str = "dump_user_dict";
pub const PREF_DUMP_USER_HISTORY_DICT: &str = "dump_user_history_dict";
pub const PREF_DUMP_PERSONALIZATION_DICT: &str = "dump_personalization_dict";

// The input-stats row ships hidden; internal builds flip this on.
const SHOW_INPUT_STATS_ROW: bool = false;

/// Built-in values for the key-preview animation preferences, used when
/// no entry is stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPreviewAnimationDefaults {
    pub show_up_duration_ms: i32,
    pub dismiss_duration_ms: i32,
    pub show_up_start_scale: f32,
    pub dismiss_end_scale: f32,
}

impl Default for KeyPreviewAnimationDefaults {
    fn default() -> Self {
        Self {
            show_up_duration_ms: 100,
            dismiss_duration_ms: 70,
            show_up_start_scale: 0.7,
            dismiss_end_scale: 0.8,
        }
    }
}

/// Restart seam. The debug screen only decides *that* the input service
/// must restart; carrying it out is the embedder's concern.
pub trait ServiceRestarter {
    fn restart_input_service(&self);
}

/// Title and summary shown for a screen row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowText {
    pub title: String,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Checkbox,
    Slider,
    Action,
}

struct Row {
    key: &'static str,
    kind: RowKind,
    visible: bool,
}

impl Row {
    fn new(key: &'static str, kind: RowKind) -> Self {
        Self {
            key,
            kind,
            visible: true,
        }
    }
}

fn default_rows() -> Vec<Row> {
    vec![
        Row::new(PREF_DEBUG_MODE, RowKind::Checkbox),
        Row::new(PREF_USABILITY_STUDY_MODE, RowKind::Checkbox),
        Row::new(PREF_FORCE_NON_DISTINCT_MULTITOUCH, RowKind::Checkbox),
        Row {
            key: PREF_SHOW_INPUT_STATS,
            kind: RowKind::Checkbox,
            visible: SHOW_INPUT_STATS_ROW,
        },
        Row::new(PREF_IMPORT_EXTERNAL_DICTIONARY, RowKind::Action),
        Row::new(PREF_DUMP_CONTACTS_DICT, RowKind::Action),
        Row::new(PREF_DUMP_USER_DICT, RowKind::Action),
        Row::new(PREF_DUMP_USER_HISTORY_DICT, RowKind::Action),
        Row::new(PREF_DUMP_PERSONALIZATION_DICT, RowKind::Action),
        Row::new(PREF_KEY_PREVIEW_SHOW_UP_DURATION, RowKind::Slider),
        Row::new(PREF_KEY_PREVIEW_DISMISS_DURATION, RowKind::Slider),
        Row::new(PREF_KEY_PREVIEW_SHOW_UP_START_SCALE, RowKind::Slider),
        Row::new(PREF_KEY_PREVIEW_DISMISS_END_SCALE, RowKind::Slider),
    ]
}

fn dump_target(key: &str) -> Option<DictionaryKind> {
    match key {
        PREF_DUMP_CONTACTS_DICT => Some(DictionaryKind::Contacts),
        PREF_DUMP_USER_DICT => Some(DictionaryKind::User),
        PREF_DUMP_USER_HISTORY_DICT => Some(DictionaryKind::UserHistory),
        PREF_DUMP_PERSONALIZATION_DICT => Some(DictionaryKind::Personalization),
        _ => None,
    }
}

fn label_id(key: &str) -> Option<&'static str> {
    match key {
        PREF_DEBUG_MODE => Some("pref-debug-mode"),
        PREF_USABILITY_STUDY_MODE => Some("pref-usability-study-mode"),
        PREF_FORCE_NON_DISTINCT_MULTITOUCH => Some("pref-force-non-distinct-multitouch"),
        PREF_SHOW_INPUT_STATS => Some("pref-show-input-stats"),
        PREF_IMPORT_EXTERNAL_DICTIONARY => Some("pref-import-external-dictionary"),
        PREF_DUMP_CONTACTS_DICT => Some("pref-dump-contacts-dict"),
        PREF_DUMP_USER_DICT => Some("pref-dump-user-dict"),
        PREF_DUMP_USER_HISTORY_DICT => Some("pref-dump-user-history-dict"),
        PREF_DUMP_PERSONALIZATION_DICT => Some("pref-dump-personalization-dict"),
        PREF_KEY_PREVIEW_SHOW_UP_DURATION => Some("pref-key-preview-show-up-duration"),
        PREF_KEY_PREVIEW_DISMISS_DURATION => Some("pref-key-preview-dismiss-duration"),
        PREF_KEY_PREVIEW_SHOW_UP_START_SCALE => Some("pref-key-preview-show-up-start-scale"),
        PREF_KEY_PREVIEW_DISMISS_END_SCALE => Some("pref-key-preview-dismiss-end-scale"),
        _ => None,
    }
}

/// Controller for the developer settings screen.
///
/// Owns the row model and the restart flag, dispatches row clicks, and
/// reacts to preference changes delivered through the store's watch
/// channel. Rendering is up to the embedding UI.
pub struct DebugScreen {
    prefs: Arc<PrefStore>,
    defaults: KeyPreviewAnimationDefaults,
    dump_requester: Box<dyn DumpRequester>,
    importer: Box<dyn DictionaryImporter>,
    rows: Vec<Row>,
    changes: mpsc::Receiver<String>,
    debug_mode: bool,
    needs_restart: bool,
}

impl DebugScreen {
    pub fn new(
        prefs: Arc<PrefStore>,
        defaults: KeyPreviewAnimationDefaults,
        dump_requester: Box<dyn DumpRequester>,
        importer: Box<dyn DictionaryImporter>,
    ) -> Self {
        let changes = prefs.watch();
        let debug_mode = prefs.get_bool(PREF_DEBUG_MODE, false);
        Self {
            prefs,
            defaults,
            dump_requester,
            importer,
            rows: default_rows(),
            changes,
            debug_mode,
            needs_restart: false,
        }
    }

    pub fn prefs(&self) -> &Arc<PrefStore> {
        &self.prefs
    }

    pub fn needs_restart(&self) -> bool {
        self.needs_restart
    }

    /// Current state of a checkbox row.
    pub fn checkbox_state(&self, key: &str) -> bool {
        self.prefs.get_bool(key, false)
    }

    pub fn is_row_visible(&self, key: &str) -> bool {
        self.rows.iter().any(|r| r.key == key && r.visible)
    }

    /// Drop a row from the screen, e.g. when a build does not ship the
    /// matching control. Operations on its key silently do nothing.
    pub fn remove_row(&mut self, key: &str) {
        self.rows.retain(|r| r.key != key);
    }

    fn set_row_visible(&mut self, key: &str, visible: bool) {
        if let Some(row) = self.rows.iter_mut().find(|r| r.key == key) {
            row.visible = visible;
        }
    }

    /// Localized title for a row, `None` for keys this screen doesn't own.
    pub fn row_title(&self, key: &str) -> Option<String> {
        label_id(key).map(i18n::tr)
    }

    /// Title/summary of the debug-mode row. With debug mode off the row
    /// doubles as the version display (title = version, no summary).
    pub fn debug_mode_row_text(&self) -> RowText {
        let version = format!("{} {}", i18n::tr("label-version"), env!("CARGO_PKG_VERSION"));
        if self.debug_mode {
            RowText {
                title: i18n::tr("pref-debug-mode"),
                summary: version,
            }
        } else {
            RowText {
                title: version,
                summary: String::new(),
            }
        }
    }

    /// The usability-study row carries a standing researcher warning.
    pub fn usability_study_row_text(&self) -> RowText {
        RowText {
            title: i18n::tr("pref-usability-study-mode"),
            summary: i18n::tr("pref-usability-study-summary"),
        }
    }

    /// Value proxy for a slider row, `None` when the row is missing or
    /// the key has no slider.
    pub fn slider_proxy(&self, key: &str) -> Option<Box<dyn SliderValueProxy>> {
        let present = self
            .rows
            .iter()
            .any(|r| r.key == key && r.kind == RowKind::Slider);
        if !present {
            return None;
        }
        let d = &self.defaults;
        match key {
            PREF_KEY_PREVIEW_SHOW_UP_DURATION => Some(Box::new(DurationSliderProxy::new(
                self.prefs.clone(),
                d.show_up_duration_ms,
            ))),
            PREF_KEY_PREVIEW_DISMISS_DURATION => Some(Box::new(DurationSliderProxy::new(
                self.prefs.clone(),
                d.dismiss_duration_ms,
            ))),
            PREF_KEY_PREVIEW_SHOW_UP_START_SCALE => Some(Box::new(ScaleSliderProxy::new(
                self.prefs.clone(),
                d.show_up_start_scale,
            ))),
            PREF_KEY_PREVIEW_DISMISS_END_SCALE => Some(Box::new(ScaleSliderProxy::new(
                self.prefs.clone(),
                d.dismiss_end_scale,
            ))),
            _ => None,
        }
    }

    /// Dispatch a click on an action row. Returns whether the key was
    /// handled.
    pub fn handle_click(&mut self, key: &str) -> bool {
        if let Some(kind) = dump_target(key) {
            self.dump_requester.request_dump(kind);
            return true;
        }
        if key == PREF_IMPORT_EXTERNAL_DICTIONARY {
            self.importer.choose_and_install();
            self.needs_restart = true;
            return true;
        }
        false
    }

    /// Drain pending change notifications from the store.
    pub fn pump_changes(&mut self) {
        while let Ok(key) = self.changes.try_recv() {
            self.on_pref_changed(&key);
        }
    }

    pub fn on_pref_changed(&mut self, key: &str) {
        match key {
            PREF_DEBUG_MODE => {
                self.debug_mode = self.prefs.get_bool(PREF_DEBUG_MODE, false);
                self.set_row_visible(PREF_SHOW_INPUT_STATS, self.debug_mode);
                self.needs_restart = true;
                tracing::debug!(debug_mode = self.debug_mode, "debug mode toggled");
            }
            PREF_FORCE_NON_DISTINCT_MULTITOUCH => {
                self.needs_restart = true;
            }
            _ => {}
        }
    }

    /// Called when the screen goes away. Restarts the input service if a
    /// changed preference requires it.
    pub fn on_stop(&mut self, restarter: &dyn ServiceRestarter) {
        if self.needs_restart {
            tracing::info!("debug settings changed; restarting input service");
            restarter.restart_input_service();
            self.needs_restart = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{ChannelDumpRequester, DumpRequest};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::Receiver;

    struct NoopImporter;

    impl DictionaryImporter for NoopImporter {
        fn choose_and_install(&self) {}
    }

    struct CountingImporter(Arc<AtomicUsize>);

    impl DictionaryImporter for CountingImporter {
        fn choose_and_install(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingRestarter(AtomicUsize);

    impl ServiceRestarter for CountingRestarter {
        fn restart_input_service(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn screen_in(dir: &tempfile::TempDir) -> (DebugScreen, Receiver<DumpRequest>) {
        let prefs = Arc::new(PrefStore::open(dir.path().join("prefs.toml")).unwrap());
        let (requester, dump_rx) = ChannelDumpRequester::new();
        let screen = DebugScreen::new(
            prefs,
            KeyPreviewAnimationDefaults::default(),
            Box::new(requester),
            Box::new(NoopImporter),
        );
        (screen, dump_rx)
    }

    #[test]
    fn fresh_screen_needs_no_restart() {
        let dir = tempfile::tempdir().unwrap();
        let (screen, _rx) = screen_in(&dir);
        assert!(!screen.needs_restart());
        assert!(!screen.checkbox_state(PREF_DEBUG_MODE));
    }

    #[test]
    fn debug_mode_off_shows_version_as_title() {
        let dir = tempfile::tempdir().unwrap();
        let (screen, _rx) = screen_in(&dir);
        let text = screen.debug_mode_row_text();
        assert!(text.title.contains(env!("CARGO_PKG_VERSION")));
        assert!(text.summary.is_empty());
    }

    #[test]
    fn debug_mode_change_flips_title_and_flags_restart() {
        let dir = tempfile::tempdir().unwrap();
        let (mut screen, _rx) = screen_in(&dir);
        assert!(!screen.is_row_visible(PREF_SHOW_INPUT_STATS));

        screen.prefs().set_bool(PREF_DEBUG_MODE, true);
        screen.pump_changes();

        assert!(screen.needs_restart());
        assert!(screen.is_row_visible(PREF_SHOW_INPUT_STATS));
        let text = screen.debug_mode_row_text();
        assert_eq!(text.title, crate::i18n::tr("pref-debug-mode"));
        assert!(text.summary.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn multitouch_change_flags_restart() {
        let dir = tempfile::tempdir().unwrap();
        let (mut screen, _rx) = screen_in(&dir);
        screen.prefs().set_bool(PREF_FORCE_NON_DISTINCT_MULTITOUCH, true);
        screen.pump_changes();
        assert!(screen.needs_restart());
    }

    #[test]
    fn slider_writes_do_not_flag_restart() {
        let dir = tempfile::tempdir().unwrap();
        let (mut screen, _rx) = screen_in(&dir);
        let proxy = screen.slider_proxy(PREF_KEY_PREVIEW_SHOW_UP_DURATION).unwrap();
        proxy.write_value(200, PREF_KEY_PREVIEW_SHOW_UP_DURATION);
        screen.pump_changes();
        assert!(!screen.needs_restart());
    }

    #[test]
    fn dump_clicks_map_to_their_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        let (mut screen, rx) = screen_in(&dir);
        for (key, kind) in [
            (PREF_DUMP_CONTACTS_DICT, DictionaryKind::Contacts),
            (PREF_DUMP_USER_DICT, DictionaryKind::User),
            (PREF_DUMP_USER_HISTORY_DICT, DictionaryKind::UserHistory),
            (PREF_DUMP_PERSONALIZATION_DICT, DictionaryKind::Personalization),
        ] {
            assert!(screen.handle_click(key));
            assert_eq!(rx.try_recv().unwrap().kind, kind);
        }
        assert!(!screen.needs_restart());
    }

    #[test]
    fn import_click_runs_installer_and_flags_restart() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Arc::new(PrefStore::open(dir.path().join("prefs.toml")).unwrap());
        let (requester, _dump_rx) = ChannelDumpRequester::new();
        let installs = Arc::new(AtomicUsize::new(0));
        let mut screen = DebugScreen::new(
            prefs,
            KeyPreviewAnimationDefaults::default(),
            Box::new(requester),
            Box::new(CountingImporter(installs.clone())),
        );

        assert!(screen.handle_click(PREF_IMPORT_EXTERNAL_DICTIONARY));
        assert_eq!(installs.load(Ordering::SeqCst), 1);
        assert!(screen.needs_restart());
    }

    #[test]
    fn unknown_click_is_not_handled() {
        let dir = tempfile::tempdir().unwrap();
        let (mut screen, _rx) = screen_in(&dir);
        assert!(!screen.handle_click("some_other_pref"));
    }

    #[test]
    fn sliders_read_configured_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (screen, _rx) = screen_in(&dir);
        let d = KeyPreviewAnimationDefaults::default();

        let duration = screen.slider_proxy(PREF_KEY_PREVIEW_SHOW_UP_DURATION).unwrap();
        assert_eq!(
            duration.read_default_value(PREF_KEY_PREVIEW_SHOW_UP_DURATION),
            d.show_up_duration_ms
        );

        let scale = screen.slider_proxy(PREF_KEY_PREVIEW_SHOW_UP_START_SCALE).unwrap();
        assert_eq!(
            scale.read_default_value(PREF_KEY_PREVIEW_SHOW_UP_START_SCALE),
            (d.show_up_start_scale * 100.0).round() as i32
        );
    }

    #[test]
    fn removed_slider_row_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let (mut screen, _rx) = screen_in(&dir);
        screen.remove_row(PREF_KEY_PREVIEW_DISMISS_DURATION);
        assert!(screen.slider_proxy(PREF_KEY_PREVIEW_DISMISS_DURATION).is_none());
        // Checkbox keys never hand out slider proxies either.
        assert!(screen.slider_proxy(PREF_DEBUG_MODE).is_none());
    }

    #[test]
    fn on_stop_restarts_only_when_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let (mut screen, _rx) = screen_in(&dir);
        let restarter = CountingRestarter(AtomicUsize::new(0));

        screen.on_stop(&restarter);
        assert_eq!(restarter.0.load(Ordering::SeqCst), 0);

        screen.prefs().set_bool(PREF_DEBUG_MODE, true);
        screen.pump_changes();
        screen.on_stop(&restarter);
        assert_eq!(restarter.0.load(Ordering::SeqCst), 1);
        assert!(!screen.needs_restart());
    }

    #[test]
    fn row_titles_resolve_for_known_keys() {
        let dir = tempfile::tempdir().unwrap();
        let (screen, _rx) = screen_in(&dir);
        assert!(screen.row_title(PREF_DUMP_USER_DICT).is_some());
        assert!(screen.row_title("some_other_pref").is_none());
        let text = screen.usability_study_row_text();
        assert!(!text.title.is_empty());
        assert!(!text.summary.is_empty());
    }
}
