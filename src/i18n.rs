use fluent_bundle::{FluentBundle, FluentResource};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::sync::RwLock;
use unic_langid::LanguageIdentifier;

const EN_FTL: &str = include_str!("../i18n/en/settings.ftl");
const JA_FTL: &str = include_str!("../i18n/ja/settings.ftl");

static LANG_PREF: Lazy<RwLock<String>> = Lazy::new(|| RwLock::new(String::from("auto")));

/// Store the UI language preference (auto/ja/en). Takes effect on the
/// next lookup.
pub fn set_ui_language_preference(pref: &str) {
    let mut g = LANG_PREF.write().expect("i18n pref lock poisoned");
    *g = pref.to_string();
}

/// Look up a localized label by id. Unknown ids come back verbatim.
pub fn tr(id: &str) -> String {
    let pref = LANG_PREF.read().expect("i18n pref lock poisoned").clone();
    let bundle = build_bundle(&pref);
    format_message(&bundle, id).unwrap_or_else(|| id.to_string())
}

fn format_message(bundle: &FluentBundle<FluentResource>, id: &str) -> Option<String> {
    let msg = bundle.get_message(id)?;
    let pattern = msg.value()?;
    let mut errors = vec![];
    let value: Cow<str> = bundle.format_pattern(pattern, None, &mut errors);
    Some(value.into_owned())
}

// Normalize locale strings like "ja_JP.UTF-8" to BCP47-ish "ja-JP"
fn normalize_locale_tag(s: &str) -> String {
    let tag = s.trim();
    let tag = tag.split_once('.').map(|(t, _)| t).unwrap_or(tag);
    tag.replace('_', "-")
}

fn detect_lang() -> LanguageIdentifier {
    // Explicit override via env var, then the OS locale, then English.
    if let Ok(s) = std::env::var("WRENKEY_UI_LANG") {
        let s = s.trim();
        if !s.is_empty() && s != "auto" {
            if let Ok(li) = normalize_locale_tag(s).parse::<LanguageIdentifier>() {
                return li;
            }
        }
    }
    if let Some(loc) = sys_locale::get_locale() {
        if let Ok(li) = normalize_locale_tag(&loc).parse::<LanguageIdentifier>() {
            return li;
        }
    }
    "en-US".parse().unwrap()
}

fn build_bundle(pref: &str) -> FluentBundle<FluentResource> {
    let lang: LanguageIdentifier = match pref.trim().to_lowercase().as_str() {
        "ja" => "ja".parse().unwrap(),
        "en" | "en-us" => "en-US".parse().unwrap(),
        _ => detect_lang(),
    };
    let ftl = match lang.language.as_str() {
        "ja" => JA_FTL,
        _ => EN_FTL,
    };
    let mut bundle = FluentBundle::new(vec![lang]);
    match FluentResource::try_new(ftl.to_owned()) {
        Ok(resource) => {
            if let Err(e) = bundle.add_resource(resource) {
                tracing::warn!("failed to add FTL resource: {e:?}");
            }
        }
        Err((_, e)) => {
            tracing::warn!("failed to parse FTL resource: {e:?}");
        }
    }
    bundle
}
