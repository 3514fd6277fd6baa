use std::sync::Arc;

use crate::i18n;
use crate::prefs::PrefStore;

const PERCENTAGE_SCALE: f32 = 100.0;

/// Value mediator between a percentage slider row and the preference store.
///
/// Slider rows deal in integers; each proxy converts to and from the
/// storage unit of its preference family. A negative value is the
/// "follow the system default" sentinel and never reaches storage.
pub trait SliderValueProxy {
    fn write_value(&self, value: i32, key: &str);
    /// Drop the stored entry so reads fall back to the configured default.
    fn write_default_value(&self, key: &str);
    fn read_value(&self, key: &str) -> i32;
    /// The configured default in slider units. Does not touch storage.
    fn read_default_value(&self, key: &str) -> i32;
    fn value_text(&self, value: i32) -> String;
    /// Live-preview hook while the slider is dragged. No-op for now.
    fn feedback_value(&self, _value: i32) {}
}

/// Proxy for scale preferences: stored as an f32 fraction in [0.0, 1.0],
/// edited as an integer percentage 0..=100.
pub struct ScaleSliderProxy {
    store: Arc<PrefStore>,
    default: f32,
}

impl ScaleSliderProxy {
    pub fn new(store: Arc<PrefStore>, default: f32) -> Self {
        Self { store, default }
    }

    fn fraction_from_percentage(percentage: i32) -> f32 {
        percentage as f32 / PERCENTAGE_SCALE
    }

    fn percentage_from_fraction(fraction: f32) -> i32 {
        (fraction * PERCENTAGE_SCALE).round() as i32
    }
}

impl SliderValueProxy for ScaleSliderProxy {
    fn write_value(&self, value: i32, key: &str) {
        self.store
            .set_float(key, Self::fraction_from_percentage(value));
    }

    fn write_default_value(&self, key: &str) {
        self.store.remove(key);
    }

    fn read_value(&self, key: &str) -> i32 {
        Self::percentage_from_fraction(self.store.get_float(key, self.default))
    }

    fn read_default_value(&self, _key: &str) -> i32 {
        Self::percentage_from_fraction(self.default)
    }

    fn value_text(&self, value: i32) -> String {
        if value < 0 {
            return i18n::tr("label-system-default");
        }
        format!("{}%", value)
    }
}

/// Proxy for duration preferences: integer milliseconds both in storage
/// and on the slider.
pub struct DurationSliderProxy {
    store: Arc<PrefStore>,
    default: i32,
}

impl DurationSliderProxy {
    pub fn new(store: Arc<PrefStore>, default: i32) -> Self {
        Self { store, default }
    }
}

impl SliderValueProxy for DurationSliderProxy {
    fn write_value(&self, value: i32, key: &str) {
        self.store.set_int(key, value);
    }

    fn write_default_value(&self, key: &str) {
        self.store.remove(key);
    }

    fn read_value(&self, key: &str) -> i32 {
        self.store.get_int(key, self.default)
    }

    fn read_default_value(&self, _key: &str) -> i32 {
        self.default
    }

    fn value_text(&self, value: i32) -> String {
        if value < 0 {
            return i18n::tr("label-system-default");
        }
        format!("{} ms", value)
    }
}
