use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Global survey options, keyed the way the survey-definitions API names
/// them.
///
/// The platform does not accept these at shell creation, so they are sent in
/// a separate options update right after the shell exists. Setting a key
/// twice overwrites it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurveyOptions(Map<String, Value>);

impl SurveyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Set a raw option by its API key.
    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Overlay `other` on these options; keys in `other` win.
    pub fn merge(&mut self, other: SurveyOptions) -> &mut Self {
        self.0.extend(other.0);
        self
    }

    /// HTML inserted before the survey on every page. May contain scripts.
    pub fn set_header_html(&mut self, header_html: impl Into<String>) -> &mut Self {
        self.set_option("Header", header_html.into())
    }

    /// HTML inserted after the survey on every page. May contain scripts.
    pub fn set_footer_html(&mut self, footer_html: impl Into<String>) -> &mut Self {
        self.set_option("Footer", footer_html.into())
    }

    pub fn set_custom_css(&mut self, custom_css: impl Into<String>) -> &mut Self {
        // wrapped in an object, whatever the API reference says
        self.set_option("CustomStyles", json!({ "customCSS": custom_css.into() }))
    }

    pub fn set_external_css_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.set_option("ExternalCSS", url.into())
    }

    pub fn set_show_back_button(&mut self, show: bool) -> &mut Self {
        // the platform takes a JSON-encoded bool
        self.set_option("BackButton", show.to_string())
    }

    pub fn set_progress_bar_display(&mut self, display: impl Into<String>) -> &mut Self {
        self.set_option("ProgressBarDisplay", display.into())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for SurveyOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
