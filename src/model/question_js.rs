use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Question lifecycle events a script fragment can be attached to.
///
/// Declaration order is the order in which fragments are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionEvent {
    Load,
    Ready,
    Submit,
    Unload,
    Click,
}

impl QuestionEvent {
    pub const ALL: [QuestionEvent; 5] = [
        QuestionEvent::Load,
        QuestionEvent::Ready,
        QuestionEvent::Submit,
        QuestionEvent::Unload,
        QuestionEvent::Click,
    ];

    fn wrap(&self, fragment: &str) -> String {
        match self {
            // yes, lowercase "l" in addOnload
            QuestionEvent::Load => engine_wrap("load", fragment, &[]),
            QuestionEvent::Ready => engine_wrap("Ready", fragment, &[]),
            QuestionEvent::Submit => engine_wrap("PageSubmit", fragment, &["type"]),
            QuestionEvent::Unload => engine_wrap("Unload", fragment, &[]),
            QuestionEvent::Click => engine_wrap(
                "load",
                &format!(
                    "this.questionclick = function(event, element) {{\n{}\n}};",
                    fragment
                ),
                &[],
            ),
        }
    }
}

fn engine_wrap(method: &str, fragment: &str, args: &[&str]) -> String {
    format!(
        "Qualtrics.SurveyEngine.addOn{}(function({}){{\n{}\n}});",
        method,
        args.join(","),
        fragment
    )
}

/// Builder for the JavaScript attached to a question.
///
/// Fragments are kept per event in insertion order and every fragment gets
/// its own SurveyEngine registration; fragments sharing an event are never
/// merged into one handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionJs {
    fragments: Vec<(QuestionEvent, String)>,
}

impl QuestionJs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, event: QuestionEvent, fragment: impl Into<String>) -> Self {
        self.fragments.push((event, fragment.into()));
        self
    }

    pub fn on_load(self, fragment: impl Into<String>) -> Self {
        self.on(QuestionEvent::Load, fragment)
    }

    pub fn on_ready(self, fragment: impl Into<String>) -> Self {
        self.on(QuestionEvent::Ready, fragment)
    }

    /// Runs when the next button is pressed, even if validation then fails.
    pub fn on_submit(self, fragment: impl Into<String>) -> Self {
        self.on(QuestionEvent::Submit, fragment)
    }

    pub fn on_unload(self, fragment: impl Into<String>) -> Self {
        self.on(QuestionEvent::Unload, fragment)
    }

    /// Runs when the question's container is clicked.
    pub fn on_click(self, fragment: impl Into<String>) -> Self {
        self.on(QuestionEvent::Click, fragment)
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragments(&self, event: QuestionEvent) -> impl Iterator<Item = &str> {
        self.fragments
            .iter()
            .filter(move |(e, _)| *e == event)
            .map(|(_, fragment)| fragment.as_str())
    }

    /// Render every fragment, grouped by event in canonical order.
    pub fn script(&self) -> String {
        QuestionEvent::ALL
            .iter()
            .flat_map(|event| self.fragments(*event).map(move |f| event.wrap(f)))
            .join("\n\n")
    }
}

impl From<QuestionJs> for String {
    fn from(js: QuestionJs) -> Self {
        js.script()
    }
}

/// JS statement storing the value of `expression_js` as embedded data `key`.
pub fn set_embedded_data(key: &str, expression_js: &str) -> String {
    format!(
        "Qualtrics.SurveyEngine.setEmbeddedData(\"{}\",{});",
        key, expression_js
    )
}

/// Piped-text expression reading embedded data `key`.
pub fn get_embedded_data(key: &str) -> String {
    format!("${{e://Field/{}}}", key)
}
