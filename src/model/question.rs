use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{SurveyError, SurveyResult};
use crate::model::{Element, ForceResponse};

/// The platform wants translations listed even when there are none, an empty
/// list silences the editor's translation warning.
fn no_translations() -> Value {
    json!([])
}

fn force_response_validation(force: ForceResponse) -> Value {
    json!({
        "Settings": {
            "ForceResponse": force.as_str(),
            "ForceResponseType": "ON",
            "Type": "None",
        }
    })
}

/// Build `Choices` keyed from `start` together with the matching `ChoiceOrder`.
fn numbered_choices<I>(start: usize, displays: I) -> (Value, Value)
where
    I: IntoIterator<Item = Value>,
{
    let mut choices = Map::new();
    let mut order = Vec::new();
    for (i, display) in displays.into_iter().enumerate() {
        let key = start + i;
        choices.insert(key.to_string(), display);
        order.push(json!(key));
    }
    (Value::Object(choices), Value::Array(order))
}

/// A slider bound as JSON: whole values go out as integers.
fn slider_number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

/// Grid lines for a slider range; wide ranges get 10 ticks.
fn grid_lines(min: f64, max: f64) -> f64 {
    let diff = max - min;
    if diff > 20.0 {
        9.0
    } else {
        diff
    }
}

/// Display HTML plus optional graphics, no input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextGraphicQuestion {
    pub text_html: String,
    pub script_js: String,
}

impl TextGraphicQuestion {
    pub fn new(text_html: impl Into<String>) -> Self {
        Self {
            text_html: text_html.into(),
            script_js: String::new(),
        }
    }

    pub fn with_script(mut self, script_js: impl Into<String>) -> Self {
        self.script_js = script_js.into();
        self
    }

    pub fn render(&self) -> Value {
        json!({
            "QuestionText": self.text_html,
            "QuestionJS": self.script_js,
            "QuestionType": "DB",
            "Selector": "TB",
            "Language": no_translations(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSize {
    #[default]
    SingleLine,
    MultiLine,
    Essay,
}

impl ResponseSize {
    fn selector(&self) -> &'static str {
        match self {
            ResponseSize::SingleLine => "SL",
            ResponseSize::MultiLine => "ML",
            ResponseSize::Essay => "ESTB",
        }
    }
}

/// A free-text entry box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEntryQuestion {
    pub data_export_tag: String,
    pub text_html: String,
    pub script_js: String,
    pub force_response: ForceResponse,
    pub size: ResponseSize,
}

impl TextEntryQuestion {
    pub fn new(data_export_tag: impl Into<String>, text_html: impl Into<String>) -> Self {
        Self {
            data_export_tag: data_export_tag.into(),
            text_html: text_html.into(),
            script_js: String::new(),
            force_response: ForceResponse::Off,
            size: ResponseSize::SingleLine,
        }
    }

    pub fn with_size(mut self, size: ResponseSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_force_response(mut self, force: bool) -> Self {
        self.force_response = force.into();
        self
    }

    pub fn with_script(mut self, script_js: impl Into<String>) -> Self {
        self.script_js = script_js.into();
        self
    }

    pub fn render(&self) -> Value {
        json!({
            "QuestionType": "TE",
            "Selector": self.size.selector(),
            "DataExportTag": self.data_export_tag,
            "QuestionText": self.text_html,
            "QuestionJS": self.script_js,
            "Validation": force_response_validation(self.force_response),
            "Language": no_translations(),
        })
    }
}

/// One option of a multiple choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChoiceOption {
    Basic(String),
    /// Label accompanied by a text entry field
    Text(String),
}

impl ChoiceOption {
    fn render(&self) -> Value {
        match self {
            ChoiceOption::Basic(label) => json!({ "Display": label }),
            // the platform expects the flag JSON-encoded as a string
            ChoiceOption::Text(label) => json!({ "Display": label, "TextEntry": "true" }),
        }
    }
}

impl From<&str> for ChoiceOption {
    fn from(label: &str) -> Self {
        if label == "Self-specified" {
            ChoiceOption::Text(label.to_string())
        } else {
            ChoiceOption::Basic(label.to_string())
        }
    }
}

impl From<String> for ChoiceOption {
    fn from(label: String) -> Self {
        ChoiceOption::from(label.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMethod {
    #[default]
    ButtonList,
    DropdownList,
}

impl SelectionMethod {
    fn selectors(&self) -> (&'static str, &'static str) {
        match self {
            SelectionMethod::ButtonList => ("SAVR", "TX"),
            SelectionMethod::DropdownList => ("DL", ""),
        }
    }
}

/// Single-answer multiple choice, as a button list or a dropdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleChoiceQuestion {
    pub data_export_tag: String,
    pub options: Vec<ChoiceOption>,
    pub text_html: String,
    pub script_js: String,
    pub force_response: ForceResponse,
    pub selection: SelectionMethod,
    pub recode_values: Map<String, Value>,
}

impl MultipleChoiceQuestion {
    pub fn new<I, O>(data_export_tag: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<ChoiceOption>,
    {
        Self {
            data_export_tag: data_export_tag.into(),
            options: options.into_iter().map(Into::into).collect(),
            text_html: String::new(),
            script_js: String::new(),
            force_response: ForceResponse::Off,
            selection: SelectionMethod::ButtonList,
            recode_values: Map::new(),
        }
    }

    pub fn with_text(mut self, text_html: impl Into<String>) -> Self {
        self.text_html = text_html.into();
        self
    }

    pub fn with_script(mut self, script_js: impl Into<String>) -> Self {
        self.script_js = script_js.into();
        self
    }

    pub fn with_force_response(mut self, force: bool) -> Self {
        self.force_response = force.into();
        self
    }

    pub fn with_selection(mut self, selection: SelectionMethod) -> Self {
        self.selection = selection;
        self
    }

    /// Values recorded in the data export for each choice, keyed by choice number.
    pub fn with_recode_value(mut self, choice: usize, value: impl Into<Value>) -> Self {
        self.recode_values.insert(choice.to_string(), value.into());
        self
    }

    pub fn render(&self) -> Value {
        let (selector, sub_selector) = self.selection.selectors();
        let (choices, order) = numbered_choices(1, self.options.iter().map(ChoiceOption::render));
        json!({
            "Selector": selector,
            "SubSelector": sub_selector,
            "QuestionType": "MC",
            "ChoiceOrder": order,
            "Choices": choices,
            "DataExportTag": self.data_export_tag,
            "QuestionText": self.text_html,
            "QuestionJS": self.script_js,
            "Validation": force_response_validation(self.force_response),
            "RecodeValues": self.recode_values,
            "Language": no_translations(),
        })
    }
}

/// A table of statements, each answered on the same scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixTableQuestion {
    pub data_export_tag: String,
    pub text_html: String,
    pub script_js: String,
    /// Rows
    pub statements: Vec<String>,
    /// Columns
    pub scale_points: Vec<String>,
}

impl MatrixTableQuestion {
    pub fn new(data_export_tag: impl Into<String>, text_html: impl Into<String>) -> Self {
        Self {
            data_export_tag: data_export_tag.into(),
            text_html: text_html.into(),
            script_js: String::new(),
            statements: Vec::new(),
            scale_points: Vec::new(),
        }
    }

    pub fn with_statements<I: IntoIterator<Item = S>, S: Into<String>>(mut self, rows: I) -> Self {
        self.statements = rows.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_scale<I: IntoIterator<Item = S>, S: Into<String>>(mut self, columns: I) -> Self {
        self.scale_points = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_script(mut self, script_js: impl Into<String>) -> Self {
        self.script_js = script_js.into();
        self
    }

    pub fn render(&self) -> Value {
        let display = |label: &String| json!({ "Display": label });
        let (choices, choice_order) = numbered_choices(1, self.statements.iter().map(display));
        let (answers, answer_order) = numbered_choices(1, self.scale_points.iter().map(display));
        json!({
            "QuestionType": "Matrix",
            "Selector": "Likert",
            "SubSelector": "SingleAnswer",
            "DataExportTag": self.data_export_tag,
            "QuestionText": self.text_html,
            "QuestionJS": self.script_js,
            "Choices": choices,
            "ChoiceOrder": choice_order,
            "Answers": answers,
            "AnswerOrder": answer_order,
            "Language": no_translations(),
        })
    }
}

/// How many sliders to show: either a bare count (blank labels) or labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sliders {
    Count(usize),
    Labels(Vec<String>),
}

impl Sliders {
    pub fn labels<I: IntoIterator<Item = S>, S: Into<String>>(labels: I) -> Self {
        Sliders::Labels(labels.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Sliders::Count(n) => *n,
            Sliders::Labels(labels) => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn render_choices(&self) -> (Value, Value) {
        let labels: Vec<String> = match self {
            Sliders::Count(n) => vec![String::new(); *n],
            Sliders::Labels(labels) => labels.clone(),
        };
        numbered_choices(0, labels.into_iter().map(|label| json!({ "Display": label })))
    }
}

/// One or more horizontal sliders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderQuestion {
    pub data_export_tag: String,
    pub text_html: String,
    pub script_js: String,
    pub sliders: Sliders,
    pub min: f64,
    pub max: f64,
    pub force_response: ForceResponse,
}

impl SliderQuestion {
    /// Sliders default to a 0..100 range with a forced response.
    pub fn new(
        data_export_tag: impl Into<String>,
        text_html: impl Into<String>,
        sliders: Sliders,
    ) -> Self {
        Self {
            data_export_tag: data_export_tag.into(),
            text_html: text_html.into(),
            script_js: String::new(),
            sliders,
            min: 0.0,
            max: 100.0,
            force_response: ForceResponse::On,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_force_response(mut self, force: bool) -> Self {
        self.force_response = force.into();
        self
    }

    pub fn with_script(mut self, script_js: impl Into<String>) -> Self {
        self.script_js = script_js.into();
        self
    }

    pub fn render(&self) -> Value {
        let (choices, order) = self.sliders.render_choices();
        json!({
            "DataExportTag": self.data_export_tag,
            "ChoiceOrder": order,
            "Choices": choices,
            "Configuration": {
                "CSSliderMin": slider_number(self.min),
                "CSSliderMax": slider_number(self.max),
                "CustomStart": false,
                "GridLines": slider_number(grid_lines(self.min, self.max)),
                "MobileFirst": true,
                "NotApplicable": false,
                "NumDecimals": "0",
                "QuestionDescriptionOption": "UseText",
                "ShowValue": true,
                "SnapToGrid": false,
            },
            "Language": no_translations(),
            "QuestionText": self.text_html,
            "QuestionJS": self.script_js,
            "QuestionType": "Slider",
            "Selector": "HSLIDER",
            "Validation": {
                "Settings": {
                    "ForceResponse": self.force_response.as_str(),
                    "ForceResponseType": self.force_response.as_str(),
                    "Type": "None",
                }
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstantSumStyle {
    #[default]
    Bar,
    Slider,
}

impl ConstantSumStyle {
    fn selector(&self) -> &'static str {
        match self {
            ConstantSumStyle::Bar => "HBAR",
            ConstantSumStyle::Slider => "HSLIDER",
        }
    }
}

/// Sliders whose values must add up to a fixed total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantSumQuestion {
    pub data_export_tag: String,
    pub text_html: String,
    pub script_js: String,
    pub sliders: Sliders,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub style: ConstantSumStyle,
}

impl ConstantSumQuestion {
    /// A constant sum needs at least two sliders to mean anything.
    pub fn new(
        data_export_tag: impl Into<String>,
        text_html: impl Into<String>,
        sliders: Sliders,
    ) -> SurveyResult<Self> {
        if sliders.len() < 2 {
            return Err(SurveyError::Configuration(format!(
                "constant sum question needs at least 2 sliders, got {}",
                sliders.len()
            )));
        }
        Ok(Self {
            data_export_tag: data_export_tag.into(),
            text_html: text_html.into(),
            script_js: String::new(),
            sliders,
            min: 0.0,
            max: 100.0,
            sum: 100.0,
            style: ConstantSumStyle::Bar,
        })
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_sum(mut self, sum: f64) -> Self {
        self.sum = sum;
        self
    }

    pub fn with_style(mut self, style: ConstantSumStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_script(mut self, script_js: impl Into<String>) -> Self {
        self.script_js = script_js.into();
        self
    }

    pub fn render(&self) -> Value {
        let (choices, order) = self.sliders.render_choices();
        json!({
            "DataExportTag": self.data_export_tag,
            "ChoiceOrder": order,
            "Choices": choices,
            "Configuration": {
                "CSSliderMin": slider_number(self.min),
                "CSSliderMax": slider_number(self.max),
                "CustomStart": false,
                "GridLines": slider_number(grid_lines(self.min, self.max)),
                "NumDecimals": "0",
                "QuestionDescriptionOption": "UseText",
                "ShowValue": true,
            },
            "ClarifyingSymbolType": "None",
            "Language": no_translations(),
            "QuestionText": self.text_html,
            "QuestionJS": self.script_js,
            "QuestionType": "CS",
            "Selector": self.style.selector(),
            "Validation": {
                "Settings": {
                    "ChoiceTotal": format!("{}", self.sum),
                    "EnforceRange": Value::Null,
                    "Type": "ChoicesTotal",
                }
            },
        })
    }
}

/// Invisible page timer logged to the response data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingQuestion {
    pub data_export_tag: String,
}

impl TimingQuestion {
    pub fn new(data_export_tag: impl Into<String>) -> Self {
        Self {
            data_export_tag: data_export_tag.into(),
        }
    }

    pub fn render(&self) -> Value {
        json!({
            "QuestionType": "Timing",
            "Selector": "PageTimer",
            "DataExportTag": self.data_export_tag,
            "Choices": {
                "1": { "Display": "First Click" },
                "2": { "Display": "Last Click" },
                "3": { "Display": "Page Submit" },
                "4": { "Display": "Click Count" },
            },
            "Configuration": {
                "MaxSeconds": "0",
                "MinSeconds": "0",
            },
            "DefaultChoices": false,
            "Language": no_translations(),
        })
    }
}

/// reCAPTCHA the participant must pass to continue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptchaQuestion {
    pub data_export_tag: String,
    pub text_html: String,
}

impl Default for CaptchaQuestion {
    fn default() -> Self {
        Self {
            data_export_tag: "reCAPTCHA".to_string(),
            text_html: String::new(),
        }
    }
}

impl CaptchaQuestion {
    pub fn new(text_html: impl Into<String>) -> Self {
        Self {
            text_html: text_html.into(),
            ..Self::default()
        }
    }

    pub fn render(&self) -> Value {
        json!({
            "QuestionType": "Captcha",
            "Selector": "V2",
            "DataExportTag": self.data_export_tag,
            "QuestionDescription": self.text_html,
            "QuestionText": self.text_html,
            "QuestionText_Unsafe": self.text_html,
            "GradingData": [],
            "Language": no_translations(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
    TextGraphic(TextGraphicQuestion),
    TextEntry(TextEntryQuestion),
    MultipleChoice(MultipleChoiceQuestion),
    MatrixTable(MatrixTableQuestion),
    Slider(SliderQuestion),
    ConstantSum(ConstantSumQuestion),
    Timing(TimingQuestion),
    Captcha(CaptchaQuestion),
}

impl Question {
    /// The question-data payload for the create-question call.
    pub fn render(&self) -> Value {
        match self {
            Question::TextGraphic(q) => q.render(),
            Question::TextEntry(q) => q.render(),
            Question::MultipleChoice(q) => q.render(),
            Question::MatrixTable(q) => q.render(),
            Question::Slider(q) => q.render(),
            Question::ConstantSum(q) => q.render(),
            Question::Timing(q) => q.render(),
            Question::Captcha(q) => q.render(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Question::TextGraphic(_) => "text/graphic",
            Question::TextEntry(_) => "text entry",
            Question::MultipleChoice(_) => "multiple choice",
            Question::MatrixTable(_) => "matrix table",
            Question::Slider(_) => "slider",
            Question::ConstantSum(_) => "constant sum",
            Question::Timing(_) => "timing",
            Question::Captcha(_) => "captcha",
        }
    }
}

macro_rules! impl_into_question {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Question {
                fn from(q: $ty) -> Self {
                    Question::$variant(q)
                }
            }

            impl From<$ty> for Element {
                fn from(q: $ty) -> Self {
                    Element::question(Question::$variant(q))
                }
            }
        )*
    };
}

impl_into_question! {
    TextGraphicQuestion => TextGraphic,
    TextEntryQuestion => TextEntry,
    MultipleChoiceQuestion => MultipleChoice,
    MatrixTableQuestion => MatrixTable,
    SliderQuestion => Slider,
    ConstantSumQuestion => ConstantSum,
    TimingQuestion => Timing,
    CaptchaQuestion => Captcha,
}
