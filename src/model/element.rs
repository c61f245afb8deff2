use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::model::{Question, QuestionId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementKind {
    Question(Question),
    PageBreak,
}

/// One unit placed inside a block: a question or a page break.
///
/// The ID is assigned by the platform when the question is created; page
/// breaks are block-layout entries and never receive one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<QuestionId>,
}

impl Element {
    pub fn question(question: impl Into<Question>) -> Self {
        Self {
            kind: ElementKind::Question(question.into()),
            id: None,
        }
    }

    pub fn page_break() -> Self {
        Self {
            kind: ElementKind::PageBreak,
            id: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_page_break(&self) -> bool {
        matches!(self.kind, ElementKind::PageBreak)
    }

    pub fn as_question(&self) -> Option<&Question> {
        match &self.kind {
            ElementKind::Question(q) => Some(q),
            ElementKind::PageBreak => None,
        }
    }

    pub fn render(&self) -> Value {
        match &self.kind {
            ElementKind::Question(q) => q.render(),
            ElementKind::PageBreak => json!({ "Type": "Page Break" }),
        }
    }

    pub(crate) fn assign_id(&mut self, id: QuestionId) {
        self.id = Some(id);
    }

    pub(crate) fn clear_id(&mut self) {
        self.id = None;
    }
}

impl From<Question> for Element {
    fn from(question: Question) -> Self {
        Element::question(question)
    }
}

/// The flat question list of a survey without explicit blocks.
///
/// Elements go into the survey's default block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionList {
    pub elements: Vec<Element>,
}

impl QuestionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, element: impl Into<Element>) -> &mut Element {
        self.elements.push(element.into());
        let last = self.elements.len() - 1;
        &mut self.elements[last]
    }

    pub fn append_page_break(&mut self) -> &mut Element {
        self.append(Element::page_break())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<E: Into<Element>> FromIterator<E> for QuestionList {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().map(Into::into).collect(),
        }
    }
}
