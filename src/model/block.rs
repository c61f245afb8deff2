use serde::{Deserialize, Serialize};

use crate::error::{SurveyError, SurveyResult};
use crate::model::{BlockId, Element};

pub const DEFAULT_BLOCK_DESCRIPTION: &str = "Standard Question Block";

/// An ordered group of elements, roughly a group of pages in the rendered
/// survey.
///
/// The platform renders a block's elements in creation order, so the order
/// of `elements` is the presentation order. Once the block has been created
/// remotely it cannot take new elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Shown in the web editor only, never to participants
    pub description: String,
    elements: Vec<Element>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<BlockId>,
    #[serde(skip)]
    populated: bool,
}

impl Default for Block {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_DESCRIPTION)
    }
}

impl Block {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            elements: Vec::new(),
            id: None,
            populated: false,
        }
    }

    pub fn with_elements<I, E>(description: impl Into<String>, elements: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        Self {
            elements: elements.into_iter().map(Into::into).collect(),
            ..Self::new(description)
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// True once the elements have been uploaded, or any of them already
    /// carries a platform ID.
    pub fn is_populated(&self) -> bool {
        self.populated || self.elements.iter().any(|e| e.id().is_some())
    }

    /// Number of elements that become questions (page breaks excluded).
    pub fn question_count(&self) -> usize {
        self.elements.iter().filter(|e| !e.is_page_break()).count()
    }

    /// Append an element, returning it for further configuration.
    pub fn append(&mut self, element: impl Into<Element>) -> SurveyResult<&mut Element> {
        if let Some(id) = &self.id {
            return Err(SurveyError::Configuration(format!(
                "block {} already exists on the platform and cannot take new elements",
                id
            )));
        }
        self.elements.push(element.into());
        let last = self.elements.len() - 1;
        Ok(&mut self.elements[last])
    }

    pub fn append_page_break(&mut self) -> SurveyResult<&mut Element> {
        self.append(Element::page_break())
    }

    pub(crate) fn elements_mut(&mut self) -> &mut [Element] {
        &mut self.elements
    }

    pub(crate) fn assign_id(&mut self, id: BlockId) {
        self.id = Some(id);
    }

    pub(crate) fn mark_populated(&mut self) {
        self.populated = true;
    }

    /// Forget the IDs from a previous creation run.
    pub(crate) fn reset(&mut self) {
        self.id = None;
        self.populated = false;
        for element in &mut self.elements {
            element.clear_id();
        }
    }
}

/// The ordered block list of a block-based survey.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockList {
    pub blocks: Vec<Block>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, block: Block) -> &mut Block {
        self.blocks.push(block);
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl FromIterator<Block> for BlockList {
    fn from_iter<I: IntoIterator<Item = Block>>(iter: I) -> Self {
        Self {
            blocks: iter.into_iter().collect(),
        }
    }
}
