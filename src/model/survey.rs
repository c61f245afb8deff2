use serde::{Deserialize, Serialize};

use crate::error::{SurveyError, SurveyResult};
use crate::model::{
    BlockList, FlowTree, QuestionList, SurveyId, SurveyOptions, DEFAULT_SURVEY_NAME,
};

/// The three mutually exclusive ways a survey's content can be laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "content", rename_all = "snake_case")]
pub enum SurveyShape {
    /// Questions straight into the default block
    Basic(QuestionList),
    /// Blocks presented in list order
    Blocked(BlockList),
    /// Blocks arranged by a flow tree
    Flow(FlowTree),
}

impl SurveyShape {
    pub fn kind(&self) -> &'static str {
        match self {
            SurveyShape::Basic(_) => "basic",
            SurveyShape::Blocked(_) => "blocked",
            SurveyShape::Flow(_) => "flow",
        }
    }
}

impl From<QuestionList> for SurveyShape {
    fn from(list: QuestionList) -> Self {
        SurveyShape::Basic(list)
    }
}

impl From<BlockList> for SurveyShape {
    fn from(list: BlockList) -> Self {
        SurveyShape::Blocked(list)
    }
}

impl From<FlowTree> for SurveyShape {
    fn from(tree: FlowTree) -> Self {
        SurveyShape::Flow(tree)
    }
}

/// A survey assembled in memory, uploaded with `create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub name: String,
    pub options: SurveyOptions,
    pub shape: SurveyShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<SurveyId>,
}

impl Survey {
    pub fn new(name: impl Into<String>, shape: impl Into<SurveyShape>) -> Self {
        Self {
            name: name.into(),
            options: SurveyOptions::new(),
            shape: shape.into(),
            id: None,
        }
    }

    pub fn basic(name: impl Into<String>) -> Self {
        Self::new(name, QuestionList::new())
    }

    pub fn blocked(name: impl Into<String>) -> Self {
        Self::new(name, BlockList::new())
    }

    pub fn flow(name: impl Into<String>) -> Self {
        Self::new(name, FlowTree::new())
    }

    pub fn with_options(mut self, options: SurveyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// ID of the survey created by the most recent `create` run.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn as_basic_mut(&mut self) -> Option<&mut QuestionList> {
        match &mut self.shape {
            SurveyShape::Basic(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_blocked_mut(&mut self) -> Option<&mut BlockList> {
        match &mut self.shape {
            SurveyShape::Blocked(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_flow_mut(&mut self) -> Option<&mut FlowTree> {
        match &mut self.shape {
            SurveyShape::Flow(tree) => Some(tree),
            _ => None,
        }
    }

    /// Blocks that the creation sequence will create, and the elements in
    /// them (page breaks included).
    pub fn upload_size(&self) -> (usize, usize) {
        match &self.shape {
            SurveyShape::Basic(list) => (0, list.len()),
            SurveyShape::Blocked(list) => (
                list.len(),
                list.blocks.iter().map(|b| b.len()).sum(),
            ),
            SurveyShape::Flow(tree) => {
                let keys = tree.referenced_blocks();
                let elements = keys
                    .iter()
                    .filter_map(|key| tree.block(*key))
                    .map(|b| b.len())
                    .sum();
                (keys.len(), elements)
            }
        }
    }

    /// In-memory checks run before any call is made.
    pub fn validate(&self) -> SurveyResult<()> {
        if self.name.trim().is_empty() {
            return Err(SurveyError::Configuration(
                "survey name must not be empty".to_string(),
            ));
        }
        if let SurveyShape::Flow(tree) = &self.shape {
            tree.validate()?;
        }
        Ok(())
    }

    pub(crate) fn set_id(&mut self, id: SurveyId) {
        self.id = Some(id);
    }

    /// Forget every ID assigned by a previous creation run.
    pub(crate) fn reset_ids(&mut self) {
        self.id = None;
        match &mut self.shape {
            SurveyShape::Basic(list) => {
                for element in &mut list.elements {
                    element.clear_id();
                }
            }
            SurveyShape::Blocked(list) => {
                for block in &mut list.blocks {
                    block.reset();
                }
            }
            SurveyShape::Flow(tree) => {
                for block in tree.blocks_mut() {
                    block.reset();
                }
            }
        }
    }
}

impl Default for Survey {
    fn default() -> Self {
        Self::basic(DEFAULT_SURVEY_NAME)
    }
}
